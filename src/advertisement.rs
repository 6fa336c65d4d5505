use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

pub const DEFAULT_ADVERTISEMENT_PATH: &str = "/org/bluez/gardener/advertisement";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvertisementKind {
    Peripheral,
    Broadcast,
}

impl AdvertisementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdvertisementKind::Peripheral => "peripheral",
            AdvertisementKind::Broadcast => "broadcast",
        }
    }
}

/// LE advertising payload. Built once at startup and handed to the stack;
/// it is not part of the attribute tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advertisement {
    pub path: String,
    pub kind: AdvertisementKind,
    pub service_uuids: BTreeSet<Uuid>,
    pub solicit_uuids: BTreeSet<Uuid>,
    pub manufacturer_data: BTreeMap<u16, Vec<u8>>,
    pub service_data: BTreeMap<Uuid, Vec<u8>>,
    pub local_name: Option<String>,
    pub include_tx_power: bool,
}

impl Advertisement {
    pub fn new(index: u16, kind: AdvertisementKind) -> Self {
        Advertisement {
            path: format!("{}{}", DEFAULT_ADVERTISEMENT_PATH, index),
            kind,
            service_uuids: BTreeSet::new(),
            solicit_uuids: BTreeSet::new(),
            manufacturer_data: BTreeMap::new(),
            service_data: BTreeMap::new(),
            local_name: None,
            include_tx_power: false,
        }
    }

    pub fn get_path(&self) -> &str {
        &self.path
    }

    pub fn add_service_uuid(&mut self, uuid: Uuid) {
        self.service_uuids.insert(uuid);
    }

    pub fn add_solicit_uuid(&mut self, uuid: Uuid) {
        self.solicit_uuids.insert(uuid);
    }

    pub fn add_manufacturer_data(&mut self, company_id: u16, data: Vec<u8>) {
        self.manufacturer_data.insert(company_id, data);
    }

    pub fn add_service_data(&mut self, uuid: Uuid, data: Vec<u8>) {
        self.service_data.insert(uuid, data);
    }

    pub fn add_local_name(&mut self, name: impl Into<String>) {
        self.local_name = Some(name.into());
    }
}
