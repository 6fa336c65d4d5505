mod characteristic_utils;

use crate::advertisement::{Advertisement, AdvertisementKind};
use crate::agent::Agent;
use crate::gatt::application::ApplicationLayout;
use crate::gatt::dispatcher::DispatcherHandle;
use crate::peripheral::BluetoothStack;
use crate::{Error, ErrorType};
use async_trait::async_trait;
use bluer::adv::{AdvertisementHandle, Feature, Type};
use bluer::agent::{AgentHandle, AuthorizeService, ReqError, RequestAuthorization};
use bluer::gatt::local::ApplicationHandle;
use bluer::{Adapter, Session};
use characteristic_utils::parse_application;
use futures::FutureExt;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Kept alive for as long as the registration should last; dropping it
/// unregisters from BlueZ.
#[derive(Debug)]
pub enum BluezRegistration {
    Advertisement(AdvertisementHandle),
    Application(ApplicationHandle),
}

#[derive(Debug, PartialEq, Eq)]
enum AdapterChoice<'a> {
    Named(&'a str),
    Default,
    Missing,
}

fn select_adapter<'a>(requested: Option<&'a str>, present: &[String]) -> AdapterChoice<'a> {
    match requested {
        Some(name) if present.iter().any(|p| p == name) => AdapterChoice::Named(name),
        Some(_) => AdapterChoice::Missing,
        None if present.is_empty() => AdapterChoice::Missing,
        None => AdapterChoice::Default,
    }
}

fn le_advertisement(advertisement: &Advertisement) -> bluer::adv::Advertisement {
    let mut system_includes = BTreeSet::new();
    if advertisement.include_tx_power {
        system_includes.insert(Feature::TxPower);
    }
    bluer::adv::Advertisement {
        advertisement_type: match advertisement.kind {
            AdvertisementKind::Peripheral => Type::Peripheral,
            AdvertisementKind::Broadcast => Type::Broadcast,
        },
        service_uuids: advertisement.service_uuids.clone(),
        solicit_uuids: advertisement.solicit_uuids.clone(),
        manufacturer_data: advertisement.manufacturer_data.clone(),
        service_data: advertisement.service_data.clone(),
        local_name: advertisement.local_name.clone(),
        system_includes,
        discoverable: Some(true),
        ..Default::default()
    }
}

/// BlueZ over the system bus.
pub struct BluezStack {
    adapter_name: Option<String>,
    session: Option<Session>,
    adapter: Option<Adapter>,
    agent: Option<AgentHandle>,
}

impl BluezStack {
    pub fn new(adapter_name: Option<String>) -> Self {
        BluezStack {
            adapter_name,
            session: None,
            adapter: None,
            agent: None,
        }
    }

    fn adapter(&self) -> Result<&Adapter, Error> {
        self.adapter
            .as_ref()
            .ok_or_else(|| Error::from_type(ErrorType::AdapterUnavailable))
    }

    fn session(&self) -> Result<&Session, Error> {
        self.session
            .as_ref()
            .ok_or_else(|| Error::from_type(ErrorType::AdapterUnavailable))
    }

    /// RegisterAgent followed by RequestDefaultAgent, both issued by bluer
    /// from a single registration.
    fn bluer_agent(agent: &Agent) -> bluer::agent::Agent {
        let authorization_policy = Arc::new(agent.clone());
        let service_policy = authorization_policy.clone();
        bluer::agent::Agent {
            request_default: true,
            request_authorization: Some(Box::new(move |request: RequestAuthorization| {
                let policy = authorization_policy.clone();
                async move {
                    if policy.authorize(&request.device.to_string(), None) {
                        Ok(())
                    } else {
                        Err(ReqError::Rejected)
                    }
                }
                .boxed()
            })),
            authorize_service: Some(Box::new(move |request: AuthorizeService| {
                let policy = service_policy.clone();
                async move {
                    let service = request.service.to_string();
                    if policy.authorize(&request.device.to_string(), Some(&service)) {
                        Ok(())
                    } else {
                        Err(ReqError::Rejected)
                    }
                }
                .boxed()
            })),
            ..Default::default()
        }
    }
}

#[async_trait]
impl BluetoothStack for BluezStack {
    type Registration = BluezRegistration;

    async fn find_gatt_manager(&mut self) -> Result<Option<String>, Error> {
        let session = match Session::new().await {
            Ok(session) => session,
            Err(err) => {
                log::error!("Cannot reach bluetoothd: {}", err);
                return Ok(None);
            }
        };
        let names = session.adapter_names().await?;
        let adapter = match select_adapter(self.adapter_name.as_deref(), &names) {
            AdapterChoice::Named(name) => session.adapter(name)?,
            AdapterChoice::Default => session.default_adapter().await?,
            AdapterChoice::Missing => {
                log::error!(
                    "No adapter matching {:?} (found {:?})",
                    self.adapter_name,
                    names
                );
                return Ok(None);
            }
        };
        // bluetoothd registers GattManager1 on every adapter object it exports;
        // bluer offers no interface listing, so presence of the adapter stands in.
        log::info!(
            "Using Bluetooth adapter {} with address {}, assuming it exposes GattManager1",
            adapter.name(),
            adapter.address().await?
        );
        let name = adapter.name().to_string();
        self.session = Some(session);
        self.adapter = Some(adapter);
        Ok(Some(name))
    }

    async fn power_on(&mut self) -> Result<(), Error> {
        let adapter = self.adapter()?;
        adapter.set_powered(true).await?;
        Ok(())
    }

    async fn register_agent(&mut self, agent: &Agent) -> Result<(), Error> {
        // bluer derives the capability from the callbacks it is given; without
        // any pin, passkey or confirmation callback it registers NoInputNoOutput.
        let handle = self
            .session()?
            .register_agent(Self::bluer_agent(agent))
            .await?;
        self.agent = Some(handle);
        Ok(())
    }

    async fn request_default_agent(&mut self, agent: &Agent) -> Result<(), Error> {
        // BlueZ keeps one agent per bus connection, so the default request rides
        // on the registration made by register_agent.
        match &self.agent {
            Some(_) => {
                log::debug!("Agent {} is the default agent", agent.path);
                Ok(())
            }
            None => Err(Error::new(
                "Default agent requested before registration",
                agent.path.clone(),
                ErrorType::Bluez,
            )),
        }
    }

    async fn register_advertisement(
        &self,
        advertisement: &Advertisement,
    ) -> Result<BluezRegistration, Error> {
        let handle = self
            .adapter()?
            .advertise(le_advertisement(advertisement))
            .await?;
        log::debug!("AdvHandle: {:?}", handle);
        Ok(BluezRegistration::Advertisement(handle))
    }

    async fn register_application(
        &self,
        layout: &ApplicationLayout,
        handle: DispatcherHandle,
    ) -> Result<BluezRegistration, Error> {
        let application = parse_application(layout, handle);
        let app_handle = self
            .adapter()?
            .serve_gatt_application(application)
            .await?;
        log::debug!("AppHandle: {:?}", app_handle);
        Ok(BluezRegistration::Application(app_handle))
    }
}
