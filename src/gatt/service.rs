use super::attribute::{
    check_interface, AttributeError, AttributePath, PropertyMap, PropertyValue,
    GATT_SERVICE_IFACE,
};
use super::characteristic::Characteristic;
use crate::{Error, ErrorType};
use uuid::Uuid;

#[derive(Debug)]
pub struct Service {
    pub uuid: Uuid,
    pub index: u16,
    pub primary: bool,
    pub characteristics: Vec<Characteristic>,
    path: Option<AttributePath>,
}

impl Service {
    pub fn new(index: u16, uuid: Uuid, primary: bool) -> Self {
        Service {
            uuid,
            index,
            primary,
            characteristics: vec![],
            path: None,
        }
    }

    pub fn path(&self) -> Option<&AttributePath> {
        self.path.as_ref()
    }

    pub fn add_characteristic(&mut self, mut characteristic: Characteristic) -> Result<(), Error> {
        if self
            .characteristics
            .iter()
            .any(|c| c.index == characteristic.index)
        {
            return Err(Error::new(
                format!("Characteristic index {} already in use", characteristic.index),
                format!("service {}", self.uuid),
                ErrorType::PathConflict,
            ));
        }
        if let Some(path) = &self.path {
            characteristic.attach(path);
        }
        self.characteristics.push(characteristic);
        Ok(())
    }

    pub(crate) fn attach(&mut self, application: &AttributePath) {
        let path = application.child("service", self.index);
        for characteristic in self.characteristics.iter_mut() {
            characteristic.attach(&path);
        }
        self.path = Some(path);
    }

    pub fn characteristic_paths(&self) -> Vec<AttributePath> {
        self.characteristics
            .iter()
            .filter_map(|c| c.path().cloned())
            .collect()
    }

    pub fn get_all(&self, interface: &str) -> Result<PropertyMap, AttributeError> {
        check_interface(interface, GATT_SERVICE_IFACE)?;
        let mut properties = PropertyMap::new();
        properties.insert("UUID".into(), PropertyValue::Str(self.uuid.to_string()));
        properties.insert("Primary".into(), PropertyValue::Bool(self.primary));
        properties.insert(
            "Characteristics".into(),
            PropertyValue::Paths(self.characteristic_paths()),
        );
        Ok(properties)
    }
}
