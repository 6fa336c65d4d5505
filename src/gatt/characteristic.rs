use super::attribute::{
    check_interface, AttributeError, AttributePath, PropertyMap, PropertyValue, ReadOptions,
    WriteOptions, GATT_CHRC_IFACE,
};
use super::descriptor::Descriptor;
use super::properties::{AttributeFlag, Flags};
use crate::{Error, ErrorType};
use std::fmt::Debug;
use uuid::Uuid;

/// Read/write logic of a characteristic. The characteristic owns the value,
/// the behaviour decides what a read returns and what a write stores.
pub trait CharacteristicBehavior: Debug + Send {
    fn read_value(
        &mut self,
        value: &mut Vec<u8>,
        options: &ReadOptions,
    ) -> Result<Vec<u8>, AttributeError>;

    fn write_value(
        &mut self,
        value: &mut Vec<u8>,
        incoming: Vec<u8>,
        options: &WriteOptions,
    ) -> Result<(), AttributeError>;
}

/// Returns the stored value on read, stores whatever is written.
#[derive(Debug, Default)]
pub struct StaticValue;

impl CharacteristicBehavior for StaticValue {
    fn read_value(
        &mut self,
        value: &mut Vec<u8>,
        _options: &ReadOptions,
    ) -> Result<Vec<u8>, AttributeError> {
        Ok(value.clone())
    }

    fn write_value(
        &mut self,
        value: &mut Vec<u8>,
        incoming: Vec<u8>,
        _options: &WriteOptions,
    ) -> Result<(), AttributeError> {
        *value = incoming;
        Ok(())
    }
}

#[derive(Debug)]
pub struct Characteristic {
    pub uuid: Uuid,
    pub index: u16,
    pub flags: Flags,
    pub value: Vec<u8>,
    pub descriptors: Vec<Descriptor>,
    behavior: Box<dyn CharacteristicBehavior>,
    path: Option<AttributePath>,
    service: Option<AttributePath>,
}

impl Characteristic {
    pub fn new(
        index: u16,
        uuid: Uuid,
        flags: &[AttributeFlag],
        value: Vec<u8>,
        behavior: Box<dyn CharacteristicBehavior>,
    ) -> Self {
        Characteristic {
            uuid,
            index,
            flags: Flags::new(flags),
            value,
            descriptors: vec![],
            behavior,
            path: None,
            service: None,
        }
    }

    pub fn with_static_value(
        index: u16,
        uuid: Uuid,
        flags: &[AttributeFlag],
        value: Vec<u8>,
    ) -> Self {
        Characteristic::new(index, uuid, flags, value, Box::new(StaticValue))
    }

    pub fn path(&self) -> Option<&AttributePath> {
        self.path.as_ref()
    }

    pub fn service(&self) -> Option<&AttributePath> {
        self.service.as_ref()
    }

    pub fn add_descriptor(&mut self, mut descriptor: Descriptor) -> Result<(), Error> {
        if self.descriptors.iter().any(|d| d.index == descriptor.index) {
            return Err(Error::new(
                format!("Descriptor index {} already in use", descriptor.index),
                format!("characteristic {}", self.uuid),
                ErrorType::PathConflict,
            ));
        }
        if let Some(path) = &self.path {
            descriptor.attach(path);
        }
        self.descriptors.push(descriptor);
        Ok(())
    }

    pub(crate) fn attach(&mut self, service: &AttributePath) {
        let path = service.child("char", self.index);
        for descriptor in self.descriptors.iter_mut() {
            descriptor.attach(&path);
        }
        self.path = Some(path);
        self.service = Some(service.clone());
    }

    pub fn read_value(&mut self, options: &ReadOptions) -> Result<Vec<u8>, AttributeError> {
        if !self.flags.readable() {
            return Err(AttributeError::NotPermitted);
        }
        self.behavior.read_value(&mut self.value, options)
    }

    pub fn write_value(
        &mut self,
        incoming: Vec<u8>,
        options: &WriteOptions,
    ) -> Result<(), AttributeError> {
        if !self.flags.writable() {
            return Err(AttributeError::NotPermitted);
        }
        self.behavior.write_value(&mut self.value, incoming, options)
    }

    pub fn descriptor_paths(&self) -> Vec<AttributePath> {
        self.descriptors
            .iter()
            .filter_map(|d| d.path().cloned())
            .collect()
    }

    pub fn get_all(&self, interface: &str) -> Result<PropertyMap, AttributeError> {
        check_interface(interface, GATT_CHRC_IFACE)?;
        let mut properties = PropertyMap::new();
        properties.insert("UUID".into(), PropertyValue::Str(self.uuid.to_string()));
        if let Some(service) = &self.service {
            properties.insert("Service".into(), PropertyValue::Path(service.clone()));
        }
        properties.insert("Flags".into(), PropertyValue::Strings(self.flags.to_strings()));
        properties.insert(
            "Descriptors".into(),
            PropertyValue::Paths(self.descriptor_paths()),
        );
        Ok(properties)
    }
}
