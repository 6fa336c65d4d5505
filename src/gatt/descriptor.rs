use super::attribute::{
    check_interface, AttributeError, AttributePath, PropertyMap, PropertyValue, ReadOptions,
    WriteOptions, GATT_DESC_IFACE,
};
use super::properties::{AttributeFlag, Flags};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Descriptor {
    pub uuid: Uuid,
    pub index: u16,
    pub flags: Flags,
    pub value: Vec<u8>,
    path: Option<AttributePath>,
    characteristic: Option<AttributePath>,
}

impl Descriptor {
    pub fn new(index: u16, uuid: Uuid, flags: &[AttributeFlag], value: Vec<u8>) -> Self {
        Descriptor {
            uuid,
            index,
            flags: Flags::new(flags),
            value,
            path: None,
            characteristic: None,
        }
    }

    pub fn writable(&self) -> bool {
        self.flags.writable()
    }

    pub fn path(&self) -> Option<&AttributePath> {
        self.path.as_ref()
    }

    pub fn characteristic(&self) -> Option<&AttributePath> {
        self.characteristic.as_ref()
    }

    pub(crate) fn attach(&mut self, characteristic: &AttributePath) {
        self.path = Some(characteristic.child("desc", self.index));
        self.characteristic = Some(characteristic.clone());
    }

    pub fn read_value(&self, _options: &ReadOptions) -> Result<Vec<u8>, AttributeError> {
        if !self.flags.readable() {
            return Err(AttributeError::NotPermitted);
        }
        Ok(self.value.clone())
    }

    pub fn write_value(
        &mut self,
        value: Vec<u8>,
        _options: &WriteOptions,
    ) -> Result<(), AttributeError> {
        if !self.writable() {
            return Err(AttributeError::NotPermitted);
        }
        self.value = value;
        Ok(())
    }

    pub fn get_all(&self, interface: &str) -> Result<PropertyMap, AttributeError> {
        check_interface(interface, GATT_DESC_IFACE)?;
        let mut properties = PropertyMap::new();
        properties.insert("UUID".into(), PropertyValue::Str(self.uuid.to_string()));
        if let Some(characteristic) = &self.characteristic {
            properties.insert(
                "Characteristic".into(),
                PropertyValue::Path(characteristic.clone()),
            );
        }
        properties.insert("Flags".into(), PropertyValue::Strings(self.flags.to_strings()));
        Ok(properties)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gatt::attribute::GATT_SERVICE_IFACE;
    use crate::uuid_ext::SdpShortUuid;

    #[test]
    fn read_only_descriptor_rejects_writes() {
        let mut desc = Descriptor::new(
            1,
            Uuid::from_sdp_short_uuid(0x2901_u16),
            &[AttributeFlag::Read],
            b"label".to_vec(),
        );
        assert!(!desc.writable());
        assert_eq!(
            desc.write_value(b"other".to_vec(), &WriteOptions::default()),
            Err(AttributeError::NotPermitted)
        );
        assert_eq!(desc.read_value(&ReadOptions::default()).unwrap(), b"label");
    }

    #[test]
    fn writable_descriptor_stores_value() {
        let mut desc = Descriptor::new(
            0,
            Uuid::from_sdp_short_uuid(0x2902_u16),
            &[AttributeFlag::Read, AttributeFlag::Write],
            vec![0, 0],
        );
        desc.write_value(vec![1, 0], &WriteOptions::default()).unwrap();
        assert_eq!(desc.read_value(&ReadOptions::default()).unwrap(), vec![1, 0]);
    }

    #[test]
    fn get_all_reports_parent_after_attach() {
        let mut desc = Descriptor::new(
            3,
            Uuid::from_sdp_short_uuid(0x2901_u16),
            &[AttributeFlag::Read],
            vec![],
        );
        let parent = AttributePath::new("/app/service0/char0");
        desc.attach(&parent);
        assert_eq!(desc.path().unwrap().as_str(), "/app/service0/char0/desc3");

        let props = desc.get_all(GATT_DESC_IFACE).unwrap();
        assert_eq!(props.get("Characteristic"), Some(&PropertyValue::Path(parent)));
        assert_eq!(
            props.get("Flags"),
            Some(&PropertyValue::Strings(vec!["read".into()]))
        );
        assert!(desc.get_all(GATT_SERVICE_IFACE).is_err());
    }
}
