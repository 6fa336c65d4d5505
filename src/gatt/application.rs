//! Root of the exported attribute tree.
//!
//! The application owns its services, which own their characteristics, which
//! own their descriptors. Paths are handed out when a node is attached and
//! the caller-supplied indices are used verbatim, so a sibling reusing an
//! index is rejected instead of silently shadowing the first one.

use super::attribute::{
    AttributeError, AttributePath, InterfaceMap, ReadOptions, WriteOptions, GATT_CHRC_IFACE,
    GATT_DESC_IFACE, GATT_SERVICE_IFACE,
};
use super::characteristic::Characteristic;
use super::descriptor::Descriptor;
use super::properties::Flags;
use super::service::Service;
use crate::{Error, ErrorType};
use std::collections::BTreeMap;
use uuid::Uuid;

pub const DEFAULT_APPLICATION_PATH: &str = "/org/bluez/gardener";

#[derive(Debug)]
pub struct Application {
    path: AttributePath,
    services: Vec<Service>,
}

impl Default for Application {
    fn default() -> Self {
        Application::new(DEFAULT_APPLICATION_PATH)
    }
}

impl Application {
    pub fn new(path: impl Into<String>) -> Self {
        Application {
            path: AttributePath::new(path),
            services: vec![],
        }
    }

    pub fn get_path(&self) -> &AttributePath {
        &self.path
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn add_service(&mut self, mut service: Service) -> Result<&AttributePath, Error> {
        if self.services.iter().any(|s| s.index == service.index) {
            return Err(Error::new(
                format!("Service index {} already in use", service.index),
                format!("application {}", self.path),
                ErrorType::PathConflict,
            ));
        }
        service.attach(&self.path);
        log::debug!(
            "Added service {} at {}",
            service.uuid,
            service.path().map(|p| p.as_str()).unwrap_or_default()
        );
        self.services.push(service);
        let service = &self.services[self.services.len() - 1];
        service
            .path()
            .ok_or_else(|| Error::from_type(ErrorType::Unknown))
    }

    /// Every object below the root with its interface properties, the view
    /// BlueZ reads through `ObjectManager.GetManagedObjects`.
    pub fn get_managed_objects(&self) -> BTreeMap<AttributePath, InterfaceMap> {
        let mut objects = BTreeMap::new();
        for service in &self.services {
            if let (Some(path), Ok(props)) = (service.path(), service.get_all(GATT_SERVICE_IFACE))
            {
                objects.insert(
                    path.clone(),
                    InterfaceMap::from([(GATT_SERVICE_IFACE.to_string(), props)]),
                );
            }
            for chrc in &service.characteristics {
                if let (Some(path), Ok(props)) = (chrc.path(), chrc.get_all(GATT_CHRC_IFACE)) {
                    objects.insert(
                        path.clone(),
                        InterfaceMap::from([(GATT_CHRC_IFACE.to_string(), props)]),
                    );
                }
                for desc in &chrc.descriptors {
                    if let (Some(path), Ok(props)) = (desc.path(), desc.get_all(GATT_DESC_IFACE))
                    {
                        objects.insert(
                            path.clone(),
                            InterfaceMap::from([(GATT_DESC_IFACE.to_string(), props)]),
                        );
                    }
                }
            }
        }
        objects
    }

    pub fn characteristic_mut(&mut self, path: &AttributePath) -> Option<&mut Characteristic> {
        self.services
            .iter_mut()
            .filter(|s| s.path().is_some_and(|p| p.is_ancestor_of(path)))
            .flat_map(|s| s.characteristics.iter_mut())
            .find(|c| c.path() == Some(path))
    }

    pub fn descriptor_mut(&mut self, path: &AttributePath) -> Option<&mut Descriptor> {
        self.services
            .iter_mut()
            .flat_map(|s| s.characteristics.iter_mut())
            .filter(|c| c.path().is_some_and(|p| p.is_ancestor_of(path)))
            .flat_map(|c| c.descriptors.iter_mut())
            .find(|d| d.path() == Some(path))
    }

    pub fn read_value(
        &mut self,
        path: &AttributePath,
        options: &ReadOptions,
    ) -> Result<Vec<u8>, AttributeError> {
        if let Some(chrc) = self.characteristic_mut(path) {
            return chrc.read_value(options);
        }
        match self.descriptor_mut(path) {
            Some(desc) => desc.read_value(options),
            None => Err(AttributeError::UnknownAttribute(path.clone())),
        }
    }

    pub fn write_value(
        &mut self,
        path: &AttributePath,
        value: Vec<u8>,
        options: &WriteOptions,
    ) -> Result<(), AttributeError> {
        if let Some(chrc) = self.characteristic_mut(path) {
            return chrc.write_value(value, options);
        }
        match self.descriptor_mut(path) {
            Some(desc) => desc.write_value(value, options),
            None => Err(AttributeError::UnknownAttribute(path.clone())),
        }
    }

    /// Shape of the tree without the values, handed to the Bluetooth stack so
    /// it can export one object per attribute while the tree itself stays with
    /// the dispatcher.
    pub fn layout(&self) -> ApplicationLayout {
        ApplicationLayout {
            path: self.path.clone(),
            services: self
                .services
                .iter()
                .filter_map(|service| {
                    Some(ServiceLayout {
                        path: service.path()?.clone(),
                        uuid: service.uuid,
                        primary: service.primary,
                        characteristics: service
                            .characteristics
                            .iter()
                            .filter_map(|chrc| {
                                Some(CharacteristicLayout {
                                    path: chrc.path()?.clone(),
                                    uuid: chrc.uuid,
                                    flags: chrc.flags.clone(),
                                    descriptors: chrc
                                        .descriptors
                                        .iter()
                                        .filter_map(|desc| {
                                            Some(DescriptorLayout {
                                                path: desc.path()?.clone(),
                                                uuid: desc.uuid,
                                                flags: desc.flags.clone(),
                                            })
                                        })
                                        .collect(),
                                })
                            })
                            .collect(),
                    })
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationLayout {
    pub path: AttributePath,
    pub services: Vec<ServiceLayout>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceLayout {
    pub path: AttributePath,
    pub uuid: Uuid,
    pub primary: bool,
    pub characteristics: Vec<CharacteristicLayout>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacteristicLayout {
    pub path: AttributePath,
    pub uuid: Uuid,
    pub flags: Flags,
    pub descriptors: Vec<DescriptorLayout>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorLayout {
    pub path: AttributePath,
    pub uuid: Uuid,
    pub flags: Flags,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gatt::attribute::PropertyValue;
    use crate::gatt::properties::AttributeFlag;
    use crate::uuid_ext::SdpShortUuid;

    fn service(index: u16, short: u16) -> Service {
        let mut service = Service::new(index, Uuid::from_sdp_short_uuid(short), true);
        let mut chrc = Characteristic::with_static_value(
            0,
            Uuid::from_sdp_short_uuid(0x2A19_u16),
            &[AttributeFlag::Read, AttributeFlag::Write],
            vec![7],
        );
        chrc.add_descriptor(Descriptor::new(
            1,
            Uuid::from_sdp_short_uuid(0x2901_u16),
            &[AttributeFlag::Read],
            b"level".to_vec(),
        ))
        .unwrap();
        service.add_characteristic(chrc).unwrap();
        service
    }

    #[test]
    fn distinct_indices_get_distinct_stable_paths() {
        let mut app = Application::new("/app");
        let first = app.add_service(service(2, 0x180F)).unwrap().clone();
        let second = app.add_service(service(3, 0x180A)).unwrap().clone();

        assert_eq!(first.as_str(), "/app/service2");
        assert_eq!(second.as_str(), "/app/service3");
        assert_eq!(app.services()[0].path(), Some(&first));
        assert_eq!(app.services()[1].path(), Some(&second));
    }

    #[test]
    fn colliding_service_index_is_path_conflict() {
        let mut app = Application::new("/app");
        app.add_service(service(2, 0x180F)).unwrap();
        let err = app.add_service(service(2, 0x180A)).unwrap_err();
        assert_eq!(err.kind, ErrorType::PathConflict);
        assert_eq!(app.services().len(), 1);
        assert_eq!(
            app.services()[0].uuid,
            Uuid::from_sdp_short_uuid(0x180F_u16)
        );
    }

    #[test]
    fn characteristics_inherit_service_path() {
        let mut app = Application::new("/app");
        app.add_service(Service::new(0, Uuid::from_sdp_short_uuid(0x180F_u16), true))
            .unwrap();
        let mut service = Service::new(1, Uuid::from_sdp_short_uuid(0x180A_u16), false);
        service
            .add_characteristic(Characteristic::with_static_value(
                5,
                Uuid::from_sdp_short_uuid(0x2A29_u16),
                &[AttributeFlag::Read],
                b"acme".to_vec(),
            ))
            .unwrap();
        app.add_service(service).unwrap();
        assert_eq!(
            app.services()[1].characteristic_paths(),
            vec![AttributePath::new("/app/service1/char5")]
        );
    }

    #[test]
    fn dispatches_reads_and_writes_by_path() {
        let mut app = Application::new("/app");
        app.add_service(service(0, 0x180F)).unwrap();
        let chrc = AttributePath::new("/app/service0/char0");
        let desc = AttributePath::new("/app/service0/char0/desc1");

        app.write_value(&chrc, vec![42], &WriteOptions::default())
            .unwrap();
        assert_eq!(
            app.read_value(&chrc, &ReadOptions::default()).unwrap(),
            vec![42]
        );
        assert_eq!(
            app.read_value(&desc, &ReadOptions::default()).unwrap(),
            b"level".to_vec()
        );
        assert_eq!(
            app.write_value(&desc, vec![1], &WriteOptions::default()),
            Err(AttributeError::NotPermitted)
        );

        let missing = AttributePath::new("/app/service0/char9");
        assert_eq!(
            app.read_value(&missing, &ReadOptions::default()),
            Err(AttributeError::UnknownAttribute(missing))
        );
    }

    #[test]
    fn managed_objects_cover_whole_tree() {
        let mut app = Application::new("/app");
        app.add_service(service(0, 0x180F)).unwrap();
        let objects = app.get_managed_objects();

        let paths: Vec<&str> = objects.keys().map(|p| p.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "/app/service0",
                "/app/service0/char0",
                "/app/service0/char0/desc1"
            ]
        );
        let service_props = &objects[&AttributePath::new("/app/service0")][GATT_SERVICE_IFACE];
        assert_eq!(service_props.get("Primary"), Some(&PropertyValue::Bool(true)));
    }

    #[test]
    fn layout_mirrors_tree() {
        let mut app = Application::new("/app");
        app.add_service(service(0, 0x180F)).unwrap();
        let layout = app.layout();
        assert_eq!(layout.services.len(), 1);
        let chrc = &layout.services[0].characteristics[0];
        assert_eq!(chrc.path.as_str(), "/app/service0/char0");
        assert!(chrc.flags.writable());
        assert_eq!(
            chrc.descriptors[0].path.as_str(),
            "/app/service0/char0/desc1"
        );
    }
}
