use crate::gatt::application::{
    ApplicationLayout, CharacteristicLayout, DescriptorLayout, ServiceLayout,
};
use crate::gatt::attribute::{AttributeError, AttributePath, ReadOptions, WriteOptions};
use crate::gatt::dispatcher::DispatcherHandle;
use crate::gatt::properties::AttributeFlag;
use bluer::gatt::local::{
    Application, Characteristic, CharacteristicRead, CharacteristicReadRequest,
    CharacteristicWrite, CharacteristicWriteMethod, CharacteristicWriteRequest, Descriptor,
    DescriptorRead, DescriptorReadRequest, DescriptorWrite, DescriptorWriteRequest, ReqError,
    Service,
};
use futures::FutureExt;

impl From<AttributeError> for ReqError {
    fn from(value: AttributeError) -> Self {
        match value {
            AttributeError::NotPermitted => ReqError::NotPermitted,
            AttributeError::InvalidArgs(_)
            | AttributeError::UnknownAttribute(_)
            | AttributeError::Failed(_) => ReqError::Failed,
        }
    }
}

pub fn parse_application(layout: &ApplicationLayout, handle: DispatcherHandle) -> Application {
    Application {
        services: layout
            .services
            .iter()
            .map(|service| parse_service(service, handle.clone()))
            .collect(),
        ..Default::default()
    }
}

fn parse_service(service: &ServiceLayout, handle: DispatcherHandle) -> Service {
    Service {
        uuid: service.uuid,
        primary: service.primary,
        characteristics: service
            .characteristics
            .iter()
            .map(|chrc| parse_characteristic(chrc, handle.clone()))
            .collect(),
        ..Default::default()
    }
}

fn parse_characteristic(
    characteristic: &CharacteristicLayout,
    handle: DispatcherHandle,
) -> Characteristic {
    let flags = &characteristic.flags;
    let mut char_read: Option<CharacteristicRead> = None;
    let mut char_write: Option<CharacteristicWrite> = None;

    if flags.readable() {
        let read_handle = handle.clone();
        let path = characteristic.path.clone();
        char_read = Some(CharacteristicRead {
            read: flags.contains(AttributeFlag::Read),
            encrypt_read: flags.contains(AttributeFlag::EncryptRead),
            encrypt_authenticated_read: flags.contains(AttributeFlag::EncryptAuthenticatedRead),
            secure_read: flags.contains(AttributeFlag::SecureRead),
            fun: Box::new(move |request: CharacteristicReadRequest| {
                let handle = read_handle.clone();
                let path = path.clone();
                async move { on_read_request(handle, path, request).await }.boxed()
            }),
            ..Default::default()
        });
    }

    if flags.writable() {
        let write_handle = handle.clone();
        let path = characteristic.path.clone();
        char_write = Some(CharacteristicWrite {
            write: flags.contains(AttributeFlag::Write),
            write_without_response: flags.contains(AttributeFlag::WriteWithoutResponse),
            reliable_write: flags.contains(AttributeFlag::ReliableWrite),
            authenticated_signed_writes: flags.contains(AttributeFlag::AuthenticatedSignedWrites),
            encrypt_write: flags.contains(AttributeFlag::EncryptWrite),
            encrypt_authenticated_write: flags.contains(AttributeFlag::EncryptAuthenticatedWrite),
            secure_write: flags.contains(AttributeFlag::SecureWrite),
            method: CharacteristicWriteMethod::Fun(Box::new(
                move |value: Vec<u8>, request: CharacteristicWriteRequest| {
                    let handle = write_handle.clone();
                    let path = path.clone();
                    async move { on_write_request(handle, path, value, request).await }.boxed()
                },
            )),
            ..Default::default()
        });
    }

    if flags.contains(AttributeFlag::Notify) || flags.contains(AttributeFlag::Indicate) {
        log::warn!(
            "Characteristic {} asks for notifications, which are not served",
            characteristic.path
        );
    }

    let descriptors: Vec<Descriptor> = characteristic
        .descriptors
        .iter()
        .map(|data| parse_descriptor(data, handle.clone()))
        .collect();

    Characteristic {
        uuid: characteristic.uuid,
        read: char_read,
        write: char_write,
        descriptors,
        ..Default::default()
    }
}

fn parse_descriptor(descriptor: &DescriptorLayout, handle: DispatcherHandle) -> Descriptor {
    let flags = &descriptor.flags;
    let mut desc_read: Option<DescriptorRead> = None;

    if flags.readable() {
        let read_handle = handle.clone();
        let path = descriptor.path.clone();
        desc_read = Some(DescriptorRead {
            read: flags.contains(AttributeFlag::Read),
            encrypt_read: flags.contains(AttributeFlag::EncryptRead),
            encrypt_authenticated_read: flags.contains(AttributeFlag::EncryptAuthenticatedRead),
            secure_read: flags.contains(AttributeFlag::SecureRead),
            fun: Box::new(move |request: DescriptorReadRequest| {
                let handle = read_handle.clone();
                let path = path.clone();
                async move {
                    let options = ReadOptions {
                        offset: request.offset,
                        mtu: None,
                        device: Some(request.device_address.to_string()),
                    };
                    Ok(handle.read(path, options).await?)
                }
                .boxed()
            }),
            ..Default::default()
        });
    }

    // WriteValue stays exported even for read-only descriptors so the refusal
    // comes from the attribute model.
    let path = descriptor.path.clone();
    let desc_write = DescriptorWrite {
        write: flags.contains(AttributeFlag::Write),
        encrypt_write: flags.contains(AttributeFlag::EncryptWrite),
        encrypt_authenticated_write: flags.contains(AttributeFlag::EncryptAuthenticatedWrite),
        secure_write: flags.contains(AttributeFlag::SecureWrite),
        fun: Box::new(move |value: Vec<u8>, request: DescriptorWriteRequest| {
            let handle = handle.clone();
            let path = path.clone();
            async move {
                let options = WriteOptions {
                    offset: request.offset,
                    mtu: None,
                    device: Some(request.device_address.to_string()),
                    prepare_authorize: request.prepare_authorize,
                };
                Ok(handle.write(path, value, options).await?)
            }
            .boxed()
        }),
        ..Default::default()
    };

    Descriptor {
        uuid: descriptor.uuid,
        read: desc_read,
        write: Some(desc_write),
        ..Default::default()
    }
}

/// Handle Requests
async fn on_read_request(
    handle: DispatcherHandle,
    path: AttributePath,
    request: CharacteristicReadRequest,
) -> Result<Vec<u8>, ReqError> {
    log::debug!(
        "ReadValue {} from {} (offset {}, mtu {})",
        path,
        request.device_address,
        request.offset,
        request.mtu
    );
    let options = ReadOptions {
        offset: request.offset,
        mtu: Some(request.mtu),
        device: Some(request.device_address.to_string()),
    };
    Ok(handle.read(path, options).await?)
}

async fn on_write_request(
    handle: DispatcherHandle,
    path: AttributePath,
    value: Vec<u8>,
    request: CharacteristicWriteRequest,
) -> Result<(), ReqError> {
    log::debug!(
        "WriteValue {} from {} ({} bytes, offset {})",
        path,
        request.device_address,
        value.len(),
        request.offset
    );
    let options = WriteOptions {
        offset: request.offset,
        mtu: Some(request.mtu),
        device: Some(request.device_address.to_string()),
        prepare_authorize: request.prepare_authorize,
    };
    Ok(handle.write(path, value, options).await?)
}
