use super::attribute::{AttributeError, AttributePath, ReadOptions, WriteOptions};
use tokio::sync::oneshot;

/// Inbound attribute access, forwarded from the Bluetooth stack to the task
/// that owns the attribute tree.
#[derive(Debug)]
pub enum PeripheralEvent {
    ReadRequest {
        path: AttributePath,
        options: ReadOptions,
        responder: oneshot::Sender<Result<Vec<u8>, AttributeError>>,
    },
    WriteRequest {
        path: AttributePath,
        value: Vec<u8>,
        options: WriteOptions,
        responder: oneshot::Sender<Result<(), AttributeError>>,
    },
}

impl PeripheralEvent {
    pub fn path(&self) -> &AttributePath {
        match self {
            PeripheralEvent::ReadRequest { path, .. } => path,
            PeripheralEvent::WriteRequest { path, .. } => path,
        }
    }
}
