//! Single owner of the attribute tree.
//!
//! Stack callbacks may run on any task; they only hold a [`DispatcherHandle`]
//! and send a [`PeripheralEvent`] carrying a oneshot responder. The
//! [`Dispatcher`] applies events one at a time, so every mutation of the tree
//! is serialized through it.

use super::application::Application;
use super::attribute::{AttributeError, AttributePath, ReadOptions, WriteOptions};
use super::peripheral_event::PeripheralEvent;
use tokio::sync::{mpsc, oneshot};

pub const DEFAULT_QUEUE_DEPTH: usize = 32;

pub fn channel(application: Application, buffer: usize) -> (Dispatcher, DispatcherHandle) {
    let (sender, receiver) = mpsc::channel(buffer);
    (
        Dispatcher {
            application,
            receiver,
        },
        DispatcherHandle { sender },
    )
}

#[derive(Debug)]
pub struct Dispatcher {
    application: Application,
    receiver: mpsc::Receiver<PeripheralEvent>,
}

impl Dispatcher {
    pub fn application(&self) -> &Application {
        &self.application
    }

    /// Serves events until every handle is dropped, then hands the tree back.
    pub async fn run(mut self) -> Application {
        while let Some(event) = self.receiver.recv().await {
            self.handle(event);
        }
        log::debug!("Dispatcher channel closed");
        self.application
    }

    pub fn handle(&mut self, event: PeripheralEvent) {
        match event {
            PeripheralEvent::ReadRequest {
                path,
                options,
                responder,
            } => {
                let result = self.application.read_value(&path, &options);
                if let Err(err) = &result {
                    log::warn!("Read of {} failed: {}", path, err);
                }
                if responder.send(result).is_err() {
                    log::warn!("Read requester for {} went away", path);
                }
            }
            PeripheralEvent::WriteRequest {
                path,
                value,
                options,
                responder,
            } => {
                let result = self.application.write_value(&path, value, &options);
                if let Err(err) = &result {
                    log::warn!("Write to {} failed: {}", path, err);
                }
                if responder.send(result).is_err() {
                    log::warn!("Write requester for {} went away", path);
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct DispatcherHandle {
    sender: mpsc::Sender<PeripheralEvent>,
}

impl DispatcherHandle {
    pub async fn read(
        &self,
        path: AttributePath,
        options: ReadOptions,
    ) -> Result<Vec<u8>, AttributeError> {
        let (responder, response) = oneshot::channel();
        self.send(PeripheralEvent::ReadRequest {
            path,
            options,
            responder,
        })
        .await?;
        response.await.map_err(|_| stopped())?
    }

    pub async fn write(
        &self,
        path: AttributePath,
        value: Vec<u8>,
        options: WriteOptions,
    ) -> Result<(), AttributeError> {
        let (responder, response) = oneshot::channel();
        self.send(PeripheralEvent::WriteRequest {
            path,
            value,
            options,
            responder,
        })
        .await?;
        response.await.map_err(|_| stopped())?
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    async fn send(&self, event: PeripheralEvent) -> Result<(), AttributeError> {
        self.sender.send(event).await.map_err(|err| {
            log::error!("Error sending event for {}: dispatcher stopped", err.0.path());
            stopped()
        })
    }
}

fn stopped() -> AttributeError {
    AttributeError::Failed("dispatcher stopped".into())
}
