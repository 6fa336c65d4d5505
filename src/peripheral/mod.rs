#[cfg(target_os = "linux")]
pub mod bluez;
pub mod run_loop;

use crate::advertisement::Advertisement;
use crate::agent::Agent;
use crate::gatt::application::{Application, ApplicationLayout};
use crate::gatt::dispatcher::{self, DispatcherHandle, DEFAULT_QUEUE_DEPTH};
use crate::{Error, ErrorType};
use async_trait::async_trait;
use run_loop::RunContext;
use std::future::Future;
use tokio::sync::watch;

/// The Bluetooth stack as seen from the peripheral: an adapter with a GATT
/// manager, an advertising manager and an agent manager.
#[async_trait]
pub trait BluetoothStack: Send + Sync {
    /// Released when dropped.
    type Registration: Send;

    /// Locates the adapter exposing `GattManager1`, returning its name.
    async fn find_gatt_manager(&mut self) -> Result<Option<String>, Error>;

    async fn power_on(&mut self) -> Result<(), Error>;

    async fn register_agent(&mut self, agent: &Agent) -> Result<(), Error>;

    async fn request_default_agent(&mut self, agent: &Agent) -> Result<(), Error>;

    async fn register_advertisement(
        &self,
        advertisement: &Advertisement,
    ) -> Result<Self::Registration, Error>;

    /// Exports one object per attribute in `layout`; reads and writes on them
    /// are forwarded through `handle`.
    async fn register_application(
        &self,
        layout: &ApplicationLayout,
        handle: DispatcherHandle,
    ) -> Result<Self::Registration, Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    AdapterPowerOn,
    AgentRegistered,
    AdvertisementRequested,
    ApplicationRequested,
    DefaultAgentRequested,
    Running,
    Shutdown,
}

pub struct Peripheral<S: BluetoothStack> {
    stack: S,
    context: RunContext,
    stage: watch::Sender<Stage>,
}

impl<S: BluetoothStack> Peripheral<S> {
    pub fn new(stack: S) -> Self {
        let (stage, _) = watch::channel(Stage::Start);
        Peripheral {
            stack,
            context: RunContext::new(),
            stage,
        }
    }

    pub fn context(&self) -> RunContext {
        self.context.clone()
    }

    pub fn stage(&self) -> Stage {
        *self.stage.borrow()
    }

    pub fn stages(&self) -> watch::Receiver<Stage> {
        self.stage.subscribe()
    }

    fn set_stage(&self, stage: Stage) {
        log::debug!("Peripheral stage {:?}", stage);
        self.stage.send_replace(stage);
    }

    /// Brings the peripheral up and serves until `shutdown` resolves or the
    /// run context is stopped. Registration failures are fatal and returned.
    pub async fn run(
        &mut self,
        application: Application,
        advertisement: Advertisement,
        agent: Agent,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), Error> {
        tokio::pin!(shutdown);

        let adapter = match self.stack.find_gatt_manager().await {
            Ok(Some(adapter)) => adapter,
            Ok(None) => {
                log::error!("GattManager1 interface not found");
                return Err(Error::from_type(ErrorType::AdapterUnavailable));
            }
            Err(err) => {
                log::error!("GattManager1 interface not found: {}", err);
                return Err(err);
            }
        };

        self.stack.power_on().await.map_err(|err| {
            log::error!("Failed to power on {}: {}", adapter, err);
            err
        })?;
        log::info!("Adapter {} powered on", adapter);
        self.set_stage(Stage::AdapterPowerOn);

        self.stack.register_agent(&agent).await.map_err(|err| {
            log::error!("Failed to register agent: {}", err);
            err
        })?;
        log::info!(
            "Agent registered at {} ({})",
            agent.path,
            agent.capability.as_str()
        );
        self.set_stage(Stage::AgentRegistered);

        let (dispatcher, handle) = dispatcher::channel(application, DEFAULT_QUEUE_DEPTH);
        let layout = dispatcher.application().layout();
        let dispatch_task = tokio::spawn(dispatcher.run());

        let registrations = {
            let stack = &self.stack;
            let context = &self.context;

            log::info!("Registering advertisement...");
            self.set_stage(Stage::AdvertisementRequested);
            let advertise = async {
                match stack.register_advertisement(&advertisement).await {
                    Ok(registration) => {
                        log::info!("Advertisement registered");
                        Ok(registration)
                    }
                    Err(err) => {
                        log::error!("Failed to register advertisement: {}", err);
                        Err(Error::registration("advertisement", err))
                    }
                }
            };

            log::info!("Registering GATT application...");
            self.set_stage(Stage::ApplicationRequested);
            let serve = async {
                match stack.register_application(&layout, handle).await {
                    Ok(registration) => {
                        log::info!("GATT application registered");
                        Ok(registration)
                    }
                    Err(err) => {
                        log::error!("Failed to register application: {}", err);
                        Err(Error::registration("application", err))
                    }
                }
            };

            tokio::select! {
                joined = async { tokio::try_join!(advertise, serve) } => Some(joined),
                _ = context.stopped() => None,
                _ = &mut shutdown => None,
            }
        };

        let (advertisement_registration, application_registration) = match registrations {
            Some(Ok(registrations)) => registrations,
            Some(Err(err)) => {
                self.context.stop();
                self.finish(dispatch_task).await;
                return Err(err);
            }
            None => {
                log::info!("Stopped while registering");
                self.finish(dispatch_task).await;
                return Ok(());
            }
        };

        if let Err(err) = self.stack.request_default_agent(&agent).await {
            log::error!("Failed to request default agent: {}", err);
            self.context.stop();
            self.finish(dispatch_task).await;
            return Err(err);
        }
        self.set_stage(Stage::DefaultAgentRequested);

        self.set_stage(Stage::Running);
        log::info!("Peripheral running");
        tokio::select! {
            _ = self.context.stopped() => log::info!("Run loop stopped"),
            _ = &mut shutdown => log::info!("Shutdown requested"),
        }

        drop(application_registration);
        drop(advertisement_registration);
        log::info!("Advertisement and application released");
        self.finish(dispatch_task).await;
        Ok(())
    }

    async fn finish(&self, dispatch_task: tokio::task::JoinHandle<Application>) {
        dispatch_task.abort();
        if let Err(err) = dispatch_task.await {
            if !err.is_cancelled() {
                log::warn!("Dispatcher ended abnormally: {}", err);
            }
        }
        self.set_stage(Stage::Shutdown);
    }
}
