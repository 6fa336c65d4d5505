//! Drives the peripheral against a scripted in-memory Bluetooth stack.

use async_trait::async_trait;
use gardener::advertisement::Advertisement;
use gardener::agent::Agent;
use gardener::gatt::application::ApplicationLayout;
use gardener::gatt::attribute::{AttributeError, AttributePath, ReadOptions, WriteOptions};
use gardener::gatt::dispatcher::DispatcherHandle;
use gardener::{gardener as garden, BluetoothStack, Error, ErrorType, Peripheral, Stage};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const WATER_PLANTS_PATH: &str = "/org/bluez/gardener/service2/char0";
const DESCRIPTION_PATH: &str = "/org/bluez/gardener/service2/char0/desc1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Accept,
    Reject,
    Hang,
}

type CallLog = Arc<Mutex<Vec<String>>>;

struct FakeRegistration {
    what: &'static str,
    calls: CallLog,
}

impl Drop for FakeRegistration {
    fn drop(&mut self) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("release {}", self.what));
    }
}

struct FakeStack {
    has_gatt_manager: bool,
    advertisement: Outcome,
    application: Outcome,
    calls: CallLog,
    handle: Arc<Mutex<Option<DispatcherHandle>>>,
    // BlueZ keeps at most one agent per bus connection
    agent: Option<String>,
}

impl FakeStack {
    fn new(advertisement: Outcome, application: Outcome) -> Self {
        FakeStack {
            has_gatt_manager: true,
            advertisement,
            application,
            calls: Arc::new(Mutex::new(Vec::new())),
            handle: Arc::new(Mutex::new(None)),
            agent: None,
        }
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    async fn settle(
        &self,
        what: &'static str,
        outcome: Outcome,
    ) -> Result<FakeRegistration, Error> {
        // let the sibling registration start before this one settles
        tokio::task::yield_now().await;
        match outcome {
            Outcome::Accept => Ok(FakeRegistration {
                what,
                calls: self.calls.clone(),
            }),
            Outcome::Reject => Err(Error::new(
                "org.bluez.Error.Failed",
                format!("{} rejected", what),
                ErrorType::Bluez,
            )),
            Outcome::Hang => futures::future::pending().await,
        }
    }
}

#[async_trait]
impl BluetoothStack for FakeStack {
    type Registration = FakeRegistration;

    async fn find_gatt_manager(&mut self) -> Result<Option<String>, Error> {
        self.record("find_gatt_manager");
        Ok(self.has_gatt_manager.then(|| "hci0".to_string()))
    }

    async fn power_on(&mut self) -> Result<(), Error> {
        self.record("power_on");
        Ok(())
    }

    async fn register_agent(&mut self, agent: &Agent) -> Result<(), Error> {
        self.record(format!("register_agent {}", agent.path));
        if self.agent.is_some() {
            return Err(Error::new(
                "org.bluez.Error.AlreadyExists",
                agent.path.clone(),
                ErrorType::Bluez,
            ));
        }
        self.agent = Some(agent.path.clone());
        Ok(())
    }

    async fn request_default_agent(&mut self, agent: &Agent) -> Result<(), Error> {
        self.record(format!("request_default_agent {}", agent.path));
        if self.agent.as_deref() != Some(agent.path.as_str()) {
            return Err(Error::new(
                "org.bluez.Error.DoesNotExist",
                agent.path.clone(),
                ErrorType::Bluez,
            ));
        }
        Ok(())
    }

    async fn register_advertisement(
        &self,
        advertisement: &Advertisement,
    ) -> Result<FakeRegistration, Error> {
        self.record(format!(
            "register_advertisement {}",
            advertisement.local_name.as_deref().unwrap_or("")
        ));
        self.settle("advertisement", self.advertisement).await
    }

    async fn register_application(
        &self,
        layout: &ApplicationLayout,
        handle: DispatcherHandle,
    ) -> Result<FakeRegistration, Error> {
        self.record(format!("register_application {}", layout.path));
        *self.handle.lock().unwrap() = Some(handle);
        self.settle("application", self.application).await
    }
}

fn captured(handle: &Arc<Mutex<Option<DispatcherHandle>>>) -> DispatcherHandle {
    handle.lock().unwrap().clone().expect("application was never registered")
}

#[tokio::test]
async fn missing_gatt_manager_registers_nothing() {
    let mut stack = FakeStack::new(Outcome::Accept, Outcome::Accept);
    stack.has_gatt_manager = false;
    let calls = stack.calls.clone();
    let mut peripheral = Peripheral::new(stack);

    let err = peripheral
        .run(
            garden::application(false).unwrap(),
            garden::advertisement(garden::LOCAL_NAME),
            garden::agent(),
            futures::future::pending::<()>(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorType::AdapterUnavailable);
    assert_eq!(peripheral.stage(), Stage::Start);
    assert_eq!(*calls.lock().unwrap(), vec!["find_gatt_manager"]);
}

#[tokio::test]
async fn rejected_advertisement_stops_the_loop() {
    let stack = FakeStack::new(Outcome::Reject, Outcome::Hang);
    let handle = stack.handle.clone();
    let mut peripheral = Peripheral::new(stack);
    let context = peripheral.context();

    let err = tokio::time::timeout(
        Duration::from_secs(5),
        peripheral.run(
            garden::application(false).unwrap(),
            garden::advertisement(garden::LOCAL_NAME),
            garden::agent(),
            futures::future::pending::<()>(),
        ),
    )
    .await
    .expect("run did not return")
    .unwrap_err();

    assert_eq!(err.kind, ErrorType::RegistrationFailure);
    assert!(err.to_string().contains("advertisement"));
    assert!(context.is_stopped());
    assert_eq!(peripheral.stage(), Stage::Shutdown);

    // the dispatcher is gone, so late requests fail instead of hanging
    let late = captured(&handle)
        .read(AttributePath::new(WATER_PLANTS_PATH), ReadOptions::default())
        .await;
    assert!(matches!(late, Err(AttributeError::Failed(_))));
}

#[tokio::test]
async fn rejected_application_is_fatal() {
    let stack = FakeStack::new(Outcome::Accept, Outcome::Reject);
    let calls = stack.calls.clone();
    let mut peripheral = Peripheral::new(stack);

    let err = peripheral
        .run(
            garden::application(false).unwrap(),
            garden::advertisement(garden::LOCAL_NAME),
            garden::agent(),
            futures::future::pending::<()>(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorType::RegistrationFailure);
    assert!(err.is_fatal());
    assert_eq!(peripheral.stage(), Stage::Shutdown);
    assert!(!calls
        .lock()
        .unwrap()
        .iter()
        .any(|call| call.starts_with("request_default_agent")));
}

#[tokio::test]
async fn serves_requests_until_stopped() {
    let stack = FakeStack::new(Outcome::Accept, Outcome::Accept);
    let calls = stack.calls.clone();
    let handle = stack.handle.clone();
    let mut peripheral = Peripheral::new(stack);
    let context = peripheral.context();
    let mut stages = peripheral.stages();

    let client = async {
        stages
            .wait_for(|stage| *stage == Stage::Running)
            .await
            .unwrap();
        let handle = captured(&handle);
        let water_plants = AttributePath::new(WATER_PLANTS_PATH);

        let first = handle
            .read(water_plants.clone(), ReadOptions::default())
            .await
            .unwrap();
        let second = handle
            .read(water_plants.clone(), ReadOptions::default())
            .await
            .unwrap();
        assert_eq!(first, b"OFF".to_vec());
        assert_eq!(second, first);

        // permissive mode stores the write, the next read reports the machine
        handle
            .write(water_plants.clone(), b"ON".to_vec(), WriteOptions::default())
            .await
            .unwrap();
        let after_write = handle
            .read(water_plants, ReadOptions::default())
            .await
            .unwrap();
        assert_eq!(after_write, b"OFF".to_vec());

        let garbled = handle
            .write(
                AttributePath::new(WATER_PLANTS_PATH),
                vec![0xC3, 0x28],
                WriteOptions::default(),
            )
            .await;
        assert!(matches!(garbled, Err(AttributeError::Failed(_))));

        let description = AttributePath::new(DESCRIPTION_PATH);
        assert_eq!(
            handle
                .read(description.clone(), ReadOptions::default())
                .await
                .unwrap(),
            garden::water_plants::WATER_PLANTS_DESCRIPTION.to_vec()
        );
        assert_eq!(
            handle
                .write(description, b"x".to_vec(), WriteOptions::default())
                .await,
            Err(AttributeError::NotPermitted)
        );

        context.stop();
    };

    let (result, ()) = tokio::join!(
        peripheral.run(
            garden::application(false).unwrap(),
            garden::advertisement(garden::LOCAL_NAME),
            garden::agent(),
            futures::future::pending::<()>(),
        ),
        client
    );

    result.unwrap();
    assert_eq!(peripheral.stage(), Stage::Shutdown);
    assert_eq!(
        *calls.lock().unwrap(),
        vec![
            "find_gatt_manager",
            "power_on",
            "register_agent /dave/agent",
            "register_advertisement Gardener",
            "register_application /org/bluez/gardener",
            "request_default_agent /dave/agent",
            "release application",
            "release advertisement",
        ]
    );
}

#[tokio::test]
async fn strict_mode_refuses_unknown_commands() {
    let stack = FakeStack::new(Outcome::Accept, Outcome::Accept);
    let handle = stack.handle.clone();
    let mut peripheral = Peripheral::new(stack);
    let mut stages = peripheral.stages();
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    let client = async {
        stages
            .wait_for(|stage| *stage == Stage::Running)
            .await
            .unwrap();
        let handle = captured(&handle);
        let water_plants = AttributePath::new(WATER_PLANTS_PATH);

        assert_eq!(
            handle
                .write(water_plants.clone(), b"MAYBE".to_vec(), WriteOptions::default())
                .await,
            Err(AttributeError::NotPermitted)
        );
        handle
            .write(water_plants, b"UNKNOWN".to_vec(), WriteOptions::default())
            .await
            .unwrap();

        shutdown_tx.send(()).unwrap();
    };

    let (result, ()) = tokio::join!(
        peripheral.run(
            garden::application(true).unwrap(),
            garden::advertisement(garden::LOCAL_NAME),
            garden::agent(),
            async {
                let _ = shutdown_rx.await;
            },
        ),
        client
    );

    result.unwrap();
    assert_eq!(peripheral.stage(), Stage::Shutdown);
}
