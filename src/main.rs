use anyhow::Context;
use gardener::config::Config;
use gardener::logging::init_logger;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("loading configuration")?;
    let _guard = init_logger(&config.log).context("initializing logging")?;

    let application = gardener::gardener::application(config.strict_commands)?;
    let advertisement = gardener::gardener::advertisement(&config.local_name);
    let agent = gardener::gardener::agent();

    serve(config, application, advertisement, agent).await
}

#[cfg(target_os = "linux")]
async fn serve(
    config: Config,
    application: gardener::gatt::application::Application,
    advertisement: gardener::advertisement::Advertisement,
    agent: gardener::agent::Agent,
) -> anyhow::Result<()> {
    let mut peripheral = gardener::Peripheral::new(gardener::BluezStack::new(config.adapter));
    if let Err(err) = peripheral
        .run(application, advertisement, agent, shutdown_signal())
        .await
    {
        // the peripheral already logged the failure; nothing is left registered
        log::error!("Peripheral stopped: {}", err);
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
async fn serve(
    _config: Config,
    _application: gardener::gatt::application::Application,
    _advertisement: gardener::advertisement::Advertisement,
    _agent: gardener::agent::Agent,
) -> anyhow::Result<()> {
    log::error!("BlueZ is only available on Linux");
    Ok(())
}

#[cfg(target_os = "linux")]
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl-C: {}", err);
            futures::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                log::error!("Failed to listen for SIGTERM: {}", err);
                futures::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => log::info!("Received Ctrl-C"),
        _ = terminate => log::info!("Received SIGTERM"),
    }
}
