use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use rka::beacon::tunnel::{QuicBeacon, init_crypto};
use rka::cli::{Cli, Commands, StartOpts};
use rka::{RegistrationRunner, SweeperRunner, descriptor};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_crypto();
    let cli = Cli::parse();

    match cli.command {
        Commands::Start(opts) => start(*opts).await,
    }
}

async fn start(opts: StartOpts) -> anyhow::Result<()> {
    // a bad resource declaration stops the agent before any network activity
    let worker = match descriptor::assemble(&opts) {
        Ok(worker) => worker,
        Err(e) => {
            eprintln!("{e:#}");
            std::process::exit(1);
        }
    };

    let cancel = CancellationToken::new();
    spawn_signal_handler(cancel.clone());

    let registration = RegistrationRunner::new(Arc::new(QuicBeacon::new(
        worker.clone(),
        opts.beacon.registration_config(),
    )));
    let (sweeper, _ready) = SweeperRunner::new(
        Arc::new(QuicBeacon::new(worker, opts.beacon.sweep_config())),
        Duration::from_secs(opts.sweep_interval),
    );

    let sweep_task = tokio::spawn(sweeper.run(cancel.clone()));
    let result = tokio::spawn(registration.run(cancel.clone())).await?;

    // however the tunnel ended, stop the sweep loop alongside it
    cancel.cancel();
    let _ = sweep_task.await;
    result
}

/// Translate process signals into cancellation; the runner loops themselves
/// never touch signal APIs.
fn spawn_signal_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        use tokio::signal::unix::{SignalKind, signal};

        let ctrl_c = tokio::signal::ctrl_c();
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                error!("failed to listen for SIGTERM: {e}");
                let _ = ctrl_c.await;
            }
        }
        info!("shutdown signal received");
        cancel.cancel();
    });
}
