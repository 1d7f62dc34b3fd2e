use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Result, bail};
use async_trait::async_trait;
use rka::beacon::BeaconClient;
use rka::cli::{BeaconOpts, StartOpts};
use tokio_util::sync::CancellationToken;

/// Beacon double that counts sweep rounds and can be told to fail.
#[derive(Default)]
pub struct FakeBeacon {
    pub sweeps: AtomicUsize,
    pub sweep_failures: AtomicUsize,
    /// 1-based sweep round that fails, if any
    pub fail_on: Option<usize>,
    /// when set, the tunnel collapses immediately with this message
    pub tunnel_error: Option<String>,
}

#[allow(dead_code)]
impl FakeBeacon {
    pub fn failing_on(round: usize) -> Self {
        Self {
            fail_on: Some(round),
            ..Self::default()
        }
    }

    pub fn broken_tunnel(message: &str) -> Self {
        Self {
            tunnel_error: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn sweep_count(&self) -> usize {
        self.sweeps.load(Ordering::SeqCst)
    }

    pub fn failure_count(&self) -> usize {
        self.sweep_failures.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BeaconClient for FakeBeacon {
    async fn maintain_tunnel(&self, cancel: CancellationToken) -> Result<()> {
        match &self.tunnel_error {
            Some(message) => bail!("{message}"),
            None => {
                cancel.cancelled().await;
                Ok(())
            }
        }
    }

    async fn sweep_containers(&self) -> Result<()> {
        let round = self.sweeps.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on == Some(round) {
            self.sweep_failures.fetch_add(1, Ordering::SeqCst);
            bail!("sweep round {round} refused");
        }
        Ok(())
    }
}

#[allow(dead_code)]
pub fn beacon_opts() -> BeaconOpts {
    BeaconOpts {
        addr: "127.0.0.1:50051".to_string(),
        server_name: "localhost".to_string(),
        keepalive_interval: 10,
        heartbeat_interval: 5,
        connect_retries: 3,
    }
}

#[allow(dead_code)]
pub fn start_opts() -> StartOpts {
    StartOpts {
        name: Some("worker-1".to_string()),
        tags: vec!["ssd".to_string()],
        team: None,
        worker_type: "youki".to_string(),
        http_proxy: None,
        https_proxy: None,
        no_proxy: vec![],
        resources: vec![],
        runtime_addr: "127.0.0.1:7777".to_string(),
        volume_addr: "127.0.0.1:7788".to_string(),
        platform: "linux".to_string(),
        certs_path: None,
        worker_version: "0.1.0".to_string(),
        sweep_interval: 30,
        beacon: beacon_opts(),
    }
}
