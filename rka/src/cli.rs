use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::beacon::BeaconConfig;

#[derive(Parser)]
#[command(name = "rka", version, about = "RKS worker agent CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Register this worker with the scheduler and keep it registered
    Start(Box<StartOpts>),
}

#[derive(Args, Debug, Clone)]
pub struct StartOpts {
    /// Name to register under; the host name is used when not set
    #[arg(long)]
    pub name: Option<String>,

    /// Tag to set during registration, can be given multiple times
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// Name of the team this worker is assigned to
    #[arg(long)]
    pub team: Option<String>,

    /// Runtime backend fronted by this worker
    #[arg(long = "worker-type", value_name = "TYPE", default_value = "youki")]
    pub worker_type: String,

    /// HTTP proxy endpoint to use for containers
    #[arg(long = "http-proxy", env = "http_proxy", value_name = "URL")]
    pub http_proxy: Option<String>,

    /// HTTPS proxy endpoint to use for containers
    #[arg(long = "https-proxy", env = "https_proxy", value_name = "URL")]
    pub https_proxy: Option<String>,

    /// Addresses that skip the proxy, comma separated
    #[arg(
        long = "no-proxy",
        env = "no_proxy",
        value_name = "ADDRS",
        value_delimiter = ','
    )]
    pub no_proxy: Vec<String>,

    /// Path to a JSON file declaring one resource type, can be given multiple times
    #[arg(long = "resource", value_name = "FILE")]
    pub resources: Vec<PathBuf>,

    /// Address of the container runtime this worker fronts
    #[arg(long = "runtime-addr", value_name = "ADDR", default_value = "127.0.0.1:7777")]
    pub runtime_addr: String,

    /// Address of this worker's volume store
    #[arg(long = "volume-addr", value_name = "ADDR", default_value = "127.0.0.1:7788")]
    pub volume_addr: String,

    /// Platform reported to the scheduler
    #[arg(long, default_value = "linux")]
    pub platform: String,

    /// Directory of CA certificates made available to containers
    #[arg(long = "certs-path", value_name = "DIR")]
    pub certs_path: Option<PathBuf>,

    // normally baked into the binary, so hidden
    #[arg(
        long = "worker-version",
        hide = true,
        default_value = env!("CARGO_PKG_VERSION")
    )]
    pub worker_version: String,

    /// Seconds between mark and sweep rounds
    #[arg(long = "sweep-interval", value_name = "SECONDS", default_value_t = 30)]
    pub sweep_interval: u64,

    #[command(flatten)]
    pub beacon: BeaconOpts,
}

/// Connection flags for the scheduler's beacon endpoint.
#[derive(Args, Debug, Clone)]
pub struct BeaconOpts {
    /// ip:port of the RKS beacon endpoint
    #[arg(long = "beacon-addr", value_name = "ADDR", default_value = "127.0.0.1:50051")]
    pub addr: String,

    /// TLS server name presented by the beacon endpoint
    #[arg(long = "beacon-server-name", value_name = "NAME", default_value = "localhost")]
    pub server_name: String,

    /// Seconds between transport keepalive probes on the registration tunnel
    #[arg(long = "beacon-keepalive-interval", value_name = "SECONDS", default_value_t = 10)]
    pub keepalive_interval: u64,

    /// Seconds between heartbeats announcing this worker as alive
    #[arg(long = "beacon-heartbeat-interval", value_name = "SECONDS", default_value_t = 5)]
    pub heartbeat_interval: u64,

    /// Connect attempts before the first registration is given up on
    #[arg(long = "beacon-connect-retries", value_name = "COUNT", default_value_t = 3)]
    pub connect_retries: u32,
}

impl BeaconOpts {
    /// Channel settings for the long-lived registration tunnel.
    pub fn registration_config(&self) -> BeaconConfig {
        BeaconConfig {
            addr: self.addr.clone(),
            server_name: self.server_name.clone(),
            keep_alive: true,
            keepalive_interval: Duration::from_secs(self.keepalive_interval),
            heartbeat_interval: Duration::from_secs(self.heartbeat_interval),
            connect_retries: self.connect_retries,
        }
    }

    /// Channel settings for mark and sweep calls. Keepalive stays off so
    /// sweep probing never competes with the registration tunnel, and a
    /// failed dial waits for the next tick instead of retrying.
    pub fn sweep_config(&self) -> BeaconConfig {
        BeaconConfig {
            keep_alive: false,
            connect_retries: 0,
            ..self.registration_config()
        }
    }
}
