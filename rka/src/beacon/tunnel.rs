use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use common::{BeaconMessage, BeaconResponse, WorkerDescriptor};
use quinn::crypto::rustls::QuicClientConfig;
use quinn::{ClientConfig as QuinnClientConfig, Connection, Endpoint, TransportConfig};
use rustls::DigitallySignedStruct;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig as RustlsClientConfig, RootCertStore, SignatureScheme};
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{BeaconClient, BeaconConfig};

/// Skip certificate verification
#[derive(Debug)]
struct SkipServerVerification;

impl ServerCertVerifier for SkipServerVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        vec![
            SignatureScheme::RSA_PKCS1_SHA256,
            SignatureScheme::ECDSA_NISTP256_SHA256,
            SignatureScheme::RSA_PSS_SHA256,
        ]
    }
}

pub fn init_crypto() {
    // a provider may already be installed by another component or test
    let _ = CryptoProvider::install_default(rustls::crypto::ring::default_provider());
}

/// QUIC implementation of the beacon protocol.
///
/// The registration tunnel keeps one connection open for the life of the
/// agent; sweep calls dial a fresh connection per round trip.
pub struct QuicBeacon {
    worker: WorkerDescriptor,
    config: BeaconConfig,
}

impl QuicBeacon {
    pub fn new(worker: WorkerDescriptor, config: BeaconConfig) -> Self {
        Self { worker, config }
    }

    pub fn config(&self) -> &BeaconConfig {
        &self.config
    }

    fn endpoint(&self) -> Result<Endpoint> {
        // the beacon endpoint presents a self-signed certificate
        let mut tls = RustlsClientConfig::builder()
            .with_root_certificates(RootCertStore::empty())
            .with_no_client_auth();
        tls.dangerous()
            .set_certificate_verifier(Arc::new(SkipServerVerification));

        let quic_crypto = QuicClientConfig::try_from(tls)?;
        let mut client_cfg = QuinnClientConfig::new(Arc::new(quic_crypto));

        let mut transport = TransportConfig::default();
        if self.config.keep_alive {
            transport.keep_alive_interval(Some(self.config.keepalive_interval));
        }
        client_cfg.transport_config(Arc::new(transport));

        let mut endpoint = Endpoint::client("0.0.0.0:0".parse()?)?;
        endpoint.set_default_client_config(client_cfg);
        Ok(endpoint)
    }

    async fn connect(&self, endpoint: &Endpoint) -> Result<Connection> {
        let addr: SocketAddr = self
            .config
            .addr
            .parse()
            .with_context(|| format!("invalid beacon address {}", self.config.addr))?;

        let mut attempt = 0;
        loop {
            match endpoint.connect(addr, &self.config.server_name) {
                Ok(connecting) => match connecting.await {
                    Ok(conn) => return Ok(conn),
                    Err(e) if attempt < self.config.connect_retries => {
                        attempt += 1;
                        warn!(
                            "beacon connect failed: {e}, retrying in 2s ({attempt}/{})",
                            self.config.connect_retries
                        );
                        time::sleep(Duration::from_secs(2)).await;
                    }
                    Err(e) => return Err(e).context("failed to reach the beacon endpoint"),
                },
                Err(e) => return Err(e).context("beacon endpoint rejected the connect attempt"),
            }
        }
    }

    /// One request/response exchange over a fresh bi-directional stream.
    async fn call(&self, conn: &Connection, msg: &BeaconMessage) -> Result<BeaconResponse> {
        let (mut send, mut recv) = conn.open_bi().await?;
        let data = bincode::serialize(msg)?;
        send.write_all(&data).await?;
        send.finish()?;

        let mut buf = vec![0u8; 4096];
        match recv.read(&mut buf).await? {
            Some(n) => Ok(bincode::deserialize::<BeaconResponse>(&buf[..n])?),
            None => bail!("beacon closed the stream without a response"),
        }
    }

    /// Send a message over a unidirectional stream
    async fn send_uni(&self, conn: &Connection, msg: &BeaconMessage) -> Result<()> {
        let mut uni = conn.open_uni().await?;
        let data = bincode::serialize(msg)?;
        uni.write_all(&data).await?;
        uni.finish()?;
        Ok(())
    }

    async fn register(&self, conn: &Connection) -> Result<()> {
        let msg = BeaconMessage::RegisterWorker(Box::new(self.worker.clone()));
        match self.call(conn, &msg).await? {
            BeaconResponse::Ack => {
                info!("registered worker {}", self.worker.name);
                Ok(())
            }
            BeaconResponse::Error(e) => bail!("beacon rejected registration: {e}"),
            other => bail!("unexpected registration response: {other:?}"),
        }
    }
}

#[async_trait]
impl BeaconClient for QuicBeacon {
    async fn maintain_tunnel(&self, cancel: CancellationToken) -> Result<()> {
        let endpoint = self.endpoint()?;
        let conn = tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            conn = self.connect(&endpoint) => conn?,
        };
        info!("connected to beacon at {}", self.config.addr);

        self.register(&conn).await?;

        let mut heartbeat = time::interval_at(
            Instant::now() + self.config.heartbeat_interval,
            self.config.heartbeat_interval,
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("closing beacon tunnel");
                    conn.close(0u32.into(), b"shutdown");
                    endpoint.wait_idle().await;
                    return Ok(());
                }
                _ = heartbeat.tick() => {
                    self.send_uni(&conn, &BeaconMessage::Heartbeat(self.worker.name.clone()))
                        .await
                        .context("heartbeat send failed")?;
                    debug!("heartbeat sent");
                }
                reason = conn.closed() => {
                    return Err(anyhow!(reason)).context("beacon tunnel closed");
                }
            }
        }
    }

    async fn sweep_containers(&self) -> Result<()> {
        let endpoint = self.endpoint()?;
        let conn = self.connect(&endpoint).await?;

        let msg = BeaconMessage::SweepContainers(self.worker.name.clone());
        let response = self.call(&conn, &msg).await?;
        conn.close(0u32.into(), b"done");

        match response {
            BeaconResponse::Swept(destroyed) => {
                info!("beacon swept {} stale containers", destroyed.len());
                Ok(())
            }
            BeaconResponse::Ack => Ok(()),
            BeaconResponse::Error(e) => bail!("beacon refused the sweep: {e}"),
        }
    }
}
