use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One resource type a worker can run, declared in its own JSON file.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct WorkerResourceType {
    #[serde(rename = "type")]
    pub kind: String,
    pub image: String,
    pub version: String,
    #[serde(default)]
    pub privileged: bool,
}

/// Worker identity and capabilities, sent to the scheduler at registration.
///
/// Built once at startup and never mutated afterwards; both the registration
/// tunnel and the sweep channel hold read-only copies.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WorkerDescriptor {
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub team: String,
    #[serde(rename = "type")]
    pub worker_type: String,
    pub platform: String,
    #[serde(rename = "resourceTypes", default)]
    pub resource_types: Vec<WorkerResourceType>,
    #[serde(rename = "runtimeAddr")]
    pub runtime_addr: String,
    #[serde(rename = "volumeAddr")]
    pub volume_addr: String,
    #[serde(rename = "httpProxy", default)]
    pub http_proxy: String,
    #[serde(rename = "httpsProxy", default)]
    pub https_proxy: String,
    #[serde(rename = "noProxy", default)]
    pub no_proxy: Vec<String>,
    #[serde(rename = "startTime")]
    pub start_time: i64,
    pub version: String,
    #[serde(rename = "certsPath", default)]
    pub certs_path: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum BeaconMessage {
    RegisterWorker(Box<WorkerDescriptor>),
    Heartbeat(String),
    SweepContainers(String),
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum BeaconResponse {
    Ack,
    // container handles destroyed by the scheduler this round
    Swept(Vec<String>),
    Error(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_type_from_json() {
        let record: WorkerResourceType = serde_json::from_str(
            r#"{"type": "git", "image": "/opt/resources/git", "version": "1.3.0"}"#,
        )
        .unwrap();
        assert_eq!(record.kind, "git");
        assert_eq!(record.image, "/opt/resources/git");
        assert_eq!(record.version, "1.3.0");
        assert!(!record.privileged);
    }

    #[test]
    fn test_resource_type_privileged() {
        let record: WorkerResourceType = serde_json::from_str(
            r#"{"type": "docker-image", "image": "/opt/resources/docker", "version": "0.9.1", "privileged": true}"#,
        )
        .unwrap();
        assert!(record.privileged);
    }

    #[test]
    fn test_resource_type_rejects_garbage() {
        assert!(serde_json::from_str::<WorkerResourceType>("not json").is_err());
        assert!(serde_json::from_str::<WorkerResourceType>(r#"{"type": "git"}"#).is_err());
    }
}
