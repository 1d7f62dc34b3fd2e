use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use common::{WorkerDescriptor, WorkerResourceType};
use gethostname::gethostname;

use crate::cli::StartOpts;

/// Runtime backends a worker may front.
pub const WORKER_TYPES: [&str; 2] = ["youki", "containerd"];

/// Assemble the record sent to the scheduler at registration time.
///
/// All defaulting happens here, once; the descriptor is immutable afterwards.
/// Any unreadable or malformed resource declaration is fatal and no partial
/// descriptor is produced.
pub fn assemble(opts: &StartOpts) -> Result<WorkerDescriptor> {
    if !WORKER_TYPES.contains(&opts.worker_type.as_str()) {
        bail!(
            "unknown worker type {:?}, expected one of {:?}",
            opts.worker_type,
            WORKER_TYPES
        );
    }

    let name = match &opts.name {
        Some(name) if !name.is_empty() => name.clone(),
        _ => gethostname().to_string_lossy().into_owned(),
    };

    let resource_types = load_resource_types(&opts.resources)?;

    Ok(WorkerDescriptor {
        name,
        tags: opts.tags.clone(),
        team: opts.team.clone().unwrap_or_default(),
        worker_type: opts.worker_type.clone(),
        platform: opts.platform.clone(),
        resource_types,
        runtime_addr: opts.runtime_addr.clone(),
        volume_addr: opts.volume_addr.clone(),
        http_proxy: opts.http_proxy.clone().unwrap_or_default(),
        https_proxy: opts.https_proxy.clone().unwrap_or_default(),
        no_proxy: opts.no_proxy.clone(),
        start_time: Utc::now().timestamp(),
        version: opts.worker_version.clone(),
        certs_path: opts.certs_path.clone(),
    })
}

/// Declared resource types keep the order of the command line.
fn load_resource_types(paths: &[PathBuf]) -> Result<Vec<WorkerResourceType>> {
    let mut resource_types = Vec::with_capacity(paths.len());
    for path in paths {
        resource_types.push(load_resource_type(path)?);
    }
    Ok(resource_types)
}

// each file must hold exactly one resource type record
fn load_resource_type(path: &Path) -> Result<WorkerResourceType> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read resource file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse resource file {}", path.display()))
}
