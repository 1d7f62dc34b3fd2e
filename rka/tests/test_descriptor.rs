use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use gethostname::gethostname;
use rka::descriptor;
use tempfile::TempDir;

use crate::common::start_opts;

mod common;

fn write_resource(dir: &TempDir, file_name: &str, body: &str) -> PathBuf {
    let path = dir.path().join(file_name);
    let mut file = File::create(&path).unwrap();
    file.write_all(body.as_bytes()).unwrap();
    path
}

#[test]
fn test_resource_types_keep_declaration_order() {
    let dir = TempDir::new().unwrap();
    let mut opts = start_opts();
    opts.resources = vec![
        write_resource(
            &dir,
            "git.json",
            r#"{"type": "git", "image": "/opt/resources/git", "version": "1.3.0"}"#,
        ),
        write_resource(
            &dir,
            "registry.json",
            r#"{"type": "registry-image", "image": "/opt/resources/registry", "version": "0.8.2", "privileged": true}"#,
        ),
        write_resource(
            &dir,
            "time.json",
            r#"{"type": "time", "image": "/opt/resources/time", "version": "2.0.1"}"#,
        ),
    ];

    let worker = descriptor::assemble(&opts).unwrap();

    assert_eq!(worker.resource_types.len(), 3);
    let kinds: Vec<&str> = worker
        .resource_types
        .iter()
        .map(|r| r.kind.as_str())
        .collect();
    assert_eq!(kinds, vec!["git", "registry-image", "time"]);
    assert!(!worker.resource_types[0].privileged);
    assert!(worker.resource_types[1].privileged);
}

#[test]
fn test_malformed_resource_file_is_fatal() {
    let dir = TempDir::new().unwrap();
    let mut opts = start_opts();
    opts.resources = vec![
        write_resource(
            &dir,
            "git.json",
            r#"{"type": "git", "image": "/opt/resources/git", "version": "1.3.0"}"#,
        ),
        write_resource(&dir, "broken.json", "not a resource record"),
    ];

    let err = descriptor::assemble(&opts).unwrap_err();
    assert!(format!("{err:#}").contains("broken.json"));
}

#[test]
fn test_missing_resource_file_is_fatal() {
    let mut opts = start_opts();
    opts.resources = vec![PathBuf::from("/nonexistent/resource.json")];

    let err = descriptor::assemble(&opts).unwrap_err();
    assert!(format!("{err:#}").contains("/nonexistent/resource.json"));
}

#[test]
fn test_name_defaults_to_hostname() {
    let mut opts = start_opts();
    opts.name = None;

    let worker = descriptor::assemble(&opts).unwrap();
    assert_eq!(worker.name, gethostname().to_string_lossy());

    opts.name = Some(String::new());
    let worker = descriptor::assemble(&opts).unwrap();
    assert_eq!(worker.name, gethostname().to_string_lossy());
}

#[test]
fn test_unknown_worker_type_is_rejected() {
    let mut opts = start_opts();
    opts.worker_type = "docker".to_string();

    let err = descriptor::assemble(&opts).unwrap_err();
    assert!(err.to_string().contains("unknown worker type"));
}

#[test]
fn test_scalar_fields_are_carried_through() {
    let worker = descriptor::assemble(&start_opts()).unwrap();

    assert_eq!(worker.name, "worker-1");
    assert_eq!(worker.tags, vec!["ssd".to_string()]);
    assert_eq!(worker.team, "");
    assert_eq!(worker.worker_type, "youki");
    assert_eq!(worker.platform, "linux");
    assert_eq!(worker.runtime_addr, "127.0.0.1:7777");
    assert_eq!(worker.volume_addr, "127.0.0.1:7788");
    assert!(worker.start_time > 0);
    assert!(worker.certs_path.is_none());
}
