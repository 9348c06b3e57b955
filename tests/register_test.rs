//! Registration pipeline through the public registry.

mod common;

use std::io::Write;
use std::sync::{Arc, Barrier};
use std::thread;

use common::{init_test_logging, seeded_registry, RecordingSecrets};
use dataset_registry::api::{handle_read, handle_register};
use dataset_registry::common::config::AppCfg;
use dataset_registry::data::{CapabilityKey, DatasetDefinition, Location};
use dataset_registry::secrets::{Credential, SecretStore};
use dataset_registry::{ErrorCode, Registry};
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::NamedTempFile;

fn csv_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "id,value\n1,2").unwrap();
    file
}

#[test]
fn local_dataset_can_be_registered_and_read() {
    let (registry, secrets) = seeded_registry();
    let file = csv_file();

    let stored = registry
        .register(DatasetDefinition::local("census", file.path(), 4.0))
        .unwrap();
    assert_eq!(stored.location, Location::LocalPath(file.path().to_path_buf()));
    assert_eq!(registry.len(), 3);
    assert!(secrets.puts().is_empty());

    let descriptor = registry.read("census", 4.0).unwrap();
    assert_eq!(descriptor.capability_key(), CapabilityKey::CsvDetails);
    assert_eq!(registry.remaining_budget("census").unwrap(), 0.0);
}

#[test]
fn dataverse_dataset_hands_credential_to_store() {
    let (registry, secrets) = seeded_registry();

    let stored = registry
        .register(DatasetDefinition::dataverse(
            "survey",
            "https://dataverse.example/api/access/datafile/1",
            json!({"columns": ["age", "income"]}),
            json!(r#"{"value": "secret-token"}"#),
            2.0,
        ))
        .unwrap();
    assert_eq!(
        stored.schema.as_deref(),
        Some(r#"{"columns":["age","income"]}"#)
    );
    assert_eq!(
        secrets.puts(),
        vec![Credential::new("dataverse:survey", "secret-token")]
    );

    let descriptor = registry.read("survey", 1.5).unwrap();
    assert_eq!(descriptor.capability_key(), CapabilityKey::DataverseDetails);
    assert_eq!(descriptor.token.as_deref(), Some("secret-token"));
}

#[test]
fn duplicate_name_keeps_existing_entry() {
    let (registry, _) = seeded_registry();
    let before = registry.get("example").unwrap();
    let file = csv_file();

    let err = registry
        .register(DatasetDefinition::local("example", file.path(), 10.0))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::DuplicateName);
    assert_eq!(registry.get("example").unwrap(), before);
}

#[test]
fn missing_local_file_leaves_catalog_size() {
    let (registry, _) = seeded_registry();
    let dir = tempfile::tempdir().unwrap();

    let err = registry
        .register(DatasetDefinition::local(
            "ghost",
            dir.path().join("absent.csv"),
            1.0,
        ))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::LocalResourceNotFound);
    assert_eq!(registry.len(), 2);

    // A directory is not a readable file either.
    let err = registry
        .register(DatasetDefinition::local("dir", dir.path(), 1.0))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::LocalResourceNotFound);
}

#[test]
fn missing_token_never_reaches_secret_store() {
    let (registry, secrets) = seeded_registry();
    let mut def = DatasetDefinition::dataverse(
        "no-token",
        "https://h",
        json!({"a": 1}),
        json!(null),
        1.0,
    );
    def.token = None;

    let err = registry.register(def).unwrap_err();
    assert_eq!(err.code(), ErrorCode::MissingCredential);
    assert!(secrets.puts().is_empty());
    assert!(registry.get("no-token").is_err());
}

#[test]
fn secret_store_failure_aborts_registration() {
    init_test_logging();
    let secrets = Arc::new(RecordingSecrets::failing_puts());
    let registry = Registry::new(&AppCfg::default(), secrets.clone());

    let err = registry
        .register(DatasetDefinition::dataverse(
            "flaky",
            "https://h",
            json!({"a": 1}),
            json!({"value": "t"}),
            1.0,
        ))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::AuthorizationFailure);
    assert_eq!(secrets.puts().len(), 1);
    assert!(registry.get("flaky").is_err());
}

#[test]
fn json_boundary_reports_status_equivalents() {
    let (registry, _) = seeded_registry();

    let cases = [
        (r#"{"dataset_name":"example","key":"csv_details","budget":1.0,"dataset_type":"local_csv"}"#, 401),
        (r#"{"dataset_name":"n","key":"parquet","budget":1.0,"dataset_type":"local_csv"}"#, 402),
        (r#"{"dataset_name":"n","key":"csv_details","dataset_type":"local_csv"}"#, 403),
        (r#"{"dataset_name":"n","key":"csv_details","budget":-2.0,"dataset_type":"local_csv"}"#, 403),
        (r#"{"dataset_name":"n","key":"csv_details","budget":1.0,"dataset_type":"sqlite"}"#, 405),
        (r#"{"dataset_name":"n","key":"csv_details","budget":1.0,"dataset_type":"local_csv","local_path":"/definitely/not/here.csv"}"#, 406),
        (r#"{"dataset_name":"n","key":"dataverse_details","budget":1.0,"dataset_type":"dataverse","schema":false,"host":"h"}"#, 414),
        (r#"{"dataset_name":"n","key":"dataverse_details","budget":1.0,"dataset_type":"dataverse","schema":{"a":1},"host":""}"#, 408),
        (r#"{"dataset_name":"n","key":"dataverse_details","budget":1.0,"dataset_type":"dataverse"}"#, 409),
        (r#"{"dataset_name":"n","key":"dataverse_details","budget":1.0,"dataset_type":"dataverse","schema":{"a":1},"host":"h"}"#, 410),
        (r#"{"dataset_name":"n","key":"dataverse_details","budget":1.0,"dataset_type":"dataverse","schema":null,"host":"h"}"#, 414),
        (r#"{"key":"csv_details"}"#, 422),
    ];

    for (body, status) in cases {
        let res = handle_register(&registry, body);
        assert_eq!(res.status, status, "body: {body}");
    }
    assert_eq!(registry.len(), 2);
}

#[test]
fn register_then_read_over_json() {
    let (registry, _) = seeded_registry();
    let body = json!({
        "dataset_name": "remote",
        "dataset_type": "dataverse",
        "key": "dataverse_details",
        "budget": 2.0,
        "host": "https://dataverse.example",
        "schema": {"fields": [{"name": "x", "type": "int"}]},
        "token": "{\"name\": \"dataverse:remote\", \"value\": \"k\"}"
    })
    .to_string();

    let res = handle_register(&registry, &body);
    assert!(res.is_success(), "{}", res.body);

    let res = handle_read(&registry, r#"{"dataset_name":"remote","budget":2.0}"#);
    assert!(res.is_success(), "{}", res.body);
    let value: serde_json::Value = serde_json::from_str(&res.body).unwrap();
    assert_eq!(value["dataset_type"], json!("dataverse"));
    assert_eq!(value["dataverse_details"]["token"], json!("k"));
    assert_eq!(value["dataverse_details"]["budget"], json!(0.0));
}

#[test]
fn token_naming_its_own_secret_registers_and_reads() {
    let (registry, secrets) = seeded_registry();

    registry
        .register(DatasetDefinition::dataverse(
            "panel",
            "https://dataverse.example/api/access/datafile/7",
            json!({"fields": ["wave"]}),
            json!({"name": "dataverse:panel", "value": "panel-key"}),
            3.0,
        ))
        .unwrap();

    let descriptor = registry.read("panel", 1.0).unwrap();
    assert_eq!(descriptor.capability_key(), CapabilityKey::DataverseDetails);
    assert_eq!(descriptor.token.as_deref(), Some("panel-key"));
    assert_eq!(secrets.gets(), vec!["dataverse:panel".to_string()]);
}

#[test]
fn token_cannot_overwrite_another_datasets_secret() {
    let (registry, secrets) = seeded_registry();
    secrets
        .put(Credential::new("dataverse:demo_dataverse", "real"))
        .unwrap();

    let err = registry
        .register(DatasetDefinition::dataverse(
            "intruder",
            "https://h",
            json!({"a": 1}),
            json!({"name": "dataverse:demo_dataverse", "value": "forged"}),
            1.0,
        ))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::MissingCredential);
    assert!(registry.get("intruder").is_err());

    let descriptor = registry.read("demo_dataverse", 1.0).unwrap();
    assert_eq!(descriptor.token.as_deref(), Some("real"));
}

#[test]
fn read_fetches_credential_filed_under_dataset_name() {
    let (registry, secrets) = seeded_registry();
    registry
        .register(DatasetDefinition::dataverse(
            "survey",
            "https://h",
            json!({"a": 1}),
            json!({"value": "k"}),
            1.0,
        ))
        .unwrap();

    registry.read("survey", 0.5).unwrap();
    assert_eq!(secrets.gets(), vec!["dataverse:survey".to_string()]);
    assert_eq!(
        secrets.puts(),
        vec![Credential::new("dataverse:survey", "k")]
    );
}

#[test]
fn raw_string_schema_is_accepted() {
    let (registry, _) = seeded_registry();
    let stored = registry
        .register(DatasetDefinition::dataverse(
            "columns",
            "https://h",
            json!("age,income"),
            json!({"value": "k"}),
            1.0,
        ))
        .unwrap();
    assert_eq!(stored.schema.as_deref(), Some(r#""age,income""#));
}

#[test]
fn concurrent_registrations_of_one_name_insert_once() {
    let (registry, _) = seeded_registry();
    let registry = Arc::new(registry);
    let before = registry.len();
    let file = Arc::new(csv_file());

    const THREADS: usize = 16;
    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            let file = Arc::clone(&file);
            thread::spawn(move || {
                barrier.wait();
                registry.register(DatasetDefinition::local(
                    "contested",
                    file.path(),
                    1.0 + i as f64,
                ))
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert_eq!(err.code(), ErrorCode::DuplicateName);
    }
    assert_eq!(registry.len(), before + 1);
}
