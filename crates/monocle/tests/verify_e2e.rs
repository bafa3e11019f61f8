//! End-to-end verification: seal a payload to a freshly generated key,
//! then run it through the service exactly as a request would.

use chrono::{Duration, Utc};
use monocle::{AnonType, BundleKey, MonocleService, RootConfig, RootError};
use monocle_core::MonocleErrorKind;
use monocle_jwe::{seal, SealOptions};
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static DIR_COUNTER: AtomicU64 = AtomicU64::new(0);

fn temp_dir() -> std::path::PathBuf {
    let id = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!("monocle-e2e-{}-{}", std::process::id(), id));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn service_with_key() -> (MonocleService, BundleKey) {
    let key = BundleKey::generate();
    let service = MonocleService::with_key(key.clone(), &RootConfig::default()).unwrap();
    (service, key)
}

fn bundle_for(key: &BundleKey, payload: serde_json::Value, deflate: bool) -> String {
    let options = SealOptions {
        deflate,
        ..SealOptions::default()
    };
    seal(payload.to_string().as_bytes(), &key.public_key(), &options).unwrap()
}

#[test]
fn test_clean_session_end_to_end() {
    let (service, key) = service_with_key();
    let bundle = bundle_for(
        &key,
        json!({
            "complete": true,
            "ip": "203.0.113.5",
            "ts": Utc::now().to_rfc3339(),
            "anon": false,
        }),
        false,
    );

    let result = service.verify_anon_mode(&bundle, "203.0.113.5").unwrap();
    assert_eq!(result.is_anon_session(), 0);
    assert_eq!(result.anon_type(), None);
    assert!(result.justifications().is_empty());
}

#[test]
fn test_compressed_vpn_session() {
    let (service, key) = service_with_key();
    let bundle = bundle_for(
        &key,
        json!({
            "complete": true,
            "ip": "203.0.113.5",
            "ts": Utc::now().to_rfc3339(),
            "anon": true,
            "proxied": true,
            "vpn": true,
        }),
        true,
    );

    let result = service.verify_anon_mode(&bundle, "203.0.113.5").unwrap();
    assert_eq!(result.is_anon_session(), 1);
    assert_eq!(result.anon_type(), Some(AnonType::Vpn));
    assert_eq!(result.justifications(), ["Anonymized session."]);
}

#[test]
fn test_stale_mismatched_incomplete_session() {
    let (service, key) = service_with_key();
    let bundle = bundle_for(
        &key,
        json!({
            "complete": false,
            "ip": "203.0.113.5",
            "ts": (Utc::now() - Duration::minutes(15)).to_rfc3339(),
        }),
        false,
    );

    let result = service.verify_anon_mode(&bundle, "198.51.100.9").unwrap();
    assert_eq!(result.anon_type(), Some(AnonType::Timestamp));
    assert_eq!(result.justifications().len(), 3);
    assert_eq!(result.justifications()[0], "Incomplete data.");
    assert!(result.justifications()[1].contains("Bundle: 203.0.113.5; Request: 198.51.100.9"));
    assert!(result.justifications()[2].starts_with("Timestamp out of range"));
}

#[test]
fn test_mixed_families_do_not_trigger() {
    let (service, key) = service_with_key();
    let bundle = bundle_for(
        &key,
        json!({
            "complete": true,
            "ip": "203.0.113.5",
            "ts": Utc::now().to_rfc3339(),
        }),
        false,
    );

    let result = service.verify_anon_mode(&bundle, "2001:db8::5").unwrap();
    assert!(!result.is_anonymized());
}

#[test]
fn test_mistyped_fields_are_absent() {
    let (service, key) = service_with_key();
    let bundle = bundle_for(
        &key,
        json!({
            "complete": "yes",
            "ip": 42,
            "ts": "not a time",
            "anon": "true",
        }),
        false,
    );

    let result = service.verify_anon_mode(&bundle, "203.0.113.5").unwrap();
    assert_eq!(result.anon_type(), Some(AnonType::Incomplete));
    assert_eq!(result.justifications(), ["Incomplete data."]);
}

#[test]
fn test_bundle_for_other_key_fails_authentication() {
    let (service, _) = service_with_key();
    let stranger = BundleKey::generate();
    let bundle = bundle_for(&stranger, json!({ "complete": true }), false);

    let err = service.verify_anon_mode(&bundle, "203.0.113.5").unwrap_err();
    assert_eq!(
        err.monocle_kind(),
        Some(MonocleErrorKind::AuthenticationFailure)
    );
    assert!(err.is_bundle_fault());
}

#[test]
fn test_garbage_bundle_is_malformed() {
    let (service, _) = service_with_key();
    let err = service.verify_anon_mode("not-a-bundle", "203.0.113.5").unwrap_err();
    assert_eq!(err.monocle_kind(), Some(MonocleErrorKind::MalformedBundle));
}

#[test]
fn test_empty_inputs_are_validation_errors() {
    let (service, key) = service_with_key();
    let bundle = bundle_for(&key, json!({ "complete": true }), false);
    assert!(matches!(
        service.verify_anon_mode("", "203.0.113.5"),
        Err(RootError::Validation(_))
    ));
    assert!(matches!(
        service.verify_anon_mode(&bundle, ""),
        Err(RootError::Validation(_))
    ));
}

#[test]
fn test_service_from_config_file() {
    let dir = temp_dir();
    let key = BundleKey::generate();
    let key_path = dir.join("private_key.pem");
    std::fs::write(&key_path, key.to_pkcs8_pem().unwrap().as_bytes()).unwrap();

    let mut config = RootConfig::default();
    config.key.private_key_path = key_path;
    config.evaluator.max_bundle_age_secs = 60;
    let config_path = dir.join("config.toml");
    config.save(&config_path).unwrap();

    let loaded = RootConfig::load(&config_path).unwrap();
    let service = MonocleService::from_config(&loaded).unwrap();
    assert_eq!(service.key_id(), key.key_id());

    // Two minutes old: fresh under the default window, stale under 60 s.
    let bundle = bundle_for(
        &key,
        json!({
            "complete": true,
            "ip": "203.0.113.5",
            "ts": (Utc::now() - Duration::minutes(2)).to_rfc3339(),
        }),
        false,
    );
    let result = service.verify_anon_mode(&bundle, "203.0.113.5").unwrap();
    assert_eq!(result.anon_type(), Some(AnonType::Timestamp));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_shared_service_across_threads() {
    let (service, key) = service_with_key();
    let service = Arc::new(service);
    let bundle = Arc::new(bundle_for(
        &key,
        json!({
            "complete": true,
            "ip": "203.0.113.5",
            "ts": Utc::now().to_rfc3339(),
        }),
        true,
    ));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = Arc::clone(&service);
            let bundle = Arc::clone(&bundle);
            std::thread::spawn(move || service.verify_anon_mode(&bundle, "203.0.113.5").unwrap())
        })
        .collect();
    for handle in handles {
        assert!(!handle.join().unwrap().is_anonymized());
    }
}
