// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Screen registry files as loaded through the gateway configuration

use flow_gateway::config::{ConfigError, GatewayConfig};
use flow_gateway::flow::ScreenRegistryError;
use std::io::Write;

fn config_with_screens(path: &str) -> GatewayConfig {
    let path = path.to_string();
    GatewayConfig::from_lookup(move |name: &str| match name {
        "PRIVATE_KEY" => Some("pem".to_string()),
        "APP_SECRET" => Some("secret".to_string()),
        "FLOW_SCREENS_PATH" => Some(path.clone()),
        _ => None,
    })
    .unwrap()
}

#[test]
fn test_screens_file_loaded_from_config() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "entry": {{"screen": "DETAILS"}},
            "intermediate": {{"screen": "REVIEW", "data": {{"hint": "check"}}}},
            "success": {{"screen": "SUCCESS", "data": {{"extension_message_response": {{"params": {{}}}}}}}},
            "required_fields": ["full_name"]
        }}"#
    )
    .unwrap();

    let config = config_with_screens(file.path().to_str().unwrap());
    let registry = config.load_screens().unwrap();

    assert!(registry.is_entry("DETAILS"));
    assert!(registry.is_intermediate("REVIEW"));
    assert_eq!(registry.required_fields, vec!["full_name".to_string()]);
}

#[test]
fn test_invalid_screens_file_fails_startup() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{{ not json").unwrap();

    let config = config_with_screens(file.path().to_str().unwrap());
    assert!(matches!(
        config.load_screens(),
        Err(ConfigError::Screens(ScreenRegistryError::Parse(_)))
    ));
}

#[test]
fn test_blank_screen_id_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"entry": {{"screen": " "}}, "intermediate": {{"screen": "B"}}, "success": {{"screen": "C"}}}}"#
    )
    .unwrap();

    let config = config_with_screens(file.path().to_str().unwrap());
    assert!(matches!(
        config.load_screens(),
        Err(ConfigError::Screens(ScreenRegistryError::Invalid(_)))
    ));
}
