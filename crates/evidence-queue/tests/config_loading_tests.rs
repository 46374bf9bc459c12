//! Table-driven tests for engine configuration loading and validation.

use std::io::Write;

use tempfile::NamedTempFile;

use evidence_queue::config::{load_config, load_config_from_str, AnalysisProvider};
use evidence_queue::ConfigError;

struct ConfigTestCase {
    name: &'static str,
    config_json: &'static str,
    should_succeed: bool,
    /// Substring of the error message when loading fails.
    expected_error: Option<&'static str>,
}

const CONFIG_TESTS: &[ConfigTestCase] = &[
    ConfigTestCase {
        name: "empty_object",
        config_json: "{}",
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "valid_full",
        config_json: r#"{
            "version": "1.0",
            "ingest": {
                "maxContentChars": 8000,
                "maxPdfPages": 3,
                "defaultSource": "Band Office Files",
                "skipDuplicates": true
            },
            "scheduler": { "maxInFlight": 3, "claimIntervalMs": 250, "analysisTimeoutSecs": 45 },
            "analysis": {
                "provider": "http",
                "endpoint": "https://analysis.internal/v1/verdict",
                "requestTimeoutSecs": 30
            },
            "diagnostics": { "capacity": 200 },
            "logging": { "filter": "evidence_queue=debug", "json": true }
        }"#,
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "keyword_with_targets",
        config_json: r#"{ "analysis": { "provider": "keyword", "targets": ["treaty", "survey"] } }"#,
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "null_endpoint_for_keyword",
        config_json: r#"{ "analysis": { "endpoint": null } }"#,
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "invalid_json",
        config_json: r#"{ "scheduler": "#,
        should_succeed: false,
        expected_error: Some("Failed to parse config JSON"),
    },
    ConfigTestCase {
        name: "invalid_unknown_section",
        config_json: r#"{ "workers": 4 }"#,
        should_succeed: false,
        expected_error: Some("Schema validation failed"),
    },
    ConfigTestCase {
        name: "invalid_unknown_scheduler_key",
        config_json: r#"{ "scheduler": { "concurrency": 4 } }"#,
        should_succeed: false,
        expected_error: Some("Schema validation failed"),
    },
    ConfigTestCase {
        name: "invalid_zero_in_flight",
        config_json: r#"{ "scheduler": { "maxInFlight": 0 } }"#,
        should_succeed: false,
        expected_error: Some("Schema validation failed"),
    },
    ConfigTestCase {
        name: "invalid_negative_interval",
        config_json: r#"{ "scheduler": { "claimIntervalMs": -5 } }"#,
        should_succeed: false,
        expected_error: Some("Schema validation failed"),
    },
    ConfigTestCase {
        name: "invalid_provider",
        config_json: r#"{ "analysis": { "provider": "oracle" } }"#,
        should_succeed: false,
        expected_error: Some("Schema validation failed"),
    },
    ConfigTestCase {
        name: "invalid_empty_default_source",
        config_json: r#"{ "ingest": { "defaultSource": "" } }"#,
        should_succeed: false,
        expected_error: Some("Schema validation failed"),
    },
    ConfigTestCase {
        name: "invalid_version",
        config_json: r#"{ "version": "3.1" }"#,
        should_succeed: false,
        expected_error: Some("Unsupported config version: 3.1"),
    },
    ConfigTestCase {
        name: "invalid_http_without_endpoint",
        config_json: r#"{ "analysis": { "provider": "http" } }"#,
        should_succeed: false,
        expected_error: Some("analysis.endpoint is required"),
    },
    ConfigTestCase {
        name: "invalid_http_blank_endpoint",
        config_json: r#"{ "analysis": { "provider": "http", "endpoint": "   " } }"#,
        should_succeed: false,
        expected_error: Some("analysis.endpoint is required"),
    },
    ConfigTestCase {
        name: "invalid_http_non_url_endpoint",
        config_json: r#"{ "analysis": { "provider": "http", "endpoint": "ftp://archive/verdicts" } }"#,
        should_succeed: false,
        expected_error: Some("not an http(s) URL"),
    },
];

#[test]
fn test_config_loading() {
    for test_case in CONFIG_TESTS {
        let result = load_config_from_str(test_case.config_json);

        if test_case.should_succeed {
            assert!(
                result.is_ok(),
                "Test '{}': Expected success but got error: {:?}",
                test_case.name,
                result.err()
            );
        } else {
            assert!(
                result.is_err(),
                "Test '{}': Expected error but got success",
                test_case.name
            );

            if let Some(expected_error) = test_case.expected_error {
                let error_msg = result.err().unwrap().to_string();
                assert!(
                    error_msg.contains(expected_error),
                    "Test '{}': Expected error containing '{}', got '{}'",
                    test_case.name,
                    expected_error,
                    error_msg
                );
            }
        }
    }
}

#[test]
fn test_valid_config_field_values() {
    let full = CONFIG_TESTS
        .iter()
        .find(|c| c.name == "valid_full")
        .unwrap();
    let config = load_config_from_str(full.config_json).unwrap();

    assert_eq!(config.ingest.max_content_chars, 8000);
    assert_eq!(config.ingest.max_pdf_pages, 3);
    assert_eq!(config.ingest.default_source, "Band Office Files");
    assert!(config.ingest.skip_duplicates);
    assert_eq!(config.scheduler.max_in_flight, 3);
    assert_eq!(config.scheduler.claim_interval().as_millis(), 250);
    assert_eq!(config.scheduler.analysis_timeout().as_secs(), 45);
    assert_eq!(config.analysis.provider, AnalysisProvider::Http);
    assert_eq!(
        config.analysis.endpoint.as_deref(),
        Some("https://analysis.internal/v1/verdict")
    );
    assert_eq!(config.diagnostics.capacity, 200);
    assert_eq!(config.logging.filter, "evidence_queue=debug");
    assert!(config.logging.json);
}

#[test]
fn test_config_defaults_applied() {
    let config = load_config_from_str(r#"{ "scheduler": { "maxInFlight": 2 } }"#).unwrap();

    assert_eq!(config.scheduler.max_in_flight, 2);
    assert_eq!(config.scheduler.claim_interval_ms, 500);
    assert_eq!(config.scheduler.analysis_timeout_secs, 120);
    assert_eq!(config.ingest.max_content_chars, 20_000);
    assert!(!config.ingest.skip_duplicates);
    assert_eq!(config.analysis.provider, AnalysisProvider::Keyword);
    assert!(config.analysis.targets.is_empty());
    assert_eq!(config.diagnostics.capacity, 1000);
    assert!(!config.logging.json);
}

#[test]
fn test_load_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"{{ "ingest": {{ "skipDuplicates": true }}, "diagnostics": {{ "capacity": 10 }} }}"#
    )
    .unwrap();

    let config = load_config(file.path()).unwrap();
    assert!(config.ingest.skip_duplicates);
    assert_eq!(config.diagnostics.capacity, 10);
}

#[test]
fn test_load_from_missing_file_reports_path() {
    let result = load_config("/definitely/not/here/engine.json");
    match result {
        Err(err @ ConfigError::ReadFile { .. }) => {
            assert!(err.to_string().contains("/definitely/not/here/engine.json"));
        }
        other => panic!("Expected read error, got {:?}", other),
    }
}
