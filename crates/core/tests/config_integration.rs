//! tuner_vts_config 통합 설정 테스트
//!
//! - tuner_vts_config.toml.example 파싱 및 전체 초기화 테스트
//! - 파일 로딩 (tokio) 테스트
//! - 환경변수 우선순위 테스트
//! - 잘못된 형식 에러 테스트

use std::io::Write;

use tunerlink_core::config::{
    DvrType, FrontendType, LnbVoltage, SelectionPolicy, TunerTestConfig, config_file_path,
};
use tunerlink_core::error::{ConfigError, TunerLinkError};
use tunerlink_core::harness::{InitOutcome, initialize_configuration};
use tunerlink_core::registry::{ResourceRegistry, connect_hardware_to_test_cases};
use tunerlink_core::types::{DataflowContext, ResourceKind, TestSuite};
use tunerlink_core::validator::validate_connections;

const EXAMPLE: &str = include_str!("../../../tuner_vts_config.toml.example");

fn chain_ids(plan: &tunerlink_core::DataflowPlan, context: DataflowContext) -> Vec<String> {
    plan.chain(context)
        .links()
        .iter()
        .map(|r| r.id.to_string())
        .collect()
}

// =============================================================================
// tuner_vts_config.toml.example 파싱 테스트
// =============================================================================

#[test]
fn example_config_parses_successfully() {
    let config = TunerTestConfig::parse(EXAMPLE).expect("example config should parse");

    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.general.log_format, "json");
    assert_eq!(config.dataflow.selection, SelectionPolicy::FirstDeclared);
}

#[test]
fn example_config_passes_validation() {
    let config = TunerTestConfig::parse(EXAMPLE).expect("should parse");
    config
        .validate()
        .expect("example config should pass validation");
}

#[test]
fn example_config_has_expected_hardware() {
    let config = TunerTestConfig::parse(EXAMPLE).expect("should parse");

    assert_eq!(config.frontends.len(), 2);
    assert_eq!(config.frontends[0].frontend_type, FrontendType::Dvbt);
    assert_eq!(config.demuxes.len(), 2);
    assert_eq!(config.filters.len(), 8);
    assert!(config.has_dvr_of_type(DvrType::Playback));
    assert!(config.has_dvr_of_type(DvrType::Record));
    assert_eq!(config.dvrs[1].packet_size, 188);
    assert_eq!(config.lnbs[0].voltage, LnbVoltage::V13);
    assert_eq!(
        config.lnbs[1].name.as_deref(),
        Some("default_lnb_external")
    );
    assert_eq!(config.descramblers[0].cas_system_id, 0xF6D8);
    assert_eq!(config.diseqc_messages[0].message, vec![0xE0, 0x10, 0x38, 0xF0]);
}

#[test]
fn example_config_connections_are_valid() {
    let config = TunerTestConfig::parse(EXAMPLE).expect("should parse");
    let mut registry = ResourceRegistry::new();
    connect_hardware_to_test_cases(&config, &mut registry);

    assert!(validate_connections(&config, &registry));
    assert!(registry.is_in_scope(ResourceKind::Filter, "RECORD0", TestSuite::Record));
    assert!(registry.is_in_scope(ResourceKind::Filter, "AUDIO0", TestSuite::Descrambler));
    assert!(registry.is_in_scope(ResourceKind::DiseqcMessage, "DISEQC0", TestSuite::Lnb));
}

#[tokio::test]
#[serial_test::serial]
async fn example_config_supports_every_context() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = config_file_path(dir.path(), None);
    std::fs::write(&path, EXAMPLE).expect("write example");

    let mut registry = ResourceRegistry::new();
    let init = initialize_configuration(&path, &mut registry)
        .await
        .expect("example should initialize")
        .ready()
        .expect("config file exists");
    let plan = &init.plan;

    assert_eq!(plan.supported_contexts(), DataflowContext::ALL.to_vec());
    assert_eq!(
        chain_ids(plan, DataflowContext::Record),
        vec!["FE_DVBT", "DMX0", "RECORD0", "DVR_RECORD0"]
    );
    assert_eq!(
        chain_ids(plan, DataflowContext::RecordWithLnb),
        vec!["LNB0", "FE_DVBS", "DMX1", "RECORD1", "DVR_RECORD0"]
    );
    assert_eq!(
        chain_ids(plan, DataflowContext::Descrambling),
        vec!["FE_DVBT", "DMX0", "AUDIO0", "VIDEO0", "DESC0"]
    );
    assert_eq!(
        chain_ids(plan, DataflowContext::DescramblingWithLnb),
        vec!["LNB0", "FE_DVBS", "DMX1", "AUDIO1", "DESC0"]
    );
}

// =============================================================================
// 파일 로딩 테스트
// =============================================================================

#[tokio::test]
async fn load_missing_file_is_file_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = TunerTestConfig::load(dir.path().join("missing.toml"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TunerLinkError::Config(ConfigError::FileNotFound { .. })
    ));
}

#[tokio::test]
async fn variant_path_is_used_for_lookup() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = config_file_path(dir.path(), Some("cable"));
    assert!(
        path.to_string_lossy()
            .ends_with("tuner_vts_config_aidl_V1.cable.toml")
    );

    let mut file = std::fs::File::create(&path).expect("create");
    file.write_all(b"[general]\nlog_level = \"debug\"\n")
        .expect("write");

    let config = TunerTestConfig::from_file(&path).await.expect("should load");
    assert_eq!(config.general.log_level, "debug");
}

#[tokio::test]
async fn missing_config_marks_suite_not_applicable() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut registry = ResourceRegistry::new();
    let outcome = initialize_configuration(config_file_path(dir.path(), None), &mut registry)
        .await
        .expect("absent config is not an error");
    assert!(matches!(outcome, InitOutcome::NotApplicable { .. }));
}

// =============================================================================
// 환경변수 우선순위 테스트
// =============================================================================

#[test]
#[serial_test::serial]
fn env_override_takes_precedence_over_toml() {
    let toml = r#"
[general]
log_level = "info"
"#;

    let original = std::env::var("TUNERLINK_GENERAL_LOG_LEVEL").ok();
    // SAFETY: serial_test로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("TUNERLINK_GENERAL_LOG_LEVEL", "error");
    }

    let mut config = TunerTestConfig::parse(toml).expect("should parse");
    config.apply_env_overrides();
    let result = config.general.log_level.clone();

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("TUNERLINK_GENERAL_LOG_LEVEL", val),
            None => std::env::remove_var("TUNERLINK_GENERAL_LOG_LEVEL"),
        }
    }

    assert_eq!(result, "error");
}

#[test]
#[serial_test::serial]
fn env_override_selection_policy() {
    let original = std::env::var("TUNERLINK_DATAFLOW_SELECTION").ok();
    // SAFETY: serial_test로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("TUNERLINK_DATAFLOW_SELECTION", "last-declared");
    }

    let mut config = TunerTestConfig::parse(EXAMPLE).expect("should parse");
    config.apply_env_overrides();
    let result = config.dataflow.selection;

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("TUNERLINK_DATAFLOW_SELECTION", val),
            None => std::env::remove_var("TUNERLINK_DATAFLOW_SELECTION"),
        }
    }

    assert_eq!(result, SelectionPolicy::LastDeclared);
}

#[test]
#[serial_test::serial]
fn env_override_missing_var_keeps_toml_value() {
    let toml = r#"
[general]
log_level = "warn"
"#;

    // SAFETY: 존재하지 않는 변수를 명시적으로 제거
    unsafe {
        std::env::remove_var("TUNERLINK_GENERAL_LOG_LEVEL");
    }

    let mut config = TunerTestConfig::parse(toml).expect("should parse");
    config.apply_env_overrides();

    assert_eq!(config.general.log_level, "warn");
}

// =============================================================================
// 빈 파일 / 잘못된 형식 에러 테스트
// =============================================================================

#[test]
fn empty_string_parses_with_defaults() {
    let config = TunerTestConfig::parse("").expect("empty string should parse");
    config.validate().expect("should validate");

    assert!(config.frontends.is_empty());
    assert!(config.connections.is_empty());
}

#[test]
fn unknown_field_is_parse_error() {
    let toml = r#"
[[connections]]
from = { kind = "frontend", id = "FE0" }
to = { kind = "demux", id = "DMX0" }
contxts = ["record"]
"#;
    let err = TunerTestConfig::parse(toml).unwrap_err();
    assert!(matches!(
        err,
        TunerLinkError::Config(ConfigError::ParseFailed { .. })
    ));
}

#[test]
fn unknown_resource_kind_is_parse_error() {
    let toml = r#"
[[connections]]
from = { kind = "tuner", id = "FE0" }
to = { kind = "demux", id = "DMX0" }
"#;
    assert!(TunerTestConfig::parse(toml).is_err());
}

#[test]
fn invalid_log_level_fails_validation() {
    let config = TunerTestConfig::parse("[general]\nlog_level = \"verbose\"\n").expect("parse");
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("general.log_level"));
}
