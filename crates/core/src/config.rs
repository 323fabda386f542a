//! 설정 관리: 튜너 테스트 하드웨어 설정 파싱
//!
//! [`TunerTestConfig`]는 장치가 선언한 모든 하드웨어 리소스와
//! 리소스 간 연결(`[[connections]]`)을 담는 최상위 구조체입니다.
//! 로드된 뒤에는 테스트 실행 동안 읽기 전용입니다.
//!
//! # 설정 파일 경로
//! `{dir}/tuner_vts_config_aidl_V1[.{variant}].toml`
//! - `dir`: `TUNERLINK_CONFIG_DIR` (기본값 `/vendor/etc`)
//! - `variant`: `TUNERLINK_CONFIG_VARIANT` (비어 있으면 생략)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), tunerlink_core::error::TunerLinkError> {
//! use tunerlink_core::config::{TunerTestConfig, default_config_path};
//!
//! let config = TunerTestConfig::load(default_config_path()).await?;
//!
//! let config = TunerTestConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, TunerLinkError};
use crate::filter_type::FilterType;
use crate::types::{DataflowContext, ResourceId, ResourceKind, ResourceRef};

/// 설정 파일 기본 디렉토리
pub const DEFAULT_CONFIG_DIR: &str = "/vendor/etc";
/// 설정 파일 이름 (variant, 확장자 제외)
pub const CONFIG_FILE_STEM: &str = "tuner_vts_config_aidl_V1";
/// 설정 디렉토리 오버라이드 환경변수
pub const CONFIG_DIR_ENV: &str = "TUNERLINK_CONFIG_DIR";
/// 장치 설정 variant 환경변수
pub const CONFIG_VARIANT_ENV: &str = "TUNERLINK_CONFIG_VARIANT";

/// 디렉토리와 variant로 설정 파일 경로를 만듭니다.
pub fn config_file_path(dir: impl AsRef<Path>, variant: Option<&str>) -> PathBuf {
    let mut name = CONFIG_FILE_STEM.to_owned();
    if let Some(variant) = variant.map(str::trim).filter(|v| !v.is_empty()) {
        name.push('.');
        name.push_str(variant);
    }
    name.push_str(".toml");
    dir.as_ref().join(name)
}

/// 환경변수에서 디렉토리와 variant를 읽어 설정 파일 경로를 만듭니다.
pub fn default_config_path() -> PathBuf {
    let dir = std::env::var(CONFIG_DIR_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_DIR.to_owned());
    let variant = std::env::var(CONFIG_VARIANT_ENV).ok();
    config_file_path(dir, variant.as_deref())
}

/// 튜너 테스트 하드웨어 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TunerTestConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 데이터플로우 결정 정책
    #[serde(default)]
    pub dataflow: DataflowConfig,
    #[serde(default)]
    pub frontends: Vec<FrontendConfig>,
    #[serde(default)]
    pub demuxes: Vec<DemuxConfig>,
    #[serde(default)]
    pub filters: Vec<FilterConfig>,
    #[serde(default)]
    pub dvrs: Vec<DvrConfig>,
    #[serde(default)]
    pub lnbs: Vec<LnbConfig>,
    #[serde(default)]
    pub descramblers: Vec<DescramblerConfig>,
    #[serde(default)]
    pub time_filters: Vec<TimeFilterConfig>,
    #[serde(default)]
    pub diseqc_messages: Vec<DiseqcMessageConfig>,
    /// 리소스 간 연결 (선언 순서 유지)
    #[serde(default)]
    pub connections: Vec<LinkageEdge>,
}

impl TunerTestConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, TunerLinkError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, TunerLinkError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TunerLinkError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                TunerLinkError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, TunerLinkError> {
        toml::from_str(toml_str).map_err(|e| {
            TunerLinkError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `TUNERLINK_{SECTION}_{FIELD}`
    pub fn apply_env_overrides(&mut self) {
        override_string(&mut self.general.log_level, "TUNERLINK_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "TUNERLINK_GENERAL_LOG_FORMAT");
        override_selection(&mut self.dataflow.selection, "TUNERLINK_DATAFLOW_SELECTION");
    }

    /// 설정값의 유효성을 검증합니다.
    ///
    /// 리소스 간 연결은 여기서 검사하지 않습니다 (`validator` 모듈 담당).
    pub fn validate(&self) -> Result<(), TunerLinkError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        for fe in &self.frontends {
            if fe.end_frequency_hz != 0 && fe.end_frequency_hz < fe.frequency_hz {
                return Err(ConfigError::InvalidValue {
                    field: format!("frontends.{}.end_frequency_hz", fe.id),
                    reason: "must not be lower than frequency_hz".to_owned(),
                }
                .into());
            }
        }

        for filter in &self.filters {
            if filter.buffer_size == 0 {
                return Err(ConfigError::InvalidValue {
                    field: format!("filters.{}.buffer_size", filter.id),
                    reason: "must be greater than 0".to_owned(),
                }
                .into());
            }
        }

        for dvr in &self.dvrs {
            if dvr.low_threshold > dvr.high_threshold {
                return Err(ConfigError::InvalidValue {
                    field: format!("dvrs.{}.low_threshold", dvr.id),
                    reason: "must not exceed high_threshold".to_owned(),
                }
                .into());
            }
            if dvr.high_threshold > dvr.buffer_size {
                return Err(ConfigError::InvalidValue {
                    field: format!("dvrs.{}.high_threshold", dvr.id),
                    reason: "must not exceed buffer_size".to_owned(),
                }
                .into());
            }
        }

        Ok(())
    }

    /// 종류별 리소스 ID를 선언 순서대로 반환합니다.
    pub fn ids(&self, kind: ResourceKind) -> Vec<&ResourceId> {
        match kind {
            ResourceKind::Frontend => self.frontends.iter().map(|r| &r.id).collect(),
            ResourceKind::Lnb => self.lnbs.iter().map(|r| &r.id).collect(),
            ResourceKind::Demux => self.demuxes.iter().map(|r| &r.id).collect(),
            ResourceKind::Filter => self.filters.iter().map(|r| &r.id).collect(),
            ResourceKind::Dvr => self.dvrs.iter().map(|r| &r.id).collect(),
            ResourceKind::Descrambler => self.descramblers.iter().map(|r| &r.id).collect(),
            ResourceKind::TimeFilter => self.time_filters.iter().map(|r| &r.id).collect(),
            ResourceKind::DiseqcMessage => self.diseqc_messages.iter().map(|r| &r.id).collect(),
        }
    }

    /// 리소스가 선언되어 있는지 확인합니다.
    pub fn contains(&self, endpoint: &ResourceRef) -> bool {
        self.declaration_index(endpoint).is_some()
    }

    /// 종류 안에서의 선언 순서 (동률 해소에 사용)
    pub fn declaration_index(&self, endpoint: &ResourceRef) -> Option<usize> {
        self.ids(endpoint.kind)
            .iter()
            .position(|id| **id == endpoint.id)
    }

    pub fn frontend(&self, id: &str) -> Option<&FrontendConfig> {
        self.frontends.iter().find(|r| r.id.as_str() == id)
    }

    pub fn filter(&self, id: &str) -> Option<&FilterConfig> {
        self.filters.iter().find(|r| r.id.as_str() == id)
    }

    pub fn dvr(&self, id: &str) -> Option<&DvrConfig> {
        self.dvrs.iter().find(|r| r.id.as_str() == id)
    }

    pub fn lnb(&self, id: &str) -> Option<&LnbConfig> {
        self.lnbs.iter().find(|r| r.id.as_str() == id)
    }

    pub fn descrambler(&self, id: &str) -> Option<&DescramblerConfig> {
        self.descramblers.iter().find(|r| r.id.as_str() == id)
    }

    /// 특정 종류의 DVR이 하나라도 선언되어 있는지
    pub fn has_dvr_of_type(&self, dvr_type: DvrType) -> bool {
        self.dvrs.iter().any(|d| d.dvr_type == dvr_type)
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// 데이터플로우 결정 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataflowConfig {
    /// 같은 연결을 만족하는 후보가 여럿일 때의 선택 정책
    pub selection: SelectionPolicy,
}

/// 동률 후보 선택 정책
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// 먼저 선언된 리소스 우선
    #[default]
    FirstDeclared,
    /// 나중에 선언된 리소스 우선
    LastDeclared,
}

impl SelectionPolicy {
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "first_declared" | "first" => Some(Self::FirstDeclared),
            "last_declared" | "last" => Some(Self::LastDeclared),
            _ => None,
        }
    }
}

/// 리소스 간 연결: "from이 to를 공급한다"
///
/// `contexts`가 비어 있으면 모든 컨텍스트가 공유하는 연결입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkageEdge {
    pub from: ResourceRef,
    pub to: ResourceRef,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contexts: Vec<DataflowContext>,
}

impl LinkageEdge {
    pub fn new(from: ResourceRef, to: ResourceRef) -> Self {
        Self {
            from,
            to,
            contexts: Vec::new(),
        }
    }

    /// 특정 컨텍스트 전용 연결로 제한합니다.
    pub fn in_contexts(mut self, contexts: &[DataflowContext]) -> Self {
        self.contexts = contexts.to_vec();
        self
    }

    /// 이 연결이 컨텍스트에 적용되는지
    pub fn applies_to(&self, context: DataflowContext) -> bool {
        self.contexts.is_empty() || self.contexts.contains(&context)
    }
}

/// 프론트엔드 종류
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrontendType {
    #[default]
    Undefined,
    Analog,
    Atsc,
    Atsc3,
    Dvbc,
    Dvbs,
    Dvbt,
    Isdbs,
    Isdbs3,
    Isdbt,
    Dtmb,
    Iptv,
}

/// 프론트엔드 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FrontendConfig {
    pub id: ResourceId,
    #[serde(rename = "type", default)]
    pub frontend_type: FrontendType,
    /// 소프트웨어 프론트엔드 (DVR 재생으로 입력을 흉내냄)
    #[serde(default)]
    pub is_software_fe: bool,
    #[serde(default)]
    pub frequency_hz: u64,
    /// 스캔 종료 주파수 (0이면 미사용)
    #[serde(default)]
    pub end_frequency_hz: u64,
    #[serde(default)]
    pub can_connect_to_ci_cam: bool,
    #[serde(default)]
    pub ci_cam_id: Option<i32>,
    #[serde(default)]
    pub remove_output_pid: Option<i32>,
}

/// 디먹스 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DemuxConfig {
    pub id: ResourceId,
}

/// 디먹스 필터 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig {
    pub id: ResourceId,
    pub filter_type: FilterType,
    pub buffer_size: u32,
    #[serde(default)]
    pub pid: Option<u16>,
    #[serde(default)]
    pub use_fmq: bool,
    #[serde(default)]
    pub time_delay_hint_ms: Option<u32>,
    #[serde(default)]
    pub data_size_hint: Option<u32>,
}

/// DVR 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DvrType {
    Record,
    Playback,
}

/// DVR 데이터 형식
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataFormat {
    #[default]
    Ts,
    Pes,
    Es,
    ShvTlv,
}

/// DVR 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DvrConfig {
    pub id: ResourceId,
    #[serde(rename = "type")]
    pub dvr_type: DvrType,
    pub buffer_size: u32,
    #[serde(default)]
    pub status_mask: u32,
    #[serde(default)]
    pub low_threshold: u32,
    #[serde(default)]
    pub high_threshold: u32,
    #[serde(default)]
    pub data_format: DataFormat,
    #[serde(default = "default_packet_size")]
    pub packet_size: u32,
    /// 재생 입력 파일 (playback 전용)
    #[serde(default)]
    pub input_file: Option<String>,
    #[serde(default)]
    pub status_check_interval_hint_ms: Option<u64>,
}

fn default_packet_size() -> u32 {
    188
}

/// LNB 전압
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LnbVoltage {
    #[default]
    #[serde(rename = "none")]
    None,
    #[serde(rename = "5v")]
    V5,
    #[serde(rename = "11v")]
    V11,
    #[serde(rename = "12v")]
    V12,
    #[serde(rename = "13v")]
    V13,
    #[serde(rename = "14v")]
    V14,
    #[serde(rename = "15v")]
    V15,
    #[serde(rename = "18v")]
    V18,
    #[serde(rename = "19v")]
    V19,
}

/// LNB 톤
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LnbTone {
    #[default]
    None,
    Continuous,
}

/// LNB 위성 위치
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LnbPosition {
    #[default]
    Undefined,
    PositionA,
    PositionB,
}

/// LNB 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LnbConfig {
    pub id: ResourceId,
    /// 외부 LNB 이름 (있으면 이름으로 열기)
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub voltage: LnbVoltage,
    #[serde(default)]
    pub tone: LnbTone,
    #[serde(default)]
    pub position: LnbPosition,
}

/// 디스크램블러 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DescramblerConfig {
    pub id: ResourceId,
    pub cas_system_id: i32,
    #[serde(default)]
    pub provision_str: String,
    #[serde(default)]
    pub hidl_pvt_data: Vec<u8>,
}

/// 타임 필터 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeFilterConfig {
    pub id: ResourceId,
    pub time_stamp: u64,
}

/// DiSEqC 메시지 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiseqcMessageConfig {
    pub id: ResourceId,
    pub message: Vec<u8>,
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_selection(target: &mut SelectionPolicy, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match SelectionPolicy::from_str_loose(&val) {
            Some(parsed) => *target = parsed,
            None => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse selection policy from env var, ignoring"
            ),
        }
    }
}
