//! 에러 타입: 도메인별 에러 정의

use crate::types::{DataflowContext, ResourceKind, ResourceRef};

/// Tunerlink 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum TunerLinkError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 하드웨어 연결 검증 에러
    #[error("linkage error: {0}")]
    Linkage(#[from] LinkageError),

    /// 서비스 핸들 획득 에러
    #[error("service error: {0}")]
    Service(#[from] ServiceError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 하드웨어 연결 검증 에러
///
/// 검증기는 첫 번째 위반만 보고합니다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinkageError {
    /// 빈 리소스 ID
    #[error("{kind} declared with an empty id")]
    EmptyId { kind: ResourceKind },

    /// 같은 종류 안에서 ID 중복
    #[error("{kind} id '{id}' is declared more than once")]
    DuplicateId { kind: ResourceKind, id: String },

    /// 선언되지 않은 리소스를 참조하는 연결
    #[error("connection #{index} references undeclared {endpoint}")]
    DanglingReference { index: usize, endpoint: ResourceRef },

    /// 레지스트리에 등록되지 않은 리소스
    #[error("connection #{index} references {endpoint} which no test suite uses")]
    OutOfScope { index: usize, endpoint: ResourceRef },

    /// 인접 테이블에 없는 연결 종류
    #[error("connection #{index}: {from} -> {to} is not a legal linkage")]
    IllegalAdjacency {
        index: usize,
        from: ResourceKind,
        to: ResourceKind,
    },

    /// DVR 역할(record/playback) 불일치
    #[error("connection #{index}: {endpoint} {reason}")]
    RoleMismatch {
        index: usize,
        endpoint: ResourceRef,
        reason: String,
    },

    /// 자기 자신으로의 연결
    #[error("connection #{index} links {endpoint} to itself")]
    SelfLink { index: usize, endpoint: ResourceRef },

    /// 동일 연결 중복 선언
    #[error("connection #{index} repeats {from} -> {to} for {context}")]
    DuplicateLink {
        index: usize,
        from: ResourceRef,
        to: ResourceRef,
        context: DataflowContext,
    },

    /// 하나의 대상에 소스가 둘 이상 연결됨
    #[error("{target} has more than one source ({first}, {second}) in {context}")]
    AmbiguousSource {
        target: ResourceRef,
        first: ResourceRef,
        second: ResourceRef,
        context: DataflowContext,
    },

    /// 선택된 컨텍스트에 필요한 리소스 종류 누락
    #[error("{context} is selected but no {requirement} is declared")]
    MissingRequiredKind {
        context: DataflowContext,
        requirement: String,
    },
}

/// 서비스 핸들 획득 에러
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// 튜너 서비스 인스턴스 없음
    #[error("tuner service '{instance}' is not available")]
    TunerUnavailable { instance: String },

    /// CAS 서비스가 primary/legacy 모두 없음
    #[error("no media cas service available (primary '{primary}' or legacy)")]
    CasUnavailable { primary: String },
}
