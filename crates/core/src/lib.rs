#![doc = include_str!("../README.md")]

pub mod config;
pub mod dataflow;
pub mod error;
pub mod filter_type;
pub mod harness;
pub mod metrics;
pub mod registry;
pub mod service;
pub mod types;
pub mod validator;

// --- 주요 타입 re-export ---
// 각 모듈의 핵심 타입을 크레이트 루트에서 바로 사용할 수 있도록 합니다.

// 에러
pub use error::{ConfigError, LinkageError, ServiceError, TunerLinkError};

// 설정
pub use config::{LinkageEdge, SelectionPolicy, TunerTestConfig};

// 레지스트리 및 검증
pub use registry::{ResourceRegistry, connect_hardware_to_test_cases};
pub use validator::{ConnectionValidator, ValidatedConnections, validate_connections};

// 데이터플로우
pub use dataflow::{DataflowChain, DataflowPlan, determine_dataflows};

// 필터 타입 코덱
pub use filter_type::{FilterType, filter_type_for_bit};

// 하네스 및 서비스
pub use harness::{HardwareHelper, InitOutcome, SuiteSession, initialize_configuration};
pub use service::{Backend, ServiceManager, resolve_backend};

// 도메인 타입
pub use types::{DataflowContext, ResourceId, ResourceKind, ResourceRef, TestSuite};
