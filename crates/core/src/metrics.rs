//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 레코더가 설치되지 않았으면 `metrics::counter!()` 호출은 아무 일도 하지 않습니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `tunerlink_`
//! - 접미어: `_total` (counter)

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 결과 레이블 키 (valid, invalid)
pub const LABEL_RESULT: &str = "result";

/// 데이터플로우 컨텍스트 레이블 키
pub const LABEL_CONTEXT: &str = "context";

// ─── 메트릭 ────────────────────────────────────────────────────────

/// 연결 검증 실행 수 (counter, label: result)
pub const VALIDATIONS_TOTAL: &str = "tunerlink_validations_total";

/// 연결 검증 실패 수 (counter)
pub const VALIDATION_FAILURES_TOTAL: &str = "tunerlink_validation_failures_total";

/// 결정된 비어 있지 않은 데이터플로우 체인 수 (counter, label: context)
pub const DATAFLOW_CHAINS_TOTAL: &str = "tunerlink_dataflow_chains_total";

/// 정의된 모든 메트릭 이름
pub const ALL_METRIC_NAMES: &[&str] = &[
    VALIDATIONS_TOTAL,
    VALIDATION_FAILURES_TOTAL,
    DATAFLOW_CHAINS_TOTAL,
];

/// 모든 메트릭의 설명을 등록합니다.
pub fn describe_all() {
    use metrics::describe_counter;

    describe_counter!(
        VALIDATIONS_TOTAL,
        "Total number of hardware connection validations, by result"
    );
    describe_counter!(
        VALIDATION_FAILURES_TOTAL,
        "Total number of hardware connection validations that failed"
    );
    describe_counter!(
        DATAFLOW_CHAINS_TOTAL,
        "Total number of non-empty dataflow chains determined, by context"
    );
}
