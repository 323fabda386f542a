//! 도메인 타입: 시스템 전역에서 사용되는 공통 타입
//!
//! 리소스 식별자, 리소스 종류, 데이터플로우 컨텍스트, 테스트 스위트 등
//! 설정 모델과 검증기, 데이터플로우 엔진이 공유하는 타입을 정의합니다.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// 하드웨어 리소스 식별자
///
/// 같은 [`ResourceKind`] 안에서만 유일하면 됩니다.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    /// 새 식별자를 생성합니다.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// 문자열 슬라이스로 반환합니다.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 빈 식별자인지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for ResourceId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for ResourceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for ResourceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 하드웨어 리소스 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// 튜너 프론트엔드
    Frontend,
    /// 위성 LNB
    Lnb,
    /// 디멀티플렉서
    Demux,
    /// 디먹스 필터
    Filter,
    /// 녹화/재생 DVR
    Dvr,
    /// 디스크램블러
    Descrambler,
    /// 타임 필터
    TimeFilter,
    /// DiSEqC 메시지
    DiseqcMessage,
}

impl ResourceKind {
    /// 모든 리소스 종류 (체인 의존 순서)
    pub const ALL: [ResourceKind; 8] = [
        Self::Lnb,
        Self::DiseqcMessage,
        Self::Frontend,
        Self::Demux,
        Self::TimeFilter,
        Self::Filter,
        Self::Dvr,
        Self::Descrambler,
    ];

    /// 설정 파일과 로그에서 사용하는 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Frontend => "frontend",
            Self::Lnb => "lnb",
            Self::Demux => "demux",
            Self::Filter => "filter",
            Self::Dvr => "dvr",
            Self::Descrambler => "descrambler",
            Self::TimeFilter => "time_filter",
            Self::DiseqcMessage => "diseqc_message",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 연결의 한쪽 끝: (종류, ID) 쌍
///
/// TOML에서는 `{ kind = "frontend", id = "FE_DEFAULT" }` 형식으로 선언합니다.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
    /// 리소스 종류
    pub kind: ResourceKind,
    /// 리소스 ID
    pub id: ResourceId,
}

impl ResourceRef {
    pub fn new(kind: ResourceKind, id: impl Into<ResourceId>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// 데이터플로우 컨텍스트
///
/// 어떤 리소스 종류가 함께 구동되어야 하는지를 결정하는 테스트 시나리오 분류입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataflowContext {
    /// 프론트엔드 -> 디먹스 -> 필터 -> 녹화 DVR
    Record,
    /// LNB를 거치는 녹화
    RecordWithLnb,
    /// 프론트엔드 -> 디먹스 -> 필터 -> 디스크램블러
    Descrambling,
    /// LNB를 거치는 디스크램블링
    DescramblingWithLnb,
}

impl DataflowContext {
    /// 모든 컨텍스트 (결정 순서)
    pub const ALL: [DataflowContext; 4] = [
        Self::Record,
        Self::RecordWithLnb,
        Self::Descrambling,
        Self::DescramblingWithLnb,
    ];

    /// LNB가 필요한 컨텍스트인지
    pub fn requires_lnb(&self) -> bool {
        matches!(self, Self::RecordWithLnb | Self::DescramblingWithLnb)
    }

    /// 디스크램블러가 필요한 컨텍스트인지
    pub fn requires_descrambler(&self) -> bool {
        matches!(self, Self::Descrambling | Self::DescramblingWithLnb)
    }

    /// 녹화 DVR이 필요한 컨텍스트인지
    pub fn requires_record_dvr(&self) -> bool {
        matches!(self, Self::Record | Self::RecordWithLnb)
    }

    /// 이 컨텍스트를 구동하는 테스트 스위트
    pub fn suite(&self) -> TestSuite {
        if self.requires_descrambler() {
            TestSuite::Descrambler
        } else {
            TestSuite::Record
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Record => "record",
            Self::RecordWithLnb => "record_with_lnb",
            Self::Descrambling => "descrambling",
            Self::DescramblingWithLnb => "descrambling_with_lnb",
        }
    }

    /// 문자열에서 컨텍스트를 파싱합니다 (대소문자, `-`/`_` 구분 없음).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "record" => Some(Self::Record),
            "record_with_lnb" | "lnb_record" => Some(Self::RecordWithLnb),
            "descrambling" => Some(Self::Descrambling),
            "descrambling_with_lnb" | "lnb_descrambling" => Some(Self::DescramblingWithLnb),
            _ => None,
        }
    }
}

impl fmt::Display for DataflowContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 리소스를 소비하는 테스트 스위트 (픽스처 계열)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestSuite {
    Frontend,
    Demux,
    Filter,
    Playback,
    Record,
    Broadcast,
    Descrambler,
    Lnb,
}

impl TestSuite {
    pub const ALL: [TestSuite; 8] = [
        Self::Frontend,
        Self::Demux,
        Self::Filter,
        Self::Playback,
        Self::Record,
        Self::Broadcast,
        Self::Descrambler,
        Self::Lnb,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Frontend => "frontend",
            Self::Demux => "demux",
            Self::Filter => "filter",
            Self::Playback => "playback",
            Self::Record => "record",
            Self::Broadcast => "broadcast",
            Self::Descrambler => "descrambler",
            Self::Lnb => "lnb",
        }
    }

    /// 스위트가 구동하는 데이터플로우 컨텍스트
    pub fn contexts(&self) -> &'static [DataflowContext] {
        match self {
            Self::Record => &[DataflowContext::Record, DataflowContext::RecordWithLnb],
            Self::Descrambler => &[
                DataflowContext::Descrambling,
                DataflowContext::DescramblingWithLnb,
            ],
            _ => &[],
        }
    }

    /// CAS 서비스가 필요한 스위트인지
    pub fn requires_cas(&self) -> bool {
        matches!(self, Self::Descrambler)
    }
}

impl fmt::Display for TestSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
