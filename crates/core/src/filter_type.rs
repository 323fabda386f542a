//! 필터 타입 코덱: 메인 타입 비트마스크와 서브 타입 태그
//!
//! [`FilterType`]은 메인 타입과 서브 타입을 하나의 태그 유니온으로 묶습니다.
//! TS 메인 타입에 IP 서브 타입이 붙는 식의 불일치는 타입 수준에서 표현할 수 없습니다.
//!
//! [`filter_type_for_bit`]은 비트 위치 하나를 `(메인 타입, UNDEFINED 서브 타입)`
//! 쌍으로 변환합니다. 알 수 없는 비트는 실패 대신 [`FilterType::Unknown`]을 반환합니다.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// 디먹스 필터 메인 타입 (비트마스크 값)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemuxFilterMainType {
    Ts,
    Mmtp,
    Ip,
    Tlv,
    Alp,
}

impl DemuxFilterMainType {
    pub const ALL: [DemuxFilterMainType; 5] =
        [Self::Ts, Self::Mmtp, Self::Ip, Self::Tlv, Self::Alp];

    /// 비트마스크 값 (`1 << 비트 위치`)
    pub fn bits(&self) -> u32 {
        match self {
            Self::Ts => 1 << 0,
            Self::Mmtp => 1 << 1,
            Self::Ip => 1 << 2,
            Self::Tlv => 1 << 3,
            Self::Alp => 1 << 4,
        }
    }

    /// 정확히 하나의 메인 타입에 대응하는 값만 변환합니다.
    pub fn from_bits(bits: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.bits() == bits)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ts => "ts",
            Self::Mmtp => "mmtp",
            Self::Ip => "ip",
            Self::Tlv => "tlv",
            Self::Alp => "alp",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for DemuxFilterMainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// 서브 타입 열거형은 이름 목록만 다르므로 매크로로 생성합니다.
macro_rules! sub_type_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            #[default]
            Undefined,
            $($variant,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[Self::Undefined, $(Self::$variant,)+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    Self::Undefined => "undefined",
                    $(Self::$variant => $text,)+
                }
            }

            pub fn from_str_loose(s: &str) -> Option<Self> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

sub_type_enum! {
    /// TS 필터 서브 타입
    TsFilterType {
        Section => "section",
        Pes => "pes",
        Ts => "ts",
        Audio => "audio",
        Video => "video",
        Pcr => "pcr",
        Record => "record",
        Temi => "temi",
    }
}

sub_type_enum! {
    /// MMTP 필터 서브 타입
    MmtpFilterType {
        Section => "section",
        Pes => "pes",
        Mmtp => "mmtp",
        Audio => "audio",
        Video => "video",
        Record => "record",
        Download => "download",
    }
}

sub_type_enum! {
    /// IP 필터 서브 타입
    IpFilterType {
        Section => "section",
        Ntp => "ntp",
        IpPayload => "ip_payload",
        Ip => "ip",
        PayloadThrough => "payload_through",
    }
}

sub_type_enum! {
    /// TLV 필터 서브 타입
    TlvFilterType {
        Section => "section",
        Tlv => "tlv",
        PayloadThrough => "payload_through",
    }
}

sub_type_enum! {
    /// ALP 필터 서브 타입
    AlpFilterType {
        Section => "section",
        Ptp => "ptp",
        PayloadThrough => "payload_through",
    }
}

/// 필터 용도: 레지스트리에서 어떤 스위트가 필터를 쓰는지 결정합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterPurpose {
    Audio,
    Video,
    Section,
    Pcr,
    Ip,
    Record,
    Playback,
}

impl fmt::Display for FilterPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Audio => "audio",
            Self::Video => "video",
            Self::Section => "section",
            Self::Pcr => "pcr",
            Self::Ip => "ip",
            Self::Record => "record",
            Self::Playback => "playback",
        };
        f.write_str(s)
    }
}

/// 메인 타입 + 서브 타입 태그 유니온
///
/// 설정 파일에서는 `filter_type = { main_type = "ts", sub_type = "audio" }`로 선언합니다.
/// `sub_type`을 생략하면 `undefined`입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawFilterType", into = "RawFilterType")]
pub enum FilterType {
    Ts(TsFilterType),
    Mmtp(MmtpFilterType),
    Ip(IpFilterType),
    Tlv(TlvFilterType),
    Alp(AlpFilterType),
    /// 알려진 메인 타입에 대응하지 않는 값: 연결 정보 없음
    Unknown { main_type: u32 },
}

impl FilterType {
    /// 메인 타입에 대해 UNDEFINED 서브 타입을 가진 태그를 만듭니다.
    pub fn undefined(main_type: DemuxFilterMainType) -> Self {
        match main_type {
            DemuxFilterMainType::Ts => Self::Ts(TsFilterType::Undefined),
            DemuxFilterMainType::Mmtp => Self::Mmtp(MmtpFilterType::Undefined),
            DemuxFilterMainType::Ip => Self::Ip(IpFilterType::Undefined),
            DemuxFilterMainType::Tlv => Self::Tlv(TlvFilterType::Undefined),
            DemuxFilterMainType::Alp => Self::Alp(AlpFilterType::Undefined),
        }
    }

    /// 메인 타입 (`Unknown`이면 `None`)
    pub fn main_type(&self) -> Option<DemuxFilterMainType> {
        match self {
            Self::Ts(_) => Some(DemuxFilterMainType::Ts),
            Self::Mmtp(_) => Some(DemuxFilterMainType::Mmtp),
            Self::Ip(_) => Some(DemuxFilterMainType::Ip),
            Self::Tlv(_) => Some(DemuxFilterMainType::Tlv),
            Self::Alp(_) => Some(DemuxFilterMainType::Alp),
            Self::Unknown { .. } => None,
        }
    }

    /// 메인 타입 비트마스크 값
    pub fn main_type_bits(&self) -> u32 {
        match self {
            Self::Unknown { main_type } => *main_type,
            known => known.main_type().map_or(0, |t| t.bits()),
        }
    }

    /// 서브 타입 이름 (`Unknown`이면 서브 타입 없음)
    pub fn sub_type_name(&self) -> Option<&'static str> {
        match self {
            Self::Ts(t) => Some(t.as_str()),
            Self::Mmtp(t) => Some(t.as_str()),
            Self::Ip(t) => Some(t.as_str()),
            Self::Tlv(t) => Some(t.as_str()),
            Self::Alp(t) => Some(t.as_str()),
            Self::Unknown { .. } => None,
        }
    }

    /// 서브 타입이 UNDEFINED인지
    pub fn is_undefined_sub_type(&self) -> bool {
        self.sub_type_name() == Some("undefined")
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown { .. })
    }

    /// 서브 타입에서 필터 용도를 도출합니다.
    pub fn purpose(&self) -> Option<FilterPurpose> {
        use FilterPurpose as P;
        match self {
            Self::Ts(t) => match t {
                TsFilterType::Audio => Some(P::Audio),
                TsFilterType::Video => Some(P::Video),
                TsFilterType::Section => Some(P::Section),
                TsFilterType::Pcr => Some(P::Pcr),
                TsFilterType::Record => Some(P::Record),
                TsFilterType::Ts => Some(P::Playback),
                TsFilterType::Undefined | TsFilterType::Pes | TsFilterType::Temi => None,
            },
            Self::Mmtp(t) => match t {
                MmtpFilterType::Audio => Some(P::Audio),
                MmtpFilterType::Video => Some(P::Video),
                MmtpFilterType::Section => Some(P::Section),
                MmtpFilterType::Record => Some(P::Record),
                MmtpFilterType::Mmtp => Some(P::Playback),
                MmtpFilterType::Undefined | MmtpFilterType::Pes | MmtpFilterType::Download => {
                    None
                }
            },
            Self::Ip(t) => match t {
                IpFilterType::Undefined => None,
                IpFilterType::Section => Some(P::Section),
                _ => Some(P::Ip),
            },
            Self::Tlv(t) => match t {
                TlvFilterType::Undefined => None,
                TlvFilterType::Section => Some(P::Section),
                TlvFilterType::Tlv | TlvFilterType::PayloadThrough => Some(P::Playback),
            },
            Self::Alp(t) => match t {
                AlpFilterType::Section => Some(P::Section),
                AlpFilterType::PayloadThrough => Some(P::Playback),
                AlpFilterType::Undefined | AlpFilterType::Ptp => None,
            },
            Self::Unknown { .. } => None,
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.main_type(), self.sub_type_name()) {
            (Some(main), Some(sub)) => write!(f, "{main}/{sub}"),
            _ => write!(f, "unknown(0x{:x})", self.main_type_bits()),
        }
    }
}

/// 설정 파일 표현: 문자열 쌍
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawFilterType {
    main_type: String,
    #[serde(default = "undefined_name")]
    sub_type: String,
}

fn undefined_name() -> String {
    "undefined".to_owned()
}

impl TryFrom<RawFilterType> for FilterType {
    type Error = String;

    fn try_from(raw: RawFilterType) -> Result<Self, Self::Error> {
        let main = DemuxFilterMainType::from_str_loose(&raw.main_type)
            .ok_or_else(|| format!("unknown filter main type '{}'", raw.main_type))?;

        let mismatch = || format!("sub type '{}' is not a {} sub type", raw.sub_type, main);
        let sub = raw.sub_type.as_str();
        let parsed = match main {
            DemuxFilterMainType::Ts => TsFilterType::from_str_loose(sub).map(Self::Ts),
            DemuxFilterMainType::Mmtp => MmtpFilterType::from_str_loose(sub).map(Self::Mmtp),
            DemuxFilterMainType::Ip => IpFilterType::from_str_loose(sub).map(Self::Ip),
            DemuxFilterMainType::Tlv => TlvFilterType::from_str_loose(sub).map(Self::Tlv),
            DemuxFilterMainType::Alp => AlpFilterType::from_str_loose(sub).map(Self::Alp),
        };
        parsed.ok_or_else(mismatch)
    }
}

impl From<FilterType> for RawFilterType {
    fn from(t: FilterType) -> Self {
        match (t.main_type(), t.sub_type_name()) {
            (Some(main), Some(sub)) => Self {
                main_type: main.as_str().to_owned(),
                sub_type: sub.to_owned(),
            },
            _ => Self {
                main_type: format!("0x{:x}", t.main_type_bits()),
                sub_type: "none".to_owned(),
            },
        }
    }
}

/// 비트 위치를 `(메인 타입, UNDEFINED 서브 타입)` 태그로 변환합니다.
///
/// 비트 0..=4는 TS, MMTP, IP, TLV, ALP에 대응합니다.
/// 그 외 비트는 [`FilterType::Unknown`]을 반환하며, 호출자는 이를
/// "이 타입에 대한 연결 정보 없음"으로 취급해야 합니다.
pub fn filter_type_for_bit(bit: u32) -> FilterType {
    let main_type = 1u32.checked_shl(bit).unwrap_or(0);
    match DemuxFilterMainType::from_bits(main_type) {
        Some(main) => FilterType::undefined(main),
        None => {
            debug!(bit, main_type, "no filter main type for bit position");
            FilterType::Unknown { main_type }
        }
    }
}

/// 능력 비트마스크의 설정된 비트마다 태그를 하나씩 반환합니다 (오름차순).
pub fn linkage_types(mask: u32) -> Vec<FilterType> {
    (0..u32::BITS)
        .filter(|bit| mask & (1 << bit) != 0)
        .map(filter_type_for_bit)
        .collect()
}
