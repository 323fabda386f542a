#![no_main]

use std::fmt::Write;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tunerlink_core::config::TunerTestConfig;
use tunerlink_core::dataflow::determine_dataflows;
use tunerlink_core::registry::{ResourceRegistry, connect_hardware_to_test_cases};
use tunerlink_core::types::ResourceKind;
use tunerlink_core::validator;

/// 퍼저용 구조적 입력: 고정된 리소스 집합 위의 임의 연결
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    last_declared: bool,
    /// 연결 목록 (최대 32개로 제한)
    edges: Vec<FuzzEdge>,
}

#[derive(Arbitrary, Debug)]
struct FuzzEdge {
    from: FuzzEndpoint,
    to: FuzzEndpoint,
    /// 비트 0..4 = record, record_with_lnb, descrambling, descrambling_with_lnb
    contexts: u8,
}

#[derive(Arbitrary, Debug, Clone, Copy)]
enum FuzzEndpoint {
    Frontend(u8),
    Demux(u8),
    Filter(u8),
    Dvr(u8),
    Lnb(u8),
    Descrambler(u8),
    TimeFilter(u8),
}

impl FuzzEndpoint {
    /// 인덱스 3은 선언되지 않은 리소스
    fn render(self) -> (ResourceKind, String) {
        let (kind, prefix, n) = match self {
            Self::Frontend(n) => (ResourceKind::Frontend, "FE", n),
            Self::Demux(n) => (ResourceKind::Demux, "DMX", n),
            Self::Filter(n) => (ResourceKind::Filter, "FLT", n),
            Self::Dvr(n) => (ResourceKind::Dvr, "DVR", n),
            Self::Lnb(n) => (ResourceKind::Lnb, "LNB", n),
            Self::Descrambler(n) => (ResourceKind::Descrambler, "DESC", n),
            Self::TimeFilter(n) => (ResourceKind::TimeFilter, "TF", n),
        };
        (kind, format!("{}{}", prefix, n % 4))
    }
}

const HARDWARE: &str = r#"
[[frontends]]
id = "FE0"
type = "dvbt"

[[frontends]]
id = "FE1"
type = "dvbs"

[[demuxes]]
id = "DMX0"

[[demuxes]]
id = "DMX1"

[[filters]]
id = "FLT0"
filter_type = { main_type = "ts", sub_type = "audio" }
buffer_size = 1048576

[[filters]]
id = "FLT1"
filter_type = { main_type = "ts", sub_type = "record" }
buffer_size = 1048576

[[filters]]
id = "FLT2"
filter_type = { main_type = "ts", sub_type = "video" }
buffer_size = 1048576

[[dvrs]]
id = "DVR0"
type = "record"
buffer_size = 4194304

[[dvrs]]
id = "DVR1"
type = "playback"
buffer_size = 4194304

[[lnbs]]
id = "LNB0"

[[descramblers]]
id = "DESC0"
cas_system_id = 63192

[[time_filters]]
id = "TF0"
time_stamp = 1
"#;

const CONTEXTS: [&str; 4] = [
    "record",
    "record_with_lnb",
    "descrambling",
    "descrambling_with_lnb",
];

fn build(input: &FuzzInput) -> String {
    let mut toml = String::new();
    let selection = if input.last_declared {
        "last_declared"
    } else {
        "first_declared"
    };
    let _ = writeln!(toml, "[dataflow]\nselection = \"{}\"", selection);
    toml.push_str(HARDWARE);

    for edge in input.edges.iter().take(32) {
        let (from_kind, from_id) = edge.from.render();
        let (to_kind, to_id) = edge.to.render();
        let contexts: Vec<String> = CONTEXTS
            .iter()
            .enumerate()
            .filter(|(bit, _)| edge.contexts & (1 << bit) != 0)
            .map(|(_, name)| format!("\"{}\"", name))
            .collect();
        let _ = writeln!(
            toml,
            "\n[[connections]]\nfrom = {{ kind = \"{}\", id = \"{}\" }}\nto = {{ kind = \"{}\", id = \"{}\" }}\ncontexts = [{}]",
            from_kind.as_str(),
            from_id,
            to_kind.as_str(),
            to_id,
            contexts.join(", ")
        );
    }
    toml
}

fuzz_target!(|input: FuzzInput| {
    let Ok(config) = TunerTestConfig::parse(&build(&input)) else {
        return;
    };

    let mut registry = ResourceRegistry::new();
    connect_hardware_to_test_cases(&config, &mut registry);
    let Ok(validated) = validator::validate(&config, &registry) else {
        return;
    };

    let plan = determine_dataflows(&validated);
    for chain in plan.iter() {
        // LNB 컨텍스트의 체인은 항상 LNB로 시작
        if chain.context().requires_lnb() && !chain.is_empty() {
            assert_eq!(chain.links()[0].kind, ResourceKind::Lnb);
        }
        // 모든 링크는 선언된 리소스
        for link in chain.links() {
            assert!(config.contains(link));
        }
    }
});
