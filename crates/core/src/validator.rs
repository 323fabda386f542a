//! 연결 검증기: 선언된 연결이 서로 모순 없는지 확인합니다.
//!
//! 검사 순서:
//! 1. 설정 형태 (빈 ID, 종류 내 중복 ID)
//! 2. 연결별: 양 끝 존재, 레지스트리 범위, 자기 연결, 인접 테이블, DVR 역할, 중복 선언
//! 3. 컨텍스트별 카디널리티 (디먹스 소스 1개, 프론트엔드 LNB 1개)
//! 4. 선택된 컨텍스트의 필수 리소스 종류
//!
//! 첫 번째 위반에서 멈춥니다. 해석이 모호한 연결은 항상 무효로 취급합니다.

use std::collections::{BTreeMap, HashSet};

use tracing::{info, warn};

use crate::config::{DvrType, LinkageEdge, TunerTestConfig};
use crate::error::LinkageError;
use crate::metrics as m;
use crate::registry::ResourceRegistry;
use crate::types::{DataflowContext, ResourceKind, ResourceRef};

/// 허용되는 (소스 종류, 대상 종류) 쌍
pub const LEGAL_ADJACENCY: &[(ResourceKind, ResourceKind)] = &[
    (ResourceKind::Lnb, ResourceKind::Frontend),
    (ResourceKind::DiseqcMessage, ResourceKind::Lnb),
    (ResourceKind::Frontend, ResourceKind::Demux),
    (ResourceKind::Dvr, ResourceKind::Demux),
    (ResourceKind::Demux, ResourceKind::Filter),
    (ResourceKind::Demux, ResourceKind::TimeFilter),
    (ResourceKind::Filter, ResourceKind::Dvr),
    (ResourceKind::Filter, ResourceKind::Descrambler),
];

/// 인접 테이블에 있는 연결 종류인지
pub fn is_legal_adjacency(from: ResourceKind, to: ResourceKind) -> bool {
    LEGAL_ADJACENCY.contains(&(from, to))
}

/// 검증을 통과한 설정: 데이터플로우 엔진은 이 값만 받습니다.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedConnections<'a> {
    config: &'a TunerTestConfig,
    registry: &'a ResourceRegistry,
}

impl<'a> ValidatedConnections<'a> {
    pub fn config(&self) -> &'a TunerTestConfig {
        self.config
    }

    pub fn registry(&self) -> &'a ResourceRegistry {
        self.registry
    }
}

/// 연결 검증기
pub struct ConnectionValidator<'a> {
    config: &'a TunerTestConfig,
    registry: &'a ResourceRegistry,
}

impl<'a> ConnectionValidator<'a> {
    pub fn new(config: &'a TunerTestConfig, registry: &'a ResourceRegistry) -> Self {
        Self { config, registry }
    }

    /// 모든 검사를 수행하고 첫 번째 위반을 반환합니다.
    pub fn check(&self) -> Result<ValidatedConnections<'a>, LinkageError> {
        let result = self
            .check_shape()
            .and_then(|()| self.check_edges())
            .and_then(|()| self.check_cardinality())
            .and_then(|()| self.check_required_kinds());

        let outcome = if result.is_ok() { "valid" } else { "invalid" };
        metrics::counter!(m::VALIDATIONS_TOTAL, m::LABEL_RESULT => outcome).increment(1);

        result.map(|()| {
            info!(
                connections = self.config.connections.len(),
                "hardware connections validated"
            );
            ValidatedConnections {
                config: self.config,
                registry: self.registry,
            }
        })
    }

    fn check_shape(&self) -> Result<(), LinkageError> {
        for kind in ResourceKind::ALL {
            let mut seen = HashSet::new();
            for id in self.config.ids(kind) {
                if id.is_empty() {
                    return Err(LinkageError::EmptyId { kind });
                }
                if !seen.insert(id) {
                    return Err(LinkageError::DuplicateId {
                        kind,
                        id: id.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn check_edges(&self) -> Result<(), LinkageError> {
        let edges = &self.config.connections;
        for (index, edge) in edges.iter().enumerate() {
            for endpoint in [&edge.from, &edge.to] {
                if !self.config.contains(endpoint) {
                    return Err(LinkageError::DanglingReference {
                        index,
                        endpoint: endpoint.clone(),
                    });
                }
            }

            for endpoint in [&edge.from, &edge.to] {
                if !self.registry.contains(endpoint.kind, endpoint.id.as_str()) {
                    return Err(LinkageError::OutOfScope {
                        index,
                        endpoint: endpoint.clone(),
                    });
                }
            }

            if edge.from == edge.to {
                return Err(LinkageError::SelfLink {
                    index,
                    endpoint: edge.from.clone(),
                });
            }

            if !is_legal_adjacency(edge.from.kind, edge.to.kind) {
                return Err(LinkageError::IllegalAdjacency {
                    index,
                    from: edge.from.kind,
                    to: edge.to.kind,
                });
            }

            self.check_role(index, edge)?;

            if let Some(context) = edges[..index]
                .iter()
                .filter(|prev| prev.from == edge.from && prev.to == edge.to)
                .find_map(|prev| shared_context(prev, edge))
            {
                return Err(LinkageError::DuplicateLink {
                    index,
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                    context,
                });
            }
        }
        Ok(())
    }

    fn check_role(&self, index: usize, edge: &LinkageEdge) -> Result<(), LinkageError> {
        let (endpoint, expected) = match (edge.from.kind, edge.to.kind) {
            (ResourceKind::Filter, ResourceKind::Dvr) => (&edge.to, DvrType::Record),
            (ResourceKind::Dvr, ResourceKind::Demux) => (&edge.from, DvrType::Playback),
            _ => return Ok(()),
        };

        // 존재 여부는 앞에서 확인했으므로 None은 도달하지 않지만, 무효로 취급합니다.
        let actual = self.config.dvr(endpoint.id.as_str()).map(|d| d.dvr_type);
        if actual == Some(expected) {
            return Ok(());
        }

        let reason = match expected {
            DvrType::Record => "must be a record dvr to receive filter output",
            DvrType::Playback => "must be a playback dvr to feed a demux",
        };
        Err(LinkageError::RoleMismatch {
            index,
            endpoint: endpoint.clone(),
            reason: reason.to_owned(),
        })
    }

    fn check_cardinality(&self) -> Result<(), LinkageError> {
        for context in DataflowContext::ALL {
            let mut sources: BTreeMap<&ResourceRef, &ResourceRef> = BTreeMap::new();
            for edge in self.config.connections.iter().filter(|e| e.applies_to(context)) {
                let single_source = matches!(
                    (edge.from.kind, edge.to.kind),
                    (ResourceKind::Frontend | ResourceKind::Dvr, ResourceKind::Demux)
                        | (ResourceKind::Lnb, ResourceKind::Frontend)
                );
                if !single_source {
                    continue;
                }
                match sources.get(&edge.to) {
                    Some(first) if *first != &edge.from => {
                        return Err(LinkageError::AmbiguousSource {
                            target: edge.to.clone(),
                            first: (*first).clone(),
                            second: edge.from.clone(),
                            context,
                        });
                    }
                    Some(_) => {}
                    None => {
                        sources.insert(&edge.to, &edge.from);
                    }
                }
            }
        }
        Ok(())
    }

    fn check_required_kinds(&self) -> Result<(), LinkageError> {
        for context in self.selected_contexts() {
            let missing = if context.requires_lnb() && self.config.lnbs.is_empty() {
                Some("lnb")
            } else if context.requires_descrambler() && self.config.descramblers.is_empty() {
                Some("descrambler")
            } else if context.requires_record_dvr() && !self.config.has_dvr_of_type(DvrType::Record)
            {
                Some("record dvr")
            } else {
                None
            };

            if let Some(requirement) = missing {
                return Err(LinkageError::MissingRequiredKind {
                    context,
                    requirement: requirement.to_owned(),
                });
            }
        }
        Ok(())
    }

    /// 연결에 명시적으로 지정된 컨텍스트 (정렬, 중복 제거)
    pub fn selected_contexts(&self) -> Vec<DataflowContext> {
        DataflowContext::ALL
            .into_iter()
            .filter(|ctx| {
                self.config
                    .connections
                    .iter()
                    .any(|edge| edge.contexts.contains(ctx))
            })
            .collect()
    }
}

/// 두 연결이 함께 적용되는 첫 번째 컨텍스트
fn shared_context(a: &LinkageEdge, b: &LinkageEdge) -> Option<DataflowContext> {
    DataflowContext::ALL
        .into_iter()
        .find(|ctx| a.applies_to(*ctx) && b.applies_to(*ctx))
}

/// 연결을 검증합니다. 실패하면 실패한 검사를 설명하는 로그를 남깁니다.
pub fn validate<'a>(
    config: &'a TunerTestConfig,
    registry: &'a ResourceRegistry,
) -> Result<ValidatedConnections<'a>, LinkageError> {
    ConnectionValidator::new(config, registry)
        .check()
        .inspect_err(|e| {
            warn!(error = %e, "failed to validate connections");
            metrics::counter!(m::VALIDATION_FAILURES_TOTAL).increment(1);
        })
}

/// 연결을 검증하고 결과만 반환합니다.
///
/// `false`이면 스위트 초기화를 중단해야 합니다.
pub fn validate_connections(config: &TunerTestConfig, registry: &ResourceRegistry) -> bool {
    validate(config, registry).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::connect_hardware_to_test_cases;

    fn registry_for(config: &TunerTestConfig) -> ResourceRegistry {
        let mut registry = ResourceRegistry::new();
        connect_hardware_to_test_cases(config, &mut registry);
        registry
    }

    fn check(toml: &str) -> Result<(), LinkageError> {
        let config = TunerTestConfig::parse(toml).unwrap();
        let registry = registry_for(&config);
        ConnectionValidator::new(&config, &registry)
            .check()
            .map(|_| ())
    }

    const HARDWARE: &str = r#"
[[frontends]]
id = "FE0"
type = "dvbs"

[[frontends]]
id = "FE1"
type = "dvbt"

[[demuxes]]
id = "DMX0"

[[filters]]
id = "AUDIO0"
filter_type = { main_type = "ts", sub_type = "audio" }
buffer_size = 1024

[[dvrs]]
id = "DVR_REC"
type = "record"
buffer_size = 1024

[[dvrs]]
id = "DVR_PB"
type = "playback"
buffer_size = 1024

[[lnbs]]
id = "LNB0"
"#;

    fn with_edges(edges: &str) -> String {
        format!("{HARDWARE}\n{edges}")
    }

    #[test]
    fn valid_record_topology_passes() {
        let toml = with_edges(
            r#"
[[connections]]
from = { kind = "frontend", id = "FE0" }
to = { kind = "demux", id = "DMX0" }

[[connections]]
from = { kind = "demux", id = "DMX0" }
to = { kind = "filter", id = "AUDIO0" }

[[connections]]
from = { kind = "filter", id = "AUDIO0" }
to = { kind = "dvr", id = "DVR_REC" }
"#,
        );
        check(&toml).unwrap();
    }

    #[test]
    fn dangling_dvr_is_rejected() {
        let toml = with_edges(
            r#"
[[connections]]
from = { kind = "filter", id = "AUDIO0" }
to = { kind = "dvr", id = "dvr9" }
"#,
        );
        let err = check(&toml).unwrap_err();
        assert_eq!(
            err,
            LinkageError::DanglingReference {
                index: 0,
                endpoint: ResourceRef::new(ResourceKind::Dvr, "dvr9"),
            }
        );
    }

    #[test]
    fn dangling_reference_wins_regardless_of_other_edges() {
        let toml = with_edges(
            r#"
[[connections]]
from = { kind = "frontend", id = "FE0" }
to = { kind = "demux", id = "DMX0" }

[[connections]]
from = { kind = "lnb", id = "LNB_MISSING" }
to = { kind = "frontend", id = "FE0" }
"#,
        );
        assert!(matches!(
            check(&toml),
            Err(LinkageError::DanglingReference { index: 1, .. })
        ));
    }

    #[test]
    fn id_in_other_kind_is_still_dangling() {
        // "FE0"은 frontend에만 선언되어 있음
        let toml = with_edges(
            r#"
[[connections]]
from = { kind = "demux", id = "FE0" }
to = { kind = "filter", id = "AUDIO0" }
"#,
        );
        assert!(matches!(
            check(&toml),
            Err(LinkageError::DanglingReference { .. })
        ));
    }

    #[test]
    fn illegal_adjacency_is_rejected() {
        let toml = with_edges(
            r#"
[[connections]]
from = { kind = "dvr", id = "DVR_REC" }
to = { kind = "lnb", id = "LNB0" }
"#,
        );
        assert_eq!(
            check(&toml).unwrap_err(),
            LinkageError::IllegalAdjacency {
                index: 0,
                from: ResourceKind::Dvr,
                to: ResourceKind::Lnb,
            }
        );
    }

    #[test]
    fn filter_into_playback_dvr_is_role_mismatch() {
        let toml = with_edges(
            r#"
[[connections]]
from = { kind = "filter", id = "AUDIO0" }
to = { kind = "dvr", id = "DVR_PB" }
"#,
        );
        assert!(matches!(
            check(&toml),
            Err(LinkageError::RoleMismatch { .. })
        ));
    }

    #[test]
    fn record_dvr_cannot_feed_demux() {
        let toml = with_edges(
            r#"
[[connections]]
from = { kind = "dvr", id = "DVR_REC" }
to = { kind = "demux", id = "DMX0" }
"#,
        );
        let err = check(&toml).unwrap_err();
        assert!(err.to_string().contains("playback dvr"));
    }

    #[test]
    fn two_frontends_into_one_demux_is_ambiguous() {
        let toml = with_edges(
            r#"
[[connections]]
from = { kind = "frontend", id = "FE0" }
to = { kind = "demux", id = "DMX0" }

[[connections]]
from = { kind = "frontend", id = "FE1" }
to = { kind = "demux", id = "DMX0" }
contexts = ["record"]
"#,
        );
        assert!(matches!(
            check(&toml),
            Err(LinkageError::AmbiguousSource {
                context: DataflowContext::Record,
                ..
            })
        ));
    }

    #[test]
    fn different_sources_in_disjoint_contexts_are_allowed() {
        let toml = with_edges(
            r#"
[[connections]]
from = { kind = "frontend", id = "FE0" }
to = { kind = "demux", id = "DMX0" }
contexts = ["record_with_lnb"]

[[connections]]
from = { kind = "frontend", id = "FE1" }
to = { kind = "demux", id = "DMX0" }
contexts = ["record"]
"#,
        );
        check(&toml).unwrap();
    }

    #[test]
    fn duplicate_link_with_overlapping_contexts_is_rejected() {
        let toml = with_edges(
            r#"
[[connections]]
from = { kind = "demux", id = "DMX0" }
to = { kind = "filter", id = "AUDIO0" }

[[connections]]
from = { kind = "demux", id = "DMX0" }
to = { kind = "filter", id = "AUDIO0" }
contexts = ["descrambling"]
"#,
        );
        assert!(matches!(
            check(&toml),
            Err(LinkageError::DuplicateLink {
                index: 1,
                context: DataflowContext::Descrambling,
                ..
            })
        ));
    }

    #[test]
    fn selected_descrambling_without_descrambler_is_rejected() {
        let toml = with_edges(
            r#"
[[connections]]
from = { kind = "frontend", id = "FE0" }
to = { kind = "demux", id = "DMX0" }
contexts = ["descrambling_with_lnb"]
"#,
        );
        assert_eq!(
            check(&toml).unwrap_err(),
            LinkageError::MissingRequiredKind {
                context: DataflowContext::DescramblingWithLnb,
                requirement: "descrambler".to_owned(),
            }
        );
    }

    #[test]
    fn duplicate_ids_within_kind_are_rejected() {
        let toml = r#"
[[demuxes]]
id = "D"

[[demuxes]]
id = "D"
"#;
        assert!(matches!(
            check(toml),
            Err(LinkageError::DuplicateId {
                kind: ResourceKind::Demux,
                ..
            })
        ));
    }

    #[test]
    fn same_id_across_kinds_is_allowed() {
        let toml = r#"
[[frontends]]
id = "X"

[[demuxes]]
id = "X"

[[connections]]
from = { kind = "frontend", id = "X" }
to = { kind = "demux", id = "X" }
"#;
        check(toml).unwrap();
    }

    #[test]
    fn unregistered_endpoint_is_out_of_scope() {
        let config = TunerTestConfig::parse(&with_edges(
            r#"
[[connections]]
from = { kind = "frontend", id = "FE0" }
to = { kind = "demux", id = "DMX0" }
"#,
        ))
        .unwrap();
        // 레지스트리를 비운 상태: 어떤 스위트도 리소스를 사용하지 않음
        let registry = ResourceRegistry::new();
        let err = ConnectionValidator::new(&config, &registry)
            .check()
            .unwrap_err();
        assert!(matches!(err, LinkageError::OutOfScope { .. }));
        assert!(!validate_connections(&config, &registry));
    }

    #[test]
    fn adjacency_table_spot_checks() {
        assert!(is_legal_adjacency(ResourceKind::Lnb, ResourceKind::Frontend));
        assert!(is_legal_adjacency(ResourceKind::Frontend, ResourceKind::Demux));
        assert!(!is_legal_adjacency(ResourceKind::Dvr, ResourceKind::Lnb));
        assert!(!is_legal_adjacency(ResourceKind::Demux, ResourceKind::Frontend));
    }
}
