//! 리소스 레지스트리: (종류, 테스트 스위트) → 리소스 ID 집합
//!
//! [`ResourceRegistry`]는 명시적으로 소유되는 객체입니다.
//! 스위트 setup 시작 시 [`ResourceRegistry::reset`], teardown 시
//! [`ResourceRegistry::clear`]를 호출하며, 검증기와 데이터플로우 엔진에
//! 참조로 전달됩니다.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::config::{DvrType, TunerTestConfig};
use crate::filter_type::FilterPurpose;
use crate::types::{ResourceId, ResourceKind, TestSuite};

/// 리소스 레지스트리
///
/// 등록은 추가만 하며 멱등입니다. 같은 ID를 같은 스위트에 두 번 등록해도 에러가 아닙니다.
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    entries: BTreeMap<(ResourceKind, TestSuite), BTreeSet<ResourceId>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 리소스 ID를 (종류, 스위트) 집합에 추가합니다.
    pub fn register(&mut self, kind: ResourceKind, id: impl Into<ResourceId>, suite: TestSuite) {
        self.entries.entry((kind, suite)).or_default().insert(id.into());
    }

    /// 모든 종류의 매핑을 비웁니다 (teardown).
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// setup 시작 시 호출: 이전 스위트의 ID가 남지 않도록 비웁니다.
    pub fn reset(&mut self) {
        self.clear();
    }

    /// (종류, 스위트)에 등록된 ID 집합
    pub fn ids(&self, kind: ResourceKind, suite: TestSuite) -> Option<&BTreeSet<ResourceId>> {
        self.entries.get(&(kind, suite))
    }

    /// 어떤 스위트에라도 등록되어 있는지
    pub fn contains(&self, kind: ResourceKind, id: &str) -> bool {
        self.entries
            .iter()
            .any(|((k, _), ids)| *k == kind && ids.contains(id))
    }

    /// 특정 스위트 범위에 있는지
    pub fn is_in_scope(&self, kind: ResourceKind, id: &str, suite: TestSuite) -> bool {
        self.ids(kind, suite).is_some_and(|ids| ids.contains(id))
    }

    /// 리소스를 사용하는 스위트 목록
    pub fn suites_for(&self, kind: ResourceKind, id: &str) -> Vec<TestSuite> {
        self.entries
            .iter()
            .filter(|((k, _), ids)| *k == kind && ids.contains(id))
            .map(|((_, suite), _)| *suite)
            .collect()
    }

    /// 전체 (종류, 스위트, ID) 등록 수
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.values().all(BTreeSet::is_empty)
    }
}

/// 선언된 모든 하드웨어를 이를 사용하는 테스트 스위트에 연결합니다.
pub fn connect_hardware_to_test_cases(config: &TunerTestConfig, registry: &mut ResourceRegistry) {
    use TestSuite as S;

    for fe in &config.frontends {
        for suite in [S::Frontend, S::Demux, S::Filter, S::Record, S::Broadcast, S::Descrambler] {
            registry.register(ResourceKind::Frontend, fe.id.clone(), suite);
        }
    }

    for lnb in &config.lnbs {
        for suite in [S::Lnb, S::Record, S::Broadcast, S::Descrambler] {
            registry.register(ResourceKind::Lnb, lnb.id.clone(), suite);
        }
    }

    for demux in &config.demuxes {
        for suite in [S::Demux, S::Filter, S::Playback, S::Record, S::Broadcast, S::Descrambler] {
            registry.register(ResourceKind::Demux, demux.id.clone(), suite);
        }
    }

    for filter in &config.filters {
        registry.register(ResourceKind::Filter, filter.id.clone(), S::Filter);
        let suites: &[TestSuite] = match filter.filter_type.purpose() {
            Some(FilterPurpose::Audio | FilterPurpose::Video) => {
                &[S::Broadcast, S::Playback, S::Descrambler]
            }
            Some(FilterPurpose::Section) => &[S::Broadcast, S::Playback],
            Some(FilterPurpose::Pcr) => &[S::Demux, S::Broadcast],
            Some(FilterPurpose::Ip) => &[S::Broadcast],
            Some(FilterPurpose::Record) => &[S::Record],
            Some(FilterPurpose::Playback) => &[S::Playback],
            None => &[],
        };
        for suite in suites {
            registry.register(ResourceKind::Filter, filter.id.clone(), *suite);
        }
    }

    for dvr in &config.dvrs {
        let suites: &[TestSuite] = match dvr.dvr_type {
            DvrType::Record => &[S::Record],
            // 재생 DVR은 녹화/디스크램블링 테스트의 입력 소스로도 쓰입니다.
            DvrType::Playback => &[S::Playback, S::Record, S::Descrambler],
        };
        for suite in suites {
            registry.register(ResourceKind::Dvr, dvr.id.clone(), *suite);
        }
    }

    for desc in &config.descramblers {
        registry.register(ResourceKind::Descrambler, desc.id.clone(), S::Descrambler);
    }

    for tf in &config.time_filters {
        registry.register(ResourceKind::TimeFilter, tf.id.clone(), S::Filter);
    }

    for msg in &config.diseqc_messages {
        registry.register(ResourceKind::DiseqcMessage, msg.id.clone(), S::Lnb);
    }

    // 녹화 DVR이나 디스크램블러로 연결된 필터는 용도와 무관하게 해당 스위트가 사용합니다.
    for edge in &config.connections {
        if edge.from.kind != ResourceKind::Filter || !config.contains(&edge.from) {
            continue;
        }
        let suite = match edge.to.kind {
            ResourceKind::Dvr => S::Record,
            ResourceKind::Descrambler => S::Descrambler,
            _ => continue,
        };
        registry.register(ResourceKind::Filter, edge.from.id.clone(), suite);
    }

    debug!(entries = registry.len(), "connected hardware to test suites");
}
