//! 데이터플로우 결정 엔진: 컨텍스트별 리소스 체인 도출
//!
//! 검증된 연결([`ValidatedConnections`])만 입력으로 받습니다.
//! 각 [`DataflowContext`]마다 그 컨텍스트에 적용되는 연결을 따라가며
//! 테스트가 함께 구성하고 시작해야 하는 최소 체인을 의존 순서대로 만듭니다.
//!
//! ```text
//! [Lnb] -> Frontend | playback Dvr -> Demux -> Filter(s) -> record Dvr | Descrambler
//! ```
//!
//! 완성할 수 없는 컨텍스트는 빈 체인이 됩니다 (선택 하드웨어 부재는 에러가 아님).
//! 같은 단계의 후보가 여럿이면 [`SelectionPolicy`] 순서대로 시도하고,
//! 체인을 끝까지 완성하는 첫 후보를 선택합니다.

use serde::Serialize;
use tracing::{debug, info};

use crate::config::{LinkageEdge, SelectionPolicy, TunerTestConfig};
use crate::harness::HardwareHelper;
use crate::metrics as m;
use crate::registry::ResourceRegistry;
use crate::types::{DataflowContext, ResourceId, ResourceKind, ResourceRef};
use crate::validator::ValidatedConnections;

/// 한 컨텍스트의 리소스 체인 (의존 순서)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataflowChain {
    context: DataflowContext,
    links: Vec<ResourceRef>,
}

impl DataflowChain {
    /// 빈 체인: 이 컨텍스트를 지원하는 하드웨어 없음
    pub fn empty(context: DataflowContext) -> Self {
        Self {
            context,
            links: Vec::new(),
        }
    }

    pub fn context(&self) -> DataflowContext {
        self.context
    }

    pub fn links(&self) -> &[ResourceRef] {
        &self.links
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// 특정 종류의 ID (체인 순서)
    pub fn ids_of(&self, kind: ResourceKind) -> Vec<&ResourceId> {
        self.links
            .iter()
            .filter(|r| r.kind == kind)
            .map(|r| &r.id)
            .collect()
    }

    /// 특정 종류의 첫 번째 ID
    pub fn first(&self, kind: ResourceKind) -> Option<&ResourceId> {
        self.links.iter().find(|r| r.kind == kind).map(|r| &r.id)
    }

    /// 구성/시작 순서
    pub fn setup_order(&self) -> impl Iterator<Item = &ResourceRef> {
        self.links.iter()
    }

    /// 정지/해제 순서 (구성 순서의 역순)
    pub fn teardown_order(&self) -> impl Iterator<Item = &ResourceRef> {
        self.links.iter().rev()
    }
}

/// 모든 컨텍스트의 체인
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataflowPlan {
    chains: Vec<DataflowChain>,
}

impl DataflowPlan {
    /// 컨텍스트의 체인 (지원하지 않으면 빈 체인)
    pub fn chain(&self, context: DataflowContext) -> &DataflowChain {
        // chains는 DataflowContext::ALL 순서로 항상 4개
        &self.chains[context_slot(context)]
    }

    pub fn is_supported(&self, context: DataflowContext) -> bool {
        !self.chain(context).is_empty()
    }

    pub fn supported_contexts(&self) -> Vec<DataflowContext> {
        self.chains
            .iter()
            .filter(|c| !c.is_empty())
            .map(DataflowChain::context)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DataflowChain> {
        self.chains.iter()
    }

    /// 각 헬퍼에게 담당 종류의 ID를 컨텍스트별로 전달합니다.
    ///
    /// 빈 체인은 건너뜁니다. ID는 체인 순서를 유지합니다.
    pub fn distribute(&self, helpers: &mut [&mut dyn HardwareHelper]) {
        for chain in self.chains.iter().filter(|c| !c.is_empty()) {
            for helper in helpers.iter_mut() {
                let ids: Vec<ResourceId> =
                    chain.ids_of(helper.kind()).into_iter().cloned().collect();
                if ids.is_empty() {
                    continue;
                }
                debug!(
                    helper = helper.name(),
                    context = %chain.context(),
                    count = ids.len(),
                    "assigning dataflow resources"
                );
                helper.assign(chain.context(), &ids);
            }
        }
    }
}

fn context_slot(context: DataflowContext) -> usize {
    match context {
        DataflowContext::Record => 0,
        DataflowContext::RecordWithLnb => 1,
        DataflowContext::Descrambling => 2,
        DataflowContext::DescramblingWithLnb => 3,
    }
}

/// 검증된 연결에서 모든 컨텍스트의 데이터플로우를 결정합니다.
///
/// 같은 입력에 대해 항상 같은 결과를 반환합니다.
pub fn determine_dataflows(validated: &ValidatedConnections<'_>) -> DataflowPlan {
    let config = validated.config();
    let registry = validated.registry();

    let chains: Vec<DataflowChain> = DataflowContext::ALL
        .into_iter()
        .map(|context| {
            let chain = ChainBuilder::new(config, registry, context).build();
            if chain.is_empty() {
                debug!(%context, "no qualifying hardware, context will be skipped");
            } else {
                info!(%context, links = chain.len(), "dataflow determined");
                metrics::counter!(m::DATAFLOW_CHAINS_TOTAL, m::LABEL_CONTEXT => context.as_str())
                    .increment(1);
            }
            chain
        })
        .collect();

    DataflowPlan { chains }
}

/// 한 컨텍스트의 체인을 탐색합니다.
struct ChainBuilder<'a> {
    config: &'a TunerTestConfig,
    registry: &'a ResourceRegistry,
    context: DataflowContext,
    policy: SelectionPolicy,
}

impl<'a> ChainBuilder<'a> {
    fn new(
        config: &'a TunerTestConfig,
        registry: &'a ResourceRegistry,
        context: DataflowContext,
    ) -> Self {
        Self {
            config,
            registry,
            context,
            policy: config.dataflow.selection,
        }
    }

    fn build(&self) -> DataflowChain {
        let links = if self.context.requires_lnb() {
            self.from_lnb()
        } else {
            // 프론트엔드로 완성되지 않으면 재생 DVR을 입력으로 사용
            self.from_source(ResourceKind::Frontend)
                .or_else(|| self.from_source(ResourceKind::Dvr))
        };

        DataflowChain {
            context: self.context,
            links: links.unwrap_or_default(),
        }
    }

    fn from_lnb(&self) -> Option<Vec<ResourceRef>> {
        let lnbs = self.sources(ResourceKind::Lnb, ResourceKind::Frontend);
        self.ordered(lnbs).into_iter().find_map(|lnb| {
            let frontends = self.targets(lnb, ResourceKind::Frontend);
            self.ordered(frontends).into_iter().find_map(|fe| {
                self.downstream(fe).map(|mut tail| {
                    tail.insert(0, lnb.clone());
                    tail
                })
            })
        })
    }

    fn from_source(&self, kind: ResourceKind) -> Option<Vec<ResourceRef>> {
        let sources = self.sources(kind, ResourceKind::Demux);
        self.ordered(sources)
            .into_iter()
            .find_map(|source| self.downstream(source))
    }

    /// source -> Demux -> Filter(s) -> 종단
    fn downstream(&self, source: &ResourceRef) -> Option<Vec<ResourceRef>> {
        let demuxes = self.targets(source, ResourceKind::Demux);
        self.ordered(demuxes).into_iter().find_map(|demux| {
            let (filters, terminal) = self.terminal(demux)?;
            let mut links = Vec::with_capacity(filters.len() + 3);
            links.push(source.clone());
            links.push(demux.clone());
            links.extend(filters.into_iter().cloned());
            links.push(terminal.clone());
            Some(links)
        })
    }

    /// 디먹스의 필터가 공급하는 종단(녹화 DVR 또는 디스크램블러)과 그 필터들
    fn terminal(&self, demux: &ResourceRef) -> Option<(Vec<&'a ResourceRef>, &'a ResourceRef)> {
        let terminal_kind = if self.context.requires_descrambler() {
            ResourceKind::Descrambler
        } else {
            ResourceKind::Dvr
        };

        let filters = self.by_declaration(self.targets(demux, ResourceKind::Filter));
        let terminals = filters
            .iter()
            .flat_map(|filter| self.targets(filter, terminal_kind))
            .collect();
        let terminal = self.ordered(terminals).into_iter().next()?;

        let feeding: Vec<&ResourceRef> = filters
            .into_iter()
            .filter(|filter| {
                self.edges()
                    .any(|e| e.from == **filter && e.to == *terminal)
            })
            .collect();
        Some((feeding, terminal))
    }

    /// 이 컨텍스트에 적용되는 연결
    fn edges(&self) -> impl Iterator<Item = &'a LinkageEdge> + '_ {
        self.config
            .connections
            .iter()
            .filter(move |e| e.applies_to(self.context))
    }

    fn in_scope(&self, endpoint: &ResourceRef) -> bool {
        self.registry
            .is_in_scope(endpoint.kind, endpoint.id.as_str(), self.context.suite())
    }

    /// `from_kind -> to_kind` 연결의 소스 (양 끝 모두 범위 안)
    fn sources(&self, from_kind: ResourceKind, to_kind: ResourceKind) -> Vec<&'a ResourceRef> {
        self.edges()
            .filter(|e| e.from.kind == from_kind && e.to.kind == to_kind)
            .filter(|e| self.in_scope(&e.from) && self.in_scope(&e.to))
            .map(|e| &e.from)
            .collect()
    }

    /// `from`이 공급하는 `kind` 리소스 (범위 안)
    fn targets(&self, from: &ResourceRef, kind: ResourceKind) -> Vec<&'a ResourceRef> {
        self.edges()
            .filter(|e| e.from == *from && e.to.kind == kind)
            .filter(|e| self.in_scope(&e.to))
            .map(|e| &e.to)
            .collect()
    }

    /// 선언 순서로 정렬하고 중복을 제거합니다.
    fn by_declaration(&self, mut refs: Vec<&'a ResourceRef>) -> Vec<&'a ResourceRef> {
        refs.sort_by_key(|r| self.config.declaration_index(r).unwrap_or(usize::MAX));
        refs.dedup();
        refs
    }

    /// 선택 정책 순서로 후보를 정렬합니다.
    fn ordered(&self, refs: Vec<&'a ResourceRef>) -> Vec<&'a ResourceRef> {
        let mut refs = self.by_declaration(refs);
        if self.policy == SelectionPolicy::LastDeclared {
            refs.reverse();
        }
        refs
    }
}
