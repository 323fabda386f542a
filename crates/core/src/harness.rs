//! 스위트 하네스: 설정 초기화, 세션 소유, teardown
//!
//! 각 테스트 스위트의 setup은 다음 순서를 따릅니다:
//!
//! 1. 튜너 서비스 해석 (필수)
//! 2. CAS 서비스 해석 (디스크램블러 스위트만)
//! 3. [`initialize_configuration`]: 레지스트리 리셋 → 설정 로드 → 하드웨어 연결
//!    → 연결 검증 → 데이터플로우 결정
//!
//! 설정 파일이 없으면 스위트는 실패가 아니라 적용 불가(건너뜀)입니다.
//! 연결 검증 실패는 치명적입니다.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::TunerTestConfig;
use crate::dataflow::{DataflowPlan, determine_dataflows};
use crate::error::{ConfigError, TunerLinkError};
use crate::registry::{ResourceRegistry, connect_hardware_to_test_cases};
use crate::service::{Backend, ServiceManager, resolve_cas, resolve_tuner};
use crate::types::{DataflowContext, ResourceId, ResourceKind, TestSuite};
use crate::validator;

/// 한 리소스 종류를 담당하는 테스트 헬퍼
///
/// [`DataflowPlan::distribute`]가 컨텍스트별로 담당 종류의 ID를 전달합니다.
pub trait HardwareHelper {
    /// 헬퍼 이름 (로그용)
    fn name(&self) -> &str;

    /// 담당 리소스 종류
    fn kind(&self) -> ResourceKind;

    /// 컨텍스트의 체인에 포함된 담당 종류 ID (체인 순서)
    fn assign(&mut self, context: DataflowContext, ids: &[ResourceId]);
}

/// 설정 초기화 결과
#[derive(Debug)]
pub enum InitOutcome<T = Initialized> {
    /// 초기화 완료
    Ready(T),
    /// 설정 파일 없음: 스위트를 건너뜁니다.
    NotApplicable { path: PathBuf },
}

impl<T> InitOutcome<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::NotApplicable { .. } => None,
        }
    }
}

/// 검증된 설정과 결정된 데이터플로우
#[derive(Debug, Clone)]
pub struct Initialized {
    pub config: TunerTestConfig,
    pub plan: DataflowPlan,
}

/// 설정을 초기화합니다.
///
/// 레지스트리는 시작 시 리셋되므로 이전 스위트의 ID가 남지 않습니다.
pub async fn initialize_configuration(
    path: impl AsRef<Path>,
    registry: &mut ResourceRegistry,
) -> Result<InitOutcome, TunerLinkError> {
    let path = path.as_ref();
    registry.reset();

    let config = match TunerTestConfig::load(path).await {
        Ok(config) => config,
        Err(TunerLinkError::Config(ConfigError::FileNotFound { .. })) => {
            info!(path = %path.display(), "tuner config not found, suite is not applicable");
            return Ok(InitOutcome::NotApplicable {
                path: path.to_path_buf(),
            });
        }
        Err(e) => return Err(e),
    };

    connect_hardware_to_test_cases(&config, registry);
    let plan = {
        let validated = validator::validate(&config, registry)?;
        determine_dataflows(&validated)
    };

    info!(
        path = %path.display(),
        supported = plan.supported_contexts().len(),
        "tuner configuration initialized"
    );
    Ok(InitOutcome::Ready(Initialized { config, plan }))
}

/// 한 테스트 스위트가 setup부터 teardown까지 소유하는 상태
#[derive(Debug)]
pub struct SuiteSession<P, L> {
    suite: TestSuite,
    tuner: P,
    backend: Backend<P, L>,
    config: TunerTestConfig,
    registry: ResourceRegistry,
    plan: DataflowPlan,
}

impl<P, L> SuiteSession<P, L> {
    /// 스위트 setup을 수행합니다.
    ///
    /// 서비스가 없으면 [`ServiceError`](crate::error::ServiceError)로 실패합니다.
    /// CAS가 필요 없는 스위트의 백엔드는 [`Backend::Unavailable`]입니다.
    pub async fn setup<M>(
        suite: TestSuite,
        manager: &M,
        instance: &str,
        config_path: impl AsRef<Path>,
    ) -> Result<InitOutcome<Self>, TunerLinkError>
    where
        M: ServiceManager<Primary = P, Legacy = L>,
    {
        let tuner = resolve_tuner(manager, instance)?;
        let backend = if suite.requires_cas() {
            resolve_cas(manager)?
        } else {
            Backend::Unavailable
        };

        let mut registry = ResourceRegistry::new();
        let outcome = initialize_configuration(config_path, &mut registry).await?;
        Ok(match outcome {
            InitOutcome::Ready(Initialized { config, plan }) => {
                info!(%suite, instance, "suite setup complete");
                InitOutcome::Ready(Self {
                    suite,
                    tuner,
                    backend,
                    config,
                    registry,
                    plan,
                })
            }
            InitOutcome::NotApplicable { path } => InitOutcome::NotApplicable { path },
        })
    }

    pub fn suite(&self) -> TestSuite {
        self.suite
    }

    pub fn tuner(&self) -> &P {
        &self.tuner
    }

    /// CAS 백엔드
    pub fn backend(&self) -> &Backend<P, L> {
        &self.backend
    }

    pub fn config(&self) -> &TunerTestConfig {
        &self.config
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    pub fn plan(&self) -> &DataflowPlan {
        &self.plan
    }

    /// 스위트가 사용하는 종류의 ID (정렬됨)
    pub fn ids(&self, kind: ResourceKind) -> Vec<&ResourceId> {
        self.registry
            .ids(kind, self.suite)
            .map(|ids| ids.iter().collect())
            .unwrap_or_default()
    }

    /// 헬퍼들에게 데이터플로우를 전달합니다.
    pub fn distribute(&self, helpers: &mut [&mut dyn HardwareHelper]) {
        self.plan.distribute(helpers);
    }

    /// teardown: 레지스트리의 모든 ID를 비웁니다.
    pub fn teardown(&mut self) {
        self.registry.clear();
        info!(suite = %self.suite, "suite torn down");
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::error::{LinkageError, ServiceError};
    use crate::service::MEDIA_CAS_SERVICE_NAME;

    const TUNER: &str = "android.hardware.tv.tuner.ITuner/default";

    const SCENARIO: &str = r#"
[[frontends]]
id = "FE0"

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

[[connections]]
from = { kind = "frontend", id = "FE0" }
to = { kind = "demux", id = "DMX0" }

[[connections]]
from = { kind = "demux", id = "DMX0" }
to = { kind = "filter", id = "AUDIO0" }

[[connections]]
from = { kind = "filter", id = "AUDIO0" }
to = { kind = "dvr", id = "DVR_REC" }
"#;

    struct Manager {
        cas: bool,
    }

    impl ServiceManager for Manager {
        type Primary = &'static str;
        type Legacy = ();

        fn is_declared(&self, name: &str) -> bool {
            name == TUNER || (self.cas && name == MEDIA_CAS_SERVICE_NAME)
        }

        fn wait_for_service(&self, name: &str) -> Option<&'static str> {
            self.is_declared(name).then_some("binder")
        }

        fn legacy_service(&self, _name: &str) -> Option<()> {
            None
        }
    }

    #[derive(Default)]
    struct Recorder {
        kind: Option<ResourceKind>,
        assigned: Vec<(DataflowContext, Vec<ResourceId>)>,
    }

    impl HardwareHelper for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn kind(&self) -> ResourceKind {
            self.kind.unwrap_or(ResourceKind::Dvr)
        }

        fn assign(&mut self, context: DataflowContext, ids: &[ResourceId]) {
            self.assigned.push((context, ids.to_vec()));
        }
    }

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn missing_config_is_not_applicable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let mut registry = ResourceRegistry::new();
        registry.register(ResourceKind::Frontend, "STALE", TestSuite::Frontend);

        let outcome = initialize_configuration(&path, &mut registry).await.unwrap();
        assert!(!outcome.is_ready());
        assert!(matches!(outcome, InitOutcome::NotApplicable { path: p } if p == path));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn scenario_initializes_record_only() {
        let file = write_config(SCENARIO);
        let mut registry = ResourceRegistry::new();
        let outcome = initialize_configuration(file.path(), &mut registry)
            .await
            .unwrap();
        assert!(outcome.is_ready());
        let init = outcome.ready().unwrap();

        assert_eq!(init.plan.supported_contexts(), vec![DataflowContext::Record]);
        assert!(registry.contains(ResourceKind::Filter, "AUDIO0"));
    }

    #[tokio::test]
    async fn undeclared_dvr_is_fatal() {
        let toml = SCENARIO.replace(r#"id = "DVR_REC" }"#, r#"id = "dvr9" }"#);
        let file = write_config(&toml);
        let mut registry = ResourceRegistry::new();
        let err = initialize_configuration(file.path(), &mut registry)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TunerLinkError::Linkage(LinkageError::DanglingReference { .. })
        ));
    }

    #[tokio::test]
    async fn session_distributes_and_tears_down() {
        let file = write_config(SCENARIO);
        let manager = Manager { cas: false };
        let mut session = SuiteSession::setup(TestSuite::Record, &manager, TUNER, file.path())
            .await
            .unwrap()
            .ready()
            .unwrap();

        assert_eq!(session.tuner(), &"binder");
        assert!(!session.backend().is_available());
        assert_eq!(session.ids(ResourceKind::Dvr), vec![&ResourceId::from("DVR_REC")]);

        let mut dvrs = Recorder::default();
        let mut filters = Recorder {
            kind: Some(ResourceKind::Filter),
            ..Default::default()
        };
        let mut helpers: [&mut dyn HardwareHelper; 2] = [&mut dvrs, &mut filters];
        session.distribute(&mut helpers);
        assert_eq!(
            dvrs.assigned,
            vec![(DataflowContext::Record, vec![ResourceId::from("DVR_REC")])]
        );
        assert_eq!(filters.assigned.len(), 1);

        session.teardown();
        assert!(session.registry().is_empty());
    }

    #[tokio::test]
    async fn descrambler_suite_requires_cas() {
        let file = write_config(SCENARIO);
        let manager = Manager { cas: false };
        let err = SuiteSession::setup(TestSuite::Descrambler, &manager, TUNER, file.path())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TunerLinkError::Service(ServiceError::CasUnavailable { .. })
        ));

        let manager = Manager { cas: true };
        let session = SuiteSession::setup(TestSuite::Descrambler, &manager, TUNER, file.path())
            .await
            .unwrap()
            .ready()
            .unwrap();
        assert!(session.backend().primary().is_some());
    }

    #[tokio::test]
    async fn missing_tuner_fails_before_config() {
        let dir = tempfile::tempdir().unwrap();
        let manager = Manager { cas: false };
        let path = dir.path().join("x.toml");
        let err = SuiteSession::setup(TestSuite::Frontend, &manager, "other", &path)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TunerLinkError::Service(ServiceError::TunerUnavailable { .. })
        ));
    }
}
