//! 서비스 백엔드 해석: 튜너 서비스 및 CAS 동반 서비스
//!
//! 서비스 탐색 메커니즘은 호출자가 [`ServiceManager`]로 제공합니다.
//! CAS 서비스는 primary 인터페이스를 먼저 찾고, 없으면 legacy 인터페이스를 찾습니다.
//! 결과는 setup 시 한 번 [`Backend`]로 해석되며 이후 분기는 이 값 하나로 합니다.

use std::fmt;

use tracing::{debug, info, warn};

use crate::error::ServiceError;

/// primary CAS 서비스 이름
pub const MEDIA_CAS_SERVICE_NAME: &str = "android.hardware.cas.IMediaCasService/default";

/// 서비스 탐색 trait
///
/// 실제 서비스 매니저 또는 테스트용 가짜 구현을 주입합니다.
pub trait ServiceManager {
    /// primary 인터페이스 핸들
    type Primary;

    /// legacy 인터페이스 핸들
    type Legacy;

    /// 서비스가 선언되어 있는지 확인
    fn is_declared(&self, name: &str) -> bool;

    /// 선언된 서비스가 준비될 때까지 대기 후 핸들 반환
    fn wait_for_service(&self, name: &str) -> Option<Self::Primary>;

    /// legacy 인터페이스 핸들 조회
    fn legacy_service(&self, name: &str) -> Option<Self::Legacy>;
}

/// 해석된 서비스 백엔드
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend<P, L> {
    Primary(P),
    Legacy(L),
    Unavailable,
}

impl<P, L> Backend<P, L> {
    pub fn is_available(&self) -> bool {
        !matches!(self, Self::Unavailable)
    }

    pub fn primary(&self) -> Option<&P> {
        match self {
            Self::Primary(p) => Some(p),
            _ => None,
        }
    }

    pub fn legacy(&self) -> Option<&L> {
        match self {
            Self::Legacy(l) => Some(l),
            _ => None,
        }
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Primary(_) => BackendKind::Primary,
            Self::Legacy(_) => BackendKind::Legacy,
            Self::Unavailable => BackendKind::Unavailable,
        }
    }
}

/// 핸들 없이 백엔드 종류만 표현
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Primary,
    Legacy,
    Unavailable,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::Legacy => write!(f, "legacy"),
            Self::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// 서비스 백엔드를 한 번 해석합니다: 선언된 primary → legacy → unavailable
pub fn resolve_backend<M: ServiceManager>(
    manager: &M,
    name: &str,
) -> Backend<M::Primary, M::Legacy> {
    if manager.is_declared(name) {
        if let Some(handle) = manager.wait_for_service(name) {
            debug!(service = name, "resolved primary backend");
            return Backend::Primary(handle);
        }
        warn!(service = name, "service declared but did not come up");
    }

    match manager.legacy_service(name) {
        Some(handle) => {
            debug!(service = name, "resolved legacy backend");
            Backend::Legacy(handle)
        }
        None => Backend::Unavailable,
    }
}

/// 튜너 서비스 인스턴스를 해석합니다. primary 인터페이스만 허용합니다.
pub fn resolve_tuner<M: ServiceManager>(
    manager: &M,
    instance: &str,
) -> Result<M::Primary, ServiceError> {
    if !manager.is_declared(instance) {
        return Err(ServiceError::TunerUnavailable {
            instance: instance.to_owned(),
        });
    }
    manager
        .wait_for_service(instance)
        .ok_or_else(|| ServiceError::TunerUnavailable {
            instance: instance.to_owned(),
        })
}

/// CAS 서비스를 해석합니다. primary와 legacy가 모두 없으면 에러입니다.
pub fn resolve_cas<M: ServiceManager>(
    manager: &M,
) -> Result<Backend<M::Primary, M::Legacy>, ServiceError> {
    let backend = resolve_backend(manager, MEDIA_CAS_SERVICE_NAME);
    if !backend.is_available() {
        return Err(ServiceError::CasUnavailable {
            primary: MEDIA_CAS_SERVICE_NAME.to_owned(),
        });
    }
    info!(backend = %backend.kind(), "media cas service resolved");
    Ok(backend)
}
