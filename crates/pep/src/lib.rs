//! `stockgate-pep` — policy enforcement point.
//!
//! Every protected operation calls [`Gateway::check_access`] (or
//! [`Gateway::enforce`]) with the caller's principal, the target resource and
//! action, and the transport facts of the request.

pub mod config;
pub mod gateway;
pub mod request;

pub use config::{ConfigError, GatewayConfig};
pub use gateway::Gateway;
pub use request::RequestAttributes;

use stockgate_infra::{AuditLogger, AuditLoggerHandle, AuditStore};
use stockgate_pdp::InMemoryPolicyStore;

/// A configured gateway over an in-memory policy store and a background
/// audit logger, plus the handle that stops the logger.
pub fn bootstrap<S>(
    config: &GatewayConfig,
    audit_store: S,
) -> anyhow::Result<(Gateway<InMemoryPolicyStore, AuditLogger>, AuditLoggerHandle)>
where
    S: AuditStore + 'static,
{
    stockgate_observability::init_with(&config.observability);

    let store = config.build_policy_store()?;
    let (logger, handle) = AuditLogger::spawn(audit_store, config.audit.clone())?;
    tracing::info!(policies = store.len(), worker = %config.audit.name, "gateway ready");

    Ok((Gateway::with_risk_weights(store, logger, config.risk.clone()), handle))
}
