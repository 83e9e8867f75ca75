//! Audit aspect shipped as an external plugin archive.
//!
//! Built as a `cdylib` and dropped into the host's plugin directory; the
//! loader finds the declaration exported by `declare_aspects!` and hands the
//! container over during bootstrap.

use std::sync::Mutex;

use socle_container::{BoxError, Container};
use socle_runtime::{SystemAspect, declare_aspects};

declare_aspects!(AuditAspect::default());

/// Append-only log of audit entries, registered as a container singleton so
/// other services can record into it.
#[derive(Default)]
pub struct AuditLog {
    entries: Mutex<Vec<String>>,
}

impl AuditLog {
    pub fn record(&self, entry: impl Into<String>) {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[derive(Default)]
struct AuditAspect;

impl SystemAspect for AuditAspect {
    fn configure(&mut self, container: &mut Container) -> Result<(), BoxError> {
        tracing::info!("registering audit log");
        container.register_instance(AuditLog::default(), false)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuring_twice_is_rejected() {
        let mut container = Container::new();
        let mut aspect = AuditAspect;
        aspect.configure(&mut container).expect("first activation succeeds");
        aspect
            .configure(&mut container)
            .expect_err("audit log must not be silently replaced");
    }

    #[test]
    fn audit_log_records_in_order() {
        let log = AuditLog::default();
        log.record("boot");
        log.record("ready");
        assert_eq!(log.entries(), vec!["boot".to_string(), "ready".to_string()]);
    }
}
