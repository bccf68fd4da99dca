// ABOUTME: Picks the first reachable terminal backend in preference order
// Probes run one at a time so the answer never depends on which probe finishes first

use super::backend::{BackendKind, TerminalBackend};
use super::error::TerminalError;
use super::iterm::ItermBackend;
use super::kitty::KittyBackend;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone, Default)]
pub struct BackendSelector {
    backends: Vec<Arc<dyn TerminalBackend>>,
}

impl BackendSelector {
    pub fn new(backends: Vec<Arc<dyn TerminalBackend>>) -> Self {
        Self { backends }
    }

    /// Kitty and iTerm2, with kitty tabs running `shell`.
    pub fn with_builtin_backends(shell: &str) -> Self {
        Self::new(vec![
            Arc::new(KittyBackend::new(shell)),
            Arc::new(ItermBackend::new()),
        ])
    }

    pub fn backend(&self, kind: BackendKind) -> Option<Arc<dyn TerminalBackend>> {
        self.backends.iter().find(|b| b.kind() == kind).cloned()
    }

    /// First backend in `preference_order` whose probe succeeds; `None` when none does.
    pub async fn select_available(
        &self,
        preference_order: &[BackendKind],
    ) -> Result<Option<Arc<dyn TerminalBackend>>, TerminalError> {
        for kind in preference_order {
            let Some(backend) = self.backend(*kind) else {
                debug!("No {} backend registered", kind);
                continue;
            };

            if backend.probe().await? {
                info!("Selected {} backend", kind);
                return Ok(Some(backend));
            }
            debug!("{} backend unavailable", kind);
        }

        Ok(None)
    }
}

impl std::fmt::Debug for BackendSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kinds: Vec<BackendKind> = self.backends.iter().map(|b| b.kind()).collect();
        f.debug_struct("BackendSelector").field("backends", &kinds).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::backend::MockTerminalBackend;

    fn mock(kind: BackendKind, available: bool) -> MockTerminalBackend {
        let mut backend = MockTerminalBackend::new();
        backend.expect_kind().return_const(kind);
        backend.expect_probe().returning(move || Ok(available));
        backend
    }

    #[tokio::test]
    async fn test_skips_unregistered_kinds() {
        let selector = BackendSelector::new(vec![Arc::new(mock(BackendKind::Iterm, true))]);

        let selected = selector
            .select_available(&[BackendKind::Kitty, BackendKind::Iterm])
            .await
            .unwrap();
        assert_eq!(selected.map(|b| b.kind()), Some(BackendKind::Iterm));
    }

    #[tokio::test]
    async fn test_does_not_probe_past_first_available() {
        let mut second = MockTerminalBackend::new();
        second.expect_kind().return_const(BackendKind::Iterm);
        second.expect_probe().never();

        let selector = BackendSelector::new(vec![
            Arc::new(mock(BackendKind::Kitty, true)),
            Arc::new(second),
        ]);

        let selected = selector
            .select_available(&[BackendKind::Kitty, BackendKind::Iterm])
            .await
            .unwrap();
        assert_eq!(selected.map(|b| b.kind()), Some(BackendKind::Kitty));
    }

    #[tokio::test]
    async fn test_probe_errors_propagate() {
        let mut broken = MockTerminalBackend::new();
        broken.expect_kind().return_const(BackendKind::Kitty);
        broken.expect_probe().returning(|| {
            Err(TerminalError::Process {
                program: "kitten".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            })
        });

        let selector = BackendSelector::new(vec![Arc::new(broken)]);
        let result = selector.select_available(&[BackendKind::Kitty]).await;
        assert!(matches!(result, Err(TerminalError::Process { .. })));
    }

    #[test]
    fn test_builtin_backends() {
        let selector = BackendSelector::with_builtin_backends("bash");
        assert!(selector.backend(BackendKind::Kitty).is_some());
        assert!(selector.backend(BackendKind::Iterm).is_some());
    }
}
