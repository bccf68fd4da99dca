// ABOUTME: Host environment snapshot used to order terminal backends
// Captured fresh on every selection; everything downstream is a pure function of the snapshot

use super::backend::BackendKind;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    pub kitty_window_id: Option<String>,
    pub iterm_session_id: Option<String>,
    pub term_program: Option<String>,
    pub kitten_on_path: bool,
    pub osascript_on_path: bool,
}

impl EnvSnapshot {
    pub fn capture() -> Self {
        Self {
            kitty_window_id: std::env::var("KITTY_WINDOW_ID").ok(),
            iterm_session_id: std::env::var("ITERM_SESSION_ID").ok(),
            term_program: std::env::var("TERM_PROGRAM").ok(),
            kitten_on_path: which::which(BackendKind::Kitty.companion_program()).is_ok(),
            osascript_on_path: which::which(BackendKind::Iterm.companion_program()).is_ok(),
        }
    }

    pub fn has_companion(&self, kind: BackendKind) -> bool {
        match kind {
            BackendKind::Kitty => self.kitten_on_path,
            BackendKind::Iterm => self.osascript_on_path,
        }
    }
}

/// The emulator this process appears to be running inside.
pub fn detect_terminal(env: &EnvSnapshot) -> Option<BackendKind> {
    if env.kitty_window_id.is_some() {
        return Some(BackendKind::Kitty);
    }

    if env.iterm_session_id.is_some() {
        return Some(BackendKind::Iterm);
    }

    match env.term_program.as_deref() {
        Some(program) if program.eq_ignore_ascii_case("iterm.app") => Some(BackendKind::Iterm),
        _ => None,
    }
}

/// Detected terminal first, then `configured`, minus kinds whose CLI is missing.
pub fn preference_order(env: &EnvSnapshot, configured: &[BackendKind]) -> Vec<BackendKind> {
    let mut order = Vec::with_capacity(configured.len() + 1);
    for kind in detect_terminal(env).into_iter().chain(configured.iter().copied()) {
        if !order.contains(&kind) && env.has_companion(kind) {
            order.push(kind);
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> EnvSnapshot {
        EnvSnapshot {
            kitten_on_path: true,
            osascript_on_path: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_detects_kitty_first() {
        let env = EnvSnapshot {
            kitty_window_id: Some("1".to_string()),
            iterm_session_id: Some("w0t0p0".to_string()),
            ..snapshot()
        };
        assert_eq!(detect_terminal(&env), Some(BackendKind::Kitty));
    }

    #[test]
    fn test_detects_iterm_from_term_program() {
        let env = EnvSnapshot {
            term_program: Some("iTerm.app".to_string()),
            ..snapshot()
        };
        assert_eq!(detect_terminal(&env), Some(BackendKind::Iterm));

        let env = EnvSnapshot {
            term_program: Some("Apple_Terminal".to_string()),
            ..snapshot()
        };
        assert_eq!(detect_terminal(&env), None);
    }

    #[test]
    fn test_preference_order_puts_detected_first() {
        let env = EnvSnapshot {
            iterm_session_id: Some("w0t0p0".to_string()),
            ..snapshot()
        };
        assert_eq!(
            preference_order(&env, &[BackendKind::Kitty, BackendKind::Iterm]),
            vec![BackendKind::Iterm, BackendKind::Kitty]
        );
    }

    #[test]
    fn test_preference_order_drops_missing_companions() {
        let env = EnvSnapshot {
            kitty_window_id: Some("3".to_string()),
            kitten_on_path: false,
            ..snapshot()
        };
        assert_eq!(
            preference_order(&env, &[BackendKind::Kitty, BackendKind::Iterm]),
            vec![BackendKind::Iterm]
        );
    }
}
