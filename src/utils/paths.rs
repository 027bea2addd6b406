use crate::constants::{env as env_keys, session};
use std::env;
use std::path::PathBuf;

/// Treats blank, `undefined` and `null` as unset, the way shell-exported
/// deployment settings tend to leak them.
pub fn normalize_env_value(value: Option<String>) -> Option<String> {
    let raw = value?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lowered = trimmed.to_lowercase();
    if lowered == "undefined" || lowered == "null" {
        return None;
    }
    Some(trimmed.to_string())
}

fn resolve_xdg_state_dir() -> Option<PathBuf> {
    if let Some(path) = normalize_env_value(env::var("XDG_STATE_HOME").ok()) {
        return Some(PathBuf::from(path));
    }
    env::var("HOME")
        .ok()
        .map(|home| PathBuf::from(home).join(".local").join("state"))
}

fn expand_home(raw: &str) -> PathBuf {
    let home = env::var("HOME").ok();
    match (raw, home) {
        ("~", Some(home)) => PathBuf::from(home),
        (_, Some(home)) if raw.starts_with("~/") => PathBuf::from(home).join(&raw[2..]),
        _ => PathBuf::from(raw),
    }
}

pub fn resolve_session_path() -> PathBuf {
    if let Some(path) = normalize_env_value(env::var(env_keys::SESSION_PATH).ok()) {
        return expand_home(&path);
    }
    if let Some(dir) = resolve_xdg_state_dir() {
        return dir.join(session::STATE_DIR).join(session::FILE_NAME);
    }
    env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(format!(".{}", session::STATE_DIR))
        .join(session::FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::normalize_env_value;

    #[test]
    fn placeholder_values_count_as_unset() {
        assert_eq!(normalize_env_value(None), None);
        assert_eq!(normalize_env_value(Some("  ".into())), None);
        assert_eq!(normalize_env_value(Some("undefined".into())), None);
        assert_eq!(normalize_env_value(Some("NULL".into())), None);
        assert_eq!(
            normalize_env_value(Some(" https://gw.local ".into())),
            Some("https://gw.local".to_string())
        );
    }
}
