const KEEP_PREFIX: usize = 4;

/// Masks a bearer token for display, keeping a short prefix so two sessions
/// can still be told apart.
pub fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.chars().count() <= KEEP_PREFIX * 2 {
        return "[REDACTED]".to_string();
    }
    let prefix: String = trimmed.chars().take(KEEP_PREFIX).collect();
    format!("{}…[REDACTED]", prefix)
}
