use subtle::ConstantTimeEq;

/// Constant-time string comparison for admin keys.
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Check a presented admin key against the configured one.
///
/// With no key configured the admin panel is closed to everyone.
pub fn admin_key_matches(configured: Option<&str>, presented: Option<&str>) -> bool {
    match (configured, presented) {
        (Some(expected), Some(given)) if !expected.is_empty() => {
            constant_time_compare(expected, given)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("secret123", "secret123"));
        assert!(!constant_time_compare("secret123", "secret124"));
        assert!(!constant_time_compare("secret123", "secret12"));
        assert!(!constant_time_compare("", "secret"));
    }

    #[test]
    fn test_admin_key_matches() {
        assert!(admin_key_matches(Some("k3y"), Some("k3y")));
        assert!(!admin_key_matches(Some("k3y"), Some("nope")));
        assert!(!admin_key_matches(Some("k3y"), None));
        assert!(!admin_key_matches(None, Some("k3y")));
        assert!(!admin_key_matches(Some(""), Some("")));
    }
}
