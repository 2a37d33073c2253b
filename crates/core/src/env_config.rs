//! Environment variable parsing with warn-level logging for invalid values.

/// Parse an environment variable with a default fallback.
///
/// - If the variable is not set: returns `default` silently (expected case).
/// - If the variable is set but cannot be parsed: logs a warning and returns
///   `default`.
pub fn env_parse_with_default<T: std::str::FromStr + std::fmt::Display>(
    var: &str,
    default: T,
) -> T {
    match std::env::var(var) {
        Ok(v) => match v.parse() {
            Ok(n) => n,
            Err(_) => {
                tracing::warn!(
                    var,
                    value = %v,
                    default = %default,
                    "invalid env var value, using default"
                );
                default
            },
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_parse_valid_value() {
        let var_name = "BOARDLENS_TEST_ENV_VALID_55101";
        unsafe { std::env::set_var(var_name, "7") };
        let result: usize = env_parse_with_default(var_name, 3);
        assert_eq!(result, 7);
        unsafe { std::env::remove_var(var_name) };
    }

    #[test]
    fn test_env_parse_invalid_value() {
        let var_name = "BOARDLENS_TEST_ENV_INVALID_55102";
        unsafe { std::env::set_var(var_name, "banana") };
        let result: usize = env_parse_with_default(var_name, 3);
        assert_eq!(result, 3);
        unsafe { std::env::remove_var(var_name) };
    }

    #[test]
    fn test_env_parse_missing_var() {
        let var_name = "BOARDLENS_TEST_ENV_MISSING_55103";
        unsafe { std::env::remove_var(var_name) };
        let result: usize = env_parse_with_default(var_name, 3);
        assert_eq!(result, 3);
    }
}
