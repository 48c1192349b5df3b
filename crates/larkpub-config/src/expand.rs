//! `${VAR}` expansion for secrets and endpoints in `larkpub.toml`.
//!
//! Only the braced forms are recognised:
//! - `${VAR}` is replaced by the variable, and fails when it is unset
//! - `${VAR:-fallback}` uses `fallback` when the variable is unset
//!
//! A bare `$VAR` is left alone so app secrets containing `$` survive.

use crate::ConfigError;

/// Expand variable references in `value`, reporting failures against `field`.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, lookup)
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{}}} not set", e.cause.0),
        })
}

/// Expand `value` in place.
pub(crate) fn expand_in_place(value: &mut String, field: &str) -> Result<(), ConfigError> {
    *value = expand_env(value, field)?;
    Ok(())
}

fn lookup(var: &str) -> Result<Option<String>, UnsetVar> {
    std::env::var(var)
        .map(Some)
        .map_err(|_| UnsetVar(var.to_owned()))
}

/// Name of a variable that had no value.
struct UnsetVar(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_app_secret() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("LARKPUB_TEST_SECRET", "s3cr3t");
        }
        let result = expand_env("${LARKPUB_TEST_SECRET}", "lark.app_secret").unwrap();
        assert_eq!(result, "s3cr3t");
        unsafe {
            std::env::remove_var("LARKPUB_TEST_SECRET");
        }
    }

    #[test]
    fn test_expand_fallback_when_unset() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("LARKPUB_TEST_UNSET_BASE");
        }
        let result = expand_env(
            "${LARKPUB_TEST_UNSET_BASE:-https://open.feishu.cn/open-apis}",
            "lark.base_url",
        )
        .unwrap();
        assert_eq!(result, "https://open.feishu.cn/open-apis");
    }

    #[test]
    fn test_expand_missing_var_names_field() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("LARKPUB_TEST_MISSING_ID");
        }
        let err = expand_env("${LARKPUB_TEST_MISSING_ID}", "lark.app_id").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        let msg = err.to_string();
        assert!(msg.contains("LARKPUB_TEST_MISSING_ID"));
        assert!(msg.contains("lark.app_id"));
    }

    #[test]
    fn test_expand_inside_url() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("LARKPUB_TEST_HOST", "open.larksuite.com");
        }
        let mut url = "https://${LARKPUB_TEST_HOST}/open-apis".to_owned();
        expand_in_place(&mut url, "lark.base_url").unwrap();
        assert_eq!(url, "https://open.larksuite.com/open-apis");
        unsafe {
            std::env::remove_var("LARKPUB_TEST_HOST");
        }
    }

    #[test]
    fn test_bare_dollar_kept() {
        let result = expand_env("pa$$word", "lark.app_secret").unwrap();
        assert_eq!(result, "pa$$word");
    }
}
