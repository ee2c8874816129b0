//! Environment variable expansion for configuration strings.

use crate::ConfigError;

/// Expand environment variable references in a string.
///
/// Supports:
/// - `${VAR}` - expands to the value of VAR, errors if unset
/// - `${VAR:-default}` - expands to VAR if set, otherwise uses default
///
/// Strings without `${` are returned unchanged, so a bare `$VAR` on its own is
/// never expanded.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    // Fast path: no expansion needed
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    let expanded = shellexpand::env_with_context_no_errors(value, |var| std::env::var(var).ok());

    // Unset variables without a default are left in place by the expansion
    if let Some(name) = unresolved_var(&expanded) {
        return Err(ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{name}}} not set"),
        });
    }

    Ok(expanded.into_owned())
}

/// Name of the first `${NAME}` reference left in `value`.
fn unresolved_var(value: &str) -> Option<&str> {
    let start = value.find("${")? + 2;
    let rest = &value[start..];
    let end = rest.find(['}', ':'])?;
    Some(&rest[..end])
}
