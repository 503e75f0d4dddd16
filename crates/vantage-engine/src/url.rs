//! url templates with `{{param}}` placeholders.

use regex::{Captures, Regex};
use std::sync::OnceLock;
use vantage_core::ValidationError;

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{\{(\w+)\}\}").expect("static regex"))
}

/// fill `template` from `params`; a missing or empty value is an error.
pub fn fill(template: &str, params: &[(&str, Option<&str>)]) -> Result<String, ValidationError> {
    let mut missing = None;
    let filled = placeholder().replace_all(template, |caps: &Captures<'_>| {
        let key = &caps[1];
        match params.iter().find(|(name, _)| *name == key) {
            Some((_, Some(value))) if !value.is_empty() => (*value).to_string(),
            _ => {
                missing.get_or_insert_with(|| key.to_string());
                String::new()
            }
        }
    });
    match missing {
        Some(key) => Err(ValidationError::MissingParameter(key)),
        None => Ok(filled.into_owned()),
    }
}

/// last path segment of a self link or relative name.
pub fn short_name(value: &str) -> &str {
    value
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(value)
}
