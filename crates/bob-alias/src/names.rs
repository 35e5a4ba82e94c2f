//! Alias normalization.
//!
//! Every alias a user deploys under is normalized into a lowercase,
//! URL-safe name ending in [`ALIAS_SUFFIX`]:
//!
//! - lowercase, then trim surrounding whitespace
//! - runs of whitespace become a single `-`
//! - characters outside `[a-z0-9._-]` are dropped
//! - repeated hyphens collapse into one
//! - leading and trailing `.` and `-` are stripped
//! - `.bob` is appended unless already present
//!
//! Request-time lookups use [`query_forms`] instead, which only trims and
//! lowercases so distinct URLs never collapse onto the same alias.

use crate::error::{AliasError, Result};

/// Suffix every stored alias carries.
pub const ALIAS_SUFFIX: &str = ".bob";

/// Normalize a user-supplied site name into a stored alias.
///
/// # Examples
///
/// ```
/// use bob_alias::names::normalize;
///
/// assert_eq!(normalize("My Client Site!!").unwrap(), "my-client-site.bob");
/// assert_eq!(normalize("demo.bob").unwrap(), "demo.bob");
/// assert!(normalize("!!!").is_err());
/// ```
pub fn normalize(raw: &str) -> Result<String> {
    let lowered = raw.to_lowercase();

    let mut out = String::with_capacity(lowered.len() + ALIAS_SUFFIX.len());
    let mut in_space = false;
    for ch in lowered.trim().chars() {
        if ch.is_whitespace() {
            if !in_space {
                push_hyphen(&mut out);
            }
            in_space = true;
            continue;
        }
        in_space = false;
        match ch {
            '-' => push_hyphen(&mut out),
            'a'..='z' | '0'..='9' | '.' | '_' => out.push(ch),
            _ => {}
        }
    }

    let stem = out.trim_matches(|c| c == '.' || c == '-');
    if stem.is_empty() {
        return Err(AliasError::InvalidAlias {
            raw: raw.to_string(),
            reason: "no usable characters".into(),
        });
    }
    Ok(with_suffix(stem))
}

fn push_hyphen(out: &mut String) {
    if !out.ends_with('-') {
        out.push('-');
    }
}

/// Append [`ALIAS_SUFFIX`] unless `name` already ends with it.
pub fn with_suffix(name: &str) -> String {
    if name.ends_with(ALIAS_SUFFIX) {
        name.to_string()
    } else {
        format!("{name}{ALIAS_SUFFIX}")
    }
}

/// `name` without a trailing [`ALIAS_SUFFIX`].
pub fn strip_suffix(name: &str) -> &str {
    name.strip_suffix(ALIAS_SUFFIX).unwrap_or(name)
}

/// Stored-alias forms a request segment may refer to, in lookup order:
/// as typed, without the suffix, with the suffix.
///
/// The segment is only trimmed and lowercased.
pub fn query_forms(candidate: &str) -> Vec<String> {
    let typed = candidate.trim().to_lowercase();
    if typed.is_empty() {
        return Vec::new();
    }

    let mut forms = vec![typed.clone()];
    if let Some(stem) = typed.strip_suffix(ALIAS_SUFFIX) {
        if !stem.is_empty() {
            forms.push(stem.to_string());
        }
    } else {
        forms.push(with_suffix(&typed));
    }
    forms
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn punctuation_and_spaces() {
        assert_eq!(normalize("My Client Site!!").unwrap(), "my-client-site.bob");
        assert_eq!(normalize("  Hello   World ").unwrap(), "hello-world.bob");
        assert_eq!(normalize("a - b").unwrap(), "a-b.bob");
    }

    #[test]
    fn existing_suffix_is_kept() {
        assert_eq!(normalize("Demo.BOB").unwrap(), "demo.bob");
        assert_eq!(normalize("demo.bob").unwrap(), "demo.bob");
    }

    #[test]
    fn edges_are_trimmed() {
        assert_eq!(normalize("..site..").unwrap(), "site.bob");
        assert_eq!(normalize("-.site.-").unwrap(), "site.bob");
        assert_eq!(normalize("---x---").unwrap(), "x.bob");
    }

    #[test]
    fn underscores_and_digits_survive() {
        assert_eq!(normalize("v2_docs").unwrap(), "v2_docs.bob");
    }

    #[test]
    fn non_ascii_is_dropped() {
        assert_eq!(normalize("Café Olé").unwrap(), "caf-ol.bob");
    }

    #[test]
    fn empty_results_are_rejected() {
        for raw in ["", "   ", "!!!", "..", "-", "ü"] {
            assert!(
                matches!(normalize(raw), Err(AliasError::InvalidAlias { .. })),
                "{raw:?}"
            );
        }
    }

    #[test]
    fn suffix_helpers() {
        assert_eq!(with_suffix("demo"), "demo.bob");
        assert_eq!(with_suffix("demo.bob"), "demo.bob");
        assert_eq!(strip_suffix("demo.bob"), "demo");
        assert_eq!(strip_suffix("demo"), "demo");
    }

    #[test]
    fn query_forms_order() {
        assert_eq!(query_forms("Demo.bob"), vec!["demo.bob", "demo"]);
        assert_eq!(query_forms("demo"), vec!["demo", "demo.bob"]);
        assert_eq!(query_forms(".bob"), vec![".bob"]);
        assert!(query_forms("  ").is_empty());
    }

    #[test]
    fn query_forms_do_not_drop_characters() {
        assert_eq!(query_forms("my site!"), vec!["my site!", "my site!.bob"]);
    }

    proptest! {
        #[test]
        fn normalized_aliases_are_url_safe(raw in "\\PC{0,40}") {
            if let Ok(alias) = normalize(&raw) {
                prop_assert!(alias.ends_with(ALIAS_SUFFIX));
                prop_assert!(alias
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "._-".contains(c)));
                prop_assert!(!alias.contains("--"));
                prop_assert!(!alias.starts_with('.') && !alias.starts_with('-'));
            }
        }

        #[test]
        fn normalization_is_idempotent(raw in "[ A-Za-z0-9._!-]{0,40}") {
            if let Ok(alias) = normalize(&raw) {
                prop_assert_eq!(normalize(&alias).unwrap(), alias);
            }
        }
    }
}
