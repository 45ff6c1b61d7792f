//! LIKE and regex pattern compilation shared by evaluation and emission.

use std::collections::HashMap;

use regex::Regex;

use crate::error::{ReportResult, ValidationError};

/// Translate a SQL LIKE pattern into an anchored regular expression.
///
/// `%` matches any run of characters (including newlines), `_` exactly one
/// character; everything else is literal.
pub fn like_to_regex(pattern: &str, case_insensitive: bool) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push_str(if case_insensitive { "(?is)^" } else { "(?s)^" });
    let mut buf = [0u8; 4];
    for ch in pattern.chars() {
        match ch {
            '%' => out.push_str(".*"),
            '_' => out.push('.'),
            other => out.push_str(&regex::escape(other.encode_utf8(&mut buf))),
        }
    }
    out.push('$');
    out
}

/// Validate and normalize a regex flag string.
///
/// Flags are case-insensitive, duplicates collapse, and the result keeps
/// first-seen order. Only `i`, `m` and `s` are portable across dialects.
pub fn normalize_flags(flags: &str) -> ReportResult<String> {
    let mut out = String::new();
    for flag in flags.chars().map(|c| c.to_ascii_lowercase()) {
        if !matches!(flag, 'i' | 'm' | 's') {
            return Err(ValidationError::UnsupportedRegexFlag { flag }.into());
        }
        if !out.contains(flag) {
            out.push(flag);
        }
    }
    Ok(out)
}

/// Compile a regex pattern with an inline flag group.
pub fn compile_regex(pattern: &str, flags: &str) -> ReportResult<Regex> {
    let flags = normalize_flags(flags)?;
    let source = if flags.is_empty() {
        pattern.to_string()
    } else {
        format!("(?{}){}", flags, pattern)
    };
    Regex::new(&source).map_err(|e| {
        ValidationError::InvalidRegex {
            pattern: pattern.to_string(),
            message: e.to_string(),
        }
        .into()
    })
}

/// Memoizes compiled patterns while evaluating per-row patterns.
#[derive(Debug, Default)]
pub(crate) struct PatternCache {
    compiled: HashMap<String, Regex>,
}

impl PatternCache {
    pub fn like(&mut self, pattern: &str, ci: bool) -> ReportResult<&Regex> {
        let source = like_to_regex(pattern, ci);
        self.regex(&source, "")
    }

    pub fn regex(&mut self, pattern: &str, flags: &str) -> ReportResult<&Regex> {
        let key = format!("{}\u{0}{}", flags, pattern);
        if !self.compiled.contains_key(&key) {
            let re = compile_regex(pattern, flags)?;
            self.compiled.insert(key.clone(), re);
        }
        self.compiled
            .get(&key)
            .ok_or_else(|| {
                ValidationError::InvalidRegex {
                    pattern: pattern.to_string(),
                    message: "pattern cache miss".into(),
                }
                .into()
            })
    }
}
