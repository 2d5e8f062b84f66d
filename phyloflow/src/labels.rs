//! Normalization of free-form labels into safe identifier tokens.
//!
//! Sanitized labels are used as filesystem-path components and as tree leaf
//! names, so they must never be empty and never contain path-unsafe
//! characters.

use regex::Regex;
use std::sync::OnceLock;

/// Placeholder returned when nothing survives sanitization.
pub const EMPTY_LABEL: &str = "NA";

fn pair_suffix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"_(1|2)$").expect("hard-coded pattern"))
}

fn unsafe_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9_]+").expect("hard-coded pattern"))
}

fn underscore_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"_+").expect("hard-coded pattern"))
}

fn non_alnum() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9]").expect("hard-coded pattern"))
}

/// Normalizes a raw label into a token usable as a path component.
///
/// Strips one trailing `_1`/`_2` read-pair suffix, replaces every run of
/// characters outside `[A-Za-z0-9_]` with a single underscore, collapses
/// repeated underscores and trims them from both ends. An empty result
/// becomes [`EMPTY_LABEL`].
#[must_use]
pub fn sanitize_label(raw: &str) -> String {
    let stripped = pair_suffix().replace(raw, "");
    let replaced = unsafe_runs().replace_all(&stripped, "_");
    let collapsed = underscore_runs().replace_all(&replaced, "_");
    let trimmed = collapsed.trim_matches('_');
    if trimmed.is_empty() {
        EMPTY_LABEL.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Drops every non-alphanumeric character.
///
/// This is the match key the collaborator scripts use when comparing
/// metadata labels against taxon names, so both sides must apply the same
/// cleanup.
#[must_use]
pub fn clean_alnum(raw: &str) -> String {
    non_alnum().replace_all(raw, "").into_owned()
}
