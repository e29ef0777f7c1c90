//! # Tag Codec
//!
//! Reversible embedding of structured metadata into a free-text notes field
//! using inline `[#key:value]` markers, so quadrant and energy survive a
//! round-trip through a service whose schema has no place for them.
//!
//! Values are restricted to `[a-zA-Z-]+`, which covers the fixed enum
//! domains in use. Only the first occurrence of a tag is replaced in place
//! by [`set_tag`]; [`strip_all_tags`] removes every occurrence of the
//! recognized keys so display notes are always clean even against malformed
//! duplicate tags.

use once_cell::sync::Lazy;
use regex::Regex;

/// Tag key carrying the quadrant id.
pub const QUADRANT_KEY: &str = "q";
/// Tag key carrying the energy level.
pub const ENERGY_KEY: &str = "energy";

static QUADRANT_TAG: Lazy<Regex> = Lazy::new(|| tag_pattern(QUADRANT_KEY));
static ENERGY_TAG: Lazy<Regex> = Lazy::new(|| tag_pattern(ENERGY_KEY));

/// Matches any recognized tag with one optional leading space, so stripping
/// does not accumulate whitespace.
static RECOGNIZED_TAGS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r" ?\[#(?:q|energy):[a-zA-Z-]+\]").expect("recognized-tag pattern is valid")
});

fn tag_pattern(key: &str) -> Regex {
    // The colon right after the key keeps prefixes of longer keys from
    // colliding.
    Regex::new(&format!(r"\[#{}:([a-zA-Z-]+)\]", regex::escape(key)))
        .expect("tag pattern is valid")
}

fn tag_re(key: &str) -> Regex {
    // Regex clones share the compiled program, so the static path is cheap.
    match key {
        QUADRANT_KEY => QUADRANT_TAG.clone(),
        ENERGY_KEY => ENERGY_TAG.clone(),
        _ => tag_pattern(key),
    }
}

/// Scan `text` for the first `[#key:value]` marker and return the captured
/// value, or `None` if absent.
#[must_use]
pub fn parse_tag(text: &str, key: &str) -> Option<String> {
    tag_re(key)
        .captures(text)
        .map(|caps| caps[1].to_string())
}

/// Embed or update a single tag. An existing tag for `key` is replaced in
/// place (first occurrence only); otherwise the tag is appended after a
/// blank line, or stands alone when `text` is empty.
#[must_use]
pub fn set_tag(text: &str, key: &str, value: &str) -> String {
    set_tags(text, &[(key, value)])
}

/// Embed or update several tags in one pass.
///
/// Tags already present are replaced in place, preserving their position.
/// Tags not yet present are appended together: the group is separated from
/// non-empty text by a blank line, and the tags within the group by single
/// spaces.
#[must_use]
pub fn set_tags(text: &str, tags: &[(&str, &str)]) -> String {
    let mut out = text.to_string();
    let mut appended: Vec<String> = Vec::new();

    for (key, value) in tags {
        let tag = format!("[#{key}:{value}]");
        let re = tag_re(key);
        if re.is_match(&out) {
            out = re.replace(&out, tag.as_str()).into_owned();
        } else {
            appended.push(tag);
        }
    }

    if appended.is_empty() {
        return out;
    }
    let group = appended.join(" ");
    if out.is_empty() {
        group
    } else {
        format!("{out}\n\n{group}")
    }
}

/// Remove the first tag matching `key`, including one leading space when
/// present.
#[must_use]
pub fn clear_tag(text: &str, key: &str) -> String {
    let re = Regex::new(&format!(r" ?\[#{}:[a-zA-Z-]+\]", regex::escape(key)))
        .expect("clear pattern is valid");
    re.replace(text, "").into_owned()
}

/// Remove every recognized tag (quadrant and energy, all occurrences) and
/// trim surrounding whitespace. Produces the display form of a notes field.
#[must_use]
pub fn strip_all_tags(text: &str) -> String {
    RECOGNIZED_TAGS.replace_all(text, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_tag_first_occurrence() {
        let notes = "call vendor\n\n[#q:schedule] [#energy:deep]";
        assert_eq!(parse_tag(notes, QUADRANT_KEY).as_deref(), Some("schedule"));
        assert_eq!(parse_tag(notes, ENERGY_KEY).as_deref(), Some("deep"));
        assert_eq!(parse_tag("no tags here", QUADRANT_KEY), None);
    }

    #[test]
    fn test_parse_tag_exact_key_match() {
        // A key that is a prefix of another key must not collide.
        let notes = "[#energy:quick]";
        assert_eq!(parse_tag(notes, "e"), None);
        assert_eq!(parse_tag(notes, ENERGY_KEY).as_deref(), Some("quick"));
    }

    #[test]
    fn test_set_tag_appends_with_blank_line() {
        assert_eq!(set_tag("buy milk", QUADRANT_KEY, "do-first"), "buy milk\n\n[#q:do-first]");
        assert_eq!(set_tag("", QUADRANT_KEY, "do-first"), "[#q:do-first]");
    }

    #[test]
    fn test_set_tag_replaces_in_place() {
        let notes = "[#q:schedule] some text after";
        assert_eq!(
            set_tag(notes, QUADRANT_KEY, "delegate"),
            "[#q:delegate] some text after"
        );
    }

    #[test]
    fn test_set_tag_replaces_only_first_duplicate() {
        let notes = "[#q:schedule] middle [#q:delete]";
        assert_eq!(
            set_tag(notes, QUADRANT_KEY, "do-first"),
            "[#q:do-first] middle [#q:delete]"
        );
    }

    #[test]
    fn test_set_tags_groups_appended_tags() {
        let out = set_tags("notes", &[(QUADRANT_KEY, "schedule"), (ENERGY_KEY, "quick")]);
        assert_eq!(out, "notes\n\n[#q:schedule] [#energy:quick]");
    }

    #[test]
    fn test_set_tags_mixed_replace_and_append() {
        let notes = "text\n\n[#q:delete]";
        let out = set_tags(notes, &[(QUADRANT_KEY, "schedule"), (ENERGY_KEY, "deep")]);
        assert_eq!(out, "text\n\n[#q:schedule]\n\n[#energy:deep]");
    }

    #[test]
    fn test_clear_tag_consumes_leading_space() {
        let notes = "text\n\n[#q:schedule] [#energy:quick]";
        assert_eq!(clear_tag(notes, ENERGY_KEY), "text\n\n[#q:schedule]");
    }

    #[test]
    fn test_strip_all_tags_removes_duplicates() {
        let notes = "a [#q:schedule] b [#q:delete] c [#energy:deep]";
        assert_eq!(strip_all_tags(notes), "a b c");
    }

    #[test]
    fn test_strip_preserves_unrecognized_tags() {
        let notes = "text [#color:red]\n\n[#q:schedule]";
        assert_eq!(strip_all_tags(notes), "text [#color:red]");
    }

    #[test]
    fn test_idempotent_retagging() {
        let once = set_tag("some notes", QUADRANT_KEY, "delegate");
        let twice = set_tag(&once, QUADRANT_KEY, "delegate");
        assert_eq!(once, twice);
    }

    proptest! {
        // Round-trip: for text without tag syntax, tagging then stripping
        // reconstructs the original (modulo boundary whitespace).
        #[test]
        fn prop_tag_round_trip(
            s in "[a-zA-Z0-9 ,.!?]{0,60}",
            q in prop::sample::select(vec!["do-first", "schedule", "delegate", "delete"]),
            e in prop::sample::select(vec!["quick", "deep"]),
        ) {
            let tagged = set_tags(&s, &[(QUADRANT_KEY, q), (ENERGY_KEY, e)]);
            prop_assert_eq!(strip_all_tags(&tagged), s.trim());
            let parsed_q = parse_tag(&tagged, QUADRANT_KEY);
            prop_assert_eq!(parsed_q.as_deref(), Some(q));
            let parsed_e = parse_tag(&tagged, ENERGY_KEY);
            prop_assert_eq!(parsed_e.as_deref(), Some(e));
        }

        #[test]
        fn prop_set_tag_idempotent(
            s in "[a-zA-Z0-9 ,.]{0,40}",
            q in prop::sample::select(vec!["do-first", "schedule", "delegate", "delete"]),
        ) {
            let once = set_tag(&s, QUADRANT_KEY, q);
            prop_assert_eq!(&set_tag(&once, QUADRANT_KEY, q), &once);
        }
    }
}
