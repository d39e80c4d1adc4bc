//! Property-based tests for path normalization and wildcard matching
//!
//! Run with: cargo test --test proptest_path

use dokankit::{normalize, normalize_directory, WildcardPattern};
use proptest::prelude::*;

// Path-like input: short segments joined by either separator, with dot
// segments and home references mixed in.
fn raw_path_strategy() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[ab~./\\\\]{0,24}").unwrap()
}

fn name_strategy() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[a-zA-Z0-9._ -]{0,16}").unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// A normalized path normalizes to itself.
    #[test]
    fn normalize_is_idempotent(raw in raw_path_strategy()) {
        if let Ok(once) = normalize(&raw) {
            let twice = normalize(once.as_str());
            prop_assert_eq!(twice, Ok(once));
        }
    }

    /// `\` and `/` are interchangeable.
    #[test]
    fn separators_are_equivalent(raw in raw_path_strategy()) {
        let forward = raw.replace('\\', "/");
        prop_assert_eq!(normalize(&raw), normalize(&forward));
    }

    /// Canonical output has one separator kind, no empty segments and no dot
    /// segments.
    #[test]
    fn output_is_canonical(raw in raw_path_strategy()) {
        if let Ok(path) = normalize(&raw) {
            let s = path.as_str();
            prop_assert!(!s.contains('\\'), "backslash in {:?}", s);
            prop_assert!(!s.contains("//"), "empty segment in {:?}", s);
            for segment in s.split('/') {
                prop_assert!(segment != "." && segment != "..", "dot segment in {:?}", s);
            }
        }
    }

    /// Directory normalization always ends in exactly one separator.
    #[test]
    fn directory_form_has_one_trailing_separator(raw in raw_path_strategy()) {
        if let Ok(dir) = normalize_directory(&raw) {
            let s = dir.as_str();
            if !s.is_empty() {
                prop_assert!(s.ends_with('/'));
                prop_assert!(!s.ends_with("//"));
            }
        }
    }

    /// `*` matches every name.
    #[test]
    fn star_matches_everything(name in name_strategy()) {
        prop_assert!(dokankit::matches(Some(name.as_str()), Some("*"), true));
        prop_assert!(WildcardPattern::match_all().matches(&name, false));
    }

    /// A pattern without wildcards matches exactly itself.
    #[test]
    fn literal_pattern_matches_itself(name in name_strategy(), other in name_strategy()) {
        let pattern = WildcardPattern::parse(&name).unwrap();
        if name.is_empty() {
            // The empty pattern is `*`.
            prop_assert!(pattern.is_match_all());
        } else {
            prop_assert!(pattern.matches(&name, true));
            prop_assert_eq!(pattern.matches(&other, true), other == name);
        }
    }

    /// Case-insensitive matching ignores ASCII case on both sides.
    #[test]
    fn case_insensitive_ignores_case(name in name_strategy()) {
        let upper = name.to_ascii_uppercase();
        prop_assert!(dokankit::matches(Some(upper.as_str()), Some(name.as_str()), false));
        prop_assert!(dokankit::matches(Some(name.as_str()), Some(upper.as_str()), false));
    }

    /// `n` question marks match exactly the names of length `n`.
    #[test]
    fn question_marks_count_characters(name in name_strategy(), n in 1usize..12) {
        let pattern = "?".repeat(n);
        prop_assert_eq!(
            dokankit::matches(Some(name.as_str()), Some(pattern.as_str()), true),
            name.chars().count() == n
        );
    }

    /// Prefix and suffix around a star match any filler.
    #[test]
    fn star_matches_any_filler(
        prefix in "[a-z]{0,4}",
        filler in name_strategy(),
        suffix in "[a-z]{0,4}",
    ) {
        let pattern = format!("{prefix}*{suffix}");
        let name = format!("{prefix}{filler}{suffix}");
        prop_assert!(dokankit::matches(Some(name.as_str()), Some(pattern.as_str()), true));
    }

    /// Display gives back a pattern with identical behavior.
    #[test]
    fn display_roundtrips(pattern in "[a-c?*]{0,8}", name in "[a-c]{0,8}") {
        let parsed = WildcardPattern::parse(&pattern).unwrap();
        let reparsed = WildcardPattern::parse(&parsed.to_string()).unwrap();
        prop_assert_eq!(parsed.matches(&name, true), reparsed.matches(&name, true));
    }
}
