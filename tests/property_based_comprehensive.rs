//! Property-based tests for the filter engine
//!
//! Core properties:
//! 1. Registry bounds hold for any configuration input
//! 2. Tokenization never yields empty or delimiter-containing names
//! 3. Name extraction always returns the last path component
//! 4. Classification agrees with list membership

use pflog::config::{parse_combined, parse_single, FilterConfig, FilterTokens};
use pflog::filter::{
    short_name, FilterRegistry, MatchResult, StreamKind, MAX_FILTERS, MAX_FILTER_NAME_LEN,
};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_registry_bounds_hold_for_any_input(
        combined in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..300), 0..300),
        stdout in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..300), 0..300),
    ) {
        // Property: no list exceeds MAX_FILTERS, no entry exceeds MAX_FILTER_NAME_LEN
        let config = FilterConfig {
            combined: Some(combined.join(&b':')),
            stdout: Some(stdout.join(&b':')),
            stderr: None,
        };
        let registry = config.build_registry();

        for stream in [StreamKind::Stdout, StreamKind::Stderr] {
            prop_assert!(registry.count(stream) <= MAX_FILTERS);
            for name in registry.list(stream).iter() {
                prop_assert!(name.len() <= MAX_FILTER_NAME_LEN);
                prop_assert!(!name.is_empty());
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_tokens_are_never_empty(value in prop::collection::vec(any::<u8>(), 0..512)) {
        for token in FilterTokens::new(&value) {
            prop_assert!(!token.is_empty());
            prop_assert!(!token.contains(&b':'));
        }
    }

    #[test]
    fn prop_tokens_recover_clean_names(names in prop::collection::vec("[a-z0-9_.-]{1,16}", 0..20)) {
        // Property: names without empty segments come back unchanged, in order
        let value = names.join(":");
        let tokens: Vec<String> = FilterTokens::new(value.as_bytes())
            .map(|t| String::from_utf8(t.to_vec()).unwrap())
            .collect();
        prop_assert_eq!(tokens, names);
    }

    #[test]
    fn prop_short_name_is_last_component(
        dirs in prop::collection::vec("[a-z]{0,8}", 0..6),
        file in "[a-z]{0,8}",
    ) {
        let mut path = dirs.join("/");
        if !dirs.is_empty() {
            path.push('/');
        }
        path.push_str(&file);

        prop_assert_eq!(short_name(path.as_bytes()), file.as_bytes());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_classify_matches_membership(
        stdout in prop::collection::vec("[a-e]{1,3}", 0..10),
        stderr in prop::collection::vec("[a-e]{1,3}", 0..10),
        candidate in "[a-e]{1,3}",
    ) {
        let mut registry = FilterRegistry::new();
        parse_single(&mut registry, StreamKind::Stdout, stdout.join(":").as_bytes()).unwrap();
        parse_single(&mut registry, StreamKind::Stderr, stderr.join(":").as_bytes()).unwrap();

        let expected = MatchResult::from_flags(stdout.contains(&candidate), stderr.contains(&candidate));
        prop_assert_eq!(registry.classify(candidate.as_bytes()), expected);
    }

    #[test]
    fn prop_combined_keeps_lists_in_step(names in prop::collection::vec("[a-z]{1,8}", 0..400)) {
        let mut registry = FilterRegistry::new();
        let result = parse_combined(&mut registry, names.join(":").as_bytes());

        prop_assert_eq!(registry.count(StreamKind::Stdout), registry.count(StreamKind::Stderr));
        prop_assert_eq!(registry.count(StreamKind::Stdout), names.len().min(MAX_FILTERS));
        prop_assert_eq!(result.is_err(), names.len() > MAX_FILTERS);
    }
}
