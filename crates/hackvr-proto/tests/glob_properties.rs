//! Property-based tests for selector globbing.

use hackvr_proto::glob;
use proptest::prelude::*;

fn identifier_part() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[A-Za-z0-9_]{1,6}").unwrap()
}

/// Wildcard-free patterns built from literals, groups, and ranges.
fn expandable_pattern() -> impl Strategy<Value = String> {
    let literal = identifier_part();
    let group = prop::collection::vec(identifier_part(), 1..4)
        .prop_map(|items| format!("{{{}}}", items.join(",")));
    let range = (0u32..50, 0u32..5)
        .prop_map(|(start, span)| format!("{{{}..{}}}", start, start + span));
    let part = prop_oneof![literal, group, range];
    prop::collection::vec(part, 1..4).prop_map(|parts| parts.join("-"))
}

proptest! {
    #[test]
    fn expanded_tokens_are_valid_and_selectable(pattern in expandable_pattern()) {
        prop_assert!(glob::is_valid_pattern(&pattern));
        let expanded = glob::expand(&pattern).unwrap();
        prop_assert!(!expanded.is_empty());
        for token in &expanded {
            prop_assert!(glob::is_valid_token(token), "bad token {token}");
        }
        // Every expanded token selects itself (selection dedups, group
        // items may repeat).
        let selected = glob::select(&pattern, &expanded, String::as_str).unwrap();
        prop_assert_eq!(selected, dedup_preserving_order(&expanded));
    }

    #[test]
    fn expansion_limit_is_an_upper_bound(
        pattern in expandable_pattern(),
        match_count in 1usize..16,
    ) {
        let expanded = glob::expand(&pattern).unwrap();
        let limit = glob::get_upper_expansion_limit(&pattern, match_count).unwrap();
        prop_assert!(expanded.len() <= limit);
    }

    #[test]
    fn wildcard_limit_scales_with_match_count(match_count in 1usize..32) {
        let limit = glob::get_upper_expansion_limit("{a,b}-*", match_count).unwrap();
        prop_assert_eq!(limit, 2 * match_count);
    }

    #[test]
    fn valid_tokens_are_valid_patterns(
        reserved in any::<bool>(),
        parts in prop::collection::vec(identifier_part(), 1..4),
    ) {
        let mut token = parts.join("-");
        if reserved {
            token = format!("${token}");
        }
        prop_assert!(glob::is_valid_token(&token));
        prop_assert!(glob::is_valid_pattern(&token));
        // A literal token selects exactly itself.
        let scope = vec![token.clone(), format!("{token}-extra_part")];
        let selected = glob::select(&token, &scope, String::as_str).unwrap();
        prop_assert_eq!(selected, vec![&scope[0]]);
    }

    #[test]
    fn select_is_consistent_with_expansion(pattern in expandable_pattern()) {
        let expanded = glob::expand(&pattern).unwrap();
        let mut scope = expanded.clone();
        scope.push("unrelated_token_0".to_string());
        let selected = glob::select(&pattern, &scope, String::as_str).unwrap();
        prop_assert_eq!(selected, dedup_preserving_order(&expanded));
    }
}

fn dedup_preserving_order(tokens: &[String]) -> Vec<&String> {
    let mut seen: Vec<&str> = Vec::new();
    let mut unique = Vec::new();
    for token in tokens {
        if !seen.contains(&token.as_str()) {
            seen.push(token);
            unique.push(token);
        }
    }
    unique
}
