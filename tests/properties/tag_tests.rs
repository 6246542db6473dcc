use proptest::prelude::*;

use skillsync::core::normalize_tags;

proptest! {
    #[test]
    fn test_normalize_is_idempotent(
        tags in prop::collection::vec("[ a-zA-Z0-9-]{0,10}", 0..20),
        owner in "[a-z]{0,8}",
        max in 1usize..15,
    ) {
        let once = normalize_tags(&tags, &owner, max);
        let twice = normalize_tags(&once, &owner, max);
        prop_assert_eq!(&once, &twice);
        prop_assert!(once.len() <= max);
    }

    #[test]
    fn test_owner_leads_when_present(
        tags in prop::collection::vec("[a-z]{1,6}", 0..12),
        owner in "[a-z]{1,8}",
    ) {
        let normalized = normalize_tags(&tags, &owner, 10);
        prop_assert_eq!(normalized.first(), Some(&owner));
        let lowered: Vec<String> = normalized.iter().map(|t| t.to_lowercase()).collect();
        let mut deduped = lowered.clone();
        deduped.sort();
        deduped.dedup();
        prop_assert_eq!(deduped.len(), lowered.len());
    }
}
