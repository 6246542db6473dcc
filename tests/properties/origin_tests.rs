use proptest::prelude::*;

use skillsync::core::parse_origin;

proptest! {
    #[test]
    fn test_parse_origin_never_panics(input in ".*") {
        let origin = parse_origin(&input);
        // Anything recognised carries an owner.
        prop_assert!(origin.is_empty() || !origin.owner.is_empty());
    }

    #[test]
    fn test_github_urls_round_trip(
        owner in "[a-z][a-z0-9-]{0,15}",
        repo in "[a-z][a-z0-9_.-]{0,15}",
        tail in prop::option::of("[a-z]{1,8}"),
    ) {
        prop_assume!(!repo.ends_with(".git"));
        let mut url = format!("https://github.com/{owner}/{repo}");
        if let Some(tail) = tail {
            url.push_str("/tree/main/");
            url.push_str(&tail);
        }
        let origin = parse_origin(&url);
        prop_assert_eq!(origin.owner, owner);
        prop_assert_eq!(origin.repo, repo);
    }
}
