use proptest::prelude::*;

use skillsync::fetch::resolve_link_target;
use skillsync::storage::safe_relative_path;

fn segment() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("..".to_string()),
        Just(".".to_string()),
        "[a-z]{1,6}",
    ]
}

proptest! {
    #[test]
    fn test_link_resolution_stays_inside_root(
        dir in prop::collection::vec("[a-z]{1,6}", 0..5),
        target in prop::collection::vec(segment(), 0..8),
        absolute in any::<bool>(),
    ) {
        let mut target = target.join("/");
        if absolute {
            target.insert(0, '/');
        }
        let resolved = resolve_link_target(&dir.join("/"), &target);
        prop_assert!(!resolved.starts_with('/'));
        prop_assert!(!resolved.ends_with('/'));
        prop_assert!(resolved.split('/').all(|part| part != ".." && part != "."));
    }

    #[test]
    fn test_safe_paths_never_escape(path in "[a-z./]{0,20}") {
        if let Some(safe) = safe_relative_path(&path) {
            prop_assert!(safe.is_relative());
            prop_assert!(safe.components().all(|c| matches!(c, std::path::Component::Normal(_))));
        }
    }
}
