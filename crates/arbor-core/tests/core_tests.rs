#[cfg(test)]
mod tests {
    use arbor_core::*;

    fn sample() -> RawConfig {
        let mut raw = RawConfig::new();
        raw.root_mut().child("A").child("B").set_value("1");
        raw.root_mut().child("A").child("C").set_value("2");
        raw
    }

    // ── Path access ────────────────────────────────────────────

    #[test]
    fn test_entry_sets_parent() {
        let mut raw = RawConfig::new();
        raw.root_mut().child("A").child("B").set_value("C");

        let a = raw.get_path("A").unwrap();
        let b = raw.get_path("A/B").unwrap();
        assert_eq!(raw.parent(b), Some(a));
        assert_eq!(raw.parent(a), Some(raw.root()));
        assert_eq!(raw.value(b), Some("C"));
        assert!(raw.check_invariants());
    }

    #[test]
    fn test_get_does_not_create() {
        let mut raw = RawConfig::new();
        raw.set_value_by_path("A", "1");
        let before = raw.len();
        assert!(raw.get_path("A/B/C").is_none());
        assert!(raw.get_path("Missing").is_none());
        assert_eq!(raw.len(), before);
    }

    #[test]
    fn test_entry_creates_intermediate_nodes() {
        let mut raw = RawConfig::new();
        let leaf = raw.entry_path("X/Y/Z");
        assert_eq!(raw.name(leaf), "Z");
        assert_eq!(raw.value(leaf), None);
        assert_eq!(raw.sub_items(raw.root()), vec!["X"]);
        assert!(raw.get_path("X/Y").is_some());
        // Existing nodes are reused.
        assert_eq!(raw.entry_path("X/Y/Z"), leaf);
    }

    #[test]
    fn test_value_by_path() {
        let raw = sample();
        assert_eq!(raw.value_by_path("A/B"), Some("1"));
        assert_eq!(raw.value_by_path("A/C"), Some("2"));
        assert_eq!(raw.value_by_path("A"), None);
        assert_eq!(raw.value_by_path("A/Z"), None);
    }

    #[test]
    fn test_type_tag_is_ignored_by_lookup() {
        let mut raw = RawConfig::new();
        raw.set_value_by_path("Sub/Int", "3");
        let sub = raw.get_path("Sub").unwrap();
        raw.set_type_tag(sub, "SubType");
        assert_eq!(raw.type_tag(sub), Some("SubType"));
        assert_eq!(raw.value_by_path("Sub/Int"), Some("3"));
        raw.clear_type_tag(sub);
        assert_eq!(raw.type_tag(sub), None);
    }

    #[test]
    fn test_dollar_in_path_is_literal() {
        let mut raw = RawConfig::new();
        raw.set_value_by_path("Price$USD", "1");
        raw.set_value_by_path("Price$EUR", "2");
        assert_eq!(raw.sub_items(raw.root()), vec!["Price$USD", "Price$EUR"]);
        assert_eq!(raw.value_by_path("Price$USD"), Some("1"));
        assert_eq!(raw.value_by_path("Price$EUR"), Some("2"));
        assert_eq!(raw.get_path("Price"), None);
        let usd = raw.get_path("Price$USD").unwrap();
        assert_eq!(raw.type_tag(usd), None);
    }

    #[test]
    fn test_set_value_keeps_children() {
        let mut raw = sample();
        let a = raw.get_path("A").unwrap();
        raw.set_value(a, "top");
        assert_eq!(raw.value(a), Some("top"));
        assert_eq!(raw.sub_items(a), vec!["B", "C"]);
    }

    #[test]
    fn test_sub_items_is_a_snapshot() {
        let mut raw = sample();
        let a = raw.get_path("A").unwrap();
        let items = raw.sub_items(a);
        raw.entry(a, "D");
        raw.remove(a, "B");
        assert_eq!(items, vec!["B", "C"]);
        assert_eq!(raw.sub_items(a), vec!["C", "D"]);
    }

    // ── Copy and move ──────────────────────────────────────────

    #[test]
    fn test_copy_is_independent() {
        let mut config = RawConfig::new();
        let root = config.root();
        config.set_value(root, "A");
        config.root_mut().child("B").set_value("C");

        let mut copy = config.clone();
        assert_eq!(copy.value(copy.root()), Some("A"));
        assert_eq!(copy.sub_items(copy.root()), vec!["B"]);
        assert!(copy.check_invariants());

        let sub = config.get_path("B").unwrap();
        let copy_sub = copy.get_path("B").unwrap();
        assert!(copy.node(copy_sub) == config.node(sub));

        copy.set_value_by_path("B", "changed");
        assert_eq!(config.value_by_path("B"), Some("C"));
    }

    #[test]
    fn test_move_leaves_source_empty() {
        let mut config = sample();
        let moved = std::mem::take(&mut config);
        assert!(config.is_empty());
        assert_eq!(config.len(), 1);
        assert_eq!(moved.value_by_path("A/B"), Some("1"));
        assert!(moved.check_invariants());
    }

    // ── Assignment ─────────────────────────────────────────────

    #[test]
    fn test_assign_does_not_import_name() {
        let config = sample();
        let a = config.get_path("A").unwrap();

        let mut assigned = RawConfig::new();
        let root = assigned.root();
        assigned.assign_from(root, &config, a);
        let copied = config.copy_subtree(a);

        let mut expect = RawConfig::new();
        expect.set_value_by_path("B", "1");
        expect.set_value_by_path("C", "2");

        assert_eq!(assigned, expect);
        assert_eq!(copied, expect);
        assert!(copied.name(copied.root()).is_empty());
        assert!(assigned.check_invariants());
        assert!(copied.check_invariants());
    }

    #[test]
    fn test_assign_tree_into_nested_node() {
        let mut config = sample();
        let mut expect = RawConfig::new();
        expect.set_value_by_path("B", "1");
        expect.set_value_by_path("C", "2");

        config.root_mut().child("A/B").assign(&expect);
        let b = config.get_path("A/B").unwrap();
        assert!(config.node(b) == expect.root_node());
        assert_eq!(config.name(b), "B");

        let mut expect2 = RawConfig::new();
        expect2.set_value_by_path("A/B/B", "1");
        expect2.set_value_by_path("A/B/C", "2");
        expect2.set_value_by_path("A/C", "2");
        assert_eq!(config, expect2);
        assert!(config.check_invariants());
    }

    #[test]
    fn test_assign_replaces_children() {
        let mut config = sample();
        let mut other = RawConfig::new();
        other.set_value_by_path("Z", "9");
        let a = config.get_path("A").unwrap();
        config.assign(a, &other);
        assert_eq!(config.sub_items(a), vec!["Z"]);
        assert_eq!(config.value_by_path("A/B"), None);
    }

    #[test]
    fn test_assign_descendant_into_ancestor() {
        let mut config = RawConfig::new();
        config.set_value_by_path("A/B/C", "DEF");
        let a = config.get_path("A").unwrap();
        let c = config.get_path("A/B/C").unwrap();

        config.assign_node(a, c);

        assert_eq!(config.value(a), Some("DEF"));
        assert!(!config.has_sub_items(a));
        assert!(!config.contains(c));
        assert!(config.check_invariants());
        assert_eq!(config.len(), 2);
    }

    #[test]
    fn test_assign_ancestor_into_descendant() {
        let mut config = RawConfig::new();
        config.set_value_by_path("A/B/C", "DEF");
        let a = config.get_path("A").unwrap();
        let c = config.get_path("A/B/C").unwrap();

        config.assign_node(c, a);

        assert_eq!(config.value(c), None);
        assert_eq!(config.value_by_path("A/B/C/B/C"), Some("DEF"));
        assert!(config.check_invariants());
    }

    #[test]
    fn test_self_assignment_is_noop() {
        let mut config = sample();
        let before = config.clone();
        let a = config.get_path("A").unwrap();
        config.assign_node(a, a);
        assert_eq!(config, before);
        assert!(config.check_invariants());
    }

    // ── Detach and removal ─────────────────────────────────────

    #[test]
    fn test_detach() {
        let mut raw = RawConfig::new();
        raw.set_value_by_path("IntOption", "0");
        raw.set_value_by_path("Other", "1");
        let node = raw.get_path("IntOption").unwrap();

        let detached = raw.detach(node).unwrap();
        assert_eq!(detached.value(detached.root()), Some("0"));
        assert_eq!(detached.name(detached.root()), "IntOption");
        assert!(detached.parent(detached.root()).is_none());
        assert!(raw.get_path("IntOption").is_none());
        assert_eq!(raw.sub_items(raw.root()), vec!["Other"]);
        assert!(!raw.contains(node));
        assert!(raw.check_invariants());
    }

    #[test]
    fn test_detach_root_is_none() {
        let mut raw = sample();
        let root = raw.root();
        assert!(raw.detach(root).is_none());
        assert_eq!(raw.value_by_path("A/B"), Some("1"));
    }

    #[test]
    fn test_detach_keeps_subtree() {
        let mut raw = sample();
        let a = raw.get_path("A").unwrap();
        let detached = raw.root_mut().child("A").detach().unwrap();
        assert!(!raw.contains(a));
        assert_eq!(detached.value_by_path("B"), Some("1"));
        assert_eq!(detached.value_by_path("C"), Some("2"));
        assert!(detached.check_invariants());
    }

    #[test]
    fn test_remove_all_releases_nodes() {
        let mut raw = sample();
        let root = raw.root();
        raw.remove_all(root);
        assert!(raw.is_empty());
        assert_eq!(raw.len(), 1);

        // Freed slots are reused without reviving stale ids.
        let b = raw.entry_path("B");
        assert!(raw.contains(b));
        assert_eq!(raw.len(), 2);
    }

    #[test]
    fn test_stale_id_not_revived_by_reuse() {
        let mut raw = RawConfig::new();
        let old = raw.entry_path("Old");
        raw.remove(raw.root(), "Old");
        let new = raw.entry_path("New");
        assert!(!raw.contains(old));
        assert!(raw.contains(new));
    }

    // ── Equality ───────────────────────────────────────────────

    #[test]
    fn test_equality_ignores_names_and_order() {
        let mut left = RawConfig::named("left");
        left.set_value_by_path("X", "1");
        left.set_value_by_path("Y", "2");

        let mut right = RawConfig::named("right");
        right.set_value_by_path("Y", "2");
        right.set_value_by_path("X", "1");

        assert_eq!(left, right);
    }

    #[test]
    fn test_equality_distinguishes_absent_and_empty_values() {
        let mut left = RawConfig::new();
        left.entry_path("X");
        let mut right = RawConfig::new();
        right.set_value_by_path("X", "");
        assert_ne!(left, right);
    }

    #[test]
    fn test_equality_ignores_tags_and_comments() {
        let mut left = RawConfig::new();
        left.set_value_by_path("Sub/X", "1");
        let sub = left.get_path("Sub").unwrap();
        left.set_type_tag(sub, "T");
        let mut right = RawConfig::new();
        right.set_value_by_path("Sub/X", "1");
        let x = right.get_path("Sub/X").unwrap();
        right.set_comment(x, "a comment");
        assert_eq!(left, right);
    }

    // ── Rendering ──────────────────────────────────────────────

    #[test]
    fn test_display() {
        let raw = sample();
        assert_eq!(raw.to_string(), "{A{B=1, C=2}}");
    }

    #[test]
    fn test_json_export() {
        let mut raw = sample();
        raw.set_value_by_path("A", "top");
        let json: serde_json::Value = serde_json::from_str(&raw.to_json().unwrap()).unwrap();
        assert_eq!(json["A"]["$value"], "top");
        assert_eq!(json["A"]["B"], "1");
        assert_eq!(json["A"]["C"], "2");
    }

    // ── I18nString ─────────────────────────────────────────────

    #[test]
    fn test_i18n_match() {
        let mut s = I18nString::new();
        s.set_fallback("ABCD");
        s.set("A", "zh_CN");
        assert_eq!(s.match_locale(""), "ABCD");
        assert_eq!(s.match_locale("zh_CN"), "A");
        assert_eq!(s.match_locale("fr_FR"), "ABCD");
        // No prefix negotiation.
        assert_eq!(s.match_locale("zh"), "ABCD");
    }

    #[test]
    fn test_i18n_without_fallback() {
        let mut s = I18nString::new();
        s.set("Bonjour", "fr_FR");
        assert_eq!(s.match_locale("fr_FR"), "Bonjour");
        assert_eq!(s.match_locale("de_DE"), "");
        assert!(s.fallback().is_none());
        assert_eq!(s.localized().collect::<Vec<_>>(), vec![("fr_FR", "Bonjour")]);
    }

    #[test]
    fn test_i18n_serde_roundtrip() {
        let mut s = I18nString::with_fallback("Hello");
        s.set("Hallo", "de_DE");
        let json = serde_json::to_string(&s).unwrap();
        let restored: I18nString = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, s);
    }

    // ── Error tests ────────────────────────────────────────────

    #[test]
    fn test_error_display() {
        let err = ArborError::Config("bad value".into());
        assert!(err.to_string().contains("bad value"));
        let err = ArborError::NotFound("/tmp/x.conf".into());
        assert!(err.to_string().contains("/tmp/x.conf"));
    }

    #[test]
    fn test_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: ArborError = io.into();
        assert!(matches!(err, ArborError::Io(_)));
    }
}
