//! Property-based tests for cache keys and defaults merging.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use std::collections::BTreeMap;

    use crate::cache::CacheKey;
    use crate::defaults::PROTOCOLS;
    use crate::merge::{apply_defaults, MergeDocument, Node, Scalar, CONFIG_SCOPE, DEFAULTS_SCOPE};
    use proptest::prelude::*;

    fn defaults_doc(data: Node) -> MergeDocument {
        let mut root = BTreeMap::new();
        root.insert("data".to_string(), data);
        MergeDocument::new(Node::Mapping(root), DEFAULTS_SCOPE)
    }

    fn config_doc(distribution: Node) -> MergeDocument {
        let mut spec = BTreeMap::new();
        spec.insert("distribution".to_string(), distribution);
        let mut root = BTreeMap::new();
        root.insert("kind".to_string(), Node::string("EKSCluster"));
        root.insert("spec".to_string(), Node::Mapping(spec));
        MergeDocument::new(Node::Mapping(root), CONFIG_SCOPE)
    }

    fn int_mapping(values: &BTreeMap<String, i64>) -> Node {
        Node::Mapping(
            values
                .iter()
                .map(|(k, v)| (k.clone(), Node::Scalar(Scalar::Integer(*v))))
                .collect(),
        )
    }

    fn distribution(doc: &MergeDocument) -> Node {
        doc.scoped().unwrap().cloned().unwrap_or_default()
    }

    fn leaf() -> impl Strategy<Value = Node> {
        prop_oneof![
            any::<i64>().prop_map(|v| Node::Scalar(Scalar::Integer(v))),
            "[a-z]{0,6}".prop_map(Node::string),
            prop::collection::vec(any::<i64>(), 0..3)
                .prop_map(|values| Node::Sequence(values.into_iter().map(|v| Node::Scalar(Scalar::Integer(v))).collect())),
        ]
    }

    /// Mappings nested up to three levels over a small key alphabet, so the
    /// generated defaults and user trees collide often.
    fn tree() -> impl Strategy<Value = Node> {
        leaf().prop_recursive(3, 32, 4, |inner| {
            prop::collection::btree_map("[a-d]", inner, 0..4).prop_map(Node::Mapping)
        })
    }

    fn mapping_tree() -> impl Strategy<Value = Node> {
        prop::collection::btree_map("[a-d]", tree(), 0..4).prop_map(Node::Mapping)
    }

    /// Reference overlay: mappings merge key by key, anything else from
    /// `user` replaces what `base` holds.
    fn overlay(base: &Node, user: &Node) -> Node {
        match (base, user) {
            (Node::Mapping(base_map), Node::Mapping(user_map)) => {
                let mut merged = base_map.clone();
                for (key, value) in user_map {
                    let next = match base_map.get(key) {
                        Some(existing) => overlay(existing, value),
                        None => value.clone(),
                    };
                    merged.insert(key.clone(), next);
                }
                Node::Mapping(merged)
            }
            (_, user) => user.clone(),
        }
    }

    // ============================================================================
    // CacheKey property tests
    // ============================================================================

    proptest! {
        /// Property: every protocol prefix maps to the same cache entry
        #[test]
        fn cache_key_ignores_protocol_prefix(
            address in "[a-z]{1,12}\\.com/[a-z0-9-]{1,12}(\\?ref=v[0-9]\\.[0-9])?",
            idx in 0..PROTOCOLS.len(),
        ) {
            let prefixed = format!("{}{}", PROTOCOLS[idx], address);
            prop_assert_eq!(CacheKey::for_source(&prefixed), CacheKey::for_source(&address));
        }

        /// Property: keys always parse back as valid keys
        #[test]
        fn cache_key_is_hex_digest(src in ".*") {
            let key = CacheKey::for_source(&src);
            prop_assert_eq!(key.as_str().len(), 64);
            prop_assert_eq!(CacheKey::parse(key.as_str()), Some(key));
        }
    }

    // ============================================================================
    // apply_defaults property tests
    // ============================================================================

    proptest! {
        /// Property: user values win, defaults fill everything else
        #[test]
        fn user_values_take_precedence(
            defaults in prop::collection::btree_map("[a-z]{1,6}", any::<i64>(), 0..8),
            user in prop::collection::btree_map("[a-z]{1,6}", any::<i64>(), 0..8),
        ) {
            let result = apply_defaults(&defaults_doc(int_mapping(&defaults)), &config_doc(int_mapping(&user))).unwrap();

            let mut expected = defaults.clone();
            expected.extend(user.clone());
            prop_assert_eq!(distribution(&result), int_mapping(&expected));
        }

        /// Property: precedence holds at every depth, and a user value of a
        /// different type replaces the default outright
        #[test]
        fn nested_user_values_take_precedence(
            defaults in mapping_tree(),
            user in mapping_tree(),
        ) {
            let result = apply_defaults(&defaults_doc(defaults.clone()), &config_doc(user.clone())).unwrap();

            prop_assert_eq!(distribution(&result), overlay(&defaults, &user));
        }

        /// Property: a user sequence replaces the default sequence wholesale
        #[test]
        fn sequences_are_replaced_not_concatenated(
            defaults in prop::collection::vec(any::<i64>(), 0..6),
            user in prop::collection::vec(any::<i64>(), 1..6),
        ) {
            let to_seq = |values: &[i64]| Node::Sequence(values.iter().map(|v| Node::Scalar(Scalar::Integer(*v))).collect());
            let mut data = BTreeMap::new();
            data.insert("items".to_string(), to_seq(&defaults));
            let mut dist = BTreeMap::new();
            dist.insert("items".to_string(), to_seq(&user));

            let result = apply_defaults(&defaults_doc(Node::Mapping(data)), &config_doc(Node::Mapping(dist))).unwrap();

            let items = distribution(&result).as_mapping().and_then(|m| m.get("items").cloned());
            prop_assert_eq!(items, Some(to_seq(&user)));
        }

        /// Property: defaulting leaves everything outside the scope untouched
        #[test]
        fn nodes_outside_scope_are_preserved(
            defaults in prop::collection::btree_map("[a-z]{1,6}", any::<i64>(), 0..8),
        ) {
            let config = config_doc(Node::empty_mapping());
            let result = apply_defaults(&defaults_doc(int_mapping(&defaults)), &config).unwrap();

            let kind = result.root().as_mapping().and_then(|m| m.get("kind").cloned());
            prop_assert_eq!(kind, Some(Node::string("EKSCluster")));
            prop_assert!(result.root().as_mapping().is_some_and(|m| !m.contains_key("data")));
        }
    }
}
