//! Property-based tests for the persist module.
//!
//! Arbitrary forests must survive every format unchanged, and any prefix of
//! an encoded stream must decode to a prefix of the forest without panicking.

use proptest::collection::vec as prop_vec;
use proptest::prelude::*;
use proptest::sample::Index;

use icboost::persist::{binary, schema, text};
use icboost::{Forest, Node, NodeStats, Tree};

// =============================================================================
// Arbitrary Forest Generators
// =============================================================================

/// Strategy for finite f64 values.
fn arb_finite_f64() -> impl Strategy<Value = f64> {
    prop::num::f64::ANY
        .prop_filter("must be finite", |x| x.is_finite())
        .prop_map(|x| x.clamp(-1e12, 1e12))
}

fn arb_stats() -> impl Strategy<Value = NodeStats> {
    (
        arb_finite_f64(),
        arb_finite_f64(),
        arb_finite_f64(),
        0.0..=1.0f64,
        arb_finite_f64(),
        0usize..1_000_000,
    )
        .prop_map(
            |(prediction, train_loss, local_optimism, prob_node, crt, n_obs)| NodeStats {
                prediction,
                train_loss,
                local_optimism,
                prob_node,
                crt,
                n_obs,
            },
        )
}

fn arb_node() -> impl Strategy<Value = Node> {
    arb_stats().prop_map(Node::leaf).prop_recursive(6, 48, 2, |inner| {
        (arb_stats(), 0usize..16, arb_finite_f64(), inner.clone(), inner)
            .prop_map(|(stats, feature, threshold, left, right)| {
                Node::split(stats, feature, threshold, left, right)
            })
    })
}

fn arb_forest() -> impl Strategy<Value = Forest> {
    prop_vec(arb_node().prop_map(Tree::from_root), 0..6).prop_map(Forest::from_trees)
}

// =============================================================================
// Round-Trip Property Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Binary round-trip is bit-exact.
    #[test]
    fn binary_roundtrip(forest in arb_forest()) {
        let bytes = binary::to_bytes(&forest).unwrap();
        let (loaded, report) = binary::from_bytes(&bytes).unwrap();
        prop_assert!(report.is_complete());
        prop_assert_eq!(report.trees, forest.n_trees());
        prop_assert_eq!(loaded, forest);
    }

    /// Text round-trip reproduces every float.
    #[test]
    fn text_roundtrip(forest in arb_forest()) {
        let encoded = text::to_string(&forest).unwrap();
        let (loaded, report) = text::from_str(&encoded);
        prop_assert!(report.is_complete());
        prop_assert_eq!(loaded, forest);
    }

    /// JSON round-trip reproduces every float.
    #[test]
    fn json_roundtrip(forest in arb_forest()) {
        let json = schema::to_json_string(&forest).unwrap();
        let loaded = schema::from_json_str(&json).unwrap();
        prop_assert_eq!(loaded, forest);
    }

    /// The read report counts every node written.
    #[test]
    fn node_counts_are_consistent(forest in arb_forest()) {
        let total: usize = forest.iter().map(Tree::n_nodes).sum();
        let (_, report) = binary::from_bytes(&binary::to_bytes(&forest).unwrap()).unwrap();
        prop_assert_eq!(report.nodes, total);
    }
}

// =============================================================================
// Truncation Property Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    /// Any binary prefix past the header decodes to a prefix of the forest.
    #[test]
    fn binary_prefix_yields_prefix(forest in arb_forest(), cut in any::<Index>()) {
        let bytes = binary::to_bytes(&forest).unwrap();
        let len = binary::HEADER_SIZE + cut.index(bytes.len() - binary::HEADER_SIZE);
        let (loaded, report) = binary::from_bytes(&bytes[..len]).unwrap();

        prop_assert!(!report.is_complete());
        prop_assert!(loaded.n_trees() <= forest.n_trees());
        prop_assert_eq!(loaded.trees(), &forest.trees()[..loaded.n_trees()]);
    }

    /// Any text prefix decodes to a prefix of the forest.
    #[test]
    fn text_prefix_yields_prefix(forest in arb_forest(), cut in any::<Index>()) {
        let encoded = text::to_string(&forest).unwrap();
        let len = cut.index(encoded.len());
        let (loaded, _) = text::from_str(&encoded[..len]);

        prop_assert!(loaded.n_trees() <= forest.n_trees());
        prop_assert_eq!(loaded.trees(), &forest.trees()[..loaded.n_trees()]);
    }

    /// Arbitrary bytes behind a valid header never panic the reader.
    #[test]
    fn binary_garbage_never_panics(body in prop_vec(any::<u8>(), 0..512)) {
        let mut bytes = binary::FormatHeader::current().to_bytes().to_vec();
        bytes.extend_from_slice(&body);
        let (forest, report) = binary::from_bytes(&bytes).unwrap();
        prop_assert!(forest.n_trees() <= report.trees);
    }
}
