//! Taptree Blob Round Trips
//!
//! Builds trees from real closure scripts, encodes them to the wire blob
//! and checks the decode side reproduces both the leaves and the taproot
//! commitment.

use bitcoin::absolute::LockTime;

use ark_inspect::ark::script::{Closure, CltvMultisigClosure};
use ark_inspect::ark::taptree::{TapTree, TapTreeError};

use crate::common::multisig;

/// A typical VTXO tree: a forfeit path and an exit path.
fn sample_tree() -> TapTree {
    let forfeit = Closure::Multisig(multisig(2));
    let exit = Closure::CltvMultisig(CltvMultisigClosure {
        locktime: LockTime::from_consensus(800_000),
        multisig: multisig(1),
    });
    TapTree::new(vec![
        forfeit.script().expect("closure should encode"),
        exit.script().expect("closure should encode"),
    ])
}

#[test]
fn blob_round_trip_preserves_leaves_and_root() {
    let tree = sample_tree();
    let blob = tree.encode();
    let decoded = TapTree::decode(&blob).expect("blob should decode");

    assert_eq!(decoded, tree);
    assert_eq!(decoded.merkle_root(), tree.merkle_root());
    assert_eq!(
        decoded.pk_script().expect("script derives"),
        tree.pk_script().expect("script derives")
    );
}

#[test]
fn same_leaves_same_script() {
    // Key derivation must be deterministic for the tree to be auditable.
    let first = sample_tree().pk_script().expect("script derives");
    let second = sample_tree().pk_script().expect("script derives");
    assert_eq!(first, second);
}

#[test]
fn leaves_classify_after_round_trip() {
    let tree = sample_tree();
    let decoded = TapTree::decode(&tree.encode()).expect("blob should decode");

    let names: Vec<&str> = decoded
        .leaves
        .iter()
        .map(|leaf| Closure::decode(leaf).expect("leaf should classify").name())
        .collect();
    assert_eq!(names, ["MultisigClosure", "CLTVMultisigClosure"]);
}

#[test]
fn truncated_blob_reports_truncation() {
    let blob = sample_tree().encode();
    assert!(matches!(
        TapTree::decode(&blob[..blob.len() - 1]),
        Err(TapTreeError::Truncated) | Err(TapTreeError::LeafLength(_))
    ));
}

#[test]
fn foreign_leaf_version_rejected() {
    // depth 1, leaf version 0xc1 instead of tapscript's 0xc0
    let blob = [0x01, 0xc1, 0x01, 0x51];
    assert!(matches!(
        TapTree::decode(&blob),
        Err(TapTreeError::UnsupportedLeafVersion(0xc1))
    ));
}

#[test]
fn empty_tree_has_no_root_and_no_script() {
    let tree = TapTree::new(Vec::new());
    assert_eq!(tree.encode(), Vec::<u8>::new());
    assert!(tree.merkle_root().is_none());
    assert!(matches!(tree.pk_script(), Err(TapTreeError::Empty)));
}
