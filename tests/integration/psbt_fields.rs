//! Ark PSBT Field Round Trips
//!
//! Attaches every Ark proprietary field to a PSBT input, pushes it through
//! PSBT serialisation and checks both the getters and the rendered report.

use bitcoin::absolute::LockTime;
use bitcoin::hashes::Hash;
use bitcoin::transaction::Version;
use bitcoin::{
    Amount, OutPoint, Psbt, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Txid, Witness,
};

use ark_inspect::ark::locktime::{RelativeLocktime, RelativeLocktimeType};
use ark_inspect::ark::psbt as ark_psbt;
use ark_inspect::ark::taptree::TapTree;
use ark_inspect::cli::commands::psbt::render_psbt;
use ark_inspect::render::Styles;

use crate::common::{multisig, test_keys};

fn unsigned_psbt() -> Psbt {
    let tx = Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: vec![TxIn {
            previous_output: OutPoint::new(Txid::all_zeros(), 1),
            script_sig: ScriptBuf::new(),
            sequence: Sequence::MAX,
            witness: Witness::new(),
        }],
        output: vec![TxOut {
            value: Amount::from_sat(21_000),
            script_pubkey: ScriptBuf::from_bytes(vec![0x51]),
        }],
    };
    Psbt::from_unsigned_tx(tx).expect("unsigned tx should convert")
}

#[test]
fn all_field_kinds_survive_psbt_serialisation() {
    let mut psbt = unsigned_psbt();
    let keys = test_keys(3);
    let tree = TapTree::new(vec![multisig(2).script().expect("closure should encode")]);
    let expiry = RelativeLocktime {
        kind: RelativeLocktimeType::Seconds,
        value: 512 * 10,
    };

    {
        let input = &mut psbt.inputs[0];
        ark_psbt::push_condition_witness(
            input,
            &Witness::from_slice(&[b"preimage".as_slice(), b"extra".as_slice()]),
        );
        for (index, key) in keys.iter().enumerate() {
            ark_psbt::push_cosigner_key(input, index as u8, key);
        }
        ark_psbt::push_vtxo_taproot_tree(input, &tree);
        ark_psbt::push_vtxo_tree_expiry(input, expiry).expect("expiry should encode");
    }

    let restored =
        Psbt::deserialize(&psbt.serialize()).expect("serialised PSBT should deserialise");
    let input = &restored.inputs[0];

    let witnesses = ark_psbt::condition_witnesses(input).expect("witness field decodes");
    assert_eq!(witnesses.len(), 1);
    assert_eq!(witnesses[0].len(), 2);
    assert_eq!(witnesses[0].iter().next(), Some(b"preimage".as_slice()));

    let cosigners = ark_psbt::cosigner_keys(input).expect("cosigner field decodes");
    assert_eq!(cosigners.len(), 3);
    for (index, cosigner) in cosigners.iter().enumerate() {
        assert_eq!(cosigner.index as usize, index);
        assert_eq!(cosigner.key, keys[index]);
    }

    let trees = ark_psbt::vtxo_taproot_trees(input).expect("taptree field decodes");
    assert_eq!(trees, vec![tree]);

    let expiries = ark_psbt::vtxo_tree_expiries(input).expect("expiry field decodes");
    assert_eq!(expiries, vec![expiry]);
}

#[test]
fn report_renders_fields_after_round_trip() {
    let mut psbt = unsigned_psbt();
    ark_psbt::push_cosigner_key(&mut psbt.inputs[0], 0, &test_keys(1)[0]);

    let restored =
        Psbt::deserialize(&psbt.serialize()).expect("serialised PSBT should deserialise");
    let report = render_psbt(&restored, &Styles::plain());

    assert!(report.contains("      ARK PSBT Fields: \n"));
    assert!(report.contains("        CosignerPublicKey: \n"));
    assert!(report.contains("            Index: 0\n"));
}

#[test]
fn unrelated_proprietary_fields_are_ignored() {
    use bitcoin::psbt::raw::ProprietaryKey;

    let mut psbt = unsigned_psbt();
    psbt.inputs[0].proprietary.insert(
        ProprietaryKey {
            prefix: b"other".to_vec(),
            subtype: 0x00,
            key: vec![0x00],
        },
        vec![0xde, 0xad],
    );

    let input = &psbt.inputs[0];
    assert!(ark_psbt::condition_witnesses(input)
        .expect("foreign prefixes are not ark fields")
        .is_empty());
}

#[test]
fn corrupt_field_payloads_error_without_poisoning_others() {
    use bitcoin::psbt::raw::ProprietaryKey;

    let mut psbt = unsigned_psbt();
    ark_psbt::push_cosigner_key(&mut psbt.inputs[0], 0, &test_keys(1)[0]);
    // 20 bytes is neither a 32 nor a 33 byte public key
    psbt.inputs[0].proprietary.insert(
        ProprietaryKey {
            prefix: b"ark".to_vec(),
            subtype: ark_psbt::SUBTYPE_COSIGNER_KEY,
            key: vec![0x09],
        },
        vec![0x02; 20],
    );

    let input = &psbt.inputs[0];
    assert!(ark_psbt::cosigner_keys(input).is_err());
    assert!(
        ark_psbt::condition_witnesses(input)
            .expect("witness field unaffected")
            .is_empty(),
        "corruption in one subtype must not leak into another"
    );
}
