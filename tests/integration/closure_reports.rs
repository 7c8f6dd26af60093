//! Closure Classification Reports
//!
//! Runs the script pipeline the way the CLI does: hex in, disassembly,
//! closure classification, rendered report out.

use bitcoin::absolute::LockTime;
use bitcoin::ScriptBuf;

use ark_inspect::ark::locktime::{RelativeLocktime, RelativeLocktimeType};
use ark_inspect::ark::script::{
    Closure, ClosureError, CltvMultisigClosure, ConditionCsvMultisigClosure,
    ConditionMultisigClosure, CsvMultisigClosure, MultisigClosure, MultisigType,
};
use ark_inspect::disasm;
use ark_inspect::render::{render_closure, Styles};

use crate::common::{multisig, test_keys, KEY_HEX};

fn classify_hex(script_hex: &str) -> Result<Closure, ClosureError> {
    let bytes = hex::decode(script_hex).expect("test scripts are valid hex");
    Closure::decode(&ScriptBuf::from_bytes(bytes))
}

fn round_trip(closure: Closure) -> Closure {
    let script = closure.script().expect("closure should encode");
    let decoded = classify_hex(&hex::encode(script.as_bytes())).expect("script should classify");
    assert_eq!(decoded, closure, "decode must invert encode");
    decoded
}

#[test]
fn multisig_checksig_round_trip() {
    for count in 1..=4 {
        let closure = round_trip(Closure::Multisig(multisig(count)));
        assert_eq!(closure.name(), "MultisigClosure");
    }
}

#[test]
fn multisig_checksigadd_round_trip() {
    let closure = Closure::Multisig(MultisigClosure {
        pubkeys: test_keys(3).into_iter().map(Some).collect(),
        sig_type: MultisigType::ChecksigAdd,
    });
    let script = closure.script().expect("closure should encode");
    let asm = disasm::disassemble(&script).expect("script should disassemble");
    assert!(asm.contains("OP_CHECKSIGADD"));
    assert!(asm.ends_with("OP_PUSHNUM_3 OP_NUMEQUAL"));
    round_trip(closure);
}

#[test]
fn checksigadd_count_mismatch_is_unknown() {
    // 3 keys but a trailing count of 2
    let keys = test_keys(3);
    let mut script = Vec::new();
    for (index, key) in keys.iter().enumerate() {
        script.push(0x20);
        script.extend_from_slice(&key.x_only_public_key().0.serialize());
        script.push(if index == 0 { 0xac } else { 0xba });
    }
    script.push(0x52); // OP_PUSHNUM_2
    script.push(0x9c); // OP_NUMEQUAL
    assert!(matches!(
        classify_hex(&hex::encode(script)),
        Err(ClosureError::UnknownClosure)
    ));
}

#[test]
fn cltv_round_trip_both_thresholds() {
    for height in [144u32, 499_999_999, 500_000_000] {
        let closure = Closure::CltvMultisig(CltvMultisigClosure {
            locktime: LockTime::from_consensus(height),
            multisig: multisig(2),
        });
        assert_eq!(round_trip(closure).name(), "CLTVMultisigClosure");
    }
}

#[test]
fn csv_round_trip_blocks_and_seconds() {
    let cases = [
        (RelativeLocktimeType::Blocks, 144),
        (RelativeLocktimeType::Seconds, 512 * 6),
    ];
    for (kind, value) in cases {
        let closure = Closure::CsvMultisig(CsvMultisigClosure {
            locktime: RelativeLocktime { kind, value },
            multisig: multisig(2),
        });
        assert_eq!(round_trip(closure).name(), "CSVMultisigClosure");
    }
}

#[test]
fn condition_round_trip() {
    let condition = ScriptBuf::from_bytes(vec![0x51]); // OP_TRUE
    let closure = Closure::ConditionMultisig(ConditionMultisigClosure {
        condition: condition.clone(),
        multisig: multisig(2),
    });
    assert_eq!(round_trip(closure).name(), "ConditionMultisigClosure");

    let closure = Closure::ConditionCsvMultisig(ConditionCsvMultisigClosure {
        condition,
        csv: CsvMultisigClosure {
            locktime: RelativeLocktime {
                kind: RelativeLocktimeType::Blocks,
                value: 64,
            },
            multisig: multisig(1),
        },
    });
    assert_eq!(round_trip(closure).name(), "ConditionCSVMultisigClosure");
}

#[test]
fn note_scripts_classify_by_preimage_hash() {
    let digest = [0xab_u8; 32];
    let mut script = vec![0xa8, 0x20]; // OP_SHA256 <32 bytes>
    script.extend_from_slice(&digest);
    script.push(0x87); // OP_EQUAL
    let closure = classify_hex(&hex::encode(&script)).expect("note script classifies");
    assert_eq!(closure.name(), "NoteClosure");

    let report = render_closure(&closure, &Styles::plain());
    assert!(
        report.contains(&hex::encode(digest)),
        "report must show the preimage hash"
    );
}

#[test]
fn rendered_reports_name_every_key() {
    let closure = Closure::Multisig(multisig(3));
    let report = render_closure(&closure, &Styles::plain());
    for key in KEY_HEX.iter().take(3) {
        assert!(
            report.contains(&format!("02{}", key)),
            "report must list key {}",
            key
        );
    }
}

#[test]
fn locktime_values_render_in_reports() {
    let closure = Closure::CltvMultisig(CltvMultisigClosure {
        locktime: LockTime::from_consensus(832_000),
        multisig: multisig(1),
    });
    let report = render_closure(&closure, &Styles::plain());
    assert!(report.contains("Locktime:"));
    assert!(report.contains("    Type: Blocks"));
    assert!(report.contains("    Value: 832000"));

    let closure = Closure::CsvMultisig(CsvMultisigClosure {
        locktime: RelativeLocktime {
            kind: RelativeLocktimeType::Seconds,
            value: 1024,
        },
        multisig: multisig(1),
    });
    let report = render_closure(&closure, &Styles::plain());
    assert!(report.contains("    Type: Seconds"));
    assert!(report.contains("    Value: 1024"));
}

#[test]
fn garbage_scripts_do_not_classify() {
    // Empty script, bare OP_0, bare OP_RETURN
    for script_hex in ["", "00", "6a"] {
        assert!(
            matches!(classify_hex(script_hex), Err(ClosureError::UnknownClosure)),
            "script {:?} must not classify",
            script_hex
        );
    }
}

#[test]
fn truncated_push_reports_malformed() {
    // 0x20 announces a 32-byte push with no payload behind it
    assert!(matches!(
        classify_hex("20"),
        Err(ClosureError::Malformed(_))
    ));
}
