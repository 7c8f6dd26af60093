//! Closure report rendering
//!
//! The report opens with the variant name, then the embedded multisig keys
//! in input order, then any variant-specific fields. Rendering never fails:
//! unset key slots print a placeholder, a condition that will not
//! disassemble just loses its `asm:` line, and variants without a dedicated
//! layout fall through to a generic field dump.

use bitcoin::absolute;
use bitcoin::Script;

use crate::ark::locktime::RelativeLocktime;
use crate::ark::script::{Closure, MultisigClosure};
use crate::disasm;
use crate::render::Styles;

pub fn render_closure(closure: &Closure, styles: &Styles) -> String {
    let mut out = String::new();
    match closure {
        Closure::Multisig(multisig) => {
            out.push_str(&format!("{}\n", styles.value("MultisigClosure")));
            render_multisig(&mut out, multisig, styles);
        }
        Closure::CltvMultisig(closure) => {
            out.push_str(&format!("{}\n", styles.value("CLTVMultisigClosure")));
            render_multisig(&mut out, &closure.multisig, styles);
            out.push_str(&format!("{}\n", styles.section("Locktime:")));
            render_absolute_locktime(&mut out, closure.locktime, styles);
        }
        Closure::CsvMultisig(closure) => {
            out.push_str(&format!("{}\n", styles.value("CSVMultisigClosure")));
            render_multisig(&mut out, &closure.multisig, styles);
            out.push_str(&format!("{}\n", styles.section("Locktime:")));
            render_relative_locktime(&mut out, closure.locktime, styles);
        }
        Closure::ConditionMultisig(closure) => {
            out.push_str(&format!("{}\n", styles.value("ConditionMultisigClosure")));
            render_multisig(&mut out, &closure.multisig, styles);
            out.push_str(&format!("{}\n", styles.section("Condition:")));
            render_condition(&mut out, &closure.condition, styles);
        }
        Closure::ConditionCsvMultisig(closure) => {
            out.push_str(&format!("{}\n", styles.value("ConditionCSVMultisigClosure")));
            render_multisig(&mut out, &closure.csv.multisig, styles);
            out.push_str(&format!("{}\n", styles.section("Locktime:")));
            render_relative_locktime(&mut out, closure.csv.locktime, styles);
            out.push_str(&format!("{}\n", styles.section("Condition:")));
            render_condition(&mut out, &closure.condition, styles);
        }
        // Variants without a dedicated layout: name plus field dump
        other => {
            out.push_str(&format!("{}\n", styles.value(other.name())));
            out.push_str(&format!("{}\n", styles.value(&format!("{:?}", other))));
        }
    }
    out
}

fn render_multisig(out: &mut String, multisig: &MultisigClosure, styles: &Styles) {
    out.push_str(&format!("{}\n", styles.section("PubKeys:")));
    for (i, key) in multisig.pubkeys.iter().enumerate() {
        let rendered = match key {
            Some(key) => hex::encode(key.serialize()),
            None => "<none>".to_string(),
        };
        out.push_str(&format!(
            "{}{}\n",
            styles.sub_label(&format!("[{}]:", i)),
            styles.value(&rendered)
        ));
    }
}

fn render_absolute_locktime(out: &mut String, locktime: absolute::LockTime, styles: &Styles) {
    let kind = if locktime.is_block_time() { "Seconds" } else { "Blocks" };
    out.push_str(&format!("{}{}\n", styles.sub_label("Type:"), styles.value(kind)));
    out.push_str(&format!(
        "{}{}\n",
        styles.sub_label("Value:"),
        styles.value(&locktime.to_consensus_u32().to_string())
    ));
}

fn render_relative_locktime(out: &mut String, locktime: RelativeLocktime, styles: &Styles) {
    out.push_str(&format!(
        "{}{}\n",
        styles.sub_label("Type:"),
        styles.value(locktime.kind.as_str())
    ));
    out.push_str(&format!(
        "{}{}\n",
        styles.sub_label("Value:"),
        styles.value(&locktime.value.to_string())
    ));
}

fn render_condition(out: &mut String, condition: &Script, styles: &Styles) {
    out.push_str(&format!(
        "{}{}\n",
        styles.sub_label("hex:"),
        styles.value(&hex::encode(condition.as_bytes()))
    ));
    // Disassembly of the condition is best-effort
    if let Ok(asm) = disasm::disassemble(condition) {
        out.push_str(&format!("{}{}\n", styles.sub_label("asm:"), styles.value(&asm)));
    }
}
