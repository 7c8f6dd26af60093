use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bitcoin::bip32::{ChildNumber, DerivationPath, Fingerprint};
use bitcoin::psbt::{Input, Output, Psbt};
use bitcoin::secp256k1::PublicKey;
use clap::Args;
use tracing::debug;

use crate::ark::psbt as ark_psbt;
use crate::disasm;
use crate::errors::{AppError, AppResult};
use crate::render::Styles;

/// Decode a PSBT and its Ark proprietary fields
#[derive(Args)]
pub struct PsbtCommand {
    /// PSBT, base64 or hex encoded
    pub psbt: String,
}

impl PsbtCommand {
    pub fn run(&self) -> AppResult<()> {
        let bytes = decode_psbt_arg(&self.psbt)?;
        let psbt = Psbt::deserialize(&bytes)?;
        debug!(
            "parsed PSBT with {} inputs and {} outputs",
            psbt.inputs.len(),
            psbt.outputs.len()
        );

        print!("{}", render_psbt(&psbt, &Styles::auto()));
        Ok(())
    }
}

/// base64 is by far the more common PSBT wire encoding, so it is tried
/// first; hex is the fallback.
fn decode_psbt_arg(raw: &str) -> AppResult<Vec<u8>> {
    let trimmed = raw.trim();
    if let Ok(bytes) = STANDARD.decode(trimmed) {
        return Ok(bytes);
    }
    hex::decode(trimmed).map_err(|_| AppError::PsbtEncoding)
}

/// Formats the full PSBT report: the global transaction, then per-input and
/// per-output detail including any Ark proprietary fields.
pub fn render_psbt(psbt: &Psbt, styles: &Styles) -> String {
    let mut out = String::new();
    let tx = &psbt.unsigned_tx;

    out.push_str(&format!("\n{}\n", styles.section("Global:")));
    out.push_str(&format!(
        "{}{}\n",
        styles.sub_label("Version:"),
        styles.value(&tx.version.0.to_string())
    ));
    out.push_str(&format!(
        "{}{}\n",
        styles.sub_label("LockTime:"),
        styles.value(&tx.lock_time.to_consensus_u32().to_string())
    ));
    out.push_str(&format!(
        "{}{}\n",
        styles.sub_label("TxId:"),
        styles.value(&tx.compute_txid().to_string())
    ));

    out.push_str(&format!(
        "\n{}\n",
        styles.section(&format!("Inputs ({}):", tx.input.len()))
    ));
    for (index, (txin, input)) in tx.input.iter().zip(&psbt.inputs).enumerate() {
        out.push_str(&format!("{}\n", styles.sub_label(&format!("[{}]:", index))));
        out.push_str(&format!(
            "{}{}\n",
            styles.sub_label("  PreviousOutPoint:"),
            styles.value(&txin.previous_output.to_string())
        ));
        out.push_str(&format!(
            "{}{}\n",
            styles.sub_label("  Sequence:"),
            styles.value(&txin.sequence.0.to_string())
        ));
        render_input(&mut out, input, styles);
    }

    out.push_str(&format!(
        "\n{}\n",
        styles.section(&format!("Outputs ({}):", tx.output.len()))
    ));
    for (index, (txout, output)) in tx.output.iter().zip(&psbt.outputs).enumerate() {
        out.push_str(&format!("{}\n", styles.sub_label(&format!("[{}]:", index))));
        out.push_str(&format!(
            "{}{}\n",
            styles.sub_label("  Value:"),
            styles.value(&format!("{} sats", txout.value.to_sat()))
        ));
        out.push_str(&format!(
            "{}{}\n",
            styles.sub_label("  PkScript:"),
            styles.value(&hex::encode(txout.script_pubkey.as_bytes()))
        ));
        if let Ok(asm) = disasm::disassemble(&txout.script_pubkey) {
            out.push_str(&format!(
                "{}{}\n",
                styles.sub_label("  Script ASM:"),
                styles.value(&asm)
            ));
        }
        render_output(&mut out, output, styles);
    }

    out
}

fn render_input(out: &mut String, input: &Input, styles: &Styles) {
    if let Some(script) = &input.redeem_script {
        out.push_str(&format!(
            "{}{}\n",
            styles.sub_label("  RedeemScript:"),
            styles.value(&hex::encode(script.as_bytes()))
        ));
    }
    if let Some(script) = &input.witness_script {
        out.push_str(&format!(
            "{}{}\n",
            styles.sub_label("  WitnessScript:"),
            styles.value(&hex::encode(script.as_bytes()))
        ));
    }
    render_bip32_derivation(out, &input.bip32_derivation, styles);
    if input.non_witness_utxo.is_some() {
        out.push_str(&format!(
            "{}{}\n",
            styles.sub_label("  NonWitnessUtxo:"),
            styles.value("present")
        ));
    }
    if let Some(utxo) = &input.witness_utxo {
        out.push_str(&format!("{}\n", styles.sub_label("  WitnessUtxo:")));
        out.push_str(&format!(
            "{}{}\n",
            styles.sub_label("    Value:"),
            styles.value(&format!("{} sats", utxo.value.to_sat()))
        ));
        out.push_str(&format!(
            "{}{}\n",
            styles.sub_label("    PkScript:"),
            styles.value(&hex::encode(utxo.script_pubkey.as_bytes()))
        ));
    }
    render_ark_fields(out, input, styles);
}

fn render_output(out: &mut String, output: &Output, styles: &Styles) {
    if let Some(script) = &output.redeem_script {
        out.push_str(&format!(
            "{}{}\n",
            styles.sub_label("  RedeemScript:"),
            styles.value(&hex::encode(script.as_bytes()))
        ));
    }
    if let Some(script) = &output.witness_script {
        out.push_str(&format!(
            "{}{}\n",
            styles.sub_label("  WitnessScript:"),
            styles.value(&hex::encode(script.as_bytes()))
        ));
    }
    render_bip32_derivation(out, &output.bip32_derivation, styles);
}

fn render_bip32_derivation(
    out: &mut String,
    derivations: &BTreeMap<PublicKey, (Fingerprint, DerivationPath)>,
    styles: &Styles,
) {
    if derivations.is_empty() {
        return;
    }
    out.push_str(&format!("{}\n", styles.sub_label("  Bip32Derivation:")));
    for (index, (pubkey, (fingerprint, path))) in derivations.iter().enumerate() {
        out.push_str(&format!(
            "{}{}\n",
            styles.sub_label(&format!("    [{}] MasterFingerprint:", index)),
            styles.value(&fingerprint.to_string())
        ));
        out.push_str(&format!(
            "{}{}\n",
            styles.sub_label(&format!("    [{}] Path:", index)),
            styles.value(&format_bip32_path(path))
        ));
        out.push_str(&format!(
            "{}{}\n",
            styles.sub_label(&format!("    [{}] PubKey:", index)),
            styles.value(&hex::encode(pubkey.serialize()))
        ));
    }
}

fn format_bip32_path(path: &DerivationPath) -> String {
    let children: &[ChildNumber] = path.as_ref();
    if children.is_empty() {
        return "<empty>".to_string();
    }
    let mut rendered = String::from("m");
    for child in children {
        match child {
            ChildNumber::Normal { index } => rendered.push_str(&format!("/{}", index)),
            ChildNumber::Hardened { index } => rendered.push_str(&format!("/{}\"", index)),
        }
    }
    rendered
}

/// Ark proprietary fields of one input. A field group that fails to parse is
/// skipped rather than failing the whole report.
fn render_ark_fields(out: &mut String, input: &Input, styles: &Styles) {
    let mut header_done = false;

    match ark_psbt::condition_witnesses(input) {
        Ok(witnesses) if !witnesses.is_empty() => {
            ark_fields_header(out, &mut header_done, styles);
            out.push_str(&format!("{}\n", styles.sub_label("    ConditionWitness:")));
            for (index, witness) in witnesses.iter().enumerate() {
                out.push_str(&format!(
                    "{}\n",
                    styles.sub_label(&format!("      [{}]:", index))
                ));
                for (item_index, item) in witness.iter().enumerate() {
                    out.push_str(&format!(
                        "{}{}\n",
                        styles.sub_label(&format!("        [{}]:", item_index)),
                        styles.value(&hex::encode(item))
                    ));
                }
            }
        }
        Ok(_) => {}
        Err(err) => debug!("skipping condition witness fields: {}", err),
    }

    match ark_psbt::cosigner_keys(input) {
        Ok(keys) if !keys.is_empty() => {
            ark_fields_header(out, &mut header_done, styles);
            out.push_str(&format!("{}\n", styles.sub_label("    CosignerPublicKey:")));
            for (index, cosigner) in keys.iter().enumerate() {
                out.push_str(&format!(
                    "{}\n",
                    styles.sub_label(&format!("      [{}]:", index))
                ));
                out.push_str(&format!(
                    "{}{}\n",
                    styles.sub_label("        Index:"),
                    styles.value(&cosigner.index.to_string())
                ));
                out.push_str(&format!(
                    "{}{}\n",
                    styles.sub_label("        PublicKey:"),
                    styles.value(&hex::encode(cosigner.key.x_only_public_key().0.serialize()))
                ));
            }
        }
        Ok(_) => {}
        Err(err) => debug!("skipping cosigner key fields: {}", err),
    }

    match ark_psbt::vtxo_taproot_trees(input) {
        Ok(trees) if !trees.is_empty() => {
            ark_fields_header(out, &mut header_done, styles);
            out.push_str(&format!("{}\n", styles.sub_label("    VtxoTaprootTree:")));
            for (index, tree) in trees.iter().enumerate() {
                out.push_str(&format!(
                    "{}\n",
                    styles.sub_label(&format!("      [{}]:", index))
                ));
                for (leaf_index, leaf) in tree.leaves.iter().enumerate() {
                    out.push_str(&format!(
                        "{}{}\n",
                        styles.sub_label(&format!("        [{}]:", leaf_index)),
                        styles.value(&hex::encode(leaf.as_bytes()))
                    ));
                }
            }
        }
        Ok(_) => {}
        Err(err) => debug!("skipping vtxo taproot tree fields: {}", err),
    }

    match ark_psbt::vtxo_tree_expiries(input) {
        Ok(expiries) if !expiries.is_empty() => {
            ark_fields_header(out, &mut header_done, styles);
            out.push_str(&format!("{}\n", styles.sub_label("    VtxoTreeExpiry:")));
            for (index, expiry) in expiries.iter().enumerate() {
                out.push_str(&format!(
                    "{}\n",
                    styles.sub_label(&format!("      [{}]:", index))
                ));
                out.push_str(&format!(
                    "{}{}\n",
                    styles.sub_label("        Type:"),
                    styles.value(expiry.kind.as_str())
                ));
                out.push_str(&format!(
                    "{}{}\n",
                    styles.sub_label("        Value:"),
                    styles.value(&expiry.value.to_string())
                ));
            }
        }
        Ok(_) => {}
        Err(err) => debug!("skipping vtxo tree expiry fields: {}", err),
    }
}

fn ark_fields_header(out: &mut String, header_done: &mut bool, styles: &Styles) {
    if !*header_done {
        out.push_str(&format!("{}\n", styles.sub_label("  ARK PSBT Fields:")));
        *header_done = true;
    }
}
