use clap::Args;
use tracing::debug;

use crate::ark::address::ArkAddress;
use crate::disasm;
use crate::errors::AppResult;
use crate::render::Styles;

/// Decode a bech32m-encoded Ark address
#[derive(Args)]
pub struct AddressCommand {
    /// Ark address ("ark1..." on mainnet, "tark1..." elsewhere)
    pub address: String,
}

impl AddressCommand {
    pub fn run(&self) -> AppResult<()> {
        let decoded = ArkAddress::decode(&self.address)?;
        debug!(
            "decoded version {} address with HRP {}",
            decoded.version, decoded.hrp
        );

        print!("{}", render_address(&self.address, &decoded, &Styles::auto()));
        Ok(())
    }
}

/// Formats the address report: the address itself, its envelope fields, the
/// embedded public keys and the taproot output script they commit to.
pub fn render_address(address: &str, decoded: &ArkAddress, styles: &Styles) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "\n{}{}\n",
        styles.address_label("Address:"),
        styles.value(address)
    ));
    out.push_str(&format!(
        "{}{}  {}{}\n",
        styles.label("Version:"),
        styles.value(&decoded.version.to_string()),
        styles.label("HRP:"),
        styles.value(&decoded.hrp.to_string())
    ));

    out.push_str(&format!("{}\n", styles.section("Public Keys:")));
    let keys = [("signer:", decoded.signer), ("tapkey:", decoded.vtxo_tap_key)];
    for (label, key) in keys {
        let rendered = match key {
            Some(key) => hex::encode(key.serialize()),
            None => "<none>".to_string(),
        };
        out.push_str(&format!(
            "{}{}\n",
            styles.sub_label(label),
            styles.value(&rendered)
        ));
    }

    // The output script requires the VTXO taproot key, which unknown address
    // versions may not carry.
    if let Ok(pk_script) = decoded.pk_script() {
        out.push_str(&format!("{}\n", styles.section("Script:")));
        out.push_str(&format!(
            "{}{}\n",
            styles.sub_label("hex:"),
            styles.value(&hex::encode(pk_script.as_bytes()))
        ));
        if let Ok(asm) = disasm::disassemble(&pk_script) {
            out.push_str(&format!(
                "{}{}\n",
                styles.sub_label("asm:"),
                styles.value(&asm)
            ));
        }
    }

    out
}
