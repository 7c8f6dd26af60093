use bitcoin::ScriptBuf;
use clap::{Args, Subcommand};
use tracing::debug;

use crate::ark::taptree::TapTree;
use crate::disasm;
use crate::errors::{AppError, AppResult};
use crate::render::Styles;

/// Inspect or build VTXO taptree blobs
#[derive(Args)]
pub struct TaptreeCommand {
    #[command(subcommand)]
    pub command: TaptreeCommands,
}

/// Taptree subcommands
#[derive(Subcommand)]
pub enum TaptreeCommands {
    /// Decode a taptree blob into its leaf scripts
    Decode {
        /// Hex-encoded taptree blob
        blob: String,
    },
    /// Encode leaf scripts into a taptree blob
    Encode {
        /// Hex-encoded leaf scripts, in leaf order
        #[arg(required = true)]
        scripts: Vec<String>,
    },
}

impl TaptreeCommand {
    pub fn run(&self) -> AppResult<()> {
        match &self.command {
            TaptreeCommands::Decode { blob } => {
                let bytes = hex::decode(blob)?;
                let tree = TapTree::decode(&bytes)?;
                debug!("decoded taptree with {} leaves", tree.leaves.len());
                let report = render_decoded_tree(&tree, &Styles::auto())?;
                print!("{}", report);
            }
            TaptreeCommands::Encode { scripts } => {
                let tree = parse_leaf_scripts(scripts)?;
                debug!("encoding taptree with {} leaves", tree.leaves.len());
                print!("{}", render_encoded_tree(&tree, &Styles::auto()));
            }
        }
        Ok(())
    }
}

fn parse_leaf_scripts(scripts: &[String]) -> AppResult<TapTree> {
    let mut leaves = Vec::with_capacity(scripts.len());
    for (index, script) in scripts.iter().enumerate() {
        let bytes =
            hex::decode(script).map_err(|source| AppError::LeafScript { index, source })?;
        leaves.push(ScriptBuf::from_bytes(bytes));
    }
    Ok(TapTree::new(leaves))
}

/// Formats the decode report: every leaf script, then the taproot output
/// script the tree commits to. Fails before printing anything if the tree
/// cannot produce an output key.
pub fn render_decoded_tree(tree: &TapTree, styles: &Styles) -> AppResult<String> {
    let mut out = String::new();

    out.push_str(&format!("{}\n", styles.section("TapTree Scripts:")));
    render_leaves(&mut out, tree, styles);

    let pk_script = tree.pk_script()?;
    out.push_str(&format!("{}\n", styles.section("PkScript:")));
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

    Ok(out)
}

/// Formats the encode report: the leaf scripts as parsed, then the blob.
pub fn render_encoded_tree(tree: &TapTree, styles: &Styles) -> String {
    let mut out = String::new();

    out.push_str(&format!("{}\n", styles.section("Input Scripts:")));
    render_leaves(&mut out, tree, styles);

    out.push_str(&format!("{}\n", styles.section("Encoded TapTree:")));
    out.push_str(&format!(
        "{}{}\n",
        styles.sub_label("hex:"),
        styles.value(&hex::encode(tree.encode()))
    ));

    out
}

fn render_leaves(out: &mut String, tree: &TapTree, styles: &Styles) {
    for (index, leaf) in tree.leaves.iter().enumerate() {
        out.push_str(&format!("{}\n", styles.sub_label(&format!("[{}]:", index))));
        out.push_str(&format!(
            "{}{}\n",
            styles.sub_label("  hex:"),
            styles.value(&hex::encode(leaf.as_bytes()))
        ));
        if let Ok(asm) = disasm::disassemble(leaf) {
            out.push_str(&format!(
                "{}{}\n",
                styles.sub_label("  asm:"),
                styles.value(&asm)
            ));
        }
    }
}
