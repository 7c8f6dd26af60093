use bitcoin::ScriptBuf;
use clap::Args;
use tracing::debug;

use crate::ark::script::Closure;
use crate::disasm;
use crate::errors::AppResult;
use crate::render::{render_closure, Styles};

/// Disassemble a tapscript and classify its spending closure
#[derive(Args)]
pub struct ScriptCommand {
    /// Hex-encoded tapscript
    pub script: String,
}

impl ScriptCommand {
    pub fn run(&self) -> AppResult<()> {
        let bytes = hex::decode(&self.script)?;
        let script = ScriptBuf::from_bytes(bytes);

        // Disassembly and classification walk the same tokens, so a script
        // that fails one fails the other.
        let asm = disasm::disassemble(&script)?;
        let closure = Closure::decode(&script)?;
        debug!("classified script as {}", closure.name());

        print!("{}", render_script(&asm, &closure, &Styles::auto()));
        Ok(())
    }
}

/// Formats the script report: the assembly line first, then the closure
/// breakdown under its own header.
pub fn render_script(asm: &str, closure: &Closure, styles: &Styles) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}{}\n", styles.sub_label("asm:"), styles.value(asm)));
    out.push_str(&styles.section("\nClosure: "));
    out.push_str(&render_closure(closure, styles));
    out
}
