//! One-line script disassembly
//!
//! Data pushes render as bare hex, the empty push as `OP_0`, opcodes by
//! their canonical names. Failing on a malformed push mirrors the
//! strictness of the consensus tokeniser; callers that treat disassembly
//! as optional simply drop the result.

use bitcoin::script::Instruction;
use bitcoin::Script;

/// Disassembly errors
#[derive(Debug, thiserror::Error)]
pub enum DisasmError {
    #[error("malformed script: {0}")]
    Malformed(#[from] bitcoin::script::Error),
}

/// Formats raw script bytes as a one-line mnemonic string.
pub fn disassemble(script: &Script) -> Result<String, DisasmError> {
    let mut parts = Vec::new();
    for instruction in script.instructions() {
        match instruction? {
            Instruction::PushBytes(push) if push.is_empty() => parts.push("OP_0".to_string()),
            Instruction::PushBytes(push) => parts.push(hex::encode(push.as_bytes())),
            Instruction::Op(op) => parts.push(format!("{:?}", op)),
        }
    }
    Ok(parts.join(" "))
}
