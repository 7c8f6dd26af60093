//! Spending-condition closures and their tapscript grammars
//!
//! Each leaf of a VTXO taptree encodes one "closure": a way the off-chain
//! output can be spent. All closures bottom out in an all-of-N multisig over
//! x-only keys, optionally prefixed by a timelock check and/or an arbitrary
//! condition script terminated by `OP_VERIFY`.
//!
//! Decoding tries the grammars most-specific-first so that a multisig suffix
//! never shadows a longer match. The first grammar that matches wins; a
//! script matching none of them is an error.

use bitcoin::hashes::{sha256, Hash};
use bitcoin::opcodes::all::{
    OP_CHECKSIG, OP_CHECKSIGADD, OP_CHECKSIGVERIFY, OP_CLTV, OP_CSV, OP_DROP, OP_EQUAL,
    OP_NUMEQUAL, OP_SHA256, OP_VERIFY,
};
use bitcoin::opcodes::{Class, ClassifyContext, Opcode};
use bitcoin::script::{Builder, Instruction};
use bitcoin::secp256k1::{Parity, PublicKey, XOnlyPublicKey};
use bitcoin::{absolute, Script, ScriptBuf, Sequence};

use crate::ark::locktime::{LocktimeError, RelativeLocktime};

/// Closure-level decode/encode errors
#[derive(Debug, thiserror::Error)]
pub enum ClosureError {
    #[error("malformed script: {0}")]
    Malformed(#[from] bitcoin::script::Error),

    #[error("script does not match any known closure")]
    UnknownClosure,

    #[error("multisig closure has no public keys")]
    NoKeys,

    #[error("multisig closure has an unset public key at slot {0}")]
    MissingKey(usize),

    #[error("invalid relative locktime: {0}")]
    Locktime(#[from] LocktimeError),
}

/// Signature aggregation style of a multisig closure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MultisigType {
    /// `<x1> OP_CHECKSIGVERIFY .. <xn> OP_CHECKSIG`
    #[default]
    Checksig,
    /// `<x1> OP_CHECKSIG <x2> OP_CHECKSIGADD .. <n> OP_NUMEQUAL`
    ChecksigAdd,
}

/// All-of-N signature requirement over an ordered key list.
///
/// Key slots are optional so that partially-populated values can still be
/// rendered; decoding always fills every slot, encoding rejects empty ones.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MultisigClosure {
    pub pubkeys: Vec<Option<PublicKey>>,
    pub sig_type: MultisigType,
}

/// Multisig behind an absolute (CLTV) timelock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CltvMultisigClosure {
    pub locktime: absolute::LockTime,
    pub multisig: MultisigClosure,
}

/// Multisig behind a relative (CSV) timelock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvMultisigClosure {
    pub locktime: RelativeLocktime,
    pub multisig: MultisigClosure,
}

/// Multisig gated on an arbitrary condition script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionMultisigClosure {
    pub condition: ScriptBuf,
    pub multisig: MultisigClosure,
}

/// CSV-locked multisig gated on an arbitrary condition script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionCsvMultisigClosure {
    pub condition: ScriptBuf,
    pub csv: CsvMultisigClosure,
}

/// Preimage-hash check used by Ark notes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteClosure {
    pub preimage_hash: sha256::Hash,
}

/// A decoded spending condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Closure {
    Multisig(MultisigClosure),
    CltvMultisig(CltvMultisigClosure),
    CsvMultisig(CsvMultisigClosure),
    ConditionMultisig(ConditionMultisigClosure),
    ConditionCsvMultisig(ConditionCsvMultisigClosure),
    Note(NoteClosure),
}

impl Closure {
    /// Decodes a tapscript into the first closure grammar that matches.
    pub fn decode(script: &Script) -> Result<Closure, ClosureError> {
        // Surface malformed pushes as their own error rather than as a
        // grammar mismatch.
        for instruction in script.instructions() {
            instruction?;
        }

        if let Some(closure) = ConditionCsvMultisigClosure::decode(script) {
            return Ok(Closure::ConditionCsvMultisig(closure));
        }
        if let Some(closure) = ConditionMultisigClosure::decode(script) {
            return Ok(Closure::ConditionMultisig(closure));
        }
        if let Some(closure) = CltvMultisigClosure::decode(script) {
            return Ok(Closure::CltvMultisig(closure));
        }
        if let Some(closure) = CsvMultisigClosure::decode(script) {
            return Ok(Closure::CsvMultisig(closure));
        }
        if let Some(closure) = MultisigClosure::decode(script) {
            return Ok(Closure::Multisig(closure));
        }
        if let Some(closure) = NoteClosure::decode(script) {
            return Ok(Closure::Note(closure));
        }
        Err(ClosureError::UnknownClosure)
    }

    /// Rebuilds the tapscript for this closure.
    pub fn script(&self) -> Result<ScriptBuf, ClosureError> {
        match self {
            Closure::Multisig(closure) => closure.script(),
            Closure::CltvMultisig(closure) => closure.script(),
            Closure::CsvMultisig(closure) => closure.script(),
            Closure::ConditionMultisig(closure) => closure.script(),
            Closure::ConditionCsvMultisig(closure) => closure.script(),
            Closure::Note(closure) => Ok(closure.script()),
        }
    }

    /// Display name of the concrete variant.
    pub fn name(&self) -> &'static str {
        match self {
            Closure::Multisig(_) => "MultisigClosure",
            Closure::CltvMultisig(_) => "CLTVMultisigClosure",
            Closure::CsvMultisig(_) => "CSVMultisigClosure",
            Closure::ConditionMultisig(_) => "ConditionMultisigClosure",
            Closure::ConditionCsvMultisig(_) => "ConditionCSVMultisigClosure",
            Closure::Note(_) => "NoteClosure",
        }
    }
}

impl MultisigClosure {
    /// Convenience constructor for a fully-populated CHECKSIG multisig.
    pub fn new(pubkeys: impl IntoIterator<Item = PublicKey>) -> Self {
        MultisigClosure {
            pubkeys: pubkeys.into_iter().map(Some).collect(),
            sig_type: MultisigType::Checksig,
        }
    }

    pub fn decode(script: &Script) -> Option<Self> {
        let instructions = tokenize(script)?;
        Self::from_instructions(&instructions)
    }

    fn from_instructions(instructions: &[Instruction]) -> Option<Self> {
        Self::checksig_form(instructions).or_else(|| Self::checksigadd_form(instructions))
    }

    fn checksig_form(instructions: &[Instruction]) -> Option<Self> {
        if instructions.len() < 2 || instructions.len() % 2 != 0 {
            return None;
        }
        let pairs = instructions.len() / 2;
        let mut pubkeys = Vec::with_capacity(pairs);
        for (i, pair) in instructions.chunks(2).enumerate() {
            let key = push_key(&pair[0])?;
            let expected = if i == pairs - 1 { OP_CHECKSIG } else { OP_CHECKSIGVERIFY };
            if !is_op(&pair[1], expected) {
                return None;
            }
            pubkeys.push(Some(key));
        }
        Some(MultisigClosure {
            pubkeys,
            sig_type: MultisigType::Checksig,
        })
    }

    fn checksigadd_form(instructions: &[Instruction]) -> Option<Self> {
        if instructions.len() < 4 || instructions.len() % 2 != 0 {
            return None;
        }
        let (key_pairs, tail) = instructions.split_at(instructions.len() - 2);
        let mut pubkeys = Vec::with_capacity(key_pairs.len() / 2);
        for (i, pair) in key_pairs.chunks(2).enumerate() {
            let key = push_key(&pair[0])?;
            let expected = if i == 0 { OP_CHECKSIG } else { OP_CHECKSIGADD };
            if !is_op(&pair[1], expected) {
                return None;
            }
            pubkeys.push(Some(key));
        }
        // The trailing count commits to all-of-N
        if instruction_num(&tail[0])? != pubkeys.len() as i64 {
            return None;
        }
        if !is_op(&tail[1], OP_NUMEQUAL) {
            return None;
        }
        Some(MultisigClosure {
            pubkeys,
            sig_type: MultisigType::ChecksigAdd,
        })
    }

    pub fn script(&self) -> Result<ScriptBuf, ClosureError> {
        if self.pubkeys.is_empty() {
            return Err(ClosureError::NoKeys);
        }
        let keys = self.present_keys()?;
        let mut builder = Builder::new();
        match self.sig_type {
            MultisigType::Checksig => {
                for (i, key) in keys.iter().enumerate() {
                    let op = if i == keys.len() - 1 { OP_CHECKSIG } else { OP_CHECKSIGVERIFY };
                    builder = builder.push_x_only_key(key).push_opcode(op);
                }
            }
            MultisigType::ChecksigAdd => {
                for (i, key) in keys.iter().enumerate() {
                    let op = if i == 0 { OP_CHECKSIG } else { OP_CHECKSIGADD };
                    builder = builder.push_x_only_key(key).push_opcode(op);
                }
                builder = builder.push_int(keys.len() as i64).push_opcode(OP_NUMEQUAL);
            }
        }
        Ok(builder.into_script())
    }

    fn present_keys(&self) -> Result<Vec<XOnlyPublicKey>, ClosureError> {
        self.pubkeys
            .iter()
            .enumerate()
            .map(|(i, key)| {
                key.map(|key| key.x_only_public_key().0)
                    .ok_or(ClosureError::MissingKey(i))
            })
            .collect()
    }
}

impl CltvMultisigClosure {
    pub fn decode(script: &Script) -> Option<Self> {
        let instructions = tokenize(script)?;
        let (locktime, rest) = absolute_prefix(&instructions)?;
        let multisig = MultisigClosure::from_instructions(rest)?;
        Some(CltvMultisigClosure { locktime, multisig })
    }

    pub fn script(&self) -> Result<ScriptBuf, ClosureError> {
        let prefix = Builder::new()
            .push_lock_time(self.locktime)
            .push_opcode(OP_CLTV)
            .push_opcode(OP_DROP)
            .into_script();
        Ok(concat_scripts(prefix, self.multisig.script()?))
    }
}

impl CsvMultisigClosure {
    pub fn decode(script: &Script) -> Option<Self> {
        let instructions = tokenize(script)?;
        let (locktime, rest) = relative_prefix(&instructions)?;
        let multisig = MultisigClosure::from_instructions(rest)?;
        Some(CsvMultisigClosure { locktime, multisig })
    }

    pub fn script(&self) -> Result<ScriptBuf, ClosureError> {
        let prefix = Builder::new()
            .push_sequence(self.locktime.to_sequence()?)
            .push_opcode(OP_CSV)
            .push_opcode(OP_DROP)
            .into_script();
        Ok(concat_scripts(prefix, self.multisig.script()?))
    }
}

impl ConditionMultisigClosure {
    pub fn decode(script: &Script) -> Option<Self> {
        let (condition, rest) = split_last_verify(script)?;
        let multisig = MultisigClosure::decode(&rest)?;
        Some(ConditionMultisigClosure { condition, multisig })
    }

    pub fn script(&self) -> Result<ScriptBuf, ClosureError> {
        let prefix = condition_prefix(&self.condition);
        Ok(concat_scripts(prefix, self.multisig.script()?))
    }
}

impl ConditionCsvMultisigClosure {
    pub fn decode(script: &Script) -> Option<Self> {
        let (condition, rest) = split_last_verify(script)?;
        let csv = CsvMultisigClosure::decode(&rest)?;
        Some(ConditionCsvMultisigClosure { condition, csv })
    }

    pub fn script(&self) -> Result<ScriptBuf, ClosureError> {
        let prefix = condition_prefix(&self.condition);
        Ok(concat_scripts(prefix, self.csv.script()?))
    }
}

impl NoteClosure {
    pub fn decode(script: &Script) -> Option<Self> {
        let instructions = tokenize(script)?;
        match instructions.as_slice() {
            [Instruction::Op(first), Instruction::PushBytes(push), Instruction::Op(last)]
                if *first == OP_SHA256 && *last == OP_EQUAL && push.len() == 32 =>
            {
                let preimage_hash = sha256::Hash::from_slice(push.as_bytes()).ok()?;
                Some(NoteClosure { preimage_hash })
            }
            _ => None,
        }
    }

    pub fn script(&self) -> ScriptBuf {
        Builder::new()
            .push_opcode(OP_SHA256)
            .push_slice(self.preimage_hash.to_byte_array())
            .push_opcode(OP_EQUAL)
            .into_script()
    }
}

fn tokenize(script: &Script) -> Option<Vec<Instruction<'_>>> {
    script.instructions().collect::<Result<_, _>>().ok()
}

fn is_op(instruction: &Instruction, op: Opcode) -> bool {
    matches!(instruction, Instruction::Op(actual) if *actual == op)
}

/// Reads a 32-byte x-only key push, normalised to an even-parity full key.
fn push_key(instruction: &Instruction) -> Option<PublicKey> {
    match instruction {
        Instruction::PushBytes(push) if push.len() == 32 => {
            let key = XOnlyPublicKey::from_slice(push.as_bytes()).ok()?;
            Some(PublicKey::from_x_only_public_key(key, Parity::Even))
        }
        _ => None,
    }
}

/// Reads a stack number from a push or a small-integer opcode.
fn instruction_num(instruction: &Instruction) -> Option<i64> {
    match instruction {
        Instruction::PushBytes(push) => read_script_num(push.as_bytes()),
        Instruction::Op(op) => match op.classify(ClassifyContext::TapScript) {
            Class::PushNum(n) => Some(i64::from(n)),
            _ => None,
        },
    }
}

/// Minimal little-endian script number, at most 5 bytes.
fn read_script_num(data: &[u8]) -> Option<i64> {
    if data.is_empty() {
        return Some(0);
    }
    if data.len() > 5 {
        return None;
    }
    let last = data[data.len() - 1];
    // Reject padded encodings: a most-significant byte carrying only the
    // sign bit is allowed only when the byte below needs its high bit.
    if last & 0x7f == 0 && (data.len() < 2 || data[data.len() - 2] & 0x80 == 0) {
        return None;
    }
    let mut value: i64 = 0;
    for (i, byte) in data.iter().enumerate() {
        value |= i64::from(*byte) << (8 * i);
    }
    if last & 0x80 != 0 {
        value &= !(0x80i64 << (8 * (data.len() - 1)));
        value = -value;
    }
    Some(value)
}

fn absolute_prefix<'i, 's>(
    instructions: &'i [Instruction<'s>],
) -> Option<(absolute::LockTime, &'i [Instruction<'s>])> {
    if instructions.len() < 3 {
        return None;
    }
    let value = instruction_num(&instructions[0])?;
    if !(0..=i64::from(u32::MAX)).contains(&value) {
        return None;
    }
    if !is_op(&instructions[1], OP_CLTV) || !is_op(&instructions[2], OP_DROP) {
        return None;
    }
    Some((absolute::LockTime::from_consensus(value as u32), &instructions[3..]))
}

fn relative_prefix<'i, 's>(
    instructions: &'i [Instruction<'s>],
) -> Option<(RelativeLocktime, &'i [Instruction<'s>])> {
    if instructions.len() < 3 {
        return None;
    }
    let value = instruction_num(&instructions[0])?;
    if !(0..=i64::from(u32::MAX)).contains(&value) {
        return None;
    }
    if !is_op(&instructions[1], OP_CSV) || !is_op(&instructions[2], OP_DROP) {
        return None;
    }
    let locktime = RelativeLocktime::from_sequence(Sequence::from_consensus(value as u32))?;
    Some((locktime, &instructions[3..]))
}

/// Splits at the last top-level `OP_VERIFY`. The multisig grammars contain
/// no `OP_VERIFY`, so the last occurrence is the only consistent split.
fn split_last_verify(script: &Script) -> Option<(ScriptBuf, ScriptBuf)> {
    let mut split_at = None;
    for entry in script.instruction_indices() {
        let (position, instruction) = entry.ok()?;
        if is_op(&instruction, OP_VERIFY) {
            split_at = Some(position);
        }
    }
    let position = split_at?;
    if position == 0 {
        return None;
    }
    let bytes = script.as_bytes();
    Some((
        ScriptBuf::from_bytes(bytes[..position].to_vec()),
        ScriptBuf::from_bytes(bytes[position + 1..].to_vec()),
    ))
}

fn condition_prefix(condition: &Script) -> ScriptBuf {
    let mut bytes = condition.to_bytes();
    bytes.push(OP_VERIFY.to_u8());
    ScriptBuf::from_bytes(bytes)
}

fn concat_scripts(prefix: ScriptBuf, suffix: ScriptBuf) -> ScriptBuf {
    let mut bytes = prefix.into_bytes();
    bytes.extend_from_slice(suffix.as_bytes());
    ScriptBuf::from_bytes(bytes)
}
