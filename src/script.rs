//! Script parsing, push encoding and standard template matching

use crate::error::{ConsensusError, Result};
use crate::types::*;

pub const OP_0: u8 = 0x00;
pub const OP_PUSHDATA1: u8 = 0x4c;
pub const OP_PUSHDATA2: u8 = 0x4d;
pub const OP_PUSHDATA4: u8 = 0x4e;
pub const OP_1: u8 = 0x51;
pub const OP_16: u8 = 0x60;
pub const OP_DUP: u8 = 0x76;
pub const OP_EQUAL: u8 = 0x87;
pub const OP_EQUALVERIFY: u8 = 0x88;
pub const OP_HASH160: u8 = 0xa9;
pub const OP_CODESEPARATOR: u8 = 0xab;
pub const OP_CHECKSIG: u8 = 0xac;
pub const OP_CHECKMULTISIG: u8 = 0xae;

/// One parsed script element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction<'a> {
    /// Data push, including `OP_0` as the empty push
    Push(&'a [u8]),
    /// Any non-push opcode
    Op(u8),
}

/// Decode the instruction starting at `pos`; returns it with the next offset
fn read_instruction(script: &[u8], pos: usize) -> Result<(Instruction<'_>, usize)> {
    let opcode = script[pos];
    let mut cursor = pos + 1;

    let len = match opcode {
        0x01..=0x4b => opcode as usize,
        OP_PUSHDATA1 | OP_PUSHDATA2 | OP_PUSHDATA4 => {
            let width = match opcode {
                OP_PUSHDATA1 => 1,
                OP_PUSHDATA2 => 2,
                _ => 4,
            };
            let prefix = script.get(cursor..cursor + width).ok_or_else(|| {
                ConsensusError::Script(format!("truncated push length at offset {}", pos))
            })?;
            cursor += width;
            let mut buf = [0u8; 4];
            buf[..width].copy_from_slice(prefix);
            u32::from_le_bytes(buf) as usize
        }
        OP_0 => return Ok((Instruction::Push(&[]), cursor)),
        _ => return Ok((Instruction::Op(opcode), cursor)),
    };

    let end = cursor
        .checked_add(len)
        .filter(|&end| end <= script.len())
        .ok_or_else(|| {
            ConsensusError::Script(format!(
                "push of {} bytes at offset {} runs past end of script",
                len, pos
            ))
        })?;
    Ok((Instruction::Push(&script[cursor..end]), end))
}

/// Iterator over a script's instructions; stops after the first error
pub struct ScriptInstructions<'a> {
    script: &'a [u8],
    pos: usize,
    failed: bool,
}

impl<'a> Iterator for ScriptInstructions<'a> {
    type Item = Result<Instruction<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.script.len() {
            return None;
        }
        match read_instruction(self.script, self.pos) {
            Ok((instruction, next)) => {
                self.pos = next;
                Some(Ok(instruction))
            }
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

pub fn instructions(script: &[u8]) -> ScriptInstructions<'_> {
    ScriptInstructions {
        script,
        pos: 0,
        failed: false,
    }
}

/// Append `data` as a single push using the shortest encoding
pub fn push_data(script: &mut ByteString, data: &[u8]) {
    let len = data.len();
    if len < OP_PUSHDATA1 as usize {
        script.push(len as u8);
    } else if len <= 0xff {
        script.push(OP_PUSHDATA1);
        script.push(len as u8);
    } else if len <= 0xffff {
        script.push(OP_PUSHDATA2);
        script.extend_from_slice(&(len as u16).to_le_bytes());
    } else {
        script.push(OP_PUSHDATA4);
        script.extend_from_slice(&(len as u32).to_le_bytes());
    }
    script.extend_from_slice(data);
}

/// The data items of a push-only script, in order
pub fn push_items(script: &[u8]) -> Result<Vec<ByteString>> {
    instructions(script)
        .map(|instruction| match instruction? {
            Instruction::Push(data) => Ok(data.to_vec()),
            Instruction::Op(op) => Err(ConsensusError::Script(format!(
                "opcode {:#04x} in push-only script",
                op
            ))),
        })
        .collect()
}

/// Copy of `script` without `OP_CODESEPARATOR` opcodes.
///
/// Bytes after an unparseable push are kept verbatim.
pub fn remove_codeseparators(script: &[u8]) -> ByteString {
    let mut out = Vec::with_capacity(script.len());
    let mut pos = 0;
    while pos < script.len() {
        match read_instruction(script, pos) {
            Ok((Instruction::Op(OP_CODESEPARATOR), next)) => pos = next,
            Ok((_, next)) => {
                out.extend_from_slice(&script[pos..next]);
                pos = next;
            }
            Err(_) => {
                out.extend_from_slice(&script[pos..]);
                break;
            }
        }
    }
    out
}

/// Serialized secp256k1 public key shape: compressed or uncompressed
fn is_pubkey_shape(key: &[u8]) -> bool {
    match key.len() {
        33 => key[0] == 0x02 || key[0] == 0x03,
        65 => key[0] == 0x04,
        _ => false,
    }
}

/// `OP_1`..`OP_16` as a number
fn small_int(op: u8) -> Option<u8> {
    (OP_1..=OP_16).contains(&op).then(|| op - OP_1 + 1)
}

/// Match a locking script against the standard templates
pub fn classify_script(script: &[u8]) -> ScriptTemplate {
    // OP_DUP OP_HASH160 <20> OP_EQUALVERIFY OP_CHECKSIG
    if script.len() == 25
        && script[0] == OP_DUP
        && script[1] == OP_HASH160
        && script[2] == 20
        && script[23] == OP_EQUALVERIFY
        && script[24] == OP_CHECKSIG
    {
        let mut key_id = [0u8; 20];
        key_id.copy_from_slice(&script[3..23]);
        return ScriptTemplate::PubKeyHash(key_id);
    }

    // OP_HASH160 <20> OP_EQUAL
    if script.len() == 23 && script[0] == OP_HASH160 && script[1] == 20 && script[22] == OP_EQUAL {
        let mut hash = [0u8; 20];
        hash.copy_from_slice(&script[2..22]);
        return ScriptTemplate::ScriptHash(hash);
    }

    let ops: Vec<Instruction<'_>> = match instructions(script).collect::<Result<_>>() {
        Ok(ops) => ops,
        Err(_) => return ScriptTemplate::NonStandard,
    };

    match ops.as_slice() {
        [Instruction::Push(key), Instruction::Op(OP_CHECKSIG)] if is_pubkey_shape(key) => {
            ScriptTemplate::PubKey(key.to_vec())
        }
        [Instruction::Op(m), keys @ .., Instruction::Op(n), Instruction::Op(OP_CHECKMULTISIG)] => {
            match (small_int(*m), small_int(*n)) {
                (Some(required), Some(total))
                    if required <= total && keys.len() == total as usize =>
                {
                    let keys: Option<Vec<ByteString>> = keys
                        .iter()
                        .map(|k| match k {
                            Instruction::Push(key) if is_pubkey_shape(key) => Some(key.to_vec()),
                            _ => None,
                        })
                        .collect();
                    match keys {
                        Some(keys) => ScriptTemplate::MultiSig { required, keys },
                        None => ScriptTemplate::NonStandard,
                    }
                }
                _ => ScriptTemplate::NonStandard,
            }
        }
        _ => ScriptTemplate::NonStandard,
    }
}

/// `<pubkey> OP_CHECKSIG`
pub fn pay_to_pubkey(pubkey: &[u8]) -> ByteString {
    let mut script = Vec::with_capacity(pubkey.len() + 2);
    push_data(&mut script, pubkey);
    script.push(OP_CHECKSIG);
    script
}

/// `OP_DUP OP_HASH160 <key id> OP_EQUALVERIFY OP_CHECKSIG`
pub fn pay_to_pubkey_hash(key_id: &KeyId) -> ByteString {
    let mut script = vec![OP_DUP, OP_HASH160];
    push_data(&mut script, key_id);
    script.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
    script
}

/// `OP_HASH160 <script hash> OP_EQUAL`
pub fn pay_to_script_hash(script_hash: &[u8; 20]) -> ByteString {
    let mut script = vec![OP_HASH160];
    push_data(&mut script, script_hash);
    script.push(OP_EQUAL);
    script
}

/// `OP_m <pubkey>... OP_n OP_CHECKMULTISIG`; `required` and `keys.len()` in 1..=16
pub fn multisig(required: u8, keys: &[ByteString]) -> Result<ByteString> {
    let total = keys.len();
    if required == 0 || total == 0 || total > 16 || required as usize > total {
        return Err(ConsensusError::Script(format!(
            "invalid multisig {} of {}",
            required, total
        )));
    }
    let mut script = vec![OP_1 + required - 1];
    for key in keys {
        push_data(&mut script, key);
    }
    script.push(OP_1 + total as u8 - 1);
    script.push(OP_CHECKMULTISIG);
    Ok(script)
}
