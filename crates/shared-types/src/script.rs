//! # Programs
//!
//! Pushdata parsing plus the three predicate shapes the ledger itself
//! produces and recognizes:
//!
//! | Shape | Layout |
//! |-------|--------|
//! | always-true | `OP_TRUE` |
//! | multisig | `OP_m <pk>... OP_n OP_CHECKMULTISIG`, or `<pk> OP_CHECKSIG` |
//! | pay-to-contract | `OP_CONTRACT <contract hash> <param>...` |
//!
//! Anything else is opaque bytes handed to a predicate engine.

use crate::errors::ScriptError;
use crate::hash::Hash;
use shared_crypto::Secp256k1PublicKey;

pub const OP_0: u8 = 0x00;
pub const OP_PUSHDATA1: u8 = 0x4c;
pub const OP_PUSHDATA2: u8 = 0x4d;
pub const OP_PUSHDATA4: u8 = 0x4e;
pub const OP_1: u8 = 0x51;
pub const OP_TRUE: u8 = OP_1;
pub const OP_16: u8 = 0x60;
pub const OP_CHECKSIG: u8 = 0xac;
pub const OP_CHECKMULTISIG: u8 = 0xae;
pub const OP_CONTRACT: u8 = 0xc0;

/// Upper bound on keys in a multisig program.
pub const MAX_MULTISIG_KEYS: usize = 16;

/// One parsed program element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Push(Vec<u8>),
    Op(u8),
}

impl Instruction {
    /// Value of a small-integer opcode: `OP_0` (which parses as an empty
    /// push) or `OP_1`..`OP_16`. Data pushes of a number do not count.
    pub fn small_int(&self) -> Option<usize> {
        match self {
            Instruction::Push(bytes) if bytes.is_empty() => Some(0),
            Instruction::Op(op) if (OP_1..=OP_16).contains(op) => Some((op - OP_1 + 1) as usize),
            _ => None,
        }
    }
}

/// Opcode for a small integer 0..=16.
pub fn small_int_opcode(n: usize) -> Option<u8> {
    match n {
        0 => Some(OP_0),
        1..=16 => Some(OP_1 + (n as u8) - 1),
        _ => None,
    }
}

/// Append the minimal push of `data`.
pub fn push_data(program: &mut Vec<u8>, data: &[u8]) {
    let len = data.len();
    if len == 0 {
        program.push(OP_0);
    } else if len < OP_PUSHDATA1 as usize {
        program.push(len as u8);
    } else if len <= u8::MAX as usize {
        program.push(OP_PUSHDATA1);
        program.push(len as u8);
    } else if len <= u16::MAX as usize {
        program.push(OP_PUSHDATA2);
        program.extend_from_slice(&(len as u16).to_le_bytes());
    } else {
        program.push(OP_PUSHDATA4);
        program.extend_from_slice(&(len as u32).to_le_bytes());
    }
    program.extend_from_slice(data);
}

/// Split a program into instructions.
pub fn parse(program: &[u8]) -> Result<Vec<Instruction>, ScriptError> {
    let mut out = Vec::new();
    let mut pos = 0;
    while pos < program.len() {
        let offset = pos;
        let op = program[pos];
        pos += 1;
        let (len, width) = match op {
            OP_0 => (0, 0),
            0x01..=0x4b => (op as usize, 0),
            OP_PUSHDATA1 => (read_len(program, pos, 1, offset)?, 1),
            OP_PUSHDATA2 => (read_len(program, pos, 2, offset)?, 2),
            OP_PUSHDATA4 => (read_len(program, pos, 4, offset)?, 4),
            _ => {
                out.push(Instruction::Op(op));
                continue;
            }
        };
        pos += width;
        let end = pos
            .checked_add(len)
            .filter(|end| *end <= program.len())
            .ok_or(ScriptError::TruncatedPush { offset })?;
        out.push(Instruction::Push(program[pos..end].to_vec()));
        pos = end;
    }
    Ok(out)
}

fn read_len(program: &[u8], pos: usize, width: usize, offset: usize) -> Result<usize, ScriptError> {
    let bytes = program
        .get(pos..pos + width)
        .ok_or(ScriptError::TruncatedPush { offset })?;
    let mut buf = [0u8; 4];
    buf[..width].copy_from_slice(bytes);
    Ok(u32::from_le_bytes(buf) as usize)
}

/// Parse a program that may only contain pushes (signature scripts).
pub fn parse_pushes(program: &[u8]) -> Result<Vec<Vec<u8>>, ScriptError> {
    parse(program)?
        .into_iter()
        .enumerate()
        .map(|(index, ins)| match ins {
            Instruction::Push(data) => Ok(data),
            Instruction::Op(opcode) => Err(ScriptError::NonPushOpcode { opcode, index }),
        })
        .collect()
}

/// Build a push-only program from `items`.
pub fn push_only(items: &[Vec<u8>]) -> Vec<u8> {
    let mut program = Vec::new();
    for item in items {
        push_data(&mut program, item);
    }
    program
}

/// True for the anyone-can-spend program.
pub fn is_true_program(program: &[u8]) -> bool {
    program == [OP_TRUE]
}

/// An m-of-n signer set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultisigProgram {
    pub required: usize,
    pub pubkeys: Vec<Secp256k1PublicKey>,
}

impl MultisigProgram {
    pub fn new(required: usize, pubkeys: Vec<Secp256k1PublicKey>) -> Self {
        Self { required, pubkeys }
    }

    /// Encode as `OP_m <pk>... OP_n OP_CHECKMULTISIG`.
    ///
    /// Returns `None` if `required > n` or `n > 16`.
    pub fn to_program(&self) -> Option<Vec<u8>> {
        if self.required > self.pubkeys.len() || self.pubkeys.len() > MAX_MULTISIG_KEYS {
            return None;
        }
        let mut program = vec![small_int_opcode(self.required)?];
        for key in &self.pubkeys {
            push_data(&mut program, key.as_bytes());
        }
        program.push(small_int_opcode(self.pubkeys.len())?);
        program.push(OP_CHECKMULTISIG);
        Some(program)
    }

    /// Recognize a multisig or single-key program.
    pub fn parse(program: &[u8]) -> Option<Self> {
        let ins = parse(program).ok()?;
        match ins.as_slice() {
            [Instruction::Push(key), Instruction::Op(OP_CHECKSIG)] => Some(Self {
                required: 1,
                pubkeys: vec![Secp256k1PublicKey::from_slice(key).ok()?],
            }),
            [first, middle @ .., n, Instruction::Op(OP_CHECKMULTISIG)] => {
                let required = first.small_int()?;
                let count = n.small_int()?;
                if middle.len() != count || required > count {
                    return None;
                }
                let pubkeys = middle
                    .iter()
                    .map(|ins| match ins {
                        Instruction::Push(key) => Secp256k1PublicKey::from_slice(key).ok(),
                        Instruction::Op(_) => None,
                    })
                    .collect::<Option<Vec<_>>>()?;
                Some(Self { required, pubkeys })
            }
            _ => None,
        }
    }
}

/// A pay-to-contract predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractProgram {
    pub contract_hash: Hash,
    pub params: Vec<Vec<u8>>,
}

impl ContractProgram {
    pub fn to_program(&self) -> Vec<u8> {
        let mut program = vec![OP_CONTRACT];
        push_data(&mut program, self.contract_hash.as_bytes());
        for param in &self.params {
            push_data(&mut program, param);
        }
        program
    }

    /// Recognize `OP_CONTRACT <32-byte hash> <param>*`.
    pub fn parse(program: &[u8]) -> Option<Self> {
        let (&first, rest) = program.split_first()?;
        if first != OP_CONTRACT {
            return None;
        }
        let mut pushes = parse_pushes(rest).ok()?.into_iter();
        let contract_hash = Hash::from_slice(&pushes.next()?)?;
        Some(Self {
            contract_hash,
            params: pushes.collect(),
        })
    }
}
