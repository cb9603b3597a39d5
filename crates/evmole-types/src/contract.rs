//! The analysis result model.
//!
//! A [`Contract`] aggregates whatever the engine was asked to extract; every
//! sub-result is `None` unless the corresponding analysis was requested.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, IgnoredAny, SeqAccess, Visitor};
use serde::ser::SerializeTuple;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::cfg::ControlFlowGraph;
use crate::encoding::decode_fixed;

/// Contains analyzed information about a smart contract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "crate::decode::WireContract")]
pub struct Contract {
    /// Public functions with their metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub functions: Option<Vec<Function>>,

    /// Storage layout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<Vec<StorageRecord>>,

    /// Disassembled code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disassembled: Option<Vec<Instruction>>,

    /// Basic blocks as `(start, end)` offset pairs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub basic_blocks: Option<Vec<BasicBlock>>,

    /// Control flow graph.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_flow_graph: Option<ControlFlowGraph>,
}

impl Contract {
    /// Look up a function by selector.
    pub fn function(&self, selector: Selector) -> Option<&Function> {
        self.functions
            .as_deref()?
            .iter()
            .find(|f| f.selector == selector)
    }
}

/// A public smart contract function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    /// 4-byte function selector.
    pub selector: Selector,

    /// Byte offset of the function body within the bytecode.
    #[serde(alias = "bytecodeOffset")]
    pub bytecode_offset: usize,

    /// Comma-separated canonical argument types, e.g. `uint256,address[]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,

    #[serde(
        default,
        alias = "stateMutability",
        skip_serializing_if = "Option::is_none"
    )]
    pub state_mutability: Option<StateMutability>,
}

/// Function state mutability as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateMutability {
    Pure,
    View,
    Payable,
    #[serde(rename = "nonpayable")]
    NonPayable,
}

impl StateMutability {
    pub fn as_str(self) -> &'static str {
        match self {
            StateMutability::Pure => "pure",
            StateMutability::View => "view",
            StateMutability::Payable => "payable",
            StateMutability::NonPayable => "nonpayable",
        }
    }
}

impl fmt::Display for StateMutability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A storage variable in the contract's storage layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageRecord {
    /// 32-byte storage slot.
    pub slot: Slot,

    /// Byte offset within the slot, always in `0..=31`.
    #[serde(deserialize_with = "storage_offset")]
    pub offset: u8,

    /// Variable type descriptor, e.g. `uint256` or `mapping(address => uint256)`.
    #[serde(rename = "type")]
    pub r#type: String,

    /// Selectors of functions reading this location.
    #[serde(default)]
    pub reads: Vec<Selector>,

    /// Selectors of functions writing this location.
    #[serde(default)]
    pub writes: Vec<Selector>,
}

fn storage_offset<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let offset = u8::deserialize(deserializer)?;
    if offset > 31 {
        return Err(de::Error::custom(format!(
            "storage offset {} outside 0..=31",
            offset
        )));
    }
    Ok(offset)
}

/// 4-byte function selector, written as 8 lowercase hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Selector(pub [u8; 4]);

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for Selector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_fixed::<4>(s, false)
            .map(Selector)
            .map_err(|e| format!("invalid selector: {}", e))
    }
}

/// 32-byte storage slot id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot(pub [u8; 32]);

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for Slot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_fixed::<32>(s, true)
            .map(Slot)
            .map_err(|e| format!("invalid storage slot: {}", e))
    }
}

macro_rules! hex_string_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(de::Error::custom)
            }
        }
    };
}

hex_string_serde!(Selector);
hex_string_serde!(Slot);

/// One disassembled opcode, encoded on the wire as `[offset, "OPCODE args"]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub offset: usize,
    pub opcode: String,
}

/// A basic block, encoded on the wire as `[start, end]`.
///
/// `end` is the offset of the block's last opcode, not one past it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BasicBlock {
    pub start: usize,
    pub end: usize,
}

impl Serialize for Instruction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut t = serializer.serialize_tuple(2)?;
        t.serialize_element(&self.offset)?;
        t.serialize_element(&self.opcode)?;
        t.end()
    }
}

impl Serialize for BasicBlock {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut t = serializer.serialize_tuple(2)?;
        t.serialize_element(&self.start)?;
        t.serialize_element(&self.end)?;
        t.end()
    }
}

/// Visits a JSON array that must hold exactly two elements.
struct PairVisitor<A, B> {
    what: &'static str,
    marker: std::marker::PhantomData<(A, B)>,
}

impl<A, B> PairVisitor<A, B> {
    fn new(what: &'static str) -> Self {
        Self {
            what,
            marker: std::marker::PhantomData,
        }
    }
}

impl<'de, A: Deserialize<'de>, B: Deserialize<'de>> Visitor<'de> for PairVisitor<A, B> {
    type Value = (A, B);

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} as an array of 2 elements", self.what)
    }

    fn visit_seq<S: SeqAccess<'de>>(self, mut seq: S) -> Result<Self::Value, S::Error> {
        let arity_error = |got: usize| -> S::Error {
            de::Error::custom(format!(
                "{}: expected array of 2 elements, got {}",
                self.what, got
            ))
        };
        let first: A = seq.next_element()?.ok_or_else(|| arity_error(0))?;
        let second: B = seq.next_element()?.ok_or_else(|| arity_error(1))?;
        let mut extra = 0;
        while seq.next_element::<IgnoredAny>()?.is_some() {
            extra += 1;
        }
        if extra > 0 {
            return Err(arity_error(2 + extra));
        }
        Ok((first, second))
    }
}

impl<'de> Deserialize<'de> for Instruction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (offset, opcode) = deserializer.deserialize_seq(PairVisitor::new("instruction"))?;
        Ok(Instruction { offset, opcode })
    }
}

impl<'de> Deserialize<'de> for BasicBlock {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (start, end) = deserializer.deserialize_seq(PairVisitor::new("basic block"))?;
        Ok(BasicBlock { start, end })
    }
}
