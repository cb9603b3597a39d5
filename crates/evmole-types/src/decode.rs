//! Result decoding.
//!
//! The engine answers with a UTF-8 JSON document. Everything except control
//! flow blocks maps directly onto serde derives; blocks are first read as a
//! [`RawBlock`] (tag + untyped payload) and then dispatched on the tag so that
//! an unknown tag is reported as [`DecodeError::UnknownVariant`] instead of a
//! generic schema failure.

use serde::Deserialize;

use crate::cfg::{Block, BlockType, ControlFlowGraph, DynamicJump};
use crate::contract::{BasicBlock, Contract, Function, Instruction, StorageRecord};

/// Errors produced while decoding an engine payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// A control flow block carried a tag outside the closed variant set.
    UnknownVariant {
        /// The offending tag
        tag: String,
        /// Start offset of the block, when it could be read
        block_start: Option<usize>,
    },
    /// Malformed JSON, wrong pair arity, bad hex, out-of-range values.
    Schema {
        /// Parser message
        message: String,
    },
}

impl DecodeError {
    pub(crate) fn schema(message: impl std::fmt::Display) -> Self {
        DecodeError::Schema {
            message: message.to_string(),
        }
    }
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::UnknownVariant { tag, block_start } => {
                write!(f, "UNKNOWN_VARIANT: unknown block type '{}'", tag)?;
                if let Some(start) = block_start {
                    write!(f, " at block {}", start)?;
                }
                Ok(())
            }
            DecodeError::Schema { message } => write!(f, "SCHEMA_ERROR: {}", message),
        }
    }
}

impl std::error::Error for DecodeError {}

impl From<serde_json::Error> for DecodeError {
    fn from(e: serde_json::Error) -> Self {
        DecodeError::schema(e)
    }
}

/// A block as it appears on the wire, before tag dispatch.
#[derive(Debug, Deserialize)]
pub(crate) struct RawBlock {
    start: usize,
    end: usize,
    #[serde(rename = "type")]
    tag: String,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Deserialize)]
struct TerminateData {
    success: bool,
}

#[derive(Deserialize)]
struct JumpData {
    to: usize,
}

#[derive(Deserialize)]
struct JumpiData {
    true_to: usize,
    false_to: usize,
}

#[derive(Deserialize)]
struct DynamicJumpData {
    to: Vec<DynamicJump>,
}

#[derive(Deserialize)]
struct DynamicJumpiData {
    true_to: Vec<DynamicJump>,
    false_to: usize,
}

impl TryFrom<RawBlock> for Block {
    type Error = DecodeError;

    fn try_from(raw: RawBlock) -> Result<Self, Self::Error> {
        let RawBlock {
            start,
            end,
            tag,
            data,
        } = raw;
        fn payload<T: serde::de::DeserializeOwned>(
            data: serde_json::Value,
            start: usize,
            tag: &str,
        ) -> Result<T, DecodeError> {
            serde_json::from_value(data)
                .map_err(|e| DecodeError::schema(format!("block {} ({}): {}", start, tag, e)))
        }

        let btype = match tag.as_str() {
            "Terminate" => {
                let d: TerminateData = payload(data, start, &tag)?;
                BlockType::Terminate { success: d.success }
            }
            "Jump" => {
                let d: JumpData = payload(data, start, &tag)?;
                BlockType::Jump { to: d.to }
            }
            "Jumpi" => {
                let d: JumpiData = payload(data, start, &tag)?;
                BlockType::Jumpi {
                    true_to: d.true_to,
                    false_to: d.false_to,
                }
            }
            "DynamicJump" => {
                let d: DynamicJumpData = payload(data, start, &tag)?;
                BlockType::DynamicJump { to: d.to }
            }
            "DynamicJumpi" => {
                let d: DynamicJumpiData = payload(data, start, &tag)?;
                BlockType::DynamicJumpi {
                    true_to: d.true_to,
                    false_to: d.false_to,
                }
            }
            _ => {
                return Err(DecodeError::UnknownVariant {
                    tag,
                    block_start: Some(start),
                })
            }
        };
        Ok(Block { start, end, btype })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireControlFlowGraph {
    blocks: Vec<RawBlock>,
}

/// The top-level payload, with control flow blocks still undispatched.
#[derive(Debug, Deserialize)]
pub(crate) struct WireContract {
    #[serde(default)]
    functions: Option<Vec<Function>>,
    #[serde(default)]
    storage: Option<Vec<StorageRecord>>,
    #[serde(default)]
    disassembled: Option<Vec<Instruction>>,
    #[serde(default, alias = "basicBlocks")]
    basic_blocks: Option<Vec<BasicBlock>>,
    #[serde(default, alias = "controlFlowGraph")]
    control_flow_graph: Option<WireControlFlowGraph>,
}

impl TryFrom<WireContract> for Contract {
    type Error = DecodeError;

    fn try_from(wire: WireContract) -> Result<Self, Self::Error> {
        let control_flow_graph = match wire.control_flow_graph {
            Some(cfg) => Some(ControlFlowGraph {
                blocks: cfg
                    .blocks
                    .into_iter()
                    .map(Block::try_from)
                    .collect::<Result<_, _>>()?,
            }),
            None => None,
        };
        Ok(Contract {
            functions: wire.functions,
            storage: wire.storage,
            disassembled: wire.disassembled,
            basic_blocks: wire.basic_blocks,
            control_flow_graph,
        })
    }
}

/// Decode an engine payload into a [`Contract`].
///
/// # Errors
///
/// - [`DecodeError::UnknownVariant`] if any control flow block carries an unknown tag
/// - [`DecodeError::Schema`] for every other malformation
pub fn decode_contract(payload: &[u8]) -> Result<Contract, DecodeError> {
    let wire: WireContract = serde_json::from_slice(payload)?;
    Contract::try_from(wire)
}

/// Decode a single control flow block object.
pub fn decode_block(json: &[u8]) -> Result<Block, DecodeError> {
    let raw: RawBlock = serde_json::from_slice(json)?;
    Block::try_from(raw)
}

/// Encode a [`Contract`] back into the engine's wire format.
pub fn encode_contract(contract: &Contract) -> Result<Vec<u8>, DecodeError> {
    serde_json::to_vec(contract).map_err(DecodeError::schema)
}

/// Encode a single control flow block object.
pub fn encode_block(block: &Block) -> Result<Vec<u8>, DecodeError> {
    serde_json::to_vec(block).map_err(DecodeError::schema)
}
