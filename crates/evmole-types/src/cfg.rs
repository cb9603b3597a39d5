//! Control flow graph schema.
//!
//! Every block ends in exactly one of five control transfers, modelled as the
//! closed [`BlockType`] enum. On the wire a block is an object
//! `{start, end, type, data}` whose `data` shape depends on the `type` tag:
//!
//! | `type`         | `data`                                    |
//! |----------------|-------------------------------------------|
//! | `Terminate`    | `{success: bool}`                         |
//! | `Jump`         | `{to: offset}`                            |
//! | `Jumpi`        | `{true_to: offset, false_to: offset}`     |
//! | `DynamicJump`  | `{to: [DynamicJump]}`                     |
//! | `DynamicJumpi` | `{true_to: [DynamicJump], false_to: offset}` |
//!
//! Decoding goes through [`crate::decode`], which rejects any other tag.

use std::collections::{BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

/// Control flow graph: blocks ordered by start offset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlFlowGraph {
    pub blocks: Vec<Block>,
}

/// A basic block with a single entry and a single exit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "crate::decode::RawBlock")]
pub struct Block {
    /// Byte offset of the block's first opcode.
    pub start: usize,
    /// Byte offset of the block's last opcode.
    pub end: usize,
    /// How control leaves the block.
    #[serde(flatten)]
    pub btype: BlockType,
}

/// How control flow continues after a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum BlockType {
    /// Ends with a halting instruction. `success` is false for REVERT/INVALID.
    Terminate { success: bool },
    /// Unconditional jump to a static destination.
    Jump { to: usize },
    /// Conditional jump with two static destinations.
    Jumpi { true_to: usize, false_to: usize },
    /// Unconditional jump to a destination computed at runtime.
    DynamicJump { to: Vec<DynamicJump> },
    /// Conditional jump: dynamic true branch, static fall-through.
    DynamicJumpi {
        true_to: Vec<DynamicJump>,
        false_to: usize,
    },
}

impl BlockType {
    /// The wire tag for this variant.
    pub fn tag(&self) -> &'static str {
        match self {
            BlockType::Terminate { .. } => "Terminate",
            BlockType::Jump { .. } => "Jump",
            BlockType::Jumpi { .. } => "Jumpi",
            BlockType::DynamicJump { .. } => "DynamicJump",
            BlockType::DynamicJumpi { .. } => "DynamicJumpi",
        }
    }
}

/// One candidate destination of a dynamic jump.
///
/// The same destination may be reached along several paths; each path is its
/// own entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicJump {
    /// Block start offsets traversed to derive this candidate.
    pub path: Vec<usize>,
    /// Resolved destination, `None` when it could not be resolved statically.
    #[serde(default)]
    pub to: Option<usize>,
}

impl Block {
    /// Static successor offsets of this block, in branch order.
    ///
    /// Unresolved dynamic candidates contribute no edge. Duplicate
    /// destinations reached along different paths are reported once per path.
    pub fn successors(&self) -> Vec<usize> {
        match &self.btype {
            BlockType::Terminate { .. } => Vec::new(),
            BlockType::Jump { to } => vec![*to],
            BlockType::Jumpi { true_to, false_to } => vec![*true_to, *false_to],
            BlockType::DynamicJump { to } => to.iter().filter_map(|dj| dj.to).collect(),
            BlockType::DynamicJumpi { true_to, false_to } => true_to
                .iter()
                .filter_map(|dj| dj.to)
                .chain(std::iter::once(*false_to))
                .collect(),
        }
    }
}

impl ControlFlowGraph {
    /// Find the block starting at `start`.
    pub fn block(&self, start: usize) -> Option<&Block> {
        self.blocks.iter().find(|b| b.start == start)
    }

    /// Start offsets of all blocks reachable from `from` (inclusive).
    ///
    /// Destinations that are not block starts are ignored.
    pub fn reachable_from(&self, from: usize) -> BTreeSet<usize> {
        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::from([from]);
        while let Some(current) = queue.pop_front() {
            let Some(block) = self.block(current) else {
                continue;
            };
            if !visited.insert(current) {
                continue;
            }
            queue.extend(block.successors());
        }
        visited
    }
}
