//! Shared types for the evmole-host workspace.
//!
//! This crate holds everything that describes *what* the analysis engine
//! returns, independent of *how* the engine is hosted:
//!
//! - [`contract`] - the [`Contract`] aggregate and its records
//!   ([`Function`], [`StorageRecord`], [`Instruction`], [`BasicBlock`])
//! - [`cfg`] - the closed-variant control-flow graph schema ([`Block`], [`BlockType`])
//! - [`decode`] - parsing the engine's JSON payload into a [`Contract`]
//! - [`encoding`] - hex helpers for bytecode, selectors and slots
//! - [`env_utils`] - typed environment variable parsing

pub mod cfg;
pub mod contract;
pub mod decode;
pub mod encoding;
pub mod env_utils;

pub use cfg::{Block, BlockType, ControlFlowGraph, DynamicJump};
pub use contract::{
    BasicBlock, Contract, Function, Instruction, Selector, Slot, StateMutability, StorageRecord,
};
pub use decode::{decode_block, decode_contract, encode_block, encode_contract, DecodeError};
