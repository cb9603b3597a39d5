//! Engine error types.
//!
//! Every failure of the call protocol surfaces as exactly one [`EngineError`]
//! variant. Cleanup failures during mandatory deallocation are logged, never
//! returned.

use evmole_types::DecodeError;

/// Errors raised while loading, invoking or decoding the analysis engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// ENGINE_LOAD: the module could not be compiled/instantiated, or lacks a
    /// required export.
    Load {
        /// What went wrong
        reason: String,
    },

    /// INVALID_INPUT: the request was rejected before touching the sandbox.
    InvalidInput {
        /// Why the input was rejected
        reason: String,
    },

    /// ALLOCATION: the engine's allocator returned null or trapped.
    Allocation {
        /// Requested size in bytes
        size: u32,
        /// Trap message, if the allocator trapped
        trap: Option<String>,
    },

    /// MEMORY_ACCESS: a read or write fell outside the sandbox's linear memory.
    MemoryAccess {
        /// Sandbox offset of the access
        offset: u32,
        /// Length of the access in bytes
        len: u64,
        /// Size of linear memory at the time of the access
        memory_size: usize,
    },

    /// ENGINE_INVOCATION: the analysis entry point reported failure or trapped.
    Invocation {
        /// Failure description
        reason: String,
    },

    /// UNKNOWN_VARIANT: a control flow block carried an unknown tag.
    UnknownVariant {
        /// The offending tag
        tag: String,
        /// Start offset of the block
        block_start: Option<usize>,
    },

    /// SCHEMA_ERROR: the engine payload did not match the result schema.
    Schema {
        /// Parser message
        message: String,
    },

    /// The handle was used after it was closed.
    Closed,

    /// The caller cancelled the request.
    Cancelled,
}

impl EngineError {
    pub(crate) fn load(reason: impl std::fmt::Display) -> Self {
        EngineError::Load {
            reason: reason.to_string(),
        }
    }

    pub(crate) fn invocation(reason: impl std::fmt::Display) -> Self {
        EngineError::Invocation {
            reason: reason.to_string(),
        }
    }

    /// Short machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Load { .. } => "ENGINE_LOAD",
            EngineError::InvalidInput { .. } => "INVALID_INPUT",
            EngineError::Allocation { .. } => "ALLOCATION",
            EngineError::MemoryAccess { .. } => "MEMORY_ACCESS",
            EngineError::Invocation { .. } => "ENGINE_INVOCATION",
            EngineError::UnknownVariant { .. } => "UNKNOWN_VARIANT",
            EngineError::Schema { .. } => "SCHEMA_ERROR",
            EngineError::Closed => "ENGINE_CLOSED",
            EngineError::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Load { reason } => write!(f, "ENGINE_LOAD: {}", reason),
            EngineError::InvalidInput { reason } => write!(f, "INVALID_INPUT: {}", reason),
            EngineError::Allocation { size, trap } => {
                write!(f, "ALLOCATION: engine could not allocate {} bytes", size)?;
                if let Some(trap) = trap {
                    write!(f, " (trap: {})", trap)?;
                }
                Ok(())
            }
            EngineError::MemoryAccess {
                offset,
                len,
                memory_size,
            } => write!(
                f,
                "MEMORY_ACCESS: {} bytes at offset {:#x} exceed linear memory of {} bytes",
                len, offset, memory_size
            ),
            EngineError::Invocation { reason } => write!(f, "ENGINE_INVOCATION: {}", reason),
            EngineError::UnknownVariant { tag, block_start } => {
                write!(f, "UNKNOWN_VARIANT: unknown block type '{}'", tag)?;
                if let Some(start) = block_start {
                    write!(f, " at block {}", start)?;
                }
                Ok(())
            }
            EngineError::Schema { message } => write!(f, "SCHEMA_ERROR: {}", message),
            EngineError::Closed => write!(f, "ENGINE_CLOSED: handle used after close"),
            EngineError::Cancelled => write!(f, "CANCELLED: request cancelled by caller"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<DecodeError> for EngineError {
    fn from(e: DecodeError) -> Self {
        match e {
            DecodeError::UnknownVariant { tag, block_start } => {
                EngineError::UnknownVariant { tag, block_start }
            }
            DecodeError::Schema { message } => EngineError::Schema { message },
        }
    }
}
