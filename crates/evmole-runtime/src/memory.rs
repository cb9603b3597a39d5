//! Bounds-checked access to the engine's linear memory.
//!
//! The sandbox is treated as an arena addressed by `u32` offsets. Offsets
//! handed out by the engine are wrapped in [`SandboxPtr`] and every access is
//! checked against the current memory size before any slice is taken, so an
//! out-of-range pointer becomes [`EngineError::MemoryAccess`] instead of a
//! panic.

use wasmtime::{AsContext, AsContextMut, Memory};

use crate::error::EngineError;

/// A non-null offset into one sandbox's linear memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SandboxPtr(u32);

impl SandboxPtr {
    /// Interpret an engine return value. Zero is the null pointer.
    pub(crate) fn from_wasm(raw: i32) -> Option<Self> {
        match raw as u32 {
            0 => None,
            offset => Some(Self(offset)),
        }
    }

    pub(crate) fn offset(self) -> u32 {
        self.0
    }

    pub(crate) fn as_wasm(self) -> i32 {
        self.0 as i32
    }
}

/// The exported linear memory of one engine instance.
#[derive(Clone, Copy)]
pub(crate) struct Arena {
    memory: Memory,
}

impl Arena {
    pub(crate) fn new(memory: Memory) -> Self {
        Self { memory }
    }

    /// Current size of linear memory in bytes.
    pub(crate) fn size(&self, store: impl AsContext) -> usize {
        self.memory.data_size(store)
    }

    fn checked_range(
        &self,
        memory_size: usize,
        offset: u32,
        len: u64,
    ) -> Result<std::ops::Range<usize>, EngineError> {
        let end = u64::from(offset) + len;
        if end > memory_size as u64 {
            return Err(EngineError::MemoryAccess {
                offset,
                len,
                memory_size,
            });
        }
        Ok(offset as usize..end as usize)
    }

    /// Copy `bytes` into the sandbox at `ptr`.
    pub(crate) fn write(
        &self,
        mut store: impl AsContextMut,
        ptr: SandboxPtr,
        bytes: &[u8],
    ) -> Result<(), EngineError> {
        let memory_size = self.size(&store);
        let range = self.checked_range(memory_size, ptr.offset(), bytes.len() as u64)?;
        self.memory.data_mut(&mut store)[range].copy_from_slice(bytes);
        Ok(())
    }

    /// Copy `len` bytes starting at `offset` out of the sandbox.
    pub(crate) fn read(
        &self,
        store: impl AsContext,
        offset: u32,
        len: u32,
    ) -> Result<Vec<u8>, EngineError> {
        let data = self.memory.data(&store);
        let range = self.checked_range(data.len(), offset, u64::from(len))?;
        Ok(data[range].to_vec())
    }

    /// Read the little-endian `u32` at `offset`.
    pub(crate) fn read_u32_le(
        &self,
        store: impl AsContext,
        offset: u32,
    ) -> Result<u32, EngineError> {
        let data = self.memory.data(&store);
        let range = self.checked_range(data.len(), offset, 4)?;
        let mut prefix = [0u8; 4];
        prefix.copy_from_slice(&data[range]);
        Ok(u32::from_le_bytes(prefix))
    }
}
