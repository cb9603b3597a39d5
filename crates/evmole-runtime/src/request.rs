//! Analysis requests and caller-side cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use evmole_types::encoding::parse_hex_bytes;

use crate::error::EngineError;
use crate::options::AnalysisOptions;

/// Cooperative cancellation flag shared between a caller and its requests.
///
/// Checked before a handle is acquired and after the engine returns; an
/// in-flight engine call is never interrupted.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Bytecode plus the outputs requested for it.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub code: Vec<u8>,
    pub options: AnalysisOptions,
    cancel: Option<CancelToken>,
}

impl AnalysisRequest {
    pub fn new(code: impl Into<Vec<u8>>, options: AnalysisOptions) -> Self {
        Self {
            code: code.into(),
            options,
            cancel: None,
        }
    }

    /// Build a request from hex text, with or without a `0x` prefix.
    pub fn from_hex(code: &str, options: AnalysisOptions) -> Result<Self, EngineError> {
        let code = parse_hex_bytes(code).map_err(|e| EngineError::InvalidInput {
            reason: format!("bytecode is not valid hex: {}", e),
        })?;
        Ok(Self::new(code, options))
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub(crate) fn check_cancelled(&self) -> Result<(), EngineError> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(EngineError::Cancelled),
            _ => Ok(()),
        }
    }
}
