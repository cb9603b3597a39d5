//! Engine module bytes.
//!
//! An [`EngineModule`] is the raw WebAssembly binary of the analysis engine,
//! after transparent gzip decompression, together with its SHA-256 digest.
//! Nothing here compiles the module; see [`crate::handle::CompiledEngine`].

use std::io::Read;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use flate2::read::GzDecoder;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::config::WASM_PATH_ENV;
use crate::error::EngineError;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Immutable engine binary, cheap to clone.
#[derive(Clone)]
pub struct EngineModule {
    bytes: Arc<[u8]>,
    digest: [u8; 32],
}

impl std::fmt::Debug for EngineModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineModule")
            .field("len", &self.bytes.len())
            .field("digest", &self.digest_hex())
            .finish()
    }
}

impl EngineModule {
    /// Wrap module bytes, decompressing them first if they are gzip data.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, EngineError> {
        let bytes = bytes.into();
        let bytes = if bytes.starts_with(&GZIP_MAGIC) {
            let mut out = Vec::new();
            GzDecoder::new(bytes.as_slice())
                .read_to_end(&mut out)
                .map_err(|e| EngineError::load(format!("gzip decompression failed: {}", e)))?;
            debug!(
                compressed = bytes.len(),
                decompressed = out.len(),
                "decompressed engine module"
            );
            out
        } else {
            bytes
        };
        if bytes.is_empty() {
            return Err(EngineError::load("engine module is empty"));
        }
        let digest = sha256_32(&bytes);
        Ok(Self {
            bytes: bytes.into(),
            digest,
        })
    }

    /// Read module bytes from a file (`.wasm` or gzip-compressed).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| EngineError::load(format!("reading {}: {}", path.display(), e)))?;
        let module = Self::from_bytes(bytes)?;
        info!(
            path = %path.display(),
            digest = %module.digest_hex(),
            "loaded engine module"
        );
        Ok(module)
    }

    /// The process-wide bundled engine module.
    ///
    /// Located through `EVMOLE_WASM_PATH` on first use; the outcome, success
    /// or failure, is fixed for the life of the process.
    pub fn bundled() -> Result<&'static EngineModule, EngineError> {
        static BUNDLED: OnceLock<Result<EngineModule, EngineError>> = OnceLock::new();
        BUNDLED
            .get_or_init(|| match evmole_types::env_utils::env_path(WASM_PATH_ENV) {
                Some(path) => EngineModule::from_file(path),
                None => Err(EngineError::load(format!(
                    "no bundled engine module: {} is not set",
                    WASM_PATH_ENV
                ))),
            })
            .as_ref()
            .map_err(Clone::clone)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn digest(&self) -> [u8; 32] {
        self.digest
    }

    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest)
    }
}

fn sha256_32(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest[..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    const WASM_HEADER: &[u8] = b"\0asm\x01\0\0\0";

    #[test]
    fn test_plain_bytes_are_kept() {
        let module = EngineModule::from_bytes(WASM_HEADER).unwrap();
        assert_eq!(module.bytes(), WASM_HEADER);
        assert_eq!(module.digest_hex().len(), 64);
    }

    #[test]
    fn test_gzip_is_transparent() {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(WASM_HEADER).unwrap();
        let gz = enc.finish().unwrap();

        let module = EngineModule::from_bytes(gz).unwrap();
        assert_eq!(module.bytes(), WASM_HEADER);
        assert_eq!(
            module.digest(),
            EngineModule::from_bytes(WASM_HEADER).unwrap().digest()
        );
    }

    #[test]
    fn test_corrupt_gzip_is_load_error() {
        let err = EngineModule::from_bytes(vec![0x1f, 0x8b, 0x08, 0x00]).unwrap_err();
        assert_eq!(err.kind(), "ENGINE_LOAD");
    }

    #[test]
    fn test_empty_module_is_load_error() {
        assert!(matches!(
            EngineModule::from_bytes(Vec::new()),
            Err(EngineError::Load { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = EngineModule::from_file(dir.path().join("absent.wasm")).unwrap_err();
        assert!(err.to_string().contains("absent.wasm"), "{}", err);
    }
}
