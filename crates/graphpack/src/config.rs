//! Decoder limits.
//!
//! Options are plain serializable values supplied by the caller; the crate
//! never reads the environment or files on its own.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Resource limits applied while decoding one stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderOptions {
    /// Maximum nesting of objects and lists below the root.
    pub max_depth: usize,
    /// Maximum number of handles (descriptors, objects and lists) per stream.
    pub max_handles: usize,
    /// Accept bytes after the root value instead of failing.
    pub allow_trailing_bytes: bool,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            max_depth: 256,
            max_handles: 1 << 20,
            allow_trailing_bytes: false,
        }
    }
}

impl DecoderOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::Zero("max_depth"));
        }
        if self.max_handles == 0 {
            return Err(ConfigError::Zero("max_handles"));
        }
        Ok(())
    }
}
