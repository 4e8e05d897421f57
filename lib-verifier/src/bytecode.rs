//! Hex bytecode wrapper
//!
//! Keeps the text exactly as the collaborator produced it (prefix and case
//! included) but guarantees the body is an even-length run of hex digits.

use crate::error::{VerifyError, VerifyResult};
use std::fmt;

/// Where a bytecode string came from, used in error messages and reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BytecodeOrigin {
    Compiled,
    Deployed,
    Input,
}

impl BytecodeOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            BytecodeOrigin::Compiled => "compiled",
            BytecodeOrigin::Deployed => "deployed",
            BytecodeOrigin::Input => "input",
        }
    }
}

/// Validated hex bytecode, optionally `0x`-prefixed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bytecode(String);

impl Bytecode {
    /// Validate `text` and wrap it.
    pub fn parse(text: impl Into<String>, origin: BytecodeOrigin) -> VerifyResult<Self> {
        let text = text.into();
        let invalid = |reason: String| VerifyError::InvalidBytecode {
            origin: origin.as_str().to_string(),
            reason,
        };

        let body = strip_hex_prefix(&text);
        hex::decode(body).map_err(|e| {
            invalid(match e {
                hex::FromHexError::OddLength => {
                    format!("odd number of hex digits ({})", body.len())
                }
                hex::FromHexError::InvalidHexCharacter { c, index } => {
                    format!("non-hex character '{}' at offset {}", c, index)
                }
                other => other.to_string(),
            })
        })?;

        Ok(Self(text))
    }

    /// Wrap compiler output that lacks the `0x` prefix.
    pub fn from_unprefixed(hex: &str, origin: BytecodeOrigin) -> VerifyResult<Self> {
        Self::parse(format!("0x{}", hex), origin)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Hex digits after the optional `0x` prefix
    pub fn body(&self) -> &str {
        strip_hex_prefix(&self.0)
    }

    /// Number of bytes encoded by the body
    pub fn byte_len(&self) -> usize {
        self.body().len() / 2
    }

    /// True when the deployed account holds no code (`0x`)
    pub fn is_empty(&self) -> bool {
        self.body().is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Bytecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Bytecode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn strip_hex_prefix(text: &str) -> &str {
    text.strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text)
}
