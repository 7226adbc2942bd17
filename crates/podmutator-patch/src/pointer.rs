//! JSON Pointer (RFC 6901) helpers
//!
//! Map keys such as `topology.kubernetes.io/zone` cannot be dropped into a
//! pointer as-is: `/` separates segments and `~` introduces an escape.

use jsonptr::PointerBuf;

use crate::error::{PatchError, Result};

/// Escape a raw map key into a single JSON Pointer reference token.
///
/// The key is scanned once, left to right, so characters produced by an
/// earlier substitution are never re-examined. Input that already looks
/// escaped is escaped again: `a~1b` becomes `a~01b`.
pub fn escape_token(key: &str) -> String {
    let mut token = String::with_capacity(key.len());
    for c in key.chars() {
        match c {
            '~' => token.push_str("~0"),
            '/' => token.push_str("~1"),
            other => token.push(other),
        }
    }
    token
}

/// Parse an already-escaped path into a pointer
pub(crate) fn parse(path: String) -> Result<PointerBuf> {
    PointerBuf::parse(path.as_str()).map_err(|e| PatchError::InvalidPointer {
        message: e.to_string(),
        path,
    })
}

/// Pointer to the map entry `key` below `base`
pub(crate) fn map_entry(base: &str, key: &str) -> Result<PointerBuf> {
    parse(format!("{}/{}", base, escape_token(key)))
}
