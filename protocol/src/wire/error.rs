//! Error types for the wire codec.

use thiserror::Error;

/// Everything that can go wrong turning bytes into a typed message.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The transport delivered a message with no bytes at all.
    #[error("empty message")]
    Empty,

    /// The leading byte is not a known operation tag. Fatal: there is no
    /// sensible default operation to fall back to.
    #[error("unknown operation tag 0x{0:02x}")]
    UnknownOperation(u8),

    /// The tag was recognised but the payload does not decode as that
    /// operation's structure (truncated, trailing bytes, bad enum index).
    #[error("malformed {what} payload: {reason}")]
    Malformed {
        /// What we were trying to decode.
        what: &'static str,
        /// The underlying decoder's complaint.
        reason: String,
    },

    /// Serialization failed. Only reachable if a payload exceeds the
    /// encoder's size limits.
    #[error("encoding failed: {0}")]
    Encode(String),
}
