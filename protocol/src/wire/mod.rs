//! # Wire Format
//!
//! Bytes that cross a chain boundary: tagged hub messages, the compensation
//! payloads echoed back on failure, and the call contexts they are built
//! from. All encoding goes through [`codec`] so that what gets signed and
//! what gets sent use the same byte layout.

pub mod codec;
pub mod compensation;
pub mod context;
pub mod error;
pub mod message;

pub use compensation::CompensationPayload;
pub use context::{CallContext, DepositContext, WithdrawContext};
pub use error::CodecError;
pub use message::{
    CallbackMessage, DepositMessage, HubMessage, Operation, WithdrawAuthorization,
    WithdrawMessage,
};
