//! Types module
//!
//! Contains core data structures used throughout the engine.
//! This module organizes types into logical submodules:
//! - `wallet`: Wallet identifier, balance scale and stored rows
//! - `operation`: Operation kinds, validated requests and their results
//! - `error`: Error types for the wallet engine

pub mod error;
pub mod operation;
pub mod wallet;

pub use error::{ErrorKind, StoreError, WalletError};
pub use operation::{OperationKind, OperationRequest, OperationResult};
pub use wallet::{to_balance_scale, Wallet, WalletId, BALANCE_SCALE, MAX_BALANCE};
