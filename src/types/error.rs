//! Error types for the wallet engine
//!
//! This module defines every error that can surface from a balance mutation or
//! a balance query.
//!
//! # Error Categories
//!
//! - **Validation Errors**: malformed amounts, rejected before a lane is touched
//! - **Transactional Errors**: begin/read/create/write/commit failures, always rolled back
//! - **Business-Rule Errors**: insufficient funds, balance ceiling exceeded
//! - **Lane Errors**: the wallet's lane is full or its worker is gone
//!
//! Store failures are modelled separately by [`StoreError`] and carried as the
//! source of the transactional variants.

use super::wallet::WalletId;
use rust_decimal::Decimal;
use std::fmt;
use thiserror::Error;

/// Failure reported by a durable store implementation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No row exists for the requested wallet
    #[error("row not found")]
    NotFound,

    /// A row already exists for the wallet being inserted
    #[error("row already exists")]
    AlreadyExists,

    /// The operation did not finish before its deadline
    #[error("operation timed out")]
    Timeout,

    /// Any other backend failure (connection loss, constraint violation, ...)
    #[error("{0}")]
    Backend(String),
}

/// Main error type for the wallet engine
///
/// Each variant carries the wallet the failed request targeted and, where it
/// is meaningful, the balance observed at the time of failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WalletError {
    /// Amount is zero, negative or finer than the persisted scale
    #[error("Invalid amount {amount} for wallet {wallet_id}")]
    InvalidAmount {
        /// Wallet the request targeted
        wallet_id: WalletId,
        /// The rejected amount
        amount: Decimal,
    },

    /// The store refused to open a transaction
    #[error("Transaction error for wallet {wallet_id}: {source}")]
    TransactionStart {
        /// Wallet the request targeted
        wallet_id: WalletId,
        /// Underlying store failure
        #[source]
        source: StoreError,
    },

    /// Reading the locked balance failed for a reason other than a missing row
    #[error("Failed to read balance of wallet {wallet_id}: {source}")]
    ReadFailure {
        /// Wallet the request targeted
        wallet_id: WalletId,
        /// Underlying store failure
        #[source]
        source: StoreError,
    },

    /// Implicit creation of a missing wallet row failed
    #[error("Failed to create wallet {wallet_id}: {source}")]
    CreateFailure {
        /// Wallet the request targeted
        wallet_id: WalletId,
        /// Underlying store failure
        #[source]
        source: StoreError,
    },

    /// Withdrawal larger than the current balance
    ///
    /// Not a defect: the request is rejected and the row stays untouched.
    #[error("Insufficient funds in wallet {wallet_id}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        /// Wallet the request targeted
        wallet_id: WalletId,
        /// Balance before the operation
        balance: Decimal,
        /// Requested withdrawal amount
        requested: Decimal,
    },

    /// Deposit that would push the balance past the persisted ceiling
    #[error("Balance overflow in wallet {wallet_id}: balance {balance}, requested {requested}")]
    BalanceOverflow {
        /// Wallet the request targeted
        wallet_id: WalletId,
        /// Balance before the operation
        balance: Decimal,
        /// Requested deposit amount
        requested: Decimal,
    },

    /// Persisting the new balance failed
    #[error("Failed to update balance of wallet {wallet_id}: {source}")]
    WriteFailure {
        /// Wallet the request targeted
        wallet_id: WalletId,
        /// Balance before the operation
        balance: Decimal,
        /// Underlying store failure
        #[source]
        source: StoreError,
    },

    /// The store rejected the commit
    #[error("Transaction commit error for wallet {wallet_id}: {source}")]
    CommitFailure {
        /// Wallet the request targeted
        wallet_id: WalletId,
        /// Balance before the operation
        balance: Decimal,
        /// Underlying store failure
        #[source]
        source: StoreError,
    },

    /// The lane stayed full for longer than the enqueue timeout
    #[error("Lane for wallet {wallet_id} is full")]
    LaneFull {
        /// Wallet the request targeted
        wallet_id: WalletId,
    },

    /// The lane worker went away before replying
    #[error("Lane for wallet {wallet_id} closed before replying")]
    LaneClosed {
        /// Wallet the request targeted
        wallet_id: WalletId,
    },

    /// Balance query for a wallet that has never been written
    #[error("Wallet {wallet_id} not found")]
    WalletNotFound {
        /// Wallet the query targeted
        wallet_id: WalletId,
    },

    /// Unlocked balance read on the query path failed
    #[error("Failed to query balance of wallet {wallet_id}: {source}")]
    QueryFailure {
        /// Wallet the query targeted
        wallet_id: WalletId,
        /// Underlying store failure
        #[source]
        source: StoreError,
    },
}

/// Classification of a [`WalletError`]
///
/// This is what a transport layer maps onto its own status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidAmount,
    TransactionStartFailure,
    ReadFailure,
    CreateFailure,
    InsufficientFunds,
    BalanceOverflow,
    WriteFailure,
    CommitFailure,
    LaneFull,
    LaneClosed,
    WalletNotFound,
    QueryFailure,
}

impl ErrorKind {
    /// Stable label for logs and wire protocols
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidAmount => "invalid-amount",
            ErrorKind::TransactionStartFailure => "transaction-start-failure",
            ErrorKind::ReadFailure => "read-failure",
            ErrorKind::CreateFailure => "create-failure",
            ErrorKind::InsufficientFunds => "insufficient-funds",
            ErrorKind::BalanceOverflow => "balance-overflow",
            ErrorKind::WriteFailure => "write-failure",
            ErrorKind::CommitFailure => "commit-failure",
            ErrorKind::LaneFull => "lane-full",
            ErrorKind::LaneClosed => "lane-closed",
            ErrorKind::WalletNotFound => "wallet-not-found",
            ErrorKind::QueryFailure => "query-failure",
        }
    }

    /// Whether the failure is a rejected request rather than a system fault
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ErrorKind::InvalidAmount
                | ErrorKind::InsufficientFunds
                | ErrorKind::BalanceOverflow
                | ErrorKind::WalletNotFound
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Helper functions for creating common errors

impl WalletError {
    /// Create an InvalidAmount error
    pub fn invalid_amount(wallet_id: WalletId, amount: Decimal) -> Self {
        WalletError::InvalidAmount { wallet_id, amount }
    }

    /// Create an InsufficientFunds error
    pub fn insufficient_funds(wallet_id: WalletId, balance: Decimal, requested: Decimal) -> Self {
        WalletError::InsufficientFunds {
            wallet_id,
            balance,
            requested,
        }
    }

    /// Create a BalanceOverflow error
    pub fn balance_overflow(wallet_id: WalletId, balance: Decimal, requested: Decimal) -> Self {
        WalletError::BalanceOverflow {
            wallet_id,
            balance,
            requested,
        }
    }

    /// Create a LaneFull error
    pub fn lane_full(wallet_id: WalletId) -> Self {
        WalletError::LaneFull { wallet_id }
    }

    /// Create a LaneClosed error
    pub fn lane_closed(wallet_id: WalletId) -> Self {
        WalletError::LaneClosed { wallet_id }
    }

    /// Create a WalletNotFound error
    pub fn wallet_not_found(wallet_id: WalletId) -> Self {
        WalletError::WalletNotFound { wallet_id }
    }

    /// Classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            WalletError::InvalidAmount { .. } => ErrorKind::InvalidAmount,
            WalletError::TransactionStart { .. } => ErrorKind::TransactionStartFailure,
            WalletError::ReadFailure { .. } => ErrorKind::ReadFailure,
            WalletError::CreateFailure { .. } => ErrorKind::CreateFailure,
            WalletError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            WalletError::BalanceOverflow { .. } => ErrorKind::BalanceOverflow,
            WalletError::WriteFailure { .. } => ErrorKind::WriteFailure,
            WalletError::CommitFailure { .. } => ErrorKind::CommitFailure,
            WalletError::LaneFull { .. } => ErrorKind::LaneFull,
            WalletError::LaneClosed { .. } => ErrorKind::LaneClosed,
            WalletError::WalletNotFound { .. } => ErrorKind::WalletNotFound,
            WalletError::QueryFailure { .. } => ErrorKind::QueryFailure,
        }
    }

    /// Wallet the failed request targeted
    pub fn wallet_id(&self) -> WalletId {
        match self {
            WalletError::InvalidAmount { wallet_id, .. }
            | WalletError::TransactionStart { wallet_id, .. }
            | WalletError::ReadFailure { wallet_id, .. }
            | WalletError::CreateFailure { wallet_id, .. }
            | WalletError::InsufficientFunds { wallet_id, .. }
            | WalletError::BalanceOverflow { wallet_id, .. }
            | WalletError::WriteFailure { wallet_id, .. }
            | WalletError::CommitFailure { wallet_id, .. }
            | WalletError::LaneFull { wallet_id }
            | WalletError::LaneClosed { wallet_id }
            | WalletError::WalletNotFound { wallet_id }
            | WalletError::QueryFailure { wallet_id, .. } => *wallet_id,
        }
    }

    /// Balance observed when the request failed, if the failure happened after the read
    pub fn balance(&self) -> Option<Decimal> {
        match self {
            WalletError::InsufficientFunds { balance, .. }
            | WalletError::BalanceOverflow { balance, .. }
            | WalletError::WriteFailure { balance, .. }
            | WalletError::CommitFailure { balance, .. } => Some(*balance),
            _ => None,
        }
    }

    /// The store failure behind a transactional error
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            WalletError::TransactionStart { source, .. }
            | WalletError::ReadFailure { source, .. }
            | WalletError::CreateFailure { source, .. }
            | WalletError::WriteFailure { source, .. }
            | WalletError::CommitFailure { source, .. }
            | WalletError::QueryFailure { source, .. } => Some(source),
            _ => None,
        }
    }
}
