//! Operation types for the wallet engine
//!
//! An [`OperationRequest`] is the immutable, validated unit of work handed to a
//! wallet's lane. The balance arithmetic lives here as a pure function of the
//! operation kind, the current balance and the amount.

use super::error::WalletError;
use super::wallet::{to_balance_scale, WalletId, BALANCE_SCALE, MAX_BALANCE};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Result of one mutation: the committed balance, or why nothing was committed
pub type OperationResult = Result<Decimal, WalletError>;

/// Balance mutations supported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperationKind {
    /// Credit funds to a wallet, creating it on first use
    Deposit,

    /// Debit funds from a wallet
    ///
    /// Requires `balance >= amount`; a withdrawal that leaves exactly zero is legal.
    Withdraw,
}

impl OperationKind {
    /// Apply this operation to `balance`
    ///
    /// Both inputs are expected at the persisted scale. Errors carry the
    /// untouched pre-operation balance.
    pub fn apply(
        self,
        wallet_id: WalletId,
        balance: Decimal,
        amount: Decimal,
    ) -> Result<Decimal, WalletError> {
        match self {
            OperationKind::Deposit => balance
                .checked_add(amount)
                .filter(|next| *next <= MAX_BALANCE)
                .map(to_balance_scale)
                .ok_or_else(|| WalletError::balance_overflow(wallet_id, balance, amount)),
            OperationKind::Withdraw => {
                if balance < amount {
                    return Err(WalletError::insufficient_funds(wallet_id, balance, amount));
                }
                Ok(to_balance_scale(balance - amount))
            }
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Deposit => f.write_str("DEPOSIT"),
            OperationKind::Withdraw => f.write_str("WITHDRAW"),
        }
    }
}

impl FromStr for OperationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "deposit" => Ok(OperationKind::Deposit),
            "withdraw" | "withdrawal" => Ok(OperationKind::Withdraw),
            other => Err(format!("Invalid operation type: '{}'", other)),
        }
    }
}

/// A validated balance mutation request
///
/// Fields are private so a request can only be obtained through
/// [`OperationRequest::new`], which guarantees a positive amount at scale 4.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRequest {
    wallet_id: WalletId,
    kind: OperationKind,
    amount: Decimal,
}

impl OperationRequest {
    /// Validate and build a request
    ///
    /// # Errors
    ///
    /// * `WalletError::InvalidAmount` - amount is zero, negative, or has more
    ///   than 4 significant fractional digits
    pub fn new(
        wallet_id: WalletId,
        kind: OperationKind,
        amount: Decimal,
    ) -> Result<Self, WalletError> {
        if amount <= Decimal::ZERO || amount.normalize().scale() > BALANCE_SCALE {
            return Err(WalletError::invalid_amount(wallet_id, amount));
        }

        Ok(OperationRequest {
            wallet_id,
            kind,
            amount: to_balance_scale(amount),
        })
    }

    /// Shorthand for a deposit request
    pub fn deposit(wallet_id: WalletId, amount: Decimal) -> Result<Self, WalletError> {
        Self::new(wallet_id, OperationKind::Deposit, amount)
    }

    /// Shorthand for a withdrawal request
    pub fn withdraw(wallet_id: WalletId, amount: Decimal) -> Result<Self, WalletError> {
        Self::new(wallet_id, OperationKind::Withdraw, amount)
    }

    pub fn wallet_id(&self) -> WalletId {
        self.wallet_id
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Compute the balance this request leaves behind when applied to `balance`
    pub fn apply_to(&self, balance: Decimal) -> Result<Decimal, WalletError> {
        self.kind
            .apply(self.wallet_id, to_balance_scale(balance), self.amount)
    }
}
