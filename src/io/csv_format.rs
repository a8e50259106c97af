//! CSV format handling for operation records and balance output
//!
//! This module centralizes all CSV format concerns, providing:
//! - CsvOperation structure for deserialization
//! - Conversion from CSV records to validated operation requests
//! - Balance output serialization
//!
//! All functions are pure (no I/O) for easy testing.

use crate::types::{OperationKind, OperationRequest, Wallet, WalletId};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// CSV record structure for deserialization
///
/// Matches the input CSV format with columns: wallet_id, operation, amount
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CsvOperation {
    pub wallet_id: String,
    pub operation: String,
    pub amount: String,
}

/// Convert a CsvOperation to an OperationRequest
///
/// This function:
/// - Parses the wallet id as a UUID
/// - Parses the operation string (case-insensitive) into an OperationKind
/// - Parses the amount into a Decimal and validates it through `OperationRequest::new`
///
/// # Returns
///
/// * `Ok(OperationRequest)` - Successfully converted record
/// * `Err(String)` - Error message describing the conversion failure
pub fn convert_csv_operation(record: CsvOperation) -> Result<OperationRequest, String> {
    let wallet_id = WalletId::parse_str(record.wallet_id.trim())
        .map_err(|_| format!("Invalid wallet id '{}'", record.wallet_id))?;

    let kind = OperationKind::from_str(&record.operation)
        .map_err(|e| format!("{} for wallet {}", e, wallet_id))?;

    let amount = Decimal::from_str(record.amount.trim())
        .map_err(|_| format!("Invalid amount '{}' for wallet {}", record.amount, wallet_id))?;

    OperationRequest::new(wallet_id, kind, amount).map_err(|e| e.to_string())
}

/// Write wallet balances to CSV format
///
/// Writes wallets with columns: wallet_id, balance. Wallets are sorted by id
/// for deterministic output and balances are printed with 4 decimals.
pub fn write_balances_csv(wallets: &[Wallet], output: &mut dyn Write) -> Result<(), String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer
        .write_record(["wallet_id", "balance"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted = wallets.to_vec();
    sorted.sort_by_key(|wallet| wallet.wallet_id);

    for wallet in sorted {
        writer
            .write_record(&[
                wallet.wallet_id.to_string(),
                format!("{:.4}", wallet.balance),
            ])
            .map_err(|e| format!("Failed to write wallet record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}
