//! Asynchronous CSV reader with batch interface
//!
//! Provides a streaming interface over operation records from a CSV file.
//!
//! # Design
//!
//! The AsyncReader uses:
//! - csv-async for streaming CSV parsing
//! - futures `StreamExt` to pull records
//! - Batch reading so the driver can submit a batch, then read the next one
//!
//! ```text
//! CSV Reader → AsyncReader → Batches of OperationRequests
//!                  ↓
//!           csv_format module
//!           (CsvOperation, convert_csv_operation)
//! ```

use crate::io::csv_format::{convert_csv_operation, CsvOperation};
use crate::types::OperationRequest;
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;

/// A batch read from the input, with the number of rows that were rejected
#[derive(Debug, Default)]
pub struct Batch {
    pub requests: Vec<OperationRequest>,
    pub rejected: usize,
}

impl Batch {
    /// True once the input is exhausted
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty() && self.rejected == 0
    }
}

/// Asynchronous CSV reader
///
/// Maintains streaming behavior with constant memory usage per batch.
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    /// Create a new AsyncReader from an async reader
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self { csv_reader }
    }

    /// Read up to `batch_size` rows
    ///
    /// Rows that fail to parse or validate are logged and counted in
    /// `Batch::rejected`. An empty batch means the end of the input.
    pub async fn read_batch(&mut self, batch_size: usize) -> Batch {
        let mut batch = Batch {
            requests: Vec::with_capacity(batch_size),
            rejected: 0,
        };
        let mut records = self.csv_reader.deserialize::<CsvOperation>();

        while batch.requests.len() + batch.rejected < batch_size {
            match records.next().await {
                Some(Ok(record)) => match convert_csv_operation(record) {
                    Ok(request) => batch.requests.push(request),
                    Err(e) => {
                        tracing::warn!("Record conversion error: {}", e);
                        batch.rejected += 1;
                    }
                },
                Some(Err(e)) => {
                    tracing::warn!("CSV parse error: {}", e);
                    batch.rejected += 1;
                }
                None => break,
            }
        }

        batch
    }
}
