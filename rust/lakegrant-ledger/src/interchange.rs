//! Flat, line-oriented ledger serialization.
//!
//! Each (principal, resource) pair becomes one line with three fields, all
//! of them quoted: `"principal","resource","[action1,action2]"`. Reading a
//! ledger back yields the same set of records, though not necessarily in
//! the same order.

use std::path::Path;

use csv_async::{AsyncReaderBuilder, AsyncWriterBuilder, QuoteStyle};
use futures_util::StreamExt;
use itertools::Itertools;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::{LakegrantLedgerError, PermissionLedger};

/// Write every record of a ledger to `writer`
pub async fn export_ledger<W>(
    ledger: &PermissionLedger,
    writer: W,
) -> Result<(), LakegrantLedgerError>
where
    W: AsyncWrite + Unpin + Send,
{
    let mut writer = AsyncWriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::Always)
        .create_writer(writer);

    for record in ledger.iter() {
        let actions = format!("[{}]", record.actions().iter().join(","));
        writer
            .write_record(&[record.principal(), record.resource(), actions.as_str()])
            .await?;
    }

    writer.flush().await?;
    Ok(())
}

/// Read a ledger previously written by [`export_ledger`]. Lines that do
/// not have three fields, or that carry no actions, are skipped.
pub async fn import_ledger<R>(reader: R) -> Result<PermissionLedger, LakegrantLedgerError>
where
    R: AsyncRead + Unpin + Send,
{
    let mut reader = AsyncReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .create_reader(reader);

    let mut ledger = PermissionLedger::default();
    let mut records = reader.records();

    while let Some(record) = records.next().await {
        let record = record?;
        let (Some(principal), Some(resource), Some(actions), None) =
            (record.get(0), record.get(1), record.get(2), record.get(3))
        else {
            tracing::warn!("Skipping malformed ledger line: {:?}", record);
            continue;
        };

        let actions = parse_actions(actions);
        if actions.is_empty() {
            tracing::warn!("Skipping ledger line without actions: {principal} {resource}");
            continue;
        }

        ledger.add_actions(principal, resource, actions);
    }

    Ok(ledger)
}

/// Write a ledger to a file, replacing any existing content
pub async fn export_ledger_to_path(
    ledger: &PermissionLedger,
    path: impl AsRef<Path>,
) -> Result<(), LakegrantLedgerError> {
    let file = tokio::fs::File::create(path.as_ref()).await?;
    export_ledger(ledger, file).await?;
    tracing::info!(
        "Exported {} records to {}",
        ledger.len(),
        path.as_ref().display()
    );
    Ok(())
}

/// Read a ledger from a file written by [`export_ledger_to_path`]
pub async fn import_ledger_from_path(
    path: impl AsRef<Path>,
) -> Result<PermissionLedger, LakegrantLedgerError> {
    let file = tokio::fs::File::open(path.as_ref()).await?;
    let ledger = import_ledger(file).await?;
    tracing::info!(
        "Imported {} records from {}",
        ledger.len(),
        path.as_ref().display()
    );
    Ok(ledger)
}

fn parse_actions(field: &str) -> Vec<&str> {
    let field = field.trim();
    let field = field
        .strip_prefix('[')
        .and_then(|field| field.strip_suffix(']'))
        .unwrap_or(field);

    field
        .split(',')
        .map(|action| action.trim().trim_matches(|c| c == '\'' || c == '"'))
        .filter(|action| !action.is_empty())
        .collect()
}
