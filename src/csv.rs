use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::Amount;
use crate::engine::DailyBudget;
use crate::model::{Category, NewTransaction, UnknownCategory};
use crate::session::Command;

/// Errors that can occur when reading csv command rows
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("failed to open {path:?}: {source}")]
    Open { path: PathBuf, source: csv::Error },

    #[error("line {line}: failed to parse row: {source}")]
    Parse { line: usize, source: csv::Error },

    #[error("line {line}: unrecognized command type '{kind}'")]
    UnrecognizedType { line: usize, kind: String },

    #[error("line {line}: spend missing amount")]
    MissingAmount { line: usize },

    #[error("line {line}: {reason}")]
    InvalidAmount { line: usize, reason: String },

    #[error("line {line}: spend missing category")]
    MissingCategory { line: usize },

    #[error("line {line}: {source}")]
    Category { line: usize, source: UnknownCategory },
}

#[derive(Debug, Deserialize)]
struct InputRow {
    r#type: String,
    category: Option<String>,
    amount: Option<f64>,
    description: Option<String>,
    recipient: Option<String>,
    reason: Option<String>,
}

#[derive(Debug, Serialize)]
struct OutputRow {
    date: String,
    total: String,
    usable: String,
    buffer: String,
    spent: String,
    buffer_used: String,
    closed: bool,
}

impl InputRow {
    fn into_command(self, line: usize) -> Result<Command, CsvError> {
        match self.r#type.as_str() {
            "spend" => {
                let category: Category = self
                    .category
                    .ok_or(CsvError::MissingCategory { line })?
                    .parse()
                    .map_err(|source| CsvError::Category { line, source })?;
                let amount = self.amount.ok_or(CsvError::MissingAmount { line })?;
                let amount = Amount::try_from(amount)
                    .map_err(|reason| CsvError::InvalidAmount { line, reason })?;
                let transaction = NewTransaction::new(amount, category)
                    .with_description(self.description.unwrap_or_default())
                    .with_recipient(self.recipient.unwrap_or_default());
                Ok(Command::SubmitTransaction {
                    transaction,
                    override_reason: self.reason,
                })
            }
            "close" => Ok(Command::CloseDay),
            other => Err(CsvError::UnrecognizedType {
                line,
                kind: other.to_string(),
            }),
        }
    }
}

/// Read session commands from a csv file.
///
/// Columns: `type,category,amount,description,recipient,reason`, where `type`
/// is `spend` or `close`. Bad rows are yielded as errors without stopping the
/// iteration. Pass an owned path to get an iterator that can be moved to
/// another task.
pub fn read_commands(
    path: impl AsRef<Path>,
) -> Result<impl Iterator<Item = Result<Command, CsvError>>, CsvError> {
    let path = path.as_ref();
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| CsvError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(reader
        .into_deserialize::<InputRow>()
        .enumerate()
        .map(|(idx, result)| {
            let line = idx + 2; // 1-indexed, skip header
            let row = result.map_err(|source| CsvError::Parse { line, source })?;
            row.into_command(line)
        }))
}

const OUTPUT_HEADER: [&str; 7] = [
    "date",
    "total",
    "usable",
    "buffer",
    "spent",
    "buffer_used",
    "closed",
];

/// Write one row per daily budget. The header is written even with no rows.
pub fn write_budgets<'a>(
    budgets: impl IntoIterator<Item = &'a DailyBudget>,
    out: impl io::Write,
) -> Result<(), csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(out);
    writer.write_record(OUTPUT_HEADER)?;

    for budget in budgets {
        let row = OutputRow {
            date: budget.date().to_string(),
            total: budget.total_amount().to_string(),
            usable: budget.usable_amount().to_string(),
            buffer: budget.buffer_amount().to_string(),
            spent: budget.spent().to_string(),
            buffer_used: budget.used_from_buffer().to_string(),
            closed: budget.is_closed(),
        };
        writer.serialize(&row)?;
    }

    writer.flush()?;
    Ok(())
}
