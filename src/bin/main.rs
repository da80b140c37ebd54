// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Points Ledger Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use clap::Parser;
use csv::{ReaderBuilder, Trim, Writer};
use points_ledger_rs::{AccountId, EntryId, EntryKind, Ledger};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::process;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Points Ledger - Replay point transaction CSV files
///
/// Reads account and entry operations from a CSV file, applies them through
/// the ledger, and writes the resulting account balances to stdout.
#[derive(Parser, Debug)]
#[command(name = "points-ledger")]
#[command(about = "Replays a points operation CSV and prints account balances", long_about = None)]
struct Args {
    /// Path to CSV file with operations
    ///
    /// Expected format: op,account,entry,kind,points
    /// Example: cargo run -- operations.csv > balances.csv
    #[arg(value_name = "FILE")]
    input: PathBuf,
}

fn main() {
    // Log to stderr; stdout carries the balances CSV.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let file = match File::open(&args.input) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening file '{}': {}", args.input.display(), e);
            process::exit(1);
        }
    };

    let ledger = match replay_operations(BufReader::new(file)) {
        Ok(ledger) => ledger,
        Err(e) => {
            eprintln!("Error replaying operations: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = write_balances(&ledger, std::io::stdout()) {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }
}

/// One ledger operation, parsed out of a CSV row.
#[derive(Debug, Clone, Copy)]
enum Operation {
    Open(AccountId),
    Create(AccountId, EntryKind, i64),
    Update(EntryId, EntryKind, i64),
    Delete(EntryId),
}

/// Raw CSV record matching the input format.
///
/// Fields: `op, account, entry, kind, points`
#[derive(Debug, Deserialize)]
struct CsvRecord {
    op: String,
    #[serde(deserialize_with = "csv::invalid_option")]
    account: Option<u32>,
    #[serde(deserialize_with = "csv::invalid_option")]
    entry: Option<u64>,
    kind: Option<String>,
    #[serde(deserialize_with = "csv::invalid_option")]
    points: Option<i64>,
}

impl CsvRecord {
    /// Converts the record to an [`Operation`].
    ///
    /// Returns `None` for unknown ops or missing required fields.
    fn into_operation(self) -> Option<Operation> {
        match self.op.to_lowercase().as_str() {
            "open" => Some(Operation::Open(AccountId(self.account?))),
            "create" => Some(Operation::Create(
                AccountId(self.account?),
                parse_kind(&self.kind?)?,
                self.points?,
            )),
            "update" => Some(Operation::Update(
                EntryId(self.entry?),
                parse_kind(&self.kind?)?,
                self.points?,
            )),
            "delete" => Some(Operation::Delete(EntryId(self.entry?))),
            _ => None,
        }
    }
}

fn parse_kind(raw: &str) -> Option<EntryKind> {
    match raw.to_lowercase().as_str() {
        "earned" => Some(EntryKind::Earned),
        "redeemed" => Some(EntryKind::Redeemed),
        _ => None,
    }
}

/// Replays operations from a CSV reader into a fresh ledger.
///
/// Rows stream through one at a time, so arbitrarily large files are fine.
/// Malformed rows and rejected operations are skipped and logged at debug
/// level; entry IDs are assigned sequentially from 1, which is what
/// `update`/`delete` rows reference.
///
/// # CSV Format
///
/// Expected columns: `op, account, entry, kind, points`
/// - `op`: open, create, update, delete
/// - `account`: Account ID (open/create)
/// - `entry`: Entry ID (update/delete)
/// - `kind`: EARNED or REDEEMED (create/update)
/// - `points`: Positive point count (create/update)
///
/// # Example
///
/// ```csv
/// op,account,entry,kind,points
/// open,1,,,
/// create,1,,EARNED,100
/// update,,1,REDEEMED,30
/// delete,,1,
/// ```
///
/// # Errors
///
/// Returns a CSV error if the reader fails or the CSV structure is invalid.
pub fn replay_operations<R: Read>(reader: R) -> Result<Ledger, csv::Error> {
    let ledger = Ledger::new();

    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    for result in rdr.deserialize::<CsvRecord>() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                debug!(error = %e, "skipping malformed row");
                continue;
            }
        };

        let Some(operation) = record.into_operation() else {
            debug!("skipping invalid operation record");
            continue;
        };

        let outcome = match operation {
            Operation::Open(account) => ledger.open_account(account),
            Operation::Create(account, kind, points) => {
                ledger.create_entry(account, kind, points).map(|_| ())
            }
            Operation::Update(entry, kind, points) => {
                ledger.update_entry(entry, kind, points).map(|_| ())
            }
            Operation::Delete(entry) => ledger.delete_entry(entry),
        };

        if let Err(e) = outcome {
            debug!(?operation, error = %e, "operation rejected");
        }
    }

    Ok(ledger)
}

/// Writes account balances to a CSV writer.
///
/// # CSV Format
///
/// Columns: `account, balance`, ordered by account ID.
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_balances<W: Write>(ledger: &Ledger, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);

    for account in ledger.accounts() {
        wtr.serialize(&*account)?;
    }

    wtr.flush()?;
    Ok(())
}
