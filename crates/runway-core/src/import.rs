//! CSV import for transaction history
//!
//! Expected header: `date,description,amount,category` with optional `type`
//! (income/expense/credit/debit) and `recurring` columns, in any order.
//! Without a `type` column the sign of the amount decides: negative amounts
//! are expenses, positive ones income.

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use std::io::Read;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{Transaction, TransactionKind};

/// Column positions resolved from the header row
struct Columns {
    date: usize,
    description: Option<usize>,
    amount: usize,
    category: Option<usize>,
    kind: Option<usize>,
    recurring: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };

        Ok(Self {
            date: find("date").ok_or_else(|| Error::Import("Missing 'date' column".into()))?,
            description: find("description"),
            amount: find("amount").ok_or_else(|| Error::Import("Missing 'amount' column".into()))?,
            category: find("category"),
            kind: find("type"),
            recurring: find("recurring"),
        })
    }
}

/// Parse a history CSV into transactions
pub fn parse_history_csv<R: Read>(reader: R) -> Result<Vec<Transaction>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns = Columns::from_headers(rdr.headers()?)?;
    let mut transactions = Vec::new();

    for (index, result) in rdr.records().enumerate() {
        let record = result?;
        // Header is line 1
        let line = index + 2;

        if record.iter().all(|field| field.is_empty()) {
            continue;
        }

        let field = |i: usize| record.get(i).unwrap_or("");
        let optional = |i: Option<usize>| i.map(field).unwrap_or("");

        let date = parse_date(field(columns.date)).map_err(|e| at_line(line, e))?;
        let signed = parse_amount(field(columns.amount)).map_err(|e| at_line(line, e))?;

        let kind = match optional(columns.kind) {
            "" if signed < 0.0 => TransactionKind::Expense,
            "" => TransactionKind::Income,
            value => value
                .parse::<TransactionKind>()
                .map_err(|e| Error::Import(format!("line {}: {}", line, e)))?,
        };

        let recurring = parse_flag(optional(columns.recurring)).map_err(|e| at_line(line, e))?;

        transactions.push(Transaction {
            id: format!("csv-{}", line),
            date,
            description: optional(columns.description).to_string(),
            amount: signed.abs(),
            kind,
            category: optional(columns.category).to_lowercase(),
            recurring,
        });
    }

    debug!("Parsed {} history transactions", transactions.len());
    Ok(transactions)
}

/// Prefix an import error with its CSV line number
fn at_line(line: usize, error: Error) -> Error {
    match error {
        Error::Import(msg) => Error::Import(format!("line {}: {}", line, msg)),
        other => other,
    }
}

/// Parse a date string trying several common formats
fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();

    let formats = [
        "%Y-%m-%d", // 2024-01-15
        "%d/%m/%Y", // 15/01/2024
        "%d-%m-%Y", // 15-01-2024
        "%Y/%m/%d", // 2024/01/15
        "%d %b %Y", // 15 Jan 2024
    ];

    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }

    Err(Error::Import(format!("Unable to parse date: {}", s)))
}

/// Parse an amount string, handling currency symbols and separators
fn parse_amount(s: &str) -> Result<f64> {
    let cleaned: String = s
        .trim()
        .replace(['$', '₹', '€', '£', ',', ' '], "")
        .replace('(', "-")
        .replace(')', "");

    let amount = cleaned
        .parse::<f64>()
        .map_err(|_| Error::Import(format!("Unable to parse amount: {}", s)))?;
    if !amount.is_finite() {
        return Err(Error::Import(format!("Amount is not a number: {}", s)));
    }
    Ok(amount)
}

fn parse_flag(s: &str) -> Result<bool> {
    match s.trim().to_lowercase().as_str() {
        "" | "false" | "no" | "0" => Ok(false),
        "true" | "yes" | "1" => Ok(true),
        other => Err(Error::Import(format!("Invalid recurring flag: {}", other))),
    }
}
