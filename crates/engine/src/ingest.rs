//! String-based CSV ingest for the fixed statement layout
//! `id,date,description,amount,type`.
//!
//! Parsing stays in the engine crate so both the CLI and tests share one
//! set of rules; no filesystem access happens here.

use chrono::NaiveDate;

use crate::error::ReconError;
use crate::model::{Transaction, TxnKind};

pub fn load_csv_transactions(side: &str, csv_data: &str) -> Result<Vec<Transaction>, ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(csv_data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ReconError::Io(e.to_string()))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let idx = |name: &str| -> Result<usize, ReconError> {
        headers.iter().position(|h| h == name).ok_or_else(|| ReconError::MissingColumn {
            side: side.into(),
            column: name.into(),
        })
    };

    let id_idx = idx("id")?;
    let date_idx = idx("date")?;
    let desc_idx = idx("description")?;
    let amount_idx = idx("amount")?;
    let type_idx = idx("type")?;

    let mut txns = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ReconError::Io(e.to_string()))?;
        let id = record.get(id_idx).unwrap_or("").to_string();

        let date_str = record.get(date_idx).unwrap_or("");
        let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|_| {
            ReconError::DateParse {
                side: side.into(),
                record: id.clone(),
                value: date_str.into(),
            }
        })?;

        let amount_str = record.get(amount_idx).unwrap_or("");
        let amount_cents =
            parse_amount_cents(amount_str).ok_or_else(|| ReconError::AmountParse {
                side: side.into(),
                record: id.clone(),
                value: amount_str.into(),
            })?;

        let type_str = record.get(type_idx).unwrap_or("");
        let kind = TxnKind::parse(type_str).ok_or_else(|| ReconError::KindParse {
            side: side.into(),
            record: id.clone(),
            value: type_str.into(),
        })?;

        txns.push(Transaction::new(
            id,
            date,
            record.get(desc_idx).unwrap_or("").to_string(),
            amount_cents,
            kind,
        ));
    }

    Ok(txns)
}

/// Parse a decimal amount with at most two fractional digits into integer
/// cents. Anything else (three decimals, thousands separators, exponent
/// notation) is rejected rather than rounded.
pub fn parse_amount_cents(value: &str) -> Option<i64> {
    let v = value.trim();
    let (negative, digits) = match v.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, v),
    };
    let (whole, frac) = match digits.split_once('.') {
        Some((w, f)) => (w, f),
        None => (digits, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if frac.len() > 2 {
        return None;
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let whole_cents = if whole.is_empty() {
        0
    } else {
        whole.parse::<i64>().ok()?.checked_mul(100)?
    };
    let frac_cents = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().ok()? * 10,
        _ => frac.parse::<i64>().ok()?,
    };
    let cents = whole_cents.checked_add(frac_cents)?;
    Some(if negative { -cents } else { cents })
}
