//! Sheet list parsing
//!
//! Input is one sheet per line, `number<TAB>name`. Lines without a tab, or
//! with an empty number or name, are skipped.

use serde::{Deserialize, Serialize};

/// One sheet to create
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetRow {
    pub number: String,
    pub name: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SheetInputError {
    #[error("No valid 'number<TAB>name' rows in sheet list")]
    NoValidRows,
}

/// Parse a tab-separated sheet list
///
/// A number listed twice keeps its first position and takes the later name.
pub fn parse_sheet_list(text: &str) -> Result<Vec<SheetRow>, SheetInputError> {
    let mut rows: Vec<SheetRow> = Vec::new();

    for line in text.lines().map(str::trim) {
        let Some((number, name)) = line.split_once('\t') else {
            if !line.is_empty() {
                tracing::debug!(line, "Skipping sheet line without a tab");
            }
            continue;
        };

        let (number, name) = (number.trim(), name.trim());
        if number.is_empty() || name.is_empty() {
            tracing::debug!(line, "Skipping incomplete sheet line");
            continue;
        }

        match rows.iter_mut().find(|row| row.number == number) {
            Some(row) => row.name = name.to_string(),
            None => rows.push(SheetRow {
                number: number.to_string(),
                name: name.to_string(),
            }),
        }
    }

    if rows.is_empty() {
        return Err(SheetInputError::NoValidRows);
    }

    Ok(rows)
}
