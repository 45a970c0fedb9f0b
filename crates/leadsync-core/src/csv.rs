//! Lead CSV import/export plus JSON export.

use chrono::NaiveDate;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::models::Lead;

/// Export columns, in order
pub const CSV_COLUMNS: [&str; 6] = [
    "created_time",
    "platform",
    "name",
    "whatsapp_number_",
    "lead_status",
    "comments",
];

/// Export output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

/// Default export file name, e.g. `leads_export_2024-03-10.csv`
#[must_use]
pub fn suggested_export_file_name(date: NaiveDate, format: ExportFormat) -> String {
    format!(
        "leads_export_{}.{}",
        date.format("%Y-%m-%d"),
        format.extension()
    )
}

/// Render leads as CSV with every field quoted.
///
/// Embedded newlines become spaces so each lead stays on one line.
#[must_use]
pub fn render_csv(leads: &[Lead]) -> String {
    let mut lines = Vec::with_capacity(leads.len() + 1);
    lines.push(CSV_COLUMNS.join(","));
    for lead in leads {
        let cells = [
            &lead.created_time,
            &lead.platform,
            &lead.name,
            &lead.contact_number,
            &lead.lead_status,
            &lead.comments,
        ];
        lines.push(
            cells
                .iter()
                .map(|cell| quote_cell(cell))
                .collect::<Vec<_>>()
                .join(","),
        );
    }
    let mut output = lines.join("\n");
    output.push('\n');
    output
}

fn quote_cell(cell: &str) -> String {
    let flattened = cell.replace("\r\n", " ").replace(['\n', '\r'], " ");
    format!("\"{}\"", flattened.replace('"', "\"\""))
}

/// Render leads as pretty-printed JSON.
pub fn render_json(leads: &[Lead]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(leads)
}

/// Parse CSV text into unsaved leads.
///
/// The first record must be a header. Columns are matched by wire name or
/// by label (`Created Time`, `WhatsApp Number`, ...); other columns land in
/// the lead's extra fields.
pub fn parse_csv(input: &str) -> Result<Vec<Lead>> {
    let mut records = parse_records(input)?.into_iter();
    let Some((header_line, header)) = records.next() else {
        return Err(Error::Csv {
            line: 1,
            message: "missing header row".into(),
        });
    };
    let columns: Vec<String> = header.iter().map(|name| column_key(name)).collect();
    if columns.iter().all(|column| !CSV_COLUMNS.contains(&column.as_str())) {
        return Err(Error::Csv {
            line: header_line,
            message: "header does not name any lead column".into(),
        });
    }

    let mut leads = Vec::new();
    for (line, cells) in records {
        if cells.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        if cells.len() > columns.len() {
            return Err(Error::Csv {
                line,
                message: format!(
                    "expected at most {} fields, found {}",
                    columns.len(),
                    cells.len()
                ),
            });
        }

        let mut lead = Lead::default();
        for (column, cell) in columns.iter().zip(cells) {
            let cell = cell.trim().to_string();
            match column.as_str() {
                "created_time" => lead.created_time = cell,
                "platform" => lead.platform = cell,
                "name" => lead.name = cell,
                "whatsapp_number_" => lead.contact_number = cell,
                "lead_status" => lead.lead_status = cell,
                "comments" => lead.comments = cell,
                "id" | "" => {}
                other => {
                    if !cell.is_empty() {
                        lead.extra.insert(other.to_string(), Value::String(cell));
                    }
                }
            }
        }
        leads.push(lead);
    }
    Ok(leads)
}

/// Map a header cell to the lead key it fills
fn column_key(header: &str) -> String {
    let normalized = header
        .trim()
        .trim_start_matches('\u{feff}')
        .to_lowercase()
        .replace([' ', '-'], "_");
    match normalized.as_str() {
        "whatsapp_number" | "whatsapp" | "contact_number" | "phone" => {
            "whatsapp_number_".to_string()
        }
        "status" => "lead_status".to_string(),
        "created" | "created_at" => "created_time".to_string(),
        _ => normalized,
    }
}

/// Split CSV text into records of cells, tagged with their 1-based
/// starting line. Quoted cells may contain commas, quotes and newlines.
fn parse_records(input: &str) -> Result<Vec<(usize, Vec<String>)>> {
    let mut records = Vec::new();
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut record_line = 1;
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    cell.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    cell.push(ch);
                }
                _ => cell.push(ch),
            }
            continue;
        }

        match ch {
            '"' if cell.trim().is_empty() => {
                cell.clear();
                in_quotes = true;
            }
            ',' => cells.push(std::mem::take(&mut cell)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                cells.push(std::mem::take(&mut cell));
                records.push((record_line, std::mem::take(&mut cells)));
                line += 1;
                record_line = line;
            }
            _ => cell.push(ch),
        }
    }

    if in_quotes {
        return Err(Error::Csv {
            line: record_line,
            message: "unterminated quoted field".into(),
        });
    }
    if !cell.is_empty() || !cells.is_empty() {
        cells.push(cell);
        records.push((record_line, cells));
    }
    Ok(records)
}
