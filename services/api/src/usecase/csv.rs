//! CSV ingestion: uploaded file → validated recipients.

use courier_domain::email::is_valid_email;
use courier_domain::recipient::{MAX_BULK_RECIPIENTS, Recipient};

use crate::error::ApiError;

/// Largest accepted upload (5 MiB).
pub const MAX_CSV_BYTES: usize = 5 * 1024 * 1024;

const EMAIL_HEADERS: [&str; 3] = ["email", "email_address", "to"];
const NAME_HEADERS: [&str; 3] = ["name", "full_name", "recipient_name"];

#[derive(Debug, Default, PartialEq, Eq)]
pub struct CsvReport {
    /// Non-empty data rows seen, valid or not.
    pub total_records: usize,
    /// First [`MAX_BULK_RECIPIENTS`] valid rows, in file order.
    pub valid_emails: Vec<Recipient>,
    pub errors: Vec<String>,
}

/// Reject uploads by name and size before reading them.
pub fn validate_upload(file_name: &str, size: usize) -> Result<(), ApiError> {
    if !file_name.to_ascii_lowercase().ends_with(".csv") {
        return Err(ApiError::InvalidCsv("File must be a CSV file".to_owned()));
    }
    if size > MAX_CSV_BYTES {
        return Err(ApiError::InvalidCsv(
            "File size must be less than 5MB".to_owned(),
        ));
    }
    Ok(())
}

/// Validate and parse an upload in one step.
pub fn process_upload(file_name: &str, data: &[u8]) -> Result<CsvReport, ApiError> {
    validate_upload(file_name, data.len())?;
    parse_recipients(data)
}

/// Parse CSV bytes into recipients.
///
/// Only a missing/unreadable header or a header without an email column fails the whole
/// file; every per-row problem becomes an entry in `errors`.
pub fn parse_recipients(data: &[u8]) -> Result<CsvReport, ApiError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data);
    let mut records = reader.records();

    let header = match records.next() {
        Some(Ok(header)) => header,
        _ => return Err(ApiError::InvalidCsv("Failed to read CSV headers".to_owned())),
    };
    let (email_col, name_col) = locate_columns(&header);
    let email_col = email_col.ok_or_else(|| {
        ApiError::InvalidCsv("CSV must contain an 'email' column".to_owned())
    })?;

    let mut report = CsvReport::default();
    let mut valid = Vec::new();

    for row in records {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                report.errors.push(format!(
                    "Error reading row {}: {e}",
                    report.total_records + 1
                ));
                continue;
            }
        };
        if is_blank(&row) {
            continue;
        }
        report.total_records += 1;
        let n = report.total_records;

        let email = row.get(email_col).map(str::trim).unwrap_or("");
        if email.is_empty() {
            report.errors.push(format!("Row {n}: Missing email address"));
            continue;
        }
        if !is_valid_email(email) {
            report
                .errors
                .push(format!("Row {n}: Invalid email format: {email}"));
            continue;
        }
        let name = name_col
            .and_then(|i| row.get(i))
            .map(str::trim)
            .unwrap_or("");
        valid.push(Recipient::new(email, name));
    }

    if valid.len() > MAX_BULK_RECIPIENTS {
        valid.truncate(MAX_BULK_RECIPIENTS);
        report.errors.push(format!(
            "Limited to first {MAX_BULK_RECIPIENTS} emails"
        ));
    }
    report.valid_emails = valid;
    Ok(report)
}

/// Indices of the email and name columns. A later alias wins over an earlier one.
fn locate_columns(header: &csv::StringRecord) -> (Option<usize>, Option<usize>) {
    let mut email_col = None;
    let mut name_col = None;
    for (i, cell) in header.iter().enumerate() {
        let key = cell.trim_start_matches('\u{feff}').trim().to_lowercase();
        if EMAIL_HEADERS.contains(&key.as_str()) {
            email_col = Some(i);
        } else if NAME_HEADERS.contains(&key.as_str()) {
            name_col = Some(i);
        }
    }
    (email_col, name_col)
}

fn is_blank(row: &csv::StringRecord) -> bool {
    row.is_empty() || (row.len() == 1 && row[0].trim().is_empty())
}
