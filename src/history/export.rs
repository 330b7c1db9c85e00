//! Downloading the filtered history as a CSV file.

use axum::{
    extract::State,
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use csv::WriterBuilder;
use serde::Serialize;
use time::{UtcOffset, macros::format_description};

use crate::{
    Error,
    history::{FilterQuery, HistoryRecord, HistoryState},
};

const CSV_FILE_NAME: &str = "Report.csv";

const CSV_HEADER: [&str; 6] = [
    "Type",
    "Name/Item",
    "Amount",
    "Category/Quantity",
    "Period",
    "created_at",
];

#[derive(Serialize)]
struct ExportRow<'a> {
    kind: &'a str,
    name: &'a str,
    amount: f64,
    category: &'a str,
    period: &'a str,
    created_at: String,
}

/// Write `records` as CSV, showing times in local time.
///
/// The header row is always written, even when there are no records.
///
/// # Errors
///
/// Returns [Error::CsvExport] if a row could not be written.
pub fn export_history_csv(
    records: &[HistoryRecord],
    local_offset: UtcOffset,
) -> Result<Vec<u8>, Error> {
    let timestamp_format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(vec![]);
    writer
        .write_record(CSV_HEADER)
        .map_err(|error| Error::CsvExport(error.to_string()))?;

    for record in records {
        let created_at = record
            .created_at
            .to_offset(local_offset)
            .format(timestamp_format)
            .map_err(|error| Error::CsvExport(error.to_string()))?;

        writer
            .serialize(ExportRow {
                kind: record.kind.as_str(),
                name: &record.name,
                amount: record.amount,
                category: &record.category,
                period: &record.period,
                created_at,
            })
            .map_err(|error| Error::CsvExport(error.to_string()))?;
    }

    writer
        .into_inner()
        .map_err(|error| Error::CsvExport(error.to_string()))
}

/// A route handler that sends the history matching the query as a CSV attachment.
pub async fn get_history_csv(
    State(state): State<HistoryState>,
    FilterQuery(filter): FilterQuery,
) -> Result<Response, Error> {
    let local_offset = state.local_offset()?;
    let records = state.records(&filter, local_offset);

    let body = export_history_csv(&records, local_offset).inspect_err(|error| {
        tracing::error!("Could not export {} history rows: {error}", records.len());
    })?;

    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{CSV_FILE_NAME}\""),
            ),
        ],
        body,
    )
        .into_response())
}
