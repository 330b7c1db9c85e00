//! Loading the combined payment and purchase history and narrowing it down.

use std::{fmt::Display, str::FromStr};

use rusqlite::{Connection, types::Type};
use serde::{Deserialize, Deserializer};
use time::{Date, Duration, OffsetDateTime, UtcOffset, macros::format_description};

use crate::{
    Error,
    reference::{FeeType, School, SchoolId, resolve_school_id},
    timezone::start_of_local_day,
    workflow::TransactionKind,
};

/// One row of the history table.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRecord {
    pub kind: TransactionKind,
    /// The enrollee's full name for payments, the item name for purchases.
    pub name: String,
    pub amount: f64,
    /// The fee type for payments, the quantity for purchases.
    pub category: String,
    /// The month and year paid, e.g. "March 2025".
    pub period: String,
    pub created_at: OffsetDateTime,
    pub school_id: SchoolId,
}

/// The filters chosen on the history page.
///
/// `None` means "All". Every filter that is set must match.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HistoryFilter {
    #[serde(default, deserialize_with = "deserialize_date")]
    pub start_date: Option<Date>,
    #[serde(default, deserialize_with = "deserialize_date")]
    pub end_date: Option<Date>,
    #[serde(default, deserialize_with = "deserialize_choice")]
    pub school: Option<School>,
    #[serde(default, deserialize_with = "deserialize_choice")]
    pub kind: Option<TransactionKind>,
    #[serde(default, deserialize_with = "deserialize_choice")]
    pub fee_type: Option<FeeType>,
}

impl HistoryFilter {
    /// The filter as a URL query string, with unset filters left empty.
    pub fn to_query_string(&self) -> String {
        fn or_empty<T: ToString>(value: Option<T>) -> String {
            value.map(|value| value.to_string()).unwrap_or_default()
        }

        serde_urlencoded::to_string([
            ("start_date", or_empty(self.start_date)),
            ("end_date", or_empty(self.end_date)),
            ("school", or_empty(self.school)),
            ("kind", or_empty(self.kind)),
            ("fee_type", or_empty(self.fee_type)),
        ])
        .unwrap_or_default()
    }
}

fn is_all(value: &str) -> bool {
    value.is_empty() || value == "All"
}

fn deserialize_choice<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(value) if !is_all(&value) => value.parse().map(Some).map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

fn deserialize_date<'de, D>(deserializer: D) -> Result<Option<Date>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(value) if !is_all(&value) => {
            Date::parse(&value, format_description!("[year]-[month]-[day]"))
                .map(Some)
                .map_err(serde::de::Error::custom)
        }
        _ => Ok(None),
    }
}

/// Load every payment and purchase, newest first.
pub fn get_all_records(connection: &Connection) -> Result<Vec<HistoryRecord>, Error> {
    connection
        .prepare(
            "SELECT 'Payment', e.first_name || ' ' || e.last_name, p.amount, p.fee_type,
                p.month_paid || ' ' || p.year_paid, p.created_at, p.school_id
            FROM payments p
            INNER JOIN enrollees e ON p.enrollee_id = e.enrollee_id
            UNION ALL
            SELECT 'Purchase', i.item_name, pu.amount, CAST(pu.quantity AS TEXT),
                pu.month_paid || ' ' || pu.year_paid, pu.created_at, pu.school_id
            FROM purchases pu
            INNER JOIN items i ON pu.item_id = i.item_id
            ORDER BY 6 DESC",
        )?
        .query_map([], |row| {
            let kind: String = row.get(0)?;
            let kind = TransactionKind::from_str(&kind).map_err(|error| {
                rusqlite::Error::FromSqlConversionFailure(0, Type::Text, error.into())
            })?;

            Ok(HistoryRecord {
                kind,
                name: row.get(1)?,
                amount: row.get(2)?,
                category: row.get(3)?,
                period: row.get(4)?,
                created_at: row.get(5)?,
                school_id: row.get(6)?,
            })
        })?
        .map(|record| record.map_err(Error::from))
        .collect()
}

/// Keep the records that match `filter`, newest first.
///
/// The date range covers whole local days, so `end_date` is moved to the
/// start of the following day before comparing. Choosing a fee type keeps
/// only payments of that fee type, so no purchases are left.
pub fn apply_filter(
    records: Vec<HistoryRecord>,
    filter: &HistoryFilter,
    school_id: Option<SchoolId>,
    local_offset: UtcOffset,
) -> Vec<HistoryRecord> {
    let lower_bound = filter
        .start_date
        .map(|date| start_of_local_day(date, local_offset));
    let upper_bound = filter
        .end_date
        .map(|date| start_of_local_day(date, local_offset) + Duration::days(1));

    let mut records: Vec<_> = records
        .into_iter()
        .filter(|record| lower_bound.is_none_or(|bound| record.created_at >= bound))
        .filter(|record| upper_bound.is_none_or(|bound| record.created_at <= bound))
        .filter(|record| {
            filter.fee_type.is_none_or(|fee_type| {
                record.kind == TransactionKind::Payment && record.category == fee_type.as_str()
            })
        })
        .filter(|record| school_id.is_none_or(|id| record.school_id == id))
        .filter(|record| filter.kind.is_none_or(|kind| record.kind == kind))
        .collect();

    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    records
}

/// Load the history and apply `filter`.
///
/// # Errors
///
/// Returns an error if the records cannot be loaded or the chosen school
/// does not resolve.
pub fn query_history(
    filter: &HistoryFilter,
    local_offset: UtcOffset,
    connection: &Connection,
) -> Result<Vec<HistoryRecord>, Error> {
    let school_id = filter
        .school
        .map(|school| resolve_school_id(school.name(), connection))
        .transpose()?;
    let records = get_all_records(connection)?;

    Ok(apply_filter(records, filter, school_id, local_offset))
}

/// The totals shown above the history table.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HistoryTotals {
    pub payments: f64,
    pub purchases: f64,
}

/// Sum the amounts of `records` by kind.
pub fn compute_totals(records: &[HistoryRecord]) -> HistoryTotals {
    records
        .iter()
        .fold(HistoryTotals::default(), |mut totals, record| {
            match record.kind {
                TransactionKind::Payment => totals.payments += record.amount,
                TransactionKind::Purchase => totals.purchases += record.amount,
            }

            totals
        })
}
