use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rusqlite::types::ValueRef;
use rusqlite::Row;
use serde_json::Value;

use super::{date_string, escape_like, Database};
use crate::search::{
    Collection, DateFilter, DateOperator, Filter, Record, SearchBackend, SearchQuery, TextFilter,
    TextOperator,
};

impl SearchBackend for Database {
    /// Run a validated query. Filters are ANDed in order; every value is a
    /// bound parameter and every identifier comes from the field enums.
    fn execute(&self, query: &SearchQuery) -> Result<Vec<Record>> {
        let mut clauses = Vec::with_capacity(query.filters.len());
        let mut params: Vec<String> = Vec::with_capacity(query.filters.len());
        for filter in &query.filters {
            let (clause, value) = match filter {
                Filter::Text(f) => text_predicate(f),
                Filter::Date(f) => date_predicate(f)?,
            };
            clauses.push(clause);
            params.push(value);
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };
        let sql = format!(
            "SELECT * FROM {}{} ORDER BY {} LIMIT {}",
            query.table.as_str(),
            where_clause,
            natural_order(query.table),
            query.limit
        );
        tracing::debug!(%sql, params = ?params, "search query");

        let mut stmt = self.conn.prepare(&sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let records = stmt
            .query_map(rusqlite::params_from_iter(params.iter()), |row| {
                row_to_record(row, &columns)
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(records)
    }
}

fn natural_order(table: Collection) -> &'static str {
    match table {
        Collection::Contacts => "name COLLATE NOCASE",
        Collection::Interactions => "occurred_at DESC",
        Collection::FollowUps => "due_date ASC",
    }
}

fn text_predicate(filter: &TextFilter) -> (String, String) {
    let column = filter.field.as_str();
    match filter.operator {
        TextOperator::Eq => (format!("{} = ?", column), filter.value.clone()),
        TextOperator::Neq => (format!("{} <> ?", column), filter.value.clone()),
        TextOperator::Ilike => (
            format!("casefold({}) LIKE casefold(?) ESCAPE '\\'", column),
            format!("%{}%", escape_like(&filter.value)),
        ),
    }
}

/// A plain date compares by calendar day; a date-time compares to the second
/// in UTC. Anything else is rejected the way a database rejects a bad date
/// literal.
fn date_predicate(filter: &DateFilter) -> Result<(String, String)> {
    let column = filter.field.as_str();
    let op = match filter.operator {
        DateOperator::Gte => ">=",
        DateOperator::Lte => "<=",
        DateOperator::Eq => "=",
    };

    match parse_date_value(filter.value.trim()) {
        Some(DateValue::Day(day)) => Ok((format!("date({}) {} ?", column, op), date_string(&day))),
        Some(DateValue::Instant(at)) => Ok((
            format!("datetime({}) {} ?", column, op),
            at.format("%Y-%m-%d %H:%M:%S").to_string(),
        )),
        None => Err(anyhow!(
            "invalid input syntax for type date: \"{}\"",
            filter.value
        )),
    }
}

enum DateValue {
    Day(NaiveDate),
    Instant(DateTime<Utc>),
}

fn parse_date_value(value: &str) -> Option<DateValue> {
    if let Ok(day) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(DateValue::Day(day));
    }
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Some(DateValue::Instant(at.with_timezone(&Utc)));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| DateValue::Instant(naive.and_utc()))
}

fn row_to_record(row: &Row, columns: &[String]) -> rusqlite::Result<Record> {
    let mut record = Record::new();
    for (idx, name) in columns.iter().enumerate() {
        let value = match row.get_ref(idx)? {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::from(i),
            ValueRef::Real(f) => serde_json::Number::from_f64(f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            ValueRef::Text(bytes) => Value::from(String::from_utf8_lossy(bytes).into_owned()),
            ValueRef::Blob(bytes) => Value::from(bytes.to_vec()),
        };
        record.insert(name.clone(), value);
    }
    Ok(record)
}
