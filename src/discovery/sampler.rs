//! Column value sampling.
//!
//! Each column gets three small statements: up to N non-null values, a
//! distinct count and a null count. The counts only look at a fixed prefix
//! of the table so sampling never scans a large table end to end. A column
//! whose statements fail is reported with a placeholder entry and the
//! remaining columns are still sampled.

use super::table_not_found;
use crate::db::catalog::CatalogRow;
use crate::db::provider::CatalogConnection;
use crate::db::schema::{
    CATALOG_ROW_LIMIT, catalog_sql, distinct_count_sql, null_count_sql, sample_values_sql,
};
use crate::error::{DbError, DbResult};
use crate::models::{ColumnSample, DatabaseType, QueryParam};
use serde_json::Value as JsonValue;
use tracing::warn;

pub const DEFAULT_SAMPLE_SIZE: u32 = 3;
pub const MAX_SAMPLE_SIZE: u32 = 10;

/// Default to 3 and cap at 10.
pub fn effective_sample_size(requested: Option<u32>) -> usize {
    requested
        .unwrap_or(DEFAULT_SAMPLE_SIZE)
        .clamp(1, MAX_SAMPLE_SIZE) as usize
}

pub(crate) async fn sample_values<C: CatalogConnection>(
    conn: &mut C,
    db: DatabaseType,
    table: &str,
    column_names: Option<&[String]>,
    sample_size: usize,
    redact_errors: bool,
) -> DbResult<Vec<ColumnSample>> {
    let sql = catalog_sql(db);
    let rows = conn
        .fetch(sql.columns, &[QueryParam::text(table)], CATALOG_ROW_LIMIT)
        .await?;
    if rows.is_empty() {
        return Err(table_not_found(conn, db, table).await);
    }
    let physical_table = rows[0].require_string("TABLE_NAME")?;
    let physical_columns = ordered_column_names(&rows);

    let targets: Vec<Target> = match column_names {
        Some(requested) if !requested.is_empty() => requested
            .iter()
            .map(|name| resolve_column(name, &physical_columns))
            .collect(),
        _ => physical_columns
            .iter()
            .map(|c| Target::Found(c.clone()))
            .collect(),
    };

    let mut samples = Vec::with_capacity(targets.len());
    for target in targets {
        let sample = match target {
            Target::Found(column) => {
                match sample_column(conn, db, &physical_table, &column, sample_size).await {
                    Ok(sample) => sample,
                    Err(e) => {
                        warn!(table = %table, column = %column, error = %e, "Sampling column failed");
                        let message = if redact_errors {
                            e.redacted_message()
                        } else {
                            e.to_string()
                        };
                        ColumnSample::failed(column.to_uppercase(), message)
                    }
                }
            }
            Target::Missing(requested) => ColumnSample::failed(
                requested.to_uppercase(),
                format!(
                    "Column '{}' not found in table {}",
                    requested.to_uppercase(),
                    table
                ),
            ),
        };
        samples.push(sample);
    }
    Ok(samples)
}

enum Target {
    Found(String),
    Missing(String),
}

fn ordered_column_names(rows: &[CatalogRow]) -> Vec<String> {
    let mut columns: Vec<(i64, String)> = rows
        .iter()
        .filter_map(|row| {
            let name = row.string("COLUMN_NAME")?;
            Some((row.i64("COLUMN_ID").unwrap_or(i64::MAX), name))
        })
        .collect();
    columns.sort_by_key(|(id, _)| *id);
    columns.into_iter().map(|(_, name)| name).collect()
}

fn resolve_column(requested: &str, physical: &[String]) -> Target {
    let requested = requested.trim();
    physical
        .iter()
        .find(|c| c.eq_ignore_ascii_case(requested))
        .map(|c| Target::Found(c.clone()))
        .unwrap_or_else(|| Target::Missing(requested.to_string()))
}

async fn sample_column<C: CatalogConnection>(
    conn: &mut C,
    db: DatabaseType,
    table: &str,
    column: &str,
    sample_size: usize,
) -> DbResult<ColumnSample> {
    let values = conn
        .fetch(
            &sample_values_sql(db, table, column, sample_size),
            &[],
            sample_size,
        )
        .await?;
    let distinct = conn.fetch(&distinct_count_sql(db, table, column), &[], 1).await?;
    let nulls = conn.fetch(&null_count_sql(db, table, column), &[], 1).await?;

    let sample_values = values
        .iter()
        .filter_map(|row| row.first_value().cloned())
        .filter(|value| !value.is_null())
        .take(sample_size)
        .collect::<Vec<JsonValue>>();

    Ok(ColumnSample {
        column_name: column.to_uppercase(),
        sample_values,
        distinct_count: single_count(&distinct, "DISTINCT_COUNT")?,
        null_count: single_count(&nulls, "NULL_COUNT")?,
        error: None,
    })
}

fn single_count(rows: &[CatalogRow], column: &str) -> DbResult<Option<u64>> {
    match rows.first() {
        Some(row) => row
            .count(column)
            .map(Some)
            .ok_or_else(|| DbError::internal(format!("{} was not a count", column))),
        None => Ok(None),
    }
}
