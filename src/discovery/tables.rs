//! Table listing.

use crate::db::catalog::CatalogRow;
use crate::db::provider::CatalogConnection;
use crate::db::schema::{CATALOG_ROW_LIMIT, catalog_sql};
use crate::error::DbResult;
use crate::models::{DatabaseType, TableSummary};

/// Note attached to listings that include row counts.
pub const ROW_COUNT_NOTE: &str = "Row counts are approximate, taken from optimizer statistics \
    rather than COUNT(*), and may be stale until the table is next analyzed.";

pub(crate) async fn list_tables<C: CatalogConnection>(
    conn: &mut C,
    db: DatabaseType,
    include_row_counts: bool,
) -> DbResult<Vec<TableSummary>> {
    let sql = catalog_sql(db);
    let statement = if include_row_counts {
        sql.tables_with_stats
    } else {
        sql.tables
    };
    let rows = conn.fetch(statement, &[], CATALOG_ROW_LIMIT).await?;
    rows.iter()
        .map(|row| table_summary(row, include_row_counts))
        .collect()
}

fn table_summary(row: &CatalogRow, include_row_counts: bool) -> DbResult<TableSummary> {
    let mut summary = TableSummary::new(row.require_string("TABLE_NAME")?.to_uppercase());
    if include_row_counts {
        summary.row_count = row.count("NUM_ROWS").unwrap_or(0);
        summary.last_modified = row.trimmed("LAST_ANALYZED");
    }
    summary.storage_group = row.trimmed("TABLESPACE_NAME");
    summary.comment = row.trimmed("COMMENTS");
    Ok(summary)
}
