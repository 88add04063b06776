//! Table and column description.

use super::{group_by_position, table_not_found};
use crate::db::catalog::CatalogRow;
use crate::db::provider::CatalogConnection;
use crate::db::schema::{CATALOG_ROW_LIMIT, catalog_sql};
use crate::error::DbResult;
use crate::models::{
    ColumnDescriptor, ConstraintDescriptor, ConstraintKind, DatabaseType, QueryParam,
    TableDescription,
};
use tracing::warn;

pub(crate) async fn describe_table<C: CatalogConnection>(
    conn: &mut C,
    db: DatabaseType,
    table: &str,
    include_constraints: bool,
) -> DbResult<TableDescription> {
    let sql = catalog_sql(db);
    let binds = [QueryParam::text(table)];

    let rows = conn.fetch(sql.columns, &binds, CATALOG_ROW_LIMIT).await?;
    if rows.is_empty() {
        return Err(table_not_found(conn, db, table).await);
    }
    let columns = columns_from_rows(&rows)?;

    let constraints = if include_constraints {
        let rows = conn.fetch(sql.constraints, &binds, CATALOG_ROW_LIMIT).await?;
        let mut constraints = constraints_from_rows(table, &rows)?;
        for (raw_name, constraint) in &mut constraints {
            if !constraint.constraint_type.is_foreign_key() {
                continue;
            }
            let binds = [QueryParam::text(raw_name.as_str()), QueryParam::text(table)];
            let referenced = conn.fetch(sql.referenced_key, &binds, CATALOG_ROW_LIMIT).await?;
            resolve_reference(constraint, &referenced);
        }
        Some(constraints.into_iter().map(|(_, c)| c).collect())
    } else {
        None
    };

    Ok(TableDescription {
        table_name: table.to_string(),
        columns,
        constraints,
    })
}

/// Columns in declared ordinal order, whatever order the rows arrived in.
pub(crate) fn columns_from_rows(rows: &[CatalogRow]) -> DbResult<Vec<ColumnDescriptor>> {
    let mut ordered: Vec<(i64, ColumnDescriptor)> = rows
        .iter()
        .map(|row| {
            Ok((
                row.i64("COLUMN_ID").unwrap_or(i64::MAX),
                column_descriptor(row)?,
            ))
        })
        .collect::<DbResult<_>>()?;
    ordered.sort_by_key(|(id, _)| *id);
    Ok(ordered.into_iter().map(|(_, column)| column).collect())
}

fn column_descriptor(row: &CatalogRow) -> DbResult<ColumnDescriptor> {
    Ok(ColumnDescriptor {
        column_name: row.require_string("COLUMN_NAME")?.to_uppercase(),
        data_type: row.trimmed("DATA_TYPE").unwrap_or_default(),
        nullable: row
            .string("NULLABLE")
            .is_none_or(|n| !n.trim().eq_ignore_ascii_case("N")),
        data_length: row.i64("DATA_LENGTH"),
        data_precision: row.i64("DATA_PRECISION"),
        data_scale: row.i64("DATA_SCALE"),
        default_value: row.trimmed("DATA_DEFAULT"),
        comment: row.trimmed("COMMENTS"),
    })
}

/// Merge per-column constraint rows into one descriptor per constraint.
///
/// Returns each descriptor with the constraint name as stored, which the
/// referenced-key lookup binds against.
pub(crate) fn constraints_from_rows(
    table: &str,
    rows: &[CatalogRow],
) -> DbResult<Vec<(String, ConstraintDescriptor)>> {
    let groups = group_by_position(rows, |row| row.string("CONSTRAINT_NAME").unwrap_or_default());

    let mut constraints = Vec::with_capacity(groups.len());
    for (raw_name, members) in groups {
        let Some(first) = members.first() else {
            continue;
        };
        let code = first.require_string("CONSTRAINT_TYPE")?;
        let kind = ConstraintKind::from_code(&code);
        if let ConstraintKind::Other(other) = &kind {
            warn!(
                table = %table,
                constraint = %raw_name,
                code = %other,
                "Unrecognized constraint type, passing through"
            );
        }

        let columns = members
            .iter()
            .filter_map(|row| row.string("COLUMN_NAME"))
            .map(|c| c.to_uppercase())
            .collect();
        let check_condition = match kind {
            ConstraintKind::Check => first.trimmed("SEARCH_CONDITION"),
            _ => None,
        };

        constraints.push((
            raw_name.clone(),
            ConstraintDescriptor {
                constraint_name: raw_name.to_uppercase(),
                constraint_type: kind,
                columns,
                referenced_table: None,
                referenced_columns: None,
                check_condition,
            },
        ));
    }
    Ok(constraints)
}

fn resolve_reference(constraint: &mut ConstraintDescriptor, rows: &[CatalogRow]) {
    let mut rows: Vec<&CatalogRow> = rows.iter().collect();
    rows.sort_by_key(|row| row.i64("POSITION").unwrap_or(i64::MAX));

    constraint.referenced_table = rows
        .first()
        .and_then(|row| row.string("TABLE_NAME"))
        .map(|t| t.to_uppercase());
    constraint.referenced_columns = Some(
        rows.iter()
            .filter_map(|row| row.string("COLUMN_NAME"))
            .map(|c| c.to_uppercase())
            .collect(),
    );
}
