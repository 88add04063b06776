//! Foreign key relation extraction.

use super::group_by_position;
use crate::db::catalog::CatalogRow;
use crate::db::provider::CatalogConnection;
use crate::db::schema::{CATALOG_ROW_LIMIT, catalog_sql};
use crate::error::DbResult;
use crate::models::{DatabaseType, DeleteRule, ForeignKeyEdge, QueryParam, TableRelations};

pub(crate) async fn table_relations<C: CatalogConnection>(
    conn: &mut C,
    db: DatabaseType,
    table: &str,
) -> DbResult<TableRelations> {
    let (foreign_keys, referenced_by) = fetch_edges(conn, db, table).await?;
    Ok(TableRelations {
        table_name: table.to_string(),
        foreign_keys,
        referenced_by,
    })
}

/// Outgoing and incoming edges of one table.
pub(crate) async fn fetch_edges<C: CatalogConnection>(
    conn: &mut C,
    db: DatabaseType,
    table: &str,
) -> DbResult<(Vec<ForeignKeyEdge>, Vec<ForeignKeyEdge>)> {
    let sql = catalog_sql(db);
    let binds = [QueryParam::text(table)];
    let outgoing = conn.fetch(sql.outgoing_edges, &binds, CATALOG_ROW_LIMIT).await?;
    let incoming = conn.fetch(sql.incoming_edges, &binds, CATALOG_ROW_LIMIT).await?;
    Ok((edges_from_rows(&outgoing)?, edges_from_rows(&incoming)?))
}

/// One edge per constraint, with source and target columns aligned by key
/// position.
///
/// Constraint names are only unique per table on some databases, so rows
/// group on (constraint, source table).
pub(crate) fn edges_from_rows(rows: &[CatalogRow]) -> DbResult<Vec<ForeignKeyEdge>> {
    let groups = group_by_position(rows, |row| {
        (
            row.string("CONSTRAINT_NAME").unwrap_or_default(),
            row.string("SOURCE_TABLE").unwrap_or_default(),
        )
    });

    let mut edges = Vec::with_capacity(groups.len());
    for ((constraint_name, source_table), members) in groups {
        let Some(first) = members.first() else {
            continue;
        };
        let target_table = first.require_string("TARGET_TABLE")?;

        let mut source_columns = Vec::with_capacity(members.len());
        let mut target_columns = Vec::with_capacity(members.len());
        for row in &members {
            source_columns.push(row.require_string("SOURCE_COLUMN")?.to_uppercase());
            target_columns.push(row.require_string("TARGET_COLUMN")?.to_uppercase());
        }

        edges.push(ForeignKeyEdge {
            constraint_name: constraint_name.to_uppercase(),
            source_table: source_table.to_uppercase(),
            source_columns,
            target_table: target_table.to_uppercase(),
            target_columns,
            delete_rule: first
                .string("DELETE_RULE")
                .as_deref()
                .and_then(DeleteRule::parse),
        });
    }
    Ok(edges)
}
