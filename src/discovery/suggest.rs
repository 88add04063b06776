//! Related-table suggestions.
//!
//! Three signals, strongest first:
//!
//! 1. declared foreign keys in either direction (confidence 1.0)
//! 2. a shared naming stem such as `ORDER` / `ORDER_ITEMS` (0.7)
//! 3. two or more shared non-generic column names (0.5 + 0.1 per column, at most 0.9)
//!
//! A table claimed by an earlier signal is skipped by later ones. The merged
//! list is sorted by confidence and truncated.

use super::relations::fetch_edges;
use super::{fuzzy, tables};
use crate::db::provider::CatalogConnection;
use crate::db::schema::{ALL_COLUMNS_ROW_LIMIT, catalog_sql};
use crate::error::{DbError, DbResult};
use crate::models::{DatabaseType, ForeignKeyEdge, RelatedTableSuggestion, RelationshipKind};
use std::collections::{BTreeSet, HashMap, HashSet};

pub const DEFAULT_MAX_SUGGESTIONS: u32 = 10;
pub const MAX_SUGGESTIONS: u32 = 20;

const FOREIGN_KEY_CONFIDENCE: f64 = 1.0;
const NAMING_CONFIDENCE: f64 = 0.7;
const SHARED_BASE_CONFIDENCE: f64 = 0.5;
const SHARED_STEP_CONFIDENCE: f64 = 0.1;
const SHARED_MAX_CONFIDENCE: f64 = 0.9;
const MIN_SHARED_COLUMNS: usize = 2;

const NAME_SUFFIXES: [&str; 5] = ["_ITEMS", "_DETAILS", "_DATA", "_INFO", "S"];

/// Columns present on nearly every table.
const GENERIC_COLUMNS: [&str; 5] = ["ID", "CREATED_AT", "UPDATED_AT", "CREATED_BY", "UPDATED_BY"];

/// Default to 10 and cap at 20.
pub fn effective_max_suggestions(requested: Option<u32>) -> usize {
    requested
        .unwrap_or(DEFAULT_MAX_SUGGESTIONS)
        .clamp(1, MAX_SUGGESTIONS) as usize
}

pub(crate) async fn suggest_related_tables<C: CatalogConnection>(
    conn: &mut C,
    db: DatabaseType,
    table: &str,
    max_suggestions: usize,
) -> DbResult<Vec<RelatedTableSuggestion>> {
    let listing = tables::list_tables(conn, db, false).await?;
    let names: Vec<String> = listing.into_iter().map(|t| t.table_name).collect();
    if !names.iter().any(|n| n == table) {
        let hints = fuzzy::similar_names(table, names.iter().map(String::as_str), 3);
        return Err(DbError::table_not_found(table, hints));
    }

    let (outgoing, incoming) = fetch_edges(conn, db, table).await?;

    let rows = conn
        .fetch(catalog_sql(db).all_columns, &[], ALL_COLUMNS_ROW_LIMIT)
        .await?;
    let mut columns: HashMap<String, BTreeSet<String>> = HashMap::new();
    for row in &rows {
        if let (Some(t), Some(c)) = (row.string("TABLE_NAME"), row.string("COLUMN_NAME")) {
            columns
                .entry(t.to_uppercase())
                .or_default()
                .insert(c.to_uppercase());
        }
    }

    Ok(rank_suggestions(
        table,
        &names,
        &outgoing,
        &incoming,
        &columns,
        max_suggestions,
    ))
}

/// Merge the three signals for `subject` and keep the best `max`.
pub(crate) fn rank_suggestions(
    subject: &str,
    tables: &[String],
    outgoing: &[ForeignKeyEdge],
    incoming: &[ForeignKeyEdge],
    columns: &HashMap<String, BTreeSet<String>>,
    max: usize,
) -> Vec<RelatedTableSuggestion> {
    let mut merged = Merge::new(subject);

    for edge in outgoing {
        merged.offer(
            &edge.target_table,
            RelationshipKind::ForeignKey,
            FOREIGN_KEY_CONFIDENCE,
            format!(
                "{}.{} references {}.{}",
                edge.source_table,
                edge.source_columns.join(", "),
                edge.target_table,
                edge.target_columns.join(", ")
            ),
        );
    }
    for edge in incoming {
        merged.offer(
            &edge.source_table,
            RelationshipKind::ForeignKey,
            FOREIGN_KEY_CONFIDENCE,
            format!(
                "{}.{} references {}.{}",
                edge.source_table,
                edge.source_columns.join(", "),
                edge.target_table,
                edge.target_columns.join(", ")
            ),
        );
    }

    if let Some(base) = base_name(subject) {
        for candidate in tables {
            if matches_base(candidate, &base) {
                merged.offer(
                    candidate,
                    RelationshipKind::NamingPattern,
                    NAMING_CONFIDENCE,
                    format!("Table name shares the naming stem '{}'", base),
                );
            }
        }
    }

    if let Some(own) = columns.get(subject) {
        let own: BTreeSet<&String> = own
            .iter()
            .filter(|c| !GENERIC_COLUMNS.contains(&c.as_str()))
            .collect();
        for candidate in tables {
            let Some(theirs) = columns.get(candidate) else {
                continue;
            };
            let shared: Vec<&str> = theirs
                .iter()
                .filter(|c| own.contains(c))
                .map(String::as_str)
                .collect();
            if shared.len() >= MIN_SHARED_COLUMNS {
                let confidence = (SHARED_BASE_CONFIDENCE
                    + SHARED_STEP_CONFIDENCE * shared.len() as f64)
                    .min(SHARED_MAX_CONFIDENCE);
                merged.offer(
                    candidate,
                    RelationshipKind::SharedColumns,
                    confidence,
                    format!("Shares {} columns: {}", shared.len(), shared.join(", ")),
                );
            }
        }
    }

    merged.finish(max)
}

struct Merge<'a> {
    subject: &'a str,
    seen: HashSet<String>,
    suggestions: Vec<RelatedTableSuggestion>,
}

impl<'a> Merge<'a> {
    fn new(subject: &'a str) -> Self {
        Self {
            subject,
            seen: HashSet::new(),
            suggestions: Vec::new(),
        }
    }

    /// First claim on a table wins.
    fn offer(&mut self, table: &str, kind: RelationshipKind, confidence: f64, reason: String) {
        if table == self.subject || !self.seen.insert(table.to_string()) {
            return;
        }
        self.suggestions.push(RelatedTableSuggestion {
            table_name: table.to_string(),
            relationship_type: kind,
            confidence: round2(confidence),
            reason,
        });
    }

    fn finish(mut self, max: usize) -> Vec<RelatedTableSuggestion> {
        // Stable: equal confidences keep signal order
        self.suggestions
            .sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        self.suggestions.truncate(max);
        self.suggestions
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Naming stem of a table: one known suffix stripped, then the first
/// underscore segment. A segment shorter than 3 characters gives no stem.
pub(crate) fn base_name(table: &str) -> Option<String> {
    let stripped = NAME_SUFFIXES
        .iter()
        .find_map(|suffix| {
            table
                .strip_suffix(suffix)
                .filter(|rest| !rest.is_empty())
        })
        .unwrap_or(table);

    let first = stripped.split('_').next().unwrap_or(stripped);
    (first.len() >= 3).then(|| first.to_string())
}

fn matches_base(candidate: &str, base: &str) -> bool {
    candidate.starts_with(base)
        || candidate.ends_with(&format!("_{}", base))
        || candidate.contains(&format!("_{}_", base))
}
