//! Schema discovery engine.
//!
//! Five read-only operations over the database catalog: list tables,
//! describe a table, extract foreign key relations, sample column values and
//! suggest related tables. Each call acquires one connection, runs its
//! catalog statements one after another, and releases the connection before
//! returning, whether it succeeded or not.
//!
//! Listing, describing and relation extraction go through a shared
//! [`MetadataCache`]. Sampling and suggestions always hit the database.
//!
//! Table names are matched case-insensitively and reported in uppercase.

pub mod describe;
pub mod fuzzy;
pub mod relations;
pub mod sampler;
pub mod suggest;
pub mod tables;

use crate::cache::{CacheStats, MetadataCache};
use crate::db::catalog::CatalogRow;
use crate::db::provider::{CatalogConnection, ConnectionProvider};
use crate::error::{DbError, DbResult};
use crate::models::{
    ColumnSample, DatabaseType, RelatedTableSuggestion, TableDescription, TableRelations,
    TableSummary,
};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

pub use sampler::{DEFAULT_SAMPLE_SIZE, MAX_SAMPLE_SIZE, effective_sample_size};
pub use suggest::{DEFAULT_MAX_SUGGESTIONS, MAX_SUGGESTIONS, effective_max_suggestions};
pub use tables::ROW_COUNT_NOTE;

/// Number of "did you mean" hints on a not-found error.
const NOT_FOUND_HINTS: usize = 3;

/// Values stored in the metadata cache.
#[derive(Debug, Clone)]
pub enum CachedMetadata {
    Tables(Vec<TableSummary>),
    Description(TableDescription),
    Relations(TableRelations),
}

/// A result plus whether it came from the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup<T> {
    pub value: T,
    pub cached: bool,
}

impl<T> Lookup<T> {
    fn fresh(value: T) -> Self {
        Self {
            value,
            cached: false,
        }
    }

    fn hit(value: T) -> Self {
        Self {
            value,
            cached: true,
        }
    }
}

/// Uppercase and trim a caller-supplied table name.
pub fn normalize_table_name(name: &str) -> DbResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DbError::invalid_input("tableName must not be empty"));
    }
    Ok(name.to_uppercase())
}

pub struct SchemaDiscovery<P> {
    provider: P,
    cache: Mutex<MetadataCache<CachedMetadata>>,
    redact_errors: bool,
}

impl<P: ConnectionProvider> SchemaDiscovery<P> {
    pub fn new(provider: P, cache: MetadataCache<CachedMetadata>) -> Self {
        Self {
            provider,
            cache: Mutex::new(cache),
            redact_errors: false,
        }
    }

    /// Reduce per-column sampling errors to their category.
    pub fn with_redacted_errors(mut self, redact: bool) -> Self {
        self.redact_errors = redact;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn dialect(&self) -> DatabaseType {
        self.provider.dialect()
    }

    pub async fn clear_cache(&self) {
        self.cache.lock().await.clear();
    }

    pub async fn cache_size(&self) -> usize {
        self.cache.lock().await.size()
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.lock().await.stats()
    }

    async fn cached(&self, key: &str) -> Option<CachedMetadata> {
        let mut cache = self.cache.lock().await;
        let value = cache.get(key);
        if value.is_some() {
            let stats = cache.stats();
            debug!(key = %key, hits = stats.hits, misses = stats.misses, "Cache hit");
        }
        value
    }

    pub async fn list_tables(&self, include_row_counts: bool) -> DbResult<Lookup<Vec<TableSummary>>> {
        let key = format!("tables:{}", include_row_counts);
        if let Some(CachedMetadata::Tables(tables)) = self.cached(&key).await {
            return Ok(Lookup::hit(tables));
        }

        let db = self.dialect();
        let mut conn = self.provider.acquire().await?;
        let result = tables::list_tables(&mut conn, db, include_row_counts).await;
        conn.release().await;
        let tables = result?;

        self.cache
            .lock()
            .await
            .set(key, CachedMetadata::Tables(tables.clone()));
        Ok(Lookup::fresh(tables))
    }

    pub async fn describe_table(
        &self,
        table_name: &str,
        include_constraints: bool,
    ) -> DbResult<Lookup<TableDescription>> {
        let table = normalize_table_name(table_name)?;
        let key = format!("describe:{}:{}", table, include_constraints);
        if let Some(CachedMetadata::Description(description)) = self.cached(&key).await {
            return Ok(Lookup::hit(description));
        }

        let db = self.dialect();
        let mut conn = self.provider.acquire().await?;
        let result = describe::describe_table(&mut conn, db, &table, include_constraints).await;
        conn.release().await;
        let description = result?;

        self.cache
            .lock()
            .await
            .set(key, CachedMetadata::Description(description.clone()));
        Ok(Lookup::fresh(description))
    }

    pub async fn table_relations(&self, table_name: &str) -> DbResult<Lookup<TableRelations>> {
        let table = normalize_table_name(table_name)?;
        let key = format!("relations:{}", table);
        if let Some(CachedMetadata::Relations(relations)) = self.cached(&key).await {
            return Ok(Lookup::hit(relations));
        }

        let db = self.dialect();
        let mut conn = self.provider.acquire().await?;
        let result = relations::table_relations(&mut conn, db, &table).await;
        conn.release().await;
        let relations = result?;

        self.cache
            .lock()
            .await
            .set(key, CachedMetadata::Relations(relations.clone()));
        Ok(Lookup::fresh(relations))
    }

    /// Sample values per column. `sample_size` is clamped to 1..=10.
    pub async fn sample_values(
        &self,
        table_name: &str,
        column_names: Option<&[String]>,
        sample_size: usize,
    ) -> DbResult<Vec<ColumnSample>> {
        let table = normalize_table_name(table_name)?;
        let sample_size = sample_size.clamp(1, MAX_SAMPLE_SIZE as usize);

        let db = self.dialect();
        let mut conn = self.provider.acquire().await?;
        let result = sampler::sample_values(
            &mut conn,
            db,
            &table,
            column_names,
            sample_size,
            self.redact_errors,
        )
        .await;
        conn.release().await;
        result
    }

    /// Rank related tables. `max_suggestions` is clamped to 1..=20.
    pub async fn suggest_related_tables(
        &self,
        table_name: &str,
        max_suggestions: usize,
    ) -> DbResult<Vec<RelatedTableSuggestion>> {
        let table = normalize_table_name(table_name)?;
        let max_suggestions = max_suggestions.clamp(1, MAX_SUGGESTIONS as usize);

        let db = self.dialect();
        let mut conn = self.provider.acquire().await?;
        let result = suggest::suggest_related_tables(&mut conn, db, &table, max_suggestions).await;
        conn.release().await;
        result
    }
}

/// Build a not-found error, with hints drawn from the current table list.
pub(crate) async fn table_not_found<C: CatalogConnection>(
    conn: &mut C,
    db: DatabaseType,
    table: &str,
) -> DbError {
    match tables::list_tables(conn, db, false).await {
        Ok(tables) => {
            let hints = fuzzy::similar_names(
                table,
                tables.iter().map(|t| t.table_name.as_str()),
                NOT_FOUND_HINTS,
            );
            DbError::table_not_found(table, hints)
        }
        Err(e) => {
            debug!(error = %e, "Could not list tables for not-found hints");
            DbError::table_not_found(table, Vec::new())
        }
    }
}

/// Group rows by a key, keeping first-appearance order of the groups, then
/// order each group by its `POSITION` column.
pub(crate) fn group_by_position<'a, K, F>(rows: &'a [CatalogRow], key: F) -> Vec<(K, Vec<&'a CatalogRow>)>
where
    K: Clone + Eq + std::hash::Hash,
    F: Fn(&CatalogRow) -> K,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Vec<&CatalogRow>)> = Vec::new();
    for row in rows {
        let k = key(row);
        match index.get(&k) {
            Some(&i) => groups[i].1.push(row),
            None => {
                index.insert(k.clone(), groups.len());
                groups.push((k, vec![row]));
            }
        }
    }
    for (_, members) in &mut groups {
        members.sort_by_key(|row| row.i64("POSITION").unwrap_or(i64::MAX));
    }
    groups
}

#[cfg(test)]
pub(crate) mod testing {
    //! Canned-response provider for discovery tests.

    use super::*;
    use crate::models::QueryParam;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex as StdMutex};

    struct Rule {
        fragment: String,
        first_bind: Option<String>,
        response: Result<Vec<CatalogRow>, String>,
    }

    /// Answers a statement with the first rule whose fragment it contains
    /// (and whose first bind matches, when given). Unmatched statements
    /// return no rows.
    #[derive(Clone)]
    pub struct StubProvider {
        db: DatabaseType,
        rules: Arc<StdMutex<Vec<Rule>>>,
        pub executed: Arc<StdMutex<Vec<String>>>,
        pub acquired: Arc<AtomicUsize>,
        pub released: Arc<AtomicUsize>,
    }

    impl StubProvider {
        pub fn new(db: DatabaseType) -> Self {
            Self {
                db,
                rules: Arc::new(StdMutex::new(Vec::new())),
                executed: Arc::new(StdMutex::new(Vec::new())),
                acquired: Arc::new(AtomicUsize::new(0)),
                released: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub fn on(self, fragment: &str, rows: Vec<CatalogRow>) -> Self {
            self.push(fragment, None, Ok(rows))
        }

        pub fn on_bind(self, fragment: &str, bind: &str, rows: Vec<CatalogRow>) -> Self {
            self.push(fragment, Some(bind.to_string()), Ok(rows))
        }

        pub fn fail(self, fragment: &str, message: &str) -> Self {
            self.push(fragment, None, Err(message.to_string()))
        }

        fn push(
            self,
            fragment: &str,
            first_bind: Option<String>,
            response: Result<Vec<CatalogRow>, String>,
        ) -> Self {
            self.rules.lock().unwrap().push(Rule {
                fragment: fragment.to_string(),
                first_bind,
                response,
            });
            self
        }

        pub fn executed_count(&self) -> usize {
            self.executed.lock().unwrap().len()
        }
    }

    pub struct StubConnection {
        provider: StubProvider,
    }

    impl ConnectionProvider for StubProvider {
        type Connection = StubConnection;

        fn dialect(&self) -> DatabaseType {
            self.db
        }

        async fn acquire(&self) -> DbResult<StubConnection> {
            self.acquired.fetch_add(1, Ordering::SeqCst);
            Ok(StubConnection {
                provider: self.clone(),
            })
        }
    }

    impl CatalogConnection for StubConnection {
        async fn fetch(
            &mut self,
            sql: &str,
            binds: &[QueryParam],
            max_rows: usize,
        ) -> DbResult<Vec<CatalogRow>> {
            self.provider.executed.lock().unwrap().push(sql.to_string());
            let first = binds.first().and_then(|b| match b {
                QueryParam::String(s) => Some(s.as_str()),
                _ => None,
            });
            let rules = self.provider.rules.lock().unwrap();
            let rule = rules.iter().find(|rule| {
                sql.contains(&rule.fragment)
                    && rule
                        .first_bind
                        .as_deref()
                        .is_none_or(|expected| Some(expected) == first)
            });
            match rule.map(|r| &r.response) {
                Some(Ok(rows)) => Ok(rows.iter().take(max_rows).cloned().collect()),
                Some(Err(message)) => Err(DbError::database(message.clone(), None, "stub")),
                None => Ok(Vec::new()),
            }
        }

        async fn release(self) {
            self.provider.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub fn table_row(name: &str) -> CatalogRow {
        CatalogRow::new()
            .with("TABLE_NAME", name)
            .with("NUM_ROWS", 0)
            .with("LAST_ANALYZED", serde_json::Value::Null)
            .with("TABLESPACE_NAME", serde_json::Value::Null)
            .with("COMMENTS", serde_json::Value::Null)
    }

    pub fn column_row(table: &str, column: &str, data_type: &str, id: i64) -> CatalogRow {
        CatalogRow::new()
            .with("TABLE_NAME", table)
            .with("COLUMN_NAME", column)
            .with("DATA_TYPE", data_type)
            .with("NULLABLE", "Y")
            .with("DATA_LENGTH", serde_json::Value::Null)
            .with("DATA_PRECISION", serde_json::Value::Null)
            .with("DATA_SCALE", serde_json::Value::Null)
            .with("DATA_DEFAULT", serde_json::Value::Null)
            .with("COLUMN_ID", id)
            .with("COMMENTS", serde_json::Value::Null)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn edge_row(
        constraint: &str,
        source_table: &str,
        source_column: &str,
        target_table: &str,
        target_column: &str,
        position: i64,
        delete_rule: Option<&str>,
    ) -> CatalogRow {
        CatalogRow::new()
            .with("CONSTRAINT_NAME", constraint)
            .with("SOURCE_TABLE", source_table)
            .with("SOURCE_COLUMN", source_column)
            .with("TARGET_TABLE", target_table)
            .with("TARGET_COLUMN", target_column)
            .with("POSITION", position)
            .with(
                "DELETE_RULE",
                delete_rule.map_or(serde_json::Value::Null, serde_json::Value::from),
            )
    }
}
