//! Catalog SQL for each supported dialect.
//!
//! Every dialect answers the same logical questions with the same column
//! aliases, so the discovery layer can read results without knowing which
//! database produced them:
//!
//! | query            | columns                                                                 |
//! |------------------|-------------------------------------------------------------------------|
//! | tables           | TABLE_NAME, NUM_ROWS, LAST_ANALYZED, TABLESPACE_NAME, COMMENTS          |
//! | columns          | TABLE_NAME, COLUMN_NAME, DATA_TYPE, NULLABLE, DATA_LENGTH,              |
//! |                  | DATA_PRECISION, DATA_SCALE, DATA_DEFAULT, COLUMN_ID, COMMENTS           |
//! | constraints      | CONSTRAINT_NAME, CONSTRAINT_TYPE, COLUMN_NAME, POSITION,                |
//! |                  | SEARCH_CONDITION, DELETE_RULE                                           |
//! | referenced key   | TABLE_NAME, COLUMN_NAME, POSITION                                       |
//! | foreign key edge | CONSTRAINT_NAME, SOURCE_TABLE, SOURCE_COLUMN, TARGET_TABLE,             |
//! |                  | TARGET_COLUMN, POSITION, DELETE_RULE                                    |
//! | all columns      | TABLE_NAME, COLUMN_NAME                                                 |
//!
//! Names come back as stored. Table filters compare `UPPER(name)` against an
//! already-uppercased bind value.

use crate::models::DatabaseType;

/// Rows fetched from any catalog listing.
pub const CATALOG_ROW_LIMIT: usize = 1000;

/// Rows fetched by the schema-wide column scan.
pub const ALL_COLUMNS_ROW_LIMIT: usize = 10000;

/// Prefix scanned for approximate distinct and null counts.
pub const SAMPLE_SCAN_ROWS: usize = 1000;

/// Catalog statements for one dialect.
#[derive(Debug)]
pub struct CatalogSql {
    /// No binds.
    pub tables: &'static str,
    /// No binds. Adds approximate row counts and last-analyzed time.
    pub tables_with_stats: &'static str,
    /// Binds: uppercase table name.
    pub columns: &'static str,
    /// Binds: uppercase table name.
    pub constraints: &'static str,
    /// Binds: constraint name as stored, uppercase source table name.
    pub referenced_key: &'static str,
    /// Binds: uppercase source table name.
    pub outgoing_edges: &'static str,
    /// Binds: uppercase target table name.
    pub incoming_edges: &'static str,
    /// No binds.
    pub all_columns: &'static str,
}

pub fn catalog_sql(db: DatabaseType) -> &'static CatalogSql {
    match db {
        DatabaseType::PostgreSQL => &postgres::SQL,
        DatabaseType::MySQL => &mysql::SQL,
        DatabaseType::SQLite => &sqlite::SQL,
    }
}

/// Quote an identifier for the dialect, doubling any embedded quote character.
pub fn quote_ident(db: DatabaseType, name: &str) -> String {
    let q = db.identifier_quote();
    let mut out = String::with_capacity(name.len() + 2);
    out.push(q);
    for ch in name.chars() {
        if ch == q {
            out.push(q);
        }
        out.push(ch);
    }
    out.push(q);
    out
}

/// Up to `limit` non-null values of one column, as `SAMPLE_VALUE`.
pub fn sample_values_sql(db: DatabaseType, table: &str, column: &str, limit: usize) -> String {
    let t = quote_ident(db, table);
    let c = quote_ident(db, column);
    let projection = match db {
        DatabaseType::PostgreSQL => format!("CAST({} AS TEXT)", c),
        DatabaseType::MySQL => format!("CAST({} AS CHAR)", c),
        DatabaseType::SQLite => c.clone(),
    };
    format!(
        "SELECT {} AS SAMPLE_VALUE FROM {} WHERE {} IS NOT NULL LIMIT {}",
        projection, t, c, limit
    )
}

/// Distinct values of one column within the scan prefix, as `DISTINCT_COUNT`.
pub fn distinct_count_sql(db: DatabaseType, table: &str, column: &str) -> String {
    let t = quote_ident(db, table);
    let c = quote_ident(db, column);
    format!(
        "SELECT COUNT(DISTINCT {c}) AS DISTINCT_COUNT FROM (SELECT {c} FROM {t} LIMIT {n}) sample_rows",
        c = c,
        t = t,
        n = SAMPLE_SCAN_ROWS
    )
}

/// NULLs of one column within the scan prefix, as `NULL_COUNT`.
pub fn null_count_sql(db: DatabaseType, table: &str, column: &str) -> String {
    let t = quote_ident(db, table);
    let c = quote_ident(db, column);
    format!(
        "SELECT COUNT(*) AS NULL_COUNT FROM (SELECT {c} FROM {t} LIMIT {n}) sample_rows WHERE {c} IS NULL",
        c = c,
        t = t,
        n = SAMPLE_SCAN_ROWS
    )
}

mod postgres {
    use super::CatalogSql;

    pub static SQL: CatalogSql = CatalogSql {
        tables: r#"
            SELECT c.relname::text AS TABLE_NAME,
                   0::bigint AS NUM_ROWS,
                   NULL::text AS LAST_ANALYZED,
                   t.spcname::text AS TABLESPACE_NAME,
                   obj_description(c.oid, 'pg_class') AS COMMENTS
            FROM pg_catalog.pg_class c
            JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
            LEFT JOIN pg_catalog.pg_tablespace t ON t.oid = c.reltablespace
            WHERE c.relkind IN ('r', 'p')
              AND n.nspname = current_schema()
            ORDER BY c.relname
            LIMIT 1000
        "#,
        tables_with_stats: r#"
            SELECT c.relname::text AS TABLE_NAME,
                   GREATEST(c.reltuples, 0)::bigint AS NUM_ROWS,
                   GREATEST(s.last_analyze, s.last_autoanalyze)::text AS LAST_ANALYZED,
                   t.spcname::text AS TABLESPACE_NAME,
                   obj_description(c.oid, 'pg_class') AS COMMENTS
            FROM pg_catalog.pg_class c
            JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
            LEFT JOIN pg_catalog.pg_tablespace t ON t.oid = c.reltablespace
            LEFT JOIN pg_catalog.pg_stat_user_tables s ON s.relid = c.oid
            WHERE c.relkind IN ('r', 'p')
              AND n.nspname = current_schema()
            ORDER BY c.relname
            LIMIT 1000
        "#,
        columns: r#"
            SELECT c.relname::text AS TABLE_NAME,
                   a.attname::text AS COLUMN_NAME,
                   format_type(a.atttypid, NULL) AS DATA_TYPE,
                   CASE WHEN a.attnotnull THEN 'N' ELSE 'Y' END AS NULLABLE,
                   CASE WHEN a.atttypid IN (1042, 1043) AND a.atttypmod > 4
                        THEN (a.atttypmod - 4)::bigint END AS DATA_LENGTH,
                   CASE WHEN a.atttypid = 1700 AND a.atttypmod > 4
                        THEN (((a.atttypmod - 4) >> 16) & 65535)::bigint END AS DATA_PRECISION,
                   CASE WHEN a.atttypid = 1700 AND a.atttypmod > 4
                        THEN ((a.atttypmod - 4) & 65535)::bigint END AS DATA_SCALE,
                   pg_get_expr(d.adbin, d.adrelid) AS DATA_DEFAULT,
                   a.attnum::bigint AS COLUMN_ID,
                   col_description(c.oid, a.attnum) AS COMMENTS
            FROM pg_catalog.pg_attribute a
            JOIN pg_catalog.pg_class c ON c.oid = a.attrelid
            JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
            LEFT JOIN pg_catalog.pg_attrdef d ON d.adrelid = a.attrelid AND d.adnum = a.attnum
            WHERE c.relkind IN ('r', 'p', 'v', 'm')
              AND n.nspname = current_schema()
              AND UPPER(c.relname::text) = $1
              AND a.attnum > 0
              AND NOT a.attisdropped
            ORDER BY a.attnum
            LIMIT 1000
        "#,
        constraints: r#"
            SELECT con.conname::text AS CONSTRAINT_NAME,
                   con.contype::text AS CONSTRAINT_TYPE,
                   a.attname::text AS COLUMN_NAME,
                   k.ord::bigint AS POSITION,
                   CASE WHEN con.contype = 'c' THEN pg_get_constraintdef(con.oid) END AS SEARCH_CONDITION,
                   CASE con.confdeltype
                        WHEN 'c' THEN 'CASCADE'
                        WHEN 'n' THEN 'SET NULL'
                        WHEN 'd' THEN 'SET DEFAULT'
                        WHEN 'r' THEN 'RESTRICT'
                        WHEN 'a' THEN 'NO ACTION'
                   END AS DELETE_RULE
            FROM pg_catalog.pg_constraint con
            JOIN pg_catalog.pg_class c ON c.oid = con.conrelid
            JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
            CROSS JOIN LATERAL unnest(con.conkey) WITH ORDINALITY AS k(attnum, ord)
            JOIN pg_catalog.pg_attribute a ON a.attrelid = con.conrelid AND a.attnum = k.attnum
            WHERE n.nspname = current_schema()
              AND UPPER(c.relname::text) = $1
              AND con.contype IN ('p', 'f', 'u', 'c')
            ORDER BY con.conname, k.ord
            LIMIT 1000
        "#,
        referenced_key: r#"
            SELECT rc.relname::text AS TABLE_NAME,
                   ra.attname::text AS COLUMN_NAME,
                   k.ord::bigint AS POSITION
            FROM pg_catalog.pg_constraint con
            JOIN pg_catalog.pg_class c ON c.oid = con.conrelid
            JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
            JOIN pg_catalog.pg_class rc ON rc.oid = con.confrelid
            CROSS JOIN LATERAL unnest(con.confkey) WITH ORDINALITY AS k(attnum, ord)
            JOIN pg_catalog.pg_attribute ra ON ra.attrelid = con.confrelid AND ra.attnum = k.attnum
            WHERE con.contype = 'f'
              AND n.nspname = current_schema()
              AND con.conname::text = $1
              AND UPPER(c.relname::text) = $2
            ORDER BY k.ord
            LIMIT 1000
        "#,
        outgoing_edges: r#"
            SELECT con.conname::text AS CONSTRAINT_NAME,
                   c.relname::text AS SOURCE_TABLE,
                   sa.attname::text AS SOURCE_COLUMN,
                   rc.relname::text AS TARGET_TABLE,
                   ta.attname::text AS TARGET_COLUMN,
                   k.ord::bigint AS POSITION,
                   CASE con.confdeltype
                        WHEN 'c' THEN 'CASCADE'
                        WHEN 'n' THEN 'SET NULL'
                        WHEN 'd' THEN 'SET DEFAULT'
                        WHEN 'r' THEN 'RESTRICT'
                        WHEN 'a' THEN 'NO ACTION'
                   END AS DELETE_RULE
            FROM pg_catalog.pg_constraint con
            JOIN pg_catalog.pg_class c ON c.oid = con.conrelid
            JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
            JOIN pg_catalog.pg_class rc ON rc.oid = con.confrelid
            CROSS JOIN LATERAL unnest(con.conkey, con.confkey) WITH ORDINALITY AS k(src_attnum, tgt_attnum, ord)
            JOIN pg_catalog.pg_attribute sa ON sa.attrelid = con.conrelid AND sa.attnum = k.src_attnum
            JOIN pg_catalog.pg_attribute ta ON ta.attrelid = con.confrelid AND ta.attnum = k.tgt_attnum
            WHERE con.contype = 'f'
              AND n.nspname = current_schema()
              AND UPPER(c.relname::text) = $1
            ORDER BY con.conname, k.ord
            LIMIT 1000
        "#,
        incoming_edges: r#"
            SELECT con.conname::text AS CONSTRAINT_NAME,
                   c.relname::text AS SOURCE_TABLE,
                   sa.attname::text AS SOURCE_COLUMN,
                   rc.relname::text AS TARGET_TABLE,
                   ta.attname::text AS TARGET_COLUMN,
                   k.ord::bigint AS POSITION,
                   CASE con.confdeltype
                        WHEN 'c' THEN 'CASCADE'
                        WHEN 'n' THEN 'SET NULL'
                        WHEN 'd' THEN 'SET DEFAULT'
                        WHEN 'r' THEN 'RESTRICT'
                        WHEN 'a' THEN 'NO ACTION'
                   END AS DELETE_RULE
            FROM pg_catalog.pg_constraint con
            JOIN pg_catalog.pg_class c ON c.oid = con.conrelid
            JOIN pg_catalog.pg_class rc ON rc.oid = con.confrelid
            JOIN pg_catalog.pg_namespace rn ON rn.oid = rc.relnamespace
            CROSS JOIN LATERAL unnest(con.conkey, con.confkey) WITH ORDINALITY AS k(src_attnum, tgt_attnum, ord)
            JOIN pg_catalog.pg_attribute sa ON sa.attrelid = con.conrelid AND sa.attnum = k.src_attnum
            JOIN pg_catalog.pg_attribute ta ON ta.attrelid = con.confrelid AND ta.attnum = k.tgt_attnum
            WHERE con.contype = 'f'
              AND rn.nspname = current_schema()
              AND UPPER(rc.relname::text) = $1
            ORDER BY con.conname, k.ord
            LIMIT 1000
        "#,
        all_columns: r#"
            SELECT c.relname::text AS TABLE_NAME,
                   a.attname::text AS COLUMN_NAME
            FROM pg_catalog.pg_attribute a
            JOIN pg_catalog.pg_class c ON c.oid = a.attrelid
            JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
            WHERE c.relkind IN ('r', 'p')
              AND n.nspname = current_schema()
              AND a.attnum > 0
              AND NOT a.attisdropped
            ORDER BY c.relname, a.attnum
            LIMIT 10000
        "#,
    };
}

mod mysql {
    use super::CatalogSql;

    // information_schema columns are utf8mb3 or binary depending on server
    // version; CONVERT keeps the driver decoding them as text.
    pub static SQL: CatalogSql = CatalogSql {
        tables: r#"
            SELECT CONVERT(TABLE_NAME USING utf8mb4) AS TABLE_NAME,
                   CAST(0 AS SIGNED) AS NUM_ROWS,
                   CAST(NULL AS CHAR) AS LAST_ANALYZED,
                   CAST(NULL AS CHAR) AS TABLESPACE_NAME,
                   CONVERT(NULLIF(TABLE_COMMENT, '') USING utf8mb4) AS COMMENTS
            FROM information_schema.TABLES
            WHERE TABLE_SCHEMA = DATABASE()
              AND TABLE_TYPE = 'BASE TABLE'
            ORDER BY 1
            LIMIT 1000
        "#,
        tables_with_stats: r#"
            SELECT CONVERT(TABLE_NAME USING utf8mb4) AS TABLE_NAME,
                   CAST(COALESCE(TABLE_ROWS, 0) AS SIGNED) AS NUM_ROWS,
                   CAST(COALESCE(UPDATE_TIME, CREATE_TIME) AS CHAR) AS LAST_ANALYZED,
                   CAST(NULL AS CHAR) AS TABLESPACE_NAME,
                   CONVERT(NULLIF(TABLE_COMMENT, '') USING utf8mb4) AS COMMENTS
            FROM information_schema.TABLES
            WHERE TABLE_SCHEMA = DATABASE()
              AND TABLE_TYPE = 'BASE TABLE'
            ORDER BY 1
            LIMIT 1000
        "#,
        columns: r#"
            SELECT CONVERT(TABLE_NAME USING utf8mb4) AS TABLE_NAME,
                   CONVERT(COLUMN_NAME USING utf8mb4) AS COLUMN_NAME,
                   CONVERT(DATA_TYPE USING utf8mb4) AS DATA_TYPE,
                   CASE WHEN IS_NULLABLE = 'YES' THEN 'Y' ELSE 'N' END AS NULLABLE,
                   CAST(CHARACTER_MAXIMUM_LENGTH AS SIGNED) AS DATA_LENGTH,
                   CAST(NUMERIC_PRECISION AS SIGNED) AS DATA_PRECISION,
                   CAST(NUMERIC_SCALE AS SIGNED) AS DATA_SCALE,
                   CONVERT(COLUMN_DEFAULT USING utf8mb4) AS DATA_DEFAULT,
                   CAST(ORDINAL_POSITION AS SIGNED) AS COLUMN_ID,
                   CONVERT(NULLIF(COLUMN_COMMENT, '') USING utf8mb4) AS COMMENTS
            FROM information_schema.COLUMNS
            WHERE TABLE_SCHEMA = DATABASE()
              AND UPPER(TABLE_NAME) = ?
            ORDER BY ORDINAL_POSITION
            LIMIT 1000
        "#,
        constraints: r#"
            SELECT CONVERT(tc.CONSTRAINT_NAME USING utf8mb4) AS CONSTRAINT_NAME,
                   CONVERT(tc.CONSTRAINT_TYPE USING utf8mb4) AS CONSTRAINT_TYPE,
                   CONVERT(kcu.COLUMN_NAME USING utf8mb4) AS COLUMN_NAME,
                   CAST(kcu.ORDINAL_POSITION AS SIGNED) AS POSITION,
                   CAST(NULL AS CHAR) AS SEARCH_CONDITION,
                   CONVERT(rc.DELETE_RULE USING utf8mb4) AS DELETE_RULE
            FROM information_schema.TABLE_CONSTRAINTS tc
            JOIN information_schema.KEY_COLUMN_USAGE kcu
              ON kcu.CONSTRAINT_SCHEMA = tc.CONSTRAINT_SCHEMA
             AND kcu.CONSTRAINT_NAME = tc.CONSTRAINT_NAME
             AND kcu.TABLE_NAME = tc.TABLE_NAME
            LEFT JOIN information_schema.REFERENTIAL_CONSTRAINTS rc
              ON rc.CONSTRAINT_SCHEMA = tc.CONSTRAINT_SCHEMA
             AND rc.CONSTRAINT_NAME = tc.CONSTRAINT_NAME
             AND rc.TABLE_NAME = tc.TABLE_NAME
            WHERE tc.TABLE_SCHEMA = DATABASE()
              AND UPPER(tc.TABLE_NAME) = ?
              AND tc.CONSTRAINT_TYPE IN ('PRIMARY KEY', 'FOREIGN KEY', 'UNIQUE')
            ORDER BY tc.CONSTRAINT_NAME, kcu.ORDINAL_POSITION
            LIMIT 1000
        "#,
        referenced_key: r#"
            SELECT CONVERT(REFERENCED_TABLE_NAME USING utf8mb4) AS TABLE_NAME,
                   CONVERT(REFERENCED_COLUMN_NAME USING utf8mb4) AS COLUMN_NAME,
                   CAST(ORDINAL_POSITION AS SIGNED) AS POSITION
            FROM information_schema.KEY_COLUMN_USAGE
            WHERE TABLE_SCHEMA = DATABASE()
              AND CONSTRAINT_NAME = ?
              AND UPPER(TABLE_NAME) = ?
              AND REFERENCED_TABLE_NAME IS NOT NULL
            ORDER BY ORDINAL_POSITION
            LIMIT 1000
        "#,
        outgoing_edges: r#"
            SELECT CONVERT(kcu.CONSTRAINT_NAME USING utf8mb4) AS CONSTRAINT_NAME,
                   CONVERT(kcu.TABLE_NAME USING utf8mb4) AS SOURCE_TABLE,
                   CONVERT(kcu.COLUMN_NAME USING utf8mb4) AS SOURCE_COLUMN,
                   CONVERT(kcu.REFERENCED_TABLE_NAME USING utf8mb4) AS TARGET_TABLE,
                   CONVERT(kcu.REFERENCED_COLUMN_NAME USING utf8mb4) AS TARGET_COLUMN,
                   CAST(kcu.ORDINAL_POSITION AS SIGNED) AS POSITION,
                   CONVERT(rc.DELETE_RULE USING utf8mb4) AS DELETE_RULE
            FROM information_schema.KEY_COLUMN_USAGE kcu
            LEFT JOIN information_schema.REFERENTIAL_CONSTRAINTS rc
              ON rc.CONSTRAINT_SCHEMA = kcu.CONSTRAINT_SCHEMA
             AND rc.CONSTRAINT_NAME = kcu.CONSTRAINT_NAME
             AND rc.TABLE_NAME = kcu.TABLE_NAME
            WHERE kcu.TABLE_SCHEMA = DATABASE()
              AND kcu.REFERENCED_TABLE_NAME IS NOT NULL
              AND UPPER(kcu.TABLE_NAME) = ?
            ORDER BY kcu.CONSTRAINT_NAME, kcu.ORDINAL_POSITION
            LIMIT 1000
        "#,
        incoming_edges: r#"
            SELECT CONVERT(kcu.CONSTRAINT_NAME USING utf8mb4) AS CONSTRAINT_NAME,
                   CONVERT(kcu.TABLE_NAME USING utf8mb4) AS SOURCE_TABLE,
                   CONVERT(kcu.COLUMN_NAME USING utf8mb4) AS SOURCE_COLUMN,
                   CONVERT(kcu.REFERENCED_TABLE_NAME USING utf8mb4) AS TARGET_TABLE,
                   CONVERT(kcu.REFERENCED_COLUMN_NAME USING utf8mb4) AS TARGET_COLUMN,
                   CAST(kcu.ORDINAL_POSITION AS SIGNED) AS POSITION,
                   CONVERT(rc.DELETE_RULE USING utf8mb4) AS DELETE_RULE
            FROM information_schema.KEY_COLUMN_USAGE kcu
            LEFT JOIN information_schema.REFERENTIAL_CONSTRAINTS rc
              ON rc.CONSTRAINT_SCHEMA = kcu.CONSTRAINT_SCHEMA
             AND rc.CONSTRAINT_NAME = kcu.CONSTRAINT_NAME
             AND rc.TABLE_NAME = kcu.TABLE_NAME
            WHERE kcu.REFERENCED_TABLE_SCHEMA = DATABASE()
              AND UPPER(kcu.REFERENCED_TABLE_NAME) = ?
            ORDER BY kcu.CONSTRAINT_NAME, kcu.ORDINAL_POSITION
            LIMIT 1000
        "#,
        all_columns: r#"
            SELECT CONVERT(c.TABLE_NAME USING utf8mb4) AS TABLE_NAME,
                   CONVERT(c.COLUMN_NAME USING utf8mb4) AS COLUMN_NAME
            FROM information_schema.COLUMNS c
            JOIN information_schema.TABLES t
              ON t.TABLE_SCHEMA = c.TABLE_SCHEMA
             AND t.TABLE_NAME = c.TABLE_NAME
            WHERE c.TABLE_SCHEMA = DATABASE()
              AND t.TABLE_TYPE = 'BASE TABLE'
            ORDER BY c.TABLE_NAME, c.ORDINAL_POSITION
            LIMIT 10000
        "#,
    };
}

mod sqlite {
    use super::CatalogSql;

    // SQLite keeps no statistics or comments. Constraint names are
    // synthesized: PK_<TABLE> and FK_<TABLE>_<id>; unique constraints use
    // the name of their backing index. A foreign key declared without a
    // target column references the parent's primary key.
    pub static SQL: CatalogSql = CatalogSql {
        tables: r#"
            SELECT m.name AS TABLE_NAME,
                   0 AS NUM_ROWS,
                   NULL AS LAST_ANALYZED,
                   NULL AS TABLESPACE_NAME,
                   NULL AS COMMENTS
            FROM sqlite_master m
            WHERE m.type = 'table'
              AND m.name NOT LIKE 'sqlite_%'
            ORDER BY m.name
            LIMIT 1000
        "#,
        tables_with_stats: r#"
            SELECT m.name AS TABLE_NAME,
                   0 AS NUM_ROWS,
                   NULL AS LAST_ANALYZED,
                   NULL AS TABLESPACE_NAME,
                   NULL AS COMMENTS
            FROM sqlite_master m
            WHERE m.type = 'table'
              AND m.name NOT LIKE 'sqlite_%'
            ORDER BY m.name
            LIMIT 1000
        "#,
        columns: r#"
            SELECT m.name AS TABLE_NAME,
                   p.name AS COLUMN_NAME,
                   p.type AS DATA_TYPE,
                   CASE WHEN p."notnull" = 1 THEN 'N' ELSE 'Y' END AS NULLABLE,
                   NULL AS DATA_LENGTH,
                   NULL AS DATA_PRECISION,
                   NULL AS DATA_SCALE,
                   p.dflt_value AS DATA_DEFAULT,
                   p.cid + 1 AS COLUMN_ID,
                   NULL AS COMMENTS
            FROM sqlite_master m
            JOIN pragma_table_info(m.name) p
            WHERE m.type IN ('table', 'view')
              AND UPPER(m.name) = ?1
            ORDER BY p.cid
            LIMIT 1000
        "#,
        constraints: r#"
            SELECT 'PK_' || UPPER(m.name) AS CONSTRAINT_NAME,
                   'P' AS CONSTRAINT_TYPE,
                   p.name AS COLUMN_NAME,
                   p.pk AS POSITION,
                   NULL AS SEARCH_CONDITION,
                   NULL AS DELETE_RULE
            FROM sqlite_master m
            JOIN pragma_table_info(m.name) p
            WHERE m.type = 'table'
              AND UPPER(m.name) = ?1
              AND p.pk > 0
            UNION ALL
            SELECT 'FK_' || UPPER(m.name) || '_' || f.id,
                   'R',
                   f."from",
                   f.seq + 1,
                   NULL,
                   f.on_delete
            FROM sqlite_master m
            JOIN pragma_foreign_key_list(m.name) f
            WHERE m.type = 'table'
              AND UPPER(m.name) = ?1
            UNION ALL
            SELECT i.name,
                   'U',
                   ii.name,
                   ii.seqno + 1,
                   NULL,
                   NULL
            FROM sqlite_master m
            JOIN pragma_index_list(m.name) i
            JOIN pragma_index_info(i.name) ii
            WHERE m.type = 'table'
              AND UPPER(m.name) = ?1
              AND i."unique" = 1
              AND i.origin = 'u'
            ORDER BY 1, 4
            LIMIT 1000
        "#,
        referenced_key: r#"
            SELECT f."table" AS TABLE_NAME,
                   COALESCE(f."to", (SELECT tp.name FROM pragma_table_info(f."table") tp
                                     WHERE tp.pk = f.seq + 1)) AS COLUMN_NAME,
                   f.seq + 1 AS POSITION
            FROM sqlite_master m
            JOIN pragma_foreign_key_list(m.name) f
            WHERE m.type = 'table'
              AND 'FK_' || UPPER(m.name) || '_' || f.id = ?1
              AND UPPER(m.name) = ?2
            ORDER BY f.seq
            LIMIT 1000
        "#,
        outgoing_edges: r#"
            SELECT 'FK_' || UPPER(m.name) || '_' || f.id AS CONSTRAINT_NAME,
                   m.name AS SOURCE_TABLE,
                   f."from" AS SOURCE_COLUMN,
                   f."table" AS TARGET_TABLE,
                   COALESCE(f."to", (SELECT tp.name FROM pragma_table_info(f."table") tp
                                     WHERE tp.pk = f.seq + 1)) AS TARGET_COLUMN,
                   f.seq + 1 AS POSITION,
                   f.on_delete AS DELETE_RULE
            FROM sqlite_master m
            JOIN pragma_foreign_key_list(m.name) f
            WHERE m.type = 'table'
              AND UPPER(m.name) = ?1
            ORDER BY 1, 6
            LIMIT 1000
        "#,
        incoming_edges: r#"
            SELECT 'FK_' || UPPER(m.name) || '_' || f.id AS CONSTRAINT_NAME,
                   m.name AS SOURCE_TABLE,
                   f."from" AS SOURCE_COLUMN,
                   f."table" AS TARGET_TABLE,
                   COALESCE(f."to", (SELECT tp.name FROM pragma_table_info(f."table") tp
                                     WHERE tp.pk = f.seq + 1)) AS TARGET_COLUMN,
                   f.seq + 1 AS POSITION,
                   f.on_delete AS DELETE_RULE
            FROM sqlite_master m
            JOIN pragma_foreign_key_list(m.name) f
            WHERE m.type = 'table'
              AND UPPER(f."table") = ?1
            ORDER BY 1, 6
            LIMIT 1000
        "#,
        all_columns: r#"
            SELECT m.name AS TABLE_NAME,
                   p.name AS COLUMN_NAME
            FROM sqlite_master m
            JOIN pragma_table_info(m.name) p
            WHERE m.type = 'table'
              AND m.name NOT LIKE 'sqlite_%'
            ORDER BY m.name, p.cid
            LIMIT 10000
        "#,
    };
}
