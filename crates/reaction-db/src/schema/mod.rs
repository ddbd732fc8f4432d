//! Reactions table and index provisioning
//!
//! Every statement is idempotent. Indexes are built with
//! `CREATE INDEX CONCURRENTLY`, which takes no lock that blocks reads or
//! writes on the live table. An interrupted concurrent build leaves an
//! INVALID index behind that `IF NOT EXISTS` would skip, so such leftovers
//! are dropped and rebuilt.

use sqlx::PgPool;
use tracing::{info, instrument, warn};

use reaction_core::schema::REACTIONS_COLLECTION;
use reaction_core::{IndexDefinition, RepoResult, REACTION_INDEXES};

use crate::repositories::map_db_error;

/// Table definition. Timestamps carry microsecond precision, which the
/// domain layer truncates to before writing.
pub fn create_table_sql() -> String {
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS {REACTIONS_COLLECTION} (
            id            BIGINT      PRIMARY KEY,
            post_id       BIGINT      NOT NULL,
            user_id       BIGINT      NOT NULL,
            reaction_type VARCHAR(32) NOT NULL,
            created_at    TIMESTAMPTZ NOT NULL,
            updated_at    TIMESTAMPTZ NOT NULL
        )
        "#
    )
}

/// `CREATE [UNIQUE] INDEX CONCURRENTLY IF NOT EXISTS ...` for one definition
pub fn create_index_sql(index: &IndexDefinition) -> String {
    format!(
        "CREATE {unique}INDEX CONCURRENTLY IF NOT EXISTS {name} ON {table} ({columns})",
        unique = if index.unique { "UNIQUE " } else { "" },
        name = index.name,
        table = REACTIONS_COLLECTION,
        columns = index.column_list(),
    )
}

fn drop_index_sql(index: &IndexDefinition) -> String {
    format!("DROP INDEX CONCURRENTLY IF EXISTS {}", index.name)
}

/// `Some(valid)` if the index exists, `None` otherwise
async fn index_validity(pool: &PgPool, name: &str) -> RepoResult<Option<bool>> {
    sqlx::query_scalar::<_, bool>(
        r#"
        SELECT i.indisvalid
        FROM pg_class c
        JOIN pg_index i ON i.indexrelid = c.oid
        WHERE c.relname = $1
        "#,
    )
    .bind(name)
    .fetch_optional(pool)
    .await
    .map_err(map_db_error)
}

/// Create the reactions table and build any missing index online
#[instrument(skip(pool))]
pub async fn ensure_schema(pool: &PgPool) -> RepoResult<()> {
    sqlx::raw_sql(&create_table_sql())
        .execute(pool)
        .await
        .map_err(map_db_error)?;

    for index in &REACTION_INDEXES {
        match index_validity(pool, index.name).await? {
            Some(true) => continue,
            Some(false) => {
                warn!(index = index.name, "Dropping invalid index left by an interrupted build");
                // CONCURRENTLY cannot run inside a transaction; raw_sql sends a simple query.
                sqlx::raw_sql(&drop_index_sql(index))
                    .execute(pool)
                    .await
                    .map_err(map_db_error)?;
            }
            None => {}
        }

        sqlx::raw_sql(&create_index_sql(index))
            .execute(pool)
            .await
            .map_err(map_db_error)?;

        info!(
            index = index.name,
            unique = index.unique,
            columns = %index.column_list(),
            "Index built"
        );
    }

    Ok(())
}
