use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use thiserror::Error;

use crate::drink::{Drink, Ingredient};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("a drink titled '{0}' already exists")]
    Duplicate(String),
    #[error("stored recipe for drink {id} is unreadable: {source}")]
    CorruptRecipe { id: i64, source: serde_json::Error },
    #[error("failed to encode recipe: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(sqlx::FromRow)]
struct DrinkRow {
    id: i64,
    title: String,
    recipe: String,
}

impl TryFrom<DrinkRow> for Drink {
    type Error = RepoError;

    fn try_from(row: DrinkRow) -> RepoResult<Self> {
        let recipe = serde_json::from_str(&row.recipe)
            .map_err(|source| RepoError::CorruptRecipe { id: row.id, source })?;
        Ok(Drink { id: row.id, title: row.title, recipe })
    }
}

/// Opens the pool and applies migrations. In-memory databases get a single pinned connection.
pub async fn connect(database_url: &str) -> RepoResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let pool = if database_url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?
    };
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

fn map_write_error(err: sqlx::Error, title: &str) -> RepoError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepoError::Duplicate(title.to_string())
        }
        _ => RepoError::Database(err),
    }
}

pub async fn list_drinks(db: &SqlitePool) -> RepoResult<Vec<Drink>> {
    let rows = sqlx::query_as::<_, DrinkRow>("SELECT id, title, recipe FROM drinks ORDER BY id")
        .fetch_all(db)
        .await?;
    rows.into_iter().map(Drink::try_from).collect()
}

pub async fn get_drink(db: &SqlitePool, id: i64) -> RepoResult<Option<Drink>> {
    let row = sqlx::query_as::<_, DrinkRow>("SELECT id, title, recipe FROM drinks WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await?;
    row.map(Drink::try_from).transpose()
}

pub async fn insert_drink(db: &SqlitePool, title: &str, recipe: &[Ingredient]) -> RepoResult<Drink> {
    let encoded = serde_json::to_string(recipe)?;
    let row = sqlx::query_as::<_, DrinkRow>(
        "INSERT INTO drinks (title, recipe) VALUES (?, ?) RETURNING id, title, recipe",
    )
    .bind(title)
    .bind(encoded)
    .fetch_one(db)
    .await
    .map_err(|err| map_write_error(err, title))?;
    Drink::try_from(row)
}

/// Applies the provided fields; `Ok(None)` when the drink does not exist.
pub async fn update_drink(
    db: &SqlitePool,
    id: i64,
    title: Option<&str>,
    recipe: Option<&[Ingredient]>,
) -> RepoResult<Option<Drink>> {
    let Some(existing) = get_drink(db, id).await? else {
        return Ok(None);
    };
    let title = title.unwrap_or(&existing.title);
    let encoded = serde_json::to_string(recipe.unwrap_or(&existing.recipe))?;

    let row = sqlx::query_as::<_, DrinkRow>(
        "UPDATE drinks SET title = ?, recipe = ? WHERE id = ? RETURNING id, title, recipe",
    )
    .bind(title)
    .bind(encoded)
    .bind(id)
    .fetch_optional(db)
    .await
    .map_err(|err| map_write_error(err, title))?;
    row.map(Drink::try_from).transpose()
}

pub async fn delete_drink(db: &SqlitePool, id: i64) -> RepoResult<bool> {
    let result = sqlx::query("DELETE FROM drinks WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Empties the table and seeds the sample drink.
pub async fn reset_and_seed(db: &SqlitePool) -> RepoResult<Drink> {
    let mut tx = db.begin().await?;
    sqlx::query("DELETE FROM drinks").execute(&mut *tx).await?;
    sqlx::query("DELETE FROM sqlite_sequence WHERE name = 'drinks'")
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    let water = [Ingredient {
        name: "water".to_string(),
        color: "blue".to_string(),
        parts: 1,
    }];
    insert_drink(db, "water", &water).await
}
