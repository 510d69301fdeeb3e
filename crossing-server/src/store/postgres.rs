//! PostgreSQL crossing store.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::domain::{Check, Crossing, CrossingId, CrossingSnapshot, PhoneNumber, Subscription};

use super::{CrossingStore, StorageError};

/// Row shape shared by crossing queries: (id, name, latitude, longitude).
type CrossingRow = (i64, String, f64, f64);

fn crossing_from_row((id, name, latitude, longitude): CrossingRow) -> Crossing {
    Crossing {
        id: CrossingId(id),
        name,
        latitude,
        longitude,
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_foreign_key_violation())
}

/// Crossing store backed by a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing pool. Migrations are not run.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to `url` and apply the embedded migrations.
    pub async fn connect(url: &str) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(url)
            .await?;
        info!("connected to PostgreSQL");

        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("database migrations applied");

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl CrossingStore for PgStore {
    async fn find_crossing(&self, name: &str) -> Result<Option<Crossing>, StorageError> {
        let row: Option<CrossingRow> = sqlx::query_as(
            "SELECT id, name, latitude, longitude FROM crossings WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(crossing_from_row))
    }

    async fn insert_crossing(&self, snapshot: &CrossingSnapshot) -> Result<Crossing, StorageError> {
        let result: Result<(i64,), sqlx::Error> = sqlx::query_as(
            "INSERT INTO crossings (name, latitude, longitude)
             VALUES ($1, $2, $3)
             RETURNING id",
        )
        .bind(&snapshot.name)
        .bind(snapshot.latitude)
        .bind(snapshot.longitude)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok((id,)) => Ok(Crossing {
                id: CrossingId(id),
                name: snapshot.name.clone(),
                latitude: snapshot.latitude,
                longitude: snapshot.longitude,
            }),
            Err(e) if is_unique_violation(&e) => Err(StorageError::Conflict {
                key: format!("crossing {}", snapshot.name),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_crossings(&self) -> Result<Vec<Crossing>, StorageError> {
        let rows: Vec<CrossingRow> = sqlx::query_as(
            "SELECT id, name, latitude, longitude FROM crossings ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(crossing_from_row).collect())
    }

    async fn crossing_exists(&self, id: CrossingId) -> Result<bool, StorageError> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM crossings WHERE id = $1)")
                .bind(id.0)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn latest_check(&self, name: &str) -> Result<Option<Check>, StorageError> {
        let row: Option<(i64, String, DateTime<Utc>)> = sqlx::query_as(
            "SELECT k.crossing_id, k.status, k.checked_at
             FROM checks k
             JOIN crossings c ON c.id = k.crossing_id
             WHERE c.name = $1
             ORDER BY k.checked_at DESC, k.id DESC
             LIMIT 1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(crossing_id, status, checked_at)| Check {
            crossing_id: CrossingId(crossing_id),
            status,
            checked_at,
        }))
    }

    async fn insert_check(&self, check: &Check) -> Result<(), StorageError> {
        let result = sqlx::query(
            "INSERT INTO checks (crossing_id, status, checked_at)
             VALUES ($1, $2, $3)",
        )
        .bind(check.crossing_id.0)
        .bind(&check.status)
        .bind(check.checked_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_foreign_key_violation(&e) => Err(StorageError::NotFound {
                what: format!("crossing {}", check.crossing_id),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn subscribers(&self, id: CrossingId) -> Result<Vec<PhoneNumber>, StorageError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT phone_number FROM subscriptions WHERE crossing_id = $1 ORDER BY id ASC",
        )
        .bind(id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(phone,)| {
                PhoneNumber::parse(&phone).map_err(|e| StorageError::InvalidRow {
                    message: format!("subscription for crossing {id}: {e}"),
                })
            })
            .collect()
    }

    async fn insert_subscription(&self, subscription: &Subscription) -> Result<(), StorageError> {
        let result = sqlx::query(
            "INSERT INTO subscriptions (crossing_id, phone_number)
             VALUES ($1, $2)
             ON CONFLICT (crossing_id, phone_number) DO NOTHING",
        )
        .bind(subscription.crossing_id.0)
        .bind(subscription.phone_number.as_str())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_foreign_key_violation(&e) => Err(StorageError::NotFound {
                what: format!("crossing {}", subscription.crossing_id),
            }),
            Err(e) => Err(e.into()),
        }
    }
}
