use std::{sync::Arc, time::Duration};

use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use moka::sync::Cache;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

pub type AppState = Arc<State>;

/// Cached outcome of bearer-token validation
#[derive(Clone, Debug)]
pub enum CachedAuth {
    /// Valid token for a known account
    User { id: i32, staff: bool },
    /// Invalid/expired token
    Invalid,
}

pub struct State {
    pub db: DatabaseConnection,
    pub jwt_decoding_key: DecodingKey,
    pub jwt_validation: Validation,
    /// Auth token cache: token_hash -> CachedAuth
    /// Short TTL (240s) to balance security vs performance
    pub auth_cache: Cache<String, CachedAuth>,
}

impl State {
    pub async fn new(
        database_url: &str,
        jwt_secret: &str,
        sqlx_logging: bool,
    ) -> Result<Self, DbErr> {
        let mut opt = ConnectOptions::new(database_url.to_owned());
        opt.max_connections(10)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(8))
            .sqlx_logging(sqlx_logging);

        let db = Database::connect(opt).await?;
        Ok(Self::with_connection(db, jwt_secret))
    }

    /// Build a state over an existing connection. Used by tests with an
    /// in-memory database.
    pub fn with_connection(db: DatabaseConnection, jwt_secret: &str) -> Self {
        Self {
            db,
            jwt_decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            jwt_validation: Validation::new(Algorithm::HS256),
            auth_cache: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(Duration::from_secs(240))
                .build(),
        }
    }
}
