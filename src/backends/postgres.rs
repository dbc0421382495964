//! Postgres Backend
//!
//! GPL baselines, misalignment audit and the CM snapshot replica. The
//! statement is prepared first for its column types, then run through the
//! simple query protocol. Text values become JSON scalars according to the
//! declared column type only; text columns pass through verbatim.

use async_trait::async_trait;
use r2d2::Pool;
use r2d2_postgres::postgres::types::Type;
use r2d2_postgres::postgres::{Config, NoTls, SimpleQueryMessage};
use r2d2_postgres::PostgresConnectionManager;
use serde_json::{Number, Value};

use ran_assistant_core::{BackendKind, CoreError, CoreResult, QueryBackend, Row, Rows};

use crate::models::settings::PostgresConfig;
use crate::utils::error::{AppError, AppResult};

pub type PgPool = Pool<PostgresConnectionManager<NoTls>>;

/// Postgres executor over a shared r2d2 pool.
#[derive(Clone)]
pub struct PostgresBackend {
    pool: PgPool,
}

impl PostgresBackend {
    /// Build the pool without connecting. Connection errors surface on first
    /// use, where the fallback controller can handle them.
    pub fn connect(config: &PostgresConfig) -> AppResult<Self> {
        let pg_config: Config = config
            .url
            .parse()
            .map_err(|e| AppError::config(format!("invalid postgres url: {}", e)))?;
        let manager = PostgresConnectionManager::new(pg_config, NoTls);
        let pool = Pool::builder()
            .max_size(config.max_connections)
            .build_unchecked(manager);
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl std::fmt::Debug for PostgresBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresBackend")
            .field("max_size", &self.pool.max_size())
            .finish()
    }
}

#[async_trait]
impl QueryBackend for PostgresBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Postgres
    }

    async fn execute(&self, query: &str) -> CoreResult<Rows> {
        let pool = self.pool.clone();
        let query = query.to_string();

        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|e| CoreError::unavailable(format!("postgres pool: {}", e)))?;
            let statement = conn
                .prepare(&query)
                .map_err(|e| CoreError::backend(format!("postgres: {}", e)))?;
            let types: Vec<Type> = statement
                .columns()
                .iter()
                .map(|c| c.type_().clone())
                .collect();
            let messages = conn
                .simple_query(&query)
                .map_err(|e| CoreError::backend(format!("postgres: {}", e)))?;
            Ok(rows_from_messages(messages, &types))
        })
        .await
        .map_err(|e| CoreError::internal(format!("postgres worker failed: {}", e)))?
    }
}

fn rows_from_messages(messages: Vec<SimpleQueryMessage>, types: &[Type]) -> Rows {
    let mut rows = Rows::new();
    for message in messages {
        if let SimpleQueryMessage::Row(row) = message {
            let mut out = Row::new();
            for (i, column) in row.columns().iter().enumerate() {
                let value = match types.get(i) {
                    Some(ty) => typed_value(ty, row.get(i)),
                    None => row.get(i).map_or(Value::Null, |t| Value::String(t.to_string())),
                };
                out.insert(column.name().to_string(), value);
            }
            rows.push(out);
        }
    }
    rows
}

/// Convert one text-protocol cell using its declared column type.
///
/// Booleans, integers and floats/numerics become JSON scalars. A value that
/// does not parse for its type (`NaN`, `Infinity`), and every other type,
/// stays the string Postgres sent.
pub fn typed_value(ty: &Type, value: Option<&str>) -> Value {
    let Some(text) = value else {
        return Value::Null;
    };

    let converted = if *ty == Type::BOOL {
        match text {
            "t" => Some(Value::Bool(true)),
            "f" => Some(Value::Bool(false)),
            _ => None,
        }
    } else if *ty == Type::INT2 || *ty == Type::INT4 || *ty == Type::INT8 || *ty == Type::OID {
        text.parse::<i64>().ok().map(|n| Value::Number(n.into()))
    } else if *ty == Type::FLOAT4 || *ty == Type::FLOAT8 || *ty == Type::NUMERIC {
        text.parse::<i64>()
            .ok()
            .map(|n| Value::Number(n.into()))
            .or_else(|| {
                text.parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
            })
    } else {
        None
    };

    converted.unwrap_or_else(|| Value::String(text.to_string()))
}
