use crate::error::GraphError;
use crate::schema;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Exponential backoff schedule for retried writes (spec.md §4.1): 100 ms,
/// 200 ms, 400 ms; max 3 attempts.
const RETRY_DELAYS_MS: [u64; 3] = [100, 200, 400];

/// Default bounded connection pool size and acquisition timeout
/// (spec.md §4.1).
pub const DEFAULT_POOL_SIZE: usize = 10;
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// The single connection to the graph engine, gated by a bounded semaphore
/// that stands in for the pool-size limit spec.md §4.1 calls for. SQLite
/// itself serializes writers; the semaphore bounds how many logical
/// queries may be in flight against the one `tokio_rusqlite::Connection`
/// at once, which is what callers actually observe as "pool exhaustion".
pub struct GraphGateway {
    conn: tokio_rusqlite::Connection,
    semaphore: Arc<Semaphore>,
    acquire_timeout: Duration,
}

impl GraphGateway {
    pub async fn open(
        path: &Path,
        pool_size: usize,
        acquire_timeout: Duration,
    ) -> Result<Self, GraphError> {
        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(GraphError::from)?;
        conn.call(|c| schema::init_schema(c).map_err(tokio_rusqlite::Error::from))
            .await
            .map_err(GraphError::from)?;
        Ok(Self {
            conn,
            semaphore: Arc::new(Semaphore::new(pool_size.max(1))),
            acquire_timeout,
        })
    }

    /// In-memory store, used by tests and by callers that want an
    /// ephemeral graph (e.g. `ijoka-cli --dry-run`-style tooling).
    pub async fn open_in_memory() -> Result<Self, GraphError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(GraphError::from)?;
        conn.call(|c| schema::init_schema(c).map_err(tokio_rusqlite::Error::from))
            .await
            .map_err(GraphError::from)?;
        Ok(Self {
            conn,
            semaphore: Arc::new(Semaphore::new(DEFAULT_POOL_SIZE)),
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
        })
    }

    async fn acquire(&self) -> Result<tokio::sync::SemaphorePermit<'_>, GraphError> {
        match tokio::time::timeout(self.acquire_timeout, self.semaphore.acquire()).await {
            Ok(Ok(permit)) => Ok(permit),
            Ok(Err(_)) => Err(GraphError::Internal("connection pool closed".into())),
            Err(_) => Err(GraphError::StoreUnavailable(
                "timed out acquiring a graph store connection".into(),
            )),
        }
    }

    /// A read query: no retry, snapshot isolation is whatever SQLite's
    /// default read consistency provides under WAL mode.
    pub async fn read<F, T>(&self, f: F) -> Result<T, GraphError>
    where
        F: FnOnce(&rusqlite::Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let _permit = self.acquire().await?;
        self.conn
            .call(move |c| f(c).map_err(tokio_rusqlite::Error::from))
            .await
            .map_err(GraphError::from)
    }

    /// A write query, retried with exponential backoff on transient
    /// conflicts (spec.md §4.1). `f` must be safe to re-run: the statement
    /// it issues should not have partially committed on a transient error
    /// (SQLite rolls back the whole transaction on `SQLITE_BUSY`).
    pub async fn write<F, T>(&self, f: F) -> Result<T, GraphError>
    where
        F: Fn(&rusqlite::Connection) -> rusqlite::Result<T> + Send + Sync + 'static,
        T: Send + 'static,
    {
        let _permit = self.acquire().await?;
        let f = Arc::new(f);
        let mut last_err = None;
        for (attempt, delay_ms) in std::iter::once(0u64)
            .chain(RETRY_DELAYS_MS.iter().copied())
            .enumerate()
        {
            if attempt > 0 {
                tracing::debug!(attempt, delay_ms, "retrying graph write after transient error");
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
            let f = f.clone();
            match self
                .conn
                .call(move |c| f(c).map_err(tokio_rusqlite::Error::from))
                .await
            {
                Ok(v) => return Ok(v),
                Err(e) => {
                    let e = GraphError::from(e);
                    if !e.is_transient() || attempt == RETRY_DELAYS_MS.len() {
                        return Err(e);
                    }
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| GraphError::Internal("unreachable retry loop".into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_in_memory_initializes_schema() {
        let gw = GraphGateway::open_in_memory().await.unwrap();
        let count: i64 = gw
            .read(|c| {
                c.query_row(
                    "SELECT count(*) FROM sqlite_master WHERE type='table' AND name='projects'",
                    [],
                    |r| r.get(0),
                )
            })
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let gw = GraphGateway::open_in_memory().await.unwrap();
        gw.write(|c| {
            c.execute(
                "INSERT INTO projects (id, path, name, description, created_at, updated_at) \
                 VALUES ('p1', '/tmp/p1', 'demo', NULL, '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z')",
                [],
            )
        })
        .await
        .unwrap();

        let name: String = gw
            .read(|c| c.query_row("SELECT name FROM projects WHERE id = 'p1'", [], |r| r.get(0)))
            .await
            .unwrap();
        assert_eq!(name, "demo");
    }

    #[tokio::test]
    async fn acquire_timeout_surfaces_store_unavailable() {
        let gw = GraphGateway {
            conn: tokio_rusqlite::Connection::open_in_memory().await.unwrap(),
            semaphore: Arc::new(Semaphore::new(1)),
            acquire_timeout: Duration::from_millis(10),
        };
        let _permit = gw.semaphore.clone().acquire_owned().await.unwrap();
        let result = gw.read(|_c| Ok(())).await;
        assert!(matches!(result, Err(GraphError::StoreUnavailable(_))));
    }
}
