//! Request-scoped connection leases.
//!
//! A lease gives a handler exclusive use of one pooled connection for the
//! duration of a request. The connection lives in a shared slot: handlers
//! lock it through `ConnectionLease`, and only the `LeaseOwner` held by the
//! connection middleware can hand it back to the pool. Whichever happens
//! first, an explicit release or the slot being dropped (panic, cancelled
//! request), returns the connection, and it is returned exactly once.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};

use crate::{db::session::SessionConfig, error::AppError};

/// Anything that can hand out and take back database connections.
///
/// Implemented for the MySQL pool; tests substitute an instrumented source.
#[async_trait]
pub trait ConnectionSource: Clone + Send + Sync + 'static {
    type Connection: Send + 'static;

    /// Check a connection out, waiting up to the source's own timeout.
    async fn acquire(&self) -> Result<Self::Connection, sqlx::Error>;

    /// Apply session settings to a freshly acquired connection.
    async fn configure(
        &self,
        conn: &mut Self::Connection,
        session: &SessionConfig,
    ) -> Result<(), sqlx::Error>;

    /// Give a connection back.
    fn release(&self, conn: Self::Connection);
}

struct Slot<S: ConnectionSource> {
    source: S,
    conn: Option<S::Connection>,
}

impl<S: ConnectionSource> Slot<S> {
    fn release(&mut self) -> bool {
        match self.conn.take() {
            Some(conn) => {
                self.source.release(conn);
                true
            }
            None => false,
        }
    }
}

impl<S: ConnectionSource> Drop for Slot<S> {
    fn drop(&mut self) {
        if self.release() {
            tracing::debug!("connection released on drop");
        }
    }
}

/// Handler-side view of the request's connection.
///
/// Cloned into the request extensions by the connection middleware and
/// extracted by handlers as an argument.
pub struct ConnectionLease<S: ConnectionSource> {
    slot: Arc<Mutex<Slot<S>>>,
}

impl<S: ConnectionSource> Clone for ConnectionLease<S> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

/// Middleware-side handle; the only thing that can release the connection.
pub struct LeaseOwner<S: ConnectionSource> {
    slot: Arc<Mutex<Slot<S>>>,
}

impl<S: ConnectionSource> ConnectionLease<S> {
    /// Wrap a configured connection, returning the owner and the handler lease.
    pub fn issue(source: S, conn: S::Connection) -> (LeaseOwner<S>, Self) {
        let slot = Arc::new(Mutex::new(Slot {
            source,
            conn: Some(conn),
        }));
        (
            LeaseOwner {
                slot: Arc::clone(&slot),
            },
            Self { slot },
        )
    }

    /// Lock the connection for exclusive use.
    ///
    /// # Errors
    ///
    /// `AppError::ConnectionUnavailable` once the owner has released it.
    pub async fn lock(&self) -> Result<MappedMutexGuard<'_, S::Connection>, AppError> {
        let guard = self.slot.lock().await;
        MutexGuard::try_map(guard, |slot| slot.conn.as_mut())
            .map_err(|_| AppError::ConnectionUnavailable)
    }
}

impl<S: ConnectionSource> LeaseOwner<S> {
    /// Return the connection to its source.
    ///
    /// Waits for any handler still holding the lock. Returns `false` if the
    /// connection was already gone.
    pub async fn release(self) -> bool {
        self.slot.lock().await.release()
    }
}

impl<S, St> FromRequestParts<St> for ConnectionLease<S>
where
    S: ConnectionSource,
    St: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &St) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or(AppError::ConnectionUnavailable)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Instrumented in-memory connection source.

    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use async_trait::async_trait;

    use super::ConnectionSource;
    use crate::db::session::SessionConfig;

    #[derive(Debug, Default)]
    pub struct Counters {
        pub acquired: AtomicUsize,
        pub configured: AtomicUsize,
        pub released: AtomicUsize,
    }

    impl Counters {
        pub fn acquired(&self) -> usize {
            self.acquired.load(Ordering::SeqCst)
        }

        pub fn configured(&self) -> usize {
            self.configured.load(Ordering::SeqCst)
        }

        pub fn released(&self) -> usize {
            self.released.load(Ordering::SeqCst)
        }
    }

    #[derive(Debug)]
    pub struct FakeConnection {
        pub id: usize,
        pub session: Option<SessionConfig>,
    }

    #[derive(Debug, Clone, Default)]
    pub struct CountingSource {
        pub counters: Arc<Counters>,
        pub fail_acquire: bool,
        pub fail_configure: bool,
    }

    #[async_trait]
    impl ConnectionSource for CountingSource {
        type Connection = FakeConnection;

        async fn acquire(&self) -> Result<FakeConnection, sqlx::Error> {
            if self.fail_acquire {
                return Err(sqlx::Error::PoolTimedOut);
            }
            let id = self.counters.acquired.fetch_add(1, Ordering::SeqCst);
            Ok(FakeConnection { id, session: None })
        }

        async fn configure(
            &self,
            conn: &mut FakeConnection,
            session: &SessionConfig,
        ) -> Result<(), sqlx::Error> {
            if self.fail_configure {
                return Err(sqlx::Error::Protocol("SET time_zone rejected".into()));
            }
            conn.session = Some(session.clone());
            self.counters.configured.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn release(&self, _conn: FakeConnection) {
            self.counters.released.fetch_add(1, Ordering::SeqCst);
        }
    }
}
