//! Session store traits
//!
//! Two kinds of backend exist. Identifier-keyed stores ([`SessionStore`]) keep
//! records server-side under the session ID. Cookie-carried stores
//! ([`CookieCarriedStore`]) keep the whole record in a cookie and are keyed by
//! the request/response cookie jars instead. The engine picks between them
//! through [`StoreBackend`].

use async_trait::async_trait;
use salvo_core::http::cookie::CookieJar;
use std::sync::Arc;

use crate::error::SessionResult;
use crate::record::SessionRecord;

/// Trait for identifier-keyed session storage backends
///
/// Records are exchanged as [`SessionRecord`]s, which serialize to JSON.
/// Concurrent writes for the same ID must at least be last-writer-wins.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Create a session record.
    ///
    /// When `record.metadata.expire` is set the backend should expire the entry
    /// on its own as well.
    async fn create_session(&self, sid: &str, record: &SessionRecord) -> SessionResult<()>;

    /// Get a session record by ID
    ///
    /// Returns None if the session doesn't exist
    async fn get_session_by_id(&self, sid: &str) -> SessionResult<Option<SessionRecord>>;

    /// Overwrite the stored record, refreshing any backend TTL to match `expire`
    async fn persist_session_data(&self, sid: &str, record: &SessionRecord) -> SessionResult<()>;

    /// Delete a session; deleting an unknown ID is not an error
    async fn delete_session(&self, sid: &str) -> SessionResult<()>;
}

/// Cookie jars of the request being handled
pub struct CookieContext<'a> {
    /// Cookies sent by the client
    pub request: &'a CookieJar,
    /// Cookies that will be sent back with the response
    pub response: &'a mut CookieJar,
}

impl<'a> CookieContext<'a> {
    pub fn new(request: &'a CookieJar, response: &'a mut CookieJar) -> Self {
        Self { request, response }
    }
}

/// Trait for backends that embed the whole record in a cookie
#[async_trait]
pub trait CookieCarriedStore: Send + Sync + 'static {
    /// Write a new record into the response cookies
    async fn create_session(
        &self,
        ctx: &mut CookieContext<'_>,
        record: &SessionRecord,
    ) -> SessionResult<()>;

    /// Read the record carried by the request, None if absent or unreadable
    async fn get_session(&self, ctx: &CookieContext<'_>) -> SessionResult<Option<SessionRecord>>;

    /// Overwrite the record in the response cookies
    async fn persist_session_data(
        &self,
        ctx: &mut CookieContext<'_>,
        record: &SessionRecord,
    ) -> SessionResult<()>;

    /// Clear the record cookie on the client
    async fn delete_session(&self, ctx: &mut CookieContext<'_>) -> SessionResult<()>;
}

/// The backend the engine drives
#[derive(Clone)]
pub enum StoreBackend {
    /// Records live server-side, keyed by session ID
    Keyed(Arc<dyn SessionStore>),
    /// Records travel in a cookie, keyed by the request
    CookieCarried(Arc<dyn CookieCarriedStore>),
}

impl StoreBackend {
    /// Wrap an identifier-keyed store
    pub fn keyed<S: SessionStore>(store: S) -> Self {
        Self::Keyed(Arc::new(store))
    }

    /// Wrap a cookie-carried store
    pub fn cookie_carried<S: CookieCarriedStore>(store: S) -> Self {
        Self::CookieCarried(Arc::new(store))
    }
}

impl std::fmt::Debug for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Keyed(_) => f.write_str("StoreBackend::Keyed"),
            Self::CookieCarried(_) => f.write_str("StoreBackend::CookieCarried"),
        }
    }
}
