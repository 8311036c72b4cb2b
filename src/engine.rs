//! Session lifecycle engine
//!
//! Per request the engine moves a session through these states:
//!
//! ```text
//! no id          -> create
//! id, valid      -> re-stamp expiry (sliding) -> use
//! id, expired    -> delete stale record -> create
//! id, not found  -> create
//! ...handler runs...
//! delete flag    -> delete                       (terminal)
//! rotate flag    -> delete old, create under new id
//! dirty/throttle -> persist                      (terminal)
//! ```
//!
//! The engine is framework-agnostic apart from the cookie jars it reads and
//! writes; [`crate::SessionHandler`] wires it into Salvo.

use chrono::{DateTime, Utc};

use crate::config::SessionConfig;
use crate::error::SessionResult;
use crate::record::SessionRecord;
use crate::session::Session;
use crate::session_id::generate_session_id;
use crate::store::{CookieCarriedStore, CookieContext, SessionStore, StoreBackend};
use salvo_core::http::cookie::CookieJar;
use salvo_core::http::header::HeaderMap;

/// Drives a configured store through the session lifecycle
#[derive(Debug, Clone)]
pub struct SessionEngine {
    backend: StoreBackend,
    config: SessionConfig,
}

impl SessionEngine {
    pub fn new(backend: StoreBackend, config: SessionConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Session ID offered by the client: the cookie first, then the fallback header
    pub fn candidate_id(&self, cookies: &CookieJar, headers: &HeaderMap) -> Option<String> {
        let from_cookie = cookies.get(&self.config.cookie_name).map(|cookie| {
            let raw = cookie.value();
            if self.config.decode_cookie {
                urlencoding::decode(raw)
                    .map(|decoded| decoded.into_owned())
                    .unwrap_or_else(|_| raw.to_string())
            } else {
                raw.to_string()
            }
        });

        from_cookie
            .or_else(|| {
                headers
                    .get(self.config.header_name.as_str())
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_string)
            })
            .filter(|sid| !sid.is_empty())
    }

    /// Find or create the session for this request
    pub async fn load(
        &self,
        candidate: Option<String>,
        ctx: &mut CookieContext<'_>,
    ) -> SessionResult<Session> {
        self.load_at(candidate, ctx, Utc::now()).await
    }

    async fn load_at(
        &self,
        candidate: Option<String>,
        ctx: &mut CookieContext<'_>,
        now: DateTime<Utc>,
    ) -> SessionResult<Session> {
        let Some(sid) = candidate else {
            tracing::debug!("no session id on request");
            return self.create_fresh(ctx, now).await;
        };

        match self.fetch(&sid, ctx).await? {
            None => {
                tracing::debug!(session_id = %sid, "session not found in store");
                self.create_fresh(ctx, now).await
            }
            Some(mut record) if record.is_valid_at(now) => {
                if record.restamp(now, self.config.ttl()) {
                    self.persist(&sid, &record, ctx).await?;
                }
                let mut session = Session::new(sid, record, false, self.config.access_throttle);
                session.update_access_time_at(now);
                Ok(session)
            }
            Some(_) => {
                tracing::warn!(session_id = %sid, "session expired, replacing it");
                self.delete(&sid, ctx).await?;
                self.create_fresh(ctx, now).await
            }
        }
    }

    /// Reconcile the session with the store once the handler is done.
    ///
    /// Deletion wins over everything else: a deleted session is never rotated
    /// or persisted.
    pub async fn finalize(
        &self,
        session: &mut Session,
        rotate: bool,
        ctx: &mut CookieContext<'_>,
    ) -> SessionResult<()> {
        if session.is_deleted() {
            tracing::debug!(session_id = %session.id(), "deleting session");
            self.delete(session.id(), ctx).await?;
            ctx.response
                .add(self.config.cookie.removal_cookie(&self.config.cookie_name));
            return Ok(());
        }

        if rotate {
            self.rotate(session, ctx).await?;
        }

        if session.needs_persistence() {
            self.persist(session.id(), session.record(), ctx).await?;
            session.mark_persisted();
        }

        Ok(())
    }

    /// Send the session ID back to the client
    pub fn write_id_cookie(&self, response: &mut CookieJar, sid: &str) {
        response.add(
            self.config
                .cookie
                .build_cookie(&self.config.cookie_name, sid.to_string(), None),
        );
    }

    async fn rotate(
        &self,
        session: &mut Session,
        ctx: &mut CookieContext<'_>,
    ) -> SessionResult<()> {
        let new_id = generate_session_id();
        tracing::debug!(old = %session.id(), new = %new_id, "rotating session id");

        self.delete(session.id(), ctx).await?;
        self.create(&new_id, session.record(), ctx).await?;
        self.write_id_cookie(&mut *ctx.response, &new_id);

        session.assign_id(new_id);
        session.mark_persisted();
        Ok(())
    }

    async fn create_fresh(
        &self,
        ctx: &mut CookieContext<'_>,
        now: DateTime<Utc>,
    ) -> SessionResult<Session> {
        let sid = generate_session_id();
        let record = SessionRecord::new(now, self.config.ttl());
        self.create(&sid, &record, ctx).await?;
        tracing::debug!(session_id = %sid, "created session");
        Ok(Session::new(sid, record, true, self.config.access_throttle))
    }

    async fn create(
        &self,
        sid: &str,
        record: &SessionRecord,
        ctx: &mut CookieContext<'_>,
    ) -> SessionResult<()> {
        match &self.backend {
            StoreBackend::Keyed(store) => store.create_session(sid, record).await,
            StoreBackend::CookieCarried(store) => store.create_session(ctx, record).await,
        }
    }

    async fn fetch(
        &self,
        sid: &str,
        ctx: &mut CookieContext<'_>,
    ) -> SessionResult<Option<SessionRecord>> {
        match &self.backend {
            StoreBackend::Keyed(store) => store.get_session_by_id(sid).await,
            StoreBackend::CookieCarried(store) => store.get_session(ctx).await,
        }
    }

    async fn persist(
        &self,
        sid: &str,
        record: &SessionRecord,
        ctx: &mut CookieContext<'_>,
    ) -> SessionResult<()> {
        match &self.backend {
            StoreBackend::Keyed(store) => store.persist_session_data(sid, record).await,
            StoreBackend::CookieCarried(store) => store.persist_session_data(ctx, record).await,
        }
    }

    async fn delete(&self, sid: &str, ctx: &mut CookieContext<'_>) -> SessionResult<()> {
        match &self.backend {
            StoreBackend::Keyed(store) => store.delete_session(sid).await,
            StoreBackend::CookieCarried(store) => store.delete_session(ctx).await,
        }
    }
}
