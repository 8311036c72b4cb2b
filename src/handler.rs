//! Session middleware handler for Salvo

use futures::FutureExt;
use salvo_core::http::StatusError;
use salvo_core::prelude::*;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use crate::config::SessionConfig;
use crate::depot_ext::{SessionDepotExt, SESSION_KEY};
use crate::engine::SessionEngine;
use crate::session::Session;
use crate::store::{CookieCarriedStore, CookieContext, MemoryStore, SessionStore, StoreBackend};

/// Session middleware for Salvo
///
/// Loads (or creates) the session before the rest of the chain runs, exposes
/// it through [`SessionDepotExt`], and writes it back once the chain is done,
/// even when a downstream handler panics.
#[derive(Clone)]
pub struct SessionHandler {
    engine: Arc<SessionEngine>,
}

impl SessionHandler {
    /// Create a session handler over an identifier-keyed store
    pub fn new<S: SessionStore>(store: S, config: SessionConfig) -> Self {
        Self::with_backend(StoreBackend::keyed(store), config)
    }

    /// Create a session handler over a cookie-carried store
    pub fn with_cookie_store<S: CookieCarriedStore>(store: S, config: SessionConfig) -> Self {
        Self::with_backend(StoreBackend::cookie_carried(store), config)
    }

    /// Create a session handler over an explicit backend
    pub fn with_backend(backend: StoreBackend, config: SessionConfig) -> Self {
        Self {
            engine: Arc::new(SessionEngine::new(backend, config)),
        }
    }

    /// Create a session handler owning a fresh [`MemoryStore`]
    pub fn in_memory(config: SessionConfig) -> Self {
        Self::new(MemoryStore::new(), config)
    }

    /// The engine driving this handler
    pub fn engine(&self) -> &SessionEngine {
        &self.engine
    }
}

#[async_trait]
impl Handler for SessionHandler {
    async fn handle(
        &self,
        req: &mut Request,
        depot: &mut Depot,
        res: &mut Response,
        ctrl: &mut FlowCtrl,
    ) {
        let candidate = self.engine.candidate_id(req.cookies(), req.headers());

        let loaded = {
            let mut ctx = CookieContext::new(req.cookies(), res.cookies_mut());
            self.engine.load(candidate, &mut ctx).await
        };
        let session = match loaded {
            Ok(session) => session,
            Err(e) => {
                // Fail closed: never run the handler without a usable session.
                tracing::error!(error = %e, "failed to load session");
                res.render(unavailable());
                ctrl.skip_rest();
                return;
            }
        };

        let sid = session.id().to_string();
        depot.insert(SESSION_KEY, session);
        self.engine.write_id_cookie(res.cookies_mut(), &sid);

        let outcome = AssertUnwindSafe(ctrl.call_next(req, depot, res))
            .catch_unwind()
            .await;

        let rotate = depot.rotation_requested();
        match depot.remove::<Session>(SESSION_KEY) {
            Ok(mut session) => {
                let mut ctx = CookieContext::new(req.cookies(), res.cookies_mut());
                if let Err(e) = self.engine.finalize(&mut session, rotate, &mut ctx).await {
                    tracing::error!(
                        error = %e,
                        session_id = %session.id(),
                        "failed to save session"
                    );
                    res.render(unavailable());
                }
            }
            Err(_) => {
                tracing::warn!(session_id = %sid, "session missing from depot, nothing persisted");
            }
        }

        if let Err(panic) = outcome {
            std::panic::resume_unwind(panic);
        }
    }
}

fn unavailable() -> StatusError {
    StatusError::internal_server_error().brief("Session store unavailable.")
}
