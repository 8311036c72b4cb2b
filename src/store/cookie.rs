//! Cookie-carried session store
//!
//! The whole record is serialized to JSON, base64url-encoded and signed with
//! HMAC-SHA256, then sent to the client in its own cookie. Nothing is kept
//! server-side.

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;

use super::{CookieCarriedStore, CookieContext};
use crate::config::CookieOptions;
use crate::cookie_signature::{sign, unsign_with_secrets};
use crate::error::{SessionError, SessionResult};
use crate::record::SessionRecord;

/// Browsers commonly refuse cookies larger than this
const MAX_COOKIE_BYTES: usize = 4096;

/// Signed cookie session store
///
/// # Example
///
/// ```rust,ignore
/// use salvo_sliding_session::{CookieStore, SessionConfig, SessionHandler};
///
/// let store = CookieStore::new("a long random secret");
/// let handler = SessionHandler::with_cookie_store(store, SessionConfig::default());
/// ```
#[derive(Clone, Debug)]
pub struct CookieStore {
    cookie_name: String,
    secrets: Vec<String>,
    options: CookieOptions,
}

impl CookieStore {
    /// Create a store signing payloads with `secret`
    pub fn new<S: Into<String>>(secret: S) -> Self {
        Self::with_secrets([secret])
    }

    /// Create a store with several secrets.
    /// The first one signs new payloads, all of them are accepted on read.
    pub fn with_secrets<I, S>(secrets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cookie_name: "session_data".to_string(),
            secrets: secrets.into_iter().map(Into::into).collect(),
            options: CookieOptions::default(),
        }
    }

    /// Set the name of the payload cookie (default: "session_data")
    pub fn with_cookie_name<S: Into<String>>(mut self, name: S) -> Self {
        self.cookie_name = name.into();
        self
    }

    /// Set the attributes of the payload cookie
    pub fn with_cookie_options(mut self, options: CookieOptions) -> Self {
        self.options = options;
        self
    }

    /// Name of the payload cookie
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    fn encode(&self, record: &SessionRecord) -> SessionResult<String> {
        let secret = self
            .secrets
            .first()
            .ok_or_else(|| SessionError::store("cookie store has no signing secret"))?;
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(record)?);
        Ok(sign(&payload, secret))
    }

    fn decode(&self, value: &str) -> SessionResult<SessionRecord> {
        let payload =
            unsign_with_secrets(value, &self.secrets).ok_or(SessionError::InvalidSignature)?;
        let bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|e| SessionError::InvalidPayload(e.to_string()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn write(&self, ctx: &mut CookieContext<'_>, record: &SessionRecord) -> SessionResult<()> {
        let value = self.encode(record)?;
        if value.len() > MAX_COOKIE_BYTES {
            tracing::warn!(
                bytes = value.len(),
                "session cookie exceeds {} bytes and may be rejected by the browser",
                MAX_COOKIE_BYTES
            );
        }
        let max_age = record
            .remaining_secs(Utc::now())
            .map(|secs| u64::try_from(secs).unwrap_or(0));
        ctx.response
            .add(self.options.build_cookie(&self.cookie_name, value, max_age));
        Ok(())
    }
}

#[async_trait]
impl CookieCarriedStore for CookieStore {
    async fn create_session(
        &self,
        ctx: &mut CookieContext<'_>,
        record: &SessionRecord,
    ) -> SessionResult<()> {
        self.write(ctx, record)
    }

    async fn get_session(&self, ctx: &CookieContext<'_>) -> SessionResult<Option<SessionRecord>> {
        // A payload written earlier in this request wins over the one the client sent.
        let Some(cookie) = ctx
            .response
            .get(&self.cookie_name)
            .or_else(|| ctx.request.get(&self.cookie_name))
        else {
            return Ok(None);
        };
        if cookie.value().is_empty() {
            return Ok(None);
        }
        // A forged or corrupted payload is the client's problem, not a backend failure.
        match self.decode(cookie.value()) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable session cookie");
                Ok(None)
            }
        }
    }

    async fn persist_session_data(
        &self,
        ctx: &mut CookieContext<'_>,
        record: &SessionRecord,
    ) -> SessionResult<()> {
        self.write(ctx, record)
    }

    async fn delete_session(&self, ctx: &mut CookieContext<'_>) -> SessionResult<()> {
        ctx.response
            .add(self.options.removal_cookie(&self.cookie_name));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use salvo_core::http::cookie::{Cookie, CookieJar};
    use serde_json::json;

    fn request_with(cookie: Option<Cookie<'static>>) -> CookieJar {
        let mut jar = CookieJar::new();
        if let Some(cookie) = cookie {
            jar.add_original(cookie);
        }
        jar
    }

    #[tokio::test]
    async fn test_cookie_store_round_trip() {
        let store = CookieStore::new("secret");
        let mut record = SessionRecord::new(Utc::now(), Some(Duration::hours(1)));
        record.attributes.insert("user".into(), json!("alice"));

        let request = request_with(None);
        let mut response = CookieJar::new();
        let mut ctx = CookieContext::new(&request, &mut response);
        store.create_session(&mut ctx, &record).await.unwrap();

        let written = response.get("session_data").unwrap().clone();
        assert!(written.max_age().is_some());

        let request = request_with(Some(written));
        let mut response = CookieJar::new();
        let ctx = CookieContext::new(&request, &mut response);
        assert_eq!(store.get_session(&ctx).await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn test_missing_cookie_is_absent() {
        let store = CookieStore::new("secret");
        let request = request_with(None);
        let mut response = CookieJar::new();
        let ctx = CookieContext::new(&request, &mut response);
        assert_eq!(store.get_session(&ctx).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_forged_cookie_is_absent() {
        let store = CookieStore::new("secret");
        let forged = CookieStore::new("attacker")
            .encode(&SessionRecord::new(Utc::now(), None))
            .unwrap();

        let request = request_with(Some(Cookie::new("session_data", forged)));
        let mut response = CookieJar::new();
        let ctx = CookieContext::new(&request, &mut response);
        assert_eq!(store.get_session(&ctx).await.unwrap(), None);

        let request = request_with(Some(Cookie::new("session_data", "garbage")));
        let mut response = CookieJar::new();
        let ctx = CookieContext::new(&request, &mut response);
        assert_eq!(store.get_session(&ctx).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_old_secret_still_accepted() {
        let record = SessionRecord::new(Utc::now(), None);
        let old = CookieStore::new("old").encode(&record).unwrap();
        let store = CookieStore::with_secrets(["new", "old"]);

        let request = request_with(Some(Cookie::new("session_data", old)));
        let mut response = CookieJar::new();
        let ctx = CookieContext::new(&request, &mut response);
        assert_eq!(store.get_session(&ctx).await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn test_delete_expires_cookie() {
        let store = CookieStore::new("secret").with_cookie_name("blob");
        let request = request_with(None);
        let mut response = CookieJar::new();
        let mut ctx = CookieContext::new(&request, &mut response);
        store.delete_session(&mut ctx).await.unwrap();

        let removal = response.get("blob").unwrap();
        assert_eq!(removal.value(), "");
        assert_eq!(
            removal.max_age(),
            Some(salvo_core::http::cookie::time::Duration::ZERO)
        );
    }

    #[tokio::test]
    async fn test_response_payload_preferred() {
        let store = CookieStore::new("secret");
        let stale = SessionRecord::new(Utc::now(), None);
        let request = request_with(Some(Cookie::new(
            "session_data",
            store.encode(&stale).unwrap(),
        )));

        let mut fresh = SessionRecord::new(Utc::now(), None);
        fresh.attributes.insert("user".into(), json!("bob"));
        let mut response = CookieJar::new();
        let mut ctx = CookieContext::new(&request, &mut response);
        store.persist_session_data(&mut ctx, &fresh).await.unwrap();
        assert_eq!(store.get_session(&ctx).await.unwrap(), Some(fresh));

        store.delete_session(&mut ctx).await.unwrap();
        assert_eq!(store.get_session(&ctx).await.unwrap(), None);
    }

    #[test]
    fn test_no_secret_is_an_error() {
        let store = CookieStore::with_secrets(Vec::<String>::new());
        assert!(store.encode(&SessionRecord::default()).is_err());
    }
}
