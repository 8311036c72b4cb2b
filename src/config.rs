//! Session configuration

use salvo_core::http::cookie::{time, Cookie};
use std::time::Duration;

use crate::session::DEFAULT_ACCESS_THROTTLE;

/// Configuration for the session middleware
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Name of the cookie carrying the session ID (default: "session")
    pub cookie_name: String,

    /// Request header consulted when the cookie is absent (default: "Session-ID")
    pub header_name: String,

    /// Whether incoming cookie values are percent-decoded (default: true)
    pub decode_cookie: bool,

    /// Session lifetime in seconds, renewed on every valid request
    /// (default: None = sessions never expire)
    pub expire_after: Option<u64>,

    /// Minimum interval between two rewrites of the access timestamp (default: 5 minutes)
    pub access_throttle: Duration,

    /// Attributes of the outgoing session cookie
    pub cookie: CookieOptions,
}

/// Attributes applied to outgoing cookies
#[derive(Clone, Debug)]
pub struct CookieOptions {
    /// Cookie path (default: "/")
    pub path: String,

    /// Cookie domain (default: None - current domain only)
    pub domain: Option<String>,

    /// HttpOnly flag for cookie (default: true)
    pub http_only: bool,

    /// Secure flag for cookie (default: false)
    pub secure: bool,

    /// SameSite attribute for cookie
    pub same_site: SameSite,

    /// Max age in seconds (default: None = browser session cookie)
    pub max_age: Option<u64>,
}

/// SameSite cookie attribute
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SameSite {
    /// Strict - cookie only sent for same-site requests
    Strict,
    /// Lax - cookie sent for same-site requests and top-level navigations
    Lax,
    /// None - cookie sent for all requests (requires Secure)
    None,
}

impl From<SameSite> for salvo_core::http::cookie::SameSite {
    fn from(same_site: SameSite) -> Self {
        match same_site {
            SameSite::Strict => Self::Strict,
            SameSite::Lax => Self::Lax,
            SameSite::None => Self::None,
        }
    }
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            domain: None,
            http_only: true,
            secure: false,
            same_site: SameSite::Lax,
            max_age: None,
        }
    }
}

impl CookieOptions {
    /// Set the cookie path (default: "/")
    pub fn with_path<S: Into<String>>(mut self, path: S) -> Self {
        self.path = path.into();
        self
    }

    /// Set the cookie domain
    pub fn with_domain<S: Into<String>>(mut self, domain: S) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Set the HttpOnly flag (default: true)
    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    /// Set the Secure flag (default: false)
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Set the SameSite attribute (default: Lax)
    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = same_site;
        self
    }

    /// Set max age in seconds
    /// Pass None for a session cookie (expires when browser closes)
    pub fn with_max_age(mut self, max_age: impl Into<Option<u64>>) -> Self {
        self.max_age = max_age.into();
        self
    }

    /// Build a cookie carrying these attributes.
    ///
    /// `max_age` overrides the configured max age when given.
    pub fn build_cookie(&self, name: &str, value: String, max_age: Option<u64>) -> Cookie<'static> {
        let mut builder = Cookie::build((name.to_string(), value))
            .path(self.path.clone())
            .http_only(self.http_only)
            .secure(self.secure)
            .same_site(self.same_site.into());

        if let Some(domain) = &self.domain {
            builder = builder.domain(domain.clone());
        }
        if let Some(secs) = max_age.or(self.max_age) {
            let secs = i64::try_from(secs).unwrap_or(i64::MAX);
            builder = builder.max_age(time::Duration::seconds(secs));
        }

        builder.build()
    }

    /// Build an empty, already expired cookie that makes the client drop `name`
    pub fn removal_cookie(&self, name: &str) -> Cookie<'static> {
        let mut builder = Cookie::build((name.to_string(), String::new()))
            .path(self.path.clone())
            .max_age(time::Duration::ZERO);

        if let Some(domain) = &self.domain {
            builder = builder.domain(domain.clone());
        }

        builder.build()
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "session".to_string(),
            header_name: "Session-ID".to_string(),
            decode_cookie: true,
            expire_after: None,
            access_throttle: DEFAULT_ACCESS_THROTTLE,
            cookie: CookieOptions::default(),
        }
    }
}

impl SessionConfig {
    /// Create a configuration with the defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cookie name (default: "session")
    pub fn with_cookie_name<S: Into<String>>(mut self, name: S) -> Self {
        self.cookie_name = name.into();
        self
    }

    /// Set the fallback header name (default: "Session-ID")
    pub fn with_header_name<S: Into<String>>(mut self, name: S) -> Self {
        self.header_name = name.into();
        self
    }

    /// Set whether incoming cookie values are percent-decoded (default: true)
    pub fn with_decode_cookie(mut self, decode: bool) -> Self {
        self.decode_cookie = decode;
        self
    }

    /// Set the sliding session lifetime in seconds
    /// Pass None for sessions that never expire
    pub fn with_expire_after(mut self, seconds: impl Into<Option<u64>>) -> Self {
        self.expire_after = seconds.into();
        self
    }

    /// Set the sliding session lifetime from Duration
    pub fn with_expire_after_duration(mut self, duration: impl Into<Option<Duration>>) -> Self {
        self.expire_after = duration.into().map(|d| d.as_secs());
        self
    }

    /// Set the access-time throttle window (default: 5 minutes)
    pub fn with_access_throttle(mut self, throttle: Duration) -> Self {
        self.access_throttle = throttle;
        self
    }

    /// Set the outgoing cookie attributes
    pub fn with_cookie_options(mut self, options: CookieOptions) -> Self {
        self.cookie = options;
        self
    }

    /// Session lifetime as a chrono duration
    pub fn ttl(&self) -> Option<chrono::Duration> {
        self.expire_after
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(chrono::Duration::try_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.cookie_name, "session");
        assert_eq!(config.header_name, "Session-ID");
        assert_eq!(config.expire_after, None);
        assert_eq!(config.ttl(), None);
        assert_eq!(config.access_throttle, Duration::from_secs(300));
        assert_eq!(config.cookie.path, "/");
        assert!(config.cookie.http_only);
    }

    #[test]
    fn test_builder() {
        let config = SessionConfig::new()
            .with_cookie_name("sid")
            .with_expire_after_duration(Duration::from_secs(3600))
            .with_cookie_options(CookieOptions::default().with_secure(true).with_max_age(60));
        assert_eq!(config.cookie_name, "sid");
        assert_eq!(config.ttl(), Some(chrono::Duration::seconds(3600)));
        assert!(config.cookie.secure);
        assert_eq!(config.cookie.max_age, Some(60));
    }

    #[test]
    fn test_build_cookie() {
        let options = CookieOptions::default()
            .with_domain("example.com")
            .with_same_site(SameSite::Strict)
            .with_max_age(120);

        let cookie = options.build_cookie("session", "abc".to_string(), None);
        assert_eq!(cookie.name(), "session");
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.domain(), Some("example.com"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(120)));

        let cookie = options.build_cookie("session", "abc".to_string(), Some(5));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(5)));

        let removal = options.removal_cookie("session");
        assert_eq!(removal.value(), "");
        assert_eq!(removal.max_age(), Some(time::Duration::ZERO));
    }
}
