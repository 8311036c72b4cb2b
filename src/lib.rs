//! # salvo-sliding-session
//!
//! Server-side session middleware for the Salvo web framework.
//!
//! Every request gets a session: the ID travels in a cookie (or the
//! `Session-ID` header), the data lives in a pluggable store, and the engine
//! takes care of the lifecycle around your handler.
//!
//! ## Features
//!
//! - **Sliding expiration**: a valid session's expiry is pushed forward on every request
//! - **Write throttling**: the access timestamp is rewritten at most once per window
//! - **Flash data**: values that disappear after being read once
//! - **Key rotation**: swap the session ID after a privilege change, keeping the data
//! - **Pluggable storage backends**: Memory, Redis, signed cookies, or custom stores
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use salvo::prelude::*;
//! use salvo_sliding_session::{MemoryStore, SessionConfig, SessionDepotExt, SessionHandler};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = MemoryStore::new();
//!     let config = SessionConfig::new().with_expire_after(3600);
//!     let session_handler = SessionHandler::new(store, config);
//!
//!     let router = Router::new().hoop(session_handler).get(index);
//!
//!     let acceptor = TcpListener::new("127.0.0.1:5800").bind().await;
//!     Server::new(acceptor).serve(router).await;
//! }
//!
//! #[handler]
//! async fn index(depot: &mut Depot) -> String {
//!     let session = depot.session_mut().unwrap();
//!     let views: i32 = session.get("views").unwrap_or(0);
//!     session.set("views", views + 1).unwrap();
//!     format!("views: {}", views + 1)
//! }
//! ```

pub mod config;
pub mod cookie_signature;
pub mod depot_ext;
pub mod engine;
pub mod error;
pub mod handler;
pub mod record;
pub mod session;
pub mod session_id;
pub mod store;

pub use config::{CookieOptions, SameSite, SessionConfig};
pub use depot_ext::SessionDepotExt;
pub use engine::SessionEngine;
pub use error::{SessionError, SessionResult};
pub use handler::SessionHandler;
pub use record::{session_valid, SessionMetadata, SessionRecord};
pub use session::{Session, DEFAULT_ACCESS_THROTTLE};
pub use session_id::generate_session_id;
pub use store::{
    CookieCarriedStore, CookieContext, CookieStore, MemoryStore, SessionStore, StoreBackend,
};

#[cfg(feature = "redis-store")]
pub use store::RedisStore;
