//! Session store implementations

mod cookie;
mod memory;
mod traits;

pub use cookie::CookieStore;
pub use memory::MemoryStore;
pub use traits::{CookieCarriedStore, CookieContext, SessionStore, StoreBackend};

#[cfg(feature = "redis-store")]
mod redis_store;

#[cfg(feature = "redis-store")]
pub use redis_store::RedisStore;
