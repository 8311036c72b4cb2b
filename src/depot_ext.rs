//! Extension trait for Depot to easily access sessions

use salvo_core::Depot;

use crate::session::Session;

pub(crate) const SESSION_KEY: &str = "salvo.sliding.session";
pub(crate) const ROTATE_KEY: &str = "salvo.sliding.session.rotate";

/// Extension trait for Salvo's Depot to provide easy session access
pub trait SessionDepotExt {
    /// Get a reference to the session
    fn session(&self) -> Option<&Session>;

    /// Get a mutable reference to the session
    fn session_mut(&mut self) -> Option<&mut Session>;

    /// Ask for a new session ID once the handler returns, keeping the data.
    /// Use after a privilege change such as a login.
    fn rotate_session_key(&mut self);

    /// Whether a rotation was requested during this request
    fn rotation_requested(&self) -> bool;
}

impl SessionDepotExt for Depot {
    fn session(&self) -> Option<&Session> {
        self.get::<Session>(SESSION_KEY).ok()
    }

    fn session_mut(&mut self) -> Option<&mut Session> {
        self.get_mut::<Session>(SESSION_KEY).ok()
    }

    fn rotate_session_key(&mut self) {
        self.insert(ROTATE_KEY, true);
    }

    fn rotation_requested(&self) -> bool {
        self.get::<bool>(ROTATE_KEY).map_or(false, |rotate| *rotate)
    }
}
