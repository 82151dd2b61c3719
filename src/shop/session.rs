// Anonymous session identity
// Maps an opaque cookie token to an opaque user id, minted on first contact

use tracing::debug;
use uuid::Uuid;

use super::models::Session;
use crate::store::SessionMap;

/// Result of resolving a presented cookie
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub session: Session,

    /// True when a new session was minted and a cookie must be set
    pub created: bool,
}

/// Session id -> user id mapping. Sessions never expire.
#[derive(Clone)]
pub struct SessionStore {
    sessions: SessionMap,
}

impl SessionStore {
    pub fn new(sessions: SessionMap) -> Self {
        Self { sessions }
    }

    /// Resolve the presented session id, minting a new session when it is absent or unknown.
    ///
    /// Two concurrent requests without a cookie each get their own session; that race is
    /// harmless since neither cookie has been handed out yet.
    pub fn ensure_session(&self, presented: Option<&str>) -> SessionOutcome {
        if let Some(session_id) = presented.filter(|id| !id.is_empty()) {
            if let Some(user_id) = self.sessions.get(&session_id.to_string()) {
                return SessionOutcome {
                    session: Session {
                        session_id: session_id.to_string(),
                        user_id,
                    },
                    created: false,
                };
            }
            debug!("Presented session is unknown, minting a new one");
        }

        let session = Session {
            session_id: generate_token(),
            user_id: generate_token(),
        };
        self.sessions
            .set(session.session_id.clone(), session.user_id.clone());

        debug!(session_id = %session.session_id, "Session created");

        SessionOutcome {
            session,
            created: true,
        }
    }

    /// Look up the user bound to a session
    pub fn user_id(&self, session_id: &str) -> Option<String> {
        self.sessions.get(&session_id.to_string())
    }

    pub fn count(&self) -> usize {
        self.sessions.len()
    }
}

/// 128 random bits as 32 lowercase hex characters
pub fn generate_token() -> String {
    Uuid::new_v4().simple().to_string()
}
