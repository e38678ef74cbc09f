use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;

use crate::types::User;

pub const SESSION_COOKIE: &str = "bursar_session";

const SESSION_ID_LENGTH: usize = 48;
const SESSION_TTL_HOURS: i64 = 24;

/// Server-side session state referenced by an opaque cookie value.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub is_admin: bool,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

/// In-process session store. Expiry is a fixed 24-hour window from creation,
/// never renewed on activity. Restarting the process drops all sessions.
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, user: &User) -> Session {
        let session = Session {
            id: generate_session_id(),
            user_id: user.id.clone(),
            username: user.username.clone(),
            is_admin: user.is_admin,
            expires_at: Utc::now() + Duration::hours(SESSION_TTL_HOURS),
        };
        self.insert(session.clone());
        session
    }

    pub fn get(&self, id: &str) -> Option<Session> {
        let mut sessions = self.lock();
        match sessions.get(id) {
            Some(session) if session.is_expired() => {
                sessions.remove(id);
                None
            }
            Some(session) => Some(session.clone()),
            None => None,
        }
    }

    pub fn destroy(&self, id: &str) -> bool {
        self.lock().remove(id).is_some()
    }

    /// Drops every live session belonging to a user. Used when an admin
    /// deletes an account so its cookies stop working immediately.
    pub fn destroy_user_sessions(&self, user_id: &str) {
        self.lock().retain(|_, s| s.user_id != user_id);
    }

    fn insert(&self, session: Session) {
        self.lock().insert(session.id.clone(), session);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Session>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn generate_session_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_ID_LENGTH)
        .map(char::from)
        .collect()
}

/// Builds the Set-Cookie value that establishes a session.
#[must_use]
pub fn session_cookie(session_id: &str) -> String {
    let max_age = SESSION_TTL_HOURS * 3600;
    format!("{SESSION_COOKIE}={session_id}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}")
}

/// Builds the Set-Cookie value that removes the session cookie.
#[must_use]
pub fn clear_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Extracts this server's session id from a Cookie header value.
#[must_use]
pub fn session_id_from_cookie_header(header: &str) -> Option<String> {
    header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE && !value.is_empty()).then(|| value.to_string())
    })
}
