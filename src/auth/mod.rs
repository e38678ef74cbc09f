mod middleware;
mod password;
mod session;

pub use middleware::{AuthError, MaybeAuth, RequireAdmin, RequireAuth};
pub use password::CredentialHasher;
pub use session::{SESSION_COOKIE, Session, SessionStore, clear_cookie, session_cookie};
