//! External auth boundary.
//!
//! The gate never issues or validates sessions itself; it asks the auth
//! service through [`SessionResolver`] and only reads the returned user.

pub mod better_auth;
pub mod session;

pub use better_auth::BetterAuthResolver;
pub use session::{AdminIdentity, AuthError, Session, SessionResolver, SessionUser};
