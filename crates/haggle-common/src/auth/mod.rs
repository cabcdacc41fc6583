//! Authentication hook
//!
//! Identity is owned by an external system; the gateway only needs to turn a
//! bearer token into a user id.

mod jwt;

pub use jwt::{AuthError, Authenticator, Claims, JwtAuthenticator};
