//! Credentials: validated identifiers, redacted secrets, the shared token pair, and the token
//! endpoint grants that produce it.

pub mod credential;
pub mod grant;
pub mod id;
pub mod secret;

pub use credential::*;
pub use id::*;
pub use secret::*;
