//! Credential models: redacted secrets, the access/refresh pair, and JWT expiry claims.

pub mod claims;
pub mod pair;
pub mod secret;

pub use claims::*;
pub use pair::*;
pub use secret::*;
