//! Identity primitives: claims normalization, session tokens, credential digests.

pub mod claims;
pub mod password;
pub mod session;

pub use claims::{Claims, DecodedClaims, SessionClaims};
pub use session::SessionIssuer;
