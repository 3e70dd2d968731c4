//! Credential decoding for Pulseboard.
//!
//! The credential service hands the client an opaque, JWT-shaped token:
//! three base64url segments separated by dots. The client never verifies
//! the signature (that is the server's job). It only peeks at the payload
//! to learn when the token expires, so it can stop using it.
//!
//! - **Claims** ([`Claims`]) — the decoded payload fields we care about.
//! - **Codec** ([`TokenCodec`]) — splitting, decoding, and expiry checks.
//! - **Errors** ([`TokenError`]) — why a credential could not be read.
//!
//! ```text
//! SessionManager / TokenValidator → TokenCodec (this crate) → Claims
//! ```

mod claims;
mod codec;
mod error;

pub use claims::Claims;
pub use codec::{TokenCodec, now_millis};
pub use error::TokenError;
