//! # formbuilder-session
//!
//! Everything that crosses the render → submit boundary. A rendered form is
//! snapshotted into a [`SessionStore`] under an unguessable identifier; the
//! later POST is parsed into a [`Submission`] that carries that identifier
//! back, along with the posted field values.
//!
//! ## Modules
//!
//! - [`store`] - The async TTL session store and identifier generation
//! - [`csrf`] - CSRF token issuance for rendered forms
//! - [`submission`] - Bracket-notation parsing of posted form data

pub mod csrf;
pub mod store;
pub mod submission;

pub use csrf::{CsrfIssuer, CsrfToken, RandomCsrfIssuer};
pub use store::{new_session_id, InMemorySessionStore, SessionStore};
pub use submission::{PostedValue, Submission};

/// Encodes bytes as a lowercase hex string.
pub fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    bytes
        .iter()
        .fold(String::with_capacity(bytes.len() * 2), |mut s, b| {
            let _ = write!(s, "{b:02x}");
            s
        })
}
