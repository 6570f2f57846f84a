//! CSRF token issuance.
//!
//! Every rendered `<form>` carries a `__csrfID`/`__csrfToken` pair. How the
//! pair is later verified belongs to the application; this module only
//! hands them out.

use rand::RngCore;

use crate::hex_encode;

/// The length of a CSRF token in bytes (produces a 64-char hex string).
const CSRF_TOKEN_LENGTH: usize = 32;

/// The length of a CSRF identifier in bytes.
const CSRF_ID_LENGTH: usize = 16;

/// An issued CSRF identifier/token pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfToken {
    /// Identifies the token server-side (`__csrfID`).
    pub id: String,
    /// The secret value echoed back by the client (`__csrfToken`).
    pub token: String,
}

/// Issues CSRF token pairs for rendered forms.
pub trait CsrfIssuer: Send + Sync {
    /// Issues a fresh pair.
    fn issue(&self) -> CsrfToken;
}

/// Issues random hex token pairs from the thread RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomCsrfIssuer;

impl CsrfIssuer for RandomCsrfIssuer {
    fn issue(&self) -> CsrfToken {
        let mut rng = rand::thread_rng();
        let mut id = [0u8; CSRF_ID_LENGTH];
        let mut token = [0u8; CSRF_TOKEN_LENGTH];
        rng.fill_bytes(&mut id);
        rng.fill_bytes(&mut token);
        CsrfToken {
            id: hex_encode(&id),
            token: hex_encode(&token),
        }
    }
}
