//! Error types for token verification.

/// Why a token (or signed cookie) was rejected.
///
/// Callers must not report these to clients individually. A service that
/// tells "bad signature" apart from "no cookie" hands an attacker an
/// oracle, so every variant is collapsed into "anonymous" before it
/// reaches a response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationFailure {
    /// The token has no `.` between the base and the signature.
    #[error("token has no signature separator")]
    MissingSeparator,

    /// The part before the separator is empty.
    #[error("token has an empty base")]
    EmptyBase,

    /// The recomputed signature does not match the supplied one.
    #[error("token signature mismatch")]
    SignatureMismatch,

    /// The cookie value is not valid percent-encoding or lacks the
    /// `s:` signed-value prefix.
    #[error("malformed signed cookie")]
    MalformedCookie,
}
