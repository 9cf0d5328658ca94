//! Property tests for the signer/verifier pair.
//!
//! Session ids are drawn from the URL-safe base64 alphabet that
//! `tessera-session` generates ids from, plus `.` so ids with dots are
//! exercised too. Secrets are arbitrary printable strings.

use proptest::prelude::*;
use tessera_token::{
    decode_cookie_value, encode_cookie_value, sign, verify,
    VerificationFailure,
};

fn session_id() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_.-]{1,48}".prop_filter("base must not end up empty", |s| {
        !s.starts_with('.')
    })
}

fn secret() -> impl Strategy<Value = String> {
    "[ -~]{1,64}"
}

proptest! {
    #[test]
    fn test_verify_sign_round_trip(s in session_id(), k in secret()) {
        prop_assert_eq!(verify(&sign(&s, &k), &k), Ok(s));
    }

    #[test]
    fn test_verify_any_single_char_mutation_rejected(
        s in session_id(),
        k in secret(),
        index in any::<prop::sample::Index>(),
        replacement in proptest::char::range('!', '~'),
    ) {
        let token = sign(&s, &k);
        let mut chars: Vec<char> = token.chars().collect();
        let at = index.index(chars.len());
        prop_assume!(chars[at] != replacement);
        chars[at] = replacement;
        let mutated: String = chars.into_iter().collect();

        prop_assert!(verify(&mutated, &k).is_err());
    }

    #[test]
    fn test_verify_other_secret_rejected(
        s in session_id(),
        k1 in secret(),
        k2 in secret(),
    ) {
        prop_assume!(k1 != k2);
        prop_assert_eq!(
            verify(&sign(&s, &k1), &k2),
            Err(VerificationFailure::SignatureMismatch)
        );
    }

    #[test]
    fn test_sign_is_deterministic(s in ".{0,48}", k in secret()) {
        prop_assert_eq!(sign(&s, &k), sign(&s, &k));
    }

    #[test]
    fn test_cookie_value_round_trip(s in session_id(), k in secret()) {
        let value = encode_cookie_value(&s, &k);
        prop_assert_eq!(decode_cookie_value(&value, &k), Ok(s));
    }
}
