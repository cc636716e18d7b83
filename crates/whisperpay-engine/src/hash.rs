// SPDX-FileCopyrightText: 2026 Whisperpay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyed transaction hash ("ver3" scheme).
//!
//! Canonicalizes a parameter set and produces a base64-encoded SHA-512
//! digest keyed with the merchant store key. The same canonicalization
//! produces the outbound signature at initiation and recomputes the expected
//! signature for callback verification; the two call sites differ only in
//! their exclusion set. Pure functions, no I/O.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use sha2::{Digest, Sha512};

/// Parameters excluded when signing the outbound gateway form.
pub const SIGN_EXCLUDED: &[&str] = &["encoding", "hash"];

/// Parameters excluded when verifying an inbound callback. The gateway adds
/// a `countdown` field that is not part of its own signature.
pub const VERIFY_EXCLUDED: &[&str] = &["encoding", "hash", "countdown"];

/// Compute the keyed digest over a parameter set.
///
/// Keys in `excluded` are dropped (case-insensitively); the rest are sorted
/// case-insensitively, their values escaped (`\` doubled first, then `|`
/// escaped), joined with `|`, and suffixed with `|` plus the store key. The
/// digest is SHA-512 over the UTF-8 bytes, base64 encoded. Independent of
/// parameter insertion order.
pub fn digest<'a, I>(params: I, store_key: &str, excluded: &[&str]) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut entries: Vec<(String, &str, &str)> = params
        .into_iter()
        .filter(|(key, _)| !excluded.iter().any(|ex| ex.eq_ignore_ascii_case(key)))
        .map(|(key, value)| (key.to_lowercase(), key, value))
        .collect();
    entries.sort();

    let mut plaintext = String::new();
    for (i, (_, _, value)) in entries.iter().enumerate() {
        if i > 0 {
            plaintext.push('|');
        }
        plaintext.push_str(&escape(value));
    }
    plaintext.push('|');
    plaintext.push_str(store_key);

    BASE64.encode(Sha512::digest(plaintext.as_bytes()))
}

/// Sign an outbound parameter set.
pub fn sign<'a, I>(params: I, store_key: &str) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    digest(params, store_key, SIGN_EXCLUDED)
}

/// Verify an inbound callback signature against the recomputed digest.
pub fn verify<'a, I>(params: I, store_key: &str, supplied: &str) -> bool
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    !supplied.is_empty() && digest(params, store_key, VERIFY_EXCLUDED) == supplied
}

/// Escape a parameter value: double backslashes first, then escape pipes.
fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('|', "\\|")
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "TEST1234";

    fn base_params() -> Vec<(&'static str, &'static str)> {
        vec![
            ("clientid", "100100000"),
            ("oid", "BOOST-c0ffee00-1714600000000"),
            ("amount", "49.99"),
            ("rnd", "a1b2c3d4e5"),
        ]
    }

    #[test]
    fn signing_is_deterministic_and_order_independent() {
        let forward = sign(base_params(), KEY);
        let again = sign(base_params(), KEY);
        assert_eq!(forward, again);

        let mut reversed = base_params();
        reversed.reverse();
        assert_eq!(sign(reversed, KEY), forward);
    }

    #[test]
    fn changing_any_value_changes_the_digest() {
        let baseline = sign(base_params(), KEY);
        for i in 0..base_params().len() {
            let mut tampered = base_params();
            tampered[i].1 = "tampered";
            assert_ne!(sign(tampered, KEY), baseline, "parameter {i} did not affect digest");
        }
    }

    #[test]
    fn changing_the_key_changes_the_digest() {
        assert_ne!(sign(base_params(), KEY), sign(base_params(), "OTHERKEY"));
    }

    #[test]
    fn excluded_parameters_do_not_affect_the_digest() {
        let baseline = sign(base_params(), KEY);
        let mut with_excluded = base_params();
        with_excluded.push(("encoding", "UTF-8"));
        with_excluded.push(("HASH", "bogus"));
        assert_eq!(sign(with_excluded, KEY), baseline);
    }

    #[test]
    fn countdown_is_excluded_only_for_verification() {
        let mut params = base_params();
        params.push(("countdown", "5"));
        let supplied = digest(base_params(), KEY, VERIFY_EXCLUDED);
        assert!(verify(params.clone(), KEY, &supplied));
        // The same parameter does participate in the signing digest.
        assert_ne!(sign(params, KEY), sign(base_params(), KEY));
    }

    #[test]
    fn keys_sort_case_insensitively() {
        let lower = vec![("amount", "1.00"), ("oid", "X-1")];
        let mixed = vec![("Amount", "1.00"), ("OID", "X-1")];
        assert_eq!(sign(lower, KEY), sign(mixed, KEY));
    }

    #[test]
    fn pipe_and_backslash_values_are_escaped() {
        let plain = vec![("a", "left"), ("b", "right")];
        // Without escaping, "left|x" in one value could collide with a
        // shifted split of the same joined plaintext.
        let shifted = vec![("a", "left|right"), ("b", "")];
        assert_ne!(sign(plain.clone(), KEY), sign(shifted, KEY));

        let backslash = vec![("a", "left\\"), ("b", "|right")];
        assert_ne!(sign(plain, KEY), sign(backslash, KEY));
    }

    #[test]
    fn verify_rejects_empty_and_wrong_signatures() {
        let supplied = digest(base_params(), KEY, VERIFY_EXCLUDED);
        assert!(verify(base_params(), KEY, &supplied));
        assert!(!verify(base_params(), KEY, ""));
        assert!(!verify(base_params(), KEY, "AAAA"));
        assert!(!verify(base_params(), "WRONGKEY", &supplied));
    }
}
