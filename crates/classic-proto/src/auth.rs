//! Name verification against the server salt.
//!
//! A directory service hands the client `md5(salt ‖ username)`; the client
//! presents it as the verification key in its identification packet.

use md5::{Digest, Md5};

/// Length of the hex-encoded digest.
pub const KEY_LENGTH: usize = 32;

/// Compute the verification key for `username` under `salt`.
pub fn verification_key(salt: &str, username: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(salt.as_bytes());
    hasher.update(username.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Check a client-supplied key. Hex case is not significant.
pub fn verify(salt: &str, username: &str, supplied_key: &str) -> bool {
    supplied_key.len() == KEY_LENGTH
        && verification_key(salt, username).eq_ignore_ascii_case(supplied_key)
}
