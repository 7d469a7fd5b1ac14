//! Simulated RFID reader.
//!
//! There is no hardware: a "scan" produces a random tag code of the form
//! `{prefix}-XXXXXXXX` (8 uppercase hex digits).

use rand::Rng;

const CODE_DIGITS: usize = 8;

pub struct RfidScanner;

impl RfidScanner {
    /// Generate a tag code using the thread-local RNG.
    pub fn generate_code(prefix: &str) -> String {
        Self::generate_code_with(&mut rand::thread_rng(), prefix)
    }

    /// Generate a tag code from the given RNG.
    pub fn generate_code_with<R: Rng + ?Sized>(rng: &mut R, prefix: &str) -> String {
        let n: u32 = rng.gen();
        format!("{}-{:08X}", prefix, n)
    }

    /// Whether `code` looks like a tag produced with `prefix`.
    pub fn is_valid(code: &str, prefix: &str) -> bool {
        match code.strip_prefix(prefix).and_then(|rest| rest.strip_prefix('-')) {
            Some(hex) => {
                hex.len() == CODE_DIGITS
                    && hex.chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
            }
            None => false,
        }
    }

    /// Canonical form of a hand-typed code: trimmed, uppercase.
    pub fn normalize(code: &str) -> String {
        code.trim().to_uppercase()
    }
}
