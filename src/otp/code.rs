//! One-time code generation and comparison.

use anyhow::{Context, Result};
use rand::{RngCore, rngs::OsRng};
use subtle::ConstantTimeEq;

/// Number of digits in a one-time code.
pub const CODE_LEN: usize = 6;

/// Generate a 6-digit one-time code.
///
/// Each digit is drawn uniformly from 0-9 via rejection sampling, so
/// leading zeros are as likely as any other digit.
///
/// # Errors
///
/// Returns an error if the operating system random source fails.
pub fn generate_code() -> Result<String> {
    let mut digits = String::with_capacity(CODE_LEN);
    let mut buf = [0u8; 16];
    while digits.len() < CODE_LEN {
        OsRng
            .try_fill_bytes(&mut buf)
            .context("failed to read from the OS random source")?;
        for byte in buf {
            // Bytes 250..=255 would bias the modulo; skip them.
            if byte < 250 {
                digits.push(char::from(b'0' + byte % 10));
                if digits.len() == CODE_LEN {
                    break;
                }
            }
        }
    }
    Ok(digits)
}

/// Constant-time equality for supplied vs stored codes.
///
/// Length differences short-circuit, which is fine: the code length is
/// public knowledge, only the digits are secret.
#[must_use]
pub fn codes_match(supplied: &str, stored: &str) -> bool {
    supplied.as_bytes().ct_eq(stored.as_bytes()).into()
}
