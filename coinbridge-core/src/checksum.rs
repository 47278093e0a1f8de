//! CRC32 order book checksums.
//!
//! Exchanges publish the CRC32 of a colon-joined level string, some as an
//! unsigned 32-bit value and some (Bitget, OKX) reinterpreted as a signed
//! 32-bit integer.

/// IEEE CRC32 of `payload`.
#[inline]
pub fn crc32(payload: &str) -> u32 {
    crc32fast::hash(payload.as_bytes())
}

/// [`crc32`] reinterpreted as two's-complement `i32`.
#[inline]
#[allow(clippy::cast_possible_wrap)]
pub fn crc32_signed(payload: &str) -> i32 {
    crc32(payload) as i32
}

/// Whether `expected` matches the payload in either signed or unsigned form.
pub fn verify(payload: &str, expected: i64) -> bool {
    let unsigned = crc32(payload);
    expected == i64::from(unsigned) || expected == i64::from(unsigned as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_known_vector() {
        // Standard check value for the ASCII digits.
        assert_eq!(crc32("123456789"), 0xCBF4_3926);
        assert_eq!(crc32_signed("123456789"), -873_187_034);
    }

    #[test]
    fn test_verify_accepts_both_forms() {
        assert!(verify("123456789", 3_421_780_262));
        assert!(verify("123456789", -873_187_034));
        assert!(!verify("123456789", 0));
    }

    proptest! {
        #[test]
        fn prop_signed_and_unsigned_agree(s in ".{0,64}") {
            let signed = crc32_signed(&s);
            prop_assert_eq!(signed as u32, crc32(&s));
            prop_assert!(verify(&s, i64::from(signed)));
            prop_assert!(verify(&s, i64::from(crc32(&s))));
        }
    }
}
