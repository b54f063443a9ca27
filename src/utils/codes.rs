// src/utils/codes.rs

use rand::Rng;

use crate::config::EXAM_CODE_LENGTH;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Random exam code of uppercase letters and digits.
///
/// Uniqueness is enforced by the store; callers retry on conflict.
pub fn exam_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..EXAM_CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn test_code_shape() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            let code = exam_code(&mut rng);
            assert_eq!(code.len(), EXAM_CODE_LENGTH);
            assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        }
    }
}
