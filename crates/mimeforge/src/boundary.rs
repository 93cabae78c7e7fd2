//! MIME boundary generation.
//!
//! Boundaries have the form `----=_NextPart_` followed by 25 random
//! characters from `[A-Za-z0-9._]`. They are not checked against the content
//! they delimit.

use rand::Rng;
use rand::rngs::ThreadRng;

/// Fixed boundary prefix.
pub const BOUNDARY_PREFIX: &str = "----=_NextPart_";

/// Number of random characters after the prefix.
pub const BOUNDARY_RANDOM_LEN: usize = 25;

/// Total boundary length.
pub const BOUNDARY_LEN: usize = BOUNDARY_PREFIX.len() + BOUNDARY_RANDOM_LEN;

/// Boundary generator over an injected random source.
#[derive(Debug, Clone)]
pub struct BoundaryGenerator<R = ThreadRng> {
    rng: R,
}

impl BoundaryGenerator<ThreadRng> {
    /// Creates a generator backed by the thread-local RNG.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }
}

impl Default for BoundaryGenerator<ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> BoundaryGenerator<R> {
    /// Creates a generator that draws from `rng`.
    #[must_use]
    pub const fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Generates a new boundary token.
    #[must_use]
    pub fn generate(&mut self) -> String {
        generate_boundary(&mut self.rng)
    }

    /// Consumes the generator, returning the random source.
    pub fn into_inner(self) -> R {
        self.rng
    }
}

/// Generates a boundary token from `rng`.
///
/// Each character is chosen by a draw in `0..100`: below 40 an uppercase
/// letter, below 70 a lowercase letter, below 90 a digit, below 95 a `.`,
/// otherwise `_`.
pub fn generate_boundary<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut boundary = String::with_capacity(BOUNDARY_LEN);
    boundary.push_str(BOUNDARY_PREFIX);
    for _ in 0..BOUNDARY_RANDOM_LEN {
        boundary.push(glyph(rng));
    }
    boundary
}

fn glyph<R: Rng + ?Sized>(rng: &mut R) -> char {
    match rng.gen_range(0..100u8) {
        0..40 => char::from(b'A' + rng.gen_range(0..26u8)),
        40..70 => char::from(b'a' + rng.gen_range(0..26u8)),
        70..90 => char::from(b'0' + rng.gen_range(0..10u8)),
        90..95 => '.',
        _ => '_',
    }
}

/// Returns true if `s` has the shape of a generated boundary.
#[must_use]
pub fn is_valid_boundary(s: &str) -> bool {
    s.len() == BOUNDARY_LEN
        && s.strip_prefix(BOUNDARY_PREFIX).is_some_and(|rest| {
            rest.bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'_')
        })
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand::rngs::mock::StepRng;

    #[test]
    fn test_boundary_shape() {
        let mut generator = BoundaryGenerator::new();
        for _ in 0..50 {
            let boundary = generator.generate();
            assert_eq!(boundary.len(), BOUNDARY_LEN);
            assert!(boundary.starts_with(BOUNDARY_PREFIX));
            assert!(is_valid_boundary(&boundary), "bad boundary {boundary}");
        }
    }

    #[test]
    fn test_boundary_len_is_forty() {
        assert_eq!(BOUNDARY_LEN, 40);
    }

    #[test]
    fn test_stub_rng_gives_exact_boundary() {
        // A zero stream always lands in the uppercase band and picks 'A'.
        let mut generator = BoundaryGenerator::with_rng(StepRng::new(0, 0));
        assert_eq!(
            generator.generate(),
            format!("{BOUNDARY_PREFIX}{}", "A".repeat(BOUNDARY_RANDOM_LEN))
        );
    }

    #[test]
    fn test_seeded_rng_is_deterministic() {
        let mut a = BoundaryGenerator::with_rng(StdRng::seed_from_u64(7));
        let mut b = BoundaryGenerator::with_rng(StdRng::seed_from_u64(7));
        assert_eq!(a.generate(), b.generate());
        assert_eq!(a.generate(), b.generate());
    }

    #[test]
    fn test_into_inner_resumes_stream() {
        let mut continuous = BoundaryGenerator::with_rng(StdRng::seed_from_u64(11));
        let mut first = BoundaryGenerator::with_rng(StdRng::seed_from_u64(11));
        assert_eq!(first.generate(), continuous.generate());

        let mut resumed = BoundaryGenerator::with_rng(first.into_inner());
        assert_eq!(resumed.generate(), continuous.generate());
    }

    #[test]
    fn test_successive_boundaries_differ() {
        let mut generator = BoundaryGenerator::with_rng(StdRng::seed_from_u64(42));
        let first = generator.generate();
        let second = generator.generate();
        assert_ne!(first, second);
    }

    #[test]
    fn test_all_glyph_classes_appear() {
        let mut rng = StdRng::seed_from_u64(1);
        let sample: String = (0..2000).map(|_| glyph(&mut rng)).collect();
        assert!(sample.bytes().any(|b| b.is_ascii_uppercase()));
        assert!(sample.bytes().any(|b| b.is_ascii_lowercase()));
        assert!(sample.bytes().any(|b| b.is_ascii_digit()));
        assert!(sample.contains('.'));
        assert!(sample.contains('_'));
        assert!(sample.contains('Z'));
    }

    #[test]
    fn test_is_valid_boundary_rejects() {
        assert!(!is_valid_boundary("----=_NextPart_short"));
        assert!(!is_valid_boundary(&format!("----=_NextPart_{}", "-".repeat(25))));
        assert!(!is_valid_boundary(&format!("====_NextPart_{}", "a".repeat(26))));
    }

    proptest! {
        #[test]
        fn prop_boundary_alphabet(seed in any::<u64>()) {
            let mut generator = BoundaryGenerator::with_rng(StdRng::seed_from_u64(seed));
            let boundary = generator.generate();
            prop_assert!(is_valid_boundary(&boundary));
        }
    }
}
