//! The random source shared by every strategy within one call.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Random generator passed explicitly through every scramble operation.
///
/// All draws of one call come from a single stream, in a fixed order, so a
/// fixed seed gives byte-identical output.
pub type ScrambleRng = ChaCha8Rng;

/// Build the random source for a call: seeded when `seed` is given,
/// otherwise from operating system entropy.
pub fn scramble_rng(seed: Option<u64>) -> ScrambleRng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_os_rng(),
    }
}

/// Uniform random permutation of `0..len`.
pub fn permutation<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..len).collect();
    indices.shuffle(rng);
    indices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_rng_is_deterministic() {
        let mut rng_1 = scramble_rng(Some(42));
        let mut rng_2 = scramble_rng(Some(42));
        let stream_1: Vec<u64> = (0..16).map(|_| rng_1.random()).collect();
        let stream_2: Vec<u64> = (0..16).map(|_| rng_2.random()).collect();
        assert_eq!(stream_1, stream_2);

        let mut rng_3 = scramble_rng(Some(43));
        let stream_3: Vec<u64> = (0..16).map(|_| rng_3.random()).collect();
        assert_ne!(stream_1, stream_3);
    }

    #[test]
    fn test_permutation_is_complete() {
        let mut rng = scramble_rng(Some(7));
        let mut perm = permutation(100, &mut rng);
        perm.sort_unstable();
        assert_eq!(perm, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_permutation_of_nothing() {
        let mut rng = scramble_rng(Some(7));
        assert!(permutation(0, &mut rng).is_empty());
        assert_eq!(permutation(1, &mut rng), vec![0]);
    }
}
