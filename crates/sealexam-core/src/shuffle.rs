//! Uniform random permutations.
//!
//! Every random decision the sampler makes goes through a [`Shuffler`], so a
//! seeded shuffler reproduces a selection exactly.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of permutations.
pub trait Shuffler {
    /// Return a permutation of `items`. The input is left untouched.
    fn shuffle<T: Clone>(&mut self, items: &[T]) -> Vec<T>;
}

/// Fisher–Yates shuffle driven by a seedable RNG.
#[derive(Debug, Clone)]
pub struct RandomShuffler {
    rng: StdRng,
}

impl RandomShuffler {
    /// A shuffler that produces the same permutations for the same seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// A shuffler seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Seeded when `seed` is given, entropy otherwise.
    pub fn with_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        }
    }
}

impl Default for RandomShuffler {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl Shuffler for RandomShuffler {
    fn shuffle<T: Clone>(&mut self, items: &[T]) -> Vec<T> {
        fisher_yates(items, &mut self.rng)
    }
}

/// Keeps the input order. Lets tests assert exact selections.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Shuffler for Identity {
    fn shuffle<T: Clone>(&mut self, items: &[T]) -> Vec<T> {
        items.to_vec()
    }
}

/// Copy `items` and permute the copy in place: for `i` from the last index
/// down to 1, swap `i` with a uniform `j` in `[0, i]`.
pub fn fisher_yates<T: Clone, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut out = items.to_vec();
    for i in (1..out.len()).rev() {
        let j = rng.random_range(0..=i);
        out.swap(i, j);
    }
    out
}
