//! Shuffle support for game boards.
//!
//! A small LCG is enough here: shuffles only randomize board layouts, nothing
//! security-relevant. The page passes `seed=Date.now()` when opening a game so
//! layouts differ between opens; tests reseed with fixed values.

use std::cell::RefCell;

/// Linear congruential generator (numerical-recipes constants).
#[derive(Debug, Clone)]
pub struct Lcg {
    state: u64,
}

impl Lcg {
    pub fn new(seed: u64) -> Self {
        // Avoid the all-zero fixed point.
        Self {
            state: seed ^ 0x9E37_79B9,
        }
    }

    fn next(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(1_664_525)
            .wrapping_add(1_013_904_223);
        self.state
    }

    /// Uniform-ish index in `0..len`. Returns 0 for an empty range.
    pub fn index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        (self.next() >> 16) as usize % len
    }
}

/// Fisher-Yates shuffle in place.
pub fn shuffle<T>(rng: &mut Lcg, items: &mut [T]) {
    for i in (1..items.len()).rev() {
        let j = rng.index(i + 1);
        items.swap(i, j);
    }
}

thread_local! {
    static RNG: RefCell<Lcg> = RefCell::new(Lcg::new(0x1A2B_3C4D));
}

/// Reseed the shared generator (from the `seed` query param on game open).
pub fn reseed(seed: u64) {
    RNG.with(|cell| *cell.borrow_mut() = Lcg::new(seed));
}

/// Run a closure with the shared generator.
pub fn with_rng<F, R>(f: F) -> R
where
    F: FnOnce(&mut Lcg) -> R,
{
    RNG.with(|cell| f(&mut cell.borrow_mut()))
}
