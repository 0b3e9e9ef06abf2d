//! Skewed key streams

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seeded stream of keys in `[0, universe)` following a Zipfian distribution
#[derive(Debug, Clone)]
pub struct KeyStream {
    rng: StdRng,
    zipf: Zipfian,
}

impl KeyStream {
    /// `skew` of 0.0 gives uniform keys; values near 1.0 are highly skewed
    pub fn new(universe: u64, skew: f64, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            zipf: Zipfian::new(universe.max(1), skew),
        }
    }

    pub fn next_key(&mut self) -> u64 {
        let u: f64 = self.rng.random();
        self.zipf.sample(u)
    }
}

/// YCSB-style Zipfian sampler with precomputed zeta constants
#[derive(Debug, Clone)]
struct Zipfian {
    n: u64,
    theta: f64,
    zeta_n: f64,
    alpha: f64,
    eta: f64,
}

impl Zipfian {
    fn new(n: u64, theta: f64) -> Self {
        // theta == 1 divides by zero in alpha
        let theta = theta.clamp(0.0, 0.9999);
        let zeta_2 = zeta(2, theta);
        let zeta_n = zeta(n, theta);
        let alpha = 1.0 / (1.0 - theta);
        let eta = (1.0 - (2.0 / n as f64).powf(1.0 - theta)) / (1.0 - zeta_2 / zeta_n);

        Self {
            n,
            theta,
            zeta_n,
            alpha,
            eta,
        }
    }

    /// Map uniform `u` in `[0, 1)` to a rank
    fn sample(&self, u: f64) -> u64 {
        let uz = u * self.zeta_n;
        if uz < 1.0 {
            return 0;
        }
        if uz < 1.0 + 0.5_f64.powf(self.theta) {
            return 1.min(self.n - 1);
        }
        let spread = (self.n as f64) * (self.eta * u - self.eta + 1.0).powf(self.alpha);
        (spread as u64).min(self.n - 1)
    }
}

fn zeta(n: u64, theta: f64) -> f64 {
    (1..=n).map(|i| 1.0 / (i as f64).powf(theta)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_within_universe() {
        let mut stream = KeyStream::new(50, 0.99, 7);
        for _ in 0..10_000 {
            assert!(stream.next_key() < 50);
        }
    }

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = KeyStream::new(1_000, 0.8, 42);
        let mut b = KeyStream::new(1_000, 0.8, 42);
        for _ in 0..100 {
            assert_eq!(a.next_key(), b.next_key());
        }
    }

    #[test]
    fn test_skew_favours_low_ranks() {
        let mut stream = KeyStream::new(1_000, 0.99, 3);
        let hot = (0..10_000).filter(|_| stream.next_key() < 10).count();
        // Under uniform keys this would be about 100
        assert!(hot > 1_000, "only {} hits on the hottest 1% of keys", hot);
    }

    #[test]
    fn test_single_key_universe() {
        let mut stream = KeyStream::new(1, 0.5, 1);
        for _ in 0..100 {
            assert_eq!(stream.next_key(), 0);
        }
    }
}
