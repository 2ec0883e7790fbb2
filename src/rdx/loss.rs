//! Deterministic-seeded Bernoulli-trial loss injector, applied symmetrically
//! at sender and receiver (spec §4.2).

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

pub struct LossInjector {
    rate: f64,
    rng: SmallRng,
}

impl LossInjector {
    pub fn new(rate: f64) -> Self {
        LossInjector { rate, rng: SmallRng::from_entropy() }
    }

    pub fn with_seed(rate: f64, seed: u64) -> Self {
        LossInjector { rate, rng: SmallRng::seed_from_u64(seed) }
    }

    pub fn should_drop(&mut self) -> bool {
        if self.rate <= 0.0 {
            return false;
        }
        if self.rate >= 1.0 {
            return true;
        }
        self.rng.gen::<f64>() < self.rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_drops_at_zero() {
        let mut inj = LossInjector::with_seed(0.0, 1);
        for _ in 0..1000 {
            assert!(!inj.should_drop());
        }
    }

    #[test]
    fn always_drops_at_one() {
        let mut inj = LossInjector::with_seed(1.0, 1);
        for _ in 0..1000 {
            assert!(inj.should_drop());
        }
    }

    #[test]
    fn roughly_matches_configured_rate() {
        let mut inj = LossInjector::with_seed(0.3, 42);
        let drops = (0..10_000).filter(|_| inj.should_drop()).count();
        let frac = drops as f64 / 10_000.0;
        assert!((frac - 0.3).abs() < 0.03, "observed drop fraction {frac}");
    }
}
