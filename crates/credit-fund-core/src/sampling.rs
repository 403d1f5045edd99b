//! Random sources for the simulation.
//!
//! Every stochastic routine takes an explicit generator so that trials can be
//! seeded individually and executed on any thread.

use rand::distributions::WeightedIndex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use statrs::distribution::Normal;

use crate::error::CreditFundError;
use crate::CreditFundResult;

/// Build a generator from an optional seed (entropy when absent).
pub fn fund_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

/// Draw from N(0, `std_dev`). A non-positive standard deviation disables the
/// noise and returns exactly zero without consuming randomness.
pub fn gaussian_noise<R: Rng + ?Sized>(rng: &mut R, std_dev: f64) -> f64 {
    if std_dev.is_nan() || std_dev <= 0.0 {
        return 0.0;
    }
    match Normal::new(0.0, std_dev) {
        Ok(normal) => rng.sample(normal),
        Err(_) => 0.0,
    }
}

/// Multiply `value` by `1 + N(0, std_dev)`.
pub fn perturb<R: Rng + ?Sized>(rng: &mut R, value: f64, std_dev: f64) -> f64 {
    value * (1.0 + gaussian_noise(rng, std_dev))
}

/// Uniform draw on [0, 1).
pub fn uniform<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.gen::<f64>()
}

/// Weighted categorical sampler over a fixed set of outcomes.
#[derive(Debug, Clone)]
pub struct Categorical<T: Copy> {
    outcomes: Vec<T>,
    index: WeightedIndex<f64>,
}

impl<T: Copy> Categorical<T> {
    /// Build from `(outcome, weight)` pairs. Weights need not be normalised
    /// but must be non-negative with a positive total.
    pub fn new(weights: impl IntoIterator<Item = (T, f64)>) -> CreditFundResult<Self> {
        let (outcomes, raw): (Vec<T>, Vec<f64>) = weights.into_iter().unzip();
        let index = WeightedIndex::new(&raw).map_err(|e| CreditFundError::InvalidInput {
            field: "allocation".into(),
            reason: format!("Invalid allocation weights: {e}"),
        })?;
        Ok(Categorical { outcomes, index })
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> T {
        self.outcomes[rng.sample(&self.index)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_volatility_is_noise_free() {
        let mut rng = fund_rng(Some(1));
        for _ in 0..100 {
            assert_eq!(gaussian_noise(&mut rng, 0.0), 0.0);
        }
        assert_eq!(perturb(&mut rng, 42.0, 0.0), 42.0);
    }

    #[test]
    fn test_seeded_generators_agree() {
        let mut a = fund_rng(Some(99));
        let mut b = fund_rng(Some(99));
        for _ in 0..10 {
            assert_eq!(gaussian_noise(&mut a, 0.1), gaussian_noise(&mut b, 0.1));
        }
    }

    #[test]
    fn test_noise_statistics() {
        let mut rng = fund_rng(Some(7));
        let n = 20_000;
        let draws: Vec<f64> = (0..n).map(|_| gaussian_noise(&mut rng, 0.02)).collect();
        let mean = draws.iter().sum::<f64>() / n as f64;
        let var = draws.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        assert!(mean.abs() < 0.001, "mean={mean}");
        assert!((var.sqrt() - 0.02).abs() < 0.001, "sd={}", var.sqrt());
    }

    #[test]
    fn test_uniform_range() {
        let mut rng = fund_rng(Some(3));
        for _ in 0..1000 {
            let u = uniform(&mut rng);
            assert!((0.0..1.0).contains(&u));
        }
    }

    #[test]
    fn test_categorical_respects_zero_weight() {
        let cat = Categorical::new([("a", 0.0), ("b", 100.0)]).unwrap();
        let mut rng = fund_rng(Some(5));
        for _ in 0..500 {
            assert_eq!(cat.sample(&mut rng), "b");
        }
    }

    #[test]
    fn test_categorical_frequencies() {
        let cat = Categorical::new([(0u8, 60.0), (1u8, 30.0), (2u8, 10.0)]).unwrap();
        let mut rng = fund_rng(Some(11));
        let mut counts = [0usize; 3];
        for _ in 0..30_000 {
            counts[cat.sample(&mut rng) as usize] += 1;
        }
        let share = counts[0] as f64 / 30_000.0;
        assert!((share - 0.6).abs() < 0.02, "share={share}");
    }

    #[test]
    fn test_categorical_rejects_all_zero() {
        assert!(Categorical::new([(1, 0.0), (2, 0.0)]).is_err());
    }
}
