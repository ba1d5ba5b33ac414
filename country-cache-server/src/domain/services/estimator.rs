//! Synthetic GDP estimation.
//!
//! The estimate is a placeholder indicator: population scaled by a random
//! multiplier and divided by the exchange rate. It is non-deterministic on
//! purpose, so everything that consumes it goes through [`GdpEstimator`] and
//! tests can substitute [`FixedMultiplierEstimator`].

use rand::Rng;

pub const DEFAULT_MIN_MULTIPLIER: u32 = 1000;
pub const DEFAULT_MAX_MULTIPLIER: u32 = 2000;

/// Replaceable `(population, exchange_rate) -> estimated_gdp` function.
pub trait GdpEstimator: Send + Sync {
    fn estimate(&self, population: u64, exchange_rate: f64) -> f64;
}

/// Draws an integer multiplier uniformly from `[min, max]` on every call.
#[derive(Debug, Clone)]
pub struct RandomMultiplierEstimator {
    min: u32,
    max: u32,
}

impl RandomMultiplierEstimator {
    pub fn new(min: u32, max: u32) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self { min, max }
    }

    pub fn bounds(&self) -> (u32, u32) {
        (self.min, self.max)
    }
}

impl Default for RandomMultiplierEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_MULTIPLIER, DEFAULT_MAX_MULTIPLIER)
    }
}

impl GdpEstimator for RandomMultiplierEstimator {
    fn estimate(&self, population: u64, exchange_rate: f64) -> f64 {
        let multiplier = rand::thread_rng().gen_range(self.min..=self.max);
        population as f64 * f64::from(multiplier) / exchange_rate
    }
}

/// Deterministic estimator with a constant multiplier.
#[derive(Debug, Clone, Copy)]
pub struct FixedMultiplierEstimator(pub f64);

impl GdpEstimator for FixedMultiplierEstimator {
    fn estimate(&self, population: u64, exchange_rate: f64) -> f64 {
        population as f64 * self.0 / exchange_rate
    }
}

/// Apply the nullability rule around an estimator.
///
/// The estimate exists only for a positive population and a known, positive
/// exchange rate. An unknown rate stays unknown; it is never treated as 1.
pub fn estimate_gdp(
    estimator: &dyn GdpEstimator,
    population: u64,
    exchange_rate: Option<f64>,
) -> Option<f64> {
    let rate = exchange_rate.filter(|rate| rate.is_finite() && *rate > 0.0)?;
    if population == 0 {
        return None;
    }
    Some(estimator.estimate(population, rate)).filter(|gdp| gdp.is_finite())
}
