pub mod estimator;
pub mod normalizer;
pub mod summary;

pub use estimator::{
    estimate_gdp, FixedMultiplierEstimator, GdpEstimator, RandomMultiplierEstimator,
};
pub use normalizer::Normalizer;
