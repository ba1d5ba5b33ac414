pub mod artifacts;
pub mod persistence;
pub mod rendering;
pub mod sources;
