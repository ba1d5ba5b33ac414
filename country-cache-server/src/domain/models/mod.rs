pub mod country;
pub mod cycle;
pub mod rate_table;
pub mod summary;

pub use country::*;
pub use cycle::*;
pub use rate_table::*;
pub use summary::*;
