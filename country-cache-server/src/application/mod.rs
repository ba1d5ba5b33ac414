pub mod country_service;
pub mod refresh_service;
pub mod scheduler;
pub mod summary_builder;

pub use country_service::CountryService;
pub use refresh_service::RefreshOrchestrator;
pub use scheduler::RefreshScheduler;
pub use summary_builder::SummaryArtifactBuilder;
