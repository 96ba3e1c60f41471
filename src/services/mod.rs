pub mod ingest;
pub mod requisites;
pub mod scheduler;

pub use ingest::{IngestService, IngestStats};
pub use requisites::{Resolved, ResolvedRequirement};
pub use scheduler::ScrapeScheduler;
