//! # bdpm-service
//!
//! Background refresh service for the BDPM dataset.
//!
//! The service keeps one immutable [`Snapshot`](bdpm_loader::Snapshot)
//! published in a [`DataContainer`]. Readers go through the [`DataStore`]
//! trait and never contend with updates: an [`UpdatePipeline`] fetches the
//! five files, parses and assembles a new snapshot off to the side, and
//! publishes it with a single atomic pointer swap. The
//! [`UpdateScheduler`] runs the pipeline at fixed local times and on demand.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use bdpm_service::{DataContainer, DataStore, HttpFetcher, ServiceConfig, UpdatePipeline};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServiceConfig::from_env()?;
//! let container = Arc::new(DataContainer::new());
//! let fetcher = HttpFetcher::new(config.sources.clone(), &config.scratch_dir)?;
//! let pipeline = UpdatePipeline::new(container.clone(), Arc::new(fetcher));
//!
//! pipeline.run_cycle().await?;
//! println!("{} medications", container.get_all_medications().len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod container;
pub mod error;
pub mod fetcher;
pub mod pipeline;
pub mod scheduler;

pub use config::ServiceConfig;
pub use container::{DataContainer, DataStore, StoreStats, UpdateGuard};
pub use error::{ConfigError, FetchError, UpdateError};
pub use fetcher::{HttpFetcher, SourceFetcher, SourceLocation, SourceLocations};
pub use pipeline::{CycleOutcome, CycleSummary, UpdatePipeline};
pub use scheduler::{next_run_after, SchedulerHandle, UpdateScheduler};
