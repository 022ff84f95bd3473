//! `erafix-classify` — FOR code classification engine.
//!
//! Pure engine crate: operates on a loaded `RecordStore`, returns reports.
//! No CLI or IO dependencies.

pub mod allocate;
pub mod config;
pub mod error;
pub mod forc;
pub mod matcher;
pub mod model;

pub use allocate::AllocationEngine;
pub use config::{ClassifyConfig, RebalancePolicy};
pub use error::ClassifyError;
pub use forc::ParsedCodes;
pub use matcher::{MatchStrategy, SearchField};
pub use model::{AllocationReport, Operation};
