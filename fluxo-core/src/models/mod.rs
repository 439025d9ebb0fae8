//! Data models for fluxo

pub mod actor;
pub mod audit;
pub mod configuration;
pub mod record;
pub mod workflow;

pub use actor::*;
pub use audit::*;
pub use configuration::*;
pub use record::*;
pub use workflow::*;
