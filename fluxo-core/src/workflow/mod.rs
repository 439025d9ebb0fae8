//! Solicitation workflow module

pub mod catalog;
pub mod engine;
pub mod feed;
pub mod guard;
pub mod persistence;
pub mod registry;
pub mod validator;

pub use catalog::*;
pub use engine::*;
pub use feed::*;
pub use guard::*;
pub use persistence::*;
pub use registry::*;
pub use validator::*;
