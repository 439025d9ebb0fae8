//! Core services

pub mod logging;
