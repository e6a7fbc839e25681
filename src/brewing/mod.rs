//! Brewing dashboard data: device selection, payload normalisation and the
//! live → stored → placeholder fallback chain.

pub mod mapper;
pub mod selector;
pub mod service;

pub use service::{BrewingService, UpdateError};
