pub mod analysis;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod conflict;
pub mod error;
pub mod fallback;
pub mod graph;
pub mod io;
pub mod paths;
pub mod profile;
pub mod resolution;
pub mod scaffold;
pub mod selection;
pub mod sort;
pub mod types;

pub use error::{KickoffError, Result};
