pub mod collab;
pub mod config;
pub mod error;
pub mod io;
pub mod orchestrator;
pub mod paths;
pub mod payload;
pub mod project;
pub mod rules;
pub mod scan;
pub mod settings;
pub mod store;
pub mod types;

pub use error::{ForgeError, Result};
pub use project::Project;
