pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::config::ShareConfig;
pub use crate::core::{server::FileServer, share::ShareEngine};
pub use crate::domain::model::{Artifact, ShareMode, ShareOutcome, UploadBackend};
pub use crate::utils::error::{Result, ShareError};
