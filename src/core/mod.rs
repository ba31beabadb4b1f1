pub mod locator;
pub mod network;
pub mod qr;
pub mod server;
pub mod share;
pub mod uploader;

pub use crate::domain::model::{Artifact, ShareMode, ShareOutcome, UploadBackend};
pub use crate::domain::ports::{ConfigProvider, Uploader};
pub use crate::utils::error::Result;
