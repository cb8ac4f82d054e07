//! Data models for gitpix

mod commit;
mod image;

pub use commit::{CommitDetail, CommitRef, FileChange, FileStatus};
pub use image::ImageEntry;
