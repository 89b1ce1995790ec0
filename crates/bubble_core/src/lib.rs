pub mod document;
pub mod error;
pub mod glyph;
pub mod image;
pub mod interchange;
pub mod layout;
pub mod level;
pub mod patch;
pub mod reader;
pub mod segments;
pub mod sprite;

pub use document::{Document, GameData, patch_levels};
pub use error::{Error, ErrorCode, Result};
pub use image::ProgramImage;
pub use patch::{Patch, PatchOp, SegmentData};
pub use segments::Segment;
