//! OCR oracle interface and line reconstruction.
//!
//! Text detection itself is delegated to an external service that returns
//! word-level bounding boxes; this module only defines the contract and
//! turns the word boxes back into readable lines.

mod lines;
mod vision;

pub use lines::LineReconstructor;
pub use vision::VisionClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::OcrError;

/// One corner of a word bounding box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vertex {
    pub x: i32,
    pub y: i32,
}

/// A detected word with its quadrilateral bounding box.
///
/// By convention the first element returned by the oracle is the full-text
/// blob covering the whole image; consumers skip it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordBox {
    /// Recognized text.
    pub text: String,

    /// Corners in order: top-left, top-right, bottom-right, bottom-left.
    pub vertices: [Vertex; 4],
}

impl WordBox {
    pub fn new(text: impl Into<String>, vertices: [Vertex; 4]) -> Self {
        Self {
            text: text.into(),
            vertices,
        }
    }

    /// Top-left corner X coordinate.
    pub fn x(&self) -> i32 {
        self.vertices[0].x
    }

    /// Top-left corner Y coordinate.
    pub fn y(&self) -> i32 {
        self.vertices[0].y
    }
}

/// The external text-detection oracle.
#[async_trait]
pub trait TextDetector: Send + Sync {
    /// Detect text in an image, returning word boxes with the full-text
    /// blob as the first element. An empty result means no text was found.
    async fn detect_text(&self, image: &[u8]) -> Result<Vec<WordBox>, OcrError>;
}
