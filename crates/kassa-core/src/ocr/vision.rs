//! Google Vision text-detection client.

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{TextDetector, Vertex, WordBox};
use crate::error::OcrError;

/// Client for the Google Vision `images:annotate` endpoint.
pub struct VisionClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl VisionClient {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }
}

#[derive(Serialize)]
struct AnnotateRequest<'a> {
    requests: Vec<ImageRequest<'a>>,
}

#[derive(Serialize)]
struct ImageRequest<'a> {
    image: ImageContent,
    features: Vec<Feature<'a>>,
}

#[derive(Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Serialize)]
struct Feature<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
}

#[derive(Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<ImageResponse>,
}

#[derive(Deserialize)]
struct ImageResponse {
    #[serde(rename = "textAnnotations", default)]
    text_annotations: Vec<TextAnnotation>,
    error: Option<ServiceError>,
}

#[derive(Deserialize)]
struct TextAnnotation {
    description: String,
    #[serde(rename = "boundingPoly")]
    bounding_poly: BoundingPoly,
}

#[derive(Deserialize)]
struct BoundingPoly {
    #[serde(default)]
    vertices: Vec<ResponseVertex>,
}

// The service omits zero-valued coordinates.
#[derive(Deserialize, Default, Clone, Copy)]
struct ResponseVertex {
    #[serde(default)]
    x: i32,
    #[serde(default)]
    y: i32,
}

#[derive(Deserialize)]
struct ServiceError {
    message: String,
}

#[async_trait]
impl TextDetector for VisionClient {
    async fn detect_text(&self, image: &[u8]) -> Result<Vec<WordBox>, OcrError> {
        let content = base64::engine::general_purpose::STANDARD.encode(image);
        let body = AnnotateRequest {
            requests: vec![ImageRequest {
                image: ImageContent { content },
                features: vec![Feature {
                    kind: "TEXT_DETECTION",
                }],
            }],
        };

        let response: AnnotateResponse = self
            .http
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let image_response = response
            .responses
            .into_iter()
            .next()
            .ok_or_else(|| OcrError::Service("empty annotate response".to_string()))?;

        if let Some(err) = image_response.error {
            return Err(OcrError::Service(err.message));
        }

        let words: Vec<WordBox> = image_response
            .text_annotations
            .into_iter()
            .map(|a| {
                let mut vertices = [Vertex::default(); 4];
                for (slot, v) in vertices.iter_mut().zip(a.bounding_poly.vertices.iter()) {
                    *slot = Vertex { x: v.x, y: v.y };
                }
                WordBox::new(a.description, vertices)
            })
            .collect();

        debug!("text detection returned {} word boxes", words.len());
        Ok(words)
    }
}
