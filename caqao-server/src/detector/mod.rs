//! Bean detection
//!
//! Inference runs outside this process. [`Detector`] is the seam the
//! handlers call through; [`HttpDetector`] talks to a YOLO-style inference
//! server and tests substitute a canned implementation.

mod http;

pub use http::HttpDetector;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Detector errors
#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Detector returned {0}: {1}")]
    Status(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// One detected bean
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    /// Class label as emitted by the model, e.g. `brown-g2`
    pub label: String,
    pub confidence: f32,
    /// Pixel box `[xmin, ymin, xmax, ymax]`
    pub bbox: [f32; 4],
}

/// Source of detections for an uploaded image
#[async_trait]
pub trait Detector: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Run detection on the encoded image
    async fn detect(&self, image: &[u8], mimetype: &str)
        -> Result<Vec<RawDetection>, DetectorError>;
}

/// Keep the `max_det` most confident detections, most confident first
pub fn cap_detections(mut detections: Vec<RawDetection>, max_det: u32) -> Vec<RawDetection> {
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    detections.truncate(max_det as usize);
    detections
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(label: &str, confidence: f32) -> RawDetection {
        RawDetection {
            label: label.to_string(),
            confidence,
            bbox: [0.0, 0.0, 10.0, 10.0],
        }
    }

    #[test]
    fn test_cap_keeps_most_confident() {
        let capped = cap_detections(
            vec![det("slaty", 0.4), det("mouldy", 0.9), det("brown-g1", 0.7)],
            2,
        );
        let labels: Vec<&str> = capped.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["mouldy", "brown-g1"]);
    }

    #[test]
    fn test_cap_above_count_keeps_all() {
        let capped = cap_detections(vec![det("slaty", 0.4), det("mouldy", 0.9)], 50);
        assert_eq!(capped.len(), 2);
        assert_eq!(capped[0].label, "mouldy");
    }
}
