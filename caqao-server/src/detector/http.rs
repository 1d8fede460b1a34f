//! HTTP client for an external YOLO-style inference server

use super::{Detector, DetectorError, RawDetection};
use async_trait::async_trait;
use caqao_common::config::DetectorConfig;
use serde::Deserialize;
use std::time::Duration;

const USER_AGENT: &str = concat!("caqao-server/", env!("CARGO_PKG_VERSION"));

/// One row of the inference server's JSON response; the numeric `class` is
/// ignored in favour of `name`
#[derive(Debug, Deserialize)]
struct YoloRecord {
    xmin: f32,
    ymin: f32,
    xmax: f32,
    ymax: f32,
    confidence: f32,
    name: String,
}

impl From<YoloRecord> for RawDetection {
    fn from(r: YoloRecord) -> Self {
        RawDetection {
            label: r.name,
            confidence: r.confidence,
            bbox: [r.xmin, r.ymin, r.xmax, r.ymax],
        }
    }
}

/// Detector backed by a remote inference endpoint
pub struct HttpDetector {
    http_client: reqwest::Client,
    url: String,
    image_size: u32,
}

impl HttpDetector {
    pub fn new(config: &DetectorConfig) -> Result<Self, DetectorError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DetectorError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            url: config.url.clone(),
            image_size: config.image_size,
        })
    }
}

#[async_trait]
impl Detector for HttpDetector {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn detect(
        &self,
        image: &[u8],
        mimetype: &str,
    ) -> Result<Vec<RawDetection>, DetectorError> {
        let part = reqwest::multipart::Part::bytes(image.to_vec())
            .file_name("upload")
            .mime_str(mimetype)
            .map_err(|e| DetectorError::Network(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("image", part);

        tracing::debug!(url = %self.url, bytes = image.len(), "Sending image to detector");

        let response = self
            .http_client
            .post(&self.url)
            .query(&[("size", self.image_size)])
            .multipart(form)
            .send()
            .await
            .map_err(|e| DetectorError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(DetectorError::Status(status.as_u16(), error_text));
        }

        let records: Vec<YoloRecord> = response
            .json()
            .await
            .map_err(|e| DetectorError::Parse(e.to_string()))?;

        tracing::debug!(count = records.len(), "Detector responded");

        Ok(records.into_iter().map(RawDetection::from).collect())
    }
}
