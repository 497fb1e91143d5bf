//! LlamaParse cloud parsing client.
//!
//! A document is uploaded as a job, the job is polled until it settles and
//! the result is fetched as markdown or as per-page JSON.

use std::path::Path;
use std::time::{Duration, Instant};

use reqwest::blocking::{multipart, Client};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::BoundingBox;

use super::check_status;

pub const DEFAULT_BASE_URL: &str = "https://api.cloud.llamaindex.ai";

/// LlamaParse settings.
#[derive(Debug, Clone)]
pub struct LlamaConfig {
    pub api_key: String,
    pub base_url: String,
    /// Delay between two job status checks
    pub poll_interval: Duration,
    /// Give up waiting for a job after this long
    pub timeout: Duration,
}

impl LlamaConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval: Duration::from_secs(2),
            timeout: Duration::from_secs(600),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/parsing{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// One parsed page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlamaPage {
    /// 1-based page number
    pub page: u32,
    pub text: String,
    pub md: String,
    pub items: Vec<LlamaItem>,
    pub layout: Vec<LlamaItem>,
}

impl LlamaPage {
    /// Layout elements, or the typed items when no layout was returned.
    pub fn layout_items(&self) -> &[LlamaItem] {
        if self.layout.is_empty() {
            &self.items
        } else {
            &self.layout
        }
    }
}

/// A typed element of a page: heading, text, table, figure, ...
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlamaItem {
    #[serde(rename = "type", alias = "label")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub md: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    /// Image name for figures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(alias = "bBox", skip_serializing_if = "Option::is_none")]
    pub bbox: Option<ItemBox>,
}

impl LlamaItem {
    /// Text of the item: `text`, then `value`, then `md`.
    pub fn content(&self) -> &str {
        self.text
            .as_deref()
            .or(self.value.as_deref())
            .or(self.md.as_deref())
            .unwrap_or_default()
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.bbox.map(BoundingBox::from).unwrap_or_default()
    }
}

/// Element box as returned by the service; width and height come as
/// `w`/`h` or `width`/`height`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemBox {
    pub x: f32,
    pub y: f32,
    #[serde(alias = "width")]
    pub w: f32,
    #[serde(alias = "height")]
    pub h: f32,
}

impl From<ItemBox> for BoundingBox {
    fn from(b: ItemBox) -> Self {
        BoundingBox::new(b.x, b.y, b.w, b.h)
    }
}

#[derive(Debug, Deserialize)]
struct JobResponse {
    id: String,
    #[serde(default)]
    status: String,
}

#[derive(Debug, Deserialize)]
struct MarkdownResult {
    #[serde(default)]
    markdown: String,
}

#[derive(Debug, Deserialize)]
struct JsonResult {
    #[serde(default)]
    pages: Vec<LlamaPage>,
}

/// Blocking LlamaParse client.
pub struct LlamaParseClient {
    client: Client,
    config: LlamaConfig,
}

impl LlamaParseClient {
    pub fn new(config: LlamaConfig) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(300)).build()?;
        Ok(Self { client, config })
    }

    /// Upload a file and return the job id.
    pub fn upload(&self, path: &Path) -> Result<String> {
        let form = multipart::Form::new().file("file", path)?;
        let response = self
            .client
            .post(self.config.url("/upload"))
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()?;
        let job: JobResponse = check_status(response)?.json()?;
        log::info!("LlamaParse job {} created", job.id);
        Ok(job.id)
    }

    /// Poll a job until it succeeds, fails or times out.
    pub fn wait(&self, job_id: &str) -> Result<()> {
        let started = Instant::now();
        loop {
            let response = self
                .client
                .get(self.config.url(&format!("/job/{}", job_id)))
                .bearer_auth(&self.config.api_key)
                .send()?;
            let job: JobResponse = check_status(response)?.json()?;

            match job.status.as_str() {
                "SUCCESS" => return Ok(()),
                "ERROR" | "CANCELED" | "CANCELLED" => {
                    return Err(Error::Other(format!(
                        "LlamaParse job {} ended with status {}",
                        job_id, job.status
                    )))
                }
                status => log::debug!("LlamaParse job {} is {}", job_id, status),
            }

            if started.elapsed() >= self.config.timeout {
                return Err(Error::Timeout(self.config.timeout.as_secs()));
            }
            std::thread::sleep(self.config.poll_interval);
        }
    }

    /// Whole-document markdown of a finished job.
    pub fn markdown(&self, job_id: &str) -> Result<String> {
        let response = self
            .client
            .get(self.config.url(&format!("/job/{}/result/markdown", job_id)))
            .bearer_auth(&self.config.api_key)
            .send()?;
        let result: MarkdownResult = check_status(response)?.json()?;
        Ok(result.markdown)
    }

    /// Per-page results of a finished job.
    pub fn pages(&self, job_id: &str) -> Result<Vec<LlamaPage>> {
        let response = self
            .client
            .get(self.config.url(&format!("/job/{}/result/json", job_id)))
            .bearer_auth(&self.config.api_key)
            .send()?;
        let result: JsonResult = check_status(response)?.json()?;
        Ok(result.pages)
    }

    /// Upload, wait and return the per-page results.
    pub fn parse_pages(&self, path: &Path) -> Result<Vec<LlamaPage>> {
        let job_id = self.upload(path)?;
        self.wait(&job_id)?;
        self.pages(&job_id)
    }

    /// Upload, wait and return the document markdown.
    pub fn parse_markdown(&self, path: &Path) -> Result<String> {
        let job_id = self.upload(path)?;
        self.wait(&job_id)?;
        self.markdown(&job_id)
    }
}
