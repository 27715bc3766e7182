use async_trait::async_trait;
use axum::body::Bytes;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use url::Url;

use crate::error::{AppError, CaptureError};
use crate::load_balancer::LoadBalancer;
use crate::metrics::{CAPTURE_FAILURES, CAPTURE_LATENCY};
use crate::models::{CaptureOptions, CaptureRequest, OutputType};

const DEFAULT_VIEWPORT: (u32, u32) = (1280, 720);

// The external rendering capability: turns a URL into image or PDF bytes
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn capture(&self, url: &Url, options: &CaptureOptions) -> Result<Bytes, CaptureError>;
}

// One capture, no retries and no timeout: a slow renderer is a slow request
pub async fn capture(renderer: &dyn Renderer, request: &CaptureRequest) -> Result<Bytes, AppError> {
    let start_time = Instant::now();
    let result = renderer.capture(&request.url, &request.options()).await;
    CAPTURE_LATENCY.observe(start_time.elapsed().as_secs_f64());

    result.map_err(|err| {
        CAPTURE_FAILURES.inc();
        tracing::warn!(url = %request.url, error = %err, "capture failed");
        AppError::Capture(err)
    })
}

// Body of a render call, in the shape browserless-style services take
#[derive(Serialize)]
struct RenderCall<'a> {
    url: &'a str,
    options: RenderCallOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    viewport: Option<Viewport>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RenderCallOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    full_page: Option<bool>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    kind: Option<OutputType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    quality: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    print_background: Option<bool>,
}

#[derive(Serialize, Debug, PartialEq)]
struct Viewport {
    width: u32,
    height: u32,
}

impl<'a> RenderCall<'a> {
    fn new(url: &'a Url, options: &CaptureOptions) -> Self {
        let viewport = match (options.width, options.height) {
            (None, None) => None,
            (width, height) => Some(Viewport {
                width: width.unwrap_or(DEFAULT_VIEWPORT.0),
                height: height.unwrap_or(DEFAULT_VIEWPORT.1),
            }),
        };

        let options = match options.output_type {
            OutputType::Pdf => RenderCallOptions {
                full_page: None,
                kind: None,
                quality: None,
                print_background: Some(true),
            },
            kind => RenderCallOptions {
                full_page: Some(options.full_page),
                kind: Some(kind),
                // lossless formats reject a quality setting
                quality: options.quality.filter(|_| kind.is_lossy()),
                print_background: None,
            },
        };

        Self {
            url: url.as_str(),
            options,
            viewport,
        }
    }

    fn path(kind: OutputType) -> &'static str {
        match kind {
            OutputType::Pdf => "/pdf",
            OutputType::Png | OutputType::Jpeg => "/screenshot",
        }
    }
}

// Renderer backed by a pool of remote HTTP rendering services
pub struct HttpRenderer {
    client: reqwest::Client,
    load_balancer: Arc<LoadBalancer>,
}

impl HttpRenderer {
    pub fn new(client: reqwest::Client, load_balancer: Arc<LoadBalancer>) -> Self {
        Self {
            client,
            load_balancer,
        }
    }
}

#[async_trait]
impl Renderer for HttpRenderer {
    async fn capture(&self, url: &Url, options: &CaptureOptions) -> Result<Bytes, CaptureError> {
        let backend = self
            .load_balancer
            .next_healthy()
            .ok_or_else(|| CaptureError::new("no healthy render backends available"))?;
        tracing::debug!(backend = %backend.url, page = %url, kind = options.output_type.as_str(), "rendering");

        let result = self
            .client
            .post(format!("{}{}", backend.url, RenderCall::path(options.output_type)))
            .json(&RenderCall::new(url, options))
            .send()
            .await;

        // health flags belong to the health checker; a failed call only fails this request
        let res = result.map_err(|e| {
            tracing::warn!(backend = %backend.url, error = %e, "render backend call failed");
            CaptureError::new(format!("request failed: {e}"))
        })?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(CaptureError::new(format!(
                "render backend returned {status}: {}",
                text.trim()
            )));
        }

        res.bytes()
            .await
            .map_err(|e| CaptureError::new(format!("reading render output: {e}")))
    }
}
