use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use reqwest::StatusCode;

use super::Response;

#[derive(Debug, Clone)]
struct Asset {
    content_type: &'static str,
    body: Bytes,
}

/// Static files compiled into the binary and served for the app's origin.
#[derive(Debug, Clone, Default)]
pub struct BundledAssets {
    files: Arc<HashMap<String, Asset>>,
}

impl BundledAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(
        mut self,
        path: &str,
        content_type: &'static str,
        body: impl Into<Bytes>,
    ) -> Self {
        Arc::make_mut(&mut self.files).insert(
            path.to_string(),
            Asset {
                content_type,
                body: body.into(),
            },
        );
        self
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// Look up `path`, answering 404 when nothing is bundled there.
    pub fn serve(&self, path: &str) -> Response {
        match self.files.get(path) {
            Some(asset) => Response::new(StatusCode::OK, asset.body.clone())
                .with_content_type(asset.content_type),
            None => Response::new(StatusCode::NOT_FOUND, format!("Not found: {}", path))
                .with_content_type("text/plain; charset=utf-8"),
        }
    }
}
