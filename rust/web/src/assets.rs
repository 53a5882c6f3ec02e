//! The stylesheet and other files shipped next to the rendered pages.
//!
//! The asset directory is flat: a request names one file directly under it.
//! Anything else, nested paths and dot-files included, is treated as missing.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mime_guess::mime;
use thiserror::Error;
use warp::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use warp::http::{HeaderValue, StatusCode};
use warp::reply::Response;
use warp::Reply;

use crate::errors::{ErrorSeverity, IntoErrorResponse};

const ASSET_CACHE: &str = "public, max-age=86400";

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("no asset named '{0}'")]
    Missing(String),
    #[error("failed to read asset '{name}': {source}")]
    Unreadable {
        name: String,
        #[source]
        source: io::Error,
    },
}

impl IntoErrorResponse for AssetError {
    fn status_code(&self) -> StatusCode {
        match self {
            AssetError::Missing(_) => StatusCode::NOT_FOUND,
            AssetError::Unreadable { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AssetError::Missing(_) => "asset_not_found",
            AssetError::Unreadable { .. } => "asset_read_failed",
        }
    }

    fn error_message(&self) -> String {
        match self {
            AssetError::Missing(name) => format!("no asset named '{name}'"),
            // the io error may carry host paths; it is logged, not returned
            AssetError::Unreadable { name, .. } => format!("asset '{name}' could not be read"),
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            AssetError::Missing(_) => ErrorSeverity::Client,
            AssetError::Unreadable { .. } => ErrorSeverity::Server,
        }
    }
}

/// One loaded file, ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Reply for Asset {
    fn into_response(self) -> Response {
        let content_type = HeaderValue::from_str(&self.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
        let mut response = Response::new(self.bytes.into());
        let headers = response.headers_mut();
        headers.insert(CONTENT_TYPE, content_type);
        headers.insert(CACHE_CONTROL, HeaderValue::from_static(ASSET_CACHE));
        response
    }
}

/// Reads assets from the configured static directory.
#[derive(Debug, Clone)]
pub struct Assets {
    dir: Arc<PathBuf>,
}

impl Assets {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Arc::new(dir.into()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn load(&self, name: &str) -> Result<Asset, AssetError> {
        if !is_plain_file_name(name) {
            return Err(AssetError::Missing(name.to_string()));
        }

        let path = self.dir.join(name);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(AssetError::Missing(name.to_string()))
            }
            Err(source) => {
                tracing::error!(path = %path.display(), error = %source, "asset read failed");
                return Err(AssetError::Unreadable {
                    name: name.to_string(),
                    source,
                });
            }
        };

        Ok(Asset {
            name: name.to_string(),
            content_type: content_type_for(name),
            bytes,
        })
    }

    /// The asset, or the JSON error body for why it could not be served.
    pub async fn respond(&self, name: &str) -> Response {
        match self.load(name).await {
            Ok(asset) => asset.into_response(),
            Err(err) => err.into_http_response(),
        }
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && !name.starts_with('.') && !name.contains(['/', '\\'])
}

fn content_type_for(name: &str) -> String {
    let guessed = mime_guess::from_path(name).first_or_octet_stream();
    if guessed.type_() == mime::TEXT {
        format!("{}; charset=utf-8", guessed.essence_str())
    } else {
        guessed.essence_str().to_string()
    }
}
