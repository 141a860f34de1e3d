use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// JSON body of a fetch-by-filename request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SourceRequest {
    /// File name or path under the configured base URL. Any scheme or host
    /// in this value is ignored.
    pub filename: String,
    /// Optional chapter list in ffmpeg `FFMETADATA` format.
    #[serde(default)]
    pub chapters: Option<String>,
}

/// Which configured base URL filenames resolve against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Production,
    Development,
}

impl Environment {
    /// Interpret the `X-Environment` header. Anything but `Development`
    /// (case-insensitive) selects production.
    pub fn from_header(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("development") => Environment::Development,
            _ => Environment::Production,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Production => f.write_str("production"),
            Environment::Development => f.write_str("development"),
        }
    }
}

/// How the source audio reaches the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionBody {
    /// MP4 bytes sent directly in the request body.
    Inline(Bytes),
    /// A filename to fetch from the environment's base URL.
    Remote { filename: String },
    /// A filename to fetch, plus chapters to embed in the output.
    Chaptered { filename: String, chapters: String },
}

impl From<SourceRequest> for ConversionBody {
    fn from(req: SourceRequest) -> Self {
        match req.chapters {
            Some(chapters) if !chapters.trim().is_empty() => ConversionBody::Chaptered {
                filename: req.filename,
                chapters,
            },
            _ => ConversionBody::Remote {
                filename: req.filename,
            },
        }
    }
}

/// A request that passed content negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub environment: Environment,
    pub body: ConversionBody,
}
