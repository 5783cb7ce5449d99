//! Type definitions for the ingestion module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// HTTP methods that produce endpoint documents.
///
/// Other path-item keys (`parameters`, `servers`, `head`, `options`, ...) are
/// ignored during extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            "PATCH" => Ok(Self::Patch),
            other => Err(format!("unsupported HTTP method: {}", other)),
        }
    }
}

impl TryFrom<String> for HttpMethod {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// One searchable record per (path, method) pair of an OpenAPI spec.
///
/// `text` is the embedding input and is always derived from the other fields;
/// [`EndpointDocument::new`] is the only constructor that should be used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointDocument {
    pub path: String,
    pub method: HttpMethod,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub text: String,
}

impl EndpointDocument {
    pub fn new(
        path: impl Into<String>,
        method: HttpMethod,
        summary: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let mut doc = Self {
            path: path.into(),
            method,
            summary: summary.into(),
            description: description.into(),
            text: String::new(),
        };
        doc.text = doc.render_text();
        doc
    }

    /// Format: "Path: <path>\nMethod: <METHOD>\nSummary: <summary>\nDescription: <description>"
    pub fn render_text(&self) -> String {
        format!(
            "Path: {}\nMethod: {}\nSummary: {}\nDescription: {}",
            self.path, self.method, self.summary, self.description
        )
    }

    /// `"METHOD path"`, used in score listings.
    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}
