//! Feed source descriptors.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

static DEFAULT_AREA: &str = "events";

fn default_area() -> String {
    DEFAULT_AREA.to_string()
}

/// An external calendar feed the importer pulls from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub method: FetchMethod,
    /// Approval area consulted when deciding whether imports auto-approve
    #[serde(default = "default_area")]
    pub area: String,
    /// Set at the end of every completed import run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

impl Source {
    pub fn new(name: &str, url: &str) -> Self {
        Source {
            id: Uuid::new_v4(),
            name: name.to_string(),
            url: url.to_string(),
            method: FetchMethod::default(),
            area: default_area(),
            last_refreshed_at: None,
        }
    }

    pub fn with_method(mut self, method: FetchMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_area(mut self, area: &str) -> Self {
        self.area = area.to_string();
        self
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMethod {
    #[default]
    Get,
    Post,
}

impl fmt::Display for FetchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchMethod::Get => write!(f, "get"),
            FetchMethod::Post => write!(f, "post"),
        }
    }
}

impl FromStr for FetchMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(FetchMethod::Get),
            "post" => Ok(FetchMethod::Post),
            other => Err(format!("Unknown fetch method '{}'. Expected get or post", other)),
        }
    }
}
