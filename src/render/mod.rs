//! Output formats for the selected graph.

pub mod dot;
pub mod json;

pub use dot::to_dot;
pub use json::to_json;

use std::fmt;
use std::str::FromStr;

/// Output format for the rendered graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Dot,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dot" | "graphviz" => Ok(OutputFormat::Dot),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Valid options: dot, json", s)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Dot => write!(f, "dot"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl OutputFormat {
    /// Detect the format from an output file extension. Image extensions
    /// map to Dot because they are produced by rendering dot output.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "dot" | "gv" => Some(OutputFormat::Dot),
            "json" => Some(OutputFormat::Json),
            "png" | "svg" | "pdf" => Some(OutputFormat::Dot),
            _ => None,
        }
    }
}

/// Diagram direction of the dot output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    LR,
    TB,
}

impl FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lr" | "left-right" | "horizontal" => Ok(Layout::LR),
            "tb" | "td" | "top-bottom" | "top-down" | "vertical" => Ok(Layout::TB),
            _ => Err(format!("Unknown layout: {}. Valid options: lr, tb", s)),
        }
    }
}

impl Layout {
    pub fn rankdir(&self) -> &'static str {
        match self {
            Layout::LR => "LR",
            Layout::TB => "TB",
        }
    }
}

/// Fields of the generated-at comment block in dot output
#[derive(Debug, Clone)]
pub struct HeaderInfo {
    /// Input path, or `<stdin>`
    pub source: String,
    /// Local timestamp, `YYYY-MM-DD HH:MM:SS`
    pub created: String,
}
