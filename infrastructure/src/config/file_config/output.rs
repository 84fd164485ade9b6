//! Output configuration from TOML (`[output]` section)

use serde::{Deserialize, Serialize};

/// How a finished meeting is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileOutputFormat {
    /// The whole markdown transcript
    #[default]
    Full,
    /// Only the summary
    Summary,
    /// The record as JSON
    Json,
}

impl std::str::FromStr for FileOutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(FileOutputFormat::Full),
            "summary" => Ok(FileOutputFormat::Summary),
            "json" => Ok(FileOutputFormat::Json),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

/// Raw output configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOutputConfig {
    pub format: Option<FileOutputFormat>,
    /// Enable colored terminal output
    pub color: bool,
    /// Print replies as they stream in
    pub show_stream: bool,
}

impl Default for FileOutputConfig {
    fn default() -> Self {
        Self {
            format: None,
            color: true,
            show_stream: true,
        }
    }
}
