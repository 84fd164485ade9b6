//! Stream context: identifies which phase a streamed chunk belongs to.
//!
//! Discussion chunks carry no context; evaluation and summary chunks are
//! tagged so a shell can route them to a different surface.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamContext {
    Evaluation,
    Summary,
}

impl StreamContext {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Evaluation => "Evaluation",
            Self::Summary => "Summary",
        }
    }
}

impl std::fmt::Display for StreamContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
