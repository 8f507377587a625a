//! Tool error types
//!
//! These errors never cross the RPC boundary as faults: each tool renders
//! them to text before replying.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },

    #[error("Unknown {tool} {kind}: {name}")]
    InvalidOperation {
        tool: &'static str,
        kind: &'static str,
        name: String,
    },

    #[error("Failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ToolError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_operation_message() {
        let err = ToolError::InvalidOperation {
            tool: "aircrack-ng",
            kind: "operation",
            name: "levitate".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown aircrack-ng operation: levitate");
    }

    #[test]
    fn test_launch_message() {
        let err = ToolError::Launch {
            program: "burpsuite".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.to_string().contains("Failed to launch burpsuite"));
    }
}
