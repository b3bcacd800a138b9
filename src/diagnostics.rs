//! Warnings collected while processing attendance files.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::warn;

/// A file that was skipped and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileWarning {
    pub file: PathBuf,
    pub cause: String,
}

/// Sink for per-file warnings. Every warning is also emitted as a `tracing`
/// event when it is recorded.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Diagnostics {
    warnings: Vec<FileWarning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file_skipped(&mut self, file: &Path, cause: impl std::fmt::Display) {
        let cause = cause.to_string();
        warn!(file = %file.display(), error = %cause, "File processing failed, skipping");
        self.warnings.push(FileWarning {
            file: file.to_path_buf(),
            cause,
        });
    }

    pub fn warnings(&self) -> &[FileWarning] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_skipped_records_context() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.file_skipped(Path::new("raw/2025.3.1.xlsx"), "bad zip");

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics.warnings()[0],
            FileWarning {
                file: PathBuf::from("raw/2025.3.1.xlsx"),
                cause: "bad zip".into(),
            }
        );
    }
}
