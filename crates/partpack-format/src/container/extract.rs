//! Extraction options, reporting and destination paths

use crate::container::error::{ContainerError, ContainerResult};
use std::path::{Component, Path, PathBuf};

/// What to do when one part of a batch fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Stop at the first failing part and return its error
    #[default]
    Abort,
    /// Record the failure in the report and move on to the next part
    Continue,
}

/// Extraction settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExtractOptions {
    /// Replace destination files that already exist
    pub overwrite: bool,
    /// Fail a part that decompresses to fewer bytes than its logical size
    pub strict: bool,
    /// Batch behaviour on per-part failure
    pub on_error: ErrorPolicy,
}

impl ExtractOptions {
    /// Defaults: no overwrite, lenient copies, abort on first failure
    pub fn new() -> Self {
        Self::default()
    }

    /// Set overwrite behaviour
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Set strict size checking
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set the batch error policy
    pub fn with_error_policy(mut self, on_error: ErrorPolicy) -> Self {
        self.on_error = on_error;
        self
    }
}

/// A part that could not be extracted
#[derive(Debug)]
pub struct ExtractFailure {
    /// Part name
    pub name: String,
    /// Why it failed
    pub error: ContainerError,
}

/// Outcome of an extraction batch
#[derive(Debug, Default)]
pub struct ExtractReport {
    /// Names of parts that were extracted, in processing order
    pub extracted: Vec<String>,
    /// Parts that failed; only populated under [`ErrorPolicy::Continue`]
    pub failures: Vec<ExtractFailure>,
}

impl ExtractReport {
    /// True when no part failed
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Apply the error policy to one part's result
    pub(crate) fn record(
        &mut self,
        name: &str,
        result: ContainerResult<()>,
        policy: ErrorPolicy,
    ) -> ContainerResult<()> {
        match result {
            Ok(()) => {
                self.extracted.push(name.to_string());
                Ok(())
            }
            Err(error) => match policy {
                ErrorPolicy::Abort => Err(error),
                ErrorPolicy::Continue => {
                    tracing::warn!("Failed to extract {}: {}", name, error);
                    self.failures.push(ExtractFailure {
                        name: name.to_string(),
                        error,
                    });
                    Ok(())
                }
            },
        }
    }
}

/// Join a part name onto an extraction root
///
/// Both `/` and `\` separate path segments. Names that are empty, absolute,
/// or climb out of the root are rejected.
pub fn destination_path(root: &Path, name: &str) -> ContainerResult<PathBuf> {
    let unsafe_name = || ContainerError::UnsafePath(name.to_string());
    let mut path = root.to_path_buf();
    let mut segments = 0usize;

    for segment in name.split(['/', '\\']) {
        if segment.is_empty() || segment == "." {
            continue;
        }
        let mut components = Path::new(segment).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(part)), None) => path.push(part),
            _ => return Err(unsafe_name()),
        }
        segments += 1;
    }

    // Leading separators would make the name absolute on the writer's side
    if segments == 0 || name.starts_with(['/', '\\']) {
        return Err(unsafe_name());
    }

    Ok(path)
}
