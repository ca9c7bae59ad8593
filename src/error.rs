use thiserror::Error;

/// Violations of the emitter's block structure or of the ActionSet ordering contract.
///
/// These abort compilation of the affected package; callers decide whether to
/// skip it and carry on with the rest.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructureError {
    #[error("{open} block(s) still open at serialization")]
    UnbalancedBlocks { open: usize },

    #[error("close_block('{footer}') called with no open block")]
    CloseWithoutOpen { footer: String },

    #[error("branch '{header}' continued outside of an open block")]
    ArmWithoutOpen { header: String },

    #[error("require '{module}' is only valid at top level (indent {indent})")]
    RequireInsideBlock { module: String, indent: usize },

    #[error("unconditioned action set at position {index} of {total} must be last")]
    FallbackNotLast { index: usize, total: usize },

    #[error("more than one unconditioned action set ({count})")]
    DuplicateFallback { count: usize },
}

#[derive(Error, Debug)]
pub enum ShedError {
    #[error("Invalid recipe structure: {0}")]
    Structure(#[from] StructureError),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Error: {0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ShedError>;
