//! EXPA container error types.

use std::io;

use thiserror::Error;

/// Result type for EXPA container operations.
pub type ExpaResult<T> = Result<T, ExpaError>;

/// Errors that can occur while reading or writing an EXPA container.
///
/// Malformed or missing schema files are deliberately *not* represented
/// here: the resolver demotes them to an empty structure (see
/// [`crate::StructureResolver`]).
#[derive(Debug, Error)]
pub enum ExpaError {
    /// I/O error from the underlying byte source or sink.
    #[error("EXPA I/O error: {source}")]
    Io {
        /// Underlying error.
        #[from]
        source: io::Error,
    },

    /// The file does not start with the EXPA magic.
    #[error("given file lacks EXPA header: found {found:#010x}")]
    MissingExpaHeader {
        /// Magic word actually present.
        found: u32,
    },

    /// The section after the row regions does not start with the CHNK magic.
    #[error("given file lacks CHNK header: found {found:#010x}")]
    MissingChnkHeader {
        /// Magic word actually present.
        found: u32,
    },

    /// A table's declared row size disagrees with its resolved structure.
    #[error(
        "structure size mismatch for table '{table}': file declares {declared} bytes, \
         resolved structure packs to {computed}"
    )]
    StructureSizeMismatch {
        /// Table name.
        table: String,
        /// Row size recorded in the file.
        declared: u32,
        /// Row size computed from the resolved structure, before stride
        /// padding.
        computed: u32,
    },

    /// The file ended before a read could be satisfied.
    #[error("truncated file: needed {needed} bytes at offset {offset}")]
    TruncatedFile {
        /// Offset at which the read started.
        offset: u64,
        /// Number of bytes the read required.
        needed: usize,
    },
}

impl ExpaError {
    /// Creates a structure size mismatch error.
    pub fn size_mismatch(table: impl Into<String>, declared: u32, computed: u32) -> Self {
        Self::StructureSizeMismatch {
            table: table.into(),
            declared,
            computed,
        }
    }

    /// Creates a truncated file error.
    pub fn truncated(offset: u64, needed: usize) -> Self {
        Self::TruncatedFile { offset, needed }
    }

    /// Returns true if this error indicates a corrupt or foreign file rather
    /// than an environment failure.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::MissingExpaHeader { .. }
                | Self::MissingChnkHeader { .. }
                | Self::StructureSizeMismatch { .. }
                | Self::TruncatedFile { .. }
        )
    }
}
