//! Structure resolver configuration.

use std::path::{Path, PathBuf};

use expa_common::constants::{STRUCTURE_DIR, STRUCTURE_INDEX};

/// Configuration for [`crate::StructureResolver`].
///
/// The schema root is an explicit parameter rather than ambient process
/// state; the default points at the legacy well-known location,
/// `structures/` under the current directory.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Directory holding the schema index and schema files.
    pub schema_root: PathBuf,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            schema_root: PathBuf::from(STRUCTURE_DIR),
        }
    }
}

impl ResolverConfig {
    /// Creates a configuration rooted at the given directory.
    pub fn new(schema_root: impl Into<PathBuf>) -> Self {
        Self {
            schema_root: schema_root.into(),
        }
    }

    /// Sets the schema root.
    #[must_use]
    pub fn with_schema_root(mut self, schema_root: impl Into<PathBuf>) -> Self {
        self.schema_root = schema_root.into();
        self
    }

    /// Returns the path of the schema index file.
    pub fn index_path(&self) -> PathBuf {
        self.schema_root.join(STRUCTURE_INDEX)
    }

    /// Returns the path of a schema file named by the index.
    pub fn schema_path(&self, file_name: &str) -> PathBuf {
        self.schema_root.join(file_name)
    }

    /// Returns true if the schema root exists and is a directory.
    pub fn schema_root_exists(&self) -> bool {
        self.schema_root.is_dir()
    }

    /// Returns the schema root.
    pub fn schema_root(&self) -> &Path {
        &self.schema_root
    }
}
