//! # expa-format
//!
//! Reader and writer for the EXPA tabular binary container format.
//!
//! An EXPA file holds named tables of fixed-width rows, followed by a CHNK
//! section storing variable-length payloads (strings, integer arrays)
//! referenced from pointer slots inside the rows. Two dialects coexist:
//! the 32-bit alignment dialect, whose row layouts come from an external
//! schema index, and the 64-bit alignment dialect, which embeds a schema
//! preamble per table.
//!
//! ## Example
//!
//! ```rust,no_run
//! use expa_format::{read_expa_64, write_expa_64};
//!
//! let file = read_expa_64("data/digimon_para.mbe")?;
//! for table in &file.tables {
//!     println!("{}: {} rows", table.name, table.rows.len());
//! }
//! write_expa_64(&file, "out/digimon_para.mbe")?;
//! # Ok::<(), expa_format::ExpaError>(())
//! ```
//!
//! Reads and writes are whole-file and synchronous; no partial result is
//! returned on error.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chnk;
pub mod config;
pub mod dialect;
pub mod error;
pub mod reader;
pub mod resolver;
pub mod structure;
pub mod table;
pub mod writer;

pub use chnk::{ChnkEntry, ChnkIndex};
pub use config::ResolverConfig;
pub use dialect::{Dialect, Expa32, Expa64};
pub use error::{ExpaError, ExpaResult};
pub use reader::read_expa;
pub use resolver::StructureResolver;
pub use structure::Structure;
pub use table::{Row, Table, TableFile};
pub use writer::write_expa;

use std::path::Path;

/// Reads a 32-bit dialect container, resolving structures from the default
/// schema location (`structures/` under the current directory).
pub fn read_expa_32(path: impl AsRef<Path>) -> ExpaResult<TableFile> {
    read_expa::<Expa32>(path, &StructureResolver::default())
}

/// Reads a 32-bit dialect container with an explicit resolver.
pub fn read_expa_32_with(
    path: impl AsRef<Path>,
    resolver: &StructureResolver,
) -> ExpaResult<TableFile> {
    read_expa::<Expa32>(path, resolver)
}

/// Reads a 64-bit dialect container, resolving structures from the default
/// schema location (`structures/` under the current directory).
pub fn read_expa_64(path: impl AsRef<Path>) -> ExpaResult<TableFile> {
    read_expa::<Expa64>(path, &StructureResolver::default())
}

/// Reads a 64-bit dialect container with an explicit resolver.
pub fn read_expa_64_with(
    path: impl AsRef<Path>,
    resolver: &StructureResolver,
) -> ExpaResult<TableFile> {
    read_expa::<Expa64>(path, resolver)
}

/// Writes a 32-bit dialect container.
pub fn write_expa_32(file: &TableFile, path: impl AsRef<Path>) -> ExpaResult<()> {
    write_expa::<Expa32>(file, path)
}

/// Writes a 64-bit dialect container.
pub fn write_expa_64(file: &TableFile, path: impl AsRef<Path>) -> ExpaResult<()> {
    write_expa::<Expa64>(file, path)
}
