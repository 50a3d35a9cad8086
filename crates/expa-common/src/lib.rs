//! # expa-common
//!
//! Cell type system and wire constants for the EXPA container format.
//!
//! This crate provides the foundational types shared by the EXPA reader and
//! writer:
//!
//! - **Types**: cell types ([`EntryType`]), cell values ([`EntryValue`]),
//!   and named fields ([`StructureEntry`])
//! - **Constants**: section magics, alignment steps, and the well-known
//!   schema locations
//!
//! ## Example
//!
//! ```rust
//! use expa_common::types::{EntryType, EntryValue, StructureEntry};
//!
//! let field = StructureEntry::new("hp", EntryType::Int32);
//! let value = EntryValue::Int32(250);
//! assert!(value.matches_type(field.entry_type));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod constants;
pub mod types;

// Re-export commonly used items at the crate root
pub use constants::{align_up, CHNK_MAGIC, EXPA_MAGIC};
pub use types::{EntryType, EntryValue, StructureEntry};
