//! Type definitions for the EXPA cell system.

mod entry;
mod value;

pub use entry::{EntryType, StructureEntry};
pub use value::EntryValue;
