//! CHNK payload handling.
//!
//! Variable-length cell payloads (strings, integer arrays) live in the CHNK
//! section that trails all row regions. While encoding, every non-empty
//! payload becomes a [`ChnkEntry`]: a deferred patch naming the absolute
//! file offset of the row's 64-bit pointer slot and the payload bytes to
//! store. While decoding, the CHNK section is folded into a [`ChnkIndex`]
//! mapping slot offsets back to payload bytes, which the row codec consults
//! instead of reinterpreting patched pointers.

use std::collections::HashMap;

use bytes::{BufMut, Bytes, BytesMut};

use expa_common::constants::{align_up, NAME_PAD};

/// A deferred pointer patch produced while encoding a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChnkEntry {
    /// Absolute file offset of the 64-bit pointer slot inside the row
    /// region.
    pub row_offset: u32,
    /// Payload bytes stored in the CHNK section.
    pub payload: Bytes,
}

impl ChnkEntry {
    /// Creates an entry for a string cell.
    ///
    /// The payload is the UTF-8 bytes plus a NUL terminator, zero-padded to
    /// a 4-byte multiple.
    pub fn for_string(row_offset: u32, value: &str) -> Self {
        let padded = align_up(value.len() as u32 + 1, NAME_PAD) as usize;
        let mut buf = BytesMut::zeroed(padded);
        buf[..value.len()].copy_from_slice(value.as_bytes());
        Self {
            row_offset,
            payload: buf.freeze(),
        }
    }

    /// Creates an entry for an int-array cell: the raw little-endian i32
    /// values, no padding.
    pub fn for_ints(row_offset: u32, values: &[i32]) -> Self {
        let mut buf = BytesMut::with_capacity(values.len() * 4);
        for v in values {
            buf.put_i32_le(*v);
        }
        Self {
            row_offset,
            payload: buf.freeze(),
        }
    }

    /// Payload size in bytes.
    pub fn payload_size(&self) -> u32 {
        self.payload.len() as u32
    }
}

/// Read-side index of the CHNK section: pointer slot offset → payload.
#[derive(Debug, Default)]
pub struct ChnkIndex {
    slots: HashMap<u32, Bytes>,
}

impl ChnkIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the payload patched into the pointer slot at `row_offset`.
    pub fn insert(&mut self, row_offset: u32, payload: Bytes) {
        self.slots.insert(row_offset, payload);
    }

    /// Number of recorded payloads.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if no payloads are recorded.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Decodes the string payload patched at `row_offset`.
    ///
    /// A slot with no payload is the null-pointer case and yields the empty
    /// string. The payload is read up to its first NUL.
    pub fn string_at(&self, row_offset: u32) -> String {
        let Some(payload) = self.slots.get(&row_offset) else {
            return String::new();
        };
        let end = payload
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(payload.len());
        String::from_utf8_lossy(&payload[..end]).into_owned()
    }

    /// Decodes `count` little-endian i32 values from the payload patched at
    /// `row_offset`.
    ///
    /// A missing payload yields an empty array; a short payload yields as
    /// many whole values as it holds.
    pub fn ints_at(&self, row_offset: u32, count: u32) -> Vec<i32> {
        let Some(payload) = self.slots.get(&row_offset) else {
            return Vec::new();
        };
        payload
            .chunks_exact(4)
            .take(count as usize)
            .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }
}
