//! Row layout and the row codec.
//!
//! A [`Structure`] is an ordered, immutable list of typed fields. It packs a
//! row of [`EntryValue`]s into a fixed-size buffer and back, applying the
//! format's alignment rules and the bit-packing of consecutive bool cells
//! into shared 32-bit words.
//!
//! All three walks (size, encode, decode) share the same gate: before any
//! non-bool field, and before the 33rd consecutive bool, an in-flight bool
//! word is flushed (4 bytes) and the cursor is aligned to the field's
//! alignment. Bool groups therefore never straddle a non-bool field.

use expa_common::constants::{align_up, ROW_STRIDE_ALIGN};
use expa_common::types::{EntryType, EntryValue, StructureEntry};

use crate::chnk::{ChnkEntry, ChnkIndex};
use crate::table::Row;

/// Fill byte for alignment holes in encoded rows.
const ROW_FILL: u8 = 0xCC;

/// An ordered row layout: field order defines on-disk order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Structure {
    entries: Vec<StructureEntry>,
}

impl Structure {
    /// Creates a structure from an ordered field list.
    pub fn new(entries: Vec<StructureEntry>) -> Self {
        Self { entries }
    }

    /// The ordered fields.
    pub fn entries(&self) -> &[StructureEntry] {
        &self.entries
    }

    /// Number of fields.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the structure has no fields.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Packed size of one row in bytes, before stride padding.
    ///
    /// This is the value recorded in a table's metadata.
    pub fn row_size(&self) -> u32 {
        let mut offset = 0u32;
        let mut bit_counter = 0u32;

        for entry in &self.entries {
            let ty = entry.entry_type;
            if ty != EntryType::Bool || bit_counter >= 32 {
                if bit_counter > 0 {
                    offset += 4;
                }
                bit_counter = 0;
                offset = align_up(offset, ty.alignment());
            }
            if ty == EntryType::Bool {
                bit_counter += 1;
            } else {
                offset += ty.size();
            }
        }

        if bit_counter > 0 {
            offset += 4;
        }
        offset
    }

    /// Size of one encoded row in bytes: [`Structure::row_size`] rounded up
    /// to the 8-byte row stride.
    pub fn encoded_row_size(&self) -> u32 {
        align_up(self.row_size(), ROW_STRIDE_ALIGN)
    }

    /// Encodes one row into `dst`.
    ///
    /// Writes exactly [`Structure::encoded_row_size`] bytes at the start of
    /// `dst`; alignment holes are filled with `0xCC`. `base_offset` is the
    /// row's absolute file offset, used to address the pointer slots of the
    /// returned CHNK patches.
    ///
    /// # Panics
    ///
    /// Panics if the row length or any value's variant does not match the
    /// structure; codec inputs are pre-validated by contract.
    pub fn encode_row(&self, base_offset: u32, dst: &mut [u8], row: &Row) -> Vec<ChnkEntry> {
        assert_eq!(
            row.len(),
            self.entries.len(),
            "row has {} cells, structure has {} fields",
            row.len(),
            self.entries.len()
        );
        let encoded_size = self.encoded_row_size() as usize;
        dst[..encoded_size].fill(ROW_FILL);

        let mut offset = 0usize;
        let mut bit_counter = 0u32;
        let mut bool_word = 0u32;
        let mut patches = Vec::new();

        for (entry, value) in self.entries.iter().zip(row) {
            let ty = entry.entry_type;

            if ty != EntryType::Bool || bit_counter >= 32 {
                if bit_counter > 0 {
                    dst[offset..offset + 4].copy_from_slice(&bool_word.to_le_bytes());
                    offset += 4;
                    bit_counter = 0;
                    bool_word = 0;
                }
                offset = align_up(offset as u32, ty.alignment()) as usize;
            }

            match ty {
                EntryType::Unk0 | EntryType::Unk1 | EntryType::Empty => {}
                EntryType::Bool => {
                    if expect_match(entry, value).as_bool().unwrap() {
                        bool_word |= 1 << bit_counter;
                    }
                    bit_counter += 1;
                    continue;
                }
                EntryType::Int8 => {
                    let v = expect_match(entry, value).as_i8().unwrap();
                    dst[offset] = v as u8;
                }
                EntryType::Int16 => {
                    let v = expect_match(entry, value).as_i16().unwrap();
                    dst[offset..offset + 2].copy_from_slice(&v.to_le_bytes());
                }
                EntryType::Int32 => {
                    let v = expect_match(entry, value).as_i32().unwrap();
                    dst[offset..offset + 4].copy_from_slice(&v.to_le_bytes());
                }
                EntryType::Float => {
                    let v = expect_match(entry, value).as_f32().unwrap();
                    dst[offset..offset + 4].copy_from_slice(&v.to_le_bytes());
                }
                EntryType::String | EntryType::String2 | EntryType::String3 => {
                    let s = expect_match(entry, value).as_str().unwrap();
                    dst[offset..offset + 8].fill(0);
                    if !s.is_empty() {
                        patches.push(ChnkEntry::for_string(base_offset + offset as u32, s));
                    }
                }
                EntryType::IntArray => {
                    let values = expect_match(entry, value).as_int_array().unwrap();
                    dst[offset..offset + 4].copy_from_slice(&(values.len() as u32).to_le_bytes());
                    dst[offset + 4..offset + 16].fill(0);
                    if !values.is_empty() {
                        patches.push(ChnkEntry::for_ints(
                            base_offset + offset as u32 + 8,
                            values,
                        ));
                    }
                }
            }

            offset += ty.size() as usize;
        }

        if bit_counter > 0 {
            dst[offset..offset + 4].copy_from_slice(&bool_word.to_le_bytes());
        }

        patches
    }

    /// Decodes one row from `src`.
    ///
    /// `src` must hold at least [`Structure::encoded_row_size`] bytes of the
    /// row region; the container validates region bounds before slicing.
    /// `base_offset` is the row's absolute file offset; string and int-array
    /// cells resolve their payloads through `chnk` at
    /// `base_offset + slot offset`.
    pub fn decode_row(&self, base_offset: u32, src: &[u8], chnk: &ChnkIndex) -> Row {
        debug_assert!(src.len() >= self.encoded_row_size() as usize);

        let mut values = Vec::with_capacity(self.entries.len());
        let mut offset = 0usize;
        let mut bit_counter = 0u32;

        for entry in &self.entries {
            let ty = entry.entry_type;

            if ty != EntryType::Bool || bit_counter >= 32 {
                if bit_counter > 0 {
                    offset += 4;
                }
                bit_counter = 0;
                offset = align_up(offset as u32, ty.alignment()) as usize;
            }

            let value = match ty {
                EntryType::Unk0 | EntryType::Unk1 | EntryType::Empty => EntryValue::None,
                EntryType::Bool => {
                    let word = read_u32(src, offset);
                    let bit = (word >> bit_counter) & 1 == 1;
                    bit_counter += 1;
                    values.push(EntryValue::Bool(bit));
                    continue;
                }
                EntryType::Int8 => EntryValue::Int8(src[offset] as i8),
                EntryType::Int16 => {
                    EntryValue::Int16(i16::from_le_bytes([src[offset], src[offset + 1]]))
                }
                EntryType::Int32 => EntryValue::Int32(read_u32(src, offset) as i32),
                EntryType::Float => EntryValue::Float(f32::from_le_bytes([
                    src[offset],
                    src[offset + 1],
                    src[offset + 2],
                    src[offset + 3],
                ])),
                EntryType::String | EntryType::String2 | EntryType::String3 => {
                    EntryValue::String(chnk.string_at(base_offset + offset as u32))
                }
                EntryType::IntArray => {
                    let count = read_u32(src, offset);
                    EntryValue::IntArray(chnk.ints_at(base_offset + offset as u32 + 8, count))
                }
            };
            values.push(value);
            offset += ty.size() as usize;
        }

        values
    }
}

fn read_u32(src: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        src[offset],
        src[offset + 1],
        src[offset + 2],
        src[offset + 3],
    ])
}

/// Asserts the value's variant matches the field's type.
fn expect_match<'v>(entry: &StructureEntry, value: &'v EntryValue) -> &'v EntryValue {
    assert!(
        value.matches_type(entry.entry_type),
        "cell '{}' expects {}, got {:?}",
        entry.name,
        entry.entry_type,
        value
    );
    value
}
