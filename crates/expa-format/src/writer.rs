//! EXPA container writer.
//!
//! Writing composes the whole file in memory, since CHNK patches name
//! absolute file offsets, and flushes it to the target path once. Section
//! order: EXPA header, per-table metadata and row regions, CHNK header,
//! CHNK entries in emission order.

use std::path::Path;

use bytes::{BufMut, BytesMut};

use expa_common::constants::{
    align_up, CHNK_MAGIC, EXPA_MAGIC, NAME_PAD, ROW_STRIDE_ALIGN,
};

use crate::chnk::ChnkEntry;
use crate::dialect::Dialect;
use crate::error::ExpaResult;
use crate::table::TableFile;

/// Growable file image with absolute-offset bookkeeping.
struct FileComposer {
    buf: BytesMut,
}

impl FileComposer {
    fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(4096),
        }
    }

    fn position(&self) -> u32 {
        self.buf.len() as u32
    }

    /// Pads with zero bytes up to the next multiple of `step`.
    fn align_to(&mut self, step: u32) {
        let target = align_up(self.position(), step);
        self.buf.resize(target as usize, 0);
    }

    fn put_u32(&mut self, value: u32) {
        self.buf.put_u32_le(value);
    }

    fn put_slice(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
    }

    /// Writes `name` NUL-terminated and zero-padded to `padded_len` bytes.
    fn put_name(&mut self, name: &str, padded_len: u32) {
        self.buf.put_slice(name.as_bytes());
        self.buf
            .resize(self.buf.len() + padded_len as usize - name.len(), 0);
    }
}

/// Writes a [`TableFile`] as an EXPA container in dialect `D`.
pub fn write_expa<D: Dialect>(file: &TableFile, path: impl AsRef<Path>) -> ExpaResult<()> {
    let mut out = FileComposer::new();
    let mut chnk: Vec<ChnkEntry> = Vec::new();

    out.put_u32(EXPA_MAGIC);
    out.put_u32(file.tables.len() as u32);

    for table in &file.tables {
        out.align_to(D::ALIGN_STEP);

        let name_size = align_up(table.name.len() as u32 + 1, NAME_PAD);
        out.put_u32(name_size);
        out.put_name(&table.name, name_size);

        if D::HAS_STRUCTURE_SECTION {
            out.put_u32(table.structure.entry_count() as u32);
            for entry in table.structure.entries() {
                out.put_u32(entry.entry_type.as_u32());
            }
        }

        out.put_u32(table.structure.row_size());
        out.put_u32(table.rows.len() as u32);

        out.align_to(ROW_STRIDE_ALIGN);

        let stride = table.structure.encoded_row_size() as usize;
        let mut row_buf = vec![0u8; stride];
        for row in &table.rows {
            let base_offset = out.position();
            chnk.extend(table.structure.encode_row(base_offset, &mut row_buf, row));
            out.put_slice(&row_buf);
        }

        tracing::debug!(
            dialect = D::NAME,
            table = %table.name,
            rows = table.rows.len(),
            "encoded table"
        );
    }

    out.align_to(D::ALIGN_STEP);
    out.put_u32(CHNK_MAGIC);
    out.put_u32(chnk.len() as u32);
    for entry in &chnk {
        out.put_u32(entry.row_offset);
        out.put_u32(entry.payload_size());
        out.put_slice(&entry.payload);
    }

    std::fs::write(path, &out.buf)?;
    Ok(())
}
