//! EXPA container reader.
//!
//! Reading is whole-file: the file is slurped into memory, headers and
//! per-table metadata are walked once, the CHNK section is folded into a
//! [`ChnkIndex`], and only then are rows decoded. No partial [`TableFile`]
//! is ever returned on error.

use std::path::Path;

use bytes::Bytes;

use expa_common::constants::{align_up, CHNK_MAGIC, EXPA_MAGIC, ROW_STRIDE_ALIGN};

use crate::chnk::ChnkIndex;
use crate::dialect::Dialect;
use crate::error::{ExpaError, ExpaResult};
use crate::resolver::StructureResolver;
use crate::structure::Structure;
use crate::table::{Table, TableFile};

/// A table located during the metadata walk, decoded after the CHNK pass.
struct PendingTable {
    name: String,
    structure: Structure,
    data_offset: usize,
    row_count: u32,
    stride: usize,
}

/// Bounds-checked cursor over the in-memory file image.
struct FileCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> FileCursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn position(&self) -> usize {
        self.pos
    }

    fn align_to(&mut self, step: u32) {
        self.pos = align_up(self.pos as u32, step) as usize;
    }

    fn take(&mut self, len: usize) -> ExpaResult<&'a [u8]> {
        if self.pos + len > self.buf.len() {
            return Err(ExpaError::truncated(self.pos as u64, len));
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn skip(&mut self, len: usize) -> ExpaResult<()> {
        self.take(len).map(|_| ())
    }

    fn read_u32(&mut self) -> ExpaResult<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

/// Reads an EXPA container in dialect `D`, resolving table structures
/// through `resolver`.
pub fn read_expa<D: Dialect>(
    path: impl AsRef<Path>,
    resolver: &StructureResolver,
) -> ExpaResult<TableFile> {
    let path = path.as_ref();
    let content = std::fs::read(path)?;
    let mut cursor = FileCursor::new(&content);

    let magic = cursor.read_u32()?;
    if magic != EXPA_MAGIC {
        return Err(ExpaError::MissingExpaHeader { found: magic });
    }
    let table_count = cursor.read_u32()?;

    let mut pending = Vec::with_capacity(table_count as usize);
    for _ in 0..table_count {
        cursor.align_to(D::ALIGN_STEP);

        let name_size = cursor.read_u32()?;
        let name = read_name(cursor.take(name_size as usize)?);

        let structure = if D::HAS_STRUCTURE_SECTION {
            let field_count = cursor.read_u32()?;
            let mut codes = Vec::with_capacity(field_count as usize);
            for _ in 0..field_count {
                codes.push(cursor.read_u32()?);
            }
            resolver.resolve_with_preamble(path, &name, &codes)
        } else {
            resolver.resolve(path, &name)
        };

        let row_size = cursor.read_u32()?;
        let row_count = cursor.read_u32()?;

        let stride = align_up(row_size, ROW_STRIDE_ALIGN);
        if structure.encoded_row_size() != stride {
            return Err(ExpaError::size_mismatch(
                name,
                row_size,
                structure.row_size(),
            ));
        }

        cursor.align_to(ROW_STRIDE_ALIGN);
        let data_offset = cursor.position();
        cursor.skip(row_count as usize * stride as usize)?;

        pending.push(PendingTable {
            name,
            structure,
            data_offset,
            row_count,
            stride: stride as usize,
        });
    }

    cursor.align_to(D::ALIGN_STEP);
    let magic = cursor.read_u32()?;
    if magic != CHNK_MAGIC {
        return Err(ExpaError::MissingChnkHeader { found: magic });
    }
    let chnk_count = cursor.read_u32()?;

    let mut chnk = ChnkIndex::new();
    for _ in 0..chnk_count {
        let row_offset = cursor.read_u32()?;
        let payload_size = cursor.read_u32()?;
        let payload = cursor.take(payload_size as usize)?;
        chnk.insert(row_offset, Bytes::copy_from_slice(payload));
    }

    let mut tables = Vec::with_capacity(pending.len());
    for table in pending {
        let mut rows = Vec::with_capacity(table.row_count as usize);
        for index in 0..table.row_count as usize {
            let start = table.data_offset + index * table.stride;
            let row = table.structure.decode_row(
                start as u32,
                &content[start..start + table.stride],
                &chnk,
            );
            rows.push(row);
        }
        tracing::debug!(
            dialect = D::NAME,
            table = %table.name,
            rows = table.row_count,
            fields = table.structure.entry_count(),
            "decoded table"
        );
        tables.push(Table::new(table.name, table.structure, rows));
    }

    Ok(TableFile::new(tables))
}

/// Extracts a table name: the bytes up to the first NUL of its padded slot.
fn read_name(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}
