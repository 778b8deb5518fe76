//! NPY v1.0 matrix persistence.
//!
//! The generate stage persists its two tables as raw numeric arrays: a
//! fixed header (magic, version, ASCII dict) followed by little-endian
//! `<i8` values in C order. Exactly that dtype and layout is supported;
//! anything else is a format error, never a panic.

use crate::error::{EtlError, EtlResult};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

const MAGIC: &[u8; 6] = b"\x93NUMPY";

/// Write a rectangular i64 matrix. The header is space-padded so the
/// data section starts 64-byte aligned.
pub fn write_i64_matrix(path: &Path, rows: &[Vec<i64>]) -> EtlResult<()> {
    let cols = rows.first().map(|r| r.len()).unwrap_or(0);
    assert!(
        rows.iter().all(|r| r.len() == cols),
        "matrix rows must be uniform width"
    );
    let header_dict = format!(
        "{{'descr': '<i8', 'fortran_order': False, 'shape': ({}, {}), }}",
        rows.len(),
        cols
    );
    let unpadded = MAGIC.len() + 2 + 2 + header_dict.len() + 1;
    let padding = (64 - unpadded % 64) % 64;
    let header_len = header_dict.len() + padding + 1;

    let mut w = BufWriter::new(File::create(path)?);
    w.write_all(MAGIC)?;
    w.write_all(&[1, 0])?;
    w.write_all(&(header_len as u16).to_le_bytes())?;
    w.write_all(header_dict.as_bytes())?;
    w.write_all(&vec![b' '; padding])?;
    w.write_all(b"\n")?;
    for row in rows {
        for v in row {
            w.write_all(&v.to_le_bytes())?;
        }
    }
    w.flush()?;
    Ok(())
}

/// Read a matrix previously written by write_i64_matrix (or by any
/// producer of 2-D C-order `<i8` arrays).
pub fn read_i64_matrix(path: &Path) -> EtlResult<Vec<Vec<i64>>> {
    let fail = |reason: &str| EtlError::Npy {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    let mut r = BufReader::new(File::open(path)?);
    let mut preamble = [0u8; 8];
    r.read_exact(&mut preamble).map_err(|_| fail("truncated preamble"))?;
    if &preamble[..6] != MAGIC {
        return Err(fail("bad magic"));
    }
    if preamble[6] != 1 {
        return Err(fail("unsupported format version"));
    }

    let mut len_bytes = [0u8; 2];
    r.read_exact(&mut len_bytes).map_err(|_| fail("truncated header length"))?;
    let header_len = u16::from_le_bytes(len_bytes) as usize;
    let mut header_bytes = vec![0u8; header_len];
    r.read_exact(&mut header_bytes).map_err(|_| fail("truncated header"))?;
    let header =
        std::str::from_utf8(&header_bytes).map_err(|_| fail("header is not ASCII"))?;

    if !header.contains("'descr': '<i8'") {
        return Err(fail("unsupported dtype (expected <i8)"));
    }
    if !header.contains("'fortran_order': False") {
        return Err(fail("fortran order not supported"));
    }
    let (rows, cols) = parse_shape(header).ok_or_else(|| fail("missing 2-D shape"))?;

    let mut data = Vec::with_capacity(rows);
    let mut buf = [0u8; 8];
    for _ in 0..rows {
        let mut row = Vec::with_capacity(cols);
        for _ in 0..cols {
            r.read_exact(&mut buf).map_err(|_| fail("truncated data"))?;
            row.push(i64::from_le_bytes(buf));
        }
        data.push(row);
    }
    Ok(data)
}

fn parse_shape(header: &str) -> Option<(usize, usize)> {
    let start = header.find("'shape':")? + "'shape':".len();
    let open = header[start..].find('(')? + start + 1;
    let close = header[open..].find(')')? + open;
    let mut parts = header[open..close]
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let rows = parts.next()?.parse().ok()?;
    let cols = parts.next()?.parse().ok()?;
    Some((rows, cols))
}
