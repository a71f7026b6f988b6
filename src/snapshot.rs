//! Snapshot document reading and writing.
//!
//! A snapshot is a pretty-printed JSON array of records, in extraction
//! order. Reading returns the records in file order, untouched.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::info;

use crate::error::{Error, Result};
use crate::record::Record;

/// Encode `records` as an indented JSON array into `writer`.
///
/// # Errors
///
/// Returns [`Error::Serialization`] if encoding or writing fails.
pub fn write_data_set<W: Write>(records: &[Record], writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, records)?;
    Ok(())
}

/// Decode a JSON array of records from `reader`.
///
/// # Errors
///
/// Returns [`Error::Serialization`] if the document is not a valid snapshot.
pub fn read_data_set<R: Read>(reader: R) -> Result<Vec<Record>> {
    Ok(serde_json::from_reader(reader)?)
}

/// Write `records` to the snapshot file at `path`, replacing it.
///
/// Missing parent directories are created. A failed write may leave a
/// truncated file behind.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be created or written, and
/// [`Error::Serialization`] if encoding fails.
pub fn dump_data_set<P: AsRef<Path>>(records: &[Record], path: P) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, records).map_err(|e| codec_error(path, e))?;
    writer.flush().map_err(|e| Error::io(path, e))?;

    info!(path = %path.display(), records = records.len(), "Data set written");
    Ok(())
}

/// Read the snapshot file at `path`.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be opened or read and
/// [`Error::Serialization`] if it is not a valid snapshot.
pub fn load_data_set<P: AsRef<Path>>(path: P) -> Result<Vec<Record>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let records: Vec<Record> =
        serde_json::from_reader(BufReader::new(file)).map_err(|e| codec_error(path, e))?;

    info!(path = %path.display(), records = records.len(), "Data set loaded");
    Ok(records)
}

/// Split a codec failure into a file error and a document error.
fn codec_error(path: &Path, error: serde_json::Error) -> Error {
    if error.is_io() {
        Error::io(path, error.into())
    } else {
        Error::Serialization(error)
    }
}
