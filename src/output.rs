// src/output.rs
//! CSV dataset on disk: `source,date,text`, one row per record.
//!
//! Files are written to a temp sibling and renamed into place, so readers
//! only ever see a complete previous dataset or a complete new one.

use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::ingest::types::{Record, ResultSet};

pub const HEADER: [&str; 3] = ["source", "date", "text"];

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv encoding failed: {0}")]
    Csv(#[from] csv::Error),
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> OutputError + '_ {
    move |source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Encode records with the header row first. An empty slice yields the header only.
pub fn render_csv<'a>(records: impl IntoIterator<Item = &'a Record>) -> Result<Vec<u8>, OutputError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    wtr.write_record(HEADER)?;
    for r in records {
        wtr.serialize(r)?;
    }
    wtr.into_inner()
        .map_err(|e| OutputError::Csv(csv::Error::from(e.into_error())))
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

/// Replace `path` with `bytes` via a temp file in the same directory.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), OutputError> {
    let dir = parent_dir(path);
    std::fs::create_dir_all(dir).map_err(io_err(dir))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err(dir))?;
    tmp.write_all(bytes).map_err(io_err(path))?;
    tmp.as_file().sync_all().map_err(io_err(path))?;
    tmp.persist(path).map_err(|e| OutputError::Io {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

/// Write a header-only file when nothing exists at `path` yet.
/// An existing dataset is left alone. Returns whether a file was created.
pub fn ensure_placeholder(path: &Path) -> Result<bool, OutputError> {
    if path.exists() {
        return Ok(false);
    }
    write_atomic(path, &render_csv(std::iter::empty())?)?;
    tracing::info!(path = %path.display(), "wrote placeholder dataset");
    Ok(true)
}

/// Atomically overwrite `path` with the final result set.
pub fn persist(path: &Path, results: &ResultSet) -> Result<(), OutputError> {
    let bytes = render_csv(results)?;
    write_atomic(path, &bytes)?;
    tracing::info!(path = %path.display(), rows = results.len(), "messages saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::{RawItem, Source};
    use chrono::{TimeZone, Utc};

    #[test]
    fn empty_set_renders_header_only() {
        let out = render_csv(std::iter::empty()).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "source,date,text\n");
    }

    #[test]
    fn rows_quote_commas_and_leave_missing_text_empty() {
        let src = Source::new("https://t.me/CheMed123").unwrap();
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 8, 15, 0).unwrap();
        let mut rs = ResultSet::new();
        rs.extend_from(
            &src,
            vec![
                RawItem {
                    id: Some(1),
                    timestamp: ts,
                    text: Some("Paracetamol, 500mg\nin stock".into()),
                },
                RawItem {
                    id: Some(2),
                    timestamp: ts,
                    text: None,
                },
            ],
        );
        let out = String::from_utf8(render_csv(&rs).unwrap()).unwrap();
        assert_eq!(
            out,
            "source,date,text\n\
             https://t.me/CheMed123,2024-03-01 08:15:00+00:00,\"Paracetamol, 500mg\nin stock\"\n\
             https://t.me/CheMed123,2024-03-01 08:15:00+00:00,\n"
        );
    }

    #[test]
    fn placeholder_does_not_clobber_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("raw").join("scraped_messages.csv");
        assert!(ensure_placeholder(&p).unwrap());
        assert_eq!(std::fs::read_to_string(&p).unwrap(), "source,date,text\n");

        std::fs::write(&p, "source,date,text\nA,x,y\n").unwrap();
        assert!(!ensure_placeholder(&p).unwrap());
        assert_eq!(
            std::fs::read_to_string(&p).unwrap(),
            "source,date,text\nA,x,y\n"
        );
    }
}
