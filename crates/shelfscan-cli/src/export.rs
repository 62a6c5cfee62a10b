//! Flat-file writers for cleaned products.
//!
//! Both writers emit the fields in [`shelfscan_core::EXPORT_FIELDS`] order and
//! overwrite any existing file.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use shelfscan_core::{CleanedProduct, EXPORT_FIELDS};
use thiserror::Error;

pub(crate) const CSV_FILE: &str = "products.csv";
pub(crate) const JSON_FILE: &str = "products.json";

#[derive(Debug, Error)]
pub(crate) enum ExportError {
    #[error("could not write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV encoding failed for {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("JSON encoding failed for {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn create(path: &Path) -> Result<File, ExportError> {
    File::create(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes `products.csv` under `dir` and returns its path. The header row is
/// written even when `products` is empty.
pub(crate) fn write_csv(dir: &Path, products: &[CleanedProduct]) -> Result<PathBuf, ExportError> {
    let path = dir.join(CSV_FILE);
    let csv_error = |source| ExportError::Csv {
        path: path.clone(),
        source,
    };

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(create(&path)?);
    writer.write_record(EXPORT_FIELDS).map_err(csv_error)?;
    for product in products {
        writer.serialize(product).map_err(csv_error)?;
    }
    writer.flush().map_err(|source| ExportError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Writes `products.json` under `dir` as a pretty-printed array and returns
/// its path.
pub(crate) fn write_json(dir: &Path, products: &[CleanedProduct]) -> Result<PathBuf, ExportError> {
    let path = dir.join(JSON_FILE);
    let mut writer = BufWriter::new(create(&path)?);
    serde_json::to_writer_pretty(&mut writer, products).map_err(|source| ExportError::Json {
        path: path.clone(),
        source,
    })?;
    writer.flush().map_err(|source| ExportError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

#[cfg(test)]
#[path = "export_test.rs"]
mod tests;
