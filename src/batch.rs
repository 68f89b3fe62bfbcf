// src/batch.rs
//! Batch driver: CSV of addresses in, CSV of best matches out.
//!
//! Input needs an `address` header column (other columns are ignored). Output columns are
//! `address,matched_address,similarity_score`, one row per input row, in input order.

use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::matcher::AddressMatcher;

pub const DEFAULT_BATCH_INPUT_PATH: &str = "data/addresses.csv";
pub const DEFAULT_BATCH_OUTPUT_PATH: &str = "data/result.csv";
pub const ENV_BATCH_INPUT_PATH: &str = "BATCH_INPUT_PATH";
pub const ENV_BATCH_OUTPUT_PATH: &str = "BATCH_OUTPUT_PATH";

const ADDRESS_COLUMN: &str = "address";
const PROGRESS_EVERY: usize = 25;

/// One output row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchRow {
    pub address: String,
    pub matched_address: String,
    pub similarity_score: f64,
}

impl BatchRow {
    fn empty(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            matched_address: String::new(),
            similarity_score: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub rows: usize,
    pub matched: usize,
    pub blank: usize,
    pub failed: usize,
}

/// Resolved (input, output) paths from env, else defaults.
pub fn paths_from_env() -> (PathBuf, PathBuf) {
    let input = std::env::var(ENV_BATCH_INPUT_PATH)
        .unwrap_or_else(|_| DEFAULT_BATCH_INPUT_PATH.to_string());
    let output = std::env::var(ENV_BATCH_OUTPUT_PATH)
        .unwrap_or_else(|_| DEFAULT_BATCH_OUTPUT_PATH.to_string());
    (PathBuf::from(input), PathBuf::from(output))
}

/// Read the `address` column. Unreadable rows come back as `Err` so the caller can
/// record them without aborting the run.
pub fn read_addresses(path: &Path) -> Result<Vec<Result<String>>> {
    if !path.exists() {
        bail!("input file not found: {}", path.display());
    }
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(BufReader::new(file));

    let headers = reader
        .headers()
        .with_context(|| format!("reading CSV header of {}", path.display()))?
        .clone();
    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        bail!("{} has no header row", path.display());
    }
    let col = headers
        .iter()
        .position(|h| h.trim() == ADDRESS_COLUMN)
        .ok_or_else(|| {
            anyhow!(
                "{} must contain an '{ADDRESS_COLUMN}' column (found: {})",
                path.display(),
                headers.iter().collect::<Vec<_>>().join(", ")
            )
        })?;

    Ok(reader
        .records()
        .map(|rec| {
            let rec = rec.map_err(|e| anyhow!("bad CSV row: {e}"))?;
            Ok(rec.get(col).unwrap_or_default().to_string())
        })
        .collect())
}

/// Write rows with a header, creating the parent directory if needed.
pub fn write_results(path: &Path, rows: &[BatchRow]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {}", parent.display()))?;
    }
    let mut w = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    w.write_record(["address", "matched_address", "similarity_score"])?;
    for r in rows {
        let score = format!("{:.3}", r.similarity_score);
        w.write_record([r.address.as_str(), r.matched_address.as_str(), score.as_str()])?;
    }
    w.flush()
        .with_context(|| format!("flushing {}", path.display()))?;
    Ok(())
}

/// Match every input row and write the result file.
pub async fn run_batch(
    matcher: &AddressMatcher,
    input: &Path,
    output: &Path,
) -> Result<BatchSummary> {
    let addresses = read_addresses(input)?;
    let total = addresses.len();
    tracing::info!(
        input = %input.display(),
        rows = total,
        geocoder = matcher.geocoder_name(),
        "batch started"
    );

    let mut summary = BatchSummary::default();
    let mut out = Vec::with_capacity(total);

    for (i, row) in addresses.into_iter().enumerate() {
        summary.rows += 1;
        let result = match row.map(|a| a.trim().to_string()) {
            Ok(address) if address.is_empty() => {
                summary.blank += 1;
                BatchRow::empty(address)
            }
            Ok(address) => {
                let m = matcher.match_address(&address).await;
                if !m.matched_address.is_empty() {
                    summary.matched += 1;
                }
                BatchRow {
                    address,
                    matched_address: m.matched_address,
                    similarity_score: m.match_score,
                }
            }
            Err(e) => {
                tracing::error!(row = i + 1, error = %e, "row failed");
                summary.failed += 1;
                BatchRow::empty("")
            }
        };
        out.push(result);

        if (i + 1) % PROGRESS_EVERY == 0 {
            tracing::info!(done = i + 1, total, "batch progress");
        }
    }

    write_results(output, &out)?;
    tracing::info!(
        output = %output.display(),
        rows = summary.rows,
        matched = summary.matched,
        blank = summary.blank,
        failed = summary.failed,
        "batch finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocode::StaticGeocoder;
    use crate::matcher::MatcherHandle;
    use crate::similarity::SimilarityEngine;
    use std::sync::Arc;

    fn matcher() -> AddressMatcher {
        let geo = StaticGeocoder::new([(
            "123 main st, springfield",
            vec!["123 Main St, Springfield, IL 62704, USA".to_string()],
        )]);
        AddressMatcher::new(MatcherHandle::new(SimilarityEngine::default()), Arc::new(geo))
    }

    #[test]
    fn missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_addresses(&dir.path().join("nope.csv")).is_err());
    }

    #[test]
    fn missing_column_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("in.csv");
        fs::write(&p, "id,street\n1,Main St\n").unwrap();
        let err = read_addresses(&p).unwrap_err().to_string();
        assert!(err.contains("'address'"), "{err}");
    }

    #[test]
    fn empty_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("in.csv");
        fs::write(&p, "").unwrap();
        assert!(read_addresses(&p).is_err());
    }

    #[tokio::test]
    async fn writes_one_row_per_input_row() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.csv");
        let output = dir.path().join("out").join("result.csv");
        fs::write(
            &input,
            "id,address\n1,\"  123 Main St, Springfield \"\n2,\"   \"\n3,Nowhere Lane\n",
        )
        .unwrap();

        let s = run_batch(&matcher(), &input, &output).await.unwrap();
        assert_eq!(s.rows, 3);
        assert_eq!(s.matched, 1);
        assert_eq!(s.blank, 1);

        let mut r = csv::Reader::from_path(&output).unwrap();
        let headers: Vec<String> = r.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, ["address", "matched_address", "similarity_score"]);
        let rows: Vec<csv::StringRecord> = r.records().map(|x| x.unwrap()).collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(&rows[0][0], "123 Main St, Springfield");
        assert_eq!(&rows[0][1], "123 Main St, Springfield, IL 62704, USA");
        assert!(rows[0][2].parse::<f64>().unwrap() > 0.5);
        assert_eq!(&rows[1][0], "");
        assert_eq!(&rows[1][1], "");
        assert_eq!(&rows[1][2], "0.000");
        assert_eq!(&rows[2][1], "");
    }
}
