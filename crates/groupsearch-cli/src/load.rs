//! JSON Lines point loading.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use groupsearch_core::{DistanceMetric, InMemoryCollection, Point, PointId};

const BATCH_SIZE: usize = 1000;

/// JSON Lines record structure
#[derive(Debug, Deserialize)]
struct JsonRecord {
    id: PointId,
    vector: Vec<f32>,
    #[serde(default)]
    payload: Option<serde_json::Value>,
}

/// Load statistics
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadStats {
    /// Non-blank lines read
    pub total: usize,
    /// Points stored
    pub loaded: usize,
    /// Lines skipped (malformed JSON or wrong dimension)
    pub errors: usize,
}

/// Loads a JSONL file into a new in-memory collection.
pub fn load_jsonl(
    path: &Path,
    metric: DistanceMetric,
    dimension: Option<usize>,
) -> Result<(InMemoryCollection, LoadStats)> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open points file {}", path.display()))?;
    read_points(BufReader::with_capacity(128 * 1024, file), metric, dimension)
}

/// Reads points line by line. The dimension is fixed by `dimension` or by
/// the first valid record; records that disagree are skipped.
pub fn read_points<R: BufRead>(
    reader: R,
    metric: DistanceMetric,
    dimension: Option<usize>,
) -> Result<(InMemoryCollection, LoadStats)> {
    let mut stats = LoadStats::default();
    let mut collection = dimension.map(|d| InMemoryCollection::new(d, metric));
    let mut batch: Vec<Point> = Vec::with_capacity(BATCH_SIZE);

    for (index, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read points file")?;
        if line.trim().is_empty() {
            continue;
        }
        stats.total += 1;

        let record: JsonRecord = match serde_json::from_str(&line) {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!(line = index + 1, %err, "skipping malformed point");
                stats.errors += 1;
                continue;
            }
        };
        if record.vector.is_empty() {
            tracing::warn!(line = index + 1, "skipping point with empty vector");
            stats.errors += 1;
            continue;
        }

        let target =
            collection.get_or_insert_with(|| InMemoryCollection::new(record.vector.len(), metric));
        if record.vector.len() != target.dimension() {
            tracing::warn!(
                line = index + 1,
                expected = target.dimension(),
                actual = record.vector.len(),
                "skipping point with wrong dimension"
            );
            stats.errors += 1;
            continue;
        }

        batch.push(Point::new(record.id, record.vector, record.payload));
        if batch.len() >= BATCH_SIZE {
            stats.loaded += target.upsert(batch.drain(..))?;
        }
    }

    let Some(collection) = collection else {
        anyhow::bail!("No valid points found");
    };
    if !batch.is_empty() {
        stats.loaded += collection.upsert(batch)?;
    }

    Ok((collection, stats))
}
