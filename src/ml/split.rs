//! Stratified train/test partitioning.

use crate::error::{AppError, Result};
use crate::ml::models::LabeledTable;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;

/// Row indices of a train/test partition, each in ascending order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Partition rows so each side keeps the label ratio of the full table.
///
/// The test side receives `ceil(n * test_size)` rows distributed over the
/// classes by largest remainder; every class keeps at least one row on each
/// side. Class members are shuffled with a `StdRng` seeded from `seed`.
pub fn stratified_split(labels: &[usize], test_size: f64, seed: u64) -> Result<SplitIndices> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(AppError::Validation(format!(
            "test_size must be in (0, 1), got {}",
            test_size
        )));
    }

    let mut members: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (idx, &label) in labels.iter().enumerate() {
        members.entry(label).or_default().push(idx);
    }

    if let Some((&label, rows)) = members.iter().find(|(_, rows)| rows.len() < 2) {
        return Err(AppError::InsufficientStratumSize {
            label,
            count: rows.len(),
        });
    }

    let n = labels.len();
    let n_test = (n as f64 * test_size).ceil() as usize;
    let allocation = allocate_test_counts(&members, n, n_test);

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(n - n_test);
    let mut test = Vec::with_capacity(n_test);

    for (label, rows) in &members {
        let mut rows = rows.clone();
        rows.shuffle(&mut rng);

        let take = allocation.get(label).copied().unwrap_or(0);
        test.extend_from_slice(&rows[..take]);
        train.extend_from_slice(&rows[take..]);
    }

    train.sort_unstable();
    test.sort_unstable();

    tracing::debug!(
        n_train = train.len(),
        n_test = test.len(),
        n_classes = members.len(),
        "Stratified split computed"
    );

    Ok(SplitIndices { train, test })
}

/// Split a labeled table into (train, test) tables
pub fn split_table(
    table: &LabeledTable,
    test_size: f64,
    seed: u64,
) -> Result<(LabeledTable, LabeledTable, SplitIndices)> {
    let labels: Vec<usize> = table.labels.to_vec();
    let indices = stratified_split(&labels, test_size, seed)?;

    let train = table.select(&indices.train);
    let test = table.select(&indices.test);

    Ok((train, test, indices))
}

fn allocate_test_counts(
    members: &BTreeMap<usize, Vec<usize>>,
    n: usize,
    n_test: usize,
) -> BTreeMap<usize, usize> {
    let mut allocation = BTreeMap::new();
    let mut remainders = Vec::with_capacity(members.len());
    let mut assigned = 0;

    for (&label, rows) in members {
        let exact = rows.len() as f64 * n_test as f64 / n as f64;
        let base = exact.floor() as usize;
        allocation.insert(label, base);
        remainders.push((label, exact - base as f64));
        assigned += base;
    }

    // Stable sort keeps the lower label first on equal remainders.
    remainders.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    for (label, _) in remainders.iter().take(n_test.saturating_sub(assigned)) {
        if let Some(count) = allocation.get_mut(label) {
            *count += 1;
        }
    }

    for (label, rows) in members {
        if let Some(count) = allocation.get_mut(label) {
            *count = (*count).clamp(1, rows.len() - 1);
        }
    }

    let total: usize = allocation.values().sum();
    if total != n_test {
        tracing::warn!(
            requested = n_test,
            actual = total,
            "Every class needs a row on each side; test partition size adjusted"
        );
    }

    allocation
}
