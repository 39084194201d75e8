//! Train/test splitting

use crate::error::{PipelineError, Result};
use crate::sampling::{check_aligned, class_indices};
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// A train/test partition of features and labels
#[derive(Debug, Clone)]
pub struct DataSplit {
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Array1<i64>,
    pub y_test: Array1<i64>,
}

/// Number of test rows for a fraction of `n`, rounded up
fn test_rows(n: usize, test_size: f64) -> usize {
    (test_size * n as f64).ceil() as usize
}

/// Split rows into train and test sets.
///
/// With `stratify`, every class keeps its share of the test set (largest
/// remainder allocation). Stratification never degrades silently: a class
/// with fewer than two members is an error.
pub fn train_test_split(
    x: &Array2<f64>,
    y: &Array1<i64>,
    test_size: f64,
    random_state: u64,
    stratify: bool,
) -> Result<DataSplit> {
    check_aligned(x, y)?;
    let n = x.nrows();
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(PipelineError::config_field(
            "test_size",
            format!("must be in (0, 1), got {}", test_size),
        ));
    }

    let n_test = test_rows(n, test_size);
    let n_train = n.saturating_sub(n_test);
    if n_test == 0 || n_train == 0 {
        return Err(PipelineError::Split(format!(
            "test_size={} on {} rows leaves an empty train or test set",
            test_size, n
        )));
    }

    let mut rng = ChaCha8Rng::seed_from_u64(random_state);

    let (mut train_indices, mut test_indices) = if stratify {
        stratified_indices(y, n_test, n_train, &mut rng)?
    } else {
        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(&mut rng);
        let test = indices[..n_test].to_vec();
        let train = indices[n_test..].to_vec();
        (train, test)
    };

    train_indices.shuffle(&mut rng);
    test_indices.shuffle(&mut rng);

    Ok(DataSplit {
        x_train: x.select(Axis(0), &train_indices),
        x_test: x.select(Axis(0), &test_indices),
        y_train: Array1::from_iter(train_indices.iter().map(|&i| y[i])),
        y_test: Array1::from_iter(test_indices.iter().map(|&i| y[i])),
    })
}

fn stratified_indices(
    y: &Array1<i64>,
    n_test: usize,
    n_train: usize,
    rng: &mut ChaCha8Rng,
) -> Result<(Vec<usize>, Vec<usize>)> {
    let n = y.len();
    let mut class_idx = class_indices(y);
    let n_classes = class_idx.len();

    if let Some((class, members)) = class_idx.iter().find(|(_, idx)| idx.len() < 2) {
        return Err(PipelineError::Split(format!(
            "the least populated class {} has only {} member; stratified splitting needs at least 2",
            class,
            members.len()
        )));
    }
    if n_test < n_classes {
        return Err(PipelineError::Split(format!(
            "test set of {} rows cannot hold all {} classes",
            n_test, n_classes
        )));
    }
    if n_train < n_classes {
        return Err(PipelineError::Split(format!(
            "train set of {} rows cannot hold all {} classes",
            n_train, n_classes
        )));
    }

    let allocation = allocate_test_rows(
        &class_idx.values().map(|v| v.len()).collect::<Vec<_>>(),
        n_test,
        n,
    );

    let mut train_indices = Vec::with_capacity(n_train);
    let mut test_indices = Vec::with_capacity(n_test);

    for (indices, &class_test) in class_idx.values_mut().zip(allocation.iter()) {
        indices.shuffle(rng);
        test_indices.extend_from_slice(&indices[..class_test]);
        train_indices.extend_from_slice(&indices[class_test..]);
    }

    Ok((train_indices, test_indices))
}

/// Distribute `n_test` rows over classes proportionally to their counts.
/// Floors first, then hands the remainder to the largest fractional parts
/// (ties go to the larger, then earlier, class).
fn allocate_test_rows(counts: &[usize], n_test: usize, n: usize) -> Vec<usize> {
    let quotas: Vec<f64> = counts
        .iter()
        .map(|&c| n_test as f64 * c as f64 / n as f64)
        .collect();
    let mut allocation: Vec<usize> = quotas
        .iter()
        .zip(counts)
        .map(|(q, &c)| (q.floor() as usize).min(c))
        .collect();

    let mut remaining = n_test.saturating_sub(allocation.iter().sum());
    let mut order: Vec<usize> = (0..counts.len()).collect();
    order.sort_by(|&a, &b| {
        let fa = quotas[a] - quotas[a].floor();
        let fb = quotas[b] - quotas[b].floor();
        fb.total_cmp(&fa)
            .then(counts[b].cmp(&counts[a]))
            .then(a.cmp(&b))
    });

    while remaining > 0 {
        let before = remaining;
        for &i in &order {
            if remaining == 0 {
                break;
            }
            if allocation[i] < counts[i] {
                allocation[i] += 1;
                remaining -= 1;
            }
        }
        if remaining == before {
            break;
        }
    }

    allocation
}
