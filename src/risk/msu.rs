use super::{RiskEstimateBuilder, CHECK_INTERVAL};
use crate::engine::AnalysisError;
use crate::metrics::fraction;
use crate::model::MsuStatistics;
use std::collections::HashMap;

/// Upper bound on quasi-identifiers, so attribute subsets fit a `u64` mask.
const MAX_ATTRIBUTES: usize = 64;

pub(super) fn compute(
    builder: &RiskEstimateBuilder,
    max_size: usize,
) -> Result<MsuStatistics, AnalysisError> {
    builder.checkpoint()?;
    let width = builder.columns.len();
    if width > MAX_ATTRIBUTES {
        return Err(AnalysisError::Computation(format!(
            "at most {MAX_ATTRIBUTES} quasi-identifiers are supported, got {width}"
        )));
    }
    let max_size = max_size.clamp(1, width.max(1)).min(width);

    let total = subset_count(width, max_size);
    let rows = &builder.dataset.rows;

    // MSUs found so far per record, as attribute masks.
    let mut found: Vec<Vec<u64>> = vec![Vec::new(); rows.len()];
    for (done, subset) in Subsets::new(width, max_size).enumerate() {
        builder.checkpoint()?;
        let mask = subset.iter().fold(0u64, |m, &i| m | (1 << i));
        let columns: Vec<usize> = subset.iter().map(|&i| builder.columns[i]).collect();

        let mut counts: HashMap<Vec<&str>, u32> = HashMap::new();
        for (i, row) in rows.iter().enumerate() {
            if i % CHECK_INTERVAL == 0 {
                builder.checkpoint()?;
            }
            *counts.entry(builder.project(row, &columns)).or_default() += 1;
        }

        for (i, row) in rows.iter().enumerate() {
            if i % CHECK_INTERVAL == 0 {
                builder.checkpoint()?;
            }
            let unique = counts.get(&builder.project(row, &columns)) == Some(&1);
            // Subsets are visited smallest first, so any earlier hit is a proper subset.
            if unique && !found[i].iter().any(|&m| m & mask == m) {
                found[i].push(mask);
            }
        }

        builder.progress.advance_fraction(done as u64 + 1, total);
    }
    builder.checkpoint()?;

    let mut msu_count = 0u64;
    let mut size_counts = vec![0u64; max_size];
    let mut containing = vec![0u64; width];
    let mut size_sums = vec![0u64; width];
    for &mask in found.iter().flatten() {
        let size = mask.count_ones() as usize;
        msu_count += 1;
        size_counts[size - 1] += 1;
        for (c, (contains, sum)) in containing.iter_mut().zip(size_sums.iter_mut()).enumerate() {
            if mask & (1 << c) != 0 {
                *contains += 1;
                *sum += size as u64;
            }
        }
    }

    builder.progress.advance(100);
    Ok(MsuStatistics {
        attributes: builder.names.clone(),
        msu_count,
        size_distribution: size_counts.iter().map(|&n| fraction(n, msu_count)).collect(),
        column_contribution: containing
            .iter()
            .map(|&n| (msu_count > 0).then(|| fraction(n, msu_count)))
            .collect(),
        column_average_key_size: containing
            .iter()
            .zip(&size_sums)
            .map(|(&n, &sum)| (n > 0).then(|| fraction(sum, n)))
            .collect(),
    })
}

/// Number of non-empty subsets of `0..n` with at most `max_size` elements.
fn subset_count(n: usize, max_size: usize) -> u64 {
    let mut binomial: u128 = 1;
    let mut total: u128 = 0;
    for k in 1..=max_size.min(n) {
        binomial = binomial * (n - k + 1) as u128 / k as u128;
        total += binomial;
    }
    u64::try_from(total).unwrap_or(u64::MAX)
}

/// Lazily enumerates the non-empty subsets of `0..n` with at most `max_size`
/// elements: smaller subsets first, lexicographic within one size.
struct Subsets {
    n: usize,
    max_size: usize,
    current: Vec<usize>,
    done: bool,
}

impl Subsets {
    fn new(n: usize, max_size: usize) -> Self {
        Self {
            n,
            max_size: max_size.min(n),
            current: Vec::new(),
            done: false,
        }
    }
}

impl Iterator for Subsets {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        if self.done {
            return None;
        }
        let size = self.current.len();
        // Rightmost index that can still move forward.
        let movable = (0..size)
            .rev()
            .find(|&i| self.current[i] < self.n - size + i);
        match movable {
            Some(pos) => {
                self.current[pos] += 1;
                for i in pos + 1..size {
                    self.current[i] = self.current[i - 1] + 1;
                }
            }
            None if size < self.max_size => self.current = (0..=size).collect(),
            None => {
                self.done = true;
                return None;
            }
        }
        Some(self.current.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::super::dataset_from;
    use super::*;
    use crate::engine::Interruptible;
    use pretty_assertions::assert_eq;

    #[test]
    fn subsets_grow_in_size_then_lexicographically() {
        let subsets: Vec<Vec<usize>> = Subsets::new(3, 2).collect();
        assert_eq!(
            subsets,
            vec![
                vec![0],
                vec![1],
                vec![2],
                vec![0, 1],
                vec![0, 2],
                vec![1, 2]
            ]
        );
        assert_eq!(Subsets::new(3, 9).count(), 7);
        assert_eq!(Subsets::new(0, 2).count(), 0);
        assert_eq!(Subsets::new(4, 0).count(), 0);
    }

    #[test]
    fn subset_count_matches_enumeration() {
        for n in 0..8 {
            for max in 0..=n + 1 {
                assert_eq!(subset_count(n, max), Subsets::new(n, max).count() as u64);
            }
        }
        assert_eq!(subset_count(64, 64), u64::MAX);
        assert_eq!(subset_count(40, 1), 40);
    }

    #[test]
    fn wide_search_stops_promptly_when_interrupted() {
        // 2^24 subsets: far more than can be searched before the interrupt lands.
        let names: Vec<String> = (0..24).map(|i| format!("q{i}")).collect();
        let attributes: Vec<&str> = names.iter().map(String::as_str).collect();
        let row_a: Vec<&str> = vec!["0"; 24];
        let row_b: Vec<&str> = vec!["1"; 24];
        let dataset = dataset_from(&attributes, &[row_a.as_slice(), row_b.as_slice()]);
        let builder = std::sync::Arc::new(RiskEstimateBuilder::new(dataset, &names).unwrap());

        let worker = {
            let builder = builder.clone();
            std::thread::spawn(move || builder.msu_statistics(24))
        };
        std::thread::sleep(std::time::Duration::from_millis(20));
        let interrupted_at = std::time::Instant::now();
        builder.interrupt();
        let result = worker.join().unwrap();
        let latency = interrupted_at.elapsed();

        assert!(matches!(result, Err(AnalysisError::Interrupted)));
        assert!(latency < std::time::Duration::from_millis(500), "took {latency:?}");
        assert!(builder.progress() < 100);
    }

    #[test]
    fn finds_minimal_sample_uniques() {
        let dataset = dataset_from(
            &["zip", "age", "sex"],
            &[
                &["1", "30", "f"],
                &["2", "30", "m"],
                &["2", "40", "f"],
                &["2", "40", "m"],
                &["2", "30", "f"],
            ],
        );
        let qis = ["zip", "age", "sex"].map(String::from);
        let builder = RiskEstimateBuilder::new(dataset, &qis).unwrap();
        let stats = builder.msu_statistics(2).unwrap();

        // {zip} for row 0; {age, sex} for rows 1, 2 and 3. Every other unique
        // projection contains {zip} and belongs to row 0.
        assert_eq!(stats.msu_count, 4);
        assert_eq!(stats.size_distribution, vec![0.25, 0.75]);
        assert_eq!(
            stats.column_contribution,
            vec![Some(0.25), Some(0.75), Some(0.75)]
        );
        assert_eq!(
            stats.column_average_key_size,
            vec![Some(1.0), Some(2.0), Some(2.0)]
        );
        assert_eq!(builder.progress(), 100);
    }

    #[test]
    fn supersets_of_an_msu_are_not_counted() {
        let dataset = dataset_from(&["a", "b"], &[&["x", "1"], &["y", "1"]]);
        let qis = ["a", "b"].map(String::from);
        let builder = RiskEstimateBuilder::new(dataset, &qis).unwrap();
        let stats = builder.msu_statistics(2).unwrap();

        // Both rows are unique on `a`; {a,b} is never minimal.
        assert_eq!(stats.msu_count, 2);
        assert_eq!(stats.size_distribution, vec![1.0, 0.0]);
        assert_eq!(stats.column_contribution, vec![Some(1.0), Some(0.0)]);
        assert_eq!(stats.column_average_key_size, vec![Some(1.0), None]);
    }

    #[test]
    fn no_uniques_means_no_contributions() {
        let dataset = dataset_from(&["a"], &[&["x"], &["x"]]);
        let builder = RiskEstimateBuilder::new(dataset, &["a".to_string()]).unwrap();
        let stats = builder.msu_statistics(3).unwrap();

        assert_eq!(stats.msu_count, 0);
        assert_eq!(stats.size_distribution, vec![0.0]);
        assert_eq!(stats.column_contribution, vec![None]);
        assert_eq!(stats.column_average_key_size, vec![None]);
    }
}
