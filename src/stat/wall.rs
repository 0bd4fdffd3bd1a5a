//! Wall's congruency statistics.
//!
//! Wall (1999) measures how often adjacent segregating sites partition the sample identically,
//! which is sensitive to recombination-free haplotype blocks.

use indexmap::IndexSet;

use crate::{
    derived::{Derived, SiteCounts},
    table::TableView,
};

use super::StatisticError;

/// The sample bipartition induced by a biallelic site: the samples called at the site, and the
/// canonical side of the split (the side containing the lowest-index called sample).
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
struct Partition {
    called: Vec<usize>,
    side: Vec<usize>,
}

impl Partition {
    fn from_site(view: &TableView<'_>, index: usize, counts: &SiteCounts) -> Option<Self> {
        if !counts.is_biallelic() {
            return None;
        }

        let states = view.sites()[index].states();
        let called = (0..view.samples())
            .filter(|&sample| !states[sample].is_missing())
            .collect::<Vec<_>>();

        let first = states[*called.first()?];
        let side = called
            .iter()
            .copied()
            .filter(|&sample| states[sample] == first)
            .collect();

        Some(Self { called, side })
    }
}

fn congruent_partitions(view: &TableView<'_>, derived: &Derived) -> (usize, usize) {
    let partitions = derived
        .counts()
        .iter()
        .enumerate()
        .filter(|(_, counts)| counts.is_segregating())
        .map(|(index, counts)| Partition::from_site(view, index, counts))
        .collect::<Vec<_>>();

    let mut congruent = 0;
    let mut distinct = IndexSet::new();

    for pair in partitions.windows(2) {
        if let (Some(left), Some(right)) = (&pair[0], &pair[1]) {
            if left == right {
                congruent += 1;
                distinct.insert(left.clone());
            }
        }
    }

    (congruent, distinct.len())
}

/// Wall's B: the fraction of adjacent segregating-site pairs that are congruent.
pub(super) fn b(view: &TableView<'_>, derived: &Derived) -> Result<f64, StatisticError> {
    let s = derived.segregating();
    if s < 2 {
        return Err(StatisticError::NoSegregatingSites);
    }

    let (congruent, _) = congruent_partitions(view, derived);
    Ok(congruent as f64 / (s - 1) as f64)
}

/// Wall's B′: the raw count of congruent adjacent segregating-site pairs.
pub(super) fn b_prime(view: &TableView<'_>, derived: &Derived) -> usize {
    congruent_partitions(view, derived).0
}

/// Wall's Q: (B′ + A) / S, with A the number of distinct partitions among congruent pairs.
pub(super) fn q(view: &TableView<'_>, derived: &Derived) -> Result<f64, StatisticError> {
    let s = derived.segregating();
    if s == 0 {
        return Err(StatisticError::NoSegregatingSites);
    }

    let (congruent, distinct) = congruent_partitions(view, derived);
    Ok((congruent + distinct) as f64 / s as f64)
}

#[cfg(test)]
mod tests {
    use crate::{stat::SampleStatistics, table::PolymorphismTable};

    fn stats_for(haplotypes: &[&str]) -> PolymorphismTable {
        let len = haplotypes[0].len();
        let positions = (0..len).map(|i| i as f64 + 1.0).collect::<Vec<_>>();
        PolymorphismTable::from_haplotypes(&positions, haplotypes).unwrap()
    }

    #[test]
    fn test_fully_congruent_block() {
        // Sites 1-3 induce the same split {0,1} vs {2,3}; site 4 a different one
        let table = stats_for(&["1110", "1111", "0000", "0001"]);
        let stats = SampleStatistics::new(table.view()).unwrap();

        assert_eq!(stats.walls_b_prime(), 2);
        assert_approx_eq!(stats.walls_b().unwrap(), 2.0 / 3.0);
        // Two congruent pairs, one distinct partition among them
        assert_approx_eq!(stats.walls_q().unwrap(), 3.0 / 4.0);
    }

    #[test]
    fn test_no_congruent_pairs() {
        let table = stats_for(&["10", "11", "00", "01"]);
        let stats = SampleStatistics::new(table.view()).unwrap();

        assert_eq!(stats.walls_b_prime(), 0);
        assert_approx_eq!(stats.walls_b().unwrap(), 0.0);
        assert_approx_eq!(stats.walls_q().unwrap(), 0.0);
    }

    #[test]
    fn test_complementary_labelling_is_congruent() {
        // Site 2 swaps which allele labels which side; the partition is the same
        let table = stats_for(&["10", "01", "01", "10"]);
        let stats = SampleStatistics::new(table.view()).unwrap();

        assert_eq!(stats.walls_b_prime(), 1);
    }

    #[test]
    fn test_undefined_with_single_segregating_site() {
        let table = stats_for(&["1", "0", "0", "0"]);
        let stats = SampleStatistics::new(table.view()).unwrap();

        assert!(stats.walls_b().is_err());
        assert_approx_eq!(stats.walls_q().unwrap(), 0.0);
    }
}
