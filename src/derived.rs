//! Quantities derived once from a table view and shared by the statistic modules.

use crate::{
    stat::StatisticError,
    table::{Allele, TableView},
    utils::{harmonic, p_harmonic, pairs},
};

/// Allelic state counts at a single site.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SiteCounts {
    counts: Vec<(u8, usize)>,
    called: usize,
}

impl SiteCounts {
    /// Tallies the states at a site, ignoring missing data.
    pub fn from_states(states: &[Allele]) -> Self {
        let mut counts: Vec<(u8, usize)> = Vec::with_capacity(2);
        let mut called = 0;

        for state in states.iter().filter_map(Allele::observed) {
            called += 1;
            match counts.iter_mut().find(|(s, _)| *s == state) {
                Some((_, count)) => *count += 1,
                None => counts.push((state, 1)),
            }
        }

        Self { counts, called }
    }

    /// The number of samples with a non-missing state.
    pub fn called(&self) -> usize {
        self.called
    }

    /// The number of distinct observed states.
    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    /// The observed states and their counts, in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, usize)> + '_ {
        self.counts.iter().copied()
    }

    /// The count of a particular state.
    pub fn count_of(&self, state: u8) -> usize {
        self.counts
            .iter()
            .find_map(|&(s, count)| (s == state).then_some(count))
            .unwrap_or(0)
    }

    /// Returns `true` if at least two distinct states were observed.
    pub fn is_segregating(&self) -> bool {
        self.distinct() >= 2
    }

    /// Returns `true` if exactly two distinct states were observed.
    pub fn is_biallelic(&self) -> bool {
        self.distinct() == 2
    }

    /// The most common observed state, ties broken toward the smaller state byte.
    pub fn major_state(&self) -> Option<u8> {
        self.counts
            .iter()
            .copied()
            .max_by(|(s1, c1), (s2, c2)| c1.cmp(c2).then(s2.cmp(s1)))
            .map(|(state, _)| state)
    }

    /// The number of pairs of called samples that differ at this site.
    pub fn mismatch_pairs(&self) -> f64 {
        let squares: usize = self.counts.iter().map(|(_, count)| count * count).sum();
        (self.called * self.called - squares) as f64 / 2.0
    }

    /// The probability that two called samples drawn with replacement carry the same state.
    pub fn homozygosity(&self) -> f64 {
        if self.called == 0 {
            return 1.0;
        }

        self.counts
            .iter()
            .map(|&(_, count)| {
                let f = count as f64 / self.called as f64;
                f * f
            })
            .sum()
    }

    /// The number of observed states carried by exactly one sample, at a segregating site.
    pub fn singletons(&self) -> usize {
        if !self.is_segregating() {
            return 0;
        }

        self.counts.iter().filter(|(_, count)| *count == 1).count()
    }

    /// The number of called samples whose state differs from the given ancestral state.
    pub fn derived_count(&self, ancestral: u8) -> usize {
        self.called - self.count_of(ancestral)
    }
}

/// The harmonic-sum coefficient block for a sample of size n.
///
/// Notation follows Fu and Li (1993): `a_n` and `b_n` are the harmonic and squared-harmonic sums
/// to n - 1, `a_n1`/`b_n1` the corresponding sums to n, and `c_n`/`d_n` the combinations entering
/// the D and D* variance estimators. `c_n` and `d_n` are only meaningful for n ≥ 3.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coefficients {
    /// Σ 1/i for i in 1..n.
    pub a_n: f64,
    /// Σ 1/i² for i in 1..n.
    pub b_n: f64,
    /// Σ 1/i for i in 1..=n.
    pub a_n1: f64,
    /// Σ 1/i² for i in 1..=n.
    pub b_n1: f64,
    /// Fu and Li's c_n.
    pub c_n: f64,
    /// Fu and Li's d_n.
    pub d_n: f64,
}

impl Coefficients {
    /// Computes the coefficient block for a sample of size n ≥ 2.
    pub fn new(samples: usize) -> Self {
        let n = samples as f64;
        let a_n = harmonic(samples as u64);
        let b_n = p_harmonic(samples as u64, 2);
        let a_n1 = harmonic(samples as u64 + 1);
        let b_n1 = p_harmonic(samples as u64 + 1, 2);

        let (c_n, d_n) = if samples > 2 {
            let c_n = 2.0 * (n * a_n - 2.0 * (n - 1.0)) / ((n - 1.0) * (n - 2.0));
            let d_n = c_n
                + (n - 2.0) / (n - 1.0).powi(2)
                + 2.0 / (n - 1.0) * (1.5 - (2.0 * a_n1 - 3.0) / (n - 2.0) - 1.0 / n);
            (c_n, d_n)
        } else {
            // Published value for n = 2; d_n is not defined there
            (1.0, 0.0)
        };

        Self {
            a_n,
            b_n,
            a_n1,
            b_n1,
            c_n,
            d_n,
        }
    }
}

/// Quantities computed once per view and reused across statistics.
///
/// Construction is a single O(S·n) pass; everything here is immutable afterwards and valid for
/// exactly the view it was computed from.
#[derive(Clone, Debug)]
pub struct Derived {
    samples: usize,
    counts: Vec<SiteCounts>,
    segregating: usize,
    mutations: usize,
    singletons: usize,
    pairwise_diffs: f64,
    coefficients: Coefficients,
}

impl Derived {
    /// Computes the derived quantities for a view.
    ///
    /// # Errors
    ///
    /// Fails with [`StatisticError::TooFewSamples`] when the view has fewer than two samples.
    pub fn from_view(view: TableView<'_>) -> Result<Self, StatisticError> {
        let samples = view.samples();
        if samples < 2 {
            return Err(StatisticError::TooFewSamples {
                found: samples,
                required: 2,
            });
        }

        let counts = view
            .sites()
            .iter()
            .map(|site| SiteCounts::from_states(site.states()))
            .collect::<Vec<_>>();

        let segregating = counts.iter().filter(|c| c.is_segregating()).count();
        let mutations = counts.iter().map(|c| c.distinct().saturating_sub(1)).sum();
        let singletons = counts.iter().map(SiteCounts::singletons).sum();
        let pairwise_diffs = counts.iter().map(SiteCounts::mismatch_pairs).sum();

        Ok(Self {
            samples,
            counts,
            segregating,
            mutations,
            singletons,
            pairwise_diffs,
            coefficients: Coefficients::new(samples),
        })
    }

    /// The number of sampled haplotypes.
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Per-site state counts, aligned with the view's site indices.
    pub fn counts(&self) -> &[SiteCounts] {
        &self.counts
    }

    /// The number of segregating sites S.
    pub fn segregating(&self) -> usize {
        self.segregating
    }

    /// The total number of mutations η, counting k - 1 mutations at a site with k states.
    pub fn mutations(&self) -> usize {
        self.mutations
    }

    /// The number of singleton alleles across segregating sites.
    pub fn singletons(&self) -> usize {
        self.singletons
    }

    /// The sum of pairwise differences over all sample pairs.
    pub fn pairwise_diffs(&self) -> f64 {
        self.pairwise_diffs
    }

    /// The harmonic-sum coefficient block for the view's sample size.
    pub fn coefficients(&self) -> &Coefficients {
        &self.coefficients
    }

    /// The number of unordered sample pairs.
    pub fn sample_pairs(&self) -> f64 {
        pairs(self.samples)
    }

    /// The unfolded frequency spectrum ξ, given one ancestral state per site.
    ///
    /// `spectrum[i]` is the number of sites at which exactly i called samples carry a derived
    /// state. Sites whose ancestral state is missing are excluded.
    pub fn frequency_spectrum(&self, ancestral: &[Allele]) -> Vec<usize> {
        let mut spectrum = vec![0; self.samples + 1];

        for (counts, state) in self.counts.iter().zip(ancestral.iter()) {
            if let Some(ancestral) = state.observed() {
                spectrum[counts.derived_count(ancestral)] += 1;
            }
        }

        spectrum
    }

    /// The number of external mutations η_e: derived states carried by exactly one sample.
    ///
    /// Sites whose ancestral state is missing are excluded.
    pub fn external_mutations(&self, ancestral: &[Allele]) -> usize {
        self.counts
            .iter()
            .zip(ancestral.iter())
            .filter_map(|(counts, state)| state.observed().map(|ancestral| (counts, ancestral)))
            .map(|(counts, ancestral)| {
                counts
                    .iter()
                    .filter(|&(state, count)| state != ancestral && count == 1)
                    .count()
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use crate::table::PolymorphismTable;

    use super::*;

    fn derived(positions: &[f64], haplotypes: &[&str]) -> Derived {
        let table = PolymorphismTable::from_haplotypes(positions, haplotypes).unwrap();
        let view = table.view();
        Derived::from_view(view).unwrap()
    }

    #[test]
    fn test_site_counts_with_missing() {
        let counts = SiteCounts::from_states(&[
            Allele::from('0'),
            Allele::from('1'),
            Allele::Missing,
            Allele::from('1'),
        ]);

        assert_eq!(counts.called(), 3);
        assert_eq!(counts.distinct(), 2);
        assert_eq!(counts.count_of(b'1'), 2);
        assert_eq!(counts.major_state(), Some(b'1'));
        assert_eq!(counts.singletons(), 1);
        assert_approx_eq!(counts.mismatch_pairs(), 2.0);
    }

    #[test]
    fn test_major_state_tie_breaks_low() {
        let counts = SiteCounts::from_states(&[Allele::from('1'), Allele::from('0')]);
        assert_eq!(counts.major_state(), Some(b'0'));
    }

    #[test]
    fn test_derived_counts() {
        let d = derived(&[1.0, 2.0, 3.0], &["010", "011", "000", "000"]);

        assert_eq!(d.segregating(), 2);
        assert_eq!(d.mutations(), 2);
        assert_eq!(d.singletons(), 1);
        // site 1: derived pairs 2*2 = 4; site 2: 1*3 = 3
        assert_approx_eq!(d.pairwise_diffs(), 7.0);
        assert_approx_eq!(d.sample_pairs(), 6.0);
    }

    #[test]
    fn test_rejects_single_sample() {
        let table = PolymorphismTable::from_haplotypes(&[1.0], &["0"]).unwrap();

        assert!(matches!(
            Derived::from_view(table.view()),
            Err(StatisticError::TooFewSamples {
                found: 1,
                required: 2
            })
        ));
    }

    #[test]
    fn test_frequency_spectrum_and_external_mutations() {
        let d = derived(&[1.0, 2.0, 3.0], &["010", "011", "000", "000"]);
        let ancestral = vec![Allele::from('0'); 3];

        assert_eq!(d.frequency_spectrum(&ancestral), vec![1, 1, 1, 0, 0]);
        assert_eq!(d.external_mutations(&ancestral), 1);

        // An unknown ancestral state drops the site
        let partial = vec![Allele::from('0'), Allele::Missing, Allele::from('0')];
        assert_eq!(d.frequency_spectrum(&partial), vec![1, 1, 0, 0, 0]);
        assert_eq!(d.external_mutations(&partial), 1);
    }

    #[test]
    fn test_coefficients() {
        let c = Coefficients::new(4);

        assert_approx_eq!(c.a_n, 11.0 / 6.0);
        assert_approx_eq!(c.b_n, 49.0 / 36.0);
        assert_approx_eq!(c.a_n1, 25.0 / 12.0);
        // c_4 = 2(4 a_4 - 6) / 6
        assert_approx_eq!(c.c_n, (4.0 * (11.0 / 6.0) - 6.0) / 3.0);
    }
}
