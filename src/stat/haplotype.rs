//! Depaulis and Veuille's haplotype-diversity statistics.

use indexmap::IndexMap;

use crate::{
    derived::Derived,
    table::{Allele, TableView},
};

/// The haplotype-diversity tuple of Depaulis and Veuille (1998).
///
/// Used to compare an observed sample against coalescent-simulated distributions conditioned on
/// the number of segregating sites, which is why computation can be capped at a segregating-site
/// count.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DepaulisVeuille {
    /// The number of distinct haplotypes K.
    pub haplotypes: usize,
    /// The bias-corrected haplotype diversity, n/(n-1) · (1 - Σ f²).
    pub diversity: f64,
    /// The frequency of the most common haplotype.
    pub major_frequency: f64,
}

impl DepaulisVeuille {
    pub(super) fn from_view(
        view: &TableView<'_>,
        derived: &Derived,
        max_segregating: Option<usize>,
    ) -> Self {
        // Restrict to the view prefix holding the first `max_segregating` segregating sites
        let end = match max_segregating {
            Some(0) => 0,
            Some(max) => derived
                .counts()
                .iter()
                .scan(0, |seen, counts| {
                    *seen += usize::from(counts.is_segregating());
                    Some(*seen)
                })
                .position(|seen| seen >= max)
                .map(|index| index + 1)
                .unwrap_or(view.len()),
            None => view.len(),
        };
        let restricted = view.slice(0..end);

        let n = restricted.samples();
        let mut classes: IndexMap<Vec<Allele>, usize> = IndexMap::new();
        for sample in 0..n {
            *classes
                .entry(restricted.haplotype(sample).collect())
                .or_default() += 1;
        }

        let sum_squares: f64 = classes
            .values()
            .map(|&count| (count as f64 / n as f64).powi(2))
            .sum();
        let major = classes.values().copied().max().unwrap_or(0);

        Self {
            haplotypes: classes.len(),
            diversity: n as f64 / (n - 1) as f64 * (1.0 - sum_squares),
            major_frequency: major as f64 / n as f64,
        }
    }
}
