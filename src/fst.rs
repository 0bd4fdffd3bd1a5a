//! Population differentiation statistics.

use std::fmt;

use crate::{
    derived::SiteCounts,
    stat::StatisticError,
    table::TableView,
    utils::pairs,
};

/// The within/between/total diversity decomposition over two or more subpopulations.
///
/// Constructed from one view per subpopulation; all views must cover the same site positions.
/// Sample counts may differ between subpopulations. The decomposition and the derived indices
/// are computed eagerly; index accessors report a [`StatisticError`] where their denominator is
/// undefined.
#[derive(Clone, Debug)]
pub struct Fst {
    pi_t: f64,
    pi_s: f64,
    pi_b: f64,
    shared: usize,
    private: usize,
    fixed: usize,
}

impl Fst {
    /// Computes the decomposition from one view per subpopulation.
    ///
    /// # Errors
    ///
    /// Fails when fewer than two subpopulations are supplied, a subpopulation has no samples, or
    /// the views do not share site positions.
    pub fn new(populations: &[TableView<'_>]) -> Result<Self, FstError> {
        if populations.len() < 2 {
            return Err(FstError::TooFewPopulations {
                found: populations.len(),
            });
        }

        for (index, view) in populations.iter().enumerate() {
            if view.samples() == 0 {
                return Err(FstError::EmptyPopulation { index });
            }
        }

        let sites = populations[0].len();
        for view in &populations[1..] {
            if view.len() != sites {
                return Err(FstError::PositionMismatch);
            }

            let matches = view
                .sites()
                .iter()
                .zip(populations[0].sites())
                .all(|(a, b)| a.position() == b.position());
            if !matches {
                return Err(FstError::PositionMismatch);
            }
        }

        // Per-site counts, per population
        let counts = populations
            .iter()
            .map(|view| {
                view.sites()
                    .iter()
                    .map(|site| SiteCounts::from_states(site.states()))
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();

        let sizes = populations.iter().map(TableView::samples).collect::<Vec<_>>();
        let total: usize = sizes.iter().sum();

        // Mean within-subpopulation diversity, weighted by sample size
        let pi_s = counts
            .iter()
            .zip(sizes.iter())
            .map(|(counts, &size)| {
                if size < 2 {
                    return 0.0;
                }
                let diffs: f64 = counts.iter().map(SiteCounts::mismatch_pairs).sum();
                size as f64 / total as f64 * diffs / pairs(size)
            })
            .sum();

        // Total diversity of the pooled sample
        let pi_t = (0..sites)
            .map(|site| pooled(populations, site).mismatch_pairs())
            .sum::<f64>()
            / pairs(total);

        // Mean diversity between subpopulation pairs
        let mut pi_b = 0.0;
        let mut population_pairs = 0usize;
        for i in 0..populations.len() {
            for j in i + 1..populations.len() {
                population_pairs += 1;
                pi_b += (0..sites)
                    .map(|site| between(&counts[i][site], &counts[j][site]))
                    .sum::<f64>();
            }
        }
        pi_b /= population_pairs as f64;

        let (shared, private, fixed) = classify_sites(&counts, sites);

        Ok(Self {
            pi_t,
            pi_s,
            pi_b,
            shared,
            private,
            fixed,
        })
    }

    /// πT: the total diversity of the pooled sample.
    pub fn pi_t(&self) -> f64 {
        self.pi_t
    }

    /// πS: the sample-size-weighted mean within-subpopulation diversity.
    pub fn pi_s(&self) -> f64 {
        self.pi_s
    }

    /// πB: the mean diversity between subpopulation pairs.
    pub fn pi_b(&self) -> f64 {
        self.pi_b
    }

    /// πD = πT - πS: the diversity among subpopulations.
    pub fn pi_d(&self) -> f64 {
        self.pi_t - self.pi_s
    }

    /// The Hudson, Boos and Kaplan (1992) index, 1 - πS/πT.
    pub fn hbk(&self) -> Result<f64, StatisticError> {
        if self.pi_t == 0.0 {
            return Err(StatisticError::NoSegregatingSites);
        }
        Ok(1.0 - self.pi_s / self.pi_t)
    }

    /// The Hudson, Slatkin and Maddison (1992) estimator, 1 - πS/πB.
    pub fn hsm(&self) -> Result<f64, StatisticError> {
        if self.pi_b == 0.0 {
            return Err(StatisticError::NoSegregatingSites);
        }
        Ok(1.0 - self.pi_s / self.pi_b)
    }

    /// Slatkin's (1993) linearized estimator, (πB - πS)/(πB + πS).
    pub fn slatkin(&self) -> Result<f64, StatisticError> {
        if self.pi_b + self.pi_s == 0.0 {
            return Err(StatisticError::NoSegregatingSites);
        }
        Ok((self.pi_b - self.pi_s) / (self.pi_b + self.pi_s))
    }

    /// The number of sites polymorphic within two or more subpopulations.
    pub fn shared(&self) -> usize {
        self.shared
    }

    /// The number of sites polymorphic within exactly one subpopulation.
    pub fn private_polymorphisms(&self) -> usize {
        self.private
    }

    /// The number of sites at which some pair of subpopulations shares no alleles.
    pub fn fixed_differences(&self) -> usize {
        self.fixed
    }
}

fn pooled(populations: &[TableView<'_>], site: usize) -> SiteCounts {
    let states = populations
        .iter()
        .flat_map(|view| view.sites()[site].states().iter().copied())
        .collect::<Vec<_>>();

    SiteCounts::from_states(&states)
}

/// The probability that one sample from each of two subpopulations differs at a site.
fn between(left: &SiteCounts, right: &SiteCounts) -> f64 {
    if left.called() == 0 || right.called() == 0 {
        return 0.0;
    }

    let same: f64 = left
        .iter()
        .map(|(state, count)| {
            count as f64 / left.called() as f64 * right.count_of(state) as f64
                / right.called() as f64
        })
        .sum();

    1.0 - same
}

fn classify_sites(counts: &[Vec<SiteCounts>], sites: usize) -> (usize, usize, usize) {
    let mut shared = 0;
    let mut private = 0;
    let mut fixed = 0;

    for site in 0..sites {
        let segregating = counts
            .iter()
            .filter(|population| population[site].is_segregating())
            .count();
        match segregating {
            0 => (),
            1 => private += 1,
            _ => shared += 1,
        }

        let disjoint = counts.iter().enumerate().any(|(i, left)| {
            counts[i + 1..].iter().any(|right| {
                left[site].called() > 0
                    && right[site].called() > 0
                    && left[site].iter().all(|(state, _)| right[site].count_of(state) == 0)
            })
        });
        if disjoint {
            fixed += 1;
        }
    }

    (shared, private, fixed)
}

/// An error associated with Fst construction.
#[derive(Debug, Eq, PartialEq)]
pub enum FstError {
    /// Fewer than two subpopulations were supplied.
    TooFewPopulations {
        /// Number of subpopulations found.
        found: usize,
    },
    /// A subpopulation had no samples.
    EmptyPopulation {
        /// Index of the offending subpopulation.
        index: usize,
    },
    /// The subpopulation views do not share site positions.
    PositionMismatch,
}

impl fmt::Display for FstError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FstError::TooFewPopulations { found } => {
                write!(f, "Fst requires at least 2 subpopulations, found {found}")
            }
            FstError::EmptyPopulation { index } => {
                write!(f, "subpopulation {index} has no samples")
            }
            FstError::PositionMismatch => {
                f.write_str("subpopulation views do not share site positions")
            }
        }
    }
}

impl std::error::Error for FstError {}

#[cfg(test)]
mod tests {
    use crate::table::PolymorphismTable;

    use super::*;

    fn two_populations() -> (PolymorphismTable, PolymorphismTable) {
        let positions = [1.0, 2.0];
        let one = PolymorphismTable::from_haplotypes(&positions, &["00", "01"]).unwrap();
        let two = PolymorphismTable::from_haplotypes(&positions, &["11", "11"]).unwrap();
        (one, two)
    }

    #[test]
    fn test_diversity_decomposition() {
        let (one, two) = two_populations();
        let fst = Fst::new(&[one.view(), two.view()]).unwrap();

        // Within: π₁ = 1, π₂ = 0, equal weights
        assert_approx_eq!(fst.pi_s(), 0.5);
        // Pooled: 4 + 3 mismatching pairs over C(4,2) = 6
        assert_approx_eq!(fst.pi_t(), 7.0 / 6.0);
        // Between: site 1 always differs, site 2 differs half the time
        assert_approx_eq!(fst.pi_b(), 1.5);
        assert_approx_eq!(fst.pi_d(), 7.0 / 6.0 - 0.5);
    }

    #[test]
    fn test_indices() {
        let (one, two) = two_populations();
        let fst = Fst::new(&[one.view(), two.view()]).unwrap();

        assert_approx_eq!(fst.hbk().unwrap(), 1.0 - fst.pi_s() / fst.pi_t());
        assert_approx_eq!(fst.hbk().unwrap(), 4.0 / 7.0);
        assert_approx_eq!(fst.hsm().unwrap(), 2.0 / 3.0);
        assert_approx_eq!(fst.slatkin().unwrap(), 0.5);
    }

    #[test]
    fn test_site_classification() {
        let (one, two) = two_populations();
        let fst = Fst::new(&[one.view(), two.view()]).unwrap();

        assert_eq!(fst.shared(), 0);
        assert_eq!(fst.private_polymorphisms(), 1);
        assert_eq!(fst.fixed_differences(), 1);
    }

    #[test]
    fn test_requires_two_populations() {
        let (one, _) = two_populations();

        assert_eq!(
            Fst::new(&[one.view()]).unwrap_err(),
            FstError::TooFewPopulations { found: 1 }
        );
    }

    #[test]
    fn test_rejects_position_mismatch() {
        let one = PolymorphismTable::from_haplotypes(&[1.0, 2.0], &["00", "01"]).unwrap();
        let two = PolymorphismTable::from_haplotypes(&[1.0, 3.0], &["11", "11"]).unwrap();

        assert_eq!(
            Fst::new(&[one.view(), two.view()]).unwrap_err(),
            FstError::PositionMismatch
        );
    }

    #[test]
    fn test_undefined_indices_without_polymorphism() {
        let one = PolymorphismTable::from_haplotypes(&[1.0], &["0", "0"]).unwrap();
        let two = PolymorphismTable::from_haplotypes(&[1.0], &["0", "0"]).unwrap();
        let fst = Fst::new(&[one.view(), two.view()]).unwrap();

        assert_eq!(fst.hbk(), Err(StatisticError::NoSegregatingSites));
        assert_eq!(fst.hsm(), Err(StatisticError::NoSegregatingSites));
    }
}
