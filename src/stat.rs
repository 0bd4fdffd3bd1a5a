//! Per-sample summary statistics.

use std::fmt;

mod theta;

mod d;

mod wall;

pub mod haplotype;
pub use haplotype::DepaulisVeuille;

use crate::{
    derived::Derived,
    ld,
    table::{Allele, TableView},
};

/// The neutrality and diversity estimators for a single sample.
///
/// Wraps a view together with its eagerly-computed [`Derived`] quantities and, optionally, one
/// ancestral state per site. All operations are read-only and may be called repeatedly in any
/// order; statistics whose requirements are not met report a [`StatisticError`] rather than a
/// silent default.
#[derive(Clone, Debug)]
pub struct SampleStatistics<'a> {
    view: TableView<'a>,
    derived: Derived,
    ancestral: Option<&'a [Allele]>,
}

impl<'a> SampleStatistics<'a> {
    /// Creates the statistics for a view without ancestral-state information.
    ///
    /// # Errors
    ///
    /// Fails when the view has fewer than two samples.
    pub fn new(view: TableView<'a>) -> Result<Self, StatisticError> {
        Ok(Self {
            view,
            derived: Derived::from_view(view)?,
            ancestral: None,
        })
    }

    /// Creates the statistics for a view with one ancestral state per site.
    ///
    /// # Errors
    ///
    /// Fails when the view has fewer than two samples or the ancestral vector does not have one
    /// state per site of the view.
    pub fn with_ancestral(
        view: TableView<'a>,
        ancestral: &'a [Allele],
    ) -> Result<Self, StatisticError> {
        if ancestral.len() != view.len() {
            return Err(StatisticError::AncestralLengthMismatch {
                expected: view.len(),
                found: ancestral.len(),
            });
        }

        let mut stats = Self::new(view)?;
        stats.ancestral = Some(ancestral);
        Ok(stats)
    }

    /// The underlying view.
    pub fn view(&self) -> TableView<'a> {
        self.view
    }

    /// The derived quantities shared by the estimators.
    pub fn derived(&self) -> &Derived {
        &self.derived
    }

    fn ancestral(&self) -> Result<&'a [Allele], StatisticError> {
        self.ancestral
            .ok_or(StatisticError::MissingAncestralStates)
    }

    /// The number of segregating sites.
    pub fn num_poly(&self) -> usize {
        self.derived.segregating()
    }

    /// The total number of mutations η.
    pub fn num_mutations(&self) -> usize {
        self.derived.mutations()
    }

    /// The number of singleton alleles.
    pub fn num_singletons(&self) -> usize {
        self.derived.singletons()
    }

    /// The number of external mutations η_e (derived singletons). Requires ancestral states.
    pub fn num_external_mutations(&self) -> Result<usize, StatisticError> {
        Ok(self.derived.external_mutations(self.ancestral()?))
    }

    /// θ̂_π: the mean number of pairwise differences.
    pub fn theta_pi(&self) -> f64 {
        theta::pi(&self.derived)
    }

    /// θ̂_W: Watterson's estimator, S / a_n.
    pub fn theta_w(&self) -> f64 {
        theta::watterson(&self.derived)
    }

    /// θ̂_H: Fay and Wu's estimator. Requires ancestral states.
    pub fn theta_h(&self) -> Result<f64, StatisticError> {
        Ok(theta::fay_wu(&self.derived, self.ancestral()?))
    }

    /// θ̂_L: Zeng's estimator. Requires ancestral states.
    pub fn theta_l(&self) -> Result<f64, StatisticError> {
        Ok(theta::zeng(&self.derived, self.ancestral()?))
    }

    /// Tajima's D. Undefined when there are no segregating sites.
    pub fn tajimas_d(&self) -> Result<f64, StatisticError> {
        d::tajima(&self.derived)
    }

    /// Fu and Li's D. Requires ancestral states.
    pub fn fu_li_d(&self) -> Result<f64, StatisticError> {
        d::fu_li_d(&self.derived, self.num_external_mutations()?)
    }

    /// Fu and Li's D*, the outgroup-free variant of D.
    pub fn fu_li_d_star(&self) -> Result<f64, StatisticError> {
        d::fu_li_d_star(&self.derived)
    }

    /// Fu and Li's F. Requires ancestral states.
    pub fn fu_li_f(&self) -> Result<f64, StatisticError> {
        d::fu_li_f(&self.derived, self.num_external_mutations()?)
    }

    /// Fu and Li's F*, the outgroup-free variant of F.
    pub fn fu_li_f_star(&self) -> Result<f64, StatisticError> {
        d::fu_li_f_star(&self.derived)
    }

    /// Wall's B. Undefined with fewer than two segregating sites.
    pub fn walls_b(&self) -> Result<f64, StatisticError> {
        wall::b(&self.view, &self.derived)
    }

    /// Wall's B′: the raw count of congruent adjacent site pairs.
    pub fn walls_b_prime(&self) -> usize {
        wall::b_prime(&self.view, &self.derived)
    }

    /// Wall's Q. Undefined without segregating sites.
    pub fn walls_q(&self) -> Result<f64, StatisticError> {
        wall::q(&self.view, &self.derived)
    }

    /// The Depaulis and Veuille haplotype-diversity statistics, optionally restricted to the
    /// first `max_segregating` segregating sites of the view.
    pub fn depaulis_veuille(&self, max_segregating: Option<usize>) -> DepaulisVeuille {
        DepaulisVeuille::from_view(&self.view, &self.derived, max_segregating)
    }

    /// Hudson and Kaplan's minimum number of recombination events.
    ///
    /// Quadratic in the number of segregating sites; see [`ld::minrec`].
    pub fn minrec(&self) -> usize {
        ld::minrec(&self.view, &self.derived)
    }

    /// Hudson's moment estimator of the population recombination parameter C.
    ///
    /// Quadratic in the number of samples; see [`ld::hudsons_c`].
    pub fn hudsons_c(&self) -> Result<f64, StatisticError> {
        ld::hudsons_c(&self.view, &self.derived)
    }

    /// Hudson's haplotype test statistic; see [`ld::hudsons_haplotype_test`].
    pub fn hudsons_haplotype_test(&self) -> Result<f64, StatisticError> {
        ld::hudsons_haplotype_test(&self.view, &self.derived)
    }
}

/// An error associated with a statistically-undefined result.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StatisticError {
    /// A denominator required segregating sites and there were none.
    NoSegregatingSites,
    /// The sample is too small for the statistic.
    TooFewSamples {
        /// Number of samples found.
        found: usize,
        /// Number of samples required.
        required: usize,
    },
    /// The statistic requires ancestral-state information that was not supplied.
    MissingAncestralStates,
    /// The ancestral-state vector does not have one state per site.
    AncestralLengthMismatch {
        /// Number of sites in the view.
        expected: usize,
        /// Length of the ancestral vector.
        found: usize,
    },
    /// An aggregate over pairwise results had no informative pairs left.
    NoInformativePairs,
}

impl fmt::Display for StatisticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatisticError::NoSegregatingSites => {
                f.write_str("statistic undefined without segregating sites")
            }
            StatisticError::TooFewSamples { found, required } => write!(
                f,
                "statistic requires at least {required} samples, found {found}"
            ),
            StatisticError::MissingAncestralStates => {
                f.write_str("statistic requires ancestral states")
            }
            StatisticError::AncestralLengthMismatch { expected, found } => write!(
                f,
                "expected one ancestral state per site ({expected}), found {found}"
            ),
            StatisticError::NoInformativePairs => {
                f.write_str("no informative pairs left after skipping")
            }
        }
    }
}

impl std::error::Error for StatisticError {}
