//! Haplotype-homozygosity selection statistics.
//!
//! The Garud statistics summarize the haplotype-frequency spectrum of a window; the nSL family
//! contrasts haplotype tract lengths between the allelic classes at each polymorphic site.

use indexmap::IndexMap;

use crate::{
    derived::SiteCounts,
    stat::StatisticError,
    table::{Allele, TableView},
};

/// The haplotype-homozygosity statistics of Garud et al. (2015).
///
/// Samples are grouped into haplotype classes by exact state-sequence equality across the window,
/// missing markers included, and the statistics are functions of the sorted class frequencies.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Garud {
    h1: f64,
    h12: f64,
    h2: f64,
}

impl Garud {
    /// Computes the Garud statistics over a window.
    ///
    /// # Errors
    ///
    /// Fails with [`StatisticError::TooFewSamples`] when the view has fewer than two samples.
    pub fn from_view(view: &TableView<'_>) -> Result<Self, StatisticError> {
        let n = view.samples();
        if n < 2 {
            return Err(StatisticError::TooFewSamples {
                found: n,
                required: 2,
            });
        }

        let mut classes: IndexMap<Vec<Allele>, usize> = IndexMap::new();
        for sample in 0..n {
            *classes.entry(view.haplotype(sample).collect()).or_default() += 1;
        }

        let mut frequencies = classes
            .values()
            .map(|&count| count as f64 / n as f64)
            .collect::<Vec<_>>();
        frequencies.sort_unstable_by(|a, b| b.total_cmp(a));

        let h1: f64 = frequencies.iter().map(|f| f * f).sum();
        let f1 = frequencies.first().copied().unwrap_or(0.0);
        let f2 = frequencies.get(1).copied().unwrap_or(0.0);

        Ok(Self {
            h1,
            h12: h1 - f1 * f1 - f2 * f2 + (f1 + f2) * (f1 + f2),
            h2: h1 - f1 * f1,
        })
    }

    /// H1: the haplotype homozygosity, Σ fᵢ².
    pub fn h1(&self) -> f64 {
        self.h1
    }

    /// H12: the homozygosity after merging the two most frequent classes.
    pub fn h12(&self) -> f64 {
        self.h12
    }

    /// H2: the homozygosity excluding the most frequent class.
    pub fn h2(&self) -> f64 {
        self.h2
    }

    /// H2/H1, which distinguishes hard from soft sweeps.
    pub fn h2_h1(&self) -> f64 {
        self.h2 / self.h1
    }
}

/// The per-site result of an nSL scan.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NslSite {
    /// The position of the focal site.
    pub position: f64,
    /// The raw log-ratio of mean tract lengths, where defined.
    pub nsl: Option<f64>,
    /// The nSL value standardized over the window's defined values.
    pub snsl: Option<f64>,
}

/// Computes nSL and its window-standardized form at every biallelic site of a view.
///
/// At each focal site the samples split into two allelic classes. For every sample pair within a
/// class, the tract length is the number of contiguous sites around the focal site, focal
/// included, at which the pair carries equal non-missing states; a missing state ends the tract.
/// nSL is the log-ratio of the mean tract length in the reference class (the ancestral allele
/// when `ancestral` is given, the major allele otherwise) over the mean in the other class, and
/// is undefined when either class has fewer than two carriers. snSL standardizes the defined nSL
/// values to zero mean and unit standard deviation over the view; it is undefined when fewer
/// than two values are defined or their variance is zero.
///
/// Runs in O(S²·n²) over the view's sites and samples.
///
/// # Errors
///
/// Fails when the view has fewer than two samples, or when `ancestral` does not hold one state
/// per site.
pub fn nsl(
    view: &TableView<'_>,
    ancestral: Option<&[Allele]>,
) -> Result<Vec<NslSite>, StatisticError> {
    let n = view.samples();
    if n < 2 {
        return Err(StatisticError::TooFewSamples {
            found: n,
            required: 2,
        });
    }

    if let Some(ancestral) = ancestral {
        if ancestral.len() != view.len() {
            return Err(StatisticError::AncestralLengthMismatch {
                expected: view.len(),
                found: ancestral.len(),
            });
        }
    }

    let mut results = Vec::new();
    for (focal, site) in view.sites().iter().enumerate() {
        let counts = SiteCounts::from_states(site.states());
        if !counts.is_biallelic() {
            continue;
        }

        results.push(NslSite {
            position: site.position(),
            nsl: nsl_at(view, focal, &counts, ancestral),
            snsl: None,
        });
    }

    standardize(&mut results);

    Ok(results)
}

fn nsl_at(
    view: &TableView<'_>,
    focal: usize,
    counts: &SiteCounts,
    ancestral: Option<&[Allele]>,
) -> Option<f64> {
    let states = view.sites()[focal].states();

    // The reference class carries the ancestral allele where known, the major allele otherwise
    let reference = ancestral
        .and_then(|ancestral| ancestral[focal].observed())
        .filter(|&state| counts.count_of(state) > 0)
        .or_else(|| counts.major_state())?;

    let mut reference_class = Vec::new();
    let mut other_class = Vec::new();
    for (sample, state) in states.iter().enumerate() {
        match state.observed() {
            Some(state) if state == reference => reference_class.push(sample),
            Some(_) => other_class.push(sample),
            None => (),
        }
    }

    let reference_mean = mean_tract(view, focal, &reference_class)?;
    let other_mean = mean_tract(view, focal, &other_class)?;

    Some((reference_mean / other_mean).ln())
}

/// The mean pairwise tract length within an allelic class, or `None` for fewer than 2 carriers.
fn mean_tract(view: &TableView<'_>, focal: usize, class: &[usize]) -> Option<f64> {
    if class.len() < 2 {
        return None;
    }

    let mut total = 0.0;
    let mut pairs = 0;
    for (index, &first) in class.iter().enumerate() {
        for &second in &class[index + 1..] {
            total += tract_length(view, focal, first, second) as f64;
            pairs += 1;
        }
    }

    Some(total / pairs as f64)
}

fn tract_length(view: &TableView<'_>, focal: usize, first: usize, second: usize) -> usize {
    let sites = view.sites();
    let identical = |index: usize| {
        let a = sites[index].states()[first];
        let b = sites[index].states()[second];
        !a.is_missing() && a == b
    };

    let mut length = 1;

    let mut left = focal;
    while left > 0 && identical(left - 1) {
        left -= 1;
        length += 1;
    }

    let mut right = focal;
    while right + 1 < sites.len() && identical(right + 1) {
        right += 1;
        length += 1;
    }

    length
}

fn standardize(results: &mut [NslSite]) {
    let defined = results
        .iter()
        .filter_map(|result| result.nsl)
        .collect::<Vec<_>>();
    if defined.len() < 2 {
        return;
    }

    let mean = defined.iter().sum::<f64>() / defined.len() as f64;
    let variance = defined.iter().map(|value| (value - mean).powi(2)).sum::<f64>()
        / (defined.len() - 1) as f64;
    if variance == 0.0 {
        return;
    }

    let sd = variance.sqrt();
    for result in results.iter_mut() {
        result.snsl = result.nsl.map(|value| (value - mean) / sd);
    }
}
