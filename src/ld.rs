//! Pairwise linkage disequilibrium and recombination estimators.
//!
//! The pairwise scans here are quadratic in the number of sites ([`minrec`],
//! [`disequilibrium_scan`]) or samples ([`hudsons_c`]); callers scanning large tables bound the
//! window size, the library does not cap it.

use crate::{
    derived::{Derived, SiteCounts},
    stat::StatisticError,
    table::{Allele, TableView},
};

/// Why a site pair was excluded from disequilibrium computation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SkipReason {
    /// Fewer than two samples had non-missing data at both sites.
    TooFewSamples,
    /// One of the sites was monomorphic among the complete-data samples.
    Monomorphic,
    /// One of the sites had more than two states among the complete-data samples.
    NotBiallelic,
}

/// The two-locus haplotype counts for a site pair, classified by the focal allele at each site.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct HaplotypeCounts {
    /// Samples carrying the focal allele at neither site.
    pub neither: usize,
    /// Samples carrying the focal allele at the first site only.
    pub first_only: usize,
    /// Samples carrying the focal allele at the second site only.
    pub second_only: usize,
    /// Samples carrying the focal allele at both sites.
    pub both: usize,
}

/// The disequilibrium record for an informative site pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Disequilibrium {
    /// Site index of the first (left) site within the view.
    pub first: usize,
    /// Site index of the second (right) site within the view.
    pub second: usize,
    /// The positions of the two sites.
    pub positions: (f64, f64),
    /// The two-locus haplotype counts among complete-data samples.
    pub counts: HaplotypeCounts,
    /// The disequilibrium coefficient D = p₁₁ - p₁p₂.
    pub d: f64,
    /// D normalized by its maximum attainable magnitude given the marginals.
    pub d_prime: f64,
    /// The squared correlation r² between the two sites.
    pub r_squared: f64,
}

/// The outcome of a pairwise disequilibrium computation.
///
/// A skipped pair is data, not an error: aggregates exclude skipped pairs instead of failing the
/// scan.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PairOutcome {
    /// The pair was informative.
    Informative(Disequilibrium),
    /// The pair was excluded.
    Skipped {
        /// Site index of the first site within the view.
        first: usize,
        /// Site index of the second site within the view.
        second: usize,
        /// Why the pair was excluded.
        reason: SkipReason,
    },
}

impl PairOutcome {
    /// Returns `true` if the pair was excluded.
    pub fn is_skipped(&self) -> bool {
        matches!(self, PairOutcome::Skipped { .. })
    }

    /// The record, if the pair was informative.
    pub fn informative(&self) -> Option<&Disequilibrium> {
        match self {
            PairOutcome::Informative(record) => Some(record),
            PairOutcome::Skipped { .. } => None,
        }
    }
}

/// The focal allele at a site: the derived state when the ancestral state is known and observed
/// at the site, otherwise the minor allele (ties toward the larger state byte, so that the major
/// allele tie-breaks toward the smaller one).
fn focal_state(counts: &SiteCounts, ancestral: Option<Allele>) -> Option<u8> {
    if let Some(ancestral) = ancestral.and_then(|state| state.observed()) {
        if counts.count_of(ancestral) > 0 {
            if let Some(focal) = counts
                .iter()
                .map(|(state, _)| state)
                .find(|&state| state != ancestral)
            {
                return Some(focal);
            }
        }
    }

    counts
        .iter()
        .min_by(|(s1, c1), (s2, c2)| c1.cmp(c2).then(s2.cmp(s1)))
        .map(|(state, _)| state)
}

/// Computes the disequilibrium record for the site pair (first, second) of the view.
///
/// When ancestral states are supplied (one per site of the view), the focal allele at each site
/// is the derived one; relabelling which allele is derived at one site flips the sign of D and
/// D′ and leaves r² unchanged.
///
/// # Errors
///
/// Fails when `ancestral` does not hold one state per site of the view. An uninformative pair is
/// a [`PairOutcome::Skipped`], not an error.
pub fn disequilibrium(
    view: &TableView<'_>,
    ancestral: Option<&[Allele]>,
    first: usize,
    second: usize,
) -> Result<PairOutcome, StatisticError> {
    check_ancestral(view, ancestral)?;

    let skipped = |reason| PairOutcome::Skipped {
        first,
        second,
        reason,
    };

    let left = view.sites()[first].states();
    let right = view.sites()[second].states();

    let complete = (0..view.samples())
        .filter(|&sample| !left[sample].is_missing() && !right[sample].is_missing())
        .collect::<Vec<_>>();

    if complete.len() < 2 {
        return Ok(skipped(SkipReason::TooFewSamples));
    }

    let counts_left =
        SiteCounts::from_states(&complete.iter().map(|&s| left[s]).collect::<Vec<_>>());
    let counts_right =
        SiteCounts::from_states(&complete.iter().map(|&s| right[s]).collect::<Vec<_>>());

    for counts in [&counts_left, &counts_right] {
        match counts.distinct() {
            0 | 1 => return Ok(skipped(SkipReason::Monomorphic)),
            2 => (),
            _ => return Ok(skipped(SkipReason::NotBiallelic)),
        }
    }

    let focal_left = focal_state(&counts_left, ancestral.map(|a| a[first]));
    let focal_right = focal_state(&counts_right, ancestral.map(|a| a[second]));
    let (Some(focal_left), Some(focal_right)) = (focal_left, focal_right) else {
        return Ok(skipped(SkipReason::Monomorphic));
    };

    let mut counts = HaplotypeCounts::default();
    for &sample in &complete {
        let at_left = left[sample] == Allele::Observed(focal_left);
        let at_right = right[sample] == Allele::Observed(focal_right);
        match (at_left, at_right) {
            (true, true) => counts.both += 1,
            (true, false) => counts.first_only += 1,
            (false, true) => counts.second_only += 1,
            (false, false) => counts.neither += 1,
        }
    }

    let m = complete.len() as f64;
    let p1 = (counts.both + counts.first_only) as f64 / m;
    let p2 = (counts.both + counts.second_only) as f64 / m;
    let p11 = counts.both as f64 / m;

    let d = p11 - p1 * p2;
    let d_max = if d >= 0.0 {
        (p1 * (1.0 - p2)).min((1.0 - p1) * p2)
    } else {
        (p1 * p2).min((1.0 - p1) * (1.0 - p2))
    };
    let d_prime = if d == 0.0 { 0.0 } else { d / d_max };
    let r_squared = d * d / (p1 * (1.0 - p1) * p2 * (1.0 - p2));

    Ok(PairOutcome::Informative(Disequilibrium {
        first,
        second,
        positions: (
            view.sites()[first].position(),
            view.sites()[second].position(),
        ),
        counts,
        d,
        d_prime,
        r_squared,
    }))
}

fn check_ancestral(
    view: &TableView<'_>,
    ancestral: Option<&[Allele]>,
) -> Result<(), StatisticError> {
    match ancestral {
        Some(ancestral) if ancestral.len() != view.len() => {
            Err(StatisticError::AncestralLengthMismatch {
                expected: view.len(),
                found: ancestral.len(),
            })
        }
        _ => Ok(()),
    }
}

/// Computes the disequilibrium outcome for every ordered site pair of the view.
///
/// # Errors
///
/// Fails when `ancestral` does not hold one state per site of the view.
pub fn disequilibrium_scan(
    view: &TableView<'_>,
    ancestral: Option<&[Allele]>,
) -> Result<Vec<PairOutcome>, StatisticError> {
    check_ancestral(view, ancestral)?;

    let mut outcomes = Vec::new();
    for first in 0..view.len() {
        for second in first + 1..view.len() {
            outcomes.push(disequilibrium(view, ancestral, first, second)?);
        }
    }

    let skipped = outcomes.iter().filter(|o| o.is_skipped()).count();
    log::debug!(
        "disequilibrium scan over {} sites: {} pairs, {} skipped",
        view.len(),
        outcomes.len(),
        skipped
    );

    Ok(outcomes)
}

/// The mean r² over the informative pairs of a scan.
///
/// # Errors
///
/// Fails with [`StatisticError::NoInformativePairs`] when every pair was skipped.
pub fn mean_r_squared(outcomes: &[PairOutcome]) -> Result<f64, StatisticError> {
    let informative = outcomes
        .iter()
        .filter_map(PairOutcome::informative)
        .collect::<Vec<_>>();

    if informative.is_empty() {
        return Err(StatisticError::NoInformativePairs);
    }

    Ok(informative.iter().map(|r| r.r_squared).sum::<f64>() / informative.len() as f64)
}

/// Hudson and Kaplan's (1985) lower bound on the number of recombination events.
///
/// A site pair showing all four two-locus haplotypes requires a recombination event strictly
/// between the sites (absent recurrent mutation). The bound is the size of a maximal set of
/// pairwise non-overlapping such intervals, found by a left-to-right scan that opens a new event
/// only when a pair's left endpoint has passed the rightmost bound of the current one.
pub fn minrec(view: &TableView<'_>, derived: &Derived) -> usize {
    let biallelic = derived
        .counts()
        .iter()
        .enumerate()
        .filter(|(_, counts)| counts.is_biallelic())
        .map(|(index, _)| index)
        .collect::<Vec<_>>();

    let mut intervals = Vec::new();
    for (i, &x) in biallelic.iter().enumerate() {
        for &y in &biallelic[i + 1..] {
            if four_gametes(view, x, y) {
                intervals.push((x, y));
            }
        }
    }
    intervals.sort_unstable();

    let mut events = 0;
    let mut bound: Option<usize> = None;
    for (left, right) in intervals {
        match bound {
            Some(b) if left < b => bound = Some(b.min(right)),
            _ => {
                events += 1;
                bound = Some(right);
            }
        }
    }

    events
}

fn four_gametes(view: &TableView<'_>, x: usize, y: usize) -> bool {
    let left = view.sites()[x].states();
    let right = view.sites()[y].states();

    let mut seen = [false; 4];
    let first_left = left.iter().find(|state| !state.is_missing());
    let first_right = right.iter().find(|state| !state.is_missing());
    let (Some(&a), Some(&b)) = (first_left, first_right) else {
        return false;
    };

    for sample in 0..view.samples() {
        if left[sample].is_missing() || right[sample].is_missing() {
            continue;
        }
        let gamete = usize::from(left[sample] == a) * 2 + usize::from(right[sample] == b);
        seen[gamete] = true;
    }

    seen.iter().all(|&present| present)
}

const C_MAX: f64 = 1e4;

/// Hudson's (1987) moment estimator of the population recombination parameter C = 4Nr.
///
/// Solves the expected variance of pairwise differences, b₁π + b₂π²·g(C), for C, where g
/// averages the two-locus coalescence-time correlation (x+18)/(x²+13x+18) over the locus. The
/// estimate is 0 when the observed variance reaches the no-recombination expectation, and capped
/// at 10⁴ when it falls below the free-recombination floor.
pub fn hudsons_c(view: &TableView<'_>, derived: &Derived) -> Result<f64, StatisticError> {
    if derived.segregating() == 0 {
        return Err(StatisticError::NoSegregatingSites);
    }

    let n = view.samples();
    let mut diffs = Vec::with_capacity(n * (n - 1) / 2);
    for i in 0..n {
        for j in i + 1..n {
            let count = view
                .sites()
                .iter()
                .filter(|site| {
                    let (a, b) = (site.states()[i], site.states()[j]);
                    !a.is_missing() && !b.is_missing() && a != b
                })
                .count();
            diffs.push(count as f64);
        }
    }

    let pairs = diffs.len() as f64;
    let mean = diffs.iter().sum::<f64>() / pairs;
    let variance = diffs.iter().map(|k| (k - mean).powi(2)).sum::<f64>() / pairs;

    let nf = n as f64;
    let b1 = (nf + 1.0) / (3.0 * (nf - 1.0));
    let b2 = 2.0 * (nf * nf + nf + 3.0) / (9.0 * nf * (nf - 1.0));

    let expected = |c: f64| b1 * mean + b2 * mean * mean * correlation_average(c);

    if variance >= expected(0.0) {
        return Ok(0.0);
    }
    if variance <= b1 * mean {
        return Ok(C_MAX);
    }

    let (mut lo, mut hi) = (0.0_f64, C_MAX);
    for _ in 0..96 {
        let mid = 0.5 * (lo + hi);
        if expected(mid) > variance {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    Ok(0.5 * (lo + hi))
}

/// The correlation of coalescence times at two loci separated by recombination distance x.
fn correlation(x: f64) -> f64 {
    (x + 18.0) / (x * x + 13.0 * x + 18.0)
}

/// The correlation averaged over all ordered position pairs within a locus of total
/// recombination distance c: (2/c²)·∫₀ᶜ (c - x)·ρ(x) dx, by Simpson quadrature.
fn correlation_average(c: f64) -> f64 {
    if c == 0.0 {
        return 1.0;
    }

    const STEPS: usize = 256;
    let h = c / STEPS as f64;
    let f = |x: f64| (c - x) * correlation(x);

    let mut sum = f(0.0) + f(c);
    for i in 1..STEPS {
        let weight = if i % 2 == 1 { 4.0 } else { 2.0 };
        sum += weight * f(i as f64 * h);
    }

    2.0 / (c * c) * sum * h / 3.0
}

/// Hudson's haplotype test statistic: observed haplotype homozygosity minus its expectation
/// under free recombination (the product of per-site homozygosities). Positive values indicate
/// haplotype structure beyond what independent sites produce.
///
/// Samples with missing data anywhere in the view are excluded from both terms, so observed and
/// expected homozygosity refer to the same sample set.
pub fn hudsons_haplotype_test(
    view: &TableView<'_>,
    derived: &Derived,
) -> Result<f64, StatisticError> {
    if derived.segregating() == 0 {
        return Err(StatisticError::NoSegregatingSites);
    }

    let complete = (0..view.samples())
        .filter(|&sample| view.haplotype(sample).all(|state| !state.is_missing()))
        .collect::<Vec<_>>();
    if complete.len() < 2 {
        return Err(StatisticError::TooFewSamples {
            found: complete.len(),
            required: 2,
        });
    }

    let m = complete.len() as f64;
    let mut classes: indexmap::IndexMap<Vec<Allele>, usize> = indexmap::IndexMap::new();
    for &sample in &complete {
        *classes.entry(view.haplotype(sample).collect()).or_default() += 1;
    }

    let observed: f64 = classes
        .values()
        .map(|&count| (count as f64 / m).powi(2))
        .sum();
    let expected: f64 = view
        .sites()
        .iter()
        .map(|site| {
            let states = complete
                .iter()
                .map(|&sample| site.states()[sample])
                .collect::<Vec<_>>();
            SiteCounts::from_states(&states).homozygosity()
        })
        .product();

    Ok(observed - expected)
}
