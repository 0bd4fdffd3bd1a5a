//! Estimators of the population mutation rate θ.

use crate::{derived::Derived, table::Allele};

/// θ̂_π: the pairwise-difference sum over the number of sample pairs.
pub(super) fn pi(derived: &Derived) -> f64 {
    derived.pairwise_diffs() / derived.sample_pairs()
}

/// θ̂_W = S / a_n (Watterson (1975)).
pub(super) fn watterson(derived: &Derived) -> f64 {
    derived.segregating() as f64 / derived.coefficients().a_n
}

/// θ̂_H (Fay and Wu (2000)): weights the unfolded spectrum by the squared derived count.
pub(super) fn fay_wu(derived: &Derived, ancestral: &[Allele]) -> f64 {
    let n = derived.samples();
    let spectrum = derived.frequency_spectrum(ancestral);

    spectrum
        .iter()
        .enumerate()
        .take(n)
        .skip(1)
        .map(|(i, &count)| 2.0 * (count * i * i) as f64)
        .sum::<f64>()
        / (n * (n - 1)) as f64
}

/// θ̂_L (Zeng et al. (2006)): the first moment of the unfolded spectrum.
pub(super) fn zeng(derived: &Derived, ancestral: &[Allele]) -> f64 {
    let n = derived.samples();
    let spectrum = derived.frequency_spectrum(ancestral);

    spectrum
        .iter()
        .enumerate()
        .take(n)
        .skip(1)
        .map(|(i, &count)| (count * i) as f64)
        .sum::<f64>()
        / (n - 1) as f64
}
