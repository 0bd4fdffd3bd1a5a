//! The D-family neutrality tests.

use crate::derived::Derived;

use super::{theta, StatisticError};

fn require_mutations(derived: &Derived) -> Result<f64, StatisticError> {
    match derived.mutations() {
        0 => Err(StatisticError::NoSegregatingSites),
        eta => Ok(eta as f64),
    }
}

fn require_samples(derived: &Derived, required: usize) -> Result<f64, StatisticError> {
    let found = derived.samples();
    if found < required {
        Err(StatisticError::TooFewSamples { found, required })
    } else {
        Ok(found as f64)
    }
}

/// Tajima's D.
///
/// Notation from Tajima (1989), see also Durrett (2008), pp. 65-66.
pub(super) fn tajima(derived: &Derived) -> Result<f64, StatisticError> {
    let s = derived.segregating() as f64;
    if s == 0.0 {
        return Err(StatisticError::NoSegregatingSites);
    }

    let n = derived.samples() as f64;
    let a1 = derived.coefficients().a_n;
    let a2 = derived.coefficients().b_n;

    let b1 = (n + 1.0) / (3.0 * (n - 1.0));
    let b2 = 2.0 * (n * n + n + 3.0) / (9.0 * n * (n - 1.0));

    let c1 = b1 - 1.0 / a1;
    let c2 = b2 - (n + 2.0) / (a1 * n) + a2 / a1.powi(2);

    let e1 = c1 / a1;
    let e2 = c2 / (a1.powi(2) + a2);

    Ok((theta::pi(derived) - theta::watterson(derived)) / (e1 * s + e2 * s * (s - 1.0)).sqrt())
}

/// Fu and Li's D, given the external-mutation count η_e.
///
/// Notation from Fu and Li (1993), see also Durrett (2008), p. 67.
pub(super) fn fu_li_d(derived: &Derived, external: usize) -> Result<f64, StatisticError> {
    let n = require_samples(derived, 3)?;
    let eta = require_mutations(derived)?;

    let a = derived.coefficients().a_n;
    let b = derived.coefficients().b_n;
    let c = derived.coefficients().c_n;

    let v = 1.0 + a.powi(2) / (b + a.powi(2)) * (c - (n + 1.0) / (n - 1.0));
    let u = a - 1.0 - v;

    Ok((eta - a * external as f64) / (u * eta + v * eta.powi(2)).sqrt())
}

/// Fu and Li's D*, using the singleton count η_s in place of outgroup information.
///
/// Variance terms follow the corrected expressions in Simonsen et al. (1995).
pub(super) fn fu_li_d_star(derived: &Derived) -> Result<f64, StatisticError> {
    let n = require_samples(derived, 3)?;
    let eta = require_mutations(derived)?;
    let singletons = derived.singletons() as f64;

    let a = derived.coefficients().a_n;
    let b = derived.coefficients().b_n;
    let d = derived.coefficients().d_n;

    let v = ((n / (n - 1.0)).powi(2) * b + a.powi(2) * d
        - 2.0 * (n * a * (a + 1.0)) / (n - 1.0).powi(2))
        / (a.powi(2) + b);
    let u = (n / (n - 1.0)) * (a - n / (n - 1.0)) - v;

    Ok((n / (n - 1.0) * eta - a * singletons) / (u * eta + v * eta.powi(2)).sqrt())
}

/// Fu and Li's F, given the external-mutation count η_e.
pub(super) fn fu_li_f(derived: &Derived, external: usize) -> Result<f64, StatisticError> {
    let n = require_samples(derived, 3)?;
    let eta = require_mutations(derived)?;

    let a = derived.coefficients().a_n;
    let b = derived.coefficients().b_n;
    let a1 = derived.coefficients().a_n1;
    let c = derived.coefficients().c_n;

    let v = (c + 2.0 * (n * n + n + 3.0) / (9.0 * n * (n - 1.0)) - 2.0 / (n - 1.0))
        / (a.powi(2) + b);
    let u = (1.0 + (n + 1.0) / (3.0 * (n - 1.0))
        - 4.0 * ((n + 1.0) / (n - 1.0).powi(2)) * (a1 - 2.0 * n / (n + 1.0)))
        / a
        - v;

    Ok((theta::pi(derived) - external as f64) / (u * eta + v * eta.powi(2)).sqrt())
}

/// Fu and Li's F*, using the singleton count η_s in place of outgroup information.
///
/// Variance terms follow the corrected expressions in Simonsen et al. (1995).
pub(super) fn fu_li_f_star(derived: &Derived) -> Result<f64, StatisticError> {
    let n = require_samples(derived, 3)?;
    let eta = require_mutations(derived)?;
    let singletons = derived.singletons() as f64;

    let a = derived.coefficients().a_n;
    let b = derived.coefficients().b_n;
    let a1 = derived.coefficients().a_n1;
    let d = derived.coefficients().d_n;

    let v = (d + 2.0 * (n * n + n + 3.0) / (9.0 * n * (n - 1.0))
        - (2.0 / (n - 1.0)) * (4.0 * b - 6.0 + 8.0 / n))
        / (a.powi(2) + b);
    let u = (n / (n - 1.0) + (n + 1.0) / (3.0 * (n - 1.0)) - 4.0 / (n * (n - 1.0))
        + (2.0 * (n + 1.0) / (n - 1.0).powi(2)) * (a1 - 2.0 * n / (n + 1.0)))
        / a
        - v;

    Ok((theta::pi(derived) - (n - 1.0) / n * singletons) / (u * eta + v * eta.powi(2)).sqrt())
}

#[cfg(test)]
mod tests {
    use crate::{
        stat::{
            tests::{hamblin_mod_counts, table_from_derived_counts},
            SampleStatistics, StatisticError,
        },
        table::Allele,
    };

    /// The data from Aquadro and Greenberg (1983) in Durrett (2008) p. 44: 7 samples, 44
    /// segregating sites (34 singletons, 6 doubletons, 4 tripletons).
    fn aquadro_counts() -> Vec<usize> {
        let mut counts = vec![1; 34];
        counts.extend(std::iter::repeat(2).take(6));
        counts.extend(std::iter::repeat(3).take(4));
        counts
    }

    #[test]
    fn test_tajima_d_aquadro() {
        let table = table_from_derived_counts(7, &aquadro_counts());
        let stats = SampleStatistics::new(table.view()).unwrap();

        assert_approx_eq!(stats.tajimas_d().unwrap(), -0.995875);
    }

    #[test]
    fn test_tajima_d_hamblin_mod() {
        let table = table_from_derived_counts(11, &hamblin_mod_counts());
        let stats = SampleStatistics::new(table.view()).unwrap();

        assert_approx_eq!(stats.tajimas_d().unwrap(), 0.918438);
    }

    #[test]
    fn test_fu_li_family_hamblin_mod() {
        let table = table_from_derived_counts(11, &hamblin_mod_counts());
        let ancestral = vec![Allele::from('0'); table.len()];
        let stats = SampleStatistics::with_ancestral(table.view(), &ancestral).unwrap();

        // Durrett gives 1.68 for D, the difference is due to rounding errors in the text
        assert_approx_eq!(stats.fu_li_d().unwrap(), 1.693537);
        assert_approx_eq!(stats.fu_li_d_star().unwrap(), 1.428568);
        assert_approx_eq!(stats.fu_li_f().unwrap(), 1.791032);
        assert_approx_eq!(stats.fu_li_f_star().unwrap(), 1.287578);
    }

    #[test]
    fn test_undefined_without_segregating_sites() {
        let table = crate::table::PolymorphismTable::from_haplotypes(
            &[1.0, 2.0],
            &["00", "00", "00"],
        )
        .unwrap();
        let stats = SampleStatistics::new(table.view()).unwrap();

        assert_eq!(stats.tajimas_d(), Err(StatisticError::NoSegregatingSites));
        assert_eq!(
            stats.fu_li_d_star(),
            Err(StatisticError::NoSegregatingSites)
        );
    }

    #[test]
    fn test_fu_li_needs_three_samples() {
        let table = table_from_derived_counts(2, &[1]);
        let stats = SampleStatistics::new(table.view()).unwrap();

        assert_eq!(
            stats.fu_li_d_star(),
            Err(StatisticError::TooFewSamples {
                found: 2,
                required: 3
            })
        );
    }
}
