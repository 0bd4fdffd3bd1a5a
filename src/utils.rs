//! Numeric helpers shared by the statistic modules.

/// Returns the sum of the first n - 1 terms of the harmonic series.
pub fn harmonic(n: u64) -> f64 {
    p_harmonic(n, 1)
}

/// Returns the sum of the first n - 1 terms of the p-harmonic series.
pub fn p_harmonic(n: u64, p: u32) -> f64 {
    (1..n).map(|i| 1.0 / (i.pow(p) as f64)).sum()
}

/// Returns the number of unordered pairs among n items.
pub fn pairs(n: usize) -> f64 {
    (n * n.saturating_sub(1)) as f64 / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_harmonic() {
        assert_approx_eq!(harmonic(1), 0.0);
        assert_approx_eq!(harmonic(4), 11.0 / 6.0);
        assert_approx_eq!(p_harmonic(4, 2), 1.0 + 0.25 + 1.0 / 9.0);
    }

    #[test]
    fn test_pairs() {
        assert_approx_eq!(pairs(0), 0.0);
        assert_approx_eq!(pairs(1), 0.0);
        assert_approx_eq!(pairs(7), 21.0);
    }
}
