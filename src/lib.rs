#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Summary statistics for population-genetic polymorphism data.
//!
//! The core struct is a [`PolymorphismTable`]: an ordered sequence of sites, each carrying one
//! allelic state per sampled haplotype. All statistics consume a borrowed [`TableView`] over a
//! contiguous range of such a table, so the same code serves whole-table analyses and sliding
//! [`window`] scans without copying.
//!
//! # Overview
//!
//! As a very brief introduction to the API, let's build a small table and estimate θ from the
//! number of segregating sites using Watterson's estimator.
//!
//! ```
//! use popsum::{PolymorphismTable, SampleStatistics};
//!
//! // Four haplotypes typed at two sites; rows are samples, columns are sites
//! let table = PolymorphismTable::from_haplotypes(&[1.0, 2.0], &["01", "00", "10", "00"])?;
//!
//! let stats = SampleStatistics::new(table.view())?;
//!
//! // Both sites segregate, so θ̂_W = S / a_n = 2 / (1 + 1/2 + 1/3)
//! assert!((stats.theta_w() - 12.0 / 11.0).abs() < 1e-9);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#[cfg(test)]
#[macro_use]
pub(crate) mod approx;

pub mod table;
pub use table::{Allele, PolymorphismTable, Site, TableView};

pub mod derived;
pub use derived::Derived;

pub mod stat;
pub use stat::{SampleStatistics, StatisticError};

pub mod ld;

pub mod fst;
pub use fst::Fst;

pub mod homozygosity;

pub mod window;
pub use window::{WindowSpec, Windows};

pub mod utils;
