//! The polymorphism table and its building blocks.

use std::fmt;

pub mod view;
pub use view::TableView;

/// A single allelic state for one sample at one site.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Allele {
    /// An observed state, typically an ASCII nucleotide or a '0'/'1' encoding.
    Observed(u8),
    /// No state was observed for this sample at this site.
    Missing,
}

impl Allele {
    /// Returns `true` if the state is missing.
    pub fn is_missing(&self) -> bool {
        matches!(self, Allele::Missing)
    }

    /// Returns the observed state, if any.
    pub fn observed(&self) -> Option<u8> {
        match *self {
            Allele::Observed(state) => Some(state),
            Allele::Missing => None,
        }
    }
}

impl From<u8> for Allele {
    fn from(state: u8) -> Self {
        Self::Observed(state)
    }
}

impl From<char> for Allele {
    /// Converts from a character, mapping `'?'`, `'N'`, and `'n'` to [`Allele::Missing`].
    fn from(c: char) -> Self {
        match c {
            '?' | 'N' | 'n' => Self::Missing,
            c => Self::Observed(c as u8),
        }
    }
}

impl fmt::Display for Allele {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Allele::Observed(state) => write!(f, "{}", *state as char),
            Allele::Missing => f.write_str("?"),
        }
    }
}

/// A genomic position paired with the per-sample allelic states observed there.
#[derive(Clone, Debug, PartialEq)]
pub struct Site {
    position: f64,
    states: Vec<Allele>,
}

impl Site {
    /// Creates a new site.
    pub fn new(position: f64, states: Vec<Allele>) -> Self {
        Self { position, states }
    }

    /// The genomic position of the site.
    pub fn position(&self) -> f64 {
        self.position
    }

    /// The per-sample states at the site, in sample order.
    pub fn states(&self) -> &[Allele] {
        &self.states
    }
}

/// An ordered collection of sites sharing a common sample count.
///
/// The table is validated at construction and read-only afterwards: positions must be strictly
/// increasing, every site must carry exactly the declared number of states, and at least one
/// sample must be declared. Analyses read the table through [`TableView`]s, which borrow a
/// contiguous site range and never outlive the table.
#[derive(Clone, Debug, PartialEq)]
pub struct PolymorphismTable {
    sites: Vec<Site>,
    samples: usize,
}

impl PolymorphismTable {
    /// Creates a new table from sites and a declared sample count.
    ///
    /// # Errors
    ///
    /// See [`TableError`] for the conditions rejected here.
    pub fn new(sites: Vec<Site>, samples: usize) -> Result<Self, TableError> {
        if samples == 0 {
            return Err(TableError::NoSamples);
        }

        for (index, site) in sites.iter().enumerate() {
            if site.states.len() != samples {
                return Err(TableError::SampleCountMismatch {
                    index,
                    expected: samples,
                    found: site.states.len(),
                });
            }

            if index > 0 && site.position <= sites[index - 1].position {
                return Err(TableError::PositionsNotIncreasing { index });
            }
        }

        Ok(Self { sites, samples })
    }

    /// Creates a table from one state string per sampled haplotype.
    ///
    /// Rows are samples and columns are sites, so every row must have exactly one character per
    /// position. Characters map to states via [`Allele::from`], so `'?'` and `'N'` mark missing
    /// data. This is a convenience for loaders and tests, not a file-format parser.
    pub fn from_haplotypes(positions: &[f64], haplotypes: &[&str]) -> Result<Self, TableError> {
        let samples = haplotypes.len();
        if samples == 0 {
            return Err(TableError::NoSamples);
        }

        let rows = haplotypes
            .iter()
            .enumerate()
            .map(|(sample, haplotype)| {
                let states = haplotype.chars().map(Allele::from).collect::<Vec<_>>();
                if states.len() == positions.len() {
                    Ok(states)
                } else {
                    Err(TableError::HaplotypeLengthMismatch {
                        sample,
                        expected: positions.len(),
                        found: states.len(),
                    })
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        let sites = positions
            .iter()
            .enumerate()
            .map(|(j, &position)| Site::new(position, rows.iter().map(|row| row[j]).collect()))
            .collect();

        Self::new(sites, samples)
    }

    /// The number of sampled haplotypes.
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// The sites of the table, in position order.
    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    /// The number of sites in the table.
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    /// Returns `true` if the table contains no sites.
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// A view over the full site range of the table.
    pub fn view(&self) -> TableView<'_> {
        TableView::new(&self.sites, self.samples)
    }

    /// A view over a contiguous site index range.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds, like slice indexing.
    pub fn slice(&self, range: std::ops::Range<usize>) -> TableView<'_> {
        TableView::new(&self.sites[range], self.samples)
    }
}

/// An error associated with table construction.
#[derive(Debug, Eq, PartialEq)]
pub enum TableError {
    /// The declared sample count was zero.
    NoSamples,
    /// A site did not carry exactly the declared number of states.
    SampleCountMismatch {
        /// Index of the offending site.
        index: usize,
        /// Declared sample count.
        expected: usize,
        /// Number of states found at the site.
        found: usize,
    },
    /// A position was not strictly greater than its predecessor.
    PositionsNotIncreasing {
        /// Index of the offending site.
        index: usize,
    },
    /// A haplotype string did not have one state per position.
    HaplotypeLengthMismatch {
        /// Index of the offending sample.
        sample: usize,
        /// Number of positions.
        expected: usize,
        /// Number of states found in the haplotype.
        found: usize,
    },
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::NoSamples => f.write_str("table must declare at least one sample"),
            TableError::SampleCountMismatch {
                index,
                expected,
                found,
            } => write!(
                f,
                "site {index} has {found} states, expected {expected} (one per sample)"
            ),
            TableError::PositionsNotIncreasing { index } => write!(
                f,
                "site {index} does not have a strictly increasing position"
            ),
            TableError::HaplotypeLengthMismatch {
                sample,
                expected,
                found,
            } => write!(
                f,
                "haplotype {sample} has {found} states, expected {expected} (one per position)"
            ),
        }
    }
}

impl std::error::Error for TableError {}
