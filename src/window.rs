//! Sliding-window scans over a polymorphism table.

use std::fmt;

use crate::table::TableView;

/// A sliding-window configuration.
///
/// Width, step, and starting offset are expressed either in site counts or in the table's
/// physical position units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum WindowSpec {
    /// Windows spanning a fixed number of sites.
    Sites {
        /// The number of sites per window.
        width: usize,
        /// The number of sites between successive window starts.
        step: usize,
        /// The site index of the first window's start.
        offset: usize,
    },
    /// Windows spanning a fixed physical distance.
    ///
    /// A window covers the closed position interval `[start, start + width]`.
    Positions {
        /// The physical width of each window.
        width: f64,
        /// The physical distance between successive window starts.
        step: f64,
        /// The position of the first window's start.
        offset: f64,
    },
}

/// The finite, restartable sequence of windows a spec induces over a view.
///
/// Window boundaries are precomputed at construction, so [`Windows::get`] is O(1) random access
/// and iteration allocates nothing per window. Each window is a borrowed view over a contiguous
/// site range of the source, bounded by the source table's lifetime.
#[derive(Clone, Debug)]
pub struct Windows<'a> {
    view: TableView<'a>,
    bounds: Vec<(usize, usize)>,
}

impl<'a> Windows<'a> {
    /// Computes the window boundaries a spec induces over a view.
    ///
    /// # Errors
    ///
    /// Fails when the width or step is zero (or non-positive, for physical units) or when the
    /// view holds no sites.
    pub fn new(view: TableView<'a>, spec: WindowSpec) -> Result<Self, WindowError> {
        if view.is_empty() {
            return Err(WindowError::EmptyTable);
        }

        let bounds = match spec {
            WindowSpec::Sites {
                width,
                step,
                offset,
            } => {
                if width == 0 {
                    return Err(WindowError::InvalidWidth);
                }
                if step == 0 {
                    return Err(WindowError::InvalidStep);
                }

                (0..)
                    .map(|k| offset + k * step)
                    .take_while(|start| start + width <= view.len())
                    .map(|start| (start, start + width))
                    .collect()
            }
            WindowSpec::Positions {
                width,
                step,
                offset,
            } => {
                if !(width > 0.0) {
                    return Err(WindowError::InvalidWidth);
                }
                if !(step > 0.0) {
                    return Err(WindowError::InvalidStep);
                }

                let sites = view.sites();
                let last = sites[view.len() - 1].position();
                let count = ((last - offset - width) / step).floor() + 1.0;
                let count = if count > 0.0 { count as usize } else { 0 };

                (0..count)
                    .map(|k| {
                        let start = offset + k as f64 * step;
                        let from = sites.partition_point(|site| site.position() < start);
                        let to = sites.partition_point(|site| site.position() <= start + width);
                        (from, to)
                    })
                    .collect::<Vec<_>>()
            }
        };

        log::debug!("computed {} window boundaries", bounds.len());

        Ok(Self { view, bounds })
    }

    /// The total number of windows.
    pub fn count(&self) -> usize {
        self.bounds.len()
    }

    /// The k-th window, if it exists.
    pub fn get(&self, k: usize) -> Option<TableView<'a>> {
        self.bounds
            .get(k)
            .map(|&(from, to)| self.view.slice(from..to))
    }

    /// Iterates over the windows in order. The iterator may be recreated at any time.
    pub fn iter(&self) -> Iter<'_, 'a> {
        Iter {
            windows: self,
            index: 0,
        }
    }
}

impl<'w, 'a> IntoIterator for &'w Windows<'a> {
    type Item = TableView<'a>;
    type IntoIter = Iter<'w, 'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over the windows of a [`Windows`] sequence.
#[derive(Clone, Debug)]
pub struct Iter<'w, 'a> {
    windows: &'w Windows<'a>,
    index: usize,
}

impl<'w, 'a> Iterator for Iter<'w, 'a> {
    type Item = TableView<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let window = self.windows.get(self.index)?;
        self.index += 1;
        Some(window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.windows.count() - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Iter<'_, '_> {}

/// An error associated with window construction.
#[derive(Debug, Eq, PartialEq)]
pub enum WindowError {
    /// The window width was zero or non-positive.
    InvalidWidth,
    /// The window step was zero or non-positive.
    InvalidStep,
    /// The view holds no sites.
    EmptyTable,
}

impl fmt::Display for WindowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowError::InvalidWidth => f.write_str("window width must be positive"),
            WindowError::InvalidStep => f.write_str("window step must be positive"),
            WindowError::EmptyTable => f.write_str("cannot window an empty table"),
        }
    }
}

impl std::error::Error for WindowError {}

#[cfg(test)]
mod tests {
    use crate::table::PolymorphismTable;

    use super::*;

    fn hundred_sites() -> PolymorphismTable {
        let positions = (1..=100).map(f64::from).collect::<Vec<_>>();
        let haplotypes = ["01".repeat(50), "10".repeat(50)];
        PolymorphismTable::from_haplotypes(
            &positions,
            &haplotypes.iter().map(String::as_str).collect::<Vec<_>>(),
        )
        .unwrap()
    }

    #[test]
    fn test_non_overlapping_site_windows() {
        let table = hundred_sites();
        let windows = Windows::new(
            table.view(),
            WindowSpec::Sites {
                width: 10,
                step: 10,
                offset: 0,
            },
        )
        .unwrap();

        assert_eq!(windows.count(), 10);
        for (k, window) in windows.iter().enumerate() {
            assert_eq!(window.len(), 10);
            assert_approx_eq!(window.sites()[0].position(), 10.0 * k as f64 + 1.0);
        }
        assert!(windows.get(10).is_none());
    }

    #[test]
    fn test_half_overlapping_site_windows() {
        let table = hundred_sites();
        let windows = Windows::new(
            table.view(),
            WindowSpec::Sites {
                width: 10,
                step: 5,
                offset: 0,
            },
        )
        .unwrap();

        assert_eq!(windows.count(), 19);
        // Consecutive windows share half their sites
        let first = windows.get(0).unwrap();
        let second = windows.get(1).unwrap();
        assert_approx_eq!(second.sites()[0].position(), first.sites()[5].position());
    }

    #[test]
    fn test_physical_windows() {
        let table = hundred_sites();
        let windows = Windows::new(
            table.view(),
            WindowSpec::Positions {
                width: 10.0,
                step: 10.0,
                offset: 0.5,
            },
        )
        .unwrap();

        // Starts at 0.5, 10.5, ..., 80.5 fit before the last position 100
        assert_eq!(windows.count(), 9);
        let first = windows.get(0).unwrap();
        assert_eq!(first.len(), 10);
        assert_approx_eq!(first.sites()[0].position(), 1.0);
        assert_approx_eq!(first.sites()[9].position(), 10.0);
        let second = windows.get(1).unwrap();
        assert_approx_eq!(second.sites()[0].position(), 11.0);
    }

    #[test]
    fn test_physical_windows_skip_empty_ranges() {
        let table = PolymorphismTable::from_haplotypes(&[1.0, 2.0, 50.0], &["010", "101"]).unwrap();
        let windows = Windows::new(
            table.view(),
            WindowSpec::Positions {
                width: 10.0,
                step: 10.0,
                offset: 0.0,
            },
        )
        .unwrap();

        assert_eq!(windows.count(), 5);
        assert_eq!(windows.get(0).unwrap().len(), 2);
        // Ranges holding no sites still appear, as empty views
        assert_eq!(windows.get(1).unwrap().len(), 0);
        assert_eq!(windows.get(4).unwrap().len(), 1);
    }

    #[test]
    fn test_iteration_is_restartable() {
        let table = hundred_sites();
        let windows = Windows::new(
            table.view(),
            WindowSpec::Sites {
                width: 10,
                step: 10,
                offset: 0,
            },
        )
        .unwrap();

        assert_eq!(windows.iter().count(), 10);
        assert_eq!(windows.iter().count(), 10);
        assert_eq!((&windows).into_iter().count(), 10);
    }

    #[test]
    fn test_invalid_configuration() {
        let table = hundred_sites();
        let empty = PolymorphismTable::from_haplotypes(&[], &["", ""]).unwrap();

        let zero_width = WindowSpec::Sites {
            width: 0,
            step: 1,
            offset: 0,
        };
        let zero_step = WindowSpec::Positions {
            width: 10.0,
            step: 0.0,
            offset: 0.0,
        };
        let valid = WindowSpec::Sites {
            width: 1,
            step: 1,
            offset: 0,
        };

        assert_eq!(
            Windows::new(table.view(), zero_width).unwrap_err(),
            WindowError::InvalidWidth
        );
        assert_eq!(
            Windows::new(table.view(), zero_step).unwrap_err(),
            WindowError::InvalidStep
        );
        assert_eq!(
            Windows::new(empty.view(), valid).unwrap_err(),
            WindowError::EmptyTable
        );
    }
}
