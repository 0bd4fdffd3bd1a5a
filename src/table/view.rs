//! Borrowed views over a contiguous site range.

use std::ops::Range;

use super::{Allele, Site};

/// A non-owning view over a contiguous site range of a [`PolymorphismTable`].
///
/// Views are cheap to copy and never outlive their table; windows produced by
/// [`Windows`](crate::window::Windows) are views. Since nothing mutates a table after
/// construction, any number of views (and threads holding them) may read it concurrently.
///
/// [`PolymorphismTable`]: super::PolymorphismTable
#[derive(Clone, Copy, Debug)]
pub struct TableView<'a> {
    sites: &'a [Site],
    samples: usize,
}

impl<'a> TableView<'a> {
    pub(crate) fn new(sites: &'a [Site], samples: usize) -> Self {
        Self { sites, samples }
    }

    /// The number of sampled haplotypes.
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// The sites covered by the view, in position order.
    pub fn sites(&self) -> &'a [Site] {
        self.sites
    }

    /// The number of sites covered by the view.
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    /// Returns `true` if the view covers no sites.
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// A narrower view over a site index range of this view.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds, like slice indexing.
    pub fn slice(&self, range: Range<usize>) -> TableView<'a> {
        Self::new(&self.sites[range], self.samples)
    }

    /// The state sequence of one sample across the view's sites.
    pub fn haplotype(&self, sample: usize) -> impl Iterator<Item = Allele> + 'a {
        self.sites.iter().map(move |site| site.states()[sample])
    }
}

#[cfg(test)]
mod tests {
    use crate::table::PolymorphismTable;

    use super::*;

    #[test]
    fn test_slice_and_haplotype() {
        let table =
            PolymorphismTable::from_haplotypes(&[1.0, 2.0, 3.0], &["011", "001", "111"]).unwrap();

        let view = table.view();
        assert_eq!(view.len(), 3);

        let inner = view.slice(1..3);
        assert_eq!(inner.len(), 2);
        assert_eq!(inner.sites()[0].position(), 2.0);

        let haplotype = inner.haplotype(0).collect::<Vec<_>>();
        assert_eq!(haplotype, vec![Allele::from('1'), Allele::from('1')]);
    }
}
