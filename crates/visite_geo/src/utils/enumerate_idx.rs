/// Like [`Iterator::enumerate`], but yields a typed index instead of a bare
/// `usize`.
pub struct IndexedIter<I, Idx> {
    inner: std::iter::Enumerate<I>,
    _marker: std::marker::PhantomData<Idx>,
}

pub trait EnumerateIdx<Idx>: Iterator + Sized {
    fn enumerate_idx(self) -> IndexedIter<Self, Idx> {
        IndexedIter {
            inner: self.enumerate(),
            _marker: std::marker::PhantomData,
        }
    }
}

impl<I: Iterator, Idx> EnumerateIdx<Idx> for I {}

impl<I: Iterator, Idx: From<usize>> Iterator for IndexedIter<I, Idx> {
    type Item = (Idx, I::Item);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(i, item)| (Idx::from(i), item))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::EnumerateIdx;
    use crate::marker::MarkerIdx;

    #[test]
    fn test_enumerate_idx_yields_typed_indices() {
        let values = ["a", "b", "c"];
        let indices: Vec<(MarkerIdx, &&str)> = values.iter().enumerate_idx().collect();

        assert_eq!(indices[0].0, MarkerIdx::new(0));
        assert_eq!(indices[2].0, MarkerIdx::new(2));
        assert_eq!(*indices[1].1, "b");
    }
}
