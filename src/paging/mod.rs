//! Paginated results and the incremental iterator that consumes them.

mod iterator;

pub use iterator::{FetchFn, IteratorState, IteratorStatus, PagedListIterator};

use serde::{Deserialize, Serialize};

/// One page of results.
///
/// An iterator stops on `is_last_page` or on an empty `list`; either signal
/// is enough on its own since many sites never mark their last page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagedList<T> {
    pub list: Vec<T>,
    pub index: usize,
    pub is_last_page: bool,
}

impl<T> PagedList<T> {
    pub fn new(list: Vec<T>, index: usize, is_last_page: bool) -> Self {
        Self {
            list,
            index,
            is_last_page,
        }
    }

    /// An empty, final page.
    pub fn empty(index: usize) -> Self {
        Self::new(Vec::new(), index, true)
    }

    /// True when no further page should be requested after this one.
    pub fn is_terminal(&self) -> bool {
        self.is_last_page || self.list.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_page_is_terminal() {
        let page: PagedList<u8> = PagedList::empty(3);
        assert_eq!(page.index, 3);
        assert!(page.is_last_page);
        assert!(page.is_terminal());
    }

    #[test]
    fn test_terminal_signals() {
        assert!(!PagedList::new(vec![1], 0, false).is_terminal());
        assert!(PagedList::new(vec![1], 0, true).is_terminal());
        assert!(PagedList::<u8>::new(vec![], 0, false).is_terminal());
    }
}
