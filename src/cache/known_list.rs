use serde::{Deserialize, Serialize};

/// A list the client has loaded page by page from a paginated endpoint.
///
/// `items` is always a prefix of the full backend list. Once `exhausted`
/// is set no further pages are requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnownList<T> {
    pub items: Vec<T>,
    /// Next backend page to request, 1-based
    pub next_page: u32,
    pub exhausted: bool,
}

impl<T> Default for KnownList<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            next_page: 1,
            exhausted: false,
        }
    }
}

impl<T: Clone> KnownList<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// No fetch is needed to serve `[.., end)`
    pub fn covers(&self, end: usize) -> bool {
        self.exhausted || end <= self.items.len()
    }

    /// `items[start..end]`, clamped to what is known
    pub fn slice(&self, start: usize, end: usize) -> Vec<T> {
        let end = end.min(self.items.len());
        let start = start.min(end);
        self.items[start..end].to_vec()
    }

    /// Merge backend page `page`: the first page replaces, later pages append
    pub fn absorb(&mut self, page: u32, chunk: ListChunk<T>) {
        let exhausted = !chunk.has_next || chunk.items.is_empty();

        if page <= 1 || self.items.is_empty() {
            self.items = chunk.items;
        } else {
            self.items.extend(chunk.items);
        }

        self.next_page = page + 1;
        self.exhausted = exhausted;
    }
}

/// One fetched page of a known list
#[derive(Debug, Clone, PartialEq)]
pub struct ListChunk<T> {
    pub items: Vec<T>,
    /// The backend announced a following page
    pub has_next: bool,
}

impl<T> ListChunk<T> {
    pub fn new(items: Vec<T>, has_next: bool) -> Self {
        Self { items, has_next }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absorb_pages() {
        let mut list = KnownList::default();
        assert!(!list.covers(1));

        list.absorb(1, ListChunk::new(vec![1, 2], true));
        list.absorb(2, ListChunk::new(vec![3, 4], true));
        assert_eq!(list.items, vec![1, 2, 3, 4]);
        assert_eq!(list.next_page, 3);
        assert!(list.covers(4));
        assert!(!list.covers(5));

        // Page 1 again starts over
        list.absorb(1, ListChunk::new(vec![9], true));
        assert_eq!(list.items, vec![9]);
        assert_eq!(list.next_page, 2);
    }

    #[test]
    fn test_exhaustion() {
        let mut list = KnownList::default();
        list.absorb(1, ListChunk::new(vec!["a"], false));
        assert!(list.exhausted);
        assert!(list.covers(100));
        assert_eq!(list.slice(0, 100), vec!["a"]);

        let mut list = KnownList::default();
        list.absorb(1, ListChunk::new(vec!["a"], true));
        list.absorb(2, ListChunk::<&str>::new(vec![], true));
        assert!(list.exhausted);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_slice_clamps() {
        let list = KnownList {
            items: vec![1, 2, 3],
            next_page: 2,
            exhausted: false,
        };
        assert_eq!(list.slice(1, 2), vec![2]);
        assert_eq!(list.slice(2, 10), vec![3]);
        assert!(list.slice(5, 10).is_empty());
    }
}
