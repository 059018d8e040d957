/// Page index and spread arithmetic
///
/// Page indices: 0 = front cover, 1 = table of contents, 2.. = one page per
/// entry, last = back cover. Two pages make a leaf; a spread `s` shows the
/// back of leaf `s - 1` on the left and the front of leaf `s` on the right.

/// Page index of the table of contents. It lives on the inside of the
/// front cover and is never laid out as an ordinary page.
pub const CONTENTS_PAGE: usize = 1;

/// Number of pages before the first entry (cover + contents)
const FRONT_MATTER: usize = 2;

/// What a given page index shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Cover,
    Contents,
    /// 0-based entry index
    Entry(usize),
    BackCover,
    /// Past the last page (odd page count)
    Blank,
}

/// Maps between entries, page indices, and spreads for a given entry count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMap {
    entries: usize,
}

impl PageMap {
    pub fn new(entries: usize) -> Self {
        Self { entries }
    }

    /// Total number of pages, covers included
    pub fn page_count(&self) -> usize {
        self.entries + FRONT_MATTER + 1
    }

    /// Number of leaves (physical sheets); also the last spread
    pub fn leaves(&self) -> usize {
        self.page_count().div_ceil(2)
    }

    pub fn back_cover(&self) -> usize {
        self.page_count() - 1
    }

    pub fn kind(&self, page: usize) -> PageKind {
        if page == 0 {
            PageKind::Cover
        } else if page == CONTENTS_PAGE {
            PageKind::Contents
        } else if page == self.back_cover() {
            PageKind::BackCover
        } else if page < self.back_cover() {
            PageKind::Entry(page - FRONT_MATTER)
        } else {
            PageKind::Blank
        }
    }

    /// Page index that holds the given entry
    pub fn entry_page(&self, entry: usize) -> usize {
        entry + FRONT_MATTER
    }

    /// Spread at which a page is visible when the book lies open
    pub fn spread_of_page(&self, page: usize) -> usize {
        page.div_ceil(2)
    }

    /// Spread to jump to for an entry (`ceil((i + 2) / 2)`)
    pub fn spread_of_entry(&self, entry: usize) -> usize {
        self.spread_of_page(self.entry_page(entry))
    }

    /// Returns the page if it exists, None for out-of-range indices
    pub fn page(&self, page: usize) -> Option<usize> {
        (page < self.page_count()).then_some(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_book_dimensions() {
        let map = PageMap::new(27);
        assert_eq!(map.page_count(), 30);
        assert_eq!(map.leaves(), 15);
        assert_eq!(map.back_cover(), 29);
    }

    #[test]
    fn test_page_kinds() {
        let map = PageMap::new(27);
        assert_eq!(map.kind(0), PageKind::Cover);
        assert_eq!(map.kind(1), PageKind::Contents);
        assert_eq!(map.kind(2), PageKind::Entry(0));
        assert_eq!(map.kind(28), PageKind::Entry(26));
        assert_eq!(map.kind(29), PageKind::BackCover);
        assert_eq!(map.kind(30), PageKind::Blank);
    }

    #[test]
    fn test_entry_five_lands_on_spread_four() {
        let map = PageMap::new(27);
        assert_eq!(map.entry_page(5), 7);
        assert_eq!(map.spread_of_entry(5), 4);
        // Spread 4 shows page 7 on the left
        assert_eq!(4 * 2 - 1, 7);
    }

    #[test]
    fn test_odd_page_count_rounds_leaves_up() {
        let map = PageMap::new(26);
        assert_eq!(map.page_count(), 29);
        assert_eq!(map.leaves(), 15);
        assert_eq!(map.page(29), None);
        assert_eq!(map.page(28), Some(28));
    }
}
