//! Client-side paging over a filtered sequence.

use std::num::NonZeroUsize;

/// One bounded page of a filtered sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    pub total_pages: usize,
    /// The requested index after clamping into `1..=total_pages`.
    pub page_index: usize,
}

/// Number of pages needed for `len` items; never less than one.
pub fn total_pages(len: usize, page_size: NonZeroUsize) -> usize {
    len.div_ceil(page_size.get()).max(1)
}

/// Clamp a 1-based page index into `1..=total_pages(len, page_size)`.
pub fn clamp_index(page_index: usize, len: usize, page_size: NonZeroUsize) -> usize {
    page_index.clamp(1, total_pages(len, page_size))
}

/// Slice out page `page_index` (1-based) of `filtered`.
///
/// Out-of-range indexes are clamped, so a non-empty sequence never yields an
/// empty page. Callers should store the returned `page_index` back into
/// their window.
pub fn paginate<T>(filtered: &[T], page_size: NonZeroUsize, page_index: usize) -> Page<'_, T> {
    let total_pages = total_pages(filtered.len(), page_size);
    let page_index = page_index.clamp(1, total_pages);
    let start = (page_index - 1) * page_size.get();
    let end = (start + page_size.get()).min(filtered.len());
    Page {
        items: filtered.get(start..end).unwrap_or_default(),
        total_pages,
        page_index,
    }
}

/// Page size plus the current 1-based page index of one screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    page_size: NonZeroUsize,
    page_index: usize,
}

impl PageWindow {
    pub fn new(page_size: NonZeroUsize) -> Self {
        Self {
            page_size,
            page_index: 1,
        }
    }

    pub fn page_size(&self) -> NonZeroUsize {
        self.page_size
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    /// Request a page; the value is clamped on the next [`reclamp`](Self::reclamp).
    pub fn set_page(&mut self, page_index: usize) {
        self.page_index = page_index;
    }

    pub fn first(&mut self) {
        self.page_index = 1;
    }

    pub fn prev(&mut self) {
        self.page_index = self.page_index.saturating_sub(1).max(1);
    }

    pub fn next(&mut self, filtered_len: usize) {
        self.page_index = clamp_index(self.page_index.saturating_add(1), filtered_len, self.page_size);
    }

    pub fn last(&mut self, filtered_len: usize) {
        self.page_index = total_pages(filtered_len, self.page_size);
    }

    /// Re-derive the index after the filtered count changed.
    pub fn reclamp(&mut self, filtered_len: usize) -> usize {
        self.page_index = clamp_index(self.page_index, filtered_len, self.page_size);
        self.page_index
    }

    /// Zero-based position of the first row on the current page, for
    /// serial numbers that continue across pages.
    pub fn row_offset(&self) -> usize {
        (self.page_index.max(1) - 1).saturating_mul(self.page_size.get())
    }

    /// Slice the current page of `filtered`, writing the clamped index back.
    pub fn apply<'a, T>(&mut self, filtered: &'a [T]) -> Page<'a, T> {
        let page = paginate(filtered, self.page_size, self.page_index);
        self.page_index = page.page_index;
        page
    }
}
