//! Page window model for the list tables.

use serde::Serialize;
use std::ops::Range;

/// Rows per table page.
pub const PAGE_SIZE: usize = 10;

/// Numbered page links shown around the current page.
pub const MAX_VISIBLE_PAGES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PageItem {
    Previous { enabled: bool },
    Page { number: usize, current: bool },
    Ellipsis,
    Next { enabled: bool },
}

/// The controls to render under a table. Empty when everything fits on one
/// page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageModel {
    /// 1-based, clamped to `1..=total_pages`.
    pub current: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub items: Vec<PageItem>,
}

impl PageModel {
    pub fn new(requested: usize, total_items: usize, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        let total_pages = total_items.div_ceil(page_size).max(1);
        let current = requested.clamp(1, total_pages);
        Self {
            current,
            total_pages,
            total_items,
            items: page_items(current, total_pages),
        }
    }

    /// Index range of the rows on the current page.
    pub fn range(&self, page_size: usize) -> Range<usize> {
        let start = (self.current - 1) * page_size;
        start.min(self.total_items)..(start + page_size).min(self.total_items)
    }
}

fn page_items(current: usize, total: usize) -> Vec<PageItem> {
    if total <= 1 {
        return Vec::new();
    }
    let mut start = current.saturating_sub(MAX_VISIBLE_PAGES / 2).max(1);
    let end = (start + MAX_VISIBLE_PAGES - 1).min(total);
    if end + 1 - start < MAX_VISIBLE_PAGES {
        start = (end + 1).saturating_sub(MAX_VISIBLE_PAGES).max(1);
    }

    let mut items = vec![PageItem::Previous {
        enabled: current > 1,
    }];
    if start > 1 {
        items.push(PageItem::Page {
            number: 1,
            current: false,
        });
        if start > 2 {
            items.push(PageItem::Ellipsis);
        }
    }
    items.extend((start..=end).map(|number| PageItem::Page {
        number,
        current: number == current,
    }));
    if end < total {
        if end < total - 1 {
            items.push(PageItem::Ellipsis);
        }
        items.push(PageItem::Page {
            number: total,
            current: false,
        });
    }
    items.push(PageItem::Next {
        enabled: current < total,
    });
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(model: &PageModel) -> Vec<Option<usize>> {
        model
            .items
            .iter()
            .filter_map(|item| match item {
                PageItem::Page { number, .. } => Some(Some(*number)),
                PageItem::Ellipsis => Some(None),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_single_page_renders_nothing() {
        let model = PageModel::new(1, 7, PAGE_SIZE);
        assert!(model.items.is_empty());
        assert_eq!(model.range(PAGE_SIZE), 0..7);
    }

    #[test]
    fn test_window_in_the_middle() {
        let model = PageModel::new(10, 200, PAGE_SIZE);
        assert_eq!(
            numbers(&model),
            vec![Some(1), None, Some(8), Some(9), Some(10), Some(11), Some(12), None, Some(20)]
        );
        assert_eq!(model.range(PAGE_SIZE), 90..100);
    }

    #[test]
    fn test_window_at_edges() {
        let first = PageModel::new(1, 200, PAGE_SIZE);
        assert_eq!(first.items[0], PageItem::Previous { enabled: false });
        assert_eq!(
            numbers(&first),
            vec![Some(1), Some(2), Some(3), Some(4), Some(5), None, Some(20)]
        );

        let last = PageModel::new(20, 200, PAGE_SIZE);
        assert_eq!(last.items.last(), Some(&PageItem::Next { enabled: false }));
        assert_eq!(
            numbers(&last),
            vec![Some(1), None, Some(16), Some(17), Some(18), Some(19), Some(20)]
        );
    }

    #[test]
    fn test_adjacent_edges_skip_ellipsis() {
        let model = PageModel::new(4, 60, PAGE_SIZE);
        assert_eq!(
            numbers(&model),
            vec![Some(1), Some(2), Some(3), Some(4), Some(5), Some(6)]
        );
    }

    #[test]
    fn test_requested_page_is_clamped() {
        let model = PageModel::new(99, 25, PAGE_SIZE);
        assert_eq!(model.current, 3);
        assert_eq!(model.range(PAGE_SIZE), 20..25);
    }
}
