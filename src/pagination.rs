use serde::{Deserialize, Serialize};

/// Paging metadata returned alongside listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_items: u32,
    pub page_size: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination {
            current_page: 1,
            total_items: 0,
            page_size: 0,
        }
    }
}

impl Pagination {
    /// Number of pages; a zero page size means everything fits on one page.
    pub fn total_pages(&self) -> u32 {
        if self.page_size == 0 || self.total_items == 0 {
            return 1;
        }
        self.total_items.div_ceil(self.page_size)
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages()
    }

    pub fn has_prev(&self) -> bool {
        self.current_page > 1
    }
}
