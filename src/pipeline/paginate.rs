//! Grid pagination: which page, row and column a badge lands on.
//!
//! Label sheets are filled in raster order (left to right, top to bottom) and
//! a new sheet starts every `per_page` badges. Nothing is stored; positions
//! are recomputed from the running 1-based index, so identical ordered input
//! always yields identical sheets.

use crate::error::BadgeError;

/// A validated `per_page × columns` label grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    per_page: usize,
    columns: usize,
}

/// Where one badge sits on the printed sheets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellPosition {
    /// 0-based page (table) number.
    pub page: usize,
    /// 0-based row within the page.
    pub row: usize,
    /// 0-based column within the row.
    pub column: usize,
    /// True for the first badge on a page: the caller starts a new table.
    pub starts_page: bool,
}

impl Grid {
    /// Create a grid. `per_page` must be a positive multiple of `columns`.
    pub fn new(per_page: usize, columns: usize) -> Result<Self, BadgeError> {
        if per_page == 0 || columns == 0 || per_page % columns != 0 {
            return Err(BadgeError::InvalidConfig(format!(
                "label grid needs per_page to be a positive multiple of columns \
                 (per_page={per_page}, columns={columns})"
            )));
        }
        Ok(Self { per_page, columns })
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.per_page / self.columns
    }

    /// Position of the badge with the given 1-based index.
    pub fn position(&self, index: usize) -> CellPosition {
        let zero_based = index.max(1) - 1;
        let cell = zero_based % self.per_page;
        CellPosition {
            page: zero_based / self.per_page,
            row: cell / self.columns,
            column: cell % self.columns,
            starts_page: cell == 0,
        }
    }

    /// Number of pages needed for `count` badges.
    pub fn page_count(&self, count: usize) -> usize {
        count.div_ceil(self.per_page)
    }
}
