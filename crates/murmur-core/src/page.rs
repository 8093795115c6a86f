//! Offset pagination.
//!
//! Every list query orders by `registered_at ASC, id ASC`. Rows are only ever
//! appended, so a page boundary already handed out never shifts.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Zero-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
  pub page: u32,
  pub size: u32,
}

impl PageRequest {
  /// Build a request, clamping `size` into `1..=MAX_PAGE_SIZE`.
  pub fn new(page: u32, size: u32) -> Self {
    Self { page, size: size.clamp(1, MAX_PAGE_SIZE) }
  }

  pub fn offset(&self) -> u64 { u64::from(self.page) * u64::from(self.size) }

  pub fn limit(&self) -> u64 { u64::from(self.size) }
}

impl Default for PageRequest {
  fn default() -> Self { Self { page: 0, size: DEFAULT_PAGE_SIZE } }
}

/// One page of results plus the totals needed to render a pager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
  pub content:        Vec<T>,
  pub page:           u32,
  pub size:           u32,
  pub total_elements: u64,
  pub total_pages:    u64,
}

impl<T> Page<T> {
  pub fn new(content: Vec<T>, request: PageRequest, total_elements: u64) -> Self {
    let size = u64::from(request.size);
    Self {
      content,
      page: request.page,
      size: request.size,
      total_elements,
      total_pages: total_elements.div_ceil(size),
    }
  }

  pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
    Page {
      content:        self.content.into_iter().map(f).collect(),
      page:           self.page,
      size:           self.size,
      total_elements: self.total_elements,
      total_pages:    self.total_pages,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn size_is_clamped() {
    assert_eq!(PageRequest::new(0, 0).size, 1);
    assert_eq!(PageRequest::new(0, 10_000).size, MAX_PAGE_SIZE);
  }

  #[test]
  fn offset_and_total_pages() {
    let req = PageRequest::new(2, 10);
    assert_eq!(req.offset(), 20);

    let page = Page::new(vec![1, 2, 3], req, 23);
    assert_eq!(page.total_pages, 3);

    let empty: Page<i32> = Page::new(vec![], PageRequest::default(), 0);
    assert_eq!(empty.total_pages, 0);
  }
}
