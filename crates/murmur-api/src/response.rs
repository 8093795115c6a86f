//! Success envelope and shared query parameters.

use axum::Json;
use murmur_core::page::{DEFAULT_PAGE_SIZE, PageRequest};
use serde::{Deserialize, Serialize};

/// `{"result_code": "SUCCESS", "result": ...}`
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
  pub result_code: &'static str,
  pub result:      T,
}

pub fn success<T: Serialize>(result: T) -> Json<Envelope<T>> {
  Json(Envelope { result_code: "SUCCESS", result })
}

/// `?page=<n>&size=<n>`, both optional.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
  pub page: Option<u32>,
  pub size: Option<u32>,
}

impl From<PageParams> for PageRequest {
  fn from(p: PageParams) -> Self {
    PageRequest::new(p.page.unwrap_or(0), p.size.unwrap_or(DEFAULT_PAGE_SIZE))
  }
}
