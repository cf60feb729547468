//! Page-based listing parameters and envelopes

use serde::{Deserialize, Serialize};

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};

/// `?page&limit` query parameters. `page` is 1-based.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct PageParams {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

/// A validated page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u32,
    pub limit: u32,
}

impl PageWindow {
    pub fn offset(&self) -> usize {
        (self.page as usize - 1) * self.limit as usize
    }

    /// Cut this window out of an already ordered list.
    pub fn slice<T: Clone>(&self, items: &[T]) -> Vec<T> {
        items
            .iter()
            .skip(self.offset())
            .take(self.limit as usize)
            .cloned()
            .collect()
    }
}

impl PageParams {
    /// Apply defaults and bounds from `config`.
    pub fn window(&self, config: &ApiConfig) -> ApiResult<PageWindow> {
        let page = self.page.unwrap_or(1);
        if page == 0 {
            return Err(ApiError::invalid_range("page", 1, u32::MAX));
        }
        let limit = self.limit.unwrap_or(config.default_page_size);
        if limit == 0 || limit > config.max_page_size {
            return Err(ApiError::invalid_range("limit", 1, config.max_page_size));
        }
        Ok(PageWindow { page, limit })
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    /// Total items across all pages
    pub total: usize,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, window: PageWindow, total: usize) -> Self {
        Self {
            items,
            page: window.page,
            limit: window.limit,
            total,
        }
    }
}
