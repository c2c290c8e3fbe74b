use serde::{Deserialize, Serialize};

/// Bounds applied to the `per_page` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_per_page: u32,
    pub max_per_page: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_per_page: 15,
            max_per_page: 100,
        }
    }
}

/// A 1-based page selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.per_page)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.per_page)
    }
}

/// One page of results plus its position in the full result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub current_page: u32,
    pub per_page: u32,
    pub total: u64,
    pub last_page: u32,
    pub from: Option<u64>,
    pub to: Option<u64>,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, total: u64, request: PageRequest) -> Self {
        let per_page = u64::from(request.per_page);
        let last_page = total.div_ceil(per_page).max(1);
        let (from, to) = if data.is_empty() {
            (None, None)
        } else {
            let from = request.offset() + 1;
            (Some(from), Some(from + data.len() as u64 - 1))
        };
        Self {
            data,
            current_page: request.page,
            per_page: request.per_page,
            total,
            last_page: u32::try_from(last_page).unwrap_or(u32::MAX),
            from,
            to,
        }
    }

    pub fn map_items<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            current_page: self.current_page,
            per_page: self.per_page,
            total: self.total,
            last_page: self.last_page,
            from: self.from,
            to: self.to,
        }
    }
}
