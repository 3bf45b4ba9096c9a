//! Page clamping and pagination metadata.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

/// Raw `page` / `limit` query parameters, kept as text so malformed values
/// fall back to defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// A clamped page request: `page >= 1`, `1 <= limit <= MAX_LIMIT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    /// Missing, non-numeric and zero values take the default; the rest are
    /// clamped into range.
    pub fn from_params(params: &PageParams) -> Self {
        let page = leading_integer(params.page.as_deref())
            .filter(|v| *v != 0)
            .unwrap_or(i64::from(DEFAULT_PAGE));
        let limit = leading_integer(params.limit.as_deref())
            .filter(|v| *v != 0)
            .unwrap_or(i64::from(DEFAULT_LIMIT));

        Self {
            page: page.clamp(1, i64::from(u32::MAX)) as u32,
            limit: limit.clamp(1, i64::from(MAX_LIMIT)) as u32,
        }
    }
}

/// Integer prefix of `raw` (`"12abc"` reads as 12); out-of-range values
/// saturate.
fn leading_integer(raw: Option<&str>) -> Option<i64> {
    let trimmed = raw?.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits_end = rest.bytes().position(|b| !b.is_ascii_digit()).unwrap_or(rest.len());
    if digits_end == 0 {
        return None;
    }

    let magnitude = rest[..digits_end].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}

/// Pagination metadata returned alongside a page of transfers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u64,
    pub total_count: u64,
    pub limit: u32,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl Pagination {
    pub fn new(request: PageRequest, total_count: u64) -> Self {
        let total_pages = total_count.div_ceil(u64::from(request.limit));
        Self {
            current_page: request.page,
            total_pages,
            total_count,
            limit: request.limit,
            has_next_page: u64::from(request.page) < total_pages,
            has_previous_page: request.page > 1,
        }
    }
}
