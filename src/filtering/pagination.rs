/// Page used when `page` is missing, non-numeric or not positive
pub const DEFAULT_PAGE: u64 = 1;
/// Page size used when `per_page` is missing, non-numeric or out of range
pub const DEFAULT_PER_PAGE: u64 = 10;
/// Largest accepted page size
pub const MAX_PER_PAGE: u64 = 10_000;
/// Largest accepted page: its offset at `MAX_PER_PAGE` still binds as a signed 64-bit integer
pub const MAX_PAGE: u64 = MAX_OFFSET / MAX_PER_PAGE + 1;

const MAX_OFFSET: u64 = i64::MAX.unsigned_abs();

/// Leading integer of a string, the way lenient form parsing reads it:
/// surrounding whitespace is ignored and trailing garbage dropped (`"12abc"` is 12).
fn leading_integer(content: &str) -> Option<i64> {
    let trimmed = content.trim_start();
    let sign_len = usize::from(trimmed.starts_with(['-', '+']));
    let digits = trimmed[sign_len..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits == 0 {
        return None;
    }
    trimmed[..sign_len + digits].parse().ok()
}

/// Normalize the `page` parameter to `1..=MAX_PAGE`. Never fails.
#[must_use]
pub fn parse_page(content: Option<&str>) -> u64 {
    content
        .and_then(leading_integer)
        .and_then(|page| u64::try_from(page).ok())
        .filter(|page| (1..=MAX_PAGE).contains(page))
        .unwrap_or(DEFAULT_PAGE)
}

/// Normalize the `per_page` parameter to `2..=MAX_PER_PAGE`. Never fails.
#[must_use]
pub fn parse_per_page(content: Option<&str>) -> u64 {
    content
        .and_then(leading_integer)
        .and_then(|per_page| u64::try_from(per_page).ok())
        .filter(|per_page| (2..=MAX_PER_PAGE).contains(per_page))
        .unwrap_or(DEFAULT_PER_PAGE)
}

/// `LIMIT`/`OFFSET` pair for a 1-based page. The offset never exceeds `i64::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: u64,
    pub limit: u64,
}

impl PageWindow {
    #[must_use]
    pub fn new(per_page: u64, page: u64) -> Self {
        Self {
            offset: page.saturating_sub(1).saturating_mul(per_page).min(MAX_OFFSET),
            limit: per_page,
        }
    }
}
