use serde::Serialize;

/// Reads a 1-based page number. Anything that is not a positive integer means
/// the first page.
pub fn parse_page(raw: Option<&str>) -> i64 {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .filter(|page| *page >= 1)
        .unwrap_or(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl PageInfo {
    /// Requests past the end land on the last page; an empty set has one empty page.
    pub fn clamp(requested: i64, per_page: i64, total: i64) -> Self {
        let per_page = per_page.max(1);
        let total = total.max(0);
        let total_pages = ((total + per_page - 1) / per_page).max(1);
        Self {
            page: requested.clamp(1, total_pages),
            per_page,
            total,
            total_pages,
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }
}

/// Escapes `%`, `_` and `\` and wraps the term for a substring `ILIKE`.
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
