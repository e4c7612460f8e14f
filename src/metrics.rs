use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PaginationMetrics {
    pub rows_drawn: usize,
    pub cells_drawn: usize,
    pub page_sets_created: u64,
    pub page_sets_released: usize,
    pub column_groups: usize,
    /// Column groups wider than the printable width.
    pub over_wide_groups: usize,
    /// Rows taller than a freshly opened page set can hold.
    pub oversized_rows: usize,
    pub pages: usize,
    pub total_render_ms: f64,
    pub total_bytes: usize,
}
