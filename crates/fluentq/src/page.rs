//! Page descriptor for paginated selects.

/// Requested page window plus the dispatcher-populated result.
///
/// `number` is 1-based; both `number` and `size` are clamped to >= 1 at
/// construction. `total` and `data` are filled in by the paginate protocol.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    number: u64,
    size: u64,
    total: u64,
    data: Vec<T>,
}

impl<T> Page<T> {
    /// Create a page request for the given 1-based page number and size.
    pub fn new(number: u64, size: u64) -> Self {
        Self {
            number: number.max(1),
            size: size.max(1),
            total: 0,
            data: Vec::new(),
        }
    }

    /// 1-based page number.
    pub fn number(&self) -> u64 {
        self.number
    }

    /// Requested page size.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Row offset of this page.
    pub fn offset(&self) -> u64 {
        (self.number - 1) * self.size
    }

    /// Row limit of this page.
    pub fn limit(&self) -> u64 {
        self.size
    }

    /// Total matching row count (0 until populated).
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Rows of this page (empty until populated).
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Consume the page, yielding its rows.
    pub fn into_data(self) -> Vec<T> {
        self.data
    }

    pub(crate) fn set_total(&mut self, total: u64) {
        self.total = total;
    }

    pub(crate) fn set_data(&mut self, data: Vec<T>) {
        self.data = data;
    }
}
