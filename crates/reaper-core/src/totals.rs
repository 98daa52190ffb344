use std::ops::AddAssign;

/// Running (count, size) accumulator for one resource kind.
///
/// A resource with no size metric still counts; it just contributes zero
/// to the size total.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ReapTotals {
    pub count: u64,
    pub size_gb: f64,
}

impl ReapTotals {
    pub fn record(&mut self, size_gb: Option<f64>) {
        self.count += 1;
        self.size_gb += size_gb.unwrap_or(0.0);
    }
}

impl AddAssign for ReapTotals {
    fn add_assign(&mut self, rhs: Self) {
        self.count += rhs.count;
        self.size_gb += rhs.size_gb;
    }
}
