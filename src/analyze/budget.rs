//! Proportional response-size budgets.

/// Smallest budget any batch receives.
pub const MINIMUM_BATCH_BUDGET: usize = 500;

/// Share of `ceiling` proportional to the batch's share of the included bytes.
///
/// An unknown total (zero bytes) yields a tenth of the ceiling. Results are
/// floored at [`MINIMUM_BATCH_BUDGET`].
pub fn allocate(batch_bytes: u64, total_bytes: u64, ceiling: usize) -> usize {
    if total_bytes == 0 {
        return ceiling / 10;
    }

    let proportion = batch_bytes as f64 / total_bytes as f64;
    let budget = (proportion * ceiling as f64).round() as usize;
    budget.max(MINIMUM_BATCH_BUDGET)
}
