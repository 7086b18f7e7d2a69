use thiserror::Error;

/// Tree partitioning has no failure mode of its own in spec.md §4.4 —
/// every brush list, however degenerate, bottoms out in a leaf. This
/// exists so callers in `compiler` can propagate a single error type
/// through every compile phase uniformly.
#[derive(Debug, Error)]
pub enum BsptreeError {
    #[error("tree exceeded {0} nodes, probable runaway splitter")]
    NodeBudgetExceeded(usize),
}
