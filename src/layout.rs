//! Partitions a total capacity into a geometrically decreasing sequence of
//! sub-array capacities.

/// Builds sub-array capacities for a table sized `total_capacity`, using
/// `min_level_size` as the rough floor for non-tail levels.
///
/// `R` starts at `total_capacity`; while `R` exceeds `2 * min_level_size` we
/// peel off `floor(R / 2)` as the next level and fold the remainder back
/// into `R`. The loop's final remainder becomes the last (smallest) level.
/// This guarantees `sum(capacities) == total_capacity` exactly and that
/// capacities are non-increasing.
pub(crate) fn build_layout(total_capacity: usize, min_level_size: usize) -> Vec<usize> {
    debug_assert!(total_capacity >= 1);
    let threshold = 2 * min_level_size.max(1);

    let mut capacities = Vec::new();
    let mut remaining = total_capacity;
    while remaining > threshold {
        let half = remaining / 2;
        capacities.push(half);
        remaining -= half;
    }
    capacities.push(remaining);
    capacities
}
