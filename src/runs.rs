//! Run scanning helpers used by the encoders to pick packet boundaries.

/// Length of the run of equal values at the start of `values`.
pub fn count_consecutive_values(values: &[u8]) -> usize {
    match values.first() {
        Some(first) => values.iter().take_while(|v| *v == first).count(),
        None => 0,
    }
}

/// Longest run of equal values anywhere in `values`, as `(length, start)`.
///
/// The first of several equally long runs wins. Empty input gives `(0, 0)`.
pub fn count_max_consecutive_values(values: &[u8]) -> (usize, usize) {
    let mut max = (0, 0);
    let mut cur_start = 0;
    for (i, v) in values.iter().enumerate() {
        if i > 0 && values[i - 1] != *v {
            cur_start = i;
        }
        let same = i + 1 - cur_start;
        if same > max.0 {
            max = (same, cur_start);
        }
    }
    max
}

/// Longest run of positions where `a` and `b` hold the same value, as
/// `(length, start)`. Only the common prefix length of both slices is scanned.
pub fn count_max_consecutive_equal_values(a: &[u8], b: &[u8]) -> (usize, usize) {
    let mut max = (0, 0);
    let mut same = 0;
    for (i, (x, y)) in a.iter().zip(b).enumerate() {
        if x == y {
            same += 1;
            if same > max.0 {
                max = (same, i + 1 - same);
            }
        } else {
            same = 0;
        }
    }
    max
}
