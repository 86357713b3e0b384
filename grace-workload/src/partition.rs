use std::ops::Range;

use crate::error::{Result, WorkloadError};

/// Splits `len` instructions into `threads` contiguous chunks of
/// `len / threads`. The last chunk also takes the remainder.
pub fn partition(len: usize, threads: usize) -> Result<Vec<Range<usize>>> {
    if threads == 0 {
        return Err(WorkloadError::InvalidThreadCount(threads));
    }

    let chunk = len / threads;
    let ranges = (0..threads)
        .map(|id| {
            let start = id * chunk;
            let end = if id + 1 == threads { len } else { start + chunk };
            start..end
        })
        .collect();

    Ok(ranges)
}

/// 1, 2, 4, .. up to and including `max` when it is a power of two.
pub fn thread_counts(max: usize) -> Result<Vec<usize>> {
    if max == 0 {
        return Err(WorkloadError::InvalidThreadCount(max));
    }

    Ok(std::iter::successors(Some(1usize), |n| n.checked_mul(2))
        .take_while(|n| *n <= max)
        .collect())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::even(8, 4, vec![0..2, 2..4, 4..6, 6..8])]
    #[case::remainder(10, 3, vec![0..3, 3..6, 6..10])]
    #[case::more_threads_than_items(2, 4, vec![0..0, 0..0, 0..0, 0..2])]
    #[case::single(5, 1, vec![0..5])]
    #[case::empty(0, 2, vec![0..0, 0..0])]
    fn test_partition(
        #[case] len: usize,
        #[case] threads: usize,
        #[case] expected: Vec<Range<usize>>,
    ) {
        let ranges = partition(len, threads).unwrap();
        assert_eq!(ranges, expected);
        assert_eq!(ranges.iter().map(|r| r.len()).sum::<usize>(), len);
    }

    #[test]
    fn test_zero_threads_rejected() {
        assert!(matches!(
            partition(10, 0),
            Err(WorkloadError::InvalidThreadCount(0))
        ));
        assert!(thread_counts(0).is_err());
    }

    #[rstest]
    #[case::power_of_two(16, vec![1, 2, 4, 8, 16])]
    #[case::between(6, vec![1, 2, 4])]
    #[case::one(1, vec![1])]
    fn test_thread_counts(#[case] max: usize, #[case] expected: Vec<usize>) {
        assert_eq!(thread_counts(max).unwrap(), expected);
    }
}
