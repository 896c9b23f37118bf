use crate::error::ExecutorError;

/// Split a repetition count into one repetition budget per worker.
///
/// Each worker receives `total / workers` repetitions, so `total % workers`
/// repetitions are dropped and only `(total / workers) * workers` units of
/// work are actually dispatched. This truncation is deliberate: the original
/// harness divided work this way and recorded throughput against the
/// truncated count, so "fixing" it here would silently change the meaning of
/// every log produced since. Callers must not assume `total` is preserved
/// when it is not a multiple of `workers`.
pub fn partition_count(total: u64, workers: usize) -> Result<Vec<u64>, ExecutorError> {
    if workers == 0 {
        return Err(ExecutorError::InvalidWorkerCount);
    }
    let base = total / workers as u64;
    Ok(vec![base; workers])
}

/// Split a list of items into exactly `workers` chunks.
///
/// Chunk sizes always sum to `items.len()`. The `items.len() % workers`
/// leftover items are folded one-per-chunk into the leading chunks, so sizes
/// differ by at most one. When there are fewer items than workers the
/// trailing chunks are empty; the chunk count still equals `workers`.
pub fn partition_items<T>(items: Vec<T>, workers: usize) -> Result<Vec<Vec<T>>, ExecutorError> {
    if workers == 0 {
        return Err(ExecutorError::InvalidWorkerCount);
    }
    let base = items.len() / workers;
    let extra = items.len() % workers;

    let mut chunks = Vec::with_capacity(workers);
    let mut rest = items;
    for index in 0..workers {
        let take = (base + usize::from(index < extra)).min(rest.len());
        let tail = rest.split_off(take);
        chunks.push(rest);
        rest = tail;
    }
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn count_divides_evenly() {
        assert_eq!(partition_count(100, 4).unwrap(), vec![25, 25, 25, 25]);
    }

    #[test]
    fn count_drops_remainder() {
        // 10 repetitions over 4 workers dispatches 8 units, not 10. The
        // truncation is intentional, see the doc comment on partition_count.
        let reps = partition_count(10, 4).unwrap();
        assert_eq!(reps, vec![2, 2, 2, 2]);
        assert_eq!(reps.iter().sum::<u64>(), 8);
    }

    #[test]
    fn count_rejects_zero_workers() {
        assert!(matches!(
            partition_count(10, 0),
            Err(ExecutorError::InvalidWorkerCount)
        ));
    }

    #[test]
    fn items_are_ceiling_balanced() {
        let chunks = partition_items((0..10).collect::<Vec<_>>(), 4).unwrap();
        let sizes: Vec<usize> = chunks.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![3, 3, 2, 2]);
        assert_eq!(
            chunks.into_iter().flatten().collect::<Vec<_>>(),
            (0..10).collect::<Vec<_>>()
        );
    }

    #[test]
    fn items_chunk_sizes_always_sum_to_input_len() {
        for total in 0..40usize {
            for workers in 1..10usize {
                let chunks = partition_items((0..total).collect::<Vec<_>>(), workers).unwrap();
                assert_eq!(chunks.len(), workers);
                assert_eq!(chunks.iter().map(Vec::len).sum::<usize>(), total);
            }
        }
    }

    #[test]
    fn fewer_items_than_workers_leaves_trailing_chunks_empty() {
        let chunks = partition_items(vec!["a", "b"], 4).unwrap();
        assert_eq!(chunks, vec![vec!["a"], vec!["b"], vec![], vec![]]);
    }

    #[test]
    fn items_reject_zero_workers() {
        assert!(matches!(
            partition_items(vec![1, 2, 3], 0),
            Err(ExecutorError::InvalidWorkerCount)
        ));
    }
}
