//! Validation of sibling declarations on scoped threads.

use std::{num::NonZeroUsize, thread};

use crate::errors::{ErrorList, SchemaError};

/// Runs `compile` on every item and gathers the results in item order.
///
/// Items are split into contiguous runs, one scoped thread per run, with no
/// more runs than [thread::available_parallelism] reports. Every thread writes
/// only its own slots, so no locking is involved. All failures are reported
/// together through [ErrorList::into_result].
pub(crate) fn compile_each<T, R, F>(items: &[T], compile: F) -> Result<Vec<R>, SchemaError>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> Result<R, SchemaError> + Sync,
{
    let workers = thread::available_parallelism().map_or(1, NonZeroUsize::get);
    compile_chunked(items, workers, compile)
}

fn compile_chunked<T, R, F>(items: &[T], workers: usize, compile: F) -> Result<Vec<R>, SchemaError>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> Result<R, SchemaError> + Sync,
{
    let mut slots: Vec<Option<Result<R, SchemaError>>> = items.iter().map(|_| None).collect();
    let run = items.len().div_ceil(workers.max(1)).max(1);

    thread::scope(|scope| {
        for (items, slots) in items.chunks(run).zip(slots.chunks_mut(run)) {
            let compile = &compile;
            scope.spawn(move || {
                for (item, slot) in items.iter().zip(slots) {
                    *slot = Some(compile(item));
                }
            });
        }
    });

    let mut compiled = Vec::with_capacity(items.len());
    let mut errors = Vec::with_capacity(items.len());

    for result in slots.into_iter().flatten() {
        match result {
            Ok(value) => {
                compiled.push(value);
                errors.push(None);
            }
            Err(e) => errors.push(Some(e)),
        }
    }

    ErrorList::from_slots(errors).into_result()?;

    Ok(compiled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Location;

    fn check(n: &usize) -> Result<usize, SchemaError> {
        if n % 2 == 0 {
            Ok(n * 10)
        } else {
            Err(SchemaError::NoTag {
                at: Location::format(n.to_string()),
            })
        }
    }

    #[test]
    fn test_compile_each_keeps_order() {
        let items = [0usize, 2, 4, 6, 8, 10];
        assert_eq!(compile_each(&items, check), Ok(vec![0, 20, 40, 60, 80, 100]));
    }

    #[test]
    fn test_compile_each_empty() {
        let items: [usize; 0] = [];
        assert_eq!(compile_each(&items, check), Ok(vec![]));
    }

    #[test]
    fn test_compile_each_single_error_unwrapped() {
        let items = [0usize, 3, 4];
        assert_eq!(
            compile_each(&items, check),
            Err(SchemaError::NoTag {
                at: Location::format("3"),
            })
        );
    }

    #[test]
    fn test_compile_each_collects_errors_in_order() {
        let items = [1usize, 2, 3, 5];
        let e = compile_each(&items, check).unwrap_err();

        assert_eq!(
            e.to_string(),
            "format \"1\": missing length tag; \
             format \"3\": missing length tag; \
             format \"5\": missing length tag"
        );
    }

    #[test]
    fn test_compile_chunked_any_worker_count() {
        let items: Vec<usize> = (0..23).map(|n| n * 2).collect();
        let expected: Vec<usize> = items.iter().map(|n| n * 10).collect();

        for workers in [0, 1, 2, 3, 7, 23, 64] {
            assert_eq!(compile_chunked(&items, workers, check), Ok(expected.clone()), "{workers} workers");
        }
    }

    #[test]
    fn test_compile_chunked_keeps_error_order_across_runs() {
        let items = [1usize, 2, 3, 4, 5, 6, 7];
        let e = compile_chunked(&items, 3, check).unwrap_err();

        let SchemaError::Multiple(list) = e else {
            panic!("expected aggregated error, got {e:?}");
        };
        let names: Vec<_> = list
            .iter()
            .map(|e| match e {
                SchemaError::NoTag { at } => at.format.clone(),
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(
            names,
            ["1", "3", "5", "7"].map(|n| Some(n.to_string())).to_vec()
        );
    }

    #[test]
    fn test_compile_each_many_items() {
        let items: Vec<usize> = (0..10_000).map(|n| n * 2).collect();
        assert_eq!(compile_each(&items, check).map(|v| v.len()), Ok(10_000));
    }
}
