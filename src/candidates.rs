//! Ordered fallback over a list of candidates.

/// Try `attempt` on each candidate in order and return the first success.
///
/// - Candidates are tried strictly in iteration order; iteration stops at the first success, so
///   later candidates are never touched.
/// - Every failure is passed to `on_failure` (with the candidate's index) before advancing.
/// - If every candidate fails, all collected errors are returned in candidate order. An empty
///   candidate list therefore fails with an empty error list.
pub fn first_success<C, T, E, A, F>(
    candidates: impl IntoIterator<Item = C>,
    mut attempt: A,
    mut on_failure: F,
) -> Result<(usize, T), Vec<E>>
where
    A: FnMut(&C) -> Result<T, E>,
    F: FnMut(usize, &C, &E),
{
    let mut errors = Vec::new();

    for (index, candidate) in candidates.into_iter().enumerate() {
        match attempt(&candidate) {
            Ok(value) => return Ok((index, value)),
            Err(err) => {
                on_failure(index, &candidate, &err);
                errors.push(err);
            }
        }
    }

    Err(errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stops_at_first_success() {
        let mut tried = Vec::new();
        let res = first_success(
            ["a", "b", "c"],
            |c| {
                tried.push(*c);
                if *c == "b" { Ok(c.to_uppercase()) } else { Err(format!("{c} failed")) }
            },
            |_, _, _| {},
        );

        assert_eq!(res, Ok((1, "B".to_owned())));
        assert_eq!(tried, vec!["a", "b"]);
    }

    #[test]
    fn collects_every_failure_in_order() {
        let mut reported = Vec::new();
        let res: Result<(usize, ()), Vec<String>> = first_success(
            ["a", "b"],
            |c| Err(format!("{c} failed")),
            |i, c, e: &String| reported.push((i, c.to_string(), e.clone())),
        );

        assert_eq!(res, Err(vec!["a failed".to_owned(), "b failed".to_owned()]));
        assert_eq!(reported.len(), 2);
        assert_eq!(reported[0].0, 0);
        assert_eq!(reported[1].1, "b");
    }

    #[test]
    fn empty_candidate_list_fails_without_errors() {
        let res: Result<(usize, ()), Vec<String>> =
            first_success(Vec::<&str>::new(), |_| Ok(()), |_, _, _| {});
        assert_eq!(res, Err(Vec::new()));
    }
}
