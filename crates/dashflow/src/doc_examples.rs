use crate::{DashResult, Domain, Session};

/// Mean of the values strictly above `threshold`, computed through a
/// two-step session so that repeated calls exercise the cache.
///
/// # Example
///
/// ```rust
/// # use dashflow::doc_examples::mean_above;
/// let (first, second, runs) = mean_above(&[40.0, 60.0, 70.0], 50.0, 65.0)?;
/// assert_eq!(first, Some(65.0));
/// assert_eq!(second, Some(70.0));
/// assert_eq!(runs, 2);
/// # Ok::<(), dashflow::DashError>(())
/// ```
pub fn mean_above(
    values: &[f64],
    threshold: f64,
    then: f64,
) -> DashResult<(Option<f64>, Option<f64>, u64)> {
    let mut session = Session::new();
    let data: Vec<f64> = values.to_vec();
    let t = session.register_parameter("threshold", threshold, Domain::Any)?;
    let above = session.register_computation("above", move |cx| {
        let t: f64 = cx.get_as(t)?;
        Ok(data.iter().copied().filter(|v| *v > t).collect::<Vec<_>>())
    })?;
    let mean = session.register_computation("mean", move |cx| {
        let rows = cx.evaluate(above)?;
        Ok((!rows.is_empty()).then(|| rows.iter().sum::<f64>() / rows.len() as f64))
    })?;

    let first = *session.evaluate(mean)?;
    // Cached: no rerun.
    session.evaluate(mean)?;
    session.set(t, then)?;
    let second = *session.evaluate(mean)?;
    Ok((first, second, session.run_count(above)))
}
