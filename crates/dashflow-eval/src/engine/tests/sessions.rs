//! Independent sessions share nothing and can run on separate threads.
use super::common::{filter_scenario, policies};
use crate::engine::Session;
use rayon::prelude::*;

fn assert_send<T: Send>() {}

#[test]
fn test_session_is_send() {
    assert_send::<Session>();
}

#[test]
fn test_parallel_sessions_do_not_interfere() {
    let data: Vec<f64> = (0..100).map(f64::from).collect();
    let thresholds: Vec<f64> = (0..16).map(|i| f64::from(i * 5)).collect();

    let means: Vec<f64> = thresholds
        .par_iter()
        .map(|&t| {
            let mut s = filter_scenario(Default::default(), &data, t);
            let mean = *s.session.evaluate(s.mean_v).unwrap();
            // A write in this session must not be visible anywhere else.
            s.session.set(s.threshold, 97.0).unwrap();
            assert_eq!(*s.session.evaluate(s.mean_v).unwrap(), 98.5);
            mean
        })
        .collect();

    for (t, mean) in thresholds.iter().zip(means) {
        // Rows strictly above t are t+1..=99.
        let expected = (t + 1.0 + 99.0) / 2.0;
        assert_eq!(mean, expected);
    }
}

#[test]
fn test_sessions_move_between_threads() {
    for config in policies() {
        let mut s = filter_scenario(config, &[10.0, 20.0, 30.0], 15.0);
        s.session.evaluate(s.mean_v).unwrap();
        let handle = std::thread::spawn(move || {
            s.session.set(s.threshold, 25.0).unwrap();
            let mean = *s.session.evaluate(s.mean_v).unwrap();
            (mean, s.filter_calls.get())
        });
        let (mean, calls) = handle.join().unwrap();
        assert_eq!(mean, 30.0);
        assert_eq!(calls, 2);
    }
}
