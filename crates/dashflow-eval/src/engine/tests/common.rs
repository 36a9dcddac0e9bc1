//! Common test helpers
use crate::engine::{Computation, EvalConfig, ParamId, Session};
use dashflow_common::Domain;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Row {
    pub v: f64,
}

pub fn rows(values: &[f64]) -> Arc<[Row]> {
    values.iter().map(|&v| Row { v }).collect()
}

#[derive(Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// `threshold` (0..=100), `filtered = rows where v > threshold`,
/// `mean_v = mean(filtered.v)`, with a call counter per computation.
pub struct FilterScenario {
    pub session: Session,
    pub threshold: ParamId,
    pub filtered: Computation<Vec<Row>>,
    pub mean_v: Computation<f64>,
    pub filter_calls: Counter,
    pub mean_calls: Counter,
}

pub fn filter_scenario(config: EvalConfig, data: &[f64], threshold: f64) -> FilterScenario {
    let mut session = Session::with_config(config);
    let dataset = rows(data);
    let threshold = session
        .register_parameter("threshold", threshold, Domain::number(0.0, 100.0))
        .unwrap();

    let filter_calls = Counter::new();
    let calls = filter_calls.clone();
    let filtered = session
        .register_computation("filtered", move |cx| {
            calls.hit();
            let t: f64 = cx.get_as(threshold)?;
            Ok(dataset.iter().filter(|r| r.v > t).copied().collect::<Vec<_>>())
        })
        .unwrap();

    let mean_calls = Counter::new();
    let calls = mean_calls.clone();
    let mean_v = session
        .register_computation("mean_v", move |cx| {
            calls.hit();
            let rows = cx.evaluate(filtered)?;
            if rows.is_empty() {
                return Err(cx.fail("no rows above threshold"));
            }
            Ok(rows.iter().map(|r| r.v).sum::<f64>() / rows.len() as f64)
        })
        .unwrap();

    FilterScenario {
        session,
        threshold,
        filtered,
        mean_v,
        filter_calls,
        mean_calls,
    }
}

pub fn values(rows: &[Row]) -> Vec<f64> {
    rows.iter().map(|r| r.v).collect()
}

/// Both invalidation policies, for tests that must hold under either.
pub fn policies() -> [EvalConfig; 2] {
    [EvalConfig::default(), EvalConfig::lazy()]
}
