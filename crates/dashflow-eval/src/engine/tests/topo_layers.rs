use super::common::{Counter, filter_scenario, policies};
use crate::engine::{NodeState, Session};
use dashflow_common::{DashError, Domain};

#[test]
fn test_plan_layers_follow_recorded_edges() {
    let mut s = filter_scenario(Default::default(), &[60.0, 70.0], 50.0);
    let filtered = s.filtered;
    let count = s
        .session
        .register_computation("count", move |cx| Ok(cx.evaluate(filtered)?.len()))
        .unwrap();
    let mean_v = s.mean_v;
    let summary = s
        .session
        .register_computation("summary", move |cx| {
            Ok(format!("{} rows, mean {}", cx.evaluate(count)?, cx.evaluate(mean_v)?))
        })
        .unwrap();

    assert_eq!(s.session.evaluate(summary).unwrap().as_str(), "2 rows, mean 65");

    let schedule = s.session.plan(&[summary.node()]);
    assert!(schedule.cycles.is_empty());
    let layers: Vec<Vec<_>> = schedule.layers.iter().map(|l| l.vertices.clone()).collect();
    assert_eq!(
        layers,
        vec![
            vec![filtered.node()],
            vec![mean_v.node(), count.node()],
            vec![summary.node()],
        ]
    );
    // Parameters are leaves and never scheduled.
    assert!(schedule.order().all(|id| id != s.threshold.node()));
}

#[test]
fn test_evaluate_all_refreshes_only_stale() {
    for config in policies() {
        let mut session = Session::with_config(config);
        let p = session.register_parameter("p", 1.0, Domain::Any).unwrap();
        let q = session.register_parameter("q", 1.0, Domain::Any).unwrap();
        let from_p = session
            .register_computation("from_p", move |cx| cx.get_as::<f64>(p))
            .unwrap();
        let from_q = session
            .register_computation("from_q", move |cx| cx.get_as::<f64>(q))
            .unwrap();
        let both = session
            .register_computation("both", move |cx| {
                Ok(*cx.evaluate(from_p)? + *cx.evaluate(from_q)?)
            })
            .unwrap();

        let first = session.evaluate_all();
        assert_eq!(first.computed, 3);
        assert_eq!(first.failed, 0);

        let idle = session.evaluate_all();
        assert_eq!(idle.computed, 0);

        session.set(q, 5.0).unwrap();
        let second = session.evaluate_all();
        assert_eq!(second.computed, 2, "from_q and both");
        assert_eq!(session.run_count(from_p), 1);
        assert_eq!(*session.cached(both).unwrap(), 6.0);
        assert_eq!(session.state(both).unwrap(), NodeState::Fresh);
    }
}

#[test]
fn test_declared_dependencies_are_edges_before_first_run() {
    let mut session = Session::new();
    let bins = session
        .register_parameter("bins", 10_i64, Domain::Int { min: 1, max: 100 })
        .unwrap();
    let calls = Counter::new();
    let seen = calls.clone();
    // Declares bins but only reads it when asked to; the edge stays anyway.
    let hist = session
        .register_computation_with_deps("histogram", &[bins.node()], move |_cx| {
            seen.hit();
            Ok(vec![0_u32; 4])
        })
        .unwrap();

    assert_eq!(session.dependents(bins), vec![hist.node()]);
    assert_eq!(session.plan(&[hist.node()]).layers.len(), 1);

    session.evaluate(hist).unwrap();
    assert_eq!(session.dependencies(hist), vec![bins.node()]);

    let outcome = session.set(bins, 20_i64).unwrap();
    assert_eq!(outcome.affected, vec![hist.node()]);
    session.evaluate(hist).unwrap();
    assert_eq!(calls.get(), 2);
}

#[test]
fn test_declared_computation_is_read_at_its_first_value() {
    for config in policies() {
        let mut session = Session::with_config(config);
        let p = session.register_parameter("p", 1_i64, Domain::Any).unwrap();
        let doubled = session
            .register_computation("doubled", move |cx| Ok(cx.get_as::<i64>(p)? * 2))
            .unwrap();
        let calls = Counter::new();
        let seen = calls.clone();
        // Declares `doubled` without reading it, so the first run records
        // `doubled` before it has ever been computed.
        let report = session
            .register_computation_with_deps("report", &[doubled.node()], move |_cx| {
                seen.hit();
                Ok(())
            })
            .unwrap();

        session.evaluate(report).unwrap();
        assert_eq!(calls.get(), 1);

        session.evaluate(doubled).unwrap();
        assert_eq!(session.state(report).unwrap(), NodeState::Stale);

        session.evaluate(report).unwrap();
        assert_eq!(calls.get(), 2);
        session.evaluate(report).unwrap();
        assert_eq!(calls.get(), 2);
        assert!(session.is_fresh(report));

        session.set(p, 5_i64).unwrap();
        session.evaluate(report).unwrap();
        assert_eq!(calls.get(), 3);
    }
}

#[test]
fn test_declared_dependency_must_exist() {
    let mut session = Session::new();
    let mut other = Session::new();
    let ghost = other.register_parameter("ghost", 1.0, Domain::Any).unwrap();
    let err = session
        .register_computation_with_deps("c", &[ghost.node()], |_cx| Ok(1_u8))
        .unwrap_err();
    assert!(matches!(err, DashError::UnknownComputation(_)));
}
