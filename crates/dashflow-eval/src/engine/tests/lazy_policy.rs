//! Pull-mode specifics: writes only bump versions, staleness is derived.
use super::common::filter_scenario;
use crate::engine::{EvalConfig, NodeState, Vertex};

fn raw_state(v: Option<&Vertex>) -> NodeState {
    v.map(|v| v.state).unwrap()
}

#[test]
fn test_write_does_not_touch_node_flags() {
    let mut s = filter_scenario(EvalConfig::lazy(), &[40.0, 60.0, 70.0], 50.0);
    s.session.evaluate(s.mean_v).unwrap();

    let outcome = s.session.set(s.threshold, 65.0).unwrap();
    // Reported as affected, but the stored flag is untouched...
    assert_eq!(outcome.affected, vec![s.filtered.node(), s.mean_v.node()]);
    let graph = s.session.graph();
    assert_eq!(raw_state(graph.vertex(s.filtered.node())), NodeState::Fresh);
    assert_eq!(raw_state(graph.vertex(s.mean_v.node())), NodeState::Fresh);

    // ...while the observable state is derived from versions.
    assert_eq!(s.session.state(s.filtered).unwrap(), NodeState::Stale);
    assert_eq!(s.session.state(s.mean_v).unwrap(), NodeState::Stale);
    assert_eq!(s.session.metrics().recomputations(), 2);

    assert_eq!(*s.session.evaluate(s.mean_v).unwrap(), 70.0);
    assert_eq!(s.session.state(s.mean_v).unwrap(), NodeState::Fresh);
    assert_eq!(s.session.metrics().recomputations(), 4);
}

#[test]
fn test_write_and_revert_still_recomputes() {
    // Versions only grow, so A -> B -> A is two changes, not zero.
    let mut s = filter_scenario(EvalConfig::lazy(), &[40.0, 60.0], 50.0);
    s.session.evaluate(s.filtered).unwrap();
    s.session.set(s.threshold, 10.0).unwrap();
    s.session.set(s.threshold, 50.0).unwrap();
    assert_eq!(s.session.version(s.threshold), 2);
    assert_eq!(s.session.state(s.filtered).unwrap(), NodeState::Stale);
    s.session.evaluate(s.filtered).unwrap();
    assert_eq!(s.filter_calls.get(), 2);
}

#[test]
fn test_upstream_refresh_by_other_reader() {
    let mut s = filter_scenario(EvalConfig::lazy(), &[40.0, 60.0, 70.0], 50.0);
    s.session.evaluate(s.mean_v).unwrap();
    s.session.set(s.threshold, 65.0).unwrap();

    // Refreshing filtered directly leaves mean_v behind its new version.
    s.session.evaluate(s.filtered).unwrap();
    assert_eq!(s.session.state(s.filtered).unwrap(), NodeState::Fresh);
    assert_eq!(s.session.state(s.mean_v).unwrap(), NodeState::Stale);

    assert_eq!(*s.session.evaluate(s.mean_v).unwrap(), 70.0);
    assert_eq!(s.filter_calls.get(), 2);
    assert_eq!(s.mean_calls.get(), 2);
}
