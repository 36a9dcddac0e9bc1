use chrono::NaiveDate;
use dashflow_board::{BoardError, Dashboard, DashboardConfig, Dataset};
use dashflow_common::DashError;
use dashflow_eval::{EvalConfig, NodeState};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn dataset() -> Dataset {
    Dataset::from_path(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/dataset.csv")).unwrap()
}

fn config(eval: EvalConfig) -> DashboardConfig {
    DashboardConfig {
        today: Some(d(2024, 5, 1)),
        eval,
        ..Default::default()
    }
}

fn dashboard() -> Dashboard {
    Dashboard::new(dataset(), config(EvalConfig::default())).unwrap()
}

#[test]
fn initial_render_uses_defaults() {
    let mut board = dashboard();
    let page = board.render().unwrap();

    assert_eq!(page.title, "Custom Dashboard App");
    assert_eq!(page.current_date, "2024-05-01");
    // Seven readings above 50 inside 2023..=2024; the 2025 row is out of range.
    assert_eq!(page.table.len(), 7);
    assert_eq!(page.mean_temperature, "73.79°F");

    let chart = page.chart.expect("chart shown by default");
    assert_eq!(chart.title, "Temperature Over Time");
    assert_eq!(chart.point_count(), 7);
    let cats: Vec<_> = chart.series.iter().map(|s| s.category.as_str()).collect();
    assert_eq!(cats, vec!["hot", "mild"]);
}

#[test]
fn threshold_change_reruns_only_filter_panels() {
    let mut board = dashboard();
    board.render().unwrap();
    let o = board.outputs();
    let runs = |b: &Dashboard| {
        let s = b.session();
        (
            s.run_count(o.filtered_data),
            s.run_count(o.mean_temperature),
            s.run_count(o.current_date_label),
        )
    };
    assert_eq!(runs(&board), (1, 1, 1));

    board.set_temperature_threshold(80.0).unwrap();
    let page = board.render().unwrap();
    assert_eq!(page.mean_temperature, "88.08°F");
    assert_eq!(page.table.len(), 3);
    assert_eq!(runs(&board), (2, 2, 1));

    // Same value again: nothing to do.
    let outcome = board.set_temperature_threshold(80.0).unwrap();
    assert!(outcome.is_noop());
    board.render().unwrap();
    assert_eq!(runs(&board), (2, 2, 1));
}

#[test]
fn hidden_chart_is_not_recomputed() {
    let mut board = dashboard();
    board.render().unwrap();
    let o = board.outputs();

    board.set_show_chart(false).unwrap();
    let page = board.render().unwrap();
    assert!(page.chart.is_none());
    assert_eq!(board.session().run_count(o.filtered_chart), 1);

    board.set_temperature_threshold(60.0).unwrap();
    board.render().unwrap();
    assert_eq!(board.session().run_count(o.filtered_chart), 1);
    assert_eq!(board.session().state(o.filtered_chart).unwrap(), NodeState::Stale);

    board.set_show_chart(true).unwrap();
    let page = board.render().unwrap();
    assert_eq!(page.chart.unwrap().point_count(), page.table.len());
    assert_eq!(board.session().run_count(o.filtered_chart), 2);
}

#[test]
fn date_range_narrows_rows() {
    let mut board = dashboard();
    board.set_date_range(d(2024, 1, 1), d(2024, 12, 31)).unwrap();
    let page = board.render().unwrap();
    assert_eq!(page.table.len(), 4);
    assert_eq!(page.mean_temperature, "72.44°F");
    assert!(page.table.rows.iter().all(|r| r.date.format("%Y").to_string() == "2024"));
}

#[test]
fn empty_selection_shows_placeholder() {
    let mut board = dashboard();
    board.set_temperature_threshold(95.0).unwrap();
    let page = board.render().unwrap();
    assert!(page.table.is_empty());
    assert_eq!(page.mean_temperature, "n/a");
    assert_eq!(board.mean_temperature().unwrap(), None);
    assert_eq!(page.chart.unwrap().point_count(), 0);
}

#[test]
fn invalid_inputs_are_rejected() {
    let mut board = dashboard();
    let before = board.render().unwrap();

    let err = board.set_temperature_threshold(150.0).unwrap_err();
    assert!(matches!(
        err.as_eval(),
        Some(DashError::InvalidValue { parameter, .. }) if parameter == "temp_filter"
    ));

    // Reversed and out-of-bounds ranges.
    assert!(board.set_date_range(d(2024, 6, 1), d(2024, 1, 1)).is_err());
    assert!(board.set_date_range(d(2022, 1, 1), d(2023, 6, 1)).is_err());

    // A failing batch leaves both inputs untouched.
    assert!(matches!(
        board.set_filters(40.0, d(2025, 1, 1), d(2025, 2, 1)),
        Err(BoardError::Eval(DashError::InvalidValue { .. }))
    ));

    assert_eq!(board.render().unwrap(), before);
}

#[test]
fn batched_filters_apply_together() {
    let mut board = dashboard();
    board.render().unwrap();
    let o = board.outputs();

    let outcome = board
        .set_filters(80.0, d(2024, 1, 1), d(2024, 12, 31))
        .unwrap();
    assert_eq!(outcome.changed.len(), 2);
    let page = board.render().unwrap();
    // 91.0 and 84.75
    assert_eq!(page.table.len(), 2);
    assert_eq!(board.session().run_count(o.filtered_data), 2);
}

#[test]
fn today_only_touches_the_date_box() {
    let mut board = dashboard();
    board.render().unwrap();
    let o = board.outputs();

    let outcome = board.set_today(d(2024, 5, 2)).unwrap();
    assert_eq!(outcome.affected, vec![o.current_date_label.node()]);
    let page = board.render().unwrap();
    assert_eq!(page.current_date, "2024-05-02");
    assert_eq!(board.session().run_count(o.filtered_data), 1);
}

#[test]
fn lazy_policy_renders_identically() {
    let mut eager = dashboard();
    let mut lazy = Dashboard::new(dataset(), config(EvalConfig::lazy())).unwrap();

    for threshold in [50.0, 70.0, 95.0, 30.0] {
        eager.set_temperature_threshold(threshold).unwrap();
        lazy.set_temperature_threshold(threshold).unwrap();
        assert_eq!(eager.render().unwrap(), lazy.render().unwrap());
    }
    assert_eq!(
        eager.metrics().recomputations(),
        lazy.metrics().recomputations()
    );
}

#[test]
fn render_json_shape() {
    let mut board = dashboard();
    board.set_show_chart(false).unwrap();
    let json: serde_json::Value = serde_json::from_str(&board.render_json().unwrap()).unwrap();
    assert_eq!(json["title"], "Custom Dashboard App");
    assert_eq!(json["mean_temperature"], "73.79°F");
    assert_eq!(json["table"]["columns"][1], "temperature");
    assert_eq!(json["table"]["rows"][0]["date"], "2023-05-20");
    assert!(json["chart"].is_null());
}

#[test]
fn config_from_file() {
    use std::io::Write;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{ "title": "Weather", "temperature_default": 80, "show_chart": false, "today": "2024-01-01" }}"#
    )
    .unwrap();

    let cfg = DashboardConfig::from_path(file.path()).unwrap();
    let mut board = Dashboard::new(dataset(), cfg).unwrap();
    let page = board.render().unwrap();
    assert_eq!(page.title, "Weather");
    assert_eq!(page.mean_temperature, "88.08°F");
    assert!(page.chart.is_none());
}

#[test]
fn default_outside_bounds_fails_construction() {
    let cfg = DashboardConfig {
        temperature_default: 120.0,
        ..config(EvalConfig::default())
    };
    assert!(matches!(
        Dashboard::new(dataset(), cfg),
        Err(BoardError::Eval(DashError::InvalidValue { .. }))
    ));
}
