use chrono::NaiveDate;
use dashflow_common::{Domain, ParamValue};
use dashflow_eval::{Computation, EvalMetrics, ParamId, Session, SetOutcome};
use std::sync::Arc;

use crate::config::DashboardConfig;
use crate::dataset::{Dataset, Reading};
use crate::error::BoardResult;
use crate::view::{ChartSpec, Rendered, TableView};

/// Handles to the dashboard's inputs.
#[derive(Debug, Clone, Copy)]
pub struct Inputs {
    pub temp_filter: ParamId,
    pub date_range: ParamId,
    pub show_chart: ParamId,
    pub today: ParamId,
}

/// Handles to the dashboard's derived values.
#[derive(Debug, Clone, Copy)]
pub struct Outputs {
    pub filtered_data: Computation<Vec<Reading>>,
    pub filtered_table: Computation<TableView>,
    pub mean_temperature: Computation<Option<f64>>,
    pub mean_temperature_label: Computation<String>,
    pub current_date_label: Computation<String>,
    pub filtered_chart: Computation<ChartSpec>,
    pub chart_panel: Computation<Option<Arc<ChartSpec>>>,
}

/// One viewer's dashboard: a session holding the sidebar inputs and every
/// panel computed from them over a shared dataset.
pub struct Dashboard {
    title: String,
    dataset: Dataset,
    session: Session,
    inputs: Inputs,
    outputs: Outputs,
}

pub fn format_mean(mean: Option<f64>) -> String {
    match mean {
        Some(m) => format!("{m:.2}°F"),
        None => "n/a".to_string(),
    }
}

fn default_today(config: &DashboardConfig) -> NaiveDate {
    if let Some(today) = config.today {
        return today;
    }
    #[cfg(feature = "system-clock")]
    {
        chrono::Local::now().date_naive()
    }
    #[cfg(not(feature = "system-clock"))]
    {
        config.date_end
    }
}

impl Dashboard {
    pub fn new(dataset: Dataset, config: DashboardConfig) -> BoardResult<Self> {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("dashboard_new", rows = dataset.len()).entered();

        let mut session = Session::with_config(config.eval.clone());

        let inputs = Inputs {
            temp_filter: session.register_parameter(
                "temp_filter",
                config.temperature_default,
                Domain::number(config.temperature_min, config.temperature_max),
            )?,
            date_range: session.register_parameter(
                "date_range",
                (config.date_start, config.date_end),
                Domain::DateRange {
                    min: Some(config.date_min),
                    max: Some(config.date_max),
                },
            )?,
            show_chart: session.register_parameter("show_chart", config.show_chart, Domain::Bool)?,
            today: session.register_parameter(
                "today",
                default_today(&config),
                Domain::Date {
                    min: None,
                    max: None,
                },
            )?,
        };
        let outputs = Self::wire(&mut session, &dataset, inputs)?;

        Ok(Self {
            title: config.title,
            dataset,
            session,
            inputs,
            outputs,
        })
    }

    fn wire(session: &mut Session, dataset: &Dataset, inputs: Inputs) -> BoardResult<Outputs> {
        let Inputs {
            temp_filter,
            date_range,
            show_chart,
            today,
        } = inputs;

        let rows = dataset.clone();
        let filtered_data = session.register_computation("filtered_data", move |cx| {
            let threshold: f64 = cx.get_as(temp_filter)?;
            let (start, end): (NaiveDate, NaiveDate) = cx.get_as(date_range)?;
            Ok(rows
                .iter()
                .filter(|r| r.temperature > threshold && start <= r.date && r.date <= end)
                .cloned()
                .collect::<Vec<_>>())
        })?;

        let filtered_table = session.register_computation("filtered_table", move |cx| {
            Ok(TableView::new(&cx.evaluate(filtered_data)?))
        })?;

        let mean_temperature = session.register_computation("mean_temperature", move |cx| {
            let rows = cx.evaluate(filtered_data)?;
            if rows.is_empty() {
                return Ok(None);
            }
            let sum: f64 = rows.iter().map(|r| r.temperature).sum();
            Ok(Some(sum / rows.len() as f64))
        })?;

        let mean_temperature_label = session
            .register_computation("mean_temperature_label", move |cx| {
                Ok(format_mean(*cx.evaluate(mean_temperature)?))
            })?;

        let current_date_label = session.register_computation("current_date_label", move |cx| {
            let date: NaiveDate = cx.get_as(today)?;
            Ok(date.format("%Y-%m-%d").to_string())
        })?;

        let filtered_chart = session.register_computation("filtered_chart", move |cx| {
            Ok(ChartSpec::scatter(&cx.evaluate(filtered_data)?))
        })?;

        // A hidden panel never reads the chart, so filter changes leave it
        // alone until the panel is shown again.
        let chart_panel = session.register_computation("chart_panel", move |cx| {
            if cx.get_as::<bool>(show_chart)? {
                Ok(Some(cx.evaluate(filtered_chart)?))
            } else {
                Ok(None)
            }
        })?;

        Ok(Outputs {
            filtered_data,
            filtered_table,
            mean_temperature,
            mean_temperature_label,
            current_date_label,
            filtered_chart,
            chart_panel,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn inputs(&self) -> Inputs {
        self.inputs
    }

    pub fn outputs(&self) -> Outputs {
        self.outputs
    }

    pub fn metrics(&self) -> &EvalMetrics {
        self.session.metrics()
    }

    /* ───────────────────────── Sidebar inputs ───────────────────────── */

    pub fn set_temperature_threshold(&mut self, threshold: f64) -> BoardResult<SetOutcome> {
        Ok(self.session.set(self.inputs.temp_filter, threshold)?)
    }

    pub fn set_date_range(&mut self, start: NaiveDate, end: NaiveDate) -> BoardResult<SetOutcome> {
        Ok(self.session.set(self.inputs.date_range, (start, end))?)
    }

    pub fn set_show_chart(&mut self, show: bool) -> BoardResult<SetOutcome> {
        Ok(self.session.set(self.inputs.show_chart, show)?)
    }

    pub fn set_today(&mut self, today: NaiveDate) -> BoardResult<SetOutcome> {
        Ok(self.session.set(self.inputs.today, today)?)
    }

    /// Threshold and date range as one batch, e.g. after a debounced burst
    /// of slider events. Either both apply or neither does.
    pub fn set_filters(
        &mut self,
        threshold: f64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> BoardResult<SetOutcome> {
        Ok(self.session.set_many([
            (self.inputs.temp_filter, ParamValue::Number(threshold)),
            (self.inputs.date_range, ParamValue::DateRange(start, end)),
        ])?)
    }

    /* ───────────────────────── Panels ───────────────────────── */

    pub fn filtered_data(&mut self) -> BoardResult<Arc<Vec<Reading>>> {
        Ok(self.session.evaluate(self.outputs.filtered_data)?)
    }

    pub fn mean_temperature(&mut self) -> BoardResult<Option<f64>> {
        Ok(*self.session.evaluate(self.outputs.mean_temperature)?)
    }

    /// Evaluate every visible panel. Only panels whose inputs changed since
    /// the last render recompute.
    pub fn render(&mut self) -> BoardResult<Rendered> {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("render").entered();

        let o = self.outputs;
        let current_date = self.session.evaluate(o.current_date_label)?;
        let mean_temperature = self.session.evaluate(o.mean_temperature_label)?;
        let table = self.session.evaluate(o.filtered_table)?;
        let chart = self.session.evaluate(o.chart_panel)?;

        Ok(Rendered {
            title: self.title.clone(),
            current_date: (*current_date).clone(),
            mean_temperature: (*mean_temperature).clone(),
            table: (*table).clone(),
            chart: chart.as_deref().cloned(),
        })
    }

    pub fn render_json(&mut self) -> BoardResult<String> {
        let rendered = self.render()?;
        Ok(serde_json::to_string_pretty(&rendered)?)
    }
}
