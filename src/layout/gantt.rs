use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{ChartConfiguration, LayoutTuning};
use crate::core::{Bounds, DataRow, TimeScale, palette_color};
use crate::error::ChartResult;
use crate::layout::chrome::{
    AXIS_COLOR, GRID_COLOR, MUTED_TEXT_COLOR, TEXT_COLOR, fit_text, push_axis_titles, tooltip,
};
use crate::layout::required;
use crate::render::{
    CanvasLayerKind, Color, LinePrimitive, LineStrokeStyle, PathCommand, PathPrimitive,
    RectPrimitive, RenderFrame, TextHAlign, TextPrimitive,
};

const MILLIS_PER_DAY: f64 = 86_400_000.0;
const TODAY_COLOR: Color = Color::rgb(0.94, 0.27, 0.27);

/// Which row fields produced a task's interval, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntervalSource {
    StartEnd,
    StartDateEndDate,
    StartDuration,
    /// Synthesized from the row index and the layout clock.
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GanttTask {
    pub label: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub source: IntervalSource,
    pub bounds: Bounds,
    /// Completed share in `[0, 1]`.
    pub progress: Option<f64>,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GanttGeometry {
    pub plot: Bounds,
    pub time_scale: TimeScale,
    pub tasks: Vec<GanttTask>,
    /// `(dependency, dependent)` task index pairs.
    pub dependencies: Vec<(usize, usize)>,
    pub today_x: Option<f64>,
}

impl GanttGeometry {
    #[must_use]
    pub fn domain(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        self.time_scale.domain()
    }
}

/// Resolves the interval of the row at `index`.
///
/// Rows without usable dates still get a deterministic interval derived from
/// `index` and `now`, so malformed data renders instead of failing.
#[must_use]
pub fn resolve_interval(
    row: &DataRow,
    index: usize,
    now: DateTime<Utc>,
    tuning: &LayoutTuning,
) -> (DateTime<Utc>, DateTime<Utc>, IntervalSource) {
    let (start, end, source) = if let (Some(start), Some(end)) = (row.datetime("start"), row.datetime("end")) {
        (start, end, IntervalSource::StartEnd)
    } else if let (Some(start), Some(end)) = (row.datetime("startDate"), row.datetime("endDate")) {
        (start, end, IntervalSource::StartDateEndDate)
    } else if let Some((start, end)) = start_plus_duration(row) {
        (start, end, IntervalSource::StartDuration)
    } else {
        fallback_interval(index, now, tuning)
    };
    if end < start {
        debug!(index, "gantt interval ends before it starts, swapping");
        (end, start, source)
    } else {
        (start, end, source)
    }
}

/// `start` plus `duration` days; `None` when either is missing or the end is
/// out of range.
fn start_plus_duration(row: &DataRow) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = row.datetime("start")?;
    let millis = (row.number("duration")? * MILLIS_PER_DAY).round();
    if millis.abs() >= i64::MAX as f64 {
        debug!(millis, "gantt duration out of range");
        return None;
    }
    let end = TimeDelta::try_milliseconds(millis as i64)
        .and_then(|span| start.checked_add_signed(span))?;
    Some((start, end))
}

fn fallback_interval(
    index: usize,
    now: DateTime<Utc>,
    tuning: &LayoutTuning,
) -> (DateTime<Utc>, DateTime<Utc>, IntervalSource) {
    let offset = tuning.gantt_fallback_spacing_days.saturating_mul(index as i64);
    let start = TimeDelta::try_days(offset)
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(now);
    let end = TimeDelta::try_days(tuning.gantt_fallback_span_days)
        .and_then(|span| start.checked_add_signed(span))
        .unwrap_or(start);
    (start, end, IntervalSource::Fallback)
}

fn progress_of(row: &DataRow) -> Option<f64> {
    let raw = row.number("progress")?;
    let share = if raw > 1.0 { raw / 100.0 } else { raw };
    Some(share.clamp(0.0, 1.0))
}

pub fn compute_gantt(
    config: &ChartConfiguration,
    rows: &[DataRow],
    plot: Bounds,
    now: DateTime<Utc>,
    tuning: &LayoutTuning,
) -> ChartResult<GanttGeometry> {
    let label_field = required(config.x_field(), "xAxis.field")?;

    let intervals: Vec<_> = rows
        .iter()
        .enumerate()
        .map(|(index, row)| resolve_interval(row, index, now, tuning))
        .collect();
    let fallbacks = intervals
        .iter()
        .filter(|(_, _, source)| *source == IntervalSource::Fallback)
        .count();
    if fallbacks > 0 {
        warn!(fallbacks, "gantt rows without dates got synthesized intervals");
    }

    let domain_start = intervals.iter().map(|(start, _, _)| *start).min().unwrap_or(now);
    let domain_end = intervals.iter().map(|(_, end, _)| *end).max().unwrap_or(now);
    let time_scale = TimeScale::new(domain_start, domain_end, plot.x, plot.right())?;

    let configured = config
        .task_height
        .filter(|height| height.is_finite() && *height > 0.0)
        .unwrap_or(tuning.gantt_task_height);
    let lane = configured.min(plot.height / rows.len().max(1) as f64);
    let bar_height = lane * 0.7;

    let palette = config.palette();
    let tasks: Vec<GanttTask> = rows
        .iter()
        .zip(intervals)
        .enumerate()
        .map(|(index, (row, (start, end, source)))| {
            let x0 = time_scale.map(start);
            let x1 = time_scale.map(end);
            let y = plot.y + lane * index as f64 + (lane - bar_height) / 2.0;
            GanttTask {
                label: row.text(label_field),
                start,
                end,
                source,
                bounds: Bounds::new(x0, y, (x1 - x0).max(1.0), bar_height),
                progress: progress_of(row),
                color: palette_color(index, palette),
            }
        })
        .collect();

    let dependencies = if config.show_dependencies {
        dependency_pairs(rows, &tasks)
    } else {
        Vec::new()
    };
    let today_x = time_scale.contains(now).then(|| time_scale.map(now));

    Ok(GanttGeometry {
        plot,
        time_scale,
        tasks,
        dependencies,
        today_x,
    })
}

/// Pairs from the comma-separated `dependencies` field; unknown labels are ignored.
fn dependency_pairs(rows: &[DataRow], tasks: &[GanttTask]) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for (dependent, row) in rows.iter().enumerate() {
        let listed = row.text("dependencies");
        for name in listed.split(',').map(str::trim).filter(|name| !name.is_empty()) {
            match tasks.iter().position(|task| task.label == name) {
                Some(dependency) if dependency != dependent => pairs.push((dependency, dependent)),
                Some(_) => {}
                None => debug!(task = %tasks[dependent].label, dependency = name, "unknown gantt dependency"),
            }
        }
    }
    pairs
}

pub fn append_gantt_primitives(
    frame: &mut RenderFrame,
    geometry: &GanttGeometry,
    config: &ChartConfiguration,
    tuning: &LayoutTuning,
) {
    let font = tuning.label_font_px;
    let plot = geometry.plot;

    for tick in geometry.time_scale.ticks(tuning.tick_count) {
        let x = geometry.time_scale.map(tick);
        if config.grid {
            frame.push_line(
                CanvasLayerKind::Grid,
                LinePrimitive::new(x, plot.y, x, plot.bottom(), 1.0, GRID_COLOR),
            );
        }
        frame.push_text(
            CanvasLayerKind::Axis,
            TextPrimitive::new(
                tick.format("%b %d").to_string(),
                x,
                plot.bottom() + 6.0 + font,
                font,
                MUTED_TEXT_COLOR,
                TextHAlign::Center,
            ),
        );
    }
    frame.push_line(
        CanvasLayerKind::Axis,
        LinePrimitive::new(plot.x, plot.bottom(), plot.right(), plot.bottom(), 1.0, AXIS_COLOR),
    );
    push_axis_titles(frame, config.x_axis.as_ref(), None, plot, tuning);

    let label_width = (plot.x - 12.0).max(0.0);
    for task in &geometry.tasks {
        let bounds = task.bounds;
        let mid_y = bounds.y + bounds.height / 2.0;
        frame.push_rect(
            CanvasLayerKind::Series,
            RectPrimitive::new(bounds.x, bounds.y, bounds.width, bounds.height, task.color.with_alpha(0.85))
                .with_corner_radius(3.0)
                .with_tooltip(tooltip(config, || {
                    format!(
                        "{}: {} – {}",
                        task.label,
                        task.start.format("%Y-%m-%d"),
                        task.end.format("%Y-%m-%d")
                    )
                })),
        );
        if let Some(progress) = task.progress.filter(|progress| *progress > 0.0) {
            let inset = bounds.height * 0.3;
            frame.push_rect(
                CanvasLayerKind::Series,
                RectPrimitive::new(
                    bounds.x,
                    bounds.y + inset,
                    bounds.width * progress,
                    bounds.height - 2.0 * inset,
                    task.color.lerp(Color::rgb(0.0, 0.0, 0.0), 0.35),
                ),
            );
        }
        if let Some(label) = fit_text(&task.label, font, label_width) {
            frame.push_text(
                CanvasLayerKind::Axis,
                TextPrimitive::new(label, plot.x - 8.0, mid_y + font * 0.35, font, TEXT_COLOR, TextHAlign::Right),
            );
        }
    }

    for &(dependency, dependent) in &geometry.dependencies {
        let from = geometry.tasks[dependency].bounds;
        let to = geometry.tasks[dependent].bounds;
        let (from_y, to_y) = (from.y + from.height / 2.0, to.y + to.height / 2.0);
        let elbow_x = from.right() + 8.0;
        let elbow = vec![
            PathCommand::MoveTo { x: from.right(), y: from_y },
            PathCommand::LineTo { x: elbow_x, y: from_y },
            PathCommand::LineTo { x: elbow_x, y: to_y },
            PathCommand::LineTo { x: to.x, y: to_y },
        ];
        frame.push_path(CanvasLayerKind::Overlay, PathPrimitive::stroked(elbow, 1.5, MUTED_TEXT_COLOR));
    }

    if let Some(x) = geometry.today_x {
        frame.push_line(
            CanvasLayerKind::Overlay,
            LinePrimitive::new(x, plot.y, x, plot.bottom(), 1.5, TODAY_COLOR)
                .with_stroke_style(LineStrokeStyle::Dashed),
        );
        frame.push_text(
            CanvasLayerKind::Overlay,
            TextPrimitive::new("Today", x, plot.y - 4.0, font, TODAY_COLOR, TextHAlign::Center),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::{IntervalSource, compute_gantt, resolve_interval};
    use crate::config::{AxisConfig, ChartConfiguration, ChartType, LayoutTuning};
    use crate::core::{Bounds, DataRow};
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn interval_priority_and_swap() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).single().expect("now");
        let tuning = LayoutTuning::default();
        let both = DataRow::new()
            .with("start", "2024-01-10")
            .with("end", "2024-01-05")
            .with("startDate", "2023-01-01")
            .with("endDate", "2023-02-01");
        let (start, end, source) = resolve_interval(&both, 0, now, &tuning);
        assert_eq!(source, IntervalSource::StartEnd);
        assert!(start < end);

        let duration = DataRow::new().with("start", "2024-01-01").with("duration", 3.0);
        let (start, end, source) = resolve_interval(&duration, 0, now, &tuning);
        assert_eq!(source, IntervalSource::StartDuration);
        assert_eq!(end - start, Duration::days(3));

        let bare = DataRow::new().with("task", "x");
        let (start, end, source) = resolve_interval(&bare, 2, now, &tuning);
        assert_eq!(source, IntervalSource::Fallback);
        assert_eq!(start, now + Duration::days(14));
        assert_eq!(end, start + Duration::days(5));
    }

    #[test]
    fn dependencies_and_today_marker() {
        let now = Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).single().expect("now");
        let rows = vec![
            DataRow::new().with("task", "design").with("start", "2024-01-01").with("end", "2024-01-04"),
            DataRow::new()
                .with("task", "build")
                .with("start", "2024-01-04")
                .with("end", "2024-01-10")
                .with("dependencies", "design, missing")
                .with("progress", 50.0),
        ];
        let mut config = ChartConfiguration::new(ChartType::Gantt).with_x_axis(AxisConfig::new("task"));
        config.show_dependencies = true;
        let geometry = compute_gantt(
            &config,
            &rows,
            Bounds::new(100.0, 0.0, 900.0, 200.0),
            now,
            &LayoutTuning::default(),
        )
        .expect("gantt");
        assert_eq!(geometry.dependencies, vec![(0, 1)]);
        assert_eq!(geometry.tasks[1].progress, Some(0.5));
        let today = geometry.today_x.expect("today inside domain");
        assert!((today - 300.0).abs() < 1e-6);
    }
}
