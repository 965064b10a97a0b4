use serde::{Deserialize, Serialize};

use crate::config::{ChartConfiguration, LayoutTuning};
use crate::core::{Bounds, DataRow};
use crate::layout::chrome::{GRID_COLOR, MUTED_TEXT_COLOR, TEXT_COLOR, fit_text};
use crate::render::{
    CanvasLayerKind, Color, LinePrimitive, RectPrimitive, RenderFrame, TextHAlign, TextPrimitive,
};

const HEADER_FILL: Color = Color::rgb(0.95, 0.96, 0.97);
const STRIPE_FILL: Color = Color::rgb(0.98, 0.985, 0.99);

/// Grid of formatted cells; only rows that fit the plot area are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableGeometry {
    pub bounds: Bounds,
    pub columns: Vec<String>,
    /// Display text per visible row, one entry per column.
    pub cells: Vec<Vec<String>>,
    pub column_width: f64,
    pub row_height: f64,
    /// Rows that did not fit below the last visible row.
    pub hidden_rows: usize,
}

/// Columns are the `series` fields when given, else the first row's keys.
#[must_use]
pub fn table_columns(config: &ChartConfiguration, rows: &[DataRow]) -> Vec<String> {
    let configured: Vec<String> = config
        .series
        .iter()
        .map(|series| series.field.clone())
        .filter(|field| !field.trim().is_empty())
        .collect();
    if !configured.is_empty() {
        return configured;
    }
    rows.first()
        .map(|row| row.keys().map(str::to_owned).collect())
        .unwrap_or_default()
}

#[must_use]
pub fn compute_table(
    config: &ChartConfiguration,
    rows: &[DataRow],
    plot: Bounds,
    tuning: &LayoutTuning,
) -> TableGeometry {
    let columns = table_columns(config, rows);
    let row_height = (tuning.label_font_px * 2.2).round();
    let column_width = plot.width / columns.len().max(1) as f64;

    // Header takes one row; keep a line for the overflow notice.
    let capacity = ((plot.height / row_height).floor() as usize).saturating_sub(1);
    let mut visible = rows.len().min(capacity);
    if visible < rows.len() && visible > 0 {
        visible -= 1;
    }
    let cells = rows
        .iter()
        .take(visible)
        .map(|row| columns.iter().map(|column| row.text(column)).collect())
        .collect();

    TableGeometry {
        bounds: plot,
        columns,
        cells,
        column_width,
        row_height,
        hidden_rows: rows.len() - visible,
    }
}

pub fn append_table_primitives(
    frame: &mut RenderFrame,
    geometry: &TableGeometry,
    tuning: &LayoutTuning,
) {
    let font = tuning.label_font_px;
    let x0 = geometry.bounds.x;
    let y0 = geometry.bounds.y;
    let width = geometry.column_width * geometry.columns.len() as f64;
    let cell_text_width = (geometry.column_width - 12.0).max(0.0);
    let baseline = |row_top: f64| row_top + geometry.row_height / 2.0 + font * 0.35;

    frame.push_rect(
        CanvasLayerKind::Background,
        RectPrimitive::new(x0, y0, width, geometry.row_height, HEADER_FILL),
    );
    for (index, column) in geometry.columns.iter().enumerate() {
        if let Some(text) = fit_text(column, font, cell_text_width) {
            frame.push_text(
                CanvasLayerKind::Series,
                TextPrimitive::new(
                    text,
                    x0 + geometry.column_width * index as f64 + 6.0,
                    baseline(y0),
                    font,
                    TEXT_COLOR,
                    TextHAlign::Left,
                )
                .bold(),
            );
        }
    }

    for (row_index, row) in geometry.cells.iter().enumerate() {
        let top = y0 + geometry.row_height * (row_index + 1) as f64;
        if row_index % 2 == 1 {
            frame.push_rect(
                CanvasLayerKind::Background,
                RectPrimitive::new(x0, top, width, geometry.row_height, STRIPE_FILL),
            );
        }
        frame.push_line(
            CanvasLayerKind::Grid,
            LinePrimitive::new(x0, top, x0 + width, top, 1.0, GRID_COLOR),
        );
        for (index, value) in row.iter().enumerate() {
            if let Some(text) = fit_text(value, font, cell_text_width) {
                frame.push_text(
                    CanvasLayerKind::Series,
                    TextPrimitive::new(
                        text,
                        x0 + geometry.column_width * index as f64 + 6.0,
                        baseline(top),
                        font,
                        TEXT_COLOR,
                        TextHAlign::Left,
                    ),
                );
            }
        }
    }

    if geometry.hidden_rows > 0 {
        let top = y0 + geometry.row_height * (geometry.cells.len() + 1) as f64;
        frame.push_text(
            CanvasLayerKind::Overlay,
            TextPrimitive::new(
                format!("+{} more rows", geometry.hidden_rows),
                x0 + 6.0,
                baseline(top),
                font,
                MUTED_TEXT_COLOR,
                TextHAlign::Left,
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::compute_table;
    use crate::config::{ChartConfiguration, ChartType, LayoutTuning, SeriesConfig};
    use crate::core::{Bounds, DataRow};

    fn rows(count: usize) -> Vec<DataRow> {
        (0..count)
            .map(|index| DataRow::new().with("name", format!("n{index}")).with("qty", index as f64))
            .collect()
    }

    #[test]
    fn columns_come_from_first_row_without_series() {
        let config = ChartConfiguration::new(ChartType::Table);
        let geometry = compute_table(
            &config,
            &rows(2),
            Bounds::new(0.0, 0.0, 400.0, 300.0),
            &LayoutTuning::default(),
        );
        assert_eq!(geometry.columns, vec!["name", "qty"]);
        assert_eq!(geometry.cells[1], vec!["n1", "1"]);
        assert_eq!(geometry.hidden_rows, 0);
    }

    #[test]
    fn series_fields_select_columns_and_overflow_is_counted() {
        let config = ChartConfiguration::new(ChartType::Table).with_series(SeriesConfig::new("qty"));
        let geometry = compute_table(
            &config,
            &rows(100),
            Bounds::new(0.0, 0.0, 400.0, 120.0),
            &LayoutTuning::default(),
        );
        assert_eq!(geometry.columns, vec!["qty"]);
        assert!(geometry.hidden_rows > 0);
        assert_eq!(geometry.cells.len() + geometry.hidden_rows, 100);
    }
}
