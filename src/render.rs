//! Text and JSON presentation of a [`DashboardOutcome`].

use std::borrow::Cow;
use std::fmt::Write as _;

use anyhow::{Context, Result};
use itertools::Itertools;

use crate::{
    dashboard::{CATEGORY_WARNING, Dashboard, DashboardOutcome, Preview, TREND_WARNING},
    loader::{Column, Row},
    metrics::format_currency,
};

const BAR_WIDTH: usize = 40;
const BAR_GLYPH: char = '#';

pub fn render_json(outcome: &DashboardOutcome) -> Result<String> {
    serde_json::to_string_pretty(outcome).context("Serializing dashboard to JSON")
}

pub fn render_text(outcome: &DashboardOutcome) -> String {
    match outcome {
        DashboardOutcome::Rendered(dashboard) => render_dashboard(dashboard),
        DashboardOutcome::Failed { message } => format!("{message}\n"),
    }
}

fn render_dashboard(dashboard: &Dashboard) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "{}", dashboard.title);
    let _ = writeln!(output, "{}", "=".repeat(dashboard.title.chars().count()));
    let _ = writeln!(output);

    section(&mut output, "Key Metrics");
    let slots = dashboard.kpis.slots();
    let labels = slots.iter().map(|kpi| kpi.label.clone()).collect::<Vec<_>>();
    let values = slots.iter().map(|kpi| kpi.display.clone()).collect::<Vec<_>>();
    output.push_str(&render_columns(&labels, &values));
    let _ = writeln!(output);

    section(&mut output, "Sales Trends");
    match &dashboard.monthly_sales {
        Some(series) => {
            let bars = series
                .iter()
                .map(|point| (point.month.to_string(), point.sales))
                .collect::<Vec<_>>();
            output.push_str(&render_bars(&bars));
        }
        None => warning(&mut output, TREND_WARNING),
    }
    let _ = writeln!(output);

    section(&mut output, "Top Performing Categories");
    match &dashboard.top_categories {
        Some(groups) => {
            let bars = groups
                .iter()
                .map(|group| (group.category.clone(), group.sales))
                .collect::<Vec<_>>();
            output.push_str(&render_bars(&bars));
        }
        None => warning(&mut output, CATEGORY_WARNING),
    }

    if let Some(preview) = &dashboard.preview {
        let _ = writeln!(output);
        render_preview(&mut output, preview);
    }
    output
}

fn section(output: &mut String, title: &str) {
    let _ = writeln!(output, "{title}");
    let _ = writeln!(output, "{}", "-".repeat(title.chars().count()));
}

fn warning(output: &mut String, message: &str) {
    let _ = writeln!(output, "warning: {message}");
}

fn render_preview(output: &mut String, preview: &Preview) {
    section(
        output,
        &format!(
            "Raw Data (first {} of {} row(s))",
            preview.rows.len(),
            preview.total_rows
        ),
    );
    output.push_str(&render_rows(&preview.columns, &preview.rows));
}

/// Renders typed rows as an aligned table; missing cells are blank.
pub fn render_rows(columns: &[Column], rows: &[Row]) -> String {
    let headers = columns.iter().map(|c| c.name.clone()).collect::<Vec<_>>();
    let cells = rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| cell.as_ref().map(|v| v.as_display()).unwrap_or_default())
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    render_table(&headers, &cells)
}

/// Horizontal bar chart, one line per label, scaled to the largest magnitude.
pub fn render_bars(points: &[(String, f64)]) -> String {
    if points.is_empty() {
        return "(no data)\n".to_string();
    }
    let label_width = points
        .iter()
        .map(|(label, _)| display_width(label))
        .max()
        .unwrap_or_default();
    let peak = points
        .iter()
        .map(|(_, value)| value.abs())
        .fold(0.0_f64, f64::max);

    let mut output = String::new();
    for (label, value) in points {
        let length = if peak > 0.0 {
            ((value.abs() / peak) * BAR_WIDTH as f64).round() as usize
        } else {
            0
        };
        let bar = BAR_GLYPH.to_string().repeat(length);
        let padding = " ".repeat(label_width - display_width(label));
        let line = format!(
            "{}{padding}  {bar:<BAR_WIDTH$}  {}",
            sanitize_cell(label),
            format_currency(*value, 0)
        );
        let _ = writeln!(output, "{}", line.trim_end());
    }
    output
}

/// Labels over values, each column padded to its widest cell.
fn render_columns(labels: &[String], values: &[String]) -> String {
    let widths = labels
        .iter()
        .zip(values)
        .map(|(label, value)| display_width(label).max(display_width(value)))
        .collect::<Vec<_>>();
    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(labels, &widths, "    "));
    let _ = writeln!(output, "{}", format_row(values, &widths, "    "));
    output
}

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let column_count = headers.len();
    let mut widths = headers.iter().map(|h| display_width(h)).collect::<Vec<_>>();

    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(display_width(cell));
        }
    }

    for width in &mut widths {
        *width = (*width).max(1);
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths, "  "));

    let separator_widths = widths.iter().map(|w| (*w).max(3)).collect::<Vec<usize>>();
    let separator_cells = separator_widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>();
    let _ = writeln!(
        output,
        "{}",
        format_row(&separator_cells, &separator_widths, "  ")
    );

    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths, "  "));
    }

    output
}

fn format_row(values: &[String], widths: &[usize], gap: &str) -> String {
    let line = values
        .iter()
        .zip(widths)
        .map(|(value, width)| {
            let sanitized = sanitize_cell(value);
            let padding = width.saturating_sub(display_width(sanitized.as_ref()));
            format!("{sanitized}{}", " ".repeat(padding))
        })
        .join(gap);
    line.trim_end().to_string()
}

fn display_width(value: &str) -> usize {
    value.chars().count()
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
