//! Dashboard view: session overview and history insights.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    symbols,
    text::{Line, Span},
    widgets::{Axis, BarChart, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use crate::application::Insights;
use crate::tui::styles::ClinicalTheme;

use super::{axis_bounds, axis_labels, key_hints, panel, render_header};

/// Dashboard state for rendering.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub insights: Option<Insights>,
    pub model: String,
}

/// Render the main dashboard view.
pub fn render_dashboard(f: &mut Frame, area: Rect, state: &DashboardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Main content
            Constraint::Length(1), // Actions
        ])
        .split(area);

    render_header(f, chunks[0], "Cardialyze", "Cardiac Arrest Risk Prognosis");

    match &state.insights {
        Some(insights) => render_insights(f, chunks[1], insights),
        None => render_empty(f, chunks[1], &state.model),
    }

    f.render_widget(
        Paragraph::new(key_hints(&[
            ("P", "Prognose"),
            ("H", "History"),
            ("D", "Dataset"),
            ("I", "About"),
            ("Q", "Quit"),
        ])),
        chunks[2],
    );
}

fn render_empty(f: &mut Frame, area: Rect, model: &str) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("No history available.", ClinicalTheme::text_muted())),
        Line::from(""),
        Line::from(vec![
            Span::styled("Press ", ClinicalTheme::text_secondary()),
            Span::styled("[P]", ClinicalTheme::key_hint()),
            Span::styled(" to run the first prognosis.", ClinicalTheme::text_secondary()),
        ]),
        Line::from(""),
        Line::from(Span::styled(format!("Model: {model}"), ClinicalTheme::text_muted())),
    ])
    .alignment(Alignment::Center)
    .block(panel("Overview"));

    f.render_widget(content, area);
}

fn render_insights(f: &mut Frame, area: Rect, insights: &Insights) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Percentage(50),
            Constraint::Min(0),
        ])
        .split(area);

    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 3); 3])
        .split(rows[0]);
    let summary = insights.summary;
    render_card(f, cards[0], "Total Tests", summary.count.to_string(), ClinicalTheme::info());
    render_card(
        f,
        cards[1],
        "Highest Result",
        format!("{:.2}%", summary.max),
        ClinicalTheme::result(summary.max),
    );
    render_card(
        f,
        cards[2],
        "Lowest Result",
        format!("{:.2}%", summary.min),
        ClinicalTheme::result(summary.min),
    );

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);
    render_points(
        f,
        middle[0],
        "Result Trend",
        ("Test", "Result %"),
        &insights.trend,
        GraphType::Line,
    );
    render_points(
        f,
        middle[1],
        "Age vs Result",
        ("Age", "Result %"),
        &insights.age_vs_result,
        GraphType::Scatter,
    );

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(rows[2]);
    render_cholesterol(f, bottom[0], insights);
    render_heart_rate(f, bottom[1], insights);
}

fn render_card(f: &mut Frame, area: Rect, title: &str, value: String, style: ratatui::style::Style) {
    let card = Paragraph::new(vec![Line::from(""), Line::from(Span::styled(value, style))])
        .alignment(Alignment::Center)
        .block(panel(title));
    f.render_widget(card, area);
}

fn render_points(
    f: &mut Frame,
    area: Rect,
    title: &str,
    (x_title, y_title): (&str, &str),
    points: &[(f64, f64)],
    graph: GraphType,
) {
    let x = axis_bounds(points.iter().map(|p| p.0));
    let y = axis_bounds(points.iter().map(|p| p.1));

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(graph)
        .style(ClinicalTheme::series(0))
        .data(points);

    let chart = Chart::new(vec![dataset])
        .block(panel(title))
        .x_axis(
            Axis::default()
                .title(Span::styled(x_title.to_string(), ClinicalTheme::text_muted()))
                .bounds(x)
                .labels(axis_labels(x)),
        )
        .y_axis(
            Axis::default()
                .title(Span::styled(y_title.to_string(), ClinicalTheme::text_muted()))
                .bounds(y)
                .labels(axis_labels(y)),
        );

    f.render_widget(chart, area);
}

fn render_cholesterol(f: &mut Frame, area: Rect, insights: &Insights) {
    let labels: Vec<String> = insights
        .cholesterol_histogram
        .iter()
        .map(|b| format!("{:.0}", b.start))
        .collect();
    let data: Vec<(&str, u64)> = labels
        .iter()
        .zip(&insights.cholesterol_histogram)
        .map(|(label, bin)| (label.as_str(), bin.count as u64))
        .collect();

    let chart = BarChart::default()
        .block(panel("Serum Cholesterol (mg/dl)"))
        .data(&data)
        .bar_width(4)
        .bar_gap(1)
        .bar_style(ClinicalTheme::series(1))
        .value_style(ClinicalTheme::selected());

    f.render_widget(chart, area);
}

fn render_heart_rate(f: &mut Frame, area: Rect, insights: &Insights) {
    let s = insights.max_heart_rate;
    let row = |label: &str, value: f64| {
        Line::from(vec![
            Span::styled(format!("  {label:<8}"), ClinicalTheme::text_secondary()),
            Span::styled(format!("{value:.1}"), ClinicalTheme::text()),
        ])
    };

    let lines = vec![
        Line::from(""),
        row("Min", s.min),
        row("Q1", s.q1),
        row("Median", s.median),
        row("Q3", s.q3),
        row("Max", s.max),
    ];

    f.render_widget(Paragraph::new(lines).block(panel("Max Heart Rate (bpm)")), area);
}
