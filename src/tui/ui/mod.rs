//! UI module: View components for the TUI.

pub mod about;
pub mod dashboard;
pub mod dataset;
pub mod history;
pub mod prognosis;

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::tui::styles::ClinicalTheme;

pub fn render_disclaimer(f: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(vec![Span::styled(
            "DISCLAIMER: Predictions are indicative only and do not replace a cardiologist's assessment.",
            ClinicalTheme::text_muted(),
        )]),
        Line::from(vec![Span::styled(
            "History is kept for this session only and is lost on exit.",
            ClinicalTheme::text_muted(),
        )]),
    ];

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(ClinicalTheme::border());

    let p = Paragraph::new(text).block(block).wrap(Wrap { trim: true });

    f.render_widget(p, area);
}

/// Screen title bar with a bottom rule.
pub(crate) fn render_header(f: &mut Frame, area: Rect, title: &str, subtitle: &str) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", ClinicalTheme::text()),
        Span::styled(title.to_string(), ClinicalTheme::title()),
        Span::styled(" │ ", ClinicalTheme::text_muted()),
        Span::styled(subtitle.to_string(), ClinicalTheme::text_secondary()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(ClinicalTheme::border()),
    );

    f.render_widget(header, area);
}

/// `[key] description` pairs on one line.
pub(crate) fn key_hints(hints: &[(&str, &str)]) -> Line<'static> {
    let spans = hints
        .iter()
        .flat_map(|(key, desc)| {
            [
                Span::styled(format!("[{key}] "), ClinicalTheme::key_hint()),
                Span::styled(format!("{desc} "), ClinicalTheme::key_desc()),
            ]
        })
        .collect::<Vec<_>>();
    Line::from(spans)
}

/// Footer showing either an error or the key hints.
pub(crate) fn render_footer(
    f: &mut Frame,
    area: Rect,
    error: Option<&str>,
    hints: &[(&str, &str)],
) {
    let content = match error {
        Some(err) => Line::from(vec![
            Span::styled("! ", ClinicalTheme::danger()),
            Span::styled(err.to_string(), ClinicalTheme::danger()),
        ]),
        None => key_hints(hints),
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(ClinicalTheme::border()),
    );

    f.render_widget(footer, area);
}

/// Bordered panel with a styled title.
pub(crate) fn panel(title: &str) -> Block<'static> {
    Block::default()
        .title(Span::styled(format!(" {title} "), ClinicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(ClinicalTheme::border())
}

/// Padded `[lo, hi]` chart bounds; never zero-width.
pub(crate) fn axis_bounds(values: impl Iterator<Item = f64>) -> [f64; 2] {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() || !hi.is_finite() {
        return [0.0, 1.0];
    }
    if (hi - lo).abs() < f64::EPSILON {
        return [lo - 1.0, hi + 1.0];
    }
    let pad = (hi - lo) * 0.05;
    [lo - pad, hi + pad]
}

/// Three evenly spaced axis labels.
pub(crate) fn axis_labels(bounds: [f64; 2]) -> Vec<Span<'static>> {
    let mid = (bounds[0] + bounds[1]) / 2.0;
    [bounds[0], mid, bounds[1]]
        .into_iter()
        .map(|v| Span::styled(format!("{v:.0}"), ClinicalTheme::text_muted()))
        .collect()
}
