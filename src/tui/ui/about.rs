//! About view: purpose, model and features.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

use crate::domain::SchemaVersion;
use crate::tui::styles::ClinicalTheme;

use super::{panel, render_footer, render_header};

const PURPOSE: &str = "Cardialyze estimates the likelihood of cardiac arrest from routine \
clinical measurements. It supports, and does not replace, the judgement of a cardiologist.";

const MODEL: &str = "Predictions come from a gradient-boosted decision tree ensemble trained \
on the public heart disease dataset. The model file is checked against its manifest digest, \
when one is present, before the application starts.";

/// Render the about view
pub fn render_about(f: &mut Frame, area: Rect, schema: SchemaVersion, model: &str) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(6), // Purpose
            Constraint::Length(7), // Model
            Constraint::Min(0),    // Features
            Constraint::Length(3), // Footer
        ])
        .split(area);

    render_header(f, chunks[0], "About", "Cardiac Arrest Risk Prognosis");

    let purpose = Paragraph::new(Span::styled(PURPOSE, ClinicalTheme::text()))
        .wrap(Wrap { trim: true })
        .block(panel("Purpose"));
    f.render_widget(purpose, chunks[1]);

    let model_text = vec![
        Line::from(Span::styled(MODEL, ClinicalTheme::text())),
        Line::from(""),
        Line::from(vec![
            Span::styled("Loaded: ", ClinicalTheme::text_secondary()),
            Span::styled(model.to_string(), ClinicalTheme::info()),
        ]),
    ];
    let model_panel = Paragraph::new(model_text)
        .wrap(Wrap { trim: true })
        .block(panel("Prediction Model"));
    f.render_widget(model_panel, chunks[2]);

    let features: Vec<Line> = schema
        .fields()
        .iter()
        .map(|field| {
            Line::from(vec![
                Span::styled("  • ", ClinicalTheme::key_hint()),
                Span::styled(field.label(), ClinicalTheme::text()),
                Span::styled(format!(" ({})", field.feature_name()), ClinicalTheme::text_muted()),
            ])
        })
        .collect();
    f.render_widget(
        Paragraph::new(features).block(panel(&format!(
            "Features Considered ({})",
            schema.feature_count()
        ))),
        chunks[3],
    );

    render_footer(f, chunks[4], None, &[("Esc", "Back")]);
}
