//! Prognosis form: patient identity plus the model's clinical fields.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use zeroize::Zeroize;

use crate::domain::{
    Categorical, ChestPainType, EcgResult, ExerciseAngina, FastingBloodSugar, FeatureField,
    FieldBounds, Gender, InputForm, MajorVessels, NumericBounds, PatientIdentity, SchemaVersion,
    StSlope, Thalassemia,
};
use crate::tui::styles::ClinicalTheme;

use super::{render_footer, render_header};

/// What a form field edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldId {
    Name,
    IcNumber,
    Feature(FeatureField),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text,
    Numeric(NumericBounds),
    Choice(Vec<&'static str>),
}

#[derive(Debug, Clone)]
pub struct FormField {
    pub id: FieldId,
    pub label: &'static str,
    pub hint: String,
    pub kind: FieldKind,
    pub value: String,
}

impl FormField {
    fn reset(&mut self) {
        self.value.zeroize();
        if let FieldKind::Choice(options) = &self.kind {
            self.value = options.first().copied().unwrap_or_default().to_string();
        }
    }
}

/// Prognosis form state
pub struct PrognosisFormState {
    pub schema: SchemaVersion,
    pub fields: Vec<FormField>,
    pub selected_field: usize,
    pub error_message: Option<String>,
    /// Result line of the last calculation.
    pub result: Option<(String, f64)>,
}

impl PrognosisFormState {
    #[must_use]
    pub fn new(schema: SchemaVersion, bounds: &FieldBounds) -> Self {
        let mut fields = vec![
            FormField {
                id: FieldId::Name,
                label: "Name",
                hint: "patient name".to_string(),
                kind: FieldKind::Text,
                value: String::new(),
            },
            FormField {
                id: FieldId::IcNumber,
                label: "IC Number",
                hint: "e.g. 850101-14-5523".to_string(),
                kind: FieldKind::Text,
                value: String::new(),
            },
        ];

        for feature in schema.fields() {
            let kind = match bounds.for_field(*feature) {
                Some(b) => FieldKind::Numeric(b),
                None => FieldKind::Choice(options(*feature)),
            };
            let hint = match &kind {
                FieldKind::Numeric(b) => format!("{} - {}", b.min, b.max),
                _ => "←/→ to change".to_string(),
            };
            fields.push(FormField {
                id: FieldId::Feature(*feature),
                label: feature.label(),
                hint,
                kind,
                value: String::new(),
            });
        }

        let mut state = Self {
            schema,
            fields,
            selected_field: 0,
            error_message: None,
            result: None,
        };
        state.reset_all();
        state
    }

    /// Move to the next field
    pub fn next_field(&mut self) {
        self.selected_field = (self.selected_field + 1) % self.fields.len();
    }

    /// Move to the previous field
    pub fn prev_field(&mut self) {
        if self.selected_field == 0 {
            self.selected_field = self.fields.len() - 1;
        } else {
            self.selected_field -= 1;
        }
    }

    /// Add a character to the current field
    pub fn input_char(&mut self, c: char) {
        let field = &mut self.fields[self.selected_field];
        let accepted = match field.kind {
            FieldKind::Text => !c.is_control(),
            FieldKind::Numeric(_) => c.is_ascii_digit() || c == '.' || c == '-',
            FieldKind::Choice(_) => false,
        };
        if accepted {
            field.value.push(c);
            self.error_message = None;
        }
    }

    /// Delete the last character
    pub fn delete_char(&mut self) {
        let field = &mut self.fields[self.selected_field];
        if !matches!(field.kind, FieldKind::Choice(_)) {
            field.value.pop();
        }
    }

    /// Clear the current field
    pub fn clear_field(&mut self) {
        let field = &mut self.fields[self.selected_field];
        if !matches!(field.kind, FieldKind::Choice(_)) {
            field.value.zeroize();
        }
    }

    /// Step a choice field through its options, wrapping around.
    pub fn cycle_choice(&mut self, forward: bool) {
        let field = &mut self.fields[self.selected_field];
        let FieldKind::Choice(options) = &field.kind else {
            return;
        };
        if options.is_empty() {
            return;
        }
        let current = options.iter().position(|o| *o == field.value).unwrap_or(0);
        let next = if forward {
            (current + 1) % options.len()
        } else {
            (current + options.len() - 1) % options.len()
        };
        field.value = options[next].to_string();
        self.error_message = None;
    }

    /// Wipe every buffer and restore default choices.
    pub fn reset_all(&mut self) {
        for field in &mut self.fields {
            field.reset();
        }
        self.error_message = None;
        self.result = None;
        self.selected_field = 0;
    }

    /// Wipe all field buffers from memory.
    pub fn clear_sensitive(&mut self) {
        for field in &mut self.fields {
            field.value.zeroize();
        }
        self.error_message = None;
        self.result = None;
    }

    /// Fill the form with a typical patient.
    pub fn load_sample_data(&mut self) {
        for field in &mut self.fields {
            let value = match field.id {
                FieldId::Name => "Ahmad bin Ismail",
                FieldId::IcNumber => "700312-10-5511",
                FieldId::Feature(feature) => sample_value(feature),
            };
            field.value.zeroize();
            field.value.push_str(value);
        }
        self.error_message = None;
    }

    /// Record the outcome of a calculation.
    pub fn set_result(&mut self, percent: &str, value: f64) {
        self.result = Some((
            format!("There is a {percent} chance of developing cardiac arrest."),
            value,
        ));
        self.error_message = None;
    }

    fn value(&self, id: FieldId) -> &str {
        self.fields
            .iter()
            .find(|f| f.id == id)
            .map_or("", |f| f.value.as_str())
    }

    fn numeric(&self, feature: FeatureField) -> Result<f64, String> {
        let field = self
            .fields
            .iter()
            .find(|f| f.id == FieldId::Feature(feature))
            .ok_or_else(|| format!("{} is required", feature.label()))?;
        let FieldKind::Numeric(bounds) = field.kind else {
            return Err(format!("{}: not a numeric field", field.label));
        };

        let raw = field.value.trim();
        if raw.is_empty() {
            return Err(format!("{}: Enter a number", field.label));
        }
        let value: f64 = raw
            .parse()
            .map_err(|_| format!("{}: Invalid number", field.label))?;
        if !value.is_finite() {
            return Err(format!("{}: Invalid number", field.label));
        }
        Ok(bounds.clamp(value))
    }

    fn whole(&self, feature: FeatureField) -> Result<u16, String> {
        let value = self.numeric(feature)?.round();
        if !(0.0..=f64::from(u16::MAX)).contains(&value) {
            return Err(format!("{}: Out of range", feature.label()));
        }
        Ok(value as u16)
    }

    fn choice<T: Categorical>(&self, feature: FeatureField) -> Result<T, String> {
        T::from_label(self.value(FieldId::Feature(feature))).map_err(|e| e.to_string())
    }

    fn optional_choice<T: Categorical>(&self, feature: FeatureField) -> Result<Option<T>, String> {
        if self.schema.includes(feature) {
            self.choice(feature).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Build an `InputForm`; numeric values are clamped to their bounds.
    ///
    /// Blank identity is left for the normalizer to reject.
    pub fn to_input_form(&self) -> Result<InputForm, String> {
        let oldpeak = (self.numeric(FeatureField::Oldpeak)? * 10.0).round() / 10.0;
        Ok(InputForm {
            identity: PatientIdentity::new(
                self.value(FieldId::Name).trim(),
                self.value(FieldId::IcNumber).trim(),
            ),
            age: self.whole(FeatureField::Age)?,
            gender: self.choice::<Gender>(FeatureField::Gender)?,
            chest_pain_type: self.choice::<ChestPainType>(FeatureField::ChestPainType)?,
            resting_blood_pressure: self.whole(FeatureField::RestingBloodPressure)?,
            serum_cholesterol: self.whole(FeatureField::SerumCholesterol)?,
            fasting_blood_sugar: self.choice::<FastingBloodSugar>(FeatureField::FastingBloodSugar)?,
            ecg_result: self.choice::<EcgResult>(FeatureField::EcgResult)?,
            max_heart_rate: self.whole(FeatureField::MaxHeartRate)?,
            major_vessels: self.optional_choice::<MajorVessels>(FeatureField::MajorVessels)?,
            thalassemia: self.optional_choice::<Thalassemia>(FeatureField::Thalassemia)?,
            exercise_angina: self.choice::<ExerciseAngina>(FeatureField::ExerciseAngina)?,
            oldpeak,
            st_slope: self.choice::<StSlope>(FeatureField::StSlope)?,
        })
    }
}

impl Drop for PrognosisFormState {
    fn drop(&mut self) {
        self.clear_sensitive();
    }
}

fn options(feature: FeatureField) -> Vec<&'static str> {
    match feature {
        FeatureField::Gender => Gender::labels(),
        FeatureField::ChestPainType => ChestPainType::labels(),
        FeatureField::FastingBloodSugar => FastingBloodSugar::labels(),
        FeatureField::EcgResult => EcgResult::labels(),
        FeatureField::MajorVessels => MajorVessels::labels(),
        FeatureField::Thalassemia => Thalassemia::labels(),
        FeatureField::ExerciseAngina => ExerciseAngina::labels(),
        FeatureField::StSlope => StSlope::labels(),
        _ => Vec::new(),
    }
}

fn sample_value(feature: FeatureField) -> &'static str {
    match feature {
        FeatureField::Age => "58",
        FeatureField::Gender => Gender::Male.label(),
        FeatureField::ChestPainType => ChestPainType::Asymptomatic.label(),
        FeatureField::RestingBloodPressure => "140",
        FeatureField::SerumCholesterol => "289",
        FeatureField::FastingBloodSugar => FastingBloodSugar::Below120.label(),
        FeatureField::EcgResult => EcgResult::LeftVentricularHypertrophy.label(),
        FeatureField::MaxHeartRate => "132",
        FeatureField::MajorVessels => MajorVessels::Two.label(),
        FeatureField::Thalassemia => Thalassemia::ReversibleDefect.label(),
        FeatureField::ExerciseAngina => ExerciseAngina::Yes.label(),
        FeatureField::Oldpeak => "2.4",
        FeatureField::StSlope => StSlope::Flat.label(),
    }
}

/// Render the prognosis form
pub fn render_prognosis(f: &mut Frame, area: Rect, state: &PrognosisFormState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Form
            Constraint::Length(3), // Result
            Constraint::Length(3), // Footer/error
        ])
        .split(area);

    render_header(
        f,
        chunks[0],
        "Cardiac Arrest Prognosis",
        &format!("{} feature model", state.schema.feature_count()),
    );
    render_form_fields(f, chunks[1], state);
    render_result(f, chunks[2], state);
    render_footer(
        f,
        chunks[3],
        state.error_message.as_deref(),
        &[
            ("↑↓", "Navigate"),
            ("←→", "Change"),
            ("Enter", "Calculate"),
            ("F2", "Sample Data"),
            ("F3", "Reset All"),
            ("Esc", "Back"),
        ],
    );
}

fn render_form_fields(f: &mut Frame, area: Rect, state: &PrognosisFormState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .margin(1)
        .split(area);

    let mid = (state.fields.len() + 1) / 2;

    render_field_column(f, columns[0], &state.fields[..mid], 0, state.selected_field);
    render_field_column(
        f,
        columns[1],
        &state.fields[mid..],
        mid,
        state.selected_field,
    );
}

fn render_field_column(
    f: &mut Frame,
    area: Rect,
    fields: &[FormField],
    offset: usize,
    selected: usize,
) {
    let constraints: Vec<Constraint> = fields
        .iter()
        .map(|_| Constraint::Length(3))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (i, field) in fields.iter().enumerate() {
        let is_selected = offset + i == selected;
        let (border_style, title_style) = if is_selected {
            (ClinicalTheme::border_focused(), ClinicalTheme::focused())
        } else {
            (ClinicalTheme::border(), ClinicalTheme::text_secondary())
        };

        let block = Block::default()
            .title(Span::styled(format!(" {} ", field.label), title_style))
            .borders(Borders::ALL)
            .border_style(border_style);

        let mut spans = vec![Span::raw(" ")];
        match (&field.kind, field.value.is_empty()) {
            (FieldKind::Choice(_), _) => {
                spans.push(Span::styled("‹ ", ClinicalTheme::text_muted()));
                spans.push(Span::styled(field.value.as_str(), ClinicalTheme::text()));
                spans.push(Span::styled(" ›", ClinicalTheme::text_muted()));
            }
            (_, true) => spans.push(Span::styled(field.hint.as_str(), ClinicalTheme::text_muted())),
            (_, false) => spans.push(Span::styled(field.value.as_str(), ClinicalTheme::text())),
        }
        if is_selected && !matches!(field.kind, FieldKind::Choice(_)) {
            spans.push(Span::styled("▌", ClinicalTheme::focused()));
        }

        f.render_widget(Paragraph::new(Line::from(spans)).block(block), chunks[i]);
    }
}

fn render_result(f: &mut Frame, area: Rect, state: &PrognosisFormState) {
    let line = match &state.result {
        Some((text, value)) => Line::from(vec![
            Span::styled(" ", ClinicalTheme::text()),
            Span::styled(text.as_str(), ClinicalTheme::result(*value)),
        ]),
        None => Line::from(Span::styled(
            " Fill in the form and press [Enter] to calculate.",
            ClinicalTheme::text_muted(),
        )),
    };

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(ClinicalTheme::border());
    f.render_widget(Paragraph::new(line).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn select(state: &mut PrognosisFormState, id: FieldId) {
        state.selected_field = state
            .fields
            .iter()
            .position(|f| f.id == id)
            .expect("field present");
    }

    #[test]
    fn test_fields_follow_schema() {
        let full = PrognosisFormState::new(SchemaVersion::Full, &FieldBounds::default());
        let reduced = PrognosisFormState::new(SchemaVersion::Reduced, &FieldBounds::default());
        assert_eq!(full.fields.len(), 15);
        assert_eq!(reduced.fields.len(), 13);
        assert_eq!(full.fields[0].id, FieldId::Name);
        assert_eq!(full.fields[2].label, "Age");
    }

    #[test]
    fn test_sample_data_builds_form() {
        let mut state = PrognosisFormState::new(SchemaVersion::Full, &FieldBounds::default());
        state.load_sample_data();
        let form = state.to_input_form().expect("valid form");
        assert_eq!(form.age, 58);
        assert_eq!(form.gender, Gender::Male);
        assert_eq!(form.major_vessels, Some(MajorVessels::Two));
        assert!((form.oldpeak - 2.4).abs() < 1e-9);
        assert_eq!(form.identity.name(), "Ahmad bin Ismail");
    }

    #[test]
    fn test_sample_data_replaces_typed_identity() {
        let mut state = PrognosisFormState::new(SchemaVersion::Full, &FieldBounds::default());
        for c in "Lim Ah Kow".chars() {
            state.input_char(c);
        }
        state.load_sample_data();
        assert_eq!(state.value(FieldId::Name), "Ahmad bin Ismail");
        assert_eq!(state.value(FieldId::IcNumber), "700312-10-5511");
    }

    #[test]
    fn test_whole_number_outside_u16_rejected() {
        let bounds = FieldBounds {
            age: NumericBounds::new(-5.0, 90.0),
            ..FieldBounds::default()
        };
        let mut state = PrognosisFormState::new(SchemaVersion::Full, &bounds);
        state.load_sample_data();
        select(&mut state, FieldId::Feature(FeatureField::Age));
        state.clear_field();
        for c in "-3".chars() {
            state.input_char(c);
        }
        let err = state.to_input_form().expect_err("negative age");
        assert_eq!(err, "Age: Out of range");
    }

    #[test]
    fn test_numeric_clamped_to_bounds() {
        let mut state = PrognosisFormState::new(SchemaVersion::Reduced, &FieldBounds::default());
        state.load_sample_data();
        select(&mut state, FieldId::Feature(FeatureField::Age));
        state.clear_field();
        for c in "120".chars() {
            state.input_char(c);
        }
        let form = state.to_input_form().expect("valid form");
        assert_eq!(form.age, 77);
        assert_eq!(form.thalassemia, None);
    }

    #[test]
    fn test_numeric_field_rejects_letters() {
        let mut state = PrognosisFormState::new(SchemaVersion::Full, &FieldBounds::default());
        select(&mut state, FieldId::Feature(FeatureField::MaxHeartRate));
        state.input_char('x');
        state.input_char('9');
        assert_eq!(state.fields[state.selected_field].value, "9");
    }

    #[test]
    fn test_missing_number_reported() {
        let state = PrognosisFormState::new(SchemaVersion::Full, &FieldBounds::default());
        let err = state.to_input_form().expect_err("empty form");
        assert_eq!(err, "Oldpeak: Enter a number");
    }

    #[test]
    fn test_cycle_choice_wraps() {
        let mut state = PrognosisFormState::new(SchemaVersion::Full, &FieldBounds::default());
        select(&mut state, FieldId::Feature(FeatureField::Gender));
        assert_eq!(state.fields[state.selected_field].value, "Male");
        state.cycle_choice(true);
        assert_eq!(state.fields[state.selected_field].value, "Female");
        state.cycle_choice(true);
        assert_eq!(state.fields[state.selected_field].value, "Male");
        state.cycle_choice(false);
        assert_eq!(state.fields[state.selected_field].value, "Female");
    }

    #[test]
    fn test_reset_all_wipes_values() {
        let mut state = PrognosisFormState::new(SchemaVersion::Full, &FieldBounds::default());
        state.load_sample_data();
        state.set_result("83.61%", 83.61);
        state.reset_all();

        assert!(state.result.is_none());
        assert!(state.fields[0].value.is_empty());
        select(&mut state, FieldId::Feature(FeatureField::ChestPainType));
        assert_eq!(state.fields[state.selected_field].value, "Typical Angina");
    }

    #[test]
    fn test_result_line() {
        let mut state = PrognosisFormState::new(SchemaVersion::Full, &FieldBounds::default());
        state.set_result("83.61%", 83.61);
        assert_eq!(
            state.result.as_ref().map(|(t, _)| t.as_str()),
            Some("There is a 83.61% chance of developing cardiac arrest.")
        );
    }
}
