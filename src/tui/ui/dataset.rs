//! Dataset view: overview of the reference heart dataset.

use std::collections::BTreeMap;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table},
    Frame,
};

use crate::application::{AgeGroup, DatasetService, GenderCount};
use crate::domain::{Categorical, Gender};
use crate::ports::{DatasetColumn, DatasetError, DatasetRow, DatasetSource};
use crate::tui::styles::ClinicalTheme;

use super::{axis_bounds, axis_labels, panel, render_footer, render_header};

/// Age histogram bin width, in years.
pub const AGE_BIN_WIDTH: f64 = 5.0;

/// Raw table columns, in file order.
pub const RAW_HEADERS: [&str; 14] = [
    "age", "sex", "cp", "trtbps", "chol", "fbs", "restecg", "thalachh", "exng", "oldpeak", "slp",
    "caa", "thall", "output",
];

/// Everything the dataset screen shows.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetView {
    pub source: String,
    pub row_count: usize,
    pub groups: Vec<GenderCount>,
    /// (gender, [(age, cholesterol)])
    pub cholesterol: Vec<(Gender, Vec<(f64, f64)>)>,
    pub age_groups: Vec<AgeGroup>,
    /// Raw rows as display cells, one per `RAW_HEADERS` entry.
    pub raw: Vec<Vec<String>>,
}

/// Dataset screen state
#[derive(Debug, Clone, Default)]
pub struct DatasetState {
    pub column_index: usize,
    pub view: Option<DatasetView>,
    pub error: Option<String>,
    /// First raw row shown.
    pub row_scroll: usize,
    /// First raw column shown.
    pub column_offset: usize,
}

impl DatasetState {
    #[must_use]
    pub fn column(&self) -> DatasetColumn {
        DatasetColumn::ALL[self.column_index % DatasetColumn::ALL.len()]
    }

    /// Load or refresh every panel from `service`.
    pub fn load<S: DatasetSource>(&mut self, service: &mut DatasetService<S>) {
        match build_view(service, self.column()) {
            Ok(view) => {
                self.view = Some(view);
                self.error = None;
            }
            Err(e) => {
                tracing::warn!("Dataset unavailable: {e}");
                self.view = None;
                self.error = Some(e.to_string());
            }
        }
    }

    /// Group by the next (or previous) column.
    pub fn cycle_column<S: DatasetSource>(
        &mut self,
        service: &mut DatasetService<S>,
        forward: bool,
    ) {
        let count = DatasetColumn::ALL.len();
        self.column_index = if forward {
            (self.column_index + 1) % count
        } else {
            (self.column_index + count - 1) % count
        };
        self.load(service);
    }

    pub fn scroll_by(&mut self, delta: isize) {
        let last = self
            .view
            .as_ref()
            .map_or(0, |v| v.raw.len().saturating_sub(1));
        self.row_scroll = self.row_scroll.saturating_add_signed(delta).min(last);
    }

    pub fn shift_columns(&mut self, delta: isize) {
        self.column_offset = self
            .column_offset
            .saturating_add_signed(delta)
            .min(RAW_HEADERS.len() - 1);
    }
}

fn raw_cells(rows: &[DatasetRow]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| {
            let mut cells = vec![row.age.to_string(), row.sex.to_string()];
            cells.extend(DatasetColumn::ALL[1..].iter().map(|c| row.value(*c).to_string()));
            cells
        })
        .collect()
}

fn build_view<S: DatasetSource>(
    service: &mut DatasetService<S>,
    column: DatasetColumn,
) -> Result<DatasetView, DatasetError> {
    let row_count = service.row_count()?;
    let groups = service.group_by_gender(column)?;
    let mut cholesterol = Vec::new();
    for gender in Gender::ALL.iter().copied() {
        cholesterol.push((gender, service.cholesterol_by_age(gender)?));
    }
    let age_groups = service.age_histogram(AGE_BIN_WIDTH)?;
    let raw = raw_cells(service.rows()?);

    Ok(DatasetView {
        source: service.describe(),
        row_count,
        groups,
        cholesterol,
        age_groups,
        raw,
    })
}

/// Render the dataset view
pub fn render_dataset(f: &mut Frame, area: Rect, state: &DatasetState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(area);

    let subtitle = state.view.as_ref().map_or_else(
        || "Reference heart dataset".to_string(),
        |v| format!("{} ({} rows)", v.source, v.row_count),
    );
    render_header(f, chunks[0], "Dataset Overview", &subtitle);

    match (&state.view, &state.error) {
        (Some(view), _) => render_content(f, chunks[1], state, view),
        (None, Some(err)) => render_error(f, chunks[1], err),
        (None, None) => {
            let loading = Paragraph::new(Span::styled("Loading dataset...", ClinicalTheme::text_muted()))
                .alignment(Alignment::Center)
                .block(panel("Dataset"));
            f.render_widget(loading, chunks[1]);
        }
    }

    render_footer(
        f,
        chunks[2],
        None,
        &[
            ("←→", "Attribute"),
            ("PgUp/PgDn", "Rows"),
            ("[ ]", "Columns"),
            ("R", "Reload"),
            ("Esc", "Back"),
        ],
    );
}

fn render_error(f: &mut Frame, area: Rect, message: &str) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("! Cannot Load Dataset", ClinicalTheme::danger())),
        Line::from(""),
        Line::from(Span::styled(message.to_string(), ClinicalTheme::text())),
        Line::from(Span::styled(
            "Set CARDIALYZE_DATASET_PATH to the OHCA.csv file.",
            ClinicalTheme::text_muted(),
        )),
    ])
    .alignment(Alignment::Center)
    .block(panel("Dataset").border_style(ClinicalTheme::danger()));

    f.render_widget(content, area);
}

fn render_content(f: &mut Frame, area: Rect, state: &DatasetState, view: &DatasetView) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);
    render_raw(f, sections[0], state, &view.raw);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(sections[1]);
    render_groups(f, columns[0], state.column(), &view.groups);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(columns[1]);
    render_cholesterol(f, right[0], &view.cholesterol);
    render_age_histogram(f, right[1], &view.age_groups);
}

fn render_raw(f: &mut Frame, area: Rect, state: &DatasetState, raw: &[Vec<String>]) {
    let skip = state.column_offset.min(RAW_HEADERS.len() - 1);

    let mut widths = vec![Constraint::Length(5)];
    widths.extend(RAW_HEADERS.iter().enumerate().skip(skip).map(|(c, name)| {
        let widest = raw
            .iter()
            .map(|cells| cells[c].chars().count())
            .max()
            .unwrap_or(0)
            .max(name.len());
        Constraint::Length(widest as u16 + 1)
    }));

    let header = Row::new(
        std::iter::once("#")
            .chain(RAW_HEADERS.iter().skip(skip).copied())
            .map(Cell::from),
    )
    .style(ClinicalTheme::header());

    let rows = raw.iter().enumerate().skip(state.row_scroll).map(|(i, cells)| {
        Row::new(
            std::iter::once(Cell::from((i + 1).to_string()))
                .chain(cells.iter().skip(skip).map(|c| Cell::from(c.as_str()))),
        )
        .style(ClinicalTheme::text())
    });

    let table = Table::new(rows, widths)
        .header(header)
        .block(panel(&format!("Raw Data ({} rows)", raw.len())));

    f.render_widget(table, area);
}

fn render_groups(f: &mut Frame, area: Rect, column: DatasetColumn, groups: &[GenderCount]) {
    let header = Row::new(vec![column.label(), "Gender", "Count"]).style(ClinicalTheme::header());
    let rows = groups.iter().map(|g| {
        Row::new(vec![
            Cell::from(g.value.as_str()),
            Cell::from(g.gender.label()),
            Cell::from(g.count.to_string()),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(45),
            Constraint::Percentage(30),
            Constraint::Percentage(25),
        ],
    )
    .header(header)
    .block(panel(&format!("{} by Gender", column.label())));

    f.render_widget(table, area);
}

fn render_cholesterol(f: &mut Frame, area: Rect, series: &[(Gender, Vec<(f64, f64)>)]) {
    let x = axis_bounds(series.iter().flat_map(|(_, p)| p.iter().map(|v| v.0)));
    let y = axis_bounds(series.iter().flat_map(|(_, p)| p.iter().map(|v| v.1)));

    let datasets = series
        .iter()
        .enumerate()
        .map(|(i, (gender, points))| {
            Dataset::default()
                .name(gender.label())
                .marker(symbols::Marker::Dot)
                .graph_type(GraphType::Scatter)
                .style(ClinicalTheme::series(i))
                .data(points)
        })
        .collect();

    let chart = Chart::new(datasets)
        .block(panel("Cholesterol vs Age"))
        .x_axis(
            Axis::default()
                .title(Span::styled("Age", ClinicalTheme::text_muted()))
                .bounds(x)
                .labels(axis_labels(x)),
        )
        .y_axis(
            Axis::default()
                .title(Span::styled("Cholesterol", ClinicalTheme::text_muted()))
                .bounds(y)
                .labels(axis_labels(y)),
        );

    f.render_widget(chart, area);
}

/// One row per age bin, one column per gender and outcome.
fn age_table(groups: &[AgeGroup]) -> BTreeMap<i64, Vec<usize>> {
    let mut table: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (g, group) in groups.iter().enumerate() {
        for bin in &group.bins {
            let counts = table
                .entry(bin.start.round() as i64)
                .or_insert_with(|| vec![0; groups.len()]);
            counts[g] += bin.count;
        }
    }
    table
}

fn render_age_histogram(f: &mut Frame, area: Rect, groups: &[AgeGroup]) {
    let mut headers = vec!["Age".to_string()];
    headers.extend(groups.iter().map(|g| {
        let outcome = if g.presence { "Presence" } else { "No Presence" };
        format!("{} {}", g.gender.label(), outcome)
    }));

    let rows = age_table(groups).into_iter().map(|(start, counts)| {
        let width = AGE_BIN_WIDTH as i64;
        let mut cells = vec![format!("{start}-{}", start + width - 1)];
        cells.extend(counts.iter().map(|c| c.to_string()));
        Row::new(cells)
    });

    let widths: Vec<Constraint> = std::iter::once(Constraint::Length(8))
        .chain(groups.iter().map(|_| Constraint::Min(10)))
        .collect();

    let table = Table::new(rows, widths)
        .header(Row::new(headers).style(ClinicalTheme::header()))
        .block(panel("Age Distribution"));

    f.render_widget(table, area);
}
