//! History view: filterable table of this session's prognoses.

use std::collections::{BTreeSet, HashSet};

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Cell, List, ListItem, Paragraph, Row, Table},
    Frame,
};

use crate::application::query::{self, HistoryTable, QueryError, Selector};
use crate::application::Ledger;
use crate::domain::{Attribute, AttributeKind, HistoryRecord};
use crate::tui::styles::ClinicalTheme;

use super::{panel, render_footer, render_header};

/// Which end of a range the arrow keys move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RangeHandle {
    #[default]
    Low,
    High,
}

/// Controls of the active attribute filter.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterControl {
    None,
    Categories {
        attribute: Attribute,
        options: Vec<(&'static str, bool)>,
        cursor: usize,
    },
    Range {
        attribute: Attribute,
        /// Distinct values in ascending order; handles index into it.
        values: Vec<f64>,
        low: usize,
        high: usize,
        handle: RangeHandle,
    },
}

/// What the table shows after filters are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryView {
    pub table: HistoryTable,
    pub notice: Option<String>,
}

/// History screen state
#[derive(Debug, Clone)]
pub struct HistoryState {
    /// 0 is "None", then `Attribute::filterable` in order.
    pub filter_index: usize,
    pub control: FilterControl,
    pub picker_open: bool,
    pub picker_cursor: usize,
    /// Ledger positions picked in the test selector; empty keeps all.
    pub picked: BTreeSet<usize>,
    pub scroll: usize,
    pub column_offset: usize,
}

impl Default for HistoryState {
    fn default() -> Self {
        Self {
            filter_index: 0,
            control: FilterControl::None,
            picker_open: false,
            picker_cursor: 0,
            picked: BTreeSet::new(),
            scroll: 0,
            column_offset: 0,
        }
    }
}

impl HistoryState {
    /// Current filter attribute, if any.
    #[must_use]
    pub fn attribute(&self, ledger: &Ledger) -> Option<Attribute> {
        let filterable = Attribute::filterable(ledger.schema());
        self.filter_index
            .checked_sub(1)
            .and_then(|i| filterable.get(i).copied())
    }

    /// Switch to the next (or previous) filter type and reset its controls.
    pub fn cycle_filter(&mut self, ledger: &Ledger, forward: bool) {
        let count = Attribute::filterable(ledger.schema()).len() + 1;
        self.filter_index = if forward {
            (self.filter_index + 1) % count
        } else {
            (self.filter_index + count - 1) % count
        };
        self.refresh(ledger);
    }

    /// Rebuild filter controls with their defaults: every category
    /// selected, the full range covered.
    pub fn refresh(&mut self, ledger: &Ledger) {
        self.scroll = 0;
        self.picked.retain(|i| *i < ledger.len());
        self.control = match self.attribute(ledger) {
            None => FilterControl::None,
            Some(attribute) if attribute.kind() == AttributeKind::Categorical => {
                let options = query::distinct_categories(ledger, attribute)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|label| (label, true))
                    .collect();
                FilterControl::Categories {
                    attribute,
                    options,
                    cursor: 0,
                }
            }
            Some(attribute) => {
                let mut values: Vec<f64> =
                    ledger.iter().filter_map(|r| r.numeric(attribute)).collect();
                values.sort_by(f64::total_cmp);
                values.dedup();
                let high = values.len().saturating_sub(1);
                FilterControl::Range {
                    attribute,
                    values,
                    low: 0,
                    high,
                    handle: RangeHandle::Low,
                }
            }
        };
    }

    pub fn cursor_up(&mut self) {
        if self.picker_open {
            self.picker_cursor = self.picker_cursor.saturating_sub(1);
            return;
        }
        match &mut self.control {
            FilterControl::Categories { cursor, .. } => *cursor = cursor.saturating_sub(1),
            FilterControl::Range { handle, .. } => *handle = RangeHandle::Low,
            FilterControl::None => {}
        }
    }

    pub fn cursor_down(&mut self, ledger: &Ledger) {
        if self.picker_open {
            if self.picker_cursor + 1 < ledger.len() {
                self.picker_cursor += 1;
            }
            return;
        }
        match &mut self.control {
            FilterControl::Categories {
                options, cursor, ..
            } => {
                if *cursor + 1 < options.len() {
                    *cursor += 1;
                }
            }
            FilterControl::Range { handle, .. } => *handle = RangeHandle::High,
            FilterControl::None => {}
        }
    }

    /// Toggle the category or test under the cursor.
    pub fn toggle(&mut self) {
        if self.picker_open {
            let idx = self.picker_cursor;
            if !self.picked.remove(&idx) {
                self.picked.insert(idx);
            }
            return;
        }
        if let FilterControl::Categories {
            options, cursor, ..
        } = &mut self.control
        {
            if let Some(option) = options.get_mut(*cursor) {
                option.1 = !option.1;
            }
        }
    }

    /// Move the focused range handle one distinct value.
    pub fn step_range(&mut self, forward: bool) {
        if let FilterControl::Range {
            values,
            low,
            high,
            handle,
            ..
        } = &mut self.control
        {
            let last = values.len().saturating_sub(1);
            let slot = match handle {
                RangeHandle::Low => low,
                RangeHandle::High => high,
            };
            *slot = if forward {
                (*slot + 1).min(last)
            } else {
                slot.saturating_sub(1)
            };
        }
    }

    pub fn toggle_picker(&mut self) {
        self.picker_open = !self.picker_open;
    }

    pub fn scroll_by(&mut self, delta: isize) {
        self.scroll = self.scroll.saturating_add_signed(delta);
    }

    pub fn shift_columns(&mut self, delta: isize) {
        self.column_offset = self.column_offset.saturating_add_signed(delta);
    }

    fn selector(&self) -> Option<(Attribute, Selector)> {
        match &self.control {
            FilterControl::None => None,
            FilterControl::Categories {
                attribute, options, ..
            } => Some((
                *attribute,
                Selector::categories(options.iter().filter(|(_, on)| *on).map(|(l, _)| *l)),
            )),
            FilterControl::Range {
                attribute,
                values,
                low,
                high,
                ..
            } => {
                let low = values.get(*low).copied().unwrap_or(f64::NEG_INFINITY);
                let high = values.get(*high).copied().unwrap_or(f64::INFINITY);
                Some((*attribute, Selector::range(low, high)))
            }
        }
    }

    /// Apply the attribute filter, then the test selection.
    ///
    /// An unusable filter is reported and the table stays unfiltered.
    #[must_use]
    pub fn view(&self, ledger: &Ledger) -> HistoryView {
        let mut notice = None;
        let mut shown: Vec<&HistoryRecord> = ledger.iter().collect();

        if let Some((attribute, selector)) = self.selector() {
            match query::filter_by_attribute(ledger, attribute, &selector) {
                Ok(filtered) => shown = filtered,
                Err(e @ QueryError::FilterNotUsable(_)) => notice = Some(e.to_string()),
                Err(QueryError::Empty) => {}
                Err(e) => {
                    tracing::warn!("History filter rejected: {e}");
                    notice = Some(e.to_string());
                }
            }
        }

        if !self.picked.is_empty() {
            let timestamps: HashSet<String> = self
                .picked
                .iter()
                .filter_map(|i| ledger.records().get(*i))
                .map(|r| r.timestamp().to_string())
                .collect();
            shown = query::filter_by_timestamp_set(shown, &timestamps);
        }

        HistoryView {
            table: HistoryTable::build(&shown, ledger.schema()),
            notice,
        }
    }
}

/// Render the history view
pub fn render_history(f: &mut Frame, area: Rect, state: &HistoryState, ledger: &Ledger) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(5), // Filter
            Constraint::Min(0),    // Table
            Constraint::Length(3), // Footer
        ])
        .split(area);

    render_header(
        f,
        chunks[0],
        "History",
        &format!("{} test(s) this session", ledger.len()),
    );

    let view = state.view(ledger);
    render_filter(f, chunks[1], state, ledger, view.notice.as_deref());

    if state.picker_open {
        let halves = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
            .split(chunks[2]);
        render_picker(f, halves[0], state, ledger);
        render_table(f, halves[1], state, &view.table);
    } else {
        render_table(f, chunks[2], state, &view.table);
    }

    render_footer(
        f,
        chunks[3],
        None,
        &[
            ("Tab", "Filter"),
            ("↑↓", "Move"),
            ("←→", "Range"),
            ("Space", "Toggle"),
            ("T", "Tests"),
            ("PgUp/PgDn", "Scroll"),
            ("[ ]", "Columns"),
            ("Esc", "Back"),
        ],
    );
}

fn render_filter(
    f: &mut Frame,
    area: Rect,
    state: &HistoryState,
    ledger: &Ledger,
    notice: Option<&str>,
) {
    let name = state
        .attribute(ledger)
        .map_or("None", |a| a.label());
    let mut lines = vec![Line::from(vec![
        Span::styled("Filter type: ", ClinicalTheme::text_secondary()),
        Span::styled(format!("‹ {name} ›"), ClinicalTheme::focused()),
    ])];

    match &state.control {
        FilterControl::None => lines.push(Line::from(Span::styled(
            "Showing every test.",
            ClinicalTheme::text_muted(),
        ))),
        FilterControl::Categories {
            options, cursor, ..
        } => {
            let spans: Vec<Span> = options
                .iter()
                .enumerate()
                .map(|(i, (label, on))| {
                    let mark = if *on { "[x]" } else { "[ ]" };
                    let style = if i == *cursor && !state.picker_open {
                        ClinicalTheme::selected()
                    } else {
                        ClinicalTheme::text()
                    };
                    Span::styled(format!(" {mark} {label} "), style)
                })
                .collect();
            lines.push(Line::from(spans));
        }
        FilterControl::Range {
            values,
            low,
            high,
            handle,
            ..
        } => {
            let style_of = |h: RangeHandle| {
                if h == *handle {
                    ClinicalTheme::selected()
                } else {
                    ClinicalTheme::text()
                }
            };
            let fmt = |i: &usize| values.get(*i).map_or("-".to_string(), |v| format!("{v}"));
            lines.push(Line::from(vec![
                Span::styled("From ", ClinicalTheme::text_secondary()),
                Span::styled(format!(" {} ", fmt(low)), style_of(RangeHandle::Low)),
                Span::styled("  to ", ClinicalTheme::text_secondary()),
                Span::styled(format!(" {} ", fmt(high)), style_of(RangeHandle::High)),
            ]));
        }
    }

    if let Some(notice) = notice {
        lines.push(Line::from(Span::styled(notice.to_string(), ClinicalTheme::warning())));
    } else if !state.picked.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("{} test(s) selected", state.picked.len()),
            ClinicalTheme::info(),
        )));
    }

    f.render_widget(Paragraph::new(lines).block(panel("Filter")), area);
}

fn render_picker(f: &mut Frame, area: Rect, state: &HistoryState, ledger: &Ledger) {
    let items: Vec<ListItem> = query::test_labels(ledger)
        .into_iter()
        .enumerate()
        .map(|(i, label)| {
            let mark = if state.picked.contains(&i) { "[x]" } else { "[ ]" };
            let style = if i == state.picker_cursor {
                ClinicalTheme::selected()
            } else {
                ClinicalTheme::text()
            };
            ListItem::new(Line::from(Span::styled(format!("{mark} {label}"), style)))
        })
        .collect();

    f.render_widget(List::new(items).block(panel("Select Tests")), area);
}

fn render_table(f: &mut Frame, area: Rect, state: &HistoryState, table: &HistoryTable) {
    if table.rows.is_empty() {
        let msg = Paragraph::new(Line::from(Span::styled(
            "No history available.",
            ClinicalTheme::text_muted(),
        )))
        .block(panel("Tests"));
        f.render_widget(msg, area);
        return;
    }

    let skip = state.column_offset.min(table.columns.len().saturating_sub(1));
    let headers = table.headers();

    let mut widths = vec![Constraint::Length(6)];
    widths.extend(table.columns.iter().enumerate().skip(skip).map(|(c, attr)| {
        let widest = table
            .rows
            .iter()
            .map(|(_, cells)| cells[c].chars().count())
            .max()
            .unwrap_or(0)
            .max(attr.label().len());
        Constraint::Length(widest as u16 + 1)
    }));

    let header = Row::new(
        std::iter::once("Test")
            .chain(headers.into_iter().skip(skip))
            .map(Cell::from),
    )
    .style(ClinicalTheme::header());

    let rows = table.rows.iter().skip(state.scroll).map(|(n, cells)| {
        let result = cells.last().map(String::as_str).unwrap_or_default();
        let result_style = crate::domain::parse_percent(result)
            .map_or(ClinicalTheme::text(), ClinicalTheme::result);
        let last = cells.len().saturating_sub(1);
        Row::new(
            std::iter::once(Cell::from(n.to_string())).chain(
                cells.iter().enumerate().skip(skip).map(|(c, text)| {
                    let style = if c == last {
                        result_style
                    } else {
                        ClinicalTheme::text()
                    };
                    Cell::from(text.as_str()).style(style)
                }),
            ),
        )
    });

    let widget = Table::new(rows, widths)
        .header(header)
        .block(panel(&format!("Tests ({})", table.rows.len())));
    f.render_widget(widget, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{sample_form, Gender, SchemaVersion};
    use chrono::{FixedOffset, TimeZone};

    fn ledger(entries: &[(u16, Gender, f64)]) -> Ledger {
        let offset = FixedOffset::east_opt(8 * 3600).expect("valid offset");
        let mut ledger = Ledger::new(SchemaVersion::Full);
        for (i, (age, gender, p)) in entries.iter().enumerate() {
            let at = offset
                .with_ymd_and_hms(2024, 9, 9, 11, i as u32, 0)
                .single()
                .expect("valid time");
            ledger.append(sample_form("Wong", *age, *gender), *p, &at);
        }
        ledger
    }

    fn select_filter(state: &mut HistoryState, ledger: &Ledger, attribute: Attribute) {
        state.filter_index = Attribute::filterable(ledger.schema())
            .iter()
            .position(|a| *a == attribute)
            .expect("filterable")
            + 1;
        state.refresh(ledger);
    }

    /// Age cell of each shown row; ages are unique within a test ledger.
    fn shown(view: &HistoryView) -> Vec<u16> {
        let col = view
            .table
            .columns
            .iter()
            .position(|c| *c == Attribute::Age)
            .expect("age column");
        view.table
            .rows
            .iter()
            .map(|(_, cells)| cells[col].parse().expect("age"))
            .collect()
    }

    fn numbers(view: &HistoryView) -> Vec<usize> {
        view.table.rows.iter().map(|(n, _)| *n).collect()
    }

    #[test]
    fn test_defaults_show_everything() {
        let ledger = ledger(&[(40, Gender::Male, 0.1), (50, Gender::Female, 0.2)]);
        let mut state = HistoryState::default();
        assert_eq!(shown(&state.view(&ledger)), vec![40, 50]);

        select_filter(&mut state, &ledger, Attribute::Gender);
        assert_eq!(shown(&state.view(&ledger)), vec![40, 50]);

        select_filter(&mut state, &ledger, Attribute::Age);
        assert_eq!(shown(&state.view(&ledger)), vec![40, 50]);
    }

    #[test]
    fn test_category_toggle_filters() {
        let ledger = ledger(&[
            (40, Gender::Male, 0.1),
            (50, Gender::Female, 0.2),
            (60, Gender::Male, 0.3),
        ]);
        let mut state = HistoryState::default();
        select_filter(&mut state, &ledger, Attribute::Gender);
        // Options are in first-seen order: Male, Female.
        state.cursor_down(&ledger);
        state.toggle();
        let view = state.view(&ledger);
        assert_eq!(shown(&view), vec![40, 60]);
        assert_eq!(numbers(&view), vec![1, 2]);
    }

    #[test]
    fn test_range_handles_are_inclusive() {
        let ledger = ledger(&[
            (40, Gender::Male, 0.1),
            (50, Gender::Male, 0.2),
            (60, Gender::Male, 0.3),
        ]);
        let mut state = HistoryState::default();
        select_filter(&mut state, &ledger, Attribute::Age);
        state.step_range(true);
        assert_eq!(shown(&state.view(&ledger)), vec![50, 60]);

        state.cursor_down(&ledger);
        state.step_range(false);
        assert_eq!(shown(&state.view(&ledger)), vec![50]);
    }

    #[test]
    fn test_single_value_shows_notice() {
        let ledger = ledger(&[(45, Gender::Male, 0.1), (45, Gender::Female, 0.2)]);
        let mut state = HistoryState::default();
        select_filter(&mut state, &ledger, Attribute::Age);

        let view = state.view(&ledger);
        assert_eq!(numbers(&view), vec![1, 2]);
        assert_eq!(
            view.notice.as_deref(),
            Some("Only one unique age value found. Please add more age data to use this filter.")
        );
    }

    #[test]
    fn test_picker_selects_tests() {
        let ledger = ledger(&[
            (40, Gender::Male, 0.1),
            (50, Gender::Male, 0.2),
            (60, Gender::Male, 0.3),
        ]);
        let mut state = HistoryState::default();
        state.toggle_picker();
        state.cursor_down(&ledger);
        state.cursor_down(&ledger);
        state.toggle();
        let view = state.view(&ledger);
        assert_eq!(shown(&view), vec![60]);
        assert_eq!(numbers(&view), vec![1]);
    }

    #[test]
    fn test_cycle_wraps_to_none() {
        let ledger = ledger(&[(40, Gender::Male, 0.1)]);
        let mut state = HistoryState::default();
        state.cycle_filter(&ledger, false);
        assert_eq!(state.attribute(&ledger), Some(Attribute::Result));
        state.cycle_filter(&ledger, true);
        assert_eq!(state.attribute(&ledger), None);
        assert_eq!(state.control, FilterControl::None);
    }
}
