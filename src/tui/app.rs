//! Main TUI application state machine.
//!
//! Handles:
//! - Screen navigation
//! - Input event handling
//! - Service integration

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};

use crate::adapters::dataset::CsvDataset;
use crate::adapters::gbt::GbtPredictor;
use crate::application::{DatasetService, FeatureNormalizer, Insights, Session};
use crate::config::AppConfig;
use crate::ports::{Predictor, SystemClock};
use crate::CardialyzeError;

use super::ui::{
    about::render_about,
    dashboard::{render_dashboard, DashboardState},
    dataset::{render_dataset, DatasetState},
    history::{render_history, HistoryState},
    prognosis::{render_prognosis, PrognosisFormState},
    render_disclaimer,
};

/// Current screen/view in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Dashboard,
    Prognosis,
    History,
    Dataset,
    About,
}

/// Main application state
pub struct App {
    screen: Screen,
    should_quit: bool,
    /// Set when the predictor fails mid-session; ends the run with an error.
    fatal: Option<CardialyzeError>,
    config: AppConfig,
    session: Session<GbtPredictor, SystemClock>,
    dataset: DatasetService<CsvDataset>,
    dashboard_state: DashboardState,
    prognosis_state: PrognosisFormState,
    history_state: HistoryState,
    dataset_state: DatasetState,
}

impl App {
    /// Create the application from resolved configuration.
    ///
    /// Refuses to start if the model cannot be loaded, verified, or does
    /// not match the configured schema.
    ///
    /// # Errors
    /// Returns error if the model is missing, malformed or mismatched.
    pub fn new(config: AppConfig) -> Result<Self> {
        let model_dir = config.model_path.as_path();
        if !model_dir.exists() {
            return Err(anyhow!(
                "Model path not found at {:?}. Set CARDIALYZE_MODEL_PATH to a directory containing gbt_model.json.",
                model_dir
            ));
        }

        let predictor = GbtPredictor::load(model_dir)
            .map_err(|e| anyhow!("Failed to load model from {:?}: {}", model_dir, e))?;

        let session = Session::new(
            Arc::new(predictor),
            FeatureNormalizer::new(config.schema),
            SystemClock::new(config.utc_offset),
        )?;
        let dataset = DatasetService::new(CsvDataset::new(config.dataset_path.clone()));

        Ok(Self::with_dependencies(config, session, dataset))
    }

    /// Create application with injected dependencies (Composition Root pattern).
    #[must_use]
    pub fn with_dependencies(
        config: AppConfig,
        session: Session<GbtPredictor, SystemClock>,
        dataset: DatasetService<CsvDataset>,
    ) -> Self {
        let prognosis_state = PrognosisFormState::new(session.schema(), &config.bounds);
        let dashboard_state = DashboardState {
            insights: None,
            model: session.predictor().describe(),
        };

        Self {
            screen: Screen::Dashboard,
            should_quit: false,
            fatal: None,
            config,
            session,
            dataset,
            dashboard_state,
            prognosis_state,
            history_state: HistoryState::default(),
            dataset_state: DatasetState::default(),
        }
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if terminal operations fail or the predictor fails.
    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        self.update_dashboard_state();

        let result = self.main_loop(&mut terminal);

        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        result?;
        match self.fatal.take() {
            Some(e) => Err(anyhow!(e)),
            None => Ok(()),
        }
    }

    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Min(0), Constraint::Length(3)])
                    .split(f.area());

                let content_area = chunks[0];
                match self.screen {
                    Screen::Dashboard => render_dashboard(f, content_area, &self.dashboard_state),
                    Screen::Prognosis => render_prognosis(f, content_area, &self.prognosis_state),
                    Screen::History => render_history(
                        f,
                        content_area,
                        &self.history_state,
                        self.session.ledger(),
                    ),
                    Screen::Dataset => render_dataset(f, content_area, &self.dataset_state),
                    Screen::About => render_about(
                        f,
                        content_area,
                        self.session.schema(),
                        &self.dashboard_state.model,
                    ),
                }

                render_disclaimer(f, chunks[1]);
            })?;

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key.code, key.modifiers);
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        if key == KeyCode::Char('q') && modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match self.screen {
            Screen::Dashboard => self.handle_dashboard_key(key),
            Screen::Prognosis => self.handle_prognosis_key(key),
            Screen::History => self.handle_history_key(key),
            Screen::Dataset => self.handle_dataset_key(key),
            Screen::About => {
                if matches!(key, KeyCode::Esc | KeyCode::Char('q' | 'Q')) {
                    self.screen = Screen::Dashboard;
                }
            }
        }
    }

    fn handle_dashboard_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('p' | 'P') => self.screen = Screen::Prognosis,
            KeyCode::Char('h' | 'H') => {
                self.history_state.refresh(self.session.ledger());
                self.screen = Screen::History;
            }
            KeyCode::Char('d' | 'D') => {
                if self.dataset_state.view.is_none() {
                    self.dataset_state.load(&mut self.dataset);
                }
                self.screen = Screen::Dataset;
            }
            KeyCode::Char('i' | 'I') => self.screen = Screen::About,
            KeyCode::Char('q' | 'Q') => self.should_quit = true,
            _ => {}
        }
    }

    fn handle_prognosis_key(&mut self, key: KeyCode) {
        let form = &mut self.prognosis_state;
        match key {
            KeyCode::Esc => {
                self.update_dashboard_state();
                self.screen = Screen::Dashboard;
            }
            KeyCode::Up | KeyCode::BackTab => form.prev_field(),
            KeyCode::Down | KeyCode::Tab => form.next_field(),
            KeyCode::Left => form.cycle_choice(false),
            KeyCode::Right => form.cycle_choice(true),
            KeyCode::F(2) => form.load_sample_data(),
            KeyCode::F(3) => form.reset_all(),
            KeyCode::Char(c) => form.input_char(c),
            KeyCode::Backspace => form.delete_char(),
            KeyCode::Delete => form.clear_field(),
            KeyCode::Enter => self.calculate(),
            _ => {}
        }
    }

    fn handle_history_key(&mut self, key: KeyCode) {
        let ledger = self.session.ledger();
        let state = &mut self.history_state;
        match key {
            KeyCode::Esc => self.screen = Screen::Dashboard,
            KeyCode::Tab => state.cycle_filter(ledger, true),
            KeyCode::BackTab => state.cycle_filter(ledger, false),
            KeyCode::Up => state.cursor_up(),
            KeyCode::Down => state.cursor_down(ledger),
            KeyCode::Left => state.step_range(false),
            KeyCode::Right => state.step_range(true),
            KeyCode::Char(' ') | KeyCode::Enter => state.toggle(),
            KeyCode::Char('t' | 'T') => state.toggle_picker(),
            KeyCode::PageUp => state.scroll_by(-10),
            KeyCode::PageDown => state.scroll_by(10),
            KeyCode::Char('[') => state.shift_columns(-1),
            KeyCode::Char(']') => state.shift_columns(1),
            _ => {}
        }
    }

    fn handle_dataset_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => self.screen = Screen::Dashboard,
            KeyCode::Left => self.dataset_state.cycle_column(&mut self.dataset, false),
            KeyCode::Right => self.dataset_state.cycle_column(&mut self.dataset, true),
            KeyCode::Char('r' | 'R') => self.dataset_state.load(&mut self.dataset),
            KeyCode::PageUp => self.dataset_state.scroll_by(-10),
            KeyCode::PageDown => self.dataset_state.scroll_by(10),
            KeyCode::Char('[') => self.dataset_state.shift_columns(-1),
            KeyCode::Char(']') => self.dataset_state.shift_columns(1),
            _ => {}
        }
    }

    fn calculate(&mut self) {
        let form = match self.prognosis_state.to_input_form() {
            Ok(form) => form,
            Err(message) => {
                self.prognosis_state.error_message = Some(message);
                return;
            }
        };

        match self.session.calculate(form) {
            Ok(record) => {
                let result = record.result().clone();
                self.prognosis_state.set_result(result.as_str(), result.value());
                self.update_dashboard_state();
                self.history_state.refresh(self.session.ledger());
            }
            Err(CardialyzeError::Validation(e)) => {
                self.prognosis_state.error_message = Some(e.to_string());
            }
            Err(e) => {
                tracing::error!("Prediction failed: {e}");
                self.fatal = Some(e);
                self.should_quit = true;
            }
        }
    }

    fn update_dashboard_state(&mut self) {
        let records = self.session.ledger().records();
        self.dashboard_state.insights =
            Insights::compute(records, self.config.cholesterol_bin_width).ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn app() -> App {
        let config = AppConfig {
            dataset_path: PathBuf::from("missing/OHCA.csv"),
            ..AppConfig::default()
        };
        App::new(config).expect("bundled model")
    }

    fn press(app: &mut App, key: KeyCode) {
        app.handle_key(key, KeyModifiers::NONE);
    }

    #[test]
    fn test_calculate_records_and_keeps_form() {
        let mut app = app();
        press(&mut app, KeyCode::Char('p'));
        assert_eq!(app.screen, Screen::Prognosis);

        press(&mut app, KeyCode::F(2));
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.session.ledger().len(), 1);
        let (line, value) = app.prognosis_state.result.clone().expect("result");
        assert!(line.starts_with("There is a "));
        assert!((0.0..=100.0).contains(&value));
        assert!(app.dashboard_state.insights.is_some());
        assert!(app.fatal.is_none());

        // The form keeps its values for the next submission.
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.session.ledger().len(), 2);
    }

    #[test]
    fn test_blank_name_blocks_calculate() {
        let mut app = app();
        press(&mut app, KeyCode::Char('p'));
        press(&mut app, KeyCode::F(2));
        // Cursor starts on the name field.
        press(&mut app, KeyCode::Delete);
        press(&mut app, KeyCode::Enter);

        assert!(app.session.ledger().is_empty());
        assert!(app.prognosis_state.error_message.is_some());
        assert!(!app.should_quit);
    }

    #[test]
    fn test_navigation_and_quit() {
        let mut app = app();
        press(&mut app, KeyCode::Char('i'));
        assert_eq!(app.screen, Screen::About);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.screen, Screen::Dashboard);

        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.screen, Screen::Dataset);
        assert!(app.dataset_state.error.is_some());
        press(&mut app, KeyCode::Esc);

        app.handle_key(KeyCode::Char('q'), KeyModifiers::CONTROL);
        assert!(app.should_quit);
    }

    #[test]
    fn test_missing_model_refuses_to_start() {
        let config = AppConfig {
            model_path: PathBuf::from("does/not/exist"),
            ..AppConfig::default()
        };
        assert!(App::new(config).is_err());
    }
}
