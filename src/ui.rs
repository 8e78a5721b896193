use crate::analytics::{compute_kpis, filter, top_hotspot, FilterCriteria, Kpis};
use crate::format;
use crate::models::{CrashEvent, Severity};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame, Terminal,
};
use std::io;

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Minor => Color::Green,
        Severity::Moderate => Color::Yellow,
        Severity::Severe => Color::Red,
        Severity::Unknown => Color::Gray,
    }
}

/// Row text for a crash in the list
pub fn display_text(event: &CrashEvent) -> String {
    format!(
        "{} | {} | {} | {} | {}",
        event.event_id,
        format::date(&event.timestamp),
        event.crash_type.label(),
        format::g_force(event.calculated_values.impact_force_g),
        event.location.address
    )
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputMode {
    Browsing,
    Searching,
}

/// UI state for browsing crashes
pub struct CrashBrowser {
    pub all_events: Vec<CrashEvent>,
    pub events: Vec<CrashEvent>,
    pub criteria: FilterCriteria,
    pub kpis: Kpis,
    pub hotspot: Option<(String, usize)>,
    pub list_state: ListState,
    pub mode: InputMode,
}

impl CrashBrowser {
    pub fn new(events: Vec<CrashEvent>) -> Self {
        let mut browser = Self {
            all_events: events,
            events: Vec::new(),
            criteria: FilterCriteria::default(),
            kpis: Kpis::default(),
            hotspot: None,
            list_state: ListState::default(),
            mode: InputMode::Browsing,
        };
        browser.apply_filter();
        browser
    }

    /// Recomputes the visible list and its KPIs, resetting the cursor to the top.
    fn apply_filter(&mut self) {
        self.events = filter(&self.all_events, &self.criteria);
        self.kpis = compute_kpis(&self.events);
        self.hotspot = top_hotspot(&self.events);
        if self.events.is_empty() {
            self.list_state.select(None);
        } else {
            self.list_state.select(Some(0));
        }
    }

    pub fn cycle_severity(&mut self) {
        self.criteria.severity = self.criteria.severity.cycle();
        self.apply_filter();
    }

    pub fn cycle_crash_type(&mut self) {
        self.criteria.crash_type = self.criteria.crash_type.cycle();
        self.apply_filter();
    }

    pub fn push_search_char(&mut self, c: char) {
        self.criteria.search_text.push(c);
        self.apply_filter();
    }

    pub fn pop_search_char(&mut self) {
        self.criteria.search_text.pop();
        self.apply_filter();
    }

    pub fn clear_search(&mut self) {
        self.criteria.search_text.clear();
        self.apply_filter();
    }

    pub fn selected(&self) -> Option<&CrashEvent> {
        self.list_state.selected().and_then(|i| self.events.get(i))
    }

    pub fn next(&mut self) {
        if self.events.is_empty() {
            self.list_state.select(None);
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => {
                if i >= self.events.len() - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn previous(&mut self) {
        if self.events.is_empty() {
            self.list_state.select(None);
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => {
                if i == 0 {
                    self.events.len() - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    /// KPI line for the header; empty lists read N/A rather than 0.
    pub fn summary_text(&self) -> String {
        let hotspot = self
            .hotspot
            .as_ref()
            .map(|(area, n)| format!("{} ({})", area, n))
            .unwrap_or_else(|| format::NOT_AVAILABLE.to_string());
        format!(
            "Crashes: {} | Severe: {} | Avg impact: {} | Peak speed: {} | Devices: {} | Hotspot: {}",
            self.kpis.total,
            self.kpis.severe_count,
            format::or_na(self.kpis.avg_impact_force_g, format::g_force),
            format::or_na(self.kpis.peak_speed, format::speed),
            self.kpis.distinct_device_count,
            hotspot
        )
    }
}

/// Render the UI
pub fn render_ui(f: &mut Frame, state: &CrashBrowser) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // KPIs
            Constraint::Min(10),   // Crash list
            Constraint::Length(3), // Search / instructions
        ])
        .split(f.area());

    let header = Paragraph::new(state.summary_text())
        .style(Style::default().fg(Color::LightBlue).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL).title("ForensicEDR"))
        .alignment(Alignment::Center);
    f.render_widget(header, chunks[0]);

    let items: Vec<ListItem> = state
        .events
        .iter()
        .enumerate()
        .map(|(i, event)| {
            let badge = Span::styled(
                format!("[{:>8}] ", event.severity.label()),
                Style::default().fg(severity_color(event.severity)),
            );
            let style = if state.list_state.selected() == Some(i) {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD | Modifier::REVERSED)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(vec![badge, Span::styled(display_text(event), style)]))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(format!(
            "Crashes ({} shown of {}, Severity: {}, Type: {})",
            state.events.len(),
            state.all_events.len(),
            state.criteria.severity,
            state.criteria.crash_type
        )))
        .highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED));

    f.render_stateful_widget(list, chunks[1], &mut state.list_state.clone());

    let instructions = match state.mode {
        InputMode::Browsing => format!(
            "Search: {:?} | ↑↓: Navigate | Enter: Open | 's': Severity | 't': Type | '/': Search | 'c': Clear | 'q': Quit",
            state.criteria.search_text
        ),
        InputMode::Searching => format!(
            "Search: {}_ | Enter/Esc: Done | Backspace: Delete",
            state.criteria.search_text
        ),
    };

    let footer = Paragraph::new(instructions)
        .style(Style::default().fg(Color::White))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Left);
    f.render_widget(footer, chunks[2]);
}

/// Run the crash browser. Returns the crash chosen with Enter, if any.
pub async fn run_crash_browser(
    events: Vec<CrashEvent>,
) -> Result<Option<CrashEvent>, Box<dyn std::error::Error>> {
    // Setup terminal
    crossterm::terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut state = CrashBrowser::new(events);
    let mut chosen = None;

    loop {
        terminal.draw(|f| render_ui(f, &state))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }

            match state.mode {
                InputMode::Browsing => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => break,
                    KeyCode::Up => state.previous(),
                    KeyCode::Down => state.next(),
                    KeyCode::PageUp => {
                        for _ in 0..10 {
                            state.previous();
                        }
                    }
                    KeyCode::PageDown => {
                        for _ in 0..10 {
                            state.next();
                        }
                    }
                    KeyCode::Char('s') => state.cycle_severity(),
                    KeyCode::Char('t') => state.cycle_crash_type(),
                    KeyCode::Char('c') => state.clear_search(),
                    KeyCode::Char('/') => state.mode = InputMode::Searching,
                    KeyCode::Enter => {
                        if let Some(event) = state.selected() {
                            chosen = Some(event.clone());
                            break;
                        }
                    }
                    _ => {}
                },
                InputMode::Searching => match key.code {
                    KeyCode::Enter | KeyCode::Esc => state.mode = InputMode::Browsing,
                    KeyCode::Backspace => state.pop_search_char(),
                    KeyCode::Char(c) => state.push_search_char(c),
                    _ => {}
                },
            }
        }
    }

    crossterm::execute!(
        terminal.backend_mut(),
        crossterm::terminal::LeaveAlternateScreen
    )?;
    crossterm::terminal::disable_raw_mode()?;

    Ok(chosen)
}
