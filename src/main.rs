use std::cell::Cell;
use std::io;
use std::path::Path;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use playbook_terminal::ai_client::AiClient;
use playbook_terminal::config::AppConfig;
use playbook_terminal::diagram::{FieldPress, PlayDiagram, marker_color};
use playbook_terminal::editor::{Gesture, Tool};
use playbook_terminal::exchange;
use playbook_terminal::play::{MarkerKind, PlayKind};
use playbook_terminal::playbook::Playbook;
use playbook_terminal::provider;
use playbook_terminal::state::{
    self, AppState, CellMetrics, EditorFocus, EditorSession, PredictorField, Screen, apply_delta,
};

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<state::ProviderCommand>>,
    config: AppConfig,
    viewport: Rect,
}

impl App {
    fn new(cmd_tx: Option<mpsc::Sender<state::ProviderCommand>>, config: AppConfig) -> Self {
        let playbook = if config.seed_samples {
            Playbook::with_samples()
        } else {
            Playbook::new()
        };
        let mut state = AppState::new(playbook);
        state.hit_radius_px = config.hit_radius_px;
        state.cells = CellMetrics {
            width_px: config.cell_width_px,
            height_px: config.cell_height_px,
        };
        state.ai_enabled = config.ai.is_some();
        Self {
            state,
            should_quit: false,
            cmd_tx,
            config,
            viewport: Rect::default(),
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        if self.state.help_overlay {
            if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc) {
                self.state.help_overlay = false;
            }
            return;
        }
        match self.state.screen {
            Screen::Playbook => self.on_playbook_key(key),
            Screen::Editor => self.on_editor_key(key),
            Screen::Predictor => self.on_predictor_key(key),
        }
    }

    fn on_playbook_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('2') | KeyCode::Char('P') => self.state.screen = Screen::Predictor,
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Char('f') => self.state.cycle_filter(),
            KeyCode::Char('n') | KeyCode::Enter => self.state.open_editor(),
            KeyCode::Delete | KeyCode::Char('D') => {
                if self.state.delete_selected().is_none() {
                    self.state.push_log("[INFO] No play selected");
                }
            }
            KeyCode::Char('x') => self.export_json(),
            KeyCode::Char('i') => self.import_json(),
            KeyCode::Char('w') => self.export_workbook(),
            KeyCode::Char('g') => self.export_svg(),
            KeyCode::Char('a') => self.request_breakdown(),
            KeyCode::Char('?') => self.state.help_overlay = true,
            _ => {}
        }
    }

    fn on_editor_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('s') {
            let _ = self.state.save_editor();
            return;
        }
        let Some(session) = self.state.editor.as_mut() else {
            self.state.screen = Screen::Playbook;
            return;
        };

        if session.label_prompt.is_some() {
            match key.code {
                KeyCode::Esc => self.state.cancel_label(),
                KeyCode::Enter => {
                    let _ = self.state.confirm_label();
                }
                KeyCode::Backspace => session.backspace(),
                KeyCode::Char(ch) => {
                    session.type_char(ch);
                }
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Esc => {
                self.state.discard_editor();
                return;
            }
            KeyCode::Tab => {
                session.focus = session.focus.next();
                return;
            }
            _ => {}
        }

        if session.focus != EditorFocus::Field {
            match key.code {
                KeyCode::Enter => session.focus = session.focus.next(),
                KeyCode::Backspace => session.backspace(),
                KeyCode::Char(ch) => {
                    session.type_char(ch);
                }
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Char('m') => self.state.set_editor_tool(Tool::Move),
            KeyCode::Char('o') => self.state.set_editor_tool(Tool::AddOffense),
            KeyCode::Char('d') => self.state.set_editor_tool(Tool::AddDefense),
            KeyCode::Char('p') => self.state.set_editor_tool(Tool::DrawPath),
            KeyCode::Char('x') => self.state.set_editor_tool(Tool::Erase),
            KeyCode::Char('t') => {
                session.editor.meta.kind = session.editor.meta.kind.toggled();
            }
            KeyCode::Char('?') => self.state.help_overlay = true,
            _ => {}
        }
    }

    fn on_predictor_key(&mut self, key: KeyEvent) {
        let predictor = &mut self.state.predictor;
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('1') | KeyCode::Esc => self.state.screen = Screen::Playbook,
            KeyCode::Up | KeyCode::Char('k') => predictor.select_prev(),
            KeyCode::Down | KeyCode::Char('j') => predictor.select_next(),
            KeyCode::Left | KeyCode::Char('h') => predictor.adjust(-1),
            KeyCode::Right | KeyCode::Char('l') => predictor.adjust(1),
            KeyCode::Backspace => predictor.time_backspace(),
            KeyCode::Char(ch) if ch.is_ascii_digit() || ch == ':' => {
                predictor.type_time_char(ch)
            }
            KeyCode::Enter => self.request_prediction(),
            KeyCode::Char('?') => self.state.help_overlay = true,
            _ => {}
        }
    }

    fn on_mouse(&mut self, mouse: MouseEvent) {
        if self.state.screen != Screen::Editor || self.state.help_overlay {
            return;
        }
        let field_area = editor_chunks(body_area(self.viewport))[2];
        let cells = self.state.cells;
        let Some(session) = self.state.editor.as_mut() else {
            return;
        };
        if session.label_prompt.is_some() {
            return;
        }

        // Presses come back through the widget's pointer-down handler;
        // drags and releases only need the cell mapping.
        let pressed = Cell::new(None);
        let located = {
            let draft = session.editor.draft();
            let record = |press: FieldPress| pressed.set(Some(press));
            let diagram = PlayDiagram::new(draft.markers(), draft.paths())
                .block(field_block(session))
                .on_pointer_down(&record);
            if matches!(mouse.kind, MouseEventKind::Down(MouseButton::Left)) {
                diagram.pointer_down(field_area, mouse.column, mouse.row);
                pressed.get()
            } else {
                diagram.locate(field_area, mouse.column, mouse.row)
            }
        };
        if let Some(press) = located {
            session
                .editor
                .set_surface(cells.surface(press.width, press.height));
        }
        let pos = located.map(|press| cells.position(press));

        let outcome = match (mouse.kind, pos) {
            (MouseEventKind::Down(MouseButton::Left), Some(pos)) => {
                session.focus = EditorFocus::Field;
                session.editor.pointer_down(pos)
            }
            (MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved, Some(pos)) => {
                session.editor.pointer_move(pos);
                return;
            }
            (MouseEventKind::Up(MouseButton::Left), Some(pos)) => session.editor.pointer_up(pos),
            (
                MouseEventKind::Drag(MouseButton::Left)
                | MouseEventKind::Moved
                | MouseEventKind::Up(MouseButton::Left),
                None,
            ) => session.editor.pointer_leave(),
            _ => return,
        };
        self.state.apply_editor_outcome(outcome);
    }

    fn send(&mut self, cmd: state::ProviderCommand, what: &str) -> bool {
        let Some(tx) = &self.cmd_tx else {
            self.state.push_log(format!("[INFO] {what} unavailable"));
            return false;
        };
        if tx.send(cmd).is_err() {
            self.state.push_log(format!("[WARN] {what} request failed"));
            return false;
        }
        true
    }

    fn export_json(&mut self) {
        let path = exchange::playbook_file_path(&self.config.export_dir);
        let cmd = state::ProviderCommand::ExportJson {
            path: path_string(&path),
            plays: self.state.playbook.plays().to_vec(),
        };
        if self.send(cmd, "JSON export") {
            self.state
                .push_log(format!("[INFO] Export started: {}", path.display()));
        }
    }

    fn import_json(&mut self) {
        let path = exchange::playbook_file_path(&self.config.export_dir);
        let cmd = state::ProviderCommand::ImportJson {
            path: path_string(&path),
        };
        if self.send(cmd, "Import") {
            self.state
                .push_log(format!("[INFO] Importing from {}", path.display()));
        }
    }

    fn export_workbook(&mut self) {
        if self.state.export.active && !self.state.export.done {
            self.state.push_log("[INFO] Export already running");
            return;
        }
        let path = exchange::workbook_file_path(&self.config.export_dir, &exchange::export_stamp());
        let cmd = state::ProviderCommand::ExportWorkbook {
            path: path_string(&path),
            plays: self.state.playbook.plays().to_vec(),
        };
        if self.send(cmd, "Workbook export") {
            self.state
                .push_log(format!("[INFO] Export started: {}", path.display()));
        }
    }

    fn export_svg(&mut self) {
        let Some(play) = self.state.selected_play().cloned() else {
            self.state.push_log("[INFO] No play selected");
            return;
        };
        let path = exchange::svg_file_path(&self.config.export_dir, &play);
        let cmd = state::ProviderCommand::ExportSvg {
            path: path_string(&path),
            play,
        };
        self.send(cmd, "SVG export");
    }

    fn request_breakdown(&mut self) {
        let Some(play) = self.state.selected_play().cloned() else {
            self.state.push_log("[INFO] No play selected");
            return;
        };
        if !self.state.ai_enabled {
            self.state
                .push_log("[WARN] AI breakdown needs GEMINI_API_KEY");
            return;
        }
        let play_id = play.id;
        if self.send(state::ProviderCommand::ExplainPlay(play), "Breakdown") {
            self.state.breakdown_loading = Some(play_id);
        }
    }

    fn request_prediction(&mut self) {
        if self.state.predictor.loading {
            return;
        }
        let situation = self.state.predictor.situation.clone();
        if self.send(state::ProviderCommand::Predict(situation), "Prediction") {
            self.state.predictor.loading = true;
            self.state.predictor.error = None;
        }
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    let config = AppConfig::from_env();

    let (ai, ai_error) = match config.ai.clone().map(AiClient::new) {
        Some(Ok(client)) => (Some(client), None),
        Some(Err(err)) => (None, Some(err)),
        None => (None, None),
    };

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let ai_model = ai.as_ref().map(|client| client.model().to_string());
    provider::spawn_provider(tx, cmd_rx, ai);

    let mut app = App::new(Some(cmd_tx), config);
    match (ai_model, ai_error) {
        (Some(model), _) => app.state.push_log(format!("[INFO] AI ready ({model})")),
        (None, Some(err)) => {
            app.state.ai_enabled = false;
            app.state.push_log(format!("[WARN] AI disabled: {err:#}"));
        }
        (None, None) => app.state.push_log("[INFO] AI disabled (no GEMINI_API_KEY)"),
    }
    app.state.push_log(format!(
        "[INFO] Exports go to {}",
        app.config.export_dir.display()
    ));

    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<state::Delta>,
) -> io::Result<()> {
    let tick_rate = app.config.tick_rate;
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        app.viewport = terminal.size()?;
        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => app.on_key(key),
                Event::Mouse(mouse) => app.on_mouse(mouse),
                _ => {}
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.state.maybe_clear_export(Instant::now());
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn body_area(area: Rect) -> Rect {
    outer_chunks(area)[1]
}

fn outer_chunks(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(area)
}

fn editor_chunks(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7),
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(3),
        ])
        .split(area)
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = outer_chunks(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match app.state.screen {
        Screen::Playbook => render_playbook(frame, chunks[1], &app.state),
        Screen::Editor => render_editor(frame, chunks[1], &app.state),
        Screen::Predictor => render_predictor(frame, chunks[1], &app.state),
    }

    let footer = Paragraph::new(footer_text(&app.state))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[2]);

    if let Some(session) = &app.state.editor {
        if app.state.screen == Screen::Editor && session.label_prompt.is_some() {
            render_label_prompt(frame, frame.size(), session);
        }
    }

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let title = match state.screen {
        Screen::Playbook => format!(
            "PLAYBOOK | {} plays | Filter: {}",
            state.playbook.len(),
            state.filter.as_str()
        ),
        Screen::Editor => "PLAY CREATOR".to_string(),
        Screen::Predictor => format!(
            "LIVE PLAY PREDICTOR | AI {}",
            if state.ai_enabled { "on" } else { "off" }
        ),
    };
    let line1 = format!("  _o_  {}", title);
    let line2 = "  /|\\".to_string();
    format!("{line1}\n{line2}")
}

fn footer_text(state: &AppState) -> String {
    if state.export.active {
        let path = state.export.path.as_deref().unwrap_or("");
        return if state.export.done {
            format!("Export: {} -> {path}", state.export.message)
        } else {
            format!(
                "Export {}/{}: {}",
                state.export.current, state.export.total, state.export.message
            )
        };
    }
    match state.screen {
        Screen::Playbook => {
            "j/k Move | f Filter | n New | D Delete | x Export | i Import | w Workbook | g SVG | a AI | 2 Predictor | ? Help | q Quit".to_string()
        }
        Screen::Editor => {
            "m Move | o Offense | d Defense | p Path | x Erase | t Side | Tab Focus | Ctrl+S Save | Esc Discard".to_string()
        }
        Screen::Predictor => {
            "↑/↓ Field | ←/→ Adjust | 0-9 : Time | Enter Predict | 1/Esc Playbook | q Quit".to_string()
        }
    }
}

fn render_playbook(frame: &mut Frame, area: Rect, state: &AppState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(6)])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(34), Constraint::Min(30)])
        .split(rows[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(10), Constraint::Length(9)])
        .split(columns[1]);

    let list = Paragraph::new(play_list_text(state)).block(
        Block::default()
            .title(format!("Plays ({})", state.filter.as_str()))
            .borders(Borders::ALL),
    );
    frame.render_widget(list, columns[0]);

    match state.selected_play() {
        Some(play) => {
            let diagram = PlayDiagram::new(&play.formation_markers, &play.paths)
                .block(Block::default().title(play.name.as_str()).borders(Borders::ALL));
            frame.render_widget(diagram, right[0]);
        }
        None => {
            let empty = Paragraph::new("No plays yet. Press n to create one.")
                .style(Style::default().fg(Color::DarkGray))
                .block(Block::default().title("Diagram").borders(Borders::ALL));
            frame.render_widget(empty, right[0]);
        }
    }

    let details = Paragraph::new(play_details_text(state))
        .wrap(Wrap { trim: true })
        .block(Block::default().title("Details").borders(Borders::ALL));
    frame.render_widget(details, right[1]);

    let console = Paragraph::new(console_text(state, rows[1].height.saturating_sub(2)))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, rows[1]);
}

fn play_list_text(state: &AppState) -> String {
    let plays = state.filtered_plays();
    if plays.is_empty() {
        return "No plays for this filter".to_string();
    }
    let mut lines = Vec::new();
    for (idx, play) in plays.iter().enumerate() {
        let prefix = if idx == state.selected { "> " } else { "  " };
        let side = match play.kind {
            PlayKind::Offense => "OFF",
            PlayKind::Defense => "DEF",
        };
        lines.push(format!("{prefix}[{side}] {}", play.name));
    }
    lines.join("\n")
}

fn play_details_text(state: &AppState) -> String {
    let Some(play) = state.selected_play() else {
        return String::new();
    };
    let mut lines = vec![format!(
        "{} | {} | {}",
        play.kind.as_str(),
        if play.sub_type.is_empty() { "-" } else { play.sub_type.as_str() },
        play.formation
    )];
    if !play.description.is_empty() {
        lines.push(play.description.clone());
    }
    if state.breakdown_loading == Some(play.id) {
        lines.push("AI breakdown: loading...".to_string());
    } else if let Some(text) = state.breakdowns.get(&play.id) {
        lines.push(format!("AI breakdown: {text}"));
    }
    lines.join("\n")
}

fn console_text(state: &AppState, height: u16) -> String {
    let take = usize::from(height.max(1));
    let skip = state.logs.len().saturating_sub(take);
    state
        .logs
        .iter()
        .skip(skip)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

fn field_block(session: &EditorSession) -> Block<'static> {
    let style = if session.focus == EditorFocus::Field {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    Block::default()
        .title("Field")
        .borders(Borders::ALL)
        .border_style(style)
}

fn render_editor(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(session) = &state.editor else {
        return;
    };
    let chunks = editor_chunks(area);

    let form = Paragraph::new(editor_form_lines(session))
        .block(Block::default().title("Play").borders(Borders::ALL));
    frame.render_widget(form, chunks[0]);

    let tools = Paragraph::new(toolbar_line(session))
        .block(Block::default().title("Tools").borders(Borders::ALL));
    frame.render_widget(tools, chunks[1]);

    let editor = &session.editor;
    let diagram = PlayDiagram::new(editor.draft().markers(), editor.draft().paths())
        .active_path(editor.active_path())
        .block(field_block(session));
    frame.render_widget(diagram, chunks[2]);

    let status = session.status.clone().unwrap_or_else(|| gesture_text(editor.gesture()));
    let status_style = if session
        .status
        .as_deref()
        .is_some_and(|s| s.starts_with("Please"))
    {
        Style::default().fg(Color::Red)
    } else {
        Style::default()
    };
    let status = Paragraph::new(status)
        .style(status_style)
        .block(Block::default().title("Status").borders(Borders::ALL));
    frame.render_widget(status, chunks[3]);
}

fn editor_form_lines(session: &EditorSession) -> Vec<Line<'static>> {
    let meta = &session.editor.meta;
    let field = |focus: EditorFocus, value: &str| {
        let focused = session.focus == focus;
        let label_style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        let cursor = if focused { "_" } else { "" };
        Line::from(vec![
            Span::styled(format!("{:<12}", focus.label()), label_style),
            Span::raw(format!("{value}{cursor}")),
        ])
    };
    vec![
        field(EditorFocus::Name, &meta.name),
        Line::from(vec![
            Span::styled(format!("{:<12}", "Side"), Style::default().fg(Color::Gray)),
            Span::raw(format!("{} (t)", meta.kind.as_str())),
        ]),
        field(EditorFocus::Formation, &meta.formation),
        field(EditorFocus::SubType, &meta.sub_type),
        field(EditorFocus::Description, &meta.description),
    ]
}

fn toolbar_line(session: &EditorSession) -> Line<'static> {
    let active = session.editor.tool();
    let mut spans = Vec::new();
    for tool in Tool::ALL {
        let key = match tool {
            Tool::Move => 'm',
            Tool::AddOffense => 'o',
            Tool::AddDefense => 'd',
            Tool::DrawPath => 'p',
            Tool::Erase => 'x',
        };
        let mut style = match tool.marker_kind() {
            Some(kind) => Style::default().fg(marker_color(kind)),
            None => Style::default(),
        };
        if tool == active {
            style = style.add_modifier(Modifier::REVERSED | Modifier::BOLD);
        }
        spans.push(Span::styled(format!(" {key}:{} ", tool.as_str()), style));
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}

fn gesture_text(gesture: &Gesture) -> String {
    match gesture {
        Gesture::Idle => "Click the field to use the selected tool".to_string(),
        Gesture::DraggingMarker { marker_id, .. } => format!("Dragging {marker_id}"),
        Gesture::DrawingPath(path) => format!(
            "Drawing route for {} ({} points)",
            path.marker_id,
            path.points.len()
        ),
        Gesture::Clicking { tool } => format!("{}...", tool.as_str()),
    }
}

fn render_label_prompt(frame: &mut Frame, area: Rect, session: &EditorSession) {
    let Some(prompt) = &session.label_prompt else {
        return;
    };
    let popup_area = centered_rect(40, 25, area);
    frame.render_widget(Clear, popup_area);

    let side = match prompt.pending.kind {
        MarkerKind::Offense => "offense",
        MarkerKind::Defense => "defense",
    };
    let mut lines = vec![
        Line::from(format!(
            "New {side} player at ({:.0}, {:.0})",
            prompt.pending.at.x, prompt.pending.at.y
        )),
        Line::from(format!("Label: {}_", prompt.input)),
    ];
    if let Some(err) = &prompt.error {
        lines.push(Line::styled(err.clone(), Style::default().fg(Color::Red)));
    }
    lines.push(Line::styled(
        "Enter place | Esc cancel",
        Style::default().fg(Color::DarkGray),
    ));

    let popup = Paragraph::new(lines).block(
        Block::default()
            .title("Player label")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(marker_color(prompt.pending.kind))),
    );
    frame.render_widget(popup, popup_area);
}

fn render_predictor(frame: &mut Frame, area: Rect, state: &AppState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(6)])
        .split(area);
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(36), Constraint::Min(30)])
        .split(rows[0]);

    let predictor = &state.predictor;
    let form: Vec<Line> = PredictorField::ALL
        .iter()
        .map(|field| {
            let value = match field {
                PredictorField::Down => predictor.situation.down.to_string(),
                PredictorField::Distance => format!("{} yds", predictor.situation.distance),
                PredictorField::YardLine => format!("own {}", predictor.situation.own_yard_line),
                PredictorField::Time => predictor.situation.time_remaining.clone(),
            };
            let style = if *field == predictor.field {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Line::styled(format!("{:<16}{value}", field.label()), style)
        })
        .collect();
    let form = Paragraph::new(form)
        .block(Block::default().title("Game situation").borders(Borders::ALL));
    frame.render_widget(form, columns[0]);

    let result = Paragraph::new(prediction_text(state))
        .wrap(Wrap { trim: true })
        .block(Block::default().title("AI prediction").borders(Borders::ALL));
    frame.render_widget(result, columns[1]);

    let console = Paragraph::new(console_text(state, rows[1].height.saturating_sub(2)))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, rows[1]);
}

fn prediction_text(state: &AppState) -> String {
    let predictor = &state.predictor;
    if predictor.loading {
        return "Analyzing...".to_string();
    }
    if let Some(err) = &predictor.error {
        return format!("Error: {err}");
    }
    match &predictor.prediction {
        Some(p) => format!(
            "Prediction: {}\nConfidence: {:.0}%\n\n{}",
            p.play_type.as_str(),
            p.confidence,
            p.analysis
        ),
        None if state.ai_enabled => "Press Enter to predict the next play".to_string(),
        None => "AI is disabled. Set GEMINI_API_KEY to enable predictions.".to_string(),
    }
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 70, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Playbook Terminal - Help",
        "",
        "Playbook:",
        "  j/k or ↑/↓   Select play",
        "  f            Cycle filter (All/Offense/Defense)",
        "  n / Enter    Create new play",
        "  D / Delete   Delete play",
        "  x / i        Export / import playbook.json",
        "  w            Export workbook (.xlsx)",
        "  g            Export selected diagram (.svg)",
        "  a            AI breakdown of selected play",
        "  2            Live play predictor",
        "",
        "Play creator:",
        "  m o d p x    Move, add offense, add defense, draw path, erase",
        "  t            Toggle offense/defense play",
        "  Tab          Cycle focus (field, name, formation, ...)",
        "  Ctrl+S       Save   Esc  Discard",
        "  Mouse        Click, drag and draw on the field",
        "",
        "  ?            Toggle help",
        "  q / Ctrl+C   Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
