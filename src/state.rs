use std::collections::{HashMap, VecDeque};

use crate::ai_client::{GameSituation, PlayPrediction};
use crate::diagram::FieldPress;
use crate::editor::{EditorOutcome, PendingMarker, PlayEditor, Surface, SurfacePos, Tool};
use crate::error::ValidationError;
use crate::play::Play;
use crate::playbook::{PlayFilter, Playbook};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Playbook,
    Editor,
    Predictor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorFocus {
    Field,
    Name,
    Formation,
    SubType,
    Description,
}

impl EditorFocus {
    pub fn next(self) -> Self {
        match self {
            EditorFocus::Field => EditorFocus::Name,
            EditorFocus::Name => EditorFocus::Formation,
            EditorFocus::Formation => EditorFocus::SubType,
            EditorFocus::SubType => EditorFocus::Description,
            EditorFocus::Description => EditorFocus::Field,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EditorFocus::Field => "Field",
            EditorFocus::Name => "Name",
            EditorFocus::Formation => "Formation",
            EditorFocus::SubType => "Sub-type",
            EditorFocus::Description => "Description",
        }
    }
}

/// Size of one terminal cell in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellMetrics {
    pub width_px: f64,
    pub height_px: f64,
}

impl Default for CellMetrics {
    fn default() -> Self {
        Self {
            width_px: 8.0,
            height_px: 16.0,
        }
    }
}

impl CellMetrics {
    pub fn surface(&self, columns: u16, rows: u16) -> Surface {
        Surface::new(
            f64::from(columns) * self.width_px,
            f64::from(rows) * self.height_px,
        )
    }

    /// Center of the pressed cell, in surface pixels.
    pub fn position(&self, press: FieldPress) -> SurfacePos {
        SurfacePos::new(
            (f64::from(press.column) + 0.5) * self.width_px,
            (f64::from(press.row) + 0.5) * self.height_px,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelPrompt {
    pub pending: PendingMarker,
    pub input: String,
    pub error: Option<String>,
}

/// The open editor screen: one `PlayEditor` plus terminal-side focus and
/// prompt state.
#[derive(Debug, Clone)]
pub struct EditorSession {
    pub editor: PlayEditor,
    pub focus: EditorFocus,
    pub label_prompt: Option<LabelPrompt>,
    pub status: Option<String>,
}

impl EditorSession {
    pub fn new(editor: PlayEditor) -> Self {
        Self {
            editor,
            focus: EditorFocus::Field,
            label_prompt: None,
            status: None,
        }
    }

    fn focused_text(&mut self) -> Option<&mut String> {
        let meta = &mut self.editor.meta;
        match self.focus {
            EditorFocus::Field => None,
            EditorFocus::Name => Some(&mut meta.name),
            EditorFocus::Formation => Some(&mut meta.formation),
            EditorFocus::SubType => Some(&mut meta.sub_type),
            EditorFocus::Description => Some(&mut meta.description),
        }
    }

    pub fn type_char(&mut self, ch: char) -> bool {
        if let Some(prompt) = self.label_prompt.as_mut() {
            prompt.input.push(ch);
            prompt.error = None;
            return true;
        }
        match self.focused_text() {
            Some(text) => {
                text.push(ch);
                true
            }
            None => false,
        }
    }

    pub fn backspace(&mut self) {
        if let Some(prompt) = self.label_prompt.as_mut() {
            prompt.input.pop();
            return;
        }
        if let Some(text) = self.focused_text() {
            text.pop();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictorField {
    Down,
    Distance,
    YardLine,
    Time,
}

impl PredictorField {
    pub const ALL: [PredictorField; 4] = [
        PredictorField::Down,
        PredictorField::Distance,
        PredictorField::YardLine,
        PredictorField::Time,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PredictorField::Down => "Down",
            PredictorField::Distance => "Distance",
            PredictorField::YardLine => "Own yard line",
            PredictorField::Time => "Time remaining",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PredictorState {
    pub situation: GameSituation,
    pub field: PredictorField,
    pub loading: bool,
    pub prediction: Option<PlayPrediction>,
    pub error: Option<String>,
}

impl Default for PredictorState {
    fn default() -> Self {
        Self {
            situation: GameSituation::default(),
            field: PredictorField::Down,
            loading: false,
            prediction: None,
            error: None,
        }
    }
}

impl PredictorState {
    pub fn select_next(&mut self) {
        let idx = PredictorField::ALL.iter().position(|f| *f == self.field).unwrap_or(0);
        self.field = PredictorField::ALL[(idx + 1) % PredictorField::ALL.len()];
    }

    pub fn select_prev(&mut self) {
        let idx = PredictorField::ALL.iter().position(|f| *f == self.field).unwrap_or(0);
        let len = PredictorField::ALL.len();
        self.field = PredictorField::ALL[(idx + len - 1) % len];
    }

    pub fn adjust(&mut self, step: i16) {
        match self.field {
            PredictorField::Down => {
                if step > 0 {
                    self.situation.cycle_down();
                } else {
                    self.situation.down = if self.situation.down <= 1 {
                        4
                    } else {
                        self.situation.down - 1
                    };
                }
            }
            PredictorField::Distance => self.situation.adjust_distance(step),
            PredictorField::YardLine => self.situation.adjust_yard_line(step * 5),
            PredictorField::Time => {}
        }
    }

    pub fn type_time_char(&mut self, ch: char) {
        if self.field == PredictorField::Time
            && (ch.is_ascii_digit() || ch == ':')
            && self.situation.time_remaining.len() < 5
        {
            self.situation.time_remaining.push(ch);
        }
    }

    pub fn time_backspace(&mut self) {
        if self.field == PredictorField::Time {
            self.situation.time_remaining.pop();
        }
    }
}

pub struct AppState {
    pub screen: Screen,
    pub playbook: Playbook,
    pub filter: PlayFilter,
    pub selected: usize,
    pub editor: Option<EditorSession>,
    pub hit_radius_px: f64,
    pub cells: CellMetrics,
    pub predictor: PredictorState,
    pub ai_enabled: bool,
    pub breakdowns: HashMap<u64, String>,
    pub breakdown_loading: Option<u64>,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
    pub export: ExportState,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Playbook::new())
    }
}

impl AppState {
    pub fn maybe_clear_export(&mut self, now: std::time::Instant) {
        self.export.clear_if_done_for(now, 8);
    }

    pub fn new(playbook: Playbook) -> Self {
        Self {
            screen: Screen::Playbook,
            playbook,
            filter: PlayFilter::All,
            selected: 0,
            editor: None,
            hit_radius_px: crate::editor::DEFAULT_HIT_RADIUS_PX,
            cells: CellMetrics::default(),
            predictor: PredictorState::default(),
            ai_enabled: false,
            breakdowns: HashMap::new(),
            breakdown_loading: None,
            logs: VecDeque::new(),
            help_overlay: false,
            export: ExportState::new(),
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn filtered_plays(&self) -> Vec<&Play> {
        self.playbook.filtered(self.filter)
    }

    pub fn selected_play(&self) -> Option<&Play> {
        self.filtered_plays().get(self.selected).copied()
    }

    pub fn select_next(&mut self) {
        let len = self.filtered_plays().len();
        if len == 0 {
            self.selected = 0;
            return;
        }
        self.selected = (self.selected + 1).min(len - 1);
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn cycle_filter(&mut self) {
        self.filter = self.filter.cycle();
        self.selected = 0;
    }

    fn clamp_selection(&mut self) {
        let len = self.filtered_plays().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    pub fn delete_selected(&mut self) -> Option<Play> {
        let id = self.selected_play()?.id;
        let removed = self.playbook.remove(id)?;
        self.breakdowns.remove(&id);
        self.clamp_selection();
        self.push_log(format!("[INFO] Deleted play: {}", removed.name));
        Some(removed)
    }

    pub fn open_editor(&mut self) {
        let editor = PlayEditor::with_hit_radius(Surface::new(0.0, 0.0), self.hit_radius_px);
        self.editor = Some(EditorSession::new(editor));
        self.screen = Screen::Editor;
    }

    /// Closes the editor without saving.
    pub fn discard_editor(&mut self) {
        if self.editor.take().is_some() {
            self.push_log("[INFO] Discarded unsaved play");
        }
        self.screen = Screen::Playbook;
    }

    /// Validates the open editor and stores the play. The editor stays open
    /// with a status message when validation fails. `Ok(None)` means no
    /// editor was open.
    pub fn save_editor(&mut self) -> Result<Option<u64>, ValidationError> {
        let Some(session) = self.editor.as_mut() else {
            return Ok(None);
        };
        let new_play = match session.editor.save() {
            Ok(play) => play,
            Err(err) => {
                session.status = Some(err.to_string());
                return Err(err);
            }
        };
        let name = new_play.name.clone();
        let id = self.playbook.add(new_play);
        self.editor = None;
        self.screen = Screen::Playbook;
        self.filter = PlayFilter::All;
        self.selected = 0;
        self.push_log(format!("[INFO] Saved play: {name}"));
        Ok(Some(id))
    }

    pub fn set_editor_tool(&mut self, tool: Tool) {
        if let Some(session) = self.editor.as_mut() {
            session.status = Some(if session.editor.set_tool(tool) {
                format!("Tool: {}", tool.as_str())
            } else {
                "Finish the current gesture before switching tools".to_string()
            });
        }
    }

    /// Records what a pointer event did in the editor.
    pub fn apply_editor_outcome(&mut self, outcome: EditorOutcome) {
        let Some(session) = self.editor.as_mut() else {
            return;
        };
        let status = match outcome {
            EditorOutcome::Nothing
            | EditorOutcome::DragStarted { .. }
            | EditorOutcome::PathStarted { .. } => return,
            EditorOutcome::DragFinished { marker_id, at } => {
                format!("Moved {marker_id} to ({:.0}, {:.0})", at.x, at.y)
            }
            EditorOutcome::PathCommitted {
                marker_id,
                replaced,
            } => {
                if replaced {
                    format!("Replaced route for {marker_id}")
                } else {
                    format!("Drew route for {marker_id}")
                }
            }
            EditorOutcome::LabelRequested(pending) => {
                session.label_prompt = Some(LabelPrompt {
                    pending,
                    input: String::new(),
                    error: None,
                });
                "Enter player label".to_string()
            }
            EditorOutcome::MarkerErased {
                marker,
                path_removed,
            } => {
                if path_removed {
                    format!("Erased {} and its route", marker.label)
                } else {
                    format!("Erased {}", marker.label)
                }
            }
        };
        session.status = Some(status);
    }

    pub fn confirm_label(&mut self) -> Result<(), ValidationError> {
        let Some(session) = self.editor.as_mut() else {
            return Ok(());
        };
        let Some(prompt) = session.label_prompt.as_mut() else {
            return Ok(());
        };
        match session.editor.place_marker(prompt.pending, &prompt.input) {
            Ok(marker) => {
                session.label_prompt = None;
                session.status = Some(format!("Placed {} ({})", marker.label, marker.id));
                Ok(())
            }
            Err(err) => {
                prompt.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub fn cancel_label(&mut self) {
        if let Some(session) = self.editor.as_mut() {
            if session.label_prompt.take().is_some() {
                session.status = Some("Placement cancelled".to_string());
            }
        }
    }

    pub fn import_plays(&mut self, plays: Vec<Play>) -> usize {
        let count = self.playbook.import(plays);
        self.clamp_selection();
        count
    }
}

#[derive(Debug, Clone)]
pub struct ExportState {
    pub active: bool,
    pub done: bool,
    pub path: Option<String>,
    pub current: usize,
    pub total: usize,
    pub message: String,
    pub error_count: usize,
    pub last_updated: Option<std::time::Instant>,
}

impl Default for ExportState {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportState {
    pub fn new() -> Self {
        Self {
            active: false,
            done: false,
            path: None,
            current: 0,
            total: 0,
            message: String::new(),
            error_count: 0,
            last_updated: None,
        }
    }

    pub fn clear_if_done_for(&mut self, now: std::time::Instant, keep_secs: u64) {
        if !self.active || !self.done {
            return;
        }
        let Some(last) = self.last_updated else {
            return;
        };
        if now.duration_since(last).as_secs() >= keep_secs {
            *self = Self::new();
        }
    }
}

#[derive(Debug, Clone)]
pub enum Delta {
    ExportStarted {
        path: String,
        total: usize,
    },
    ExportProgress {
        current: usize,
        total: usize,
        message: String,
    },
    ExportFinished {
        path: String,
        current: usize,
        total: usize,
        summary: String,
        errors: usize,
    },
    PlaysImported {
        path: String,
        plays: Vec<Play>,
    },
    PredictionReady(PlayPrediction),
    PredictionFailed(String),
    BreakdownReady {
        play_id: u64,
        text: String,
    },
    BreakdownFailed {
        play_id: u64,
        error: String,
    },
    Log(String),
}

#[derive(Debug, Clone)]
pub enum ProviderCommand {
    ExportJson { path: String, plays: Vec<Play> },
    ImportJson { path: String },
    ExportWorkbook { path: String, plays: Vec<Play> },
    ExportSvg { path: String, play: Play },
    Predict(GameSituation),
    ExplainPlay(Play),
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::ExportStarted { path, total } => {
            state.export.active = true;
            state.export.path = Some(path);
            state.export.total = total;
            state.export.current = 0;
            state.export.message = "Starting export".to_string();
            state.export.done = false;
            state.export.error_count = 0;
            state.export.last_updated = Some(std::time::Instant::now());
        }
        Delta::ExportProgress {
            current,
            total,
            message,
        } => {
            state.export.active = true;
            state.export.total = total;
            state.export.current = current;
            state.export.message = message;
            state.export.last_updated = Some(std::time::Instant::now());
        }
        Delta::ExportFinished {
            path,
            current,
            total,
            summary,
            errors,
        } => {
            state.export.active = true;
            state.export.path = Some(path);
            state.export.current = current;
            state.export.total = total;
            state.export.message = format!("Done: {summary} ({errors} errors)");
            state.export.done = true;
            state.export.error_count = errors;
            state.export.last_updated = Some(std::time::Instant::now());
        }
        Delta::PlaysImported { path, plays } => {
            let count = state.import_plays(plays);
            state.push_log(format!("[INFO] Imported {count} plays from {path}"));
        }
        Delta::PredictionReady(prediction) => {
            state.predictor.loading = false;
            state.predictor.error = None;
            state.push_log(format!(
                "[INFO] Prediction: {} ({:.0}%)",
                prediction.play_type.as_str(),
                prediction.confidence
            ));
            state.predictor.prediction = Some(prediction);
        }
        Delta::PredictionFailed(error) => {
            state.predictor.loading = false;
            state.predictor.prediction = None;
            state.push_log(format!("[WARN] Prediction failed: {error}"));
            state.predictor.error = Some(error);
        }
        Delta::BreakdownReady { play_id, text } => {
            if state.breakdown_loading == Some(play_id) {
                state.breakdown_loading = None;
            }
            // The play may have been deleted while the request was in flight.
            if state.playbook.get(play_id).is_some() {
                state.breakdowns.insert(play_id, text);
            }
        }
        Delta::BreakdownFailed { play_id, error } => {
            if state.breakdown_loading == Some(play_id) {
                state.breakdown_loading = None;
            }
            state.push_log(format!("[WARN] Breakdown failed: {error}"));
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}
