use playbook_terminal::ai_client::{PlayPrediction, PredictedPlayType};
use std::cell::Cell;

use ratatui::layout::Rect;
use ratatui::widgets::{Block, Borders};

use playbook_terminal::diagram::{FieldPress, PlayDiagram};
use playbook_terminal::editor::EditorOutcome;
use playbook_terminal::editor::{Surface, SurfacePos, Tool};
use playbook_terminal::error::ValidationError;
use playbook_terminal::playbook::{PlayFilter, Playbook, sample_plays};
use playbook_terminal::state::{
    AppState, CellMetrics, Delta, EditorFocus, PredictorField, Screen, apply_delta,
};

fn editor_state() -> AppState {
    let mut state = AppState::new(Playbook::with_samples());
    state.open_editor();
    let session = state.editor.as_mut().expect("editor open");
    session.editor.set_surface(Surface::new(1000.0, 1000.0));
    state
}

#[test]
fn failed_save_keeps_editor_open_and_playbook_untouched() {
    let mut state = editor_state();
    let before = state.playbook.len();

    assert_eq!(state.save_editor(), Err(ValidationError::MissingName));
    assert_eq!(state.screen, Screen::Editor);
    assert_eq!(state.playbook.len(), before);
    let status = state
        .editor
        .as_ref()
        .and_then(|s| s.status.clone())
        .expect("status");
    assert!(status.starts_with("Please provide"));
}

#[test]
fn save_prepends_play_and_returns_to_playbook() {
    let mut state = editor_state();
    state.filter = PlayFilter::Defense;
    {
        let session = state.editor.as_mut().expect("editor open");
        session.editor.meta.name = "Screen Left".to_string();
        session.editor.meta.formation = "Shotgun".to_string();
    }

    let id = state.save_editor().expect("saved").expect("editor was open");
    assert_eq!(state.screen, Screen::Playbook);
    assert!(state.editor.is_none());
    assert_eq!(state.playbook.plays()[0].id, id);
    assert_eq!(state.filter, PlayFilter::All);
    assert_eq!(state.selected_play().map(|p| p.name.as_str()), Some("Screen Left"));
    assert!(state.logs.back().is_some_and(|l| l.contains("Screen Left")));
}

#[test]
fn save_without_open_editor_is_a_no_op() {
    let mut state = AppState::new(Playbook::with_samples());
    assert_eq!(state.save_editor(), Ok(None));
    assert_eq!(state.screen, Screen::Playbook);
    assert_eq!(state.playbook.len(), 3);
    assert!(state.logs.is_empty());
}

#[test]
fn discard_drops_the_draft() {
    let mut state = editor_state();
    state.editor.as_mut().expect("editor").editor.meta.name = "Half done".to_string();
    state.discard_editor();
    assert!(state.editor.is_none());
    assert_eq!(state.screen, Screen::Playbook);
    assert_eq!(state.playbook.len(), 3);
}

#[test]
fn label_prompt_flow_places_marker() {
    let mut state = editor_state();
    state.set_editor_tool(Tool::AddDefense);
    let outcome = {
        let editor = &mut state.editor.as_mut().expect("editor").editor;
        editor.pointer_down(SurfacePos::new(250.0, 300.0));
        editor.pointer_up(SurfacePos::new(250.0, 300.0))
    };
    state.apply_editor_outcome(outcome);
    assert!(state.editor.as_ref().is_some_and(|s| s.label_prompt.is_some()));

    // Blank label keeps the prompt open with an error.
    assert_eq!(state.confirm_label(), Err(ValidationError::EmptyLabel));
    let session = state.editor.as_mut().expect("editor");
    assert!(session.label_prompt.as_ref().is_some_and(|p| p.error.is_some()));

    for ch in "cb".chars() {
        assert!(session.type_char(ch));
    }
    assert_eq!(state.confirm_label(), Ok(()));
    let session = state.editor.as_ref().expect("editor");
    assert!(session.label_prompt.is_none());
    let markers = session.editor.draft().markers();
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].label, "CB");
}

#[test]
fn cancelled_prompt_places_nothing() {
    let mut state = editor_state();
    state.set_editor_tool(Tool::AddOffense);
    let outcome = {
        let editor = &mut state.editor.as_mut().expect("editor").editor;
        editor.pointer_down(SurfacePos::new(100.0, 100.0));
        editor.pointer_up(SurfacePos::new(100.0, 100.0))
    };
    state.apply_editor_outcome(outcome);
    state.cancel_label();
    let session = state.editor.as_ref().expect("editor");
    assert!(session.label_prompt.is_none());
    assert!(session.editor.draft().markers().is_empty());
}

#[test]
fn typing_goes_to_the_focused_form_field() {
    let mut state = editor_state();
    let session = state.editor.as_mut().expect("editor");
    assert_eq!(session.focus, EditorFocus::Field);
    assert!(!session.type_char('x'));

    session.focus = session.focus.next();
    assert_eq!(session.focus, EditorFocus::Name);
    for ch in "Sweep".chars() {
        session.type_char(ch);
    }
    session.backspace();
    session.focus = session.focus.next();
    session.type_char('I');
    assert_eq!(session.editor.meta.name, "Swee");
    assert_eq!(session.editor.meta.formation, "I");
}

#[test]
fn cell_metrics_map_presses_to_cell_centers() {
    let cells = CellMetrics {
        width_px: 8.0,
        height_px: 16.0,
    };
    let press = FieldPress {
        column: 3,
        row: 2,
        width: 50,
        height: 20,
    };
    assert_eq!(cells.surface(press.width, press.height), Surface::new(400.0, 320.0));
    assert_eq!(cells.position(press), SurfacePos::new(28.0, 40.0));
}

#[test]
fn widget_press_drives_an_add_tool_click() {
    let mut state = AppState::new(Playbook::new());
    state.open_editor();
    state.set_editor_tool(Tool::AddOffense);
    let cells = state.cells;

    let pressed = Cell::new(None);
    let record = |press: FieldPress| pressed.set(Some(press));
    let area = Rect::new(0, 0, 52, 22);
    PlayDiagram::new(&[], &[])
        .block(Block::default().borders(Borders::ALL))
        .on_pointer_down(&record)
        .pointer_down(area, 26, 11);
    let press = pressed.get().expect("press reported");

    let session = state.editor.as_mut().expect("editor");
    session
        .editor
        .set_surface(cells.surface(press.width, press.height));
    let pos = cells.position(press);
    session.editor.pointer_down(pos);
    let outcome = session.editor.pointer_up(pos);
    assert!(matches!(outcome, EditorOutcome::LabelRequested(_)));
    state.apply_editor_outcome(outcome);
    assert!(state.editor.as_ref().is_some_and(|s| s.label_prompt.is_some()));
}

#[test]
fn delete_clamps_selection() {
    let mut state = AppState::new(Playbook::with_samples());
    state.select_next();
    state.select_next();
    state.select_next();
    assert_eq!(state.selected, 2);
    let removed = state.delete_selected().expect("removed");
    assert_eq!(removed.name, "Cover 3 Buzz");
    assert_eq!(state.selected, 1);
    assert_eq!(state.playbook.len(), 2);
}

#[test]
fn imported_plays_are_appended() {
    let mut state = AppState::new(Playbook::new());
    apply_delta(
        &mut state,
        Delta::PlaysImported {
            path: "/tmp/playbook.json".to_string(),
            plays: sample_plays(),
        },
    );
    assert_eq!(state.playbook.len(), 3);
    assert!(
        state
            .logs
            .back()
            .is_some_and(|l| l.starts_with("[INFO] Imported 3 plays"))
    );
}

#[test]
fn export_deltas_drive_export_state() {
    let mut state = AppState::default();
    apply_delta(
        &mut state,
        Delta::ExportStarted {
            path: "out.xlsx".to_string(),
            total: 3,
        },
    );
    assert!(state.export.active && !state.export.done);
    apply_delta(
        &mut state,
        Delta::ExportProgress {
            current: 2,
            total: 3,
            message: "Exported HB Dive".to_string(),
        },
    );
    assert_eq!(state.export.current, 2);
    apply_delta(
        &mut state,
        Delta::ExportFinished {
            path: "out.xlsx".to_string(),
            current: 3,
            total: 3,
            summary: "3 plays".to_string(),
            errors: 0,
        },
    );
    assert!(state.export.done);
    assert_eq!(state.export.message, "Done: 3 plays (0 errors)");

    let later = std::time::Instant::now() + std::time::Duration::from_secs(9);
    state.maybe_clear_export(later);
    assert!(!state.export.active);
}

#[test]
fn prediction_deltas_update_predictor() {
    let mut state = AppState::default();
    state.predictor.loading = true;
    apply_delta(
        &mut state,
        Delta::PredictionReady(PlayPrediction {
            play_type: PredictedPlayType::Pass,
            confidence: 72.0,
            analysis: "Long yardage".to_string(),
        }),
    );
    assert!(!state.predictor.loading);
    assert_eq!(
        state.predictor.prediction.as_ref().map(|p| p.play_type),
        Some(PredictedPlayType::Pass)
    );

    state.predictor.loading = true;
    apply_delta(&mut state, Delta::PredictionFailed("timeout".to_string()));
    assert!(!state.predictor.loading);
    assert!(state.predictor.prediction.is_none());
    assert_eq!(state.predictor.error.as_deref(), Some("timeout"));
}

#[test]
fn predictor_form_edits_stay_valid() {
    let mut state = AppState::default();
    let predictor = &mut state.predictor;
    assert_eq!(predictor.field, PredictorField::Down);
    predictor.adjust(-1);
    assert_eq!(predictor.situation.down, 4);
    predictor.select_prev();
    assert_eq!(predictor.field, PredictorField::Time);
    predictor.time_backspace();
    predictor.type_time_char('x');
    predictor.type_time_char('5');
    assert_eq!(predictor.situation.time_remaining, "12:05");
    predictor.select_next();
    predictor.select_next();
    predictor.adjust(3);
    assert_eq!(predictor.situation.distance, 13);
}

#[test]
fn breakdown_for_deleted_play_is_dropped() {
    let mut state = AppState::new(Playbook::with_samples());
    state.breakdown_loading = Some(2);
    apply_delta(
        &mut state,
        Delta::BreakdownReady {
            play_id: 2,
            text: "Hit the A gap".to_string(),
        },
    );
    assert_eq!(state.breakdowns.get(&2).map(String::as_str), Some("Hit the A gap"));
    assert!(state.breakdown_loading.is_none());

    apply_delta(
        &mut state,
        Delta::BreakdownReady {
            play_id: 99,
            text: "ghost".to_string(),
        },
    );
    assert!(!state.breakdowns.contains_key(&99));
}
