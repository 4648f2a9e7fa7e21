//! Interaction state machine for the play diagram editor.
//!
//! Pointer positions arrive in surface pixels. They are translated into field
//! percentages, dispatched on the selected tool and applied to the session's
//! `PlayDraft`. Hit testing stays in pixel space so the grab radius does not
//! change with the field's size.

use crate::error::ValidationError;
use crate::play::{
    FIELD_MAX, FieldPoint, MarkerKind, NewPlay, PlayDraft, PlayKind, PlayerMarker, PlayerPath,
};

pub const DEFAULT_HIT_RADIUS_PX: f64 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Move,
    AddOffense,
    AddDefense,
    DrawPath,
    Erase,
}

impl Tool {
    pub const ALL: [Tool; 5] = [
        Tool::Move,
        Tool::AddOffense,
        Tool::AddDefense,
        Tool::DrawPath,
        Tool::Erase,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Tool::Move => "move",
            Tool::AddOffense => "add-offense",
            Tool::AddDefense => "add-defense",
            Tool::DrawPath => "draw-path",
            Tool::Erase => "erase",
        }
    }

    pub fn marker_kind(self) -> Option<MarkerKind> {
        match self {
            Tool::AddOffense => Some(MarkerKind::Offense),
            Tool::AddDefense => Some(MarkerKind::Defense),
            _ => None,
        }
    }
}

/// A position on the rendered field, in pixels from its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfacePos {
    pub x: f64,
    pub y: f64,
}

impl SurfacePos {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Pixel size of the rendered field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surface {
    pub width: f64,
    pub height: f64,
}

impl Surface {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Pixel position to field percentage, clamped into the field.
    pub fn to_field(&self, pos: SurfacePos) -> Option<FieldPoint> {
        if self.is_empty() {
            return None;
        }
        let x = pos.x * FIELD_MAX / self.width;
        let y = pos.y * FIELD_MAX / self.height;
        Some(FieldPoint::new(x, y).clamped())
    }

    pub fn to_surface(&self, point: FieldPoint) -> SurfacePos {
        SurfacePos::new(point.x * self.width / FIELD_MAX, point.y * self.height / FIELD_MAX)
    }
}

/// What the pointer is currently doing.
#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    Idle,
    DraggingMarker {
        marker_id: String,
        grab_offset: FieldPoint,
    },
    DrawingPath(PlayerPath),
    Clicking {
        tool: Tool,
    },
}

/// A marker waiting for the user to type its label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingMarker {
    pub kind: MarkerKind,
    pub at: FieldPoint,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditorOutcome {
    Nothing,
    DragStarted {
        marker_id: String,
    },
    DragFinished {
        marker_id: String,
        at: FieldPoint,
    },
    PathStarted {
        marker_id: String,
    },
    PathCommitted {
        marker_id: String,
        replaced: bool,
    },
    LabelRequested(PendingMarker),
    MarkerErased {
        marker: PlayerMarker,
        path_removed: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayMeta {
    pub name: String,
    pub kind: PlayKind,
    pub sub_type: String,
    pub formation: String,
    pub description: String,
}

impl Default for PlayMeta {
    fn default() -> Self {
        Self {
            name: String::new(),
            kind: PlayKind::Offense,
            sub_type: String::new(),
            formation: String::new(),
            description: String::new(),
        }
    }
}

/// One open "create new play" session.
#[derive(Debug, Clone)]
pub struct PlayEditor {
    pub meta: PlayMeta,
    draft: PlayDraft,
    tool: Tool,
    gesture: Gesture,
    surface: Surface,
    hit_radius_px: f64,
}

impl PlayEditor {
    pub fn new(surface: Surface) -> Self {
        Self::with_hit_radius(surface, DEFAULT_HIT_RADIUS_PX)
    }

    pub fn with_hit_radius(surface: Surface, hit_radius_px: f64) -> Self {
        Self {
            meta: PlayMeta::default(),
            draft: PlayDraft::new(),
            tool: Tool::Move,
            gesture: Gesture::Idle,
            surface,
            hit_radius_px,
        }
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Selects a tool between gestures. Returns false, leaving the current
    /// tool in place, while a gesture is in progress.
    pub fn set_tool(&mut self, tool: Tool) -> bool {
        if self.gesture != Gesture::Idle {
            return false;
        }
        self.tool = tool;
        true
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn surface(&self) -> Surface {
        self.surface
    }

    pub fn set_surface(&mut self, surface: Surface) {
        self.surface = surface;
    }

    pub fn hit_radius_px(&self) -> f64 {
        self.hit_radius_px
    }

    pub fn draft(&self) -> &PlayDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut PlayDraft {
        &mut self.draft
    }

    pub fn active_path(&self) -> Option<&PlayerPath> {
        match &self.gesture {
            Gesture::DrawingPath(path) => Some(path),
            _ => None,
        }
    }

    /// First marker (in insertion order) whose center lies strictly within
    /// the hit radius of `pos`.
    pub fn marker_at(&self, pos: SurfacePos) -> Option<&PlayerMarker> {
        let point = self.surface.to_field(pos)?;
        let press = self.surface.to_surface(point);
        self.draft.markers().iter().find(|marker| {
            let center = self.surface.to_surface(marker.position());
            (center.x - press.x).hypot(center.y - press.y) < self.hit_radius_px
        })
    }

    fn hit(&self, pos: SurfacePos) -> Option<(String, FieldPoint)> {
        self.marker_at(pos).map(|m| (m.id.clone(), m.position()))
    }

    pub fn pointer_down(&mut self, pos: SurfacePos) -> EditorOutcome {
        if self.gesture != Gesture::Idle {
            return EditorOutcome::Nothing;
        }
        let Some(point) = self.surface.to_field(pos) else {
            return EditorOutcome::Nothing;
        };

        match self.tool {
            Tool::Move => {
                let Some((marker_id, origin)) = self.hit(pos) else {
                    return EditorOutcome::Nothing;
                };
                self.gesture = Gesture::DraggingMarker {
                    marker_id: marker_id.clone(),
                    grab_offset: point.offset_from(origin),
                };
                EditorOutcome::DragStarted { marker_id }
            }
            Tool::DrawPath => {
                let Some((marker_id, origin)) = self.hit(pos) else {
                    return EditorOutcome::Nothing;
                };
                let path = PlayerPath::new(marker_id.clone(), vec![origin]);
                self.gesture = Gesture::DrawingPath(path);
                EditorOutcome::PathStarted { marker_id }
            }
            tool @ (Tool::AddOffense | Tool::AddDefense | Tool::Erase) => {
                self.gesture = Gesture::Clicking { tool };
                EditorOutcome::Nothing
            }
        }
    }

    /// Returns true when the draft or the active path changed.
    pub fn pointer_move(&mut self, pos: SurfacePos) -> bool {
        let Some(point) = self.surface.to_field(pos) else {
            return false;
        };
        match &mut self.gesture {
            Gesture::DraggingMarker {
                marker_id,
                grab_offset,
            } => self
                .draft
                .move_marker(marker_id, point.minus(*grab_offset))
                .is_some(),
            Gesture::DrawingPath(path) => {
                path.points.push(point);
                true
            }
            Gesture::Idle | Gesture::Clicking { .. } => false,
        }
    }

    pub fn pointer_up(&mut self, pos: SurfacePos) -> EditorOutcome {
        match std::mem::replace(&mut self.gesture, Gesture::Idle) {
            Gesture::Idle => EditorOutcome::Nothing,
            Gesture::DraggingMarker { marker_id, .. } => self.finish_drag(marker_id),
            Gesture::DrawingPath(path) => self.commit_path(path),
            Gesture::Clicking { tool } => self.click(tool, pos),
        }
    }

    /// The pointer left the field: drags and paths complete, clicks are
    /// abandoned.
    pub fn pointer_leave(&mut self) -> EditorOutcome {
        match std::mem::replace(&mut self.gesture, Gesture::Idle) {
            Gesture::Idle | Gesture::Clicking { .. } => EditorOutcome::Nothing,
            Gesture::DraggingMarker { marker_id, .. } => self.finish_drag(marker_id),
            Gesture::DrawingPath(path) => self.commit_path(path),
        }
    }

    /// Completes a pending add-tool click with the label the user typed.
    pub fn place_marker(
        &mut self,
        pending: PendingMarker,
        label: &str,
    ) -> Result<PlayerMarker, ValidationError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(ValidationError::EmptyLabel);
        }
        let id = self.draft.next_marker_id();
        let marker = PlayerMarker::new(id, pending.kind, label.to_uppercase(), pending.at);
        self.draft.add_marker(marker.clone());
        Ok(marker)
    }

    /// Builds the play payload. Nothing changes when validation fails.
    pub fn save(&self) -> Result<NewPlay, ValidationError> {
        let name = self.meta.name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingName);
        }
        let formation = self.meta.formation.trim();
        if formation.is_empty() {
            return Err(ValidationError::MissingFormation);
        }
        Ok(NewPlay {
            name: name.to_string(),
            kind: self.meta.kind,
            sub_type: self.meta.sub_type.trim().to_string(),
            formation: formation.to_string(),
            description: self.meta.description.trim().to_string(),
            formation_markers: self.draft.markers().to_vec(),
            paths: self.draft.paths().to_vec(),
        })
    }

    fn finish_drag(&self, marker_id: String) -> EditorOutcome {
        match self.draft.marker(&marker_id) {
            Some(marker) => EditorOutcome::DragFinished {
                at: marker.position(),
                marker_id,
            },
            None => EditorOutcome::Nothing,
        }
    }

    fn commit_path(&mut self, path: PlayerPath) -> EditorOutcome {
        let marker_id = path.marker_id.clone();
        match self.draft.set_path(path) {
            Some(replaced) => EditorOutcome::PathCommitted {
                marker_id,
                replaced,
            },
            None => EditorOutcome::Nothing,
        }
    }

    fn click(&mut self, tool: Tool, pos: SurfacePos) -> EditorOutcome {
        let Some(at) = self.surface.to_field(pos) else {
            return EditorOutcome::Nothing;
        };
        if let Some(kind) = tool.marker_kind() {
            // Add tools only place on free ground.
            if self.marker_at(pos).is_some() {
                return EditorOutcome::Nothing;
            }
            return EditorOutcome::LabelRequested(PendingMarker { kind, at });
        }

        let Some(marker_id) = self.marker_at(pos).map(|m| m.id.clone()) else {
            return EditorOutcome::Nothing;
        };
        match self.draft.remove_marker(&marker_id) {
            Some((marker, path)) => EditorOutcome::MarkerErased {
                marker,
                path_removed: path.is_some(),
            },
            None => EditorOutcome::Nothing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor() -> PlayEditor {
        PlayEditor::new(Surface::new(1000.0, 1000.0))
    }

    #[test]
    fn empty_surface_ignores_input() {
        let mut ed = PlayEditor::new(Surface::new(0.0, 300.0));
        ed.set_tool(Tool::AddOffense);
        assert_eq!(ed.pointer_down(SurfacePos::new(10.0, 10.0)), EditorOutcome::Nothing);
        assert_eq!(ed.gesture(), &Gesture::Idle);
    }

    #[test]
    fn translator_clamps_outside_positions() {
        let surface = Surface::new(500.0, 300.0);
        assert_eq!(
            surface.to_field(SurfacePos::new(-20.0, 600.0)),
            Some(FieldPoint::new(0.0, 100.0))
        );
        assert_eq!(
            surface.to_field(SurfacePos::new(250.0, 150.0)),
            Some(FieldPoint::new(50.0, 50.0))
        );
    }

    #[test]
    fn hit_test_prefers_first_marker_in_insertion_order() {
        let mut ed = editor();
        let draft = ed.draft_mut();
        let a = PlayerMarker::new("a", MarkerKind::Offense, "A", FieldPoint::new(50.0, 50.0));
        let b = PlayerMarker::new("b", MarkerKind::Offense, "B", FieldPoint::new(50.5, 50.0));
        draft.add_marker(a);
        draft.add_marker(b);
        let hit = ed.marker_at(SurfacePos::new(505.0, 500.0)).expect("hit");
        assert_eq!(hit.id, "a");
    }

    #[test]
    fn hit_radius_is_strict() {
        let mut ed = editor();
        let s = PlayerMarker::new("a", MarkerKind::Defense, "S", FieldPoint::new(50.0, 50.0));
        ed.draft_mut().add_marker(s);
        assert!(ed.marker_at(SurfacePos::new(516.0, 500.0)).is_none());
        assert!(ed.marker_at(SurfacePos::new(515.0, 500.0)).is_some());
    }

    #[test]
    fn tool_switch_mid_gesture_is_ignored() {
        let mut ed = editor();
        ed.set_tool(Tool::AddDefense);
        ed.pointer_down(SurfacePos::new(300.0, 300.0));
        assert!(!ed.set_tool(Tool::Move));
        let outcome = ed.pointer_up(SurfacePos::new(300.0, 300.0));
        assert_eq!(
            outcome,
            EditorOutcome::LabelRequested(PendingMarker {
                kind: MarkerKind::Defense,
                at: FieldPoint::new(30.0, 30.0),
            })
        );
        assert_eq!(ed.tool(), Tool::AddDefense);
        assert!(ed.set_tool(Tool::Move));
    }

    #[test]
    fn leaving_while_clicking_cancels_the_click() {
        let mut ed = editor();
        ed.set_tool(Tool::AddOffense);
        ed.pointer_down(SurfacePos::new(300.0, 300.0));
        assert_eq!(ed.pointer_leave(), EditorOutcome::Nothing);
        assert_eq!(ed.gesture(), &Gesture::Idle);
        assert!(ed.draft().markers().is_empty());
    }
}
