use serde::{Deserialize, Deserializer, Serialize};

pub const FIELD_MIN: f64 = 0.0;
pub const FIELD_MAX: f64 = 100.0;

/// Clamp a single coordinate into the normalized field range. NaN lands on 0.
pub fn clamp_coord(value: f64) -> f64 {
    if value.is_nan() {
        return FIELD_MIN;
    }
    value.clamp(FIELD_MIN, FIELD_MAX)
}

/// A point in field space: percentage offsets from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldPoint {
    pub x: f64,
    pub y: f64,
}

impl FieldPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn clamped(self) -> Self {
        Self {
            x: clamp_coord(self.x),
            y: clamp_coord(self.y),
        }
    }

    pub fn offset_from(self, origin: FieldPoint) -> FieldPoint {
        FieldPoint::new(self.x - origin.x, self.y - origin.y)
    }

    pub fn minus(self, offset: FieldPoint) -> FieldPoint {
        FieldPoint::new(self.x - offset.x, self.y - offset.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerKind {
    Offense,
    Defense,
}

impl MarkerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MarkerKind::Offense => "offense",
            MarkerKind::Defense => "defense",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerMarker {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MarkerKind,
    pub label: String,
    pub x: f64,
    pub y: f64,
}

impl PlayerMarker {
    pub fn new(
        id: impl Into<String>,
        kind: MarkerKind,
        label: impl Into<String>,
        at: FieldPoint,
    ) -> Self {
        let at = at.clamped();
        Self {
            id: id.into(),
            kind,
            label: label.into(),
            x: at.x,
            y: at.y,
        }
    }

    pub fn position(&self) -> FieldPoint {
        FieldPoint::new(self.x, self.y)
    }

    fn set_position(&mut self, at: FieldPoint) -> FieldPoint {
        let at = at.clamped();
        self.x = at.x;
        self.y = at.y;
        at
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerPath {
    pub marker_id: String,
    pub points: Vec<FieldPoint>,
}

impl PlayerPath {
    pub fn new(marker_id: impl Into<String>, points: Vec<FieldPoint>) -> Self {
        Self {
            marker_id: marker_id.into(),
            points,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayKind {
    Offense,
    Defense,
}

impl PlayKind {
    pub fn toggled(self) -> Self {
        match self {
            PlayKind::Offense => PlayKind::Defense,
            PlayKind::Defense => PlayKind::Offense,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlayKind::Offense => "Offense",
            PlayKind::Defense => "Defense",
        }
    }
}

/// A play ready to be handed to the playbook; the id is assigned there.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPlay {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: PlayKind,
    pub sub_type: String,
    pub formation: String,
    pub description: String,
    pub formation_markers: Vec<PlayerMarker>,
    pub paths: Vec<PlayerPath>,
}

impl NewPlay {
    pub fn into_play(self, id: u64) -> Play {
        Play {
            id,
            name: self.name,
            kind: self.kind,
            sub_type: self.sub_type,
            formation: self.formation,
            description: self.description,
            formation_markers: self.formation_markers,
            paths: self.paths,
        }
    }
}

/// A saved play. Imported documents may omit `id`, `subType`,
/// `description` and `paths`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Play {
    #[serde(default)]
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: PlayKind,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub sub_type: String,
    pub formation: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    pub formation_markers: Vec<PlayerMarker>,
    #[serde(default)]
    pub paths: Vec<PlayerPath>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Play {
    pub fn marker(&self, id: &str) -> Option<&PlayerMarker> {
        self.formation_markers.iter().find(|m| m.id == id)
    }

    pub fn path_for(&self, marker_id: &str) -> Option<&PlayerPath> {
        self.paths.iter().find(|p| p.marker_id == marker_id)
    }
}

/// Working copy of markers and paths owned by one editing session.
///
/// All mutation goes through methods that keep the aggregate consistent:
/// coordinates stay inside the field, every path points at a live marker
/// and each marker has at most one path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayDraft {
    markers: Vec<PlayerMarker>,
    paths: Vec<PlayerPath>,
    next_marker_seq: u64,
}

impl PlayDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn markers(&self) -> &[PlayerMarker] {
        &self.markers
    }

    pub fn paths(&self) -> &[PlayerPath] {
        &self.paths
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty() && self.paths.is_empty()
    }

    pub fn marker(&self, id: &str) -> Option<&PlayerMarker> {
        self.markers.iter().find(|m| m.id == id)
    }

    pub fn path_for(&self, marker_id: &str) -> Option<&PlayerPath> {
        self.paths.iter().find(|p| p.marker_id == marker_id)
    }

    /// Returns an id not used by any marker in this draft.
    pub fn next_marker_id(&mut self) -> String {
        loop {
            self.next_marker_seq += 1;
            let id = format!("marker-{}", self.next_marker_seq);
            if self.marker(&id).is_none() {
                return id;
            }
        }
    }

    /// Adds a marker, clamping its position. Rejects duplicate ids.
    pub fn add_marker(&mut self, mut marker: PlayerMarker) -> bool {
        if self.marker(&marker.id).is_some() {
            return false;
        }
        let at = marker.position();
        marker.set_position(at);
        self.markers.push(marker);
        true
    }

    /// Moves a marker and returns the clamped position it ended up at.
    pub fn move_marker(&mut self, id: &str, to: FieldPoint) -> Option<FieldPoint> {
        let marker = self.markers.iter_mut().find(|m| m.id == id)?;
        Some(marker.set_position(to))
    }

    /// Stores `path`, replacing any previous path for the same marker.
    /// Returns `None` when the marker does not exist, otherwise whether an
    /// older path was replaced.
    pub fn set_path(&mut self, path: PlayerPath) -> Option<bool> {
        self.marker(&path.marker_id)?;
        let before = self.paths.len();
        self.paths.retain(|p| p.marker_id != path.marker_id);
        let replaced = self.paths.len() != before;
        self.paths.push(path);
        Some(replaced)
    }

    pub fn remove_path(&mut self, marker_id: &str) -> Option<PlayerPath> {
        let idx = self.paths.iter().position(|p| p.marker_id == marker_id)?;
        Some(self.paths.remove(idx))
    }

    /// Removes a marker together with its path.
    pub fn remove_marker(&mut self, id: &str) -> Option<(PlayerMarker, Option<PlayerPath>)> {
        let idx = self.markers.iter().position(|m| m.id == id)?;
        let marker = self.markers.remove(idx);
        let path = self.remove_path(id);
        Some((marker, path))
    }

    pub fn into_parts(self) -> (Vec<PlayerMarker>, Vec<PlayerPath>) {
        (self.markers, self.paths)
    }
}
