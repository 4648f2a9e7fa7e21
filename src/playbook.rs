use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::play::{
    FIELD_MAX, FIELD_MIN, FieldPoint, MarkerKind, NewPlay, Play, PlayKind, PlayerMarker,
    PlayerPath,
};

pub const PLAYBOOK_FILE_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayFilter {
    All,
    Offense,
    Defense,
}

impl PlayFilter {
    pub fn cycle(self) -> Self {
        match self {
            PlayFilter::All => PlayFilter::Offense,
            PlayFilter::Offense => PlayFilter::Defense,
            PlayFilter::Defense => PlayFilter::All,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlayFilter::All => "All",
            PlayFilter::Offense => "Offense",
            PlayFilter::Defense => "Defense",
        }
    }

    pub fn accepts(self, play: &Play) -> bool {
        match self {
            PlayFilter::All => true,
            PlayFilter::Offense => play.kind == PlayKind::Offense,
            PlayFilter::Defense => play.kind == PlayKind::Defense,
        }
    }
}

/// Every saved play of the program, newest first.
#[derive(Debug, Clone)]
pub struct Playbook {
    plays: Vec<Play>,
    next_id: u64,
}

impl Default for Playbook {
    fn default() -> Self {
        Self::new()
    }
}

impl Playbook {
    pub fn new() -> Self {
        Self {
            plays: Vec::new(),
            next_id: 1,
        }
    }

    pub fn with_samples() -> Self {
        let mut book = Self::new();
        book.import(sample_plays());
        book
    }

    pub fn plays(&self) -> &[Play] {
        &self.plays
    }

    pub fn len(&self) -> usize {
        self.plays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plays.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&Play> {
        self.plays.iter().find(|p| p.id == id)
    }

    pub fn filtered(&self, filter: PlayFilter) -> Vec<&Play> {
        self.plays.iter().filter(|p| filter.accepts(p)).collect()
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Stores a freshly saved play at the top of the list and returns its id.
    pub fn add(&mut self, play: NewPlay) -> u64 {
        let id = self.allocate_id();
        self.plays.insert(0, play.into_play(id));
        id
    }

    pub fn remove(&mut self, id: u64) -> Option<Play> {
        let idx = self.plays.iter().position(|p| p.id == id)?;
        Some(self.plays.remove(idx))
    }

    /// Appends plays from elsewhere under fresh ids.
    pub fn import(&mut self, plays: Vec<Play>) -> usize {
        let count = plays.len();
        for mut play in plays {
            play.id = self.allocate_id();
            self.plays.push(play);
        }
        count
    }
}

#[derive(Serialize)]
struct PlaybookFile<'a> {
    version: u32,
    plays: &'a [Play],
}

pub fn encode_plays_json(plays: &[Play]) -> Result<String, SchemaError> {
    let file = PlaybookFile {
        version: PLAYBOOK_FILE_VERSION,
        plays,
    };
    Ok(serde_json::to_string_pretty(&file)?)
}

#[derive(Deserialize)]
struct PlaybookDocument {
    #[serde(default)]
    version: Option<u32>,
    plays: Vec<Play>,
}

/// Strictly decodes a playbook document: either `{ "version": 1, "plays": [...] }`
/// or a bare array of plays.
pub fn decode_plays_json(raw: &str) -> Result<Vec<Play>, SchemaError> {
    let raw = raw.trim();
    let plays = if raw.starts_with('[') {
        serde_json::from_str::<Vec<Play>>(raw)?
    } else {
        let doc: PlaybookDocument = serde_json::from_str(raw)?;
        match doc.version {
            Some(version) if version != PLAYBOOK_FILE_VERSION => {
                return Err(SchemaError::OutOfRange {
                    field: "version".to_string(),
                    value: version.to_string(),
                });
            }
            _ => {}
        }
        doc.plays
    };
    for (idx, play) in plays.iter().enumerate() {
        check_play(play, &format!("plays[{idx}]"))?;
    }
    Ok(plays)
}

/// Rejects what serde alone lets through: coordinates off the field,
/// repeated marker ids, paths without a marker and second paths.
fn check_play(play: &Play, at: &str) -> Result<(), SchemaError> {
    let markers_at = format!("{at}.formationMarkers");
    let mut seen = HashSet::new();
    for (idx, marker) in play.formation_markers.iter().enumerate() {
        check_point(marker.position(), &format!("{markers_at}[{idx}]"))?;
        if !seen.insert(marker.id.as_str()) {
            return Err(SchemaError::DuplicateMarker {
                field: markers_at,
                marker_id: marker.id.clone(),
            });
        }
    }

    let paths_at = format!("{at}.paths");
    let mut with_path = HashSet::new();
    for (idx, path) in play.paths.iter().enumerate() {
        let path_at = format!("{paths_at}[{idx}]");
        if !seen.contains(path.marker_id.as_str()) {
            return Err(SchemaError::DanglingPath {
                field: path_at,
                marker_id: path.marker_id.clone(),
            });
        }
        if !with_path.insert(path.marker_id.as_str()) {
            return Err(SchemaError::DuplicatePath {
                field: paths_at,
                marker_id: path.marker_id.clone(),
            });
        }
        for (p, point) in path.points.iter().enumerate() {
            check_point(*point, &format!("{path_at}.points[{p}]"))?;
        }
    }
    Ok(())
}

fn check_point(point: FieldPoint, at: &str) -> Result<(), SchemaError> {
    for (axis, value) in [("x", point.x), ("y", point.y)] {
        if !(FIELD_MIN..=FIELD_MAX).contains(&value) {
            return Err(SchemaError::OutOfRange {
                field: format!("{at}.{axis}"),
                value: value.to_string(),
            });
        }
    }
    Ok(())
}

fn marker(id: &str, kind: MarkerKind, label: &str, x: f64, y: f64) -> PlayerMarker {
    PlayerMarker::new(id, kind, label, FieldPoint::new(x, y))
}

fn path(marker_id: &str, points: &[(f64, f64)]) -> PlayerPath {
    PlayerPath::new(
        marker_id,
        points.iter().map(|(x, y)| FieldPoint::new(*x, *y)).collect(),
    )
}

pub fn sample_plays() -> Vec<Play> {
    use MarkerKind::{Defense, Offense};

    vec![
        Play {
            id: 1,
            name: "Flood Concept".to_string(),
            kind: PlayKind::Offense,
            sub_type: "Pass".to_string(),
            formation: "Spread".to_string(),
            description: "Floods one side with 3 routes at different depths to stress zone coverage."
                .to_string(),
            formation_markers: vec![
                marker("qb1", Offense, "QB", 50.0, 85.0),
                marker("wr1", Offense, "WR", 15.0, 60.0),
                marker("te1", Offense, "TE", 40.0, 62.0),
                marker("wr2", Offense, "WR", 85.0, 60.0),
            ],
            paths: vec![
                path("wr1", &[(15.0, 60.0), (15.0, 40.0), (35.0, 20.0)]),
                path("te1", &[(40.0, 62.0), (40.0, 50.0), (25.0, 50.0)]),
                path("wr2", &[(85.0, 60.0), (70.0, 60.0)]),
            ],
        },
        Play {
            id: 2,
            name: "HB Dive".to_string(),
            kind: PlayKind::Offense,
            sub_type: "Run".to_string(),
            formation: "I-Form".to_string(),
            description: "A direct handoff to the halfback running through an interior gap."
                .to_string(),
            formation_markers: vec![
                marker("qb2", Offense, "QB", 50.0, 85.0),
                marker("rb2", Offense, "RB", 50.0, 90.0),
            ],
            paths: vec![path("rb2", &[(50.0, 90.0), (50.0, 65.0)])],
        },
        Play {
            id: 3,
            name: "Cover 3 Buzz".to_string(),
            kind: PlayKind::Defense,
            sub_type: "Zone".to_string(),
            formation: "4-3".to_string(),
            description: "Zone defense with 3 deep defenders and a safety rotating down to cover short passes."
                .to_string(),
            formation_markers: vec![
                marker("s1", Defense, "S", 50.0, 20.0),
                marker("s2", Defense, "S", 25.0, 35.0),
                marker("cb1", Defense, "CB", 10.0, 30.0),
                marker("cb2", Defense, "CB", 90.0, 30.0),
            ],
            paths: vec![path("s2", &[(25.0, 35.0), (30.0, 50.0)])],
        },
    ]
}
