use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::diagram::{self, render_svg};
use crate::play::Play;
use crate::playbook::{decode_plays_json, encode_plays_json};

pub const PLAYBOOK_FILE: &str = "playbook.json";
pub const SVG_WIDTH: u32 = 500;
pub const SVG_HEIGHT: u32 = 500;

pub fn playbook_file_path(dir: &Path) -> PathBuf {
    dir.join(PLAYBOOK_FILE)
}

pub fn workbook_file_path(dir: &Path, stamp: &str) -> PathBuf {
    dir.join(format!("playbook-{stamp}.xlsx"))
}

pub fn svg_file_path(dir: &Path, play: &Play) -> PathBuf {
    dir.join(format!("{}-{}.svg", slug(&play.name), play.id))
}

pub fn export_stamp() -> String {
    chrono::Local::now().format("%Y%m%d-%H%M%S").to_string()
}

/// Lower-case, dash-separated file stem for a play name.
pub fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut dash = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            dash = false;
        } else if !dash && !out.is_empty() {
            out.push('-');
            dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    if out.is_empty() {
        out.push_str("play");
    }
    out
}

/// Writes next to the target first, then renames over it.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed creating {}", dir.display()))?;
        }
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, contents).with_context(|| format!("failed writing {}", tmp.display()))?;
    if let Err(err) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(err).with_context(|| format!("failed replacing {}", path.display()));
    }
    Ok(())
}

pub fn save_playbook(path: &Path, plays: &[Play]) -> Result<usize> {
    let json = encode_plays_json(plays).context("failed encoding playbook")?;
    write_atomic(path, json.as_bytes())?;
    Ok(plays.len())
}

pub fn load_playbook(path: &Path) -> Result<Vec<Play>> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("failed reading {}", path.display()))?;
    let plays =
        decode_plays_json(&raw).with_context(|| format!("invalid playbook {}", path.display()))?;
    Ok(plays)
}

pub fn save_play_svg(path: &Path, play: &Play) -> Result<()> {
    let scene = diagram::project(&play.formation_markers, &play.paths, None);
    let svg = render_svg(&scene, SVG_WIDTH, SVG_HEIGHT);
    write_atomic(path, svg.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::play::{FieldPoint, MarkerKind, PlayerMarker};
    use crate::playbook::sample_plays;

    fn scratch_dir(name: &str) -> PathBuf {
        let mut dir = std::env::temp_dir();
        dir.push(format!("playbook_exchange_{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn svg_export_writes_routes_and_both_sides() {
        let dir = scratch_dir("svg");
        let mut play = sample_plays().remove(0);
        play.formation_markers.push(PlayerMarker::new(
            "cb1",
            MarkerKind::Defense,
            "CB",
            FieldPoint::new(15.0, 40.0),
        ));
        let path = svg_file_path(&dir, &play);
        save_play_svg(&path, &play).expect("svg written");

        let svg = fs::read_to_string(&path).expect("svg readable");
        assert!(path.ends_with("flood-concept-1.svg"));
        assert!(svg.starts_with("<svg"));
        assert_eq!(svg.matches("stroke-dasharray").count(), 3);
        assert!(svg.contains("fill=\"#3b82f6\""));
        assert!(svg.contains("fill=\"#dc2626\""));
        assert!(!dir.join("flood-concept-1.svg.tmp").exists());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn failed_rename_cleans_up_temp_file() {
        let dir = scratch_dir("rename");
        let target = dir.join("occupied");
        fs::create_dir_all(target.join("child")).expect("dir");

        assert!(write_atomic(&target, b"data").is_err());
        assert!(!dir.join("occupied.tmp").exists());
        assert!(target.is_dir());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn slug_collapses_punctuation() {
        assert_eq!(slug("Cover 3 Buzz"), "cover-3-buzz");
        assert_eq!(slug("  HB -- Dive!! "), "hb-dive");
        assert_eq!(slug("???"), "play");
    }

    #[test]
    fn file_names_follow_play_and_stamp() {
        let dir = Path::new("/tmp/book");
        assert_eq!(
            workbook_file_path(dir, "20260101-120000"),
            PathBuf::from("/tmp/book/playbook-20260101-120000.xlsx")
        );
        assert_eq!(playbook_file_path(dir), PathBuf::from("/tmp/book/playbook.json"));
    }
}
