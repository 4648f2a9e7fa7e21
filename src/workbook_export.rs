use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::exchange::write_atomic;
use crate::play::{Play, PlayerMarker, PlayerPath};

pub struct ExportReport {
    pub plays: usize,
    pub markers: usize,
    pub paths: usize,
    pub points: usize,
}

pub struct ExportProgress {
    pub current: usize,
    pub total: usize,
    pub message: String,
}

/// Writes the playbook to an `.xlsx` with one sheet each for plays, markers
/// and paths (one row per path point).
pub fn export_playbook_with_progress(
    path: &Path,
    plays: &[Play],
    mut on_progress: impl FnMut(ExportProgress),
) -> Result<ExportReport> {
    let total = plays.len();
    on_progress(ExportProgress {
        current: 0,
        total,
        message: "Collecting plays".to_string(),
    });

    let mut plays_rows = vec![vec![
        "Play ID".to_string(),
        "Name".to_string(),
        "Side".to_string(),
        "Sub-type".to_string(),
        "Formation".to_string(),
        "Description".to_string(),
        "Markers".to_string(),
        "Paths".to_string(),
    ]];

    let mut marker_rows = vec![vec![
        "Play ID".to_string(),
        "Play".to_string(),
        "Marker ID".to_string(),
        "Type".to_string(),
        "Label".to_string(),
        "X".to_string(),
        "Y".to_string(),
    ]];

    let mut path_rows = vec![vec![
        "Play ID".to_string(),
        "Play".to_string(),
        "Marker ID".to_string(),
        "Label".to_string(),
        "Point #".to_string(),
        "X".to_string(),
        "Y".to_string(),
    ]];

    for (idx, play) in plays.iter().enumerate() {
        plays_rows.push(play_row(play));
        marker_rows.extend(play.formation_markers.iter().map(|m| marker_row(play, m)));
        for path in &play.paths {
            path_rows.extend(path_point_rows(play, path));
        }
        on_progress(ExportProgress {
            current: idx + 1,
            total,
            message: format!("Exported {}", play.name),
        });
    }

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Plays")?;
        write_rows(sheet, &plays_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Markers")?;
        write_rows(sheet, &marker_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Paths")?;
        write_rows(sheet, &path_rows)?;
    }

    let bytes = workbook
        .save_to_buffer()
        .context("failed building workbook")?;
    write_atomic(path, &bytes)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(ExportReport {
        plays: plays.len(),
        markers: marker_rows.len().saturating_sub(1),
        paths: plays.iter().map(|p| p.paths.len()).sum(),
        points: path_rows.len().saturating_sub(1),
    })
}

fn play_row(play: &Play) -> Vec<String> {
    vec![
        play.id.to_string(),
        play.name.clone(),
        play.kind.as_str().to_string(),
        play.sub_type.clone(),
        play.formation.clone(),
        play.description.clone(),
        play.formation_markers.len().to_string(),
        play.paths.len().to_string(),
    ]
}

fn marker_row(play: &Play, marker: &PlayerMarker) -> Vec<String> {
    vec![
        play.id.to_string(),
        play.name.clone(),
        marker.id.clone(),
        marker.kind.as_str().to_string(),
        marker.label.clone(),
        format!("{:.1}", marker.x),
        format!("{:.1}", marker.y),
    ]
}

fn path_point_rows(play: &Play, path: &PlayerPath) -> Vec<Vec<String>> {
    let label = play
        .marker(&path.marker_id)
        .map(|m| m.label.clone())
        .unwrap_or_default();
    path.points
        .iter()
        .enumerate()
        .map(|(idx, point)| {
            vec![
                play.id.to_string(),
                play.name.clone(),
                path.marker_id.clone(),
                label.clone(),
                (idx + 1).to_string(),
                format!("{:.1}", point.x),
                format!("{:.1}", point.y),
            ]
        })
        .collect()
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playbook::sample_plays;

    #[test]
    fn path_rows_carry_marker_label_and_order() {
        let plays = sample_plays();
        let flood = &plays[0];
        let rows = path_point_rows(flood, &flood.paths[0]);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][2], "wr1");
        assert_eq!(rows[0][3], "WR");
        assert_eq!(rows[2][4], "3");
        assert_eq!(rows[2][5], "35.0");
    }

    #[test]
    fn workbook_lands_without_temp_file() {
        let mut dir = std::env::temp_dir();
        dir.push(format!("playbook_workbook_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("playbook-test.xlsx");

        let mut seen = Vec::new();
        let report = export_playbook_with_progress(&path, &sample_plays(), |p| {
            seen.push(p.current)
        })
        .expect("export");

        assert_eq!(seen, vec![0, 1, 2, 3]);
        assert_eq!((report.plays, report.markers, report.paths, report.points), (3, 10, 5, 12));
        let bytes = std::fs::read(&path).expect("workbook written");
        assert!(bytes.starts_with(b"PK"));
        assert!(!dir.join("playbook-test.xlsx.tmp").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn play_row_counts_children() {
        let plays = sample_plays();
        let row = play_row(&plays[2]);
        assert_eq!(row[1], "Cover 3 Buzz");
        assert_eq!(row[2], "Defense");
        assert_eq!(row[6], "4");
        assert_eq!(row[7], "1");
    }
}
