use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use crate::ai_client::AiClient;
use crate::exchange;
use crate::state::{Delta, ProviderCommand};
use crate::workbook_export;

/// Runs file exchange and AI requests off the UI thread. Results come back
/// as `Delta`s; the worker exits when the command channel closes.
pub fn spawn_provider(
    tx: Sender<Delta>,
    cmd_rx: Receiver<ProviderCommand>,
    ai: Option<AiClient>,
) -> thread::JoinHandle<()> {
    let ai = ai.map(Arc::new);
    thread::spawn(move || {
        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                ProviderCommand::ExportJson { path, plays } => {
                    let _ = tx.send(Delta::ExportStarted {
                        path: path.clone(),
                        total: plays.len(),
                    });
                    match exchange::save_playbook(Path::new(&path), &plays) {
                        Ok(count) => {
                            let _ = tx.send(Delta::ExportFinished {
                                path,
                                current: count,
                                total: count,
                                summary: format!("{count} plays"),
                                errors: 0,
                            });
                        }
                        Err(err) => {
                            let _ = tx.send(Delta::Log(format!("[WARN] Export failed: {err:#}")));
                            let _ = tx.send(export_failed(path, plays.len()));
                        }
                    }
                }
                ProviderCommand::ImportJson { path } => {
                    match exchange::load_playbook(Path::new(&path)) {
                        Ok(plays) => {
                            let _ = tx.send(Delta::PlaysImported { path, plays });
                        }
                        Err(err) => {
                            let _ = tx.send(Delta::Log(format!("[WARN] Import failed: {err:#}")));
                        }
                    }
                }
                ProviderCommand::ExportWorkbook { path, plays } => {
                    let tx = tx.clone();
                    thread::spawn(move || export_workbook(&tx, path, &plays));
                }
                ProviderCommand::ExportSvg { path, play } => {
                    match exchange::save_play_svg(Path::new(&path), &play) {
                        Ok(()) => {
                            let _ = tx.send(Delta::ExportFinished {
                                path,
                                current: 1,
                                total: 1,
                                summary: format!("diagram for {}", play.name),
                                errors: 0,
                            });
                        }
                        Err(err) => {
                            let _ = tx.send(Delta::Log(format!("[WARN] SVG export failed: {err:#}")));
                            let _ = tx.send(export_failed(path, 1));
                        }
                    }
                }
                ProviderCommand::Predict(situation) => {
                    let Some(client) = ai.clone() else {
                        let _ = tx.send(Delta::PredictionFailed(
                            "AI is not configured (set GEMINI_API_KEY)".to_string(),
                        ));
                        continue;
                    };
                    let tx = tx.clone();
                    thread::spawn(move || {
                        let delta = match client.predict_play(&situation) {
                            Ok(prediction) => Delta::PredictionReady(prediction),
                            Err(err) => Delta::PredictionFailed(format!("{err:#}")),
                        };
                        let _ = tx.send(delta);
                    });
                }
                ProviderCommand::ExplainPlay(play) => {
                    let play_id = play.id;
                    let Some(client) = ai.clone() else {
                        let _ = tx.send(Delta::BreakdownFailed {
                            play_id,
                            error: "AI is not configured (set GEMINI_API_KEY)".to_string(),
                        });
                        continue;
                    };
                    let tx = tx.clone();
                    thread::spawn(move || {
                        let delta = match client.explain_play(&play) {
                            Ok(text) => Delta::BreakdownReady { play_id, text },
                            Err(err) => Delta::BreakdownFailed {
                                play_id,
                                error: format!("{err:#}"),
                            },
                        };
                        let _ = tx.send(delta);
                    });
                }
            }
        }
    })
}

fn export_failed(path: String, total: usize) -> Delta {
    Delta::ExportFinished {
        path,
        current: 0,
        total,
        summary: "nothing written".to_string(),
        errors: 1,
    }
}

fn export_workbook(tx: &Sender<Delta>, path: String, plays: &[crate::play::Play]) {
    let _ = tx.send(Delta::ExportStarted {
        path: path.clone(),
        total: plays.len(),
    });

    let progress_tx = tx.clone();
    let mut last_current = 0usize;
    let mut last_total = plays.len();

    let report =
        workbook_export::export_playbook_with_progress(Path::new(&path), plays, |progress| {
            last_current = progress.current;
            last_total = progress.total;
            let _ = progress_tx.send(Delta::ExportProgress {
                current: progress.current,
                total: progress.total,
                message: progress.message,
            });
        });

    match report {
        Ok(report) => {
            let _ = tx.send(Delta::ExportFinished {
                path,
                current: last_current.max(last_total),
                total: last_total,
                summary: format!(
                    "{} plays, {} markers, {} paths, {} points",
                    report.plays, report.markers, report.paths, report.points
                ),
                errors: 0,
            });
        }
        Err(err) => {
            let _ = tx.send(Delta::Log(format!("[WARN] Workbook export failed: {err:#}")));
            let _ = tx.send(Delta::ExportFinished {
                path,
                current: last_current,
                total: last_total,
                summary: "workbook not written".to_string(),
                errors: 1,
            });
        }
    }
}
