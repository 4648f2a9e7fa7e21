//! Client for the generative text service behind the play predictor and the
//! play breakdown.
//!
//! The client is built once from `AiConfig` and handed to whoever needs it.
//! Responses are never trusted: the envelope and the prediction payload are
//! decoded into wire structs and checked before use, failing with `SchemaError`.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;

use crate::error::SchemaError;
use crate::http_client::build_http_client;
use crate::play::Play;

pub const DEFAULT_MODEL: &str = "gemini-2.5-pro";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Clone, PartialEq)]
pub struct AiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl AiConfig {
    pub fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSituation {
    pub down: u8,
    pub distance: u8,
    pub own_yard_line: u8,
    pub time_remaining: String,
}

impl Default for GameSituation {
    fn default() -> Self {
        Self {
            down: 1,
            distance: 10,
            own_yard_line: 25,
            time_remaining: "12:00".to_string(),
        }
    }
}

impl GameSituation {
    pub fn cycle_down(&mut self) {
        self.down = if self.down >= 4 { 1 } else { self.down + 1 };
    }

    pub fn adjust_distance(&mut self, delta: i16) {
        self.distance = (i16::from(self.distance) + delta).clamp(1, 99) as u8;
    }

    pub fn adjust_yard_line(&mut self, delta: i16) {
        self.own_yard_line = (i16::from(self.own_yard_line) + delta).clamp(1, 99) as u8;
    }

    pub fn prompt(&self) -> String {
        format!(
            "You are an expert football play-caller AI. Given the following game situation, \
predict the opponent's most likely play call.\n\n\
Game State:\n\
- Down: {}\n\
- Distance: {} yards\n\
- Field Position: Own {} yard line\n\
- Time Remaining in Quarter: {}\n\n\
Based on standard football strategy and situational tendencies, provide your analysis. \
Return your response as a JSON object with the following structure: \
{{ \"playType\": \"Run\" or \"Pass\", \"confidence\": number (0-100), \"analysis\": \"Your brief reasoning here.\" }}.",
            self.down, self.distance, self.own_yard_line, self.time_remaining
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictedPlayType {
    Run,
    Pass,
}

impl PredictedPlayType {
    pub fn as_str(self) -> &'static str {
        match self {
            PredictedPlayType::Run => "Run",
            PredictedPlayType::Pass => "Pass",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayPrediction {
    pub play_type: PredictedPlayType,
    pub confidence: f64,
    pub analysis: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PredictionWire {
    play_type: String,
    confidence: f64,
    analysis: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Deserialize)]
struct ContentPart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

pub fn decode_prediction(raw: &str) -> Result<PlayPrediction, SchemaError> {
    let wire: PredictionWire = serde_json::from_str(strip_code_fence(raw))?;
    let play_type = match wire.play_type.trim() {
        t if t.eq_ignore_ascii_case("run") => PredictedPlayType::Run,
        t if t.eq_ignore_ascii_case("pass") => PredictedPlayType::Pass,
        other => {
            return Err(SchemaError::UnknownVariant {
                field: "playType".to_string(),
                value: other.to_string(),
            });
        }
    };
    if !(0.0..=100.0).contains(&wire.confidence) {
        return Err(SchemaError::OutOfRange {
            field: "confidence".to_string(),
            value: wire.confidence.to_string(),
        });
    }
    Ok(PlayPrediction {
        play_type,
        confidence: wire.confidence,
        analysis: wire.analysis,
    })
}

/// Pulls the generated text out of a `generateContent` response envelope.
pub fn decode_generated_text(raw: &str) -> Result<String, SchemaError> {
    let response: GenerateResponse = serde_json::from_str(raw)?;
    let candidates = response
        .candidates
        .ok_or_else(|| SchemaError::MissingField("candidates".to_string()))?;
    let first = candidates
        .into_iter()
        .next()
        .ok_or_else(|| SchemaError::MissingField("candidates[0]".to_string()))?;
    let content = first
        .content
        .ok_or_else(|| SchemaError::MissingField("candidates[0].content".to_string()))?;
    let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
    if text.trim().is_empty() {
        return Err(SchemaError::MissingField(
            "candidates[0].content.parts.text".to_string(),
        ));
    }
    Ok(text)
}

// Models sometimes wrap JSON answers in a ```json fence.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

pub fn play_breakdown_prompt(play: &Play) -> String {
    let mut lines = vec![
        "You are an assistant coach for a high school football team. Give a short, practical \
breakdown of the following play: its purpose, each player's key responsibility and one \
coaching point. Keep it under 150 words."
            .to_string(),
        String::new(),
        format!("Play: {} ({})", play.name, play.kind.as_str()),
        format!("Formation: {}", play.formation),
    ];
    if !play.sub_type.is_empty() {
        lines.push(format!("Sub-type: {}", play.sub_type));
    }
    if !play.description.is_empty() {
        lines.push(format!("Description: {}", play.description));
    }
    lines.push("Players (x, y as % of field width/height, y=0 is downfield):".to_string());
    for marker in &play.formation_markers {
        let route = play
            .path_for(&marker.id)
            .map(|p| {
                p.points
                    .iter()
                    .map(|pt| format!("({:.0},{:.0})", pt.x, pt.y))
                    .collect::<Vec<_>>()
                    .join(" -> ")
            })
            .unwrap_or_else(|| "no route".to_string());
        lines.push(format!(
            "- {} [{}] at ({:.0},{:.0}); route: {}",
            marker.label,
            marker.kind.as_str(),
            marker.x,
            marker.y,
            route
        ));
    }
    lines.join("\n")
}

pub struct AiClient {
    http: Client,
    config: AiConfig,
}

impl AiClient {
    pub fn new(config: AiConfig) -> Result<Self> {
        let http = build_http_client(config.timeout)?;
        Ok(Self { http, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub fn predict_play(&self, situation: &GameSituation) -> Result<PlayPrediction> {
        let text = self.generate(&situation.prompt(), true)?;
        decode_prediction(&text).context("prediction payload rejected")
    }

    pub fn explain_play(&self, play: &Play) -> Result<String> {
        let text = self.generate(&play_breakdown_prompt(play), false)?;
        Ok(text.trim().to_string())
    }

    fn generate(&self, prompt: &str, want_json: bool) -> Result<String> {
        let mut body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        });
        if want_json {
            body["generationConfig"] = json!({
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "OBJECT",
                    "properties": {
                        "playType": { "type": "STRING" },
                        "confidence": { "type": "NUMBER" },
                        "analysis": { "type": "STRING" }
                    },
                    "required": ["playType", "confidence", "analysis"]
                }
            });
        }

        let resp = self
            .http
            .post(self.config.endpoint())
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&body)
            .send()
            .context("request failed")?;
        let status = resp.status();
        let raw = resp.text().context("failed reading response body")?;
        if !status.is_success() {
            anyhow::bail!("ai service returned {status}: {}", error_message(&raw));
        }
        decode_generated_text(&raw).context("unexpected response envelope")
    }
}

fn error_message(raw: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(raw)
        .map(|body| body.error.message)
        .unwrap_or_else(|_| raw.chars().take(200).collect())
}
