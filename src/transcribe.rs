//! Minimal OpenAI-compatible speech-to-text client.
//!
//! Used only when the pronunciation endpoint receives audio instead of text.
//! Calls are instrumented and log model name, audio size and latency (not contents).
//!
//! NOTE: We never log the API key.

use std::time::{Duration, Instant};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::{AUTHORIZATION, USER_AGENT};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::error::{AppError, Result};

#[derive(Clone)]
pub struct Transcriber {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub model: String,
}

#[derive(Deserialize)]
struct TranscriptionResponse {
  text: String,
}

impl Transcriber {
  /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty())?;
    let base_url = std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
    let model = std::env::var("OPENAI_TRANSCRIBE_MODEL").unwrap_or_else(|_| "whisper-1".into());

    let client = reqwest::Client::builder().timeout(Duration::from_secs(30)).build().ok()?;

    Some(Self { client, api_key, base_url, model })
  }

  /// Decode base64 audio and return the recognized text.
  #[instrument(level = "info", skip(self, audio_base64), fields(model = %self.model, %mime))]
  pub async fn transcribe_base64(&self, audio_base64: &str, mime: &str) -> Result<String> {
    let audio = decode_audio(audio_base64)?;
    self.transcribe(audio, mime).await
  }

  async fn transcribe(&self, audio: Vec<u8>, mime: &str) -> Result<String> {
    let started = Instant::now();
    let bytes = audio.len();
    let part = Part::bytes(audio)
      .file_name(format!("speech.{}", extension_for(mime)))
      .mime_str(mime)
      .map_err(|e| AppError::Transcription(format!("bad mime type '{mime}': {e}")))?;
    let form = Form::new().text("model", self.model.clone()).part("file", part);

    let url = format!("{}/audio/transcriptions", self.base_url.trim_end_matches('/'));
    let res = self
      .client
      .post(&url)
      .header(USER_AGENT, "learnpath-backend/0.1")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .multipart(form)
      .send()
      .await
      .map_err(|e| AppError::Transcription(e.to_string()))?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_openai_error(&body).unwrap_or(body);
      return Err(AppError::Transcription(format!("OpenAI HTTP {status}: {msg}")));
    }

    let body: TranscriptionResponse = res.json().await.map_err(|e| AppError::Transcription(e.to_string()))?;
    let text = body.text.trim().to_string();
    info!(target: "learnpath", audio_bytes = bytes, text_len = text.len(), elapsed_ms = started.elapsed().as_millis() as u64, "Audio transcribed");
    if text.is_empty() {
      return Err(AppError::Transcription("Could not understand audio. Please speak more clearly.".into()));
    }
    Ok(text)
  }
}

/// Accepts raw base64 or a `data:<mime>;base64,` URL.
pub fn decode_audio(audio_base64: &str) -> Result<Vec<u8>> {
  let payload = match audio_base64.split_once(";base64,") {
    Some((_, rest)) => rest,
    None => audio_base64,
  };
  let audio = STANDARD
    .decode(payload.trim())
    .map_err(|e| AppError::Transcription(format!("audio is not valid base64: {e}")))?;
  if audio.is_empty() {
    return Err(AppError::Transcription("audio payload is empty".into()));
  }
  Ok(audio)
}

fn extension_for(mime: &str) -> &'static str {
  match mime.split(';').next().unwrap_or_default().trim() {
    "audio/wav" | "audio/x-wav" | "audio/wave" => "wav",
    "audio/mpeg" | "audio/mp3" => "mp3",
    "audio/mp4" | "audio/m4a" | "audio/x-m4a" => "m4a",
    "audio/ogg" => "ogg",
    _ => "webm",
  }
}

/// Try to extract a clean error message from an OpenAI error body.
fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}
