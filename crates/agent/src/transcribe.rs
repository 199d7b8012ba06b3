use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use kiosk_core::config::TranscriptionConfig;
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

const DEFAULT_EXTENSION: &str = ".webm";

/// Upload extensions the transcription endpoint recognises, by content type.
const EXTENSIONS: &[(&str, &str)] = &[
    ("audio/webm", ".webm"),
    ("audio/webm;codecs=opus", ".webm"),
    ("audio/mp4", ".mp4"),
    ("audio/m4a", ".m4a"),
    ("audio/mpeg", ".mp3"),
    ("audio/mp3", ".mp3"),
    ("audio/wav", ".wav"),
    ("audio/ogg", ".ogg"),
    ("audio/oga", ".oga"),
    ("video/mp4", ".mp4"),
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioClip {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub filename: Option<String>,
}

#[derive(Debug, Error)]
pub enum TranscriptionError {
    #[error("transcription is disabled")]
    Disabled,
    #[error("unsupported content type `{0}` (expected audio/* or video/*)")]
    UnsupportedContentType(String),
    #[error("audio upload is empty")]
    EmptyAudio,
    #[error("transcription request failed: {0}")]
    Transport(String),
    #[error("transcription endpoint returned {status}: {message}")]
    Upstream { status: u16, message: String },
    #[error("transcription response could not be read: {0}")]
    MalformedResponse(String),
}

impl TranscriptionError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Upstream { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Whether the caller sent something unusable, as opposed to the service failing.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::UnsupportedContentType(_) | Self::EmptyAudio)
    }
}

#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, clip: &AudioClip) -> Result<String, TranscriptionError>;
}

/// Stand-in used when transcription is switched off in config.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledTranscriber;

#[async_trait]
impl Transcriber for DisabledTranscriber {
    async fn transcribe(&self, _clip: &AudioClip) -> Result<String, TranscriptionError> {
        Err(TranscriptionError::Disabled)
    }
}

/// Whisper-compatible `/v1/audio/transcriptions` client.
pub struct WhisperTranscriber {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<SecretString>,
    model: String,
}

impl WhisperTranscriber {
    pub fn from_config(config: &TranscriptionConfig) -> Result<Self, TranscriptionError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| TranscriptionError::Transport(error.to_string()))?;

        Ok(Self {
            http,
            endpoint: format!(
                "{}/v1/audio/transcriptions",
                config.base_url.trim_end_matches('/')
            ),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, clip: &AudioClip) -> Result<String, TranscriptionError> {
        validate_clip(clip)?;

        let extension = upload_extension(&clip.content_type, clip.filename.as_deref());
        let part = Part::bytes(clip.bytes.clone())
            .file_name(format!("audio{extension}"))
            .mime_str(&clip.content_type)
            .map_err(|_| TranscriptionError::UnsupportedContentType(clip.content_type.clone()))?;
        let form = Form::new().text("model", self.model.clone()).part("file", part);

        let mut request = self.http.post(&self.endpoint).multipart(form);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }

        let response = request
            .send()
            .await
            .map_err(|error| TranscriptionError::Transport(error.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| TranscriptionError::Transport(error.to_string()))?;

        if !status.is_success() {
            return Err(TranscriptionError::Upstream { status: status.as_u16(), message: body });
        }

        let text = parse_transcript(&body)?;
        info!(
            event_name = "transcription.completed",
            bytes = clip.bytes.len(),
            content_type = %clip.content_type,
            chars = text.chars().count(),
            "audio transcribed"
        );
        Ok(text)
    }
}

pub fn validate_clip(clip: &AudioClip) -> Result<(), TranscriptionError> {
    let content_type = clip.content_type.trim().to_ascii_lowercase();
    if !(content_type.starts_with("audio/") || content_type.starts_with("video/")) {
        return Err(TranscriptionError::UnsupportedContentType(clip.content_type.clone()));
    }
    if clip.bytes.is_empty() {
        return Err(TranscriptionError::EmptyAudio);
    }
    Ok(())
}

/// Keeps the uploaded file's own extension, otherwise derives one from the content type.
pub fn upload_extension(content_type: &str, filename: Option<&str>) -> String {
    let from_name = filename
        .and_then(|name| Path::new(name).extension())
        .and_then(|extension| extension.to_str())
        .filter(|extension| !extension.is_empty());
    if let Some(extension) = from_name {
        return format!(".{extension}");
    }

    let content_type = content_type.trim().to_ascii_lowercase();
    EXTENSIONS
        .iter()
        .find(|(known, _)| *known == content_type)
        .map_or(DEFAULT_EXTENSION, |(_, extension)| *extension)
        .to_string()
}

fn parse_transcript(body: &str) -> Result<String, TranscriptionError> {
    #[derive(Deserialize)]
    struct TranscriptionResponse {
        #[serde(default)]
        text: String,
    }

    serde_json::from_str::<TranscriptionResponse>(body)
        .map(|response| response.text)
        .map_err(|error| TranscriptionError::MalformedResponse(error.to_string()))
}

#[cfg(test)]
mod tests {
    use kiosk_core::config::TranscriptionConfig;

    use super::{
        parse_transcript, upload_extension, validate_clip, AudioClip, DisabledTranscriber,
        Transcriber, TranscriptionError, WhisperTranscriber,
    };

    fn clip(content_type: &str, bytes: &[u8]) -> AudioClip {
        AudioClip { bytes: bytes.to_vec(), content_type: content_type.to_string(), filename: None }
    }

    #[test]
    fn extension_prefers_uploaded_filename() {
        assert_eq!(upload_extension("audio/webm", Some("order.m4a")), ".m4a");
        assert_eq!(upload_extension("audio/mpeg", None), ".mp3");
        assert_eq!(upload_extension("audio/webm;codecs=opus", Some("blob")), ".webm");
        assert_eq!(upload_extension("video/mp4", None), ".mp4");
        assert_eq!(upload_extension("audio/x-unknown", None), ".webm");
    }

    #[test]
    fn only_audio_and_video_are_accepted() {
        assert!(validate_clip(&clip("audio/wav", b"RIFF")).is_ok());
        assert!(validate_clip(&clip("video/mp4", b"ftyp")).is_ok());

        let error = validate_clip(&clip("text/plain", b"hello")).expect_err("text upload");
        assert!(matches!(error, TranscriptionError::UnsupportedContentType(_)));
        assert!(error.is_client_error());

        let error = validate_clip(&clip("audio/webm", b"")).expect_err("empty upload");
        assert!(matches!(error, TranscriptionError::EmptyAudio));
    }

    #[test]
    fn retryability_follows_failure_kind() {
        assert!(TranscriptionError::Transport("reset".to_string()).is_retryable());
        assert!(TranscriptionError::Upstream { status: 502, message: String::new() }.is_retryable());
        assert!(!TranscriptionError::Upstream { status: 400, message: String::new() }.is_retryable());
        assert!(!TranscriptionError::Disabled.is_retryable());
    }

    #[test]
    fn transcript_text_is_read_from_json() {
        assert_eq!(parse_transcript(r#"{"text":"슈림프 라지"}"#).expect("text"), "슈림프 라지");
        assert_eq!(parse_transcript("{}").expect("missing text"), "");
        assert!(parse_transcript("<html>").is_err());
    }

    #[tokio::test]
    async fn disabled_transcriber_always_refuses() {
        let error = DisabledTranscriber
            .transcribe(&clip("audio/webm", b"abc"))
            .await
            .expect_err("disabled");
        assert!(matches!(error, TranscriptionError::Disabled));
    }

    #[tokio::test]
    async fn whisper_rejects_bad_upload_before_any_request() {
        let config = TranscriptionConfig {
            enabled: true,
            api_key: Some("sk-test".to_string().into()),
            base_url: "http://127.0.0.1:1/".to_string(),
            model: "whisper-1".to_string(),
            timeout_secs: 2,
        };
        let transcriber = WhisperTranscriber::from_config(&config).expect("client builds");
        assert_eq!(transcriber.endpoint(), "http://127.0.0.1:1/v1/audio/transcriptions");

        let error = transcriber
            .transcribe(&clip("application/pdf", b"%PDF"))
            .await
            .expect_err("pdf upload");
        assert!(matches!(error, TranscriptionError::UnsupportedContentType(_)));

        let error = transcriber
            .transcribe(&clip("audio/webm", b"webm"))
            .await
            .expect_err("nothing listens on port 1");
        assert!(matches!(error, TranscriptionError::Transport(_)));
        assert!(error.is_retryable());
    }
}
