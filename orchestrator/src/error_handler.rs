use ai_llm_service::AiLlmError;
use image_gen_service::ImageGenError;
use rag_store::RagError;
use services::{ConfigError, ErrorClass};
use speech_service::SpeechError;
use thiserror::Error;

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    // --- Request gating ---
    #[error("another request is still running")]
    Busy,

    #[error("prompt is empty")]
    EmptyPrompt,

    #[error("speech support is not built in; rebuild with `--features speech`")]
    SpeechUnavailable,

    // --- Service layers ---
    #[error(transparent)]
    Llm(#[from] AiLlmError),

    #[error(transparent)]
    Image(#[from] ImageGenError),

    #[error(transparent)]
    Speech(#[from] SpeechError),

    #[error(transparent)]
    Rag(#[from] RagError),
}

impl AppError {
    pub fn class(&self) -> ErrorClass {
        match self {
            AppError::Config(_) => ErrorClass::Config,
            AppError::HttpClient(_) | AppError::Busy | AppError::SpeechUnavailable => {
                ErrorClass::Other
            }
            AppError::EmptyPrompt => ErrorClass::NoContent,
            AppError::Llm(e) => e.class(),
            AppError::Image(e) => e.class(),
            AppError::Speech(e) => e.class(),
            AppError::Rag(e) => e.class(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.class() == ErrorClass::Cancelled
    }

    /// Line shown to the user; prefixed by the area that failed.
    pub fn user_message(&self) -> String {
        if self.is_cancelled() {
            return "Cancelled.".to_string();
        }
        match self {
            AppError::Busy => "Another request is still running. Wait for it or cancel it.".into(),
            AppError::EmptyPrompt => "Type a prompt first.".into(),
            AppError::Image(e) => format!("Image generation failed. {e}"),
            AppError::Speech(e) => format!("Microphone/STT error: {e}"),
            AppError::Rag(e) => format!("RAG ingestion failed: {e}"),
            other => format!("Error: {other}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn cancellation_is_recognised_through_every_layer() {
        assert!(AppError::from(AiLlmError::Cancelled).is_cancelled());
        assert!(AppError::from(RagError::Cancelled).is_cancelled());
        assert!(AppError::from(SpeechError::Cancelled).is_cancelled());
        assert_eq!(AppError::from(ImageGenError::Cancelled).user_message(), "Cancelled.");
        assert!(!AppError::Busy.is_cancelled());
    }

    #[test]
    fn messages_name_the_failing_area() {
        let e = AppError::from(RagError::NotFound(PathBuf::from("a.pdf")));
        assert_eq!(e.user_message(), "RAG ingestion failed: PDF file not found: a.pdf");
        assert_eq!(e.class(), ErrorClass::NotFound);

        let e = AppError::from(ImageGenError::EmptyResult);
        assert!(e.user_message().starts_with("Image generation failed."));

        let e = AppError::from(SpeechError::NoInputDevice);
        assert!(e.user_message().starts_with("Microphone/STT error:"));
    }
}
