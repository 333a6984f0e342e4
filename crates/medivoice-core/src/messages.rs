//! Fixed user-facing strings and the kind → apology lookup table.
//!
//! Nothing technical ever crosses the UI boundary: every failure is logged
//! with its [`FailureKind`] and then replaced by one of these strings.

use crate::error::FailureKind;

// --- Transcription stage ---

pub const MSG_NO_AUDIO: &str =
    "No audio recorded. Please click the record button and speak into your microphone.";
pub const MSG_AUDIO_NOT_FOUND: &str = "Audio file not found. Please try recording again.";
pub const MSG_EMPTY_AUDIO: &str = "Empty audio file. Please record again and speak clearly.";
pub const MSG_STT_UNAVAILABLE: &str =
    "Audio transcription service not available. Please type your symptoms instead.";
pub const MSG_AUDIO_UNABLE: &str = "Unable to process audio. Please try again.";
pub const MSG_UNABLE_TO_TRANSCRIBE: &str =
    "Unable to transcribe audio. Please speak clearly and try recording again.";

// --- Analysis stage ---

pub const MSG_NO_INPUT: &str = "Please provide either voice input describing your symptoms or \
     upload a medical image for analysis.";
pub const MSG_AVIF_UNSUPPORTED: &str = "I apologize, but AVIF image format is not currently \
     supported. Please upload your medical image in JPG, PNG, GIF, or WebP format for analysis.";
pub const MSG_IMAGE_UNREADABLE: &str = "I'm unable to process this image format. Please upload \
     a medical image in JPG, PNG, GIF, or WebP format for analysis.";
pub const MSG_API_NOT_CONFIGURED: &str =
    "API configuration error. Please contact support for assistance.";
pub const MSG_API_UNAVAILABLE: &str = "I'm currently unable to process your request due to API \
     limitations. Please try again in a moment or consult a healthcare professional for medical \
     advice.";
pub const MSG_TECHNICAL_DIFFICULTIES: &str = "I apologize, but I'm experiencing technical \
     difficulties. Please try again or consult a healthcare professional for medical advice.";

/// The advisory string shown when analysis fails with the given kind.
pub fn advisory_apology(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::UnsupportedImageFormat => MSG_IMAGE_UNREADABLE,
        FailureKind::MissingCredential => MSG_API_NOT_CONFIGURED,
        FailureKind::RemoteServiceFailure => MSG_API_UNAVAILABLE,
        FailureKind::EmptyInput => MSG_NO_INPUT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_an_apology() {
        for kind in [
            FailureKind::UnsupportedImageFormat,
            FailureKind::MissingCredential,
            FailureKind::RemoteServiceFailure,
            FailureKind::EmptyInput,
        ] {
            assert!(!advisory_apology(kind).is_empty());
        }
    }

    #[test]
    fn test_apologies_are_non_technical() {
        // No status codes, no exception text, no env var names
        for msg in [
            MSG_API_NOT_CONFIGURED,
            MSG_API_UNAVAILABLE,
            MSG_TECHNICAL_DIFFICULTIES,
            MSG_IMAGE_UNREADABLE,
        ] {
            assert!(!msg.contains("GROQ"));
            assert!(!msg.contains("40"));
            assert!(!msg.contains("Error:"));
        }
    }
}
