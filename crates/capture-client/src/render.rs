//! Presentation of analysis results.

use common::analysis::{AnalysisResult, FlagAttribute};

pub const PLACEHOLDER: &str = "Start the camera to begin facial analysis...";
pub const SESSION_EXPIRED: &str = "Session expired. Please login again.";
pub const CAMERA_UNAVAILABLE: &str = "Could not access webcam. Please check permissions.";

/// Sink for everything the capture loop wants to show the user.
pub trait Renderer: Send + Sync {
    fn render_result(&self, result: &AnalysisResult);
    fn render_error(&self, message: &str);
    fn render_placeholder(&self);
}

/// Writes result panels to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalRenderer;

impl Renderer for TerminalRenderer {
    fn render_result(&self, result: &AnalysisResult) {
        println!("{}", format_result(result));
    }

    fn render_error(&self, message: &str) {
        println!("Error: {}", message);
    }

    fn render_placeholder(&self) {
        println!("{}", PLACEHOLDER);
    }
}

/// Text panel for one analysis result.
///
/// Absent attributes are skipped rather than rendered as blanks.
pub fn format_result(result: &AnalysisResult) -> String {
    if !result.face_detected {
        return "⚠️ No Face Detected\nPlease ensure your face is clearly visible in the camera."
            .to_string();
    }

    let mut lines = Vec::new();
    match &result.identity {
        Some(identity) => {
            lines.push("✓ Identity Match Found".to_string());
            lines.push(format!("  Name: {}", identity.label()));
            lines.push(format!("  Confidence: {:.2}%", identity.similarity));
        }
        None => {
            lines.push("❌ Identity Not Recognized".to_string());
            lines.push("  Face detected but no match found in the collection.".to_string());
        }
    }

    if let Some(attrs) = &result.attributes {
        lines.push("Face Attributes:".to_string());
        if let Some(gender) = &attrs.gender {
            lines.push(format!("  Gender: {} ({:.1}%)", gender.value, gender.confidence));
        }
        if let Some(age) = &attrs.age_range {
            lines.push(format!("  Age Range: {} - {} years", age.low, age.high));
        }
        if !attrs.emotions.is_empty() {
            let emotions = attrs
                .top_emotions(3)
                .iter()
                .map(|e| format!("{} ({:.1}%)", e.kind, e.confidence))
                .collect::<Vec<_>>()
                .join(", ");
            lines.push(format!("  Emotions: {}", emotions));
        }
        for (label, flag) in attrs.flags() {
            if let Some(flag) = flag {
                lines.push(format!("  {}: {}", label, format_flag(flag)));
            }
        }
    }

    lines.join("\n")
}

fn format_flag(flag: &FlagAttribute) -> String {
    let answer = if flag.value { "Yes" } else { "No" };
    format!("{} ({:.1}%)", answer, flag.confidence)
}
