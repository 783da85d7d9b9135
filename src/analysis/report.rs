use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

use crate::db::AnalysisFields;

/// Typed view of an analysis response. Every section is optional and each
/// one is read independently: an absent or mistyped key only leaves its own
/// record column unset.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AnalysisReport {
    #[serde(default, deserialize_with = "lenient")]
    analysis: Option<AnalysisSection>,
    #[serde(default, deserialize_with = "lenient")]
    perceptual_hashes: Option<PerceptualHashes>,
    #[serde(default, deserialize_with = "lenient")]
    image_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
struct AnalysisSection {
    #[serde(default, deserialize_with = "lenient")]
    ai_detection: Option<AiDetection>,
    #[serde(default, deserialize_with = "lenient")]
    steganography: Option<SteganographySection>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
struct AiDetection {
    #[serde(default, deserialize_with = "lenient")]
    confidence: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
struct SteganographySection {
    #[serde(default, deserialize_with = "lenient")]
    signature_detected: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
struct PerceptualHashes {
    #[serde(default, deserialize_with = "lenient")]
    phash: Option<String>,
}

/// Accept any JSON value; one that does not fit `T` reads as `None`
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    match T::deserialize(value) {
        Ok(parsed) => Ok(Some(parsed)),
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring mistyped analysis field");
            Ok(None)
        }
    }
}

impl AnalysisReport {
    /// Interpret a response body. Only a body that is not a JSON object
    /// yields an empty report.
    pub fn from_value(value: &Value) -> Self {
        match Self::deserialize(value) {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(error = %e, "Analysis response is not an object, ignoring typed fields");
                Self::default()
            }
        }
    }

    pub fn ai_confidence(&self) -> Option<f64> {
        self.analysis
            .as_ref()
            .and_then(|a| a.ai_detection.as_ref())
            .and_then(|d| d.confidence)
    }

    pub fn signature_detected(&self) -> Option<bool> {
        self.analysis
            .as_ref()
            .and_then(|a| a.steganography.as_ref())
            .and_then(|s| s.signature_detected)
    }

    pub fn phash(&self) -> Option<&str> {
        self.perceptual_hashes
            .as_ref()
            .and_then(|h| h.phash.as_deref())
    }

    pub fn image_path(&self) -> Option<&str> {
        self.image_path.as_deref()
    }

    /// Columns to persist on the image record
    pub fn fields(&self) -> AnalysisFields {
        AnalysisFields {
            ai_confidence: self.ai_confidence(),
            has_steganography: self.signature_detected(),
            perceptual_hash: self.phash().map(str::to_string),
            image_path: self.image_path().map(str::to_string),
        }
    }
}
