//! Stream boundary: wire messages in, validated records out.

mod feed;
mod wire;

use serde::{Deserialize, Serialize};

pub use feed::{feed_channel, FeedReceiver, FeedSender};
pub use wire::{WireAnalysis, WireChunk};

use crate::error::Result;
use crate::features::{AnalysisRecord, FeatureChunk};

/// Producer-side processing state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingState {
    Ready,
    Processing,
    Completed,
    Error,
}

/// Progress report carried by `status` messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingStatus {
    pub status: ProcessingState,
    /// 0..1
    pub progress: f32,
    pub total_chunks: u32,
    pub processed_chunks: u32,
    /// Length of the analysed media (seconds)
    pub duration: f64,
}

/// One message from the feature stream, arrays already checked
#[derive(Debug, Clone, PartialEq)]
pub enum StreamMessage {
    ChunkData(FeatureChunk),
    AnalysisData(AnalysisRecord),
    Status(ProcessingStatus),
    Error { message: String },
}

#[derive(Debug, Serialize, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
enum WireMessage {
    ChunkData(WireChunk),
    AnalysisData(WireAnalysis),
    Status(ProcessingStatus),
    Error(ErrorBody),
}

impl StreamMessage {
    /// Decode one `{"type": ..., "data": ...}` message
    ///
    /// Undecodable text is a `Wire` error; well-formed JSON carrying arrays
    /// of the wrong length is a `MalformedRecord`.
    pub fn from_json(text: &str) -> Result<Self> {
        let message = match serde_json::from_str::<WireMessage>(text)? {
            WireMessage::ChunkData(chunk) => StreamMessage::ChunkData(chunk.try_into()?),
            WireMessage::AnalysisData(record) => StreamMessage::AnalysisData(record.try_into()?),
            WireMessage::Status(status) => StreamMessage::Status(status),
            WireMessage::Error(body) => StreamMessage::Error {
                message: body.message,
            },
        };
        Ok(message)
    }

    pub fn to_json(&self) -> Result<String> {
        let wire = match self {
            StreamMessage::ChunkData(chunk) => WireMessage::ChunkData(chunk.into()),
            StreamMessage::AnalysisData(record) => WireMessage::AnalysisData(record.into()),
            StreamMessage::Status(status) => WireMessage::Status(status.clone()),
            StreamMessage::Error { message } => WireMessage::Error(ErrorBody {
                message: message.clone(),
            }),
        };
        Ok(serde_json::to_string(&wire)?)
    }

    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            StreamMessage::ChunkData(_) => "chunk_data",
            StreamMessage::AnalysisData(_) => "analysis_data",
            StreamMessage::Status(_) => "status",
            StreamMessage::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VisualizerError;

    #[test]
    fn test_decode_status_message() {
        let text = r#"{"type":"status","data":{"status":"processing","progress":0.25,
            "total_chunks":400,"processed_chunks":100,"duration":80.0}}"#;
        match StreamMessage::from_json(text).unwrap() {
            StreamMessage::Status(status) => {
                assert_eq!(status.status, ProcessingState::Processing);
                assert_eq!(status.processed_chunks, 100);
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_decode_error_message() {
        let text = r#"{"type":"error","data":{"message":"session not found"}}"#;
        assert_eq!(
            StreamMessage::from_json(text).unwrap(),
            StreamMessage::Error {
                message: "session not found".to_string()
            }
        );
    }

    #[test]
    fn test_chunk_message_survives_encoding() {
        let mut chunk = FeatureChunk::neutral(0.6);
        chunk.amplitude = 0.75;
        chunk.chroma_features[9] = 1.0;
        let message = StreamMessage::ChunkData(chunk);
        let text = message.to_json().unwrap();
        assert!(text.contains("\"type\":\"chunk_data\""));
        assert_eq!(StreamMessage::from_json(&text).unwrap(), message);
    }

    #[test]
    fn test_unknown_type_is_wire_error() {
        let text = r#"{"type":"telemetry","data":{}}"#;
        assert!(matches!(
            StreamMessage::from_json(text),
            Err(VisualizerError::Wire(_))
        ));
        assert!(matches!(
            StreamMessage::from_json("not json"),
            Err(VisualizerError::Wire(_))
        ));
    }

    #[test]
    fn test_short_chunk_is_malformed_not_wire() {
        let text = serde_json::json!({
            "type": "chunk_data",
            "data": {
                "timestamp": 1.0,
                "frequencies": vec![0.0; 8],
                "amplitude": 0.0,
                "brightness": 0.0,
                "energy_center": 0.0,
                "is_percussive": false,
                "chroma_features": vec![0.0; 12],
            }
        })
        .to_string();
        assert!(matches!(
            StreamMessage::from_json(&text),
            Err(VisualizerError::MalformedRecord { .. })
        ));
    }

    #[test]
    fn test_analysis_without_relationships_decodes() {
        let chunk = WireChunk::from(&FeatureChunk::neutral(2.0));
        let text = serde_json::json!({
            "type": "analysis_data",
            "data": { "chunk": chunk }
        })
        .to_string();
        match StreamMessage::from_json(&text).unwrap() {
            StreamMessage::AnalysisData(record) => {
                assert_eq!(record.timestamp(), 2.0);
                assert_eq!(record.relationships.drop_probability(), 0.0);
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }
}
