use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::shared::face::Face;
use crate::shared::raw_frame_payload::RawFramePayload;

/// Messages a detection worker sends back to the pipeline.
///
/// On the wire: `{"type":"init"}`, `{"type":"detect_faces","faces":[...]}`
/// and `{"type":"log","args":[...]}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkerMessage {
    /// Worker finished initializing and accepts frames.
    Init,
    /// Answer to exactly one frame request.
    DetectFaces { faces: Vec<Face> },
    /// Diagnostic values for the logging collaborator.
    Log { args: Vec<serde_json::Value> },
}

impl WorkerMessage {
    pub fn log<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        WorkerMessage::Log {
            args: args
                .into_iter()
                .map(|a| serde_json::Value::String(a.into()))
                .collect(),
        }
    }
}

/// Joins log arguments with spaces; strings are printed without quotes.
pub fn format_log_args(args: &[serde_json::Value]) -> String {
    args.iter()
        .map(|v| match v {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// The single request kind sent to an out-of-process detector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DetectorRequest {
    Frame {
        #[serde(rename = "imageData")]
        image_data: ImageData,
    },
}

impl DetectorRequest {
    pub fn frame(payload: &RawFramePayload) -> Self {
        DetectorRequest::Frame {
            image_data: ImageData::from_payload(payload),
        }
    }
}

/// Pixel block as carried on the wire, with base64-encoded bytes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub data: String,
}

impl ImageData {
    pub fn from_payload(payload: &RawFramePayload) -> Self {
        Self {
            width: payload.width(),
            height: payload.height(),
            channels: payload.channels(),
            data: STANDARD.encode(payload.data()),
        }
    }

    pub fn decode_pixels(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_init_parses_from_bare_tag() {
        let msg: WorkerMessage = serde_json::from_str(r#"{"type":"init"}"#).unwrap();
        assert_eq!(msg, WorkerMessage::Init);
    }

    #[test]
    fn test_detect_faces_parses_face_list() {
        let msg: WorkerMessage = serde_json::from_str(
            r#"{"type":"detect_faces","faces":[{"x":60,"y":45,"width":24,"height":18}]}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            WorkerMessage::DetectFaces {
                faces: vec![Face::new(60.0, 45.0, 24.0, 18.0)]
            }
        );
    }

    #[test]
    fn test_log_accepts_mixed_values() {
        let msg: WorkerMessage =
            serde_json::from_str(r#"{"type":"log","args":["model loaded in",42,"ms"]}"#).unwrap();
        let WorkerMessage::Log { args } = msg else {
            panic!("expected log message");
        };
        assert_eq!(format_log_args(&args), "model loaded in 42 ms");
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let result = serde_json::from_str::<WorkerMessage>(r#"{"type":"frame"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_log_helper_wraps_strings() {
        assert_eq!(
            WorkerMessage::log(["a", "b"]),
            WorkerMessage::Log {
                args: vec![json!("a"), json!("b")]
            }
        );
    }

    #[test]
    fn test_frame_request_wire_shape() {
        let payload = RawFramePayload::new(vec![1, 2, 3, 4, 5, 6], 2, 1, 3, 0);
        let value = serde_json::to_value(DetectorRequest::frame(&payload)).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "frame",
                "imageData": {"width": 2, "height": 1, "channels": 3, "data": "AQIDBAUG"}
            })
        );
    }

    #[test]
    fn test_image_data_decodes_back_to_pixels() {
        let payload = RawFramePayload::new(vec![9; 12], 2, 2, 3, 4);
        let image_data = ImageData::from_payload(&payload);
        assert_eq!(image_data.decode_pixels().unwrap(), vec![9; 12]);
    }
}
