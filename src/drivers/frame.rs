use serde::Deserialize;
use serde_json::{Map, Value};
use crate::types::ChannelId;
/// One multi-channel frame as delivered by the transport, before timestamp normalisation.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    /// Raw timestamp in the configured unit; `None` when the sender omitted it.
    pub timestamp: Option<f64>,
    pub values: Vec<(ChannelId, f64)>,
}
impl Frame {
    pub fn new(timestamp: impl Into<Option<f64>>) -> Self {
        Self {
            timestamp: timestamp.into(),
            values: Vec::new(),
        }
    }
    pub fn with(mut self, channel: u8, value: f64) -> Self {
        self.values.push((ChannelId(channel), value));
        self
    }
}
/// Result of decoding one transport payload. Malformed frames are counted, not returned.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DecodedPayload {
    pub frames: Vec<Frame>,
    pub malformed: usize,
}
#[derive(Deserialize)]
#[serde(untagged)]
enum WirePayload {
    Batch {
        #[serde(rename = "_batch")]
        frames: Vec<Value>,
    },
    // broadcaster envelope: { "type": "batch", "samples": [...] }
    Broadcast {
        samples: Vec<Value>,
    },
    Single(Value),
}
#[derive(Deserialize)]
struct WireFrame {
    #[serde(default)]
    timestamp: Option<f64>,
    channels: Map<String, Value>,
}
pub fn decode_str(text: &str) -> DecodedPayload {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => decode_value(value),
        Err(err) => {
            log::warn!("dropping unparseable payload: {err}");
            DecodedPayload {
                frames: Vec::new(),
                malformed: 1,
            }
        }
    }
}
/// Accepts a single frame, `{ "_batch": [...] }` or `{ "type": "batch", "samples": [...] }`.
/// Each frame of a batch is decoded on its own.
pub fn decode_value(value: Value) -> DecodedPayload {
    let raw_frames = match serde_json::from_value::<WirePayload>(value) {
        Ok(WirePayload::Batch { frames }) | Ok(WirePayload::Broadcast { samples: frames }) => frames,
        Ok(WirePayload::Single(frame)) => vec![frame],
        Err(err) => {
            log::warn!("dropping malformed payload: {err}");
            return DecodedPayload {
                frames: Vec::new(),
                malformed: 1,
            };
        }
    };
    let mut decoded = DecodedPayload::default();
    for raw in raw_frames {
        match decode_frame(raw) {
            Some(frame) => decoded.frames.push(frame),
            None => decoded.malformed += 1,
        }
    }
    decoded
}
fn decode_frame(raw: Value) -> Option<Frame> {
    let wire: WireFrame = match serde_json::from_value(raw) {
        Ok(wire) => wire,
        Err(err) => {
            log::warn!("dropping malformed frame: {err}");
            return None;
        }
    };
    let mut frame = Frame::new(wire.timestamp);
    for (key, entry) in wire.channels {
        let Ok(index) = key.trim().parse::<u8>() else {
            log::warn!("ignoring channel entry with non-numeric key {key:?}");
            continue;
        };
        let value = match &entry {
            Value::Number(n) => n.as_f64(),
            Value::Object(fields) => fields.get("value").and_then(Value::as_f64),
            _ => None,
        };
        match value {
            Some(v) => frame.values.push((ChannelId(index), v)),
            None => log::warn!("ignoring channel {index}: no numeric value in {entry}"),
        }
    }
    if frame.values.is_empty() {
        log::warn!("dropping frame with no usable channel entry");
        return None;
    }
    Some(frame)
}
