//! ComfyUI completion payload types and output artifact extraction.
//!
//! When a prompt finishes, ComfyUI hands the queue a mapping of node id to
//! node output. Image-producing nodes carry an `images` list; each entry
//! names a file and whether it is a final `"output"` or a `"temp"` preview.
//! [`CompletionPayload::output_artifacts`] flattens the final images into
//! the references reported to the client.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Image type marking a final, user-facing output file.
pub const OUTPUT_IMAGE_TYPE: &str = "output";

/// Everything a finished prompt produced, keyed by node id.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CompletionPayload {
    /// Node outputs in the order ComfyUI reported them.
    #[serde(default, deserialize_with = "ordered_outputs")]
    pub outputs: Vec<(String, NodeOutput)>,
}

/// Output of a single node. Keys other than `images` are ignored.
///
/// Image entries that do not parse are dropped one by one, so a custom
/// node with an odd preview entry does not hide the other images.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NodeOutput {
    #[serde(default, deserialize_with = "lenient_images")]
    pub images: Option<Vec<ImageRef>>,
}

/// One image file written by a node.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImageRef {
    pub filename: String,
    #[serde(default)]
    pub subfolder: Option<String>,
    /// `"output"`, `"temp"` or `"input"`.
    #[serde(rename = "type")]
    pub kind: String,
}

impl ImageRef {
    /// Whether this image is a final output rather than a preview.
    pub fn is_output(&self) -> bool {
        self.kind == OUTPUT_IMAGE_TYPE
    }

    /// `subfolder/filename`, or just `filename` when there is no subfolder.
    pub fn reference(&self) -> String {
        match self.subfolder.as_deref() {
            Some(subfolder) if !subfolder.is_empty() => format!("{subfolder}/{}", self.filename),
            _ => self.filename.clone(),
        }
    }
}

impl CompletionPayload {
    /// Build a payload from the raw `outputs` value the host reports.
    ///
    /// A `null` value is treated as "no outputs".
    pub fn from_outputs(outputs: serde_json::Value) -> Result<Self, serde_json::Error> {
        if outputs.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(serde_json::json!({ "outputs": outputs }))
    }

    /// References to every `"output"` image, in node then list order.
    pub fn output_artifacts(&self) -> Vec<String> {
        self.outputs
            .iter()
            .filter_map(|(_, node)| node.images.as_deref())
            .flatten()
            .filter(|image| image.is_output())
            .map(ImageRef::reference)
            .collect()
    }
}

/// Deserialize a JSON object into `(key, value)` pairs without losing order.
fn ordered_outputs<'de, D>(deserializer: D) -> Result<Vec<(String, NodeOutput)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct OrderedVisitor;

    impl<'de> Visitor<'de> for OrderedVisitor {
        type Value = Vec<(String, NodeOutput)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of node id to node output")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((node_id, raw)) = map.next_entry::<String, Value>()? {
                let output = serde_json::from_value(raw).unwrap_or_else(|e| {
                    tracing::debug!(node_id = %node_id, error = %e, "Ignoring unreadable node output");
                    NodeOutput::default()
                });
                entries.push((node_id, output));
            }
            Ok(entries)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(OrderedVisitor)
}

/// Deserialize an `images` list, skipping entries that are not image refs.
fn lenient_images<'de, D>(deserializer: D) -> Result<Option<Vec<ImageRef>>, D::Error>
where
    D: Deserializer<'de>,
{
    let images: Vec<ImageRef> = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<ImageRef>(item) {
                Ok(image) => Some(image),
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping malformed image entry");
                    None
                }
            })
            .collect(),
        Some(Value::Null) | None => return Ok(None),
        Some(other) => {
            tracing::debug!(images = %other, "Ignoring non-list images value");
            return Ok(None);
        }
    };
    Ok(Some(images))
}
