//! Host-side submission shapes.
//!
//! ComfyUI learns about a new job in two places: the body of a `/prompt`
//! request ([`PromptRequest`]) and the tuple pushed onto its prompt queue
//! ([`QueueItem`]). Both carry the `prompt_id` / `client_id` pair the
//! tracker needs.

use serde::Deserialize;
use serde_json::Value;

use crate::error::HookError;
use crate::tracker::CorrelationEntry;

/// Extra data attached to a queue item by the submitting client.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExtraData {
    #[serde(default)]
    pub client_id: Option<String>,
}

/// One entry of the ComfyUI prompt queue.
///
/// On the wire this is a JSON array
/// `[number, prompt_id, prompt, extra_data, outputs_to_execute, ...]`.
/// The workflow graph and everything after `extra_data` are skipped.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Vec<Value>")]
pub struct QueueItem {
    /// Queue position number, when it is an integer.
    pub number: Option<i64>,
    pub prompt_id: Option<String>,
    pub extra_data: ExtraData,
}

impl TryFrom<Vec<Value>> for QueueItem {
    type Error = HookError;

    fn try_from(fields: Vec<Value>) -> Result<Self, Self::Error> {
        if fields.len() < 4 {
            return Err(HookError::MalformedQueueItem(format!(
                "{} elements, expected at least 4",
                fields.len()
            )));
        }
        let mut fields = fields.into_iter();
        let number = fields.next().and_then(|v| v.as_i64());
        let prompt_id = fields.next().and_then(|v| v.as_str().map(str::to_owned));
        fields.next();
        // A non-object extra_data simply carries no client_id.
        let extra_data: ExtraData = fields
            .next()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default();

        Ok(Self {
            number,
            prompt_id,
            extra_data,
        })
    }
}

impl QueueItem {
    /// Interpret a raw JSON value posted by the host.
    pub fn from_value(value: Value) -> Result<Self, HookError> {
        match value {
            Value::Array(fields) => Self::try_from(fields),
            _ => Err(HookError::MalformedQueueItem("expected a JSON array".into())),
        }
    }

    /// The job/submitter pair, if both are present and non-empty.
    pub fn correlation(&self) -> Result<CorrelationEntry, HookError> {
        correlate(self.prompt_id.as_deref(), self.extra_data.client_id.as_deref())
    }
}

/// Body of a ComfyUI `/prompt` submission request.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PromptRequest {
    #[serde(default)]
    pub prompt: Option<Value>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub prompt_id: Option<String>,
}

impl PromptRequest {
    /// The job/submitter pair. Requests without a workflow graph never
    /// correlate, whatever ids they carry.
    pub fn correlation(&self) -> Result<CorrelationEntry, HookError> {
        if self.prompt.is_none() {
            return Err(HookError::MissingCorrelationData {
                job_id: self.prompt_id.clone(),
                submitter_id: self.client_id.clone(),
            });
        }
        correlate(self.prompt_id.as_deref(), self.client_id.as_deref())
    }
}

fn correlate(job_id: Option<&str>, submitter_id: Option<&str>) -> Result<CorrelationEntry, HookError> {
    match (non_empty(job_id), non_empty(submitter_id)) {
        (Some(job_id), Some(submitter_id)) => Ok(CorrelationEntry {
            job_id: job_id.to_owned(),
            submitter_id: submitter_id.to_owned(),
        }),
        _ => Err(HookError::MissingCorrelationData {
            job_id: job_id.map(str::to_owned),
            submitter_id: submitter_id.map(str::to_owned),
        }),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_full_queue_item() {
        let json = r#"[3, "p1", {"1": {"class_type": "KSampler"}}, {"client_id": "clientA"}, ["9"]]"#;
        let item: QueueItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.number, Some(3));
        assert_eq!(item.prompt_id.as_deref(), Some("p1"));

        let entry = item.correlation().unwrap();
        assert_eq!(entry.job_id, "p1");
        assert_eq!(entry.submitter_id, "clientA");
    }

    #[test]
    fn four_element_queue_item_is_accepted() {
        let json = r#"[0, "p2", {}, {"client_id": "c"}]"#;
        let item: QueueItem = serde_json::from_str(json).unwrap();
        assert!(item.correlation().is_ok());
    }

    #[test]
    fn short_queue_item_is_rejected() {
        let result = serde_json::from_str::<QueueItem>(r#"[0, "p1", {}]"#);
        assert!(result.is_err());
    }

    #[test]
    fn from_value_reports_malformed_items() {
        assert_matches!(
            QueueItem::from_value(serde_json::json!([0, "p1", {}])),
            Err(HookError::MalformedQueueItem(reason)) if reason.starts_with("3 elements")
        );
        assert_matches!(
            QueueItem::from_value(serde_json::json!({"prompt_id": "p1"})),
            Err(HookError::MalformedQueueItem(_))
        );
        let item = QueueItem::from_value(serde_json::json!([1, "p1", {}, {"client_id": "c"}])).unwrap();
        assert_eq!(item.correlation().unwrap().submitter_id, "c");
    }

    #[test]
    fn queue_item_without_client_id_does_not_correlate() {
        let json = r#"[0, "p1", {}, {"extra_pnginfo": {}}]"#;
        let item: QueueItem = serde_json::from_str(json).unwrap();
        assert_matches!(
            item.correlation(),
            Err(HookError::MissingCorrelationData { submitter_id: None, .. })
        );
    }

    #[test]
    fn queue_item_with_empty_ids_does_not_correlate() {
        let json = r#"[0, "", {}, {"client_id": "c"}]"#;
        let item: QueueItem = serde_json::from_str(json).unwrap();
        assert!(item.correlation().is_err());
    }

    #[test]
    fn non_object_extra_data_has_no_client() {
        let json = r#"[0, "p1", {}, "not-an-object"]"#;
        let item: QueueItem = serde_json::from_str(json).unwrap();
        assert!(item.extra_data.client_id.is_none());
    }

    #[test]
    fn prompt_request_correlates_with_all_fields() {
        let req: PromptRequest =
            serde_json::from_str(r#"{"prompt": {}, "client_id": "c1", "prompt_id": "p1"}"#).unwrap();
        let entry = req.correlation().unwrap();
        assert_eq!(entry.job_id, "p1");
        assert_eq!(entry.submitter_id, "c1");
    }

    #[test]
    fn prompt_request_without_prompt_does_not_correlate() {
        let req: PromptRequest =
            serde_json::from_str(r#"{"client_id": "c1", "prompt_id": "p1"}"#).unwrap();
        assert_matches!(req.correlation(), Err(HookError::MissingCorrelationData { .. }));
    }

    #[test]
    fn prompt_request_without_prompt_id_does_not_correlate() {
        let req: PromptRequest = serde_json::from_str(r#"{"prompt": {}, "client_id": "c1"}"#).unwrap();
        assert_matches!(
            req.correlation(),
            Err(HookError::MissingCorrelationData { job_id: None, .. })
        );
    }
}
