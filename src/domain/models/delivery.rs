use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryOutcome {
    Delivered,
    /// The endpoint will never accept pushes again; its registration must be retired.
    InvalidEndpoint,
    Failed(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryResult {
    pub handle: String,
    pub outcome: DeliveryOutcome,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeliveryReport {
    pub results: Vec<DeliveryResult>,
}

impl DeliveryReport {
    pub fn invalid_handles(&self) -> Vec<String> {
        self.results
            .iter()
            .filter(|r| r.outcome == DeliveryOutcome::InvalidEndpoint)
            .map(|r| r.handle.clone())
            .collect()
    }

    pub fn delivered_count(&self) -> usize {
        self.results.iter().filter(|r| r.outcome == DeliveryOutcome::Delivered).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.results.iter().filter_map(|r| match &r.outcome {
            DeliveryOutcome::Failed(reason) => Some((r.handle.as_str(), reason.as_str())),
            _ => None,
        })
    }
}
