use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

/// One named point in the sequence the simulated request passes through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stage {
    pub id: String,
    pub label: String,
    /// Heading shown in the step panel while this stage is current
    pub title: String,
    /// Status caption shown on the node once the request has moved past it
    pub status: String,
    pub description: String,
    pub ordinal: usize,
}

impl Stage {
    pub fn new(
        ordinal: usize,
        id: &str,
        label: &str,
        title: &str,
        status: &str,
        description: &str,
    ) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            title: title.to_string(),
            status: status.to_string(),
            description: description.to_string(),
            ordinal,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("stage registry must contain at least one stage")]
    Empty,
    #[error("stage '{id}' has ordinal {found}, expected {expected}")]
    OrdinalGap { id: String, expected: usize, found: usize },
    #[error("duplicate stage id '{0}'")]
    DuplicateId(String),
    #[error("stage at ordinal {0} has an empty id")]
    EmptyId(usize),
}

/// Immutable, ordered set of stages.
///
/// Cloning a registry is cheap and every clone hands out the same stage
/// slice, so consumers can hold one without re-creating it per frame.
#[derive(Debug, Clone)]
pub struct StageRegistry {
    stages: Arc<[Stage]>,
}

impl StageRegistry {
    /// Build a registry, checking that ordinals run 0..N-1 in order and ids are unique
    pub fn new(stages: Vec<Stage>) -> Result<Self, RegistryError> {
        if stages.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut seen = HashSet::new();
        for (expected, stage) in stages.iter().enumerate() {
            if stage.id.trim().is_empty() {
                return Err(RegistryError::EmptyId(expected));
            }
            if stage.ordinal != expected {
                return Err(RegistryError::OrdinalGap {
                    id: stage.id.clone(),
                    expected,
                    found: stage.ordinal,
                });
            }
            if !seen.insert(stage.id.as_str()) {
                return Err(RegistryError::DuplicateId(stage.id.clone()));
            }
        }

        Ok(Self { stages: stages.into() })
    }

    /// The serverless order flow: user through to the notification service
    pub fn serverless_order_flow() -> Self {
        let stages = vec![
            Stage::new(
                0,
                "user",
                "User",
                "User Request",
                "POST /api/products",
                "User submits product data through the form. This triggers a POST request to the API endpoint.",
            ),
            Stage::new(
                1,
                "apiGateway",
                "API Gateway",
                "API Gateway",
                "Request received",
                "API Gateway receives the HTTP request, validates it, and routes it to the appropriate backend service.",
            ),
            Stage::new(
                2,
                "lambda1",
                "Lambda Function",
                "Lambda Function (Processing)",
                "Lambda invoked",
                "Lambda function processes the request, validates the product data, and prepares it for asynchronous processing.",
            ),
            Stage::new(
                3,
                "sqs",
                "SQS Queue",
                "SQS Queue",
                "Message published to SQS",
                "SQS Queue stores the message temporarily, ensuring reliable delivery and decoupling the processing steps.",
            ),
            Stage::new(
                4,
                "lambda2",
                "Lambda Function",
                "Lambda Function (Consumer)",
                "Processing message",
                "Lambda function polls the SQS queue, retrieves the message, and processes the product data.",
            ),
            Stage::new(
                5,
                "dynamodb",
                "DynamoDB",
                "DynamoDB",
                "Data stored",
                "DynamoDB stores the product information persistently in a NoSQL database table.",
            ),
            Stage::new(
                6,
                "sns",
                "SNS Notification",
                "SNS Notification",
                "Product added successfully - notification sent",
                "SNS sends a notification to subscribers (email, SMS, etc.) confirming the product was successfully added.",
            ),
        ];
        // The built-in table is ordered and unique, so this cannot fail
        Self { stages: stages.into() }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn get(&self, ordinal: usize) -> Option<&Stage> {
        self.stages.get(ordinal)
    }

    pub fn by_id(&self, id: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.id == id)
    }

    pub fn last_ordinal(&self) -> usize {
        self.stages.len() - 1
    }
}

impl Default for StageRegistry {
    fn default() -> Self {
        Self::serverless_order_flow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage(ordinal: usize, id: &str) -> Stage {
        Stage::new(ordinal, id, id, id, "", "")
    }

    #[test]
    fn test_default_registry_is_valid() {
        let registry = StageRegistry::serverless_order_flow();
        let rebuilt = StageRegistry::new(registry.stages().to_vec()).unwrap();
        assert_eq!(rebuilt.len(), 7);
        assert_eq!(registry.get(0).unwrap().id, "user");
        assert_eq!(registry.get(6).unwrap().id, "sns");
        assert_eq!(registry.by_id("sqs").unwrap().ordinal, 3);
    }

    #[test]
    fn test_stages_share_identity_across_calls() {
        let registry = StageRegistry::default();
        let clone = registry.clone();
        assert!(std::ptr::eq(registry.stages(), clone.stages()));
        assert!(std::ptr::eq(registry.stages(), registry.stages()));
    }

    #[test]
    fn test_rejects_empty() {
        assert_eq!(StageRegistry::new(vec![]).unwrap_err(), RegistryError::Empty);
    }

    #[test]
    fn test_rejects_ordinal_gap() {
        let err = StageRegistry::new(vec![stage(0, "a"), stage(2, "b")]).unwrap_err();
        assert_eq!(
            err,
            RegistryError::OrdinalGap { id: "b".to_string(), expected: 1, found: 2 }
        );
    }

    #[test]
    fn test_rejects_duplicate_id() {
        let err = StageRegistry::new(vec![stage(0, "a"), stage(1, "a")]).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateId("a".to_string()));
    }

    #[test]
    fn test_rejects_blank_id() {
        let err = StageRegistry::new(vec![stage(0, " ")]).unwrap_err();
        assert_eq!(err, RegistryError::EmptyId(0));
    }
}
