use serde::{Deserialize, Serialize};

use crate::{domain::ArtifactRef, validation::Request};

/// JSON body posted to the generation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateImagesRequest {
    pub prompt: String,
    pub amount: String,
    pub resolution: String,
}

impl From<&Request> for GenerateImagesRequest {
    fn from(value: &Request) -> Self {
        Self {
            prompt: value.prompt().to_string(),
            amount: value.amount().value().to_string(),
            resolution: value.resolution().value().to_string(),
        }
    }
}

/// One entry of the service's response array. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDescriptor {
    pub url: String,
}

impl From<ImageDescriptor> for ArtifactRef {
    fn from(value: ImageDescriptor) -> Self {
        ArtifactRef(value.url)
    }
}

/// Decodes a success body into artifact references, preserving response order.
pub fn parse_generation_response(body: &[u8]) -> serde_json::Result<Vec<ArtifactRef>> {
    let descriptors: Vec<ImageDescriptor> = serde_json::from_slice(body)?;
    Ok(descriptors.into_iter().map(ArtifactRef::from).collect())
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
