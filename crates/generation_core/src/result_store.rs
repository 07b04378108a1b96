use shared::domain::ArtifactRef;

/// Artifacts of the most recent successful submission, in response order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultStore {
    artifacts: Vec<ArtifactRef>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, artifacts: impl IntoIterator<Item = ArtifactRef>) {
        self.artifacts = artifacts.into_iter().collect();
    }

    pub fn clear(&mut self) {
        self.artifacts.clear();
    }

    pub fn current(&self) -> &[ArtifactRef] {
        &self.artifacts
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }
}
