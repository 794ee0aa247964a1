/// Stable identity of a photo, assigned from catalog order starting at 1.
pub type PhotoId = u64;

/// Where a photo sits in the fetch-then-transform pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageState {
    /// No artifact yet; a fetch may be admitted.
    Pending,
    /// Raw bytes are present; a transform may be admitted.
    Fetched,
    /// The derived artifact is present. Terminal.
    Ready,
    /// Fetch or transform failed. Terminal unless retried on revisit.
    Failed,
}

/// One entry of the loaded catalog, owned by the coordinator.
///
/// The artifact buffer holds raw bytes in `Fetched`, derived bytes in
/// `Ready`, and is empty otherwise. Transitions are one-way; calls that do
/// not match the current state are ignored so a misbehaving caller can never
/// move a record backwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoRecord {
    pub id: PhotoId,
    pub name: String,
    pub url: String,
    artifact: Vec<u8>,
    state: StageState,
}

impl PhotoRecord {
    pub fn new(id: PhotoId, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            url: url.into(),
            artifact: Vec::new(),
            state: StageState::Pending,
        }
    }

    pub fn state(&self) -> StageState {
        self.state
    }

    pub fn artifact(&self) -> &[u8] {
        &self.artifact
    }

    /// `Pending` -> `Fetched`, storing the raw bytes.
    pub(crate) fn mark_fetched(&mut self, raw: Vec<u8>) {
        if self.state == StageState::Pending {
            self.artifact = raw;
            self.state = StageState::Fetched;
        }
    }

    /// `Fetched` -> `Ready`, replacing the raw bytes with the derived ones.
    pub(crate) fn mark_ready(&mut self, derived: Vec<u8>) {
        if self.state == StageState::Fetched {
            self.artifact = derived;
            self.state = StageState::Ready;
        }
    }

    /// `Pending` or `Fetched` -> `Failed`. The artifact is dropped.
    pub(crate) fn mark_failed(&mut self) {
        if matches!(self.state, StageState::Pending | StageState::Fetched) {
            self.artifact = Vec::new();
            self.state = StageState::Failed;
        }
    }

    /// `Failed` -> `Pending`, used by [`crate::RetryPolicy::RetryOnRevisit`].
    pub(crate) fn reset_for_retry(&mut self) {
        if self.state == StageState::Failed {
            self.artifact = Vec::new();
            self.state = StageState::Pending;
        }
    }
}
