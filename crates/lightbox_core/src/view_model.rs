use crate::{PhotoId, StageState};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub photos: Vec<PhotoRowView>,
    pub pending_count: usize,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoRowView {
    pub photo_id: PhotoId,
    pub name: String,
    pub state: StageState,
}
