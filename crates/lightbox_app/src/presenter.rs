use engine_logging::{engine_info, engine_warn};
use lightbox_core::{CatalogFailure, PhotoId};

/// Receives display-relevant notifications from the coordinator. A real UI
/// would re-render lazily; the console presenter just logs.
pub trait Presenter {
    fn photo_changed(&self, photo_id: PhotoId);
    fn catalog_loaded(&self);
    fn catalog_failed(&self, reason: CatalogFailure);
}

pub struct ConsolePresenter;

impl Presenter for ConsolePresenter {
    fn photo_changed(&self, photo_id: PhotoId) {
        engine_info!("photo {} changed", photo_id);
    }

    fn catalog_loaded(&self) {
        engine_info!("catalog loaded");
    }

    fn catalog_failed(&self, reason: CatalogFailure) {
        engine_warn!("catalog failed: {:?}", reason);
    }
}
