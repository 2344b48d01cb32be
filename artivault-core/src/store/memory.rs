//! A store that keeps everything in-memory. Lost on exit.

use std::sync::atomic::{AtomicBool, Ordering};

use super::{Canvas, CanvasID, Catalog, Folder, FolderID, PersistenceError, Store};

#[derive(Default)]
pub struct MemoryStore {
    // We don't expect high contention, writes happen on user action only.
    catalog: parking_lot::RwLock<Catalog>,
    drawings: parking_lot::RwLock<hashbrown::HashMap<CanvasID, Vec<u8>>>,
    fail_writes: AtomicBool,
}
impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    /// While set, every mutating call fails with [`PersistenceError::Unavailable`] without
    /// effect. Stands in for a full disk or revoked access.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }
    fn check_writable(&self) -> Result<(), PersistenceError> {
        if self.fail_writes.load(Ordering::Relaxed) {
            Err(PersistenceError::Unavailable)
        } else {
            Ok(())
        }
    }
}
impl Store for MemoryStore {
    fn folders(&self) -> Vec<Folder> {
        self.catalog.read().folders.clone()
    }
    fn folder(&self, id: FolderID) -> Option<Folder> {
        self.catalog.read().folder(id).cloned()
    }
    fn canvas(&self, id: CanvasID) -> Option<(FolderID, Canvas)> {
        let catalog = self.catalog.read();
        let (folder, canvas) = catalog.canvas(id)?;
        Some((folder, canvas.clone()))
    }
    fn insert_folder(&self, folder: Folder) -> Result<(), PersistenceError> {
        self.check_writable()?;
        self.catalog.write().insert_folder(folder)
    }
    fn insert_canvas(&self, folder: FolderID, canvas: Canvas) -> Result<(), PersistenceError> {
        self.check_writable()?;
        self.catalog.write().insert_canvas(folder, canvas)
    }
    fn delete_folder(&self, id: FolderID) -> Result<(), PersistenceError> {
        self.check_writable()?;
        // Lock order: catalog, then drawings.
        let mut catalog = self.catalog.write();
        let folder = catalog.remove_folder(id)?;
        let mut drawings = self.drawings.write();
        for canvas in &folder.canvases {
            drawings.remove(&canvas.id);
        }
        log::debug!(
            "deleted folder {id} with {} canvases",
            folder.canvases.len()
        );
        Ok(())
    }
    fn delete_canvas(&self, id: CanvasID) -> Result<(), PersistenceError> {
        self.check_writable()?;
        let mut catalog = self.catalog.write();
        catalog.remove_canvas(id)?;
        self.drawings.write().remove(&id);
        Ok(())
    }
    fn load_drawing(&self, id: CanvasID) -> Result<Option<Vec<u8>>, PersistenceError> {
        Ok(self.drawings.read().get(&id).cloned())
    }
    fn save_drawing(&self, id: CanvasID, bytes: &[u8]) -> Result<(), PersistenceError> {
        self.check_writable()?;
        let mut catalog = self.catalog.write();
        catalog.touch(id, chrono::Utc::now())?;
        self.drawings.write().insert(id, bytes.to_vec());
        Ok(())
    }
}
