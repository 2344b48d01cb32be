//! # Library
//!
//! What the shell works with: folders and canvases by name, and opening canvases for editing.

use std::sync::Arc;

use crate::{
    launch::LaunchAction,
    session::{PendingSave, Session, SessionConfig},
    store::{Canvas, CanvasID, Folder, FolderID, PersistenceError, Store},
};

#[derive(Clone, PartialEq, Eq, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Folder that new canvases land in when nobody picked one.
    pub default_folder_name: String,
}
impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            default_folder_name: "My Sketches".to_owned(),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameError {
    #[error("name must not be blank")]
    Blank,
}

#[derive(thiserror::Error, Debug)]
pub enum LibraryError {
    #[error(transparent)]
    Name(#[from] NameError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Trim a folder or canvas name, rejecting it if nothing's left.
pub fn validate_name(name: &str) -> Result<String, NameError> {
    let name = name.trim();
    if name.is_empty() {
        Err(NameError::Blank)
    } else {
        Ok(name.to_owned())
    }
}

pub struct Library {
    store: Arc<dyn Store>,
    config: LibraryConfig,
    session_config: SessionConfig,
}
impl Library {
    /// Wrap a store. An empty store gets the default folder. A store that already has folders is
    /// left alone, so a deleted default folder stays deleted.
    pub fn open(
        store: Arc<dyn Store>,
        config: LibraryConfig,
        session_config: SessionConfig,
    ) -> Result<Self, LibraryError> {
        let library = Self {
            store,
            config,
            session_config,
        };
        if library.store.folders().is_empty() {
            library.default_folder()?;
        }
        Ok(library)
    }
    #[must_use]
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }
    #[must_use]
    pub fn config(&self) -> &LibraryConfig {
        &self.config
    }
    #[must_use]
    pub fn folders(&self) -> Vec<Folder> {
        self.store.folders()
    }
    /// ID of the default folder, creating it if it's missing.
    pub fn default_folder(&self) -> Result<FolderID, LibraryError> {
        let name = validate_name(&self.config.default_folder_name)?;
        if let Some(folder) = self.store.folders().into_iter().find(|f| f.name == name) {
            return Ok(folder.id);
        }
        log::info!("creating default folder {name:?}");
        Ok(self.create_folder(&name)?.id)
    }
    pub fn create_folder(&self, name: &str) -> Result<Folder, LibraryError> {
        let folder = Folder::new(validate_name(name)?);
        self.store.insert_folder(folder.clone())?;
        Ok(folder)
    }
    /// Delete a folder and every canvas in it.
    pub fn delete_folder(&self, id: FolderID) -> Result<(), LibraryError> {
        Ok(self.store.delete_folder(id)?)
    }
    pub fn create_canvas(&self, folder: FolderID, name: &str) -> Result<Canvas, LibraryError> {
        let canvas = Canvas::new(validate_name(name)?);
        self.store.insert_canvas(folder, canvas.clone())?;
        Ok(canvas)
    }
    pub fn delete_canvas(&self, id: CanvasID) -> Result<(), LibraryError> {
        Ok(self.store.delete_canvas(id)?)
    }
    pub fn open_canvas(&self, id: CanvasID) -> Result<Session, LibraryError> {
        Ok(Session::open(
            self.store.clone(),
            id,
            self.session_config.clone(),
        )?)
    }
    /// Create an empty "Untitled N" canvas in the default folder and open it.
    pub fn open_new_canvas(&self) -> Result<Session, LibraryError> {
        let folder_id = self.default_folder()?;
        let existing = self
            .store
            .folder(folder_id)
            .ok_or(PersistenceError::UnknownFolder(folder_id))?
            .canvases
            .len();
        let canvas = self.create_canvas(folder_id, &format!("Untitled {}", existing + 1))?;
        self.open_canvas(canvas.id)
    }
    /// Carry out a launch request.
    pub fn launch(&self, action: LaunchAction) -> Result<Session, LibraryError> {
        log::debug!("launch request {action:?}");
        match action {
            LaunchAction::OpenNewCanvas => self.open_new_canvas(),
            LaunchAction::OpenCanvas(id) => self.open_canvas(id),
        }
    }
    /// Try again to store a drawing a session couldn't save on close.
    pub fn retry_save(&self, pending: &PendingSave) -> Result<(), LibraryError> {
        self.store.save_drawing(pending.canvas, &pending.bytes)?;
        log::info!(
            "saved pending drawing for canvas {} ({} bytes)",
            pending.canvas,
            pending.bytes.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use super::{validate_name, Library, LibraryConfig, LibraryError, NameError};
    use crate::{
        launch::LaunchAction,
        session::SessionConfig,
        store::{DirStore, MemoryStore, PersistenceError, Store},
        stroke::{Drawing, InkKind, Point, Stroke, StrokeStyle},
    };

    fn library(store: Arc<dyn Store>) -> Library {
        Library::open(store, LibraryConfig::default(), SessionConfig::default()).unwrap()
    }

    #[test]
    fn names() {
        assert_eq!(validate_name("  Idea1 "), Ok("Idea1".to_owned()));
        assert_eq!(validate_name(" \t\n"), Err(NameError::Blank));
        let library = library(Arc::new(MemoryStore::new()));
        assert!(matches!(
            library.create_folder("   "),
            Err(LibraryError::Name(NameError::Blank))
        ));
    }
    #[test]
    fn default_folder_once() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let first = library(store.clone());
        let id = first.default_folder().unwrap();
        let second = library(store.clone());
        assert_eq!(second.default_folder().unwrap(), id);
        let folders = store.folders();
        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].name, "My Sketches");
    }
    #[test]
    fn deleted_default_folder_stays_deleted() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let first = library(store.clone());
        let sketchbook = first.create_folder("Sketchbook").unwrap();
        first.delete_folder(first.default_folder().unwrap()).unwrap();

        let second = library(store.clone());
        let names: Vec<_> = second.folders().into_iter().map(|f| f.name).collect();
        assert_eq!(names, ["Sketchbook"]);

        // Asking for a new canvas brings it back.
        let session = second.open_new_canvas().unwrap();
        let (folder, _) = store.canvas(session.canvas()).unwrap();
        assert_ne!(folder, sketchbook.id);
        assert_eq!(store.folders().len(), 2);
    }
    #[test]
    fn new_canvas_numbering() {
        let lib = library(Arc::new(MemoryStore::new()));
        let first = lib.launch(LaunchAction::OpenNewCanvas).unwrap();
        let second = lib.open_new_canvas().unwrap();
        assert_ne!(first.canvas(), second.canvas());
        let folder = lib.store().folder(lib.default_folder().unwrap()).unwrap();
        let names: Vec<_> = folder.canvases.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Untitled 1", "Untitled 2"]);
        assert!(first.combined().is_empty());
    }
    #[test]
    fn end_to_end() {
        let dir = tempfile::tempdir().expect("tempdir");
        let drawing = {
            let store = Arc::new(DirStore::open(dir.path()).unwrap());
            let lib = library(store);
            let folder = lib.create_folder("Sketchbook").unwrap();
            let canvas = lib.create_canvas(folder.id, "Idea1").unwrap();

            let mut session = lib.open_canvas(canvas.id).unwrap();
            session.draw(vec![
                Point::new(0.0, 0.0, 1.0).unwrap(),
                Point::new(10.0, 10.0, 0.5).unwrap(),
            ])
            .unwrap();
            session.set_ink(InkKind::Crayon);
            session.draw(vec![Point::new(3.0, 4.0, 0.25).unwrap()]).unwrap();
            let drawing = session.combined();
            assert_eq!(drawing.len(), 2);
            session.close().unwrap();
            drawing
        };
        // Fresh process, same directory.
        let lib = library(Arc::new(DirStore::open(dir.path()).unwrap()));
        let sketchbook = lib
            .folders()
            .into_iter()
            .find(|f| f.name == "Sketchbook")
            .unwrap();
        let idea = sketchbook.canvases.iter().find(|c| c.name == "Idea1").unwrap();
        let session = lib.open_canvas(idea.id).unwrap();
        assert_eq!(session.combined(), drawing);
        session.close().unwrap();

        lib.delete_folder(sketchbook.id).unwrap();
        assert!(lib.store().canvas(idea.id).is_none());
        assert!(lib.open_canvas(idea.id).is_err());
    }
    #[test]
    fn retry_after_failed_close() {
        let store = Arc::new(MemoryStore::new());
        let lib = library(store.clone());
        let mut session = lib.open_new_canvas().unwrap();
        let canvas = session.canvas();
        let stroke = Stroke::new(
            StrokeStyle::default(),
            vec![Point::new(1.0, 2.0, 1.0).unwrap()],
        );
        session
            .handle(crate::session::InkEvent::StrokeCompleted(stroke.clone()))
            .unwrap();

        store.set_fail_writes(true);
        let pending = session.close().unwrap_err().pending.unwrap();
        assert!(matches!(
            lib.retry_save(&pending),
            Err(LibraryError::Persistence(PersistenceError::Unavailable))
        ));
        store.set_fail_writes(false);
        lib.retry_save(&pending).unwrap();

        let session = lib.open_canvas(canvas).unwrap();
        assert_eq!(session.combined(), Drawing::from(vec![stroke]));
    }
}
