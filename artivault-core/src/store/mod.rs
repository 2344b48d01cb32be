//! # Stores
//!
//! Durable home of the folder/canvas catalog and each canvas's encoded drawing. Every mutating
//! call is committed by the time it returns, there's no separate "save" step to forget.
//!
//! Two stores are provided: [`MemoryStore`] for in-process use and [`DirStore`], which keeps
//! everything under one directory on disk.

pub mod dir;
pub mod memory;

pub use dir::DirStore;
pub use memory::MemoryStore;

use crate::id::DurableID;

pub type FolderID = DurableID<Folder>;
pub type CanvasID = DurableID<Canvas>;
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Catalog entry for one canvas. The drawing itself lives in the store's blob slot for `id`.
#[derive(Clone, PartialEq, Eq, Debug, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub id: CanvasID,
    pub name: String,
    pub created: Timestamp,
    /// Time of the last drawing save, or creation if never saved.
    pub modified: Timestamp,
}
impl Canvas {
    /// A fresh, empty canvas. `name` is taken as-is, see [`crate::library::validate_name`].
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: CanvasID::new(),
            name: name.into(),
            created: now,
            modified: now,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug, serde::Serialize, serde::Deserialize)]
pub struct Folder {
    pub id: FolderID,
    pub name: String,
    pub created: Timestamp,
    /// In insertion order.
    #[serde(default)]
    pub canvases: Vec<Canvas>,
}
impl Folder {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: FolderID::new(),
            name: name.into(),
            created: chrono::Utc::now(),
            canvases: Vec::new(),
        }
    }
    #[must_use]
    pub fn canvas(&self, id: CanvasID) -> Option<&Canvas> {
        self.canvases.iter().find(|canvas| canvas.id == id)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum PersistenceError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("catalog unreadable: {}", .0)]
    CatalogParse(#[from] toml::de::Error),
    #[error("catalog unwritable: {}", .0)]
    CatalogSerialize(#[from] toml::ser::Error),
    #[error("no folder {}", .0)]
    UnknownFolder(FolderID),
    #[error("no canvas {}", .0)]
    UnknownCanvas(CanvasID),
    #[error("id {} already present", .0)]
    Duplicate(uuid::Uuid),
    #[error("store unavailable")]
    Unavailable,
}

/// Folders, the canvases they own, and the canvases' drawing blobs.
///
/// Shared between a library and the sessions it opens, hence `&self` everywhere.
pub trait Store: Send + Sync {
    /// All folders in insertion order, with their canvases.
    fn folders(&self) -> Vec<Folder>;
    fn folder(&self, id: FolderID) -> Option<Folder>;
    /// Find a canvas, along with the folder that owns it.
    fn canvas(&self, id: CanvasID) -> Option<(FolderID, Canvas)>;
    fn insert_folder(&self, folder: Folder) -> Result<(), PersistenceError>;
    /// Append a canvas to the end of a folder.
    fn insert_canvas(&self, folder: FolderID, canvas: Canvas) -> Result<(), PersistenceError>;
    /// Delete a folder, every canvas in it, and their drawings.
    fn delete_folder(&self, id: FolderID) -> Result<(), PersistenceError>;
    fn delete_canvas(&self, id: CanvasID) -> Result<(), PersistenceError>;
    /// The encoded drawing last saved for `id`, or `None` if it has never been saved.
    fn load_drawing(&self, id: CanvasID) -> Result<Option<Vec<u8>>, PersistenceError>;
    /// Replace the drawing for `id` and bump its modified time. Readers see either the old
    /// blob or the new one, never a mix.
    fn save_drawing(&self, id: CanvasID, bytes: &[u8]) -> Result<(), PersistenceError>;
}

/// Ordered folder list, the part of a store's state both implementations share.
#[derive(Clone, Default, Debug, serde::Serialize, serde::Deserialize)]
pub(crate) struct Catalog {
    #[serde(default, rename = "folder")]
    pub folders: Vec<Folder>,
}
impl Catalog {
    pub fn folder(&self, id: FolderID) -> Option<&Folder> {
        self.folders.iter().find(|folder| folder.id == id)
    }
    pub fn canvas(&self, id: CanvasID) -> Option<(FolderID, &Canvas)> {
        self.folders
            .iter()
            .find_map(|folder| Some((folder.id, folder.canvas(id)?)))
    }
    fn canvas_mut(&mut self, id: CanvasID) -> Option<&mut Canvas> {
        self.folders
            .iter_mut()
            .find_map(|folder| folder.canvases.iter_mut().find(|canvas| canvas.id == id))
    }
    fn contains_id(&self, id: uuid::Uuid) -> bool {
        self.folders.iter().any(|folder| {
            folder.id.uuid() == id || folder.canvases.iter().any(|canvas| canvas.id.uuid() == id)
        })
    }
    pub fn insert_folder(&mut self, folder: Folder) -> Result<(), PersistenceError> {
        if self.contains_id(folder.id.uuid()) {
            return Err(PersistenceError::Duplicate(folder.id.uuid()));
        }
        // Owned canvases come along, check those too.
        for canvas in &folder.canvases {
            if self.contains_id(canvas.id.uuid()) {
                return Err(PersistenceError::Duplicate(canvas.id.uuid()));
            }
        }
        self.folders.push(folder);
        Ok(())
    }
    pub fn insert_canvas(&mut self, folder: FolderID, canvas: Canvas) -> Result<(), PersistenceError> {
        if self.contains_id(canvas.id.uuid()) {
            return Err(PersistenceError::Duplicate(canvas.id.uuid()));
        }
        self.folders
            .iter_mut()
            .find(|f| f.id == folder)
            .ok_or(PersistenceError::UnknownFolder(folder))?
            .canvases
            .push(canvas);
        Ok(())
    }
    /// Remove a folder, returning it so the caller can clean up its canvases' blobs.
    pub fn remove_folder(&mut self, id: FolderID) -> Result<Folder, PersistenceError> {
        let index = self
            .folders
            .iter()
            .position(|folder| folder.id == id)
            .ok_or(PersistenceError::UnknownFolder(id))?;
        Ok(self.folders.remove(index))
    }
    pub fn remove_canvas(&mut self, id: CanvasID) -> Result<Canvas, PersistenceError> {
        for folder in &mut self.folders {
            if let Some(index) = folder.canvases.iter().position(|canvas| canvas.id == id) {
                return Ok(folder.canvases.remove(index));
            }
        }
        Err(PersistenceError::UnknownCanvas(id))
    }
    pub fn touch(&mut self, id: CanvasID, when: Timestamp) -> Result<(), PersistenceError> {
        self.canvas_mut(id)
            .ok_or(PersistenceError::UnknownCanvas(id))?
            .modified = when;
        Ok(())
    }
}
