//! A store kept in a plain directory:
//!
//! ```text
//! <root>/catalog.toml            folders and canvas metadata
//! <root>/drawings/<canvas>.avd   one encoded drawing per saved canvas
//! ```
//!
//! Every file is replaced by writing a sibling temp file and renaming it over the target, so a
//! crash mid-write leaves the previous version intact. Writers hold the catalog lock for the
//! whole operation, blob files included.

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use super::{Canvas, CanvasID, Catalog, Folder, FolderID, PersistenceError, Store};

const CATALOG_NAME: &str = "catalog.toml";
const DRAWINGS_DIR: &str = "drawings";
const DRAWING_EXTENSION: &str = "avd";

pub struct DirStore {
    root: PathBuf,
    /// Mirror of `catalog.toml`. Only updated after the file write succeeds.
    catalog: parking_lot::RwLock<Catalog>,
}
impl DirStore {
    /// Open the store at `root`, creating it if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let root = root.into();
        std::fs::create_dir_all(root.join(DRAWINGS_DIR))?;
        let catalog_path = root.join(CATALOG_NAME);
        let catalog = match std::fs::read_to_string(&catalog_path) {
            Ok(text) => toml::from_str(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("no catalog at {}, starting empty", catalog_path.display());
                Catalog::default()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            root,
            catalog: catalog.into(),
        })
    }
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
    fn drawing_path(&self, id: CanvasID) -> PathBuf {
        self.root
            .join(DRAWINGS_DIR)
            .join(id.to_string())
            .with_extension(DRAWING_EXTENSION)
    }
    /// Apply `f` to a copy of the catalog and persist it. The in-memory catalog only changes if
    /// both succeed.
    fn update_catalog<T>(
        &self,
        f: impl FnOnce(&mut Catalog) -> Result<T, PersistenceError>,
    ) -> Result<T, PersistenceError> {
        let mut lock = self.catalog.write();
        self.update_locked(&mut lock, f)
    }
    /// [`Self::update_catalog`] for a caller already holding the write lock.
    fn update_locked<T>(
        &self,
        catalog: &mut Catalog,
        f: impl FnOnce(&mut Catalog) -> Result<T, PersistenceError>,
    ) -> Result<T, PersistenceError> {
        let mut next = catalog.clone();
        let out = f(&mut next)?;
        let text = toml::to_string(&next)?;
        write_atomic(&self.root.join(CATALOG_NAME), text.as_bytes())?;
        *catalog = next;
        Ok(out)
    }
    fn remove_drawing(&self, id: CanvasID) -> Result<(), PersistenceError> {
        match std::fs::remove_file(self.drawing_path(id)) {
            Ok(()) => Ok(()),
            // Never saved.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Replace `path` with `bytes` all at once.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), std::io::Error> {
    let temp_path = write_temp(path, bytes)?;
    commit_temp(&temp_path, path)
}
/// Write and sync `bytes` next to `path`, returning the temp file's path. `path` is untouched.
fn write_temp(path: &Path, bytes: &[u8]) -> Result<PathBuf, std::io::Error> {
    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);

    let written = std::fs::File::create(&temp_path).and_then(|mut file| {
        file.write_all(bytes)?;
        file.sync_all()
    });
    match written {
        Ok(()) => Ok(temp_path),
        Err(e) => {
            discard_temp(&temp_path);
            Err(e)
        }
    }
}
fn commit_temp(temp_path: &Path, path: &Path) -> Result<(), std::io::Error> {
    std::fs::rename(temp_path, path).map_err(|e| {
        discard_temp(temp_path);
        e
    })
}
/// Don't leave the stray around. The write error is the interesting one.
fn discard_temp(temp_path: &Path) {
    if let Err(e) = std::fs::remove_file(temp_path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            log::warn!("couldn't remove {}: {e}", temp_path.display());
        }
    }
}

impl Store for DirStore {
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
        self.update_catalog(|catalog| catalog.insert_folder(folder))
    }
    fn insert_canvas(&self, folder: FolderID, canvas: Canvas) -> Result<(), PersistenceError> {
        self.update_catalog(|catalog| catalog.insert_canvas(folder, canvas))
    }
    fn delete_folder(&self, id: FolderID) -> Result<(), PersistenceError> {
        let mut catalog = self.catalog.write();
        let removed = catalog
            .folder(id)
            .ok_or(PersistenceError::UnknownFolder(id))?
            .canvases
            .iter()
            .map(|canvas| canvas.id)
            .collect::<Vec<_>>();
        // Blobs first. If the catalog write then fails, the canvases are still listed and
        // simply open empty.
        for canvas in &removed {
            self.remove_drawing(*canvas)?;
        }
        self.update_locked(&mut catalog, |catalog| catalog.remove_folder(id).map(|_| ()))?;
        log::debug!("deleted folder {id} with {} canvases", removed.len());
        Ok(())
    }
    fn delete_canvas(&self, id: CanvasID) -> Result<(), PersistenceError> {
        let mut catalog = self.catalog.write();
        if catalog.canvas(id).is_none() {
            return Err(PersistenceError::UnknownCanvas(id));
        }
        self.remove_drawing(id)?;
        self.update_locked(&mut catalog, |catalog| catalog.remove_canvas(id).map(|_| ()))
    }
    fn load_drawing(&self, id: CanvasID) -> Result<Option<Vec<u8>>, PersistenceError> {
        match std::fs::read(self.drawing_path(id)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
    /// The new blob is staged, then the catalog timestamp is written, and only then is the blob
    /// renamed into place. A failed save leaves the previous drawing readable.
    fn save_drawing(&self, id: CanvasID, bytes: &[u8]) -> Result<(), PersistenceError> {
        let mut catalog = self.catalog.write();
        if catalog.canvas(id).is_none() {
            return Err(PersistenceError::UnknownCanvas(id));
        }
        let path = self.drawing_path(id);
        let temp_path = write_temp(&path, bytes)?;
        let now = chrono::Utc::now();
        if let Err(e) = self.update_locked(&mut catalog, |catalog| catalog.touch(id, now)) {
            discard_temp(&temp_path);
            return Err(e);
        }
        commit_temp(&temp_path, &path).map_err(|e| {
            log::error!("canvas {id} marked modified but its drawing wasn't replaced: {e}");
            e.into()
        })
    }
}

#[cfg(test)]
mod test {
    use super::DirStore;
    use crate::store::{Canvas, CanvasID, Folder, PersistenceError, Store};

    fn with_canvas(store: &DirStore) -> CanvasID {
        let folder = Folder::new("Sketchbook");
        let folder_id = folder.id;
        let canvas = Canvas::new("Idea1");
        let canvas_id = canvas.id;
        store.insert_folder(folder).unwrap();
        store.insert_canvas(folder_id, canvas).unwrap();
        canvas_id
    }

    #[test]
    fn shared_behaviour() {
        let dir = tempfile::tempdir().expect("tempdir");
        crate::store::test::exercise(&DirStore::open(dir.path()).unwrap());
    }
    #[test]
    fn survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let folder = Folder::new("Sketchbook");
        let folder_id = folder.id;
        let canvas = Canvas::new("Idea1");
        let canvas_id = canvas.id;
        {
            let store = DirStore::open(dir.path()).unwrap();
            store.insert_folder(folder).unwrap();
            store.insert_canvas(folder_id, canvas).unwrap();
            store.save_drawing(canvas_id, b"strokes").unwrap();
        }
        let store = DirStore::open(dir.path()).unwrap();
        let folders = store.folders();
        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].name, "Sketchbook");
        assert_eq!(folders[0].canvases[0].name, "Idea1");
        assert_eq!(
            store.load_drawing(canvas_id).unwrap().as_deref(),
            Some(&b"strokes"[..])
        );
        // No temp files left behind.
        let strays = std::fs::read_dir(dir.path().join("drawings"))
            .unwrap()
            .filter_map(Result::ok)
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "tmp"))
            .count();
        assert_eq!(strays, 0);
    }
    #[test]
    fn corrupt_catalog() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("catalog.toml"), "[[folder]]\nid = 5").unwrap();
        assert!(matches!(
            DirStore::open(dir.path()),
            Err(PersistenceError::CatalogParse(_))
        ));
    }
    #[test]
    fn failed_catalog_write_keeps_old_drawing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DirStore::open(dir.path()).unwrap();
        let canvas = with_canvas(&store);
        store.save_drawing(canvas, b"old").unwrap();
        let modified = store.canvas(canvas).unwrap().1.modified;

        // A directory squatting on the temp name makes the catalog rewrite fail.
        let blocker = dir.path().join("catalog.toml.tmp");
        std::fs::create_dir(&blocker).unwrap();
        assert!(matches!(
            store.save_drawing(canvas, b"new"),
            Err(PersistenceError::Io(_))
        ));
        assert_eq!(
            store.load_drawing(canvas).unwrap().as_deref(),
            Some(&b"old"[..])
        );
        assert_eq!(store.canvas(canvas).unwrap().1.modified, modified);
        let strays = std::fs::read_dir(dir.path().join("drawings"))
            .unwrap()
            .filter_map(Result::ok)
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "tmp"))
            .count();
        assert_eq!(strays, 0);

        std::fs::remove_dir(&blocker).unwrap();
        store.save_drawing(canvas, b"new").unwrap();
        assert_eq!(
            store.load_drawing(canvas).unwrap().as_deref(),
            Some(&b"new"[..])
        );
    }
    #[test]
    fn delete_racing_saves_leaves_no_blob() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DirStore::open(dir.path()).unwrap();
        for _ in 0..8 {
            let canvas = with_canvas(&store);
            std::thread::scope(|scope| {
                scope.spawn(|| {
                    // Keep saving until the canvas is gone.
                    while store.save_drawing(canvas, b"strokes").is_ok() {}
                });
                store.delete_canvas(canvas).unwrap();
            });
            assert!(store.canvas(canvas).is_none());
            assert_eq!(store.load_drawing(canvas).unwrap(), None);
        }
    }
}
