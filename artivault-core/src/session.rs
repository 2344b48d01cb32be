//! # Canvas edit session
//!
//! One open canvas: its layer stack, the active tool, undo history and saved/dirty status.
//! Sits between the ink-capture surface, which reports [`InkEvent`]s, and the [`Store`] that
//! holds the canvas.
//!
//! Sessions are single-threaded. Interested parties hear about changes through
//! [`Session::subscribe`].

use std::sync::Arc;

use crate::{
    codec::{self, EncodeError},
    color::Color,
    commands::{Command, CommandError},
    history::{Generation, History},
    layers::{LayerError, LayerStack},
    store::{CanvasID, PersistenceError, Store},
    stroke::{Drawing, InkKind, Point, Stroke, StrokeStyle, StyleError},
    tool::{EraserMode, Tool},
};

#[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Number of undo steps kept. 0 for unlimited.
    pub history_limit: usize,
    /// Save after this many accepted edits. 0 disables.
    pub autosave_every: usize,
    /// Attempts made to save on close before giving up.
    pub save_attempts: u32,
    /// Tool selected when a session opens.
    pub default_tool: Tool,
}
impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_limit: 256,
            autosave_every: 0,
            save_attempts: 3,
            default_tool: Tool::default(),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, strum::Display)]
pub enum SessionState {
    /// Created, drawing not yet read from the store.
    Unloaded,
    /// Drawing read, nothing done yet.
    Loaded,
    Editing,
    /// Last action was a tool change.
    ToolChange,
    Closed,
}

/// What the ink-capture surface reports.
#[derive(Clone, PartialEq, Debug)]
pub enum InkEvent {
    /// The user lifted the pen after inking a stroke.
    StrokeCompleted(Stroke),
    /// The surface edited its drawing in a way that isn't a single new stroke, e.g. erasing.
    DrawingChanged(Drawing),
    Undo,
    Redo,
}

#[derive(Clone, Debug)]
pub enum SessionEvent {
    Loaded {
        canvas: CanvasID,
        /// The stored drawing couldn't be decoded and was replaced with an empty one.
        recovered: bool,
    },
    DrawingChanged,
    ToolChanged(Tool),
    LayersChanged,
    Saved {
        canvas: CanvasID,
        bytes: usize,
    },
    SaveFailed {
        canvas: CanvasID,
        error: Arc<SaveError>,
    },
    Closed,
}

#[derive(thiserror::Error, Debug)]
pub enum EditError {
    #[error("session has not been loaded")]
    NotLoaded,
    #[error("strokes can't be inked while the eraser is active")]
    EraserActive,
    #[error("stroke has no points")]
    EmptyStroke,
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error(transparent)]
    Layer(#[from] LayerError),
}

#[derive(thiserror::Error, Debug)]
pub enum SaveError {
    #[error("session has no loaded drawing to save")]
    NotLoaded,
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// An encoded drawing that could not be written. Hand it to
/// [`crate::library::Library::retry_save`] to try again later.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PendingSave {
    pub canvas: CanvasID,
    pub bytes: Vec<u8>,
}

#[derive(thiserror::Error, Debug)]
#[error("failed to save canvas on close: {error}")]
pub struct CloseError {
    #[source]
    pub error: Arc<SaveError>,
    /// The unsaved drawing, if it could be encoded at all.
    pub pending: Option<PendingSave>,
}

pub struct Session {
    store: Arc<dyn Store>,
    canvas: CanvasID,
    config: SessionConfig,
    state: SessionState,
    layers: LayerStack,
    history: History,
    tool: Tool,
    /// Style for new strokes. Remembered while the eraser is out.
    ink: StrokeStyle,
    /// History generation at the last successful save.
    saved: Generation,
    /// Layers were added or shown/hidden since the last save.
    layers_dirty: bool,
    edits_since_save: usize,
    observers: Vec<crossbeam::channel::Sender<SessionEvent>>,
}
impl Session {
    /// Create an unloaded session for `canvas`. Call [`Self::load`] before editing.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, canvas: CanvasID, config: SessionConfig) -> Self {
        let history = History::new(config.history_limit);
        let tool = config.default_tool;
        Self {
            store,
            canvas,
            state: SessionState::Unloaded,
            layers: LayerStack::new(),
            saved: history.generation(),
            history,
            tool,
            ink: tool.style().copied().unwrap_or_default(),
            layers_dirty: false,
            edits_since_save: 0,
            observers: Vec::new(),
            config,
        }
    }
    /// Create and load in one go.
    pub fn open(
        store: Arc<dyn Store>,
        canvas: CanvasID,
        config: SessionConfig,
    ) -> Result<Self, PersistenceError> {
        let mut session = Self::new(store, canvas, config);
        session.load()?;
        Ok(session)
    }
    /// Read the canvas's drawing from the store. Undecodable data is replaced by an empty
    /// drawing, with `recovered` set in the [`SessionEvent::Loaded`] event.
    pub fn load(&mut self) -> Result<(), PersistenceError> {
        if self.state != SessionState::Unloaded {
            log::warn!("canvas {} already loaded", self.canvas);
            return Ok(());
        }
        if self.store.canvas(self.canvas).is_none() {
            return Err(PersistenceError::UnknownCanvas(self.canvas));
        }
        let (drawing, recovered) = match self.store.load_drawing(self.canvas)? {
            None => (Drawing::new(), false),
            Some(bytes) => match codec::decode(&bytes) {
                Ok(drawing) => (drawing, false),
                Err(err) => {
                    log::warn!(
                        "canvas {} drawing unreadable ({err}), starting empty",
                        self.canvas
                    );
                    (Drawing::new(), true)
                }
            },
        };
        log::debug!(
            "loaded canvas {} with {} strokes",
            self.canvas,
            drawing.len()
        );
        self.layers = LayerStack::from_drawing(drawing);
        self.state = SessionState::Loaded;
        self.emit(SessionEvent::Loaded {
            canvas: self.canvas,
            recovered,
        });
        Ok(())
    }
    /// Receive every event from now on. Dropping the receiver unsubscribes.
    pub fn subscribe(&mut self) -> crossbeam::channel::Receiver<SessionEvent> {
        let (send, recv) = crossbeam::channel::unbounded();
        self.observers.push(send);
        recv
    }
    fn emit(&mut self, event: SessionEvent) {
        self.observers
            .retain(|observer| observer.send(event.clone()).is_ok());
    }
    #[must_use]
    pub fn canvas(&self) -> CanvasID {
        self.canvas
    }
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
    #[must_use]
    pub fn layers(&self) -> &LayerStack {
        &self.layers
    }
    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }
    #[must_use]
    pub fn tool(&self) -> Tool {
        self.tool
    }
    /// Style the next inked stroke will take.
    #[must_use]
    pub fn ink_style(&self) -> StrokeStyle {
        self.ink
    }
    /// The current layer's live drawing, as shown on the ink surface.
    #[must_use]
    pub fn drawing(&self) -> &Drawing {
        self.layers.surface()
    }
    /// All visible layers, flattened. This is what gets saved.
    #[must_use]
    pub fn combined(&self) -> Drawing {
        self.layers.combined()
    }
    /// Are there changes the store hasn't seen?
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.layers_dirty || self.history.generation() != self.saved
    }
    fn check_loaded(&self) -> Result<(), EditError> {
        match self.state {
            SessionState::Unloaded | SessionState::Closed => Err(EditError::NotLoaded),
            _ => Ok(()),
        }
    }

    /// Feed an event from the ink surface.
    pub fn handle(&mut self, event: InkEvent) -> Result<(), EditError> {
        match event {
            InkEvent::StrokeCompleted(stroke) => self.add_stroke(stroke),
            InkEvent::DrawingChanged(drawing) => self.replace_drawing(drawing),
            InkEvent::Undo => self.undo().map(|_| ()),
            InkEvent::Redo => self.redo().map(|_| ()),
        }
    }
    /// Ink a stroke through `points` with the current style.
    pub fn draw(&mut self, points: Vec<Point>) -> Result<(), EditError> {
        let stroke = Stroke::new(self.ink, points);
        self.add_stroke(stroke)
    }
    fn add_stroke(&mut self, stroke: Stroke) -> Result<(), EditError> {
        self.check_loaded()?;
        if self.tool.is_eraser() {
            return Err(EditError::EraserActive);
        }
        if stroke.is_empty() {
            return Err(EditError::EmptyStroke);
        }
        let layer = self.layers.current_index();
        self.edit(Command::StrokeAdded { layer, stroke })
    }
    fn replace_drawing(&mut self, drawing: Drawing) -> Result<(), EditError> {
        self.check_loaded()?;
        if &drawing == self.layers.surface() {
            return Ok(());
        }
        let layer = self.layers.current_index();
        let from = self.layers.surface().clone();
        self.edit(Command::SurfaceReplaced {
            layer,
            from,
            to: drawing,
        })
    }
    fn edit(&mut self, command: Command) -> Result<(), EditError> {
        self.history.record(&mut self.layers, command)?;
        self.state = SessionState::Editing;
        self.emit(SessionEvent::DrawingChanged);

        self.edits_since_save += 1;
        let every = self.config.autosave_every;
        if every != 0 && self.edits_since_save >= every {
            log::debug!("autosaving canvas {}", self.canvas);
            // Failure is already logged and reported to observers, and the session stays dirty.
            let _ = self.save();
        }
        Ok(())
    }
    /// Undo the most recent change. Returns false if there was nothing to undo.
    pub fn undo(&mut self) -> Result<bool, EditError> {
        self.undo_n(1).map(|n| n != 0)
    }
    /// Redo the most recently undone change. Returns false if there was nothing to redo.
    pub fn redo(&mut self) -> Result<bool, EditError> {
        self.redo_n(1).map(|n| n != 0)
    }
    /// Undo up to `num` changes, returning how many were undone.
    pub fn undo_n(&mut self, num: usize) -> Result<usize, EditError> {
        self.check_loaded()?;
        let stepped = self.history.undo_n(&mut self.layers, num)?;
        self.after_step(stepped);
        Ok(stepped)
    }
    /// Redo up to `num` changes, returning how many were redone.
    pub fn redo_n(&mut self, num: usize) -> Result<usize, EditError> {
        self.check_loaded()?;
        let stepped = self.history.redo_n(&mut self.layers, num)?;
        self.after_step(stepped);
        Ok(stepped)
    }
    fn after_step(&mut self, stepped: usize) {
        if stepped != 0 {
            self.state = SessionState::Editing;
            self.emit(SessionEvent::DrawingChanged);
        }
    }

    /// Select a tool. No drawing is touched.
    pub fn set_tool(&mut self, tool: Tool) {
        if let Tool::Ink(style) = tool {
            self.ink = style;
        }
        self.tool = tool;
        if self.state != SessionState::Unloaded {
            self.state = SessionState::ToolChange;
        }
        log::debug!("tool changed to {tool:?}");
        self.emit(SessionEvent::ToolChanged(tool));
    }
    /// Pick the inking tool back up, with the last style used.
    pub fn select_ink(&mut self) {
        self.set_tool(Tool::Ink(self.ink));
    }
    pub fn select_eraser(&mut self, mode: EraserMode) {
        self.set_tool(Tool::eraser(mode));
    }
    /// Change ink color. Picking a color selects the inking tool.
    pub fn set_color(&mut self, color: Color) {
        self.set_tool(Tool::Ink(self.ink.with_color(color)));
    }
    /// Change ink kind. Selects the inking tool.
    pub fn set_ink(&mut self, ink: InkKind) {
        self.set_tool(Tool::Ink(self.ink.with_ink(ink)));
    }
    /// Change stroke width. Selects the inking tool.
    pub fn set_width(&mut self, width: f32) -> Result<(), StyleError> {
        let style = self.ink.with_width(width)?;
        self.set_tool(Tool::Ink(style));
        Ok(())
    }

    /// Add an empty layer on top and start editing it. Returns its index.
    pub fn add_layer(&mut self) -> Result<usize, EditError> {
        self.check_loaded()?;
        let index = self.layers.add_layer();
        self.layers_dirty = true;
        self.emit(SessionEvent::LayersChanged);
        Ok(index)
    }
    /// Start editing a different layer. Out-of-range indices change nothing.
    pub fn switch_layer(&mut self, index: usize) -> Result<(), EditError> {
        self.check_loaded()?;
        if let Err(err) = self.layers.switch_layer(index) {
            log::warn!("ignoring layer switch: {err}");
            return Err(err.into());
        }
        self.emit(SessionEvent::LayersChanged);
        Ok(())
    }
    /// Show or hide a layer, returning whether it's now visible.
    pub fn toggle_visibility(&mut self, index: usize) -> Result<bool, EditError> {
        self.check_loaded()?;
        let visible = self.layers.toggle_visibility(index).map_err(|err| {
            log::warn!("ignoring visibility toggle: {err}");
            err
        })?;
        self.layers_dirty = true;
        self.emit(SessionEvent::LayersChanged);
        Ok(visible)
    }

    fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        codec::encode(&self.layers.combined())
    }
    fn mark_saved(&mut self, bytes: usize) {
        self.saved = self.history.generation();
        self.layers_dirty = false;
        self.edits_since_save = 0;
        log::debug!("saved canvas {} ({bytes} bytes)", self.canvas);
        self.emit(SessionEvent::Saved {
            canvas: self.canvas,
            bytes,
        });
    }
    fn report_failure(&mut self, error: SaveError) -> Arc<SaveError> {
        log::error!("failed to save canvas {}: {error}", self.canvas);
        let error = Arc::new(error);
        self.emit(SessionEvent::SaveFailed {
            canvas: self.canvas,
            error: error.clone(),
        });
        error
    }
    /// Write the flattened drawing to the store now. Returns the number of bytes written.
    ///
    /// On failure observers get [`SessionEvent::SaveFailed`] and the session stays dirty. An
    /// unloaded or closed session has nothing to save and fails with [`SaveError::NotLoaded`].
    pub fn save(&mut self) -> Result<usize, Arc<SaveError>> {
        if let Err(err) = self.check_loaded() {
            log::warn!("not saving canvas {}: {err}", self.canvas);
            return Err(Arc::new(SaveError::NotLoaded));
        }
        let result = self
            .encode()
            .map_err(SaveError::from)
            .and_then(|bytes| {
                self.store.save_drawing(self.canvas, &bytes)?;
                Ok(bytes.len())
            });
        match result {
            Ok(len) => {
                self.mark_saved(len);
                Ok(len)
            }
            Err(err) => Err(self.report_failure(err)),
        }
    }
    /// Flush the drawing to the store and end the session.
    ///
    /// The save is retried up to [`SessionConfig::save_attempts`] times. If it never goes through,
    /// the encoded drawing comes back in the error so it isn't lost.
    pub fn close(mut self) -> Result<(), CloseError> {
        let result = if self.check_loaded().is_ok() {
            self.flush()
        } else {
            Ok(())
        };
        self.state = SessionState::Closed;
        self.emit(SessionEvent::Closed);
        result
    }
    fn flush(&mut self) -> Result<(), CloseError> {
        let bytes = match self.encode() {
            Ok(bytes) => bytes,
            Err(err) => {
                return Err(CloseError {
                    error: self.report_failure(err.into()),
                    pending: None,
                })
            }
        };
        let attempts = self.config.save_attempts.max(1);
        let mut attempt = 1;
        let error = loop {
            match self.store.save_drawing(self.canvas, &bytes) {
                Ok(()) => {
                    self.mark_saved(bytes.len());
                    return Ok(());
                }
                Err(err) if attempt < attempts => {
                    log::warn!(
                        "save attempt {attempt}/{attempts} for canvas {} failed: {err}",
                        self.canvas
                    );
                    attempt += 1;
                }
                Err(err) => break err,
            }
        };
        Err(CloseError {
            error: self.report_failure(error.into()),
            pending: Some(PendingSave {
                canvas: self.canvas,
                bytes,
            }),
        })
    }
}
