//! # History
//!
//! Linear undo/redo over [`Command`]s. Recording a new command discards anything that was
//! undone, there is no branching.

use std::collections::VecDeque;

use crate::commands::{Command, CommandConsumer, CommandError, DoUndo};

/// Opaque marker for a point in history. Equal generations mean equal document state, as long
/// as both were taken from the same [`History`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct Generation(u64);

pub struct History {
    /// Applied commands, oldest first.
    done: VecDeque<(Generation, Command)>,
    /// Undone commands, most recently undone last.
    undone: Vec<(Generation, Command)>,
    /// Generation of the state before the oldest entry of `done`.
    floor: Generation,
    next: u64,
    /// Max length of `done`, or 0 for no limit.
    limit: usize,
}
impl Default for History {
    fn default() -> Self {
        Self::new(0)
    }
}
impl History {
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            done: VecDeque::new(),
            undone: Vec::new(),
            floor: Generation(0),
            next: 1,
            limit,
        }
    }
    /// Generation of the current state.
    #[must_use]
    pub fn generation(&self) -> Generation {
        self.done.back().map_or(self.floor, |(generation, _)| *generation)
    }
    #[must_use]
    pub fn undo_len(&self) -> usize {
        self.done.len()
    }
    #[must_use]
    pub fn redo_len(&self) -> usize {
        self.undone.len()
    }
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.done.is_empty()
    }
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.undone.is_empty()
    }
    /// Apply `command` to `target`, then record it. On error nothing is recorded.
    pub fn record<T>(&mut self, target: &mut T, command: Command) -> Result<(), CommandError>
    where
        T: CommandConsumer<Command>,
    {
        target.apply(DoUndo::Do(&command))?;
        log::trace!("Writing new command: {:?}", CommandSummary(&command));

        if !self.undone.is_empty() {
            log::trace!("Discarding {} undone commands", self.undone.len());
            self.undone.clear();
        }
        let generation = Generation(self.next);
        self.next += 1;
        self.done.push_back((generation, command));
        if self.limit != 0 {
            while self.done.len() > self.limit {
                if let Some((evicted, _)) = self.done.pop_front() {
                    self.floor = evicted;
                }
            }
        }
        Ok(())
    }
    /// Step back up to `num` commands. Returns how many were undone.
    ///
    /// Stops at the first command that fails to apply, leaving it in place.
    pub fn undo_n<T>(&mut self, target: &mut T, num: usize) -> Result<usize, CommandError>
    where
        T: CommandConsumer<Command>,
    {
        for stepped in 0..num {
            let Some(entry) = self.done.pop_back() else {
                return Ok(stepped);
            };
            if let Err(err) = target.apply(DoUndo::Undo(&entry.1)) {
                self.done.push_back(entry);
                return Err(err);
            }
            self.undone.push(entry);
        }
        Ok(num)
    }
    /// Step forward up to `num` previously undone commands. Returns how many were redone.
    pub fn redo_n<T>(&mut self, target: &mut T, num: usize) -> Result<usize, CommandError>
    where
        T: CommandConsumer<Command>,
    {
        for stepped in 0..num {
            let Some(entry) = self.undone.pop() else {
                return Ok(stepped);
            };
            if let Err(err) = target.apply(DoUndo::Do(&entry.1)) {
                self.undone.push(entry);
                return Err(err);
            }
            self.done.push_back(entry);
        }
        Ok(num)
    }
}

/// Commands can hold whole drawings, keep the logs readable.
struct CommandSummary<'a>(&'a Command);
impl std::fmt::Debug for CommandSummary<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Command::StrokeAdded { layer, stroke } => f
                .debug_struct("StrokeAdded")
                .field("layer", layer)
                .field("points", &stroke.len())
                .field("ink", &stroke.style.ink())
                .finish(),
            Command::SurfaceReplaced { layer, from, to } => f
                .debug_struct("SurfaceReplaced")
                .field("layer", layer)
                .field("from_strokes", &from.len())
                .field("to_strokes", &to.len())
                .finish(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::History;
    use crate::{
        commands::{Command, CommandError},
        layers::LayerStack,
        stroke::{test::stroke, Drawing},
    };

    fn add(layer: usize, seed: f32) -> Command {
        Command::StrokeAdded {
            layer,
            stroke: stroke(seed),
        }
    }

    #[test]
    fn undo_redo_symmetry() {
        let mut stack = LayerStack::new();
        let mut history = History::new(0);
        for seed in 0..5 {
            history.record(&mut stack, add(0, seed as f32)).unwrap();
        }
        let full = stack.surface().clone();
        let start = history.generation();

        assert_eq!(history.undo_n(&mut stack, 3), Ok(3));
        assert_eq!(stack.surface().len(), 2);
        assert_ne!(history.generation(), start);

        assert_eq!(history.redo_n(&mut stack, 3), Ok(3));
        assert_eq!(stack.surface(), &full);
        assert_eq!(history.generation(), start);
    }
    #[test]
    fn stops_at_ends() {
        let mut stack = LayerStack::new();
        let mut history = History::default();
        history.record(&mut stack, add(0, 1.0)).unwrap();
        assert_eq!(history.undo_n(&mut stack, 10), Ok(1));
        assert_eq!(history.undo_n(&mut stack, 1), Ok(0));
        assert_eq!(history.redo_n(&mut stack, 10), Ok(1));
        assert_eq!(history.redo_n(&mut stack, 1), Ok(0));
    }
    #[test]
    fn new_edit_discards_redo() {
        let mut stack = LayerStack::new();
        let mut history = History::default();
        history.record(&mut stack, add(0, 1.0)).unwrap();
        history.record(&mut stack, add(0, 2.0)).unwrap();
        let undone_generation = history.generation();
        history.undo_n(&mut stack, 1).unwrap();
        assert!(history.can_redo());

        history.record(&mut stack, add(0, 3.0)).unwrap();
        assert!(!history.can_redo());
        assert_eq!(history.redo_n(&mut stack, 1), Ok(0));
        assert_eq!(
            stack.surface(),
            &[stroke(1.0), stroke(3.0)].into_iter().collect::<Drawing>()
        );
        // A fresh edit never reuses the discarded generation.
        assert_ne!(history.generation(), undone_generation);
    }
    #[test]
    fn limit_evicts_oldest() {
        let mut stack = LayerStack::new();
        let mut history = History::new(2);
        for seed in 0..4 {
            history.record(&mut stack, add(0, seed as f32)).unwrap();
        }
        assert_eq!(history.undo_len(), 2);
        assert_eq!(history.undo_n(&mut stack, 5), Ok(2));
        // The two oldest strokes are beyond reach.
        assert_eq!(stack.surface().len(), 2);
    }
    #[test]
    fn undo_on_other_layer() {
        let mut stack = LayerStack::new();
        let mut history = History::default();
        history.record(&mut stack, add(0, 1.0)).unwrap();
        stack.add_layer();
        history.record(&mut stack, add(1, 2.0)).unwrap();
        history.undo_n(&mut stack, 2).unwrap();
        assert!(stack.drawing(0).unwrap().is_empty());
        assert!(stack.surface().is_empty());
        history.redo_n(&mut stack, 1).unwrap();
        assert_eq!(stack.drawing(0).unwrap().len(), 1);
    }
    #[test]
    fn failed_undo_stays_recorded() {
        let mut stack = LayerStack::new();
        let mut history = History::default();
        history.record(&mut stack, add(0, 1.0)).unwrap();
        // Someone edits behind history's back.
        stack.drawing_mut(0).unwrap().push(stroke(9.0));
        assert_eq!(
            history.undo_n(&mut stack, 1),
            Err(CommandError::MismatchedState)
        );
        assert_eq!(history.undo_len(), 1);
    }
}
