//! # Commands
//!
//! Every change to a canvas's strokes is recorded as a command, which can be applied forwards
//! or backwards against a [`LayerStack`]. [`crate::history::History`] keeps them in order.

use crate::{
    layers::LayerStack,
    stroke::{Drawing, Stroke},
};

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    #[error("command constructed for a state that does not match the current state")]
    MismatchedState,
    #[error("resource referenced by the command is not found")]
    UnknownResource,
    #[error("command makes no changes")]
    NoOp,
}
pub trait CommandConsumer<C> {
    /// Apply a single command. If this generates an error,
    /// the state of `self` should *not* be observably changed.
    fn apply(&mut self, command: DoUndo<'_, C>) -> Result<(), CommandError>;
}

#[derive(Clone, PartialEq, Debug)]
pub enum Command {
    /// A stroke was appended to the end of a layer.
    StrokeAdded { layer: usize, stroke: Stroke },
    /// A layer's contents were swapped wholesale, as the eraser reports its edits.
    SurfaceReplaced {
        layer: usize,
        from: Drawing,
        to: Drawing,
    },
}
impl Command {
    #[must_use]
    pub fn layer(&self) -> usize {
        match self {
            Self::StrokeAdded { layer, .. } | Self::SurfaceReplaced { layer, .. } => *layer,
        }
    }
}

#[derive(PartialEq, Eq, Debug)]
pub enum DoUndo<'c, T> {
    Do(&'c T),
    Undo(&'c T),
}
impl<'c, T> DoUndo<'c, T> {
    #[must_use]
    pub fn inner(&self) -> &'c T {
        match self {
            Self::Do(c) | Self::Undo(c) => *c,
        }
    }
}

impl CommandConsumer<Command> for LayerStack {
    fn apply(&mut self, command: DoUndo<'_, Command>) -> Result<(), CommandError> {
        let drawing = self
            .drawing_mut(command.inner().layer())
            .ok_or(CommandError::UnknownResource)?;
        match command {
            DoUndo::Do(Command::StrokeAdded { stroke, .. }) => {
                drawing.push(stroke.clone());
                Ok(())
            }
            DoUndo::Undo(Command::StrokeAdded { stroke, .. }) => {
                // Must be undoing the most recent stroke.
                if drawing.last() == Some(stroke) {
                    drawing.pop();
                    Ok(())
                } else {
                    Err(CommandError::MismatchedState)
                }
            }
            DoUndo::Do(Command::SurfaceReplaced { from, to, .. })
            | DoUndo::Undo(Command::SurfaceReplaced {
                from: to, to: from, ..
            }) => {
                if from == to {
                    Err(CommandError::NoOp)
                } else if drawing != from {
                    Err(CommandError::MismatchedState)
                } else {
                    drawing.clone_from(to);
                    Ok(())
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::{Command, CommandConsumer, CommandError, DoUndo};
    use crate::{
        layers::LayerStack,
        stroke::{test::stroke, Drawing},
    };

    #[test]
    fn stroke_do_undo() {
        let mut stack = LayerStack::new();
        let command = Command::StrokeAdded {
            layer: 0,
            stroke: stroke(1.0),
        };
        stack.apply(DoUndo::Do(&command)).unwrap();
        assert_eq!(stack.surface().len(), 1);
        stack.apply(DoUndo::Undo(&command)).unwrap();
        assert!(stack.surface().is_empty());
        // Nothing left to undo.
        assert_eq!(
            stack.apply(DoUndo::Undo(&command)),
            Err(CommandError::MismatchedState)
        );
    }
    #[test]
    fn mismatch_leaves_state() {
        let mut stack = LayerStack::from_drawing(Drawing::from(vec![stroke(1.0)]));
        let replace = Command::SurfaceReplaced {
            layer: 0,
            from: Drawing::from(vec![stroke(2.0)]),
            to: Drawing::new(),
        };
        assert_eq!(
            stack.apply(DoUndo::Do(&replace)),
            Err(CommandError::MismatchedState)
        );
        assert_eq!(stack.surface(), &Drawing::from(vec![stroke(1.0)]));

        let wrong_layer = Command::StrokeAdded {
            layer: 4,
            stroke: stroke(1.0),
        };
        assert_eq!(
            stack.apply(DoUndo::Do(&wrong_layer)),
            Err(CommandError::UnknownResource)
        );
    }
    #[test]
    fn replace_do_undo() {
        let before = Drawing::from(vec![stroke(1.0), stroke(2.0)]);
        let after = Drawing::from(vec![stroke(1.0)]);
        let mut stack = LayerStack::from_drawing(before.clone());
        let replace = Command::SurfaceReplaced {
            layer: 0,
            from: before.clone(),
            to: after.clone(),
        };
        stack.apply(DoUndo::Do(&replace)).unwrap();
        assert_eq!(stack.surface(), &after);
        stack.apply(DoUndo::Undo(&replace)).unwrap();
        assert_eq!(stack.surface(), &before);
    }
}
