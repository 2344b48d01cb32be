//! # Layers
//!
//! An ordered stack of drawings, composed bottom to top. One layer is always current, and its
//! live contents are held in the *surface* while it is being edited.

use crate::stroke::Drawing;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerError {
    #[error("layer {index} out of range for a stack of {len}")]
    OutOfRange { index: usize, len: usize },
}

#[derive(Clone, PartialEq, Debug)]
pub struct Layer {
    name: String,
    /// Contents as of the last commit. Stale while this layer is current, see [`LayerStack`].
    drawing: Drawing,
    visible: bool,
}
impl Layer {
    fn new(name: String, drawing: Drawing) -> Self {
        Self {
            name,
            drawing,
            visible: true,
        }
    }
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

#[derive(Clone, Debug)]
pub struct LayerStack {
    /// Never empty.
    layers: Vec<Layer>,
    /// Always a valid index into `layers`.
    current: usize,
    /// Live copy of the current layer. Written back on layer switch.
    surface: Drawing,
}
impl Default for LayerStack {
    fn default() -> Self {
        Self::from_drawing(Drawing::new())
    }
}
impl LayerStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    /// A single visible layer holding `drawing`.
    #[must_use]
    pub fn from_drawing(drawing: Drawing) -> Self {
        Self {
            layers: vec![Layer::new(Self::layer_name(0), drawing.clone())],
            current: 0,
            surface: drawing,
        }
    }
    fn layer_name(index: usize) -> String {
        format!("Layer {}", index + 1)
    }
    fn check(&self, index: usize) -> Result<(), LayerError> {
        if index < self.layers.len() {
            Ok(())
        } else {
            Err(LayerError::OutOfRange {
                index,
                len: self.layers.len(),
            })
        }
    }
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }
    /// Always false, a stack has at least one layer.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }
    #[must_use]
    pub fn layer(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }
    /// The drawing being edited.
    #[must_use]
    pub fn surface(&self) -> &Drawing {
        &self.surface
    }
    /// Up-to-date contents of a layer, reading through the surface for the current one.
    #[must_use]
    pub fn drawing(&self, index: usize) -> Option<&Drawing> {
        if index == self.current {
            Some(&self.surface)
        } else {
            self.layers.get(index).map(|layer| &layer.drawing)
        }
    }
    pub(crate) fn drawing_mut(&mut self, index: usize) -> Option<&mut Drawing> {
        if index == self.current {
            Some(&mut self.surface)
        } else {
            self.layers.get_mut(index).map(|layer| &mut layer.drawing)
        }
    }
    /// Write the surface back into the current layer.
    pub fn commit(&mut self) {
        let layer = &mut self.layers[self.current];
        if layer.drawing != self.surface {
            layer.drawing.clone_from(&self.surface);
        }
    }
    /// Commit, then push a new empty visible layer and make it current. Returns its index.
    pub fn add_layer(&mut self) -> usize {
        self.commit();
        let index = self.layers.len();
        self.layers
            .push(Layer::new(Self::layer_name(index), Drawing::new()));
        self.current = index;
        self.surface = Drawing::new();
        index
    }
    /// Commit the surface into the layer being left, then make `index` current.
    pub fn switch_layer(&mut self, index: usize) -> Result<(), LayerError> {
        self.check(index)?;
        if index == self.current {
            return Ok(());
        }
        self.commit();
        self.current = index;
        self.surface = self.layers[index].drawing.clone();
        Ok(())
    }
    /// Flip a layer's visibility, returning the new state.
    pub fn toggle_visibility(&mut self, index: usize) -> Result<bool, LayerError> {
        self.check(index)?;
        let layer = &mut self.layers[index];
        layer.visible = !layer.visible;
        Ok(layer.visible)
    }
    /// Every visible layer appended in stack order.
    #[must_use]
    pub fn combined(&self) -> Drawing {
        let mut combined = Drawing::new();
        for (index, layer) in self.layers.iter().enumerate() {
            if !layer.visible {
                continue;
            }
            if let Some(drawing) = self.drawing(index) {
                combined.append(drawing);
            }
        }
        combined
    }
}

#[cfg(test)]
mod test {
    use super::{LayerError, LayerStack};
    use crate::stroke::{test::stroke, Drawing};

    #[test]
    fn new_stack() {
        let stack = LayerStack::new();
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.current_index(), 0);
        assert_eq!(stack.layer(0).unwrap().name(), "Layer 1");
        assert!(stack.combined().is_empty());
    }
    #[test]
    fn composition_skips_hidden() {
        let mut stack = LayerStack::from_drawing(Drawing::from(vec![stroke(1.0)]));
        stack.add_layer();
        stack.drawing_mut(1).unwrap().push(stroke(2.0));
        stack.add_layer();
        stack.drawing_mut(2).unwrap().push(stroke(3.0));

        let all: Drawing = [stroke(1.0), stroke(2.0), stroke(3.0)].into_iter().collect();
        assert_eq!(stack.combined(), all);

        assert_eq!(stack.toggle_visibility(1), Ok(false));
        let without: Drawing = [stroke(1.0), stroke(3.0)].into_iter().collect();
        assert_eq!(stack.combined(), without);

        assert_eq!(stack.toggle_visibility(1), Ok(true));
        assert_eq!(stack.combined(), all);
    }
    #[test]
    fn commit_on_switch() {
        let mut stack = LayerStack::new();
        stack.add_layer();
        stack.drawing_mut(1).unwrap().push(stroke(5.0));
        stack.switch_layer(0).unwrap();
        assert_eq!(stack.current_index(), 0);
        assert!(stack.surface().is_empty());
        // The stroke made it into layer 1's stored drawing.
        assert_eq!(stack.drawing(1).unwrap().len(), 1);
        stack.switch_layer(1).unwrap();
        assert_eq!(stack.surface().last(), Some(&stroke(5.0)));
    }
    #[test]
    fn out_of_range() {
        let mut stack = LayerStack::new();
        let err = LayerError::OutOfRange { index: 3, len: 1 };
        assert_eq!(stack.switch_layer(3), Err(err));
        assert_eq!(stack.toggle_visibility(3), Err(err));
        assert_eq!(stack.current_index(), 0);
        assert!(stack.layer(0).unwrap().is_visible());
    }
    #[test]
    fn add_layer_names() {
        let mut stack = LayerStack::new();
        assert_eq!(stack.add_layer(), 1);
        assert_eq!(stack.add_layer(), 2);
        assert_eq!(stack.layer(2).unwrap().name(), "Layer 3");
        assert_eq!(stack.current_index(), 2);
    }
}
