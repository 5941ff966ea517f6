use serde::{Deserialize, Serialize};

use crate::{
    CharacterPalette, Geometry, HexColor, Layer, LayerId, LayerKind, LayerSpec,
    layer::clamp_opacity,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Towards the front of the list, one step lower in paint order.
    Up,
    /// Towards the back of the list, one step higher in paint order.
    Down,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum StackError {
    #[error("Duplicate layer id {0}")]
    DuplicateId(LayerId),
    #[error("Layer {0} has a non-finite position or a side below the minimum size")]
    InvalidGeometry(LayerId),
}

/// The ordered layers of one editing session. Later entries paint on top.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Layer>", into = "Vec<Layer>")]
pub struct LayerStack {
    layers: Vec<Layer>,
}

impl TryFrom<Vec<Layer>> for LayerStack {
    type Error = StackError;

    fn try_from(value: Vec<Layer>) -> Result<Self, Self::Error> {
        Self::from_layers(value)
    }
}

impl From<LayerStack> for Vec<Layer> {
    fn from(value: LayerStack) -> Self {
        value.layers
    }
}

impl LayerStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_layers(layers: Vec<Layer>) -> Result<Self, StackError> {
        let mut stack = Self::new();
        for mut layer in layers {
            if stack.get(&layer.id).is_some() {
                return Err(StackError::DuplicateId(layer.id));
            }
            if !layer.geometry.is_valid() {
                return Err(StackError::InvalidGeometry(layer.id));
            }
            layer.opacity = clamp_opacity(layer.opacity);
            stack.layers.push(layer);
        }
        Ok(stack)
    }

    /// The Hair and Eyes placeholders created once a panel has been colorized.
    pub fn seeded(palette: &CharacterPalette) -> Self {
        let hair = Layer::from_spec(
            LayerId::new("hair-layer"),
            LayerSpec::new(LayerKind::Hair, Geometry::new(50.0, 50.0, 100.0, 100.0))
                .with_color(palette.hair.clone())
                .with_opacity(0.7),
        );
        let eyes = Layer::from_spec(
            LayerId::new("eyes-layer"),
            LayerSpec::new(LayerKind::Eyes, Geometry::new(80.0, 80.0, 40.0, 20.0))
                .with_color(palette.eyes.clone())
                .with_opacity(0.8),
        );
        Self {
            layers: vec![hair, eyes],
        }
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter()
    }

    pub fn ids(&self) -> Vec<LayerId> {
        self.layers.iter().map(|layer| layer.id.clone()).collect()
    }

    /// Visible layers in paint order.
    pub fn visible_layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter().filter(|layer| layer.visible)
    }

    pub fn get(&self, id: &LayerId) -> Option<&Layer> {
        self.layers.iter().find(|layer| &layer.id == id)
    }

    pub fn index_of(&self, id: &LayerId) -> Option<usize> {
        self.layers.iter().position(|layer| &layer.id == id)
    }

    fn get_mut(&mut self, id: &LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|layer| &layer.id == id)
    }

    /// Appends a new layer on top of the paint order.
    pub fn add_layer(&mut self, spec: LayerSpec) -> LayerId {
        let id = LayerId::generate();
        self.push_with_id(id.clone(), spec);
        id
    }

    /// Appends a layer under a caller-chosen id. Returns false if the id is taken.
    pub(crate) fn push_with_id(&mut self, id: LayerId, spec: LayerSpec) -> bool {
        let index = self.layers.len();
        self.insert_layer(index, Layer::from_spec(id, spec))
    }

    /// Inserts a fully built layer at `index` (clamped to the stack length).
    /// Duplicate ids and invalid geometry are refused.
    pub fn insert_layer(&mut self, index: usize, mut layer: Layer) -> bool {
        if self.get(&layer.id).is_some() {
            log::warn!("Refusing to insert duplicate layer id {}", layer.id);
            return false;
        }
        if !layer.geometry.is_valid() {
            log::warn!(
                "Refusing to insert layer {} with geometry {:?}",
                layer.id,
                layer.geometry
            );
            return false;
        }
        layer.opacity = clamp_opacity(layer.opacity);
        let index = index.min(self.layers.len());
        log::debug!("Insert layer {} at {index}", layer.id);
        self.layers.insert(index, layer);
        true
    }

    pub fn remove_layer(&mut self, id: &LayerId) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        self.layers.remove(index);
        log::debug!("Removed layer {id}");
        true
    }

    pub fn set_visibility(&mut self, id: &LayerId, visible: bool) -> bool {
        match self.get_mut(id) {
            Some(layer) if layer.visible != visible => {
                layer.visible = visible;
                true
            }
            _ => false,
        }
    }

    pub fn toggle_visibility(&mut self, id: &LayerId) -> bool {
        match self.get_mut(id) {
            Some(layer) => {
                layer.visible = !layer.visible;
                true
            }
            None => false,
        }
    }

    /// Stores `value` clamped to `[0, 1]`.
    pub fn set_opacity(&mut self, id: &LayerId, value: f64) -> bool {
        let value = clamp_opacity(value);
        match self.get_mut(id) {
            Some(layer) if layer.opacity != value => {
                layer.opacity = value;
                true
            }
            _ => false,
        }
    }

    /// Swaps the layer with its neighbour. The first layer cannot move up and
    /// the last one cannot move down.
    pub fn reorder(&mut self, id: &LayerId, direction: Direction) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let neighbour = match direction {
            Direction::Up if index > 0 => index - 1,
            Direction::Down if index + 1 < self.layers.len() => index + 1,
            _ => return false,
        };
        self.layers.swap(index, neighbour);
        true
    }

    /// Applies a finished transform, keeping any dimension that would drop
    /// below the minimum size.
    pub fn set_geometry(&mut self, id: &LayerId, geometry: Geometry) -> bool {
        let Some(layer) = self.get_mut(id) else {
            return false;
        };
        let next = layer.geometry.constrained(geometry);
        if next != geometry {
            log::debug!("Clamped geometry for layer {id}: {geometry:?} -> {next:?}");
        }
        if next == layer.geometry {
            return false;
        }
        layer.geometry = next;
        true
    }

    pub fn rename(&mut self, id: &LayerId, name: impl Into<String>) -> bool {
        let name = name.into();
        match self.get_mut(id) {
            Some(layer) if layer.name != name => {
                layer.name = name;
                true
            }
            _ => false,
        }
    }

    pub fn set_color(&mut self, id: &LayerId, color: Option<HexColor>) -> bool {
        match self.get_mut(id) {
            Some(layer) if layer.color != color => {
                layer.color = color;
                true
            }
            _ => false,
        }
    }
}
