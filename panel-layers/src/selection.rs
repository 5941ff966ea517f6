use serde::{Deserialize, Serialize};

use crate::{Geometry, LayerId};

/// Which layer, if any, the transform handles are attached to.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    #[default]
    None,
    Selected(LayerId),
}

impl Selection {
    pub fn id(&self) -> Option<&LayerId> {
        match self {
            Selection::None => None,
            Selection::Selected(id) => Some(id),
        }
    }

    pub fn is_selected(&self, id: &LayerId) -> bool {
        self.id() == Some(id)
    }

    /// Clicking the selected layer again deselects it.
    pub fn toggle(&mut self, id: LayerId) {
        *self = match std::mem::take(self) {
            Selection::Selected(current) if current == id => Selection::None,
            _ => Selection::Selected(id),
        };
    }

    pub fn clear(&mut self) {
        *self = Selection::None;
    }
}

/// A direct-manipulation change reported when a drag or resize ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformDelta {
    pub dx: f64,
    pub dy: f64,
    pub scale_x: f64,
    pub scale_y: f64,
}

impl Default for TransformDelta {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl TransformDelta {
    pub const IDENTITY: TransformDelta = TransformDelta {
        dx: 0.0,
        dy: 0.0,
        scale_x: 1.0,
        scale_y: 1.0,
    };

    pub fn translate(dx: f64, dy: f64) -> Self {
        Self {
            dx,
            dy,
            ..Self::IDENTITY
        }
    }

    pub fn scale(scale_x: f64, scale_y: f64) -> Self {
        Self {
            scale_x,
            scale_y,
            ..Self::IDENTITY
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Combines two deltas reported during the same gesture.
    pub fn then(self, next: TransformDelta) -> TransformDelta {
        TransformDelta {
            dx: self.dx + next.dx,
            dy: self.dy + next.dy,
            scale_x: self.scale_x * next.scale_x,
            scale_y: self.scale_y * next.scale_y,
        }
    }

    /// The geometry a layer would take, with the scale folded into its size.
    pub fn applied_to(&self, geometry: Geometry) -> Geometry {
        Geometry {
            x: geometry.x + self.dx,
            y: geometry.y + self.dy,
            width: geometry.width * self.scale_x,
            height: geometry.height * self.scale_y,
        }
    }
}
