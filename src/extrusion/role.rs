use serde::{Deserialize, Serialize};

/// What a path is printing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExtrusionRole {
    /// Non-extruding move inside a fused loop.
    None,
    Perimeter,
    ExternalPerimeter,
    OverhangPerimeter,
    ThinWall,
    GapFill,
}

impl ExtrusionRole {
    #[must_use]
    pub fn is_perimeter(self) -> bool {
        matches!(
            self,
            Self::Perimeter | Self::ExternalPerimeter | Self::OverhangPerimeter
        )
    }

    #[must_use]
    pub fn is_external(self) -> bool {
        matches!(self, Self::ExternalPerimeter | Self::OverhangPerimeter)
    }

    /// `false` only for fly-over moves.
    #[must_use]
    pub fn is_extrusion(self) -> bool {
        self != Self::None
    }
}

/// Loop classification used when ordering and seaming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExtrusionLoopRole {
    #[default]
    Default,
    /// A contour loop with no contour inside it.
    ContourInternal,
}
