mod collection;
mod extrusion_loop;
mod path;
mod role;

pub use collection::{chain_order, ExtrusionEntityCollection};
pub use extrusion_loop::ExtrusionLoop;
pub use path::ExtrusionPath;
pub use role::{ExtrusionLoopRole, ExtrusionRole};

use crate::geometry::{Point, Polygon};

/// Anything that can be printed: a path, a loop or a nested collection.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtrusionEntity {
    Path(ExtrusionPath),
    Loop(ExtrusionLoop),
    Collection(ExtrusionEntityCollection),
}

impl ExtrusionEntity {
    #[must_use]
    pub fn is_collection(&self) -> bool {
        matches!(self, Self::Collection(_))
    }

    #[must_use]
    pub fn is_loop(&self) -> bool {
        matches!(self, Self::Loop(_))
    }

    /// Open paths and collections can be printed backwards; loops cannot.
    #[must_use]
    pub fn can_reverse(&self) -> bool {
        match self {
            Self::Path(_) => true,
            Self::Loop(_) => false,
            Self::Collection(c) => !c.no_sort,
        }
    }

    #[must_use]
    pub fn first_point(&self) -> Point {
        match self {
            Self::Path(p) => p.first_point(),
            Self::Loop(l) => l.first_point(),
            Self::Collection(c) => c.first_point(),
        }
    }

    #[must_use]
    pub fn last_point(&self) -> Point {
        match self {
            Self::Path(p) => p.last_point(),
            Self::Loop(l) => l.last_point(),
            Self::Collection(c) => c.last_point(),
        }
    }

    pub fn reverse(&mut self) {
        match self {
            Self::Path(p) => p.reverse(),
            Self::Loop(l) => l.reverse(),
            Self::Collection(c) => c.reverse(),
        }
    }

    #[must_use]
    pub fn length(&self) -> f64 {
        match self {
            Self::Path(p) => p.length(),
            Self::Loop(l) => l.length(),
            Self::Collection(c) => c.entities.iter().map(ExtrusionEntity::length).sum(),
        }
    }

    /// Footprint of the entity.
    #[must_use]
    pub fn grow(&self) -> Vec<Polygon> {
        match self {
            Self::Path(p) => p.grow(),
            Self::Loop(l) => l.grow(),
            Self::Collection(c) => c.entities.iter().flat_map(ExtrusionEntity::grow).collect(),
        }
    }
}

impl From<ExtrusionPath> for ExtrusionEntity {
    fn from(path: ExtrusionPath) -> Self {
        Self::Path(path)
    }
}

impl From<ExtrusionLoop> for ExtrusionEntity {
    fn from(lp: ExtrusionLoop) -> Self {
        Self::Loop(lp)
    }
}

impl From<ExtrusionEntityCollection> for ExtrusionEntity {
    fn from(coll: ExtrusionEntityCollection) -> Self {
        Self::Collection(coll)
    }
}
