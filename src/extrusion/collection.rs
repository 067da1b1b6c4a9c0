use crate::geometry::Point;

use super::ExtrusionEntity;

/// An ordered group of extrusion entities.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtrusionEntityCollection {
    pub entities: Vec<ExtrusionEntity>,
    /// Keep the current order when chaining.
    pub no_sort: bool,
}

impl ExtrusionEntityCollection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn append(&mut self, entity: impl Into<ExtrusionEntity>) {
        self.entities.push(entity.into());
    }

    pub fn extend(&mut self, entities: impl IntoIterator<Item = ExtrusionEntity>) {
        self.entities.extend(entities);
    }

    #[must_use]
    pub fn first_point(&self) -> Point {
        self.entities.first().map(ExtrusionEntity::first_point).unwrap_or_default()
    }

    #[must_use]
    pub fn last_point(&self) -> Point {
        self.entities.last().map(ExtrusionEntity::last_point).unwrap_or_default()
    }

    /// Reverses the order of entities and each reversible entity.
    pub fn reverse(&mut self) {
        for entity in &mut self.entities {
            if entity.can_reverse() {
                entity.reverse();
            }
        }
        self.entities.reverse();
    }

    /// All non-collection entities, depth first.
    #[must_use]
    pub fn flatten(&self) -> ExtrusionEntityCollection {
        let mut out = ExtrusionEntityCollection::new();
        let mut stack: Vec<&ExtrusionEntity> = self.entities.iter().rev().collect();
        while let Some(entity) = stack.pop() {
            match entity {
                ExtrusionEntity::Collection(inner) => stack.extend(inner.entities.iter().rev()),
                other => out.entities.push(other.clone()),
            }
        }
        out
    }

    /// Number of leaf entities.
    #[must_use]
    pub fn items_count(&self) -> usize {
        self.flatten().len()
    }
}

/// Visiting order of `entities` for a greedy nearest-neighbour walk from
/// `start`, as `(index, reversed)` pairs.
#[must_use]
pub fn chain_order(entities: &[ExtrusionEntity], start: Point) -> Vec<(usize, bool)> {
    let mut remaining: Vec<usize> = (0..entities.len()).collect();
    let mut order = Vec::with_capacity(entities.len());
    let mut current = start;
    while !remaining.is_empty() {
        let mut best = (0, false, f64::INFINITY);
        for (slot, &i) in remaining.iter().enumerate() {
            let entity = &entities[i];
            let d = current.distance_to_sq(&entity.first_point());
            if d < best.2 {
                best = (slot, false, d);
            }
            if entity.can_reverse() {
                let d = current.distance_to_sq(&entity.last_point());
                if d < best.2 {
                    best = (slot, true, d);
                }
            }
        }
        let i = remaining.remove(best.0);
        let entity = &entities[i];
        current = if best.1 { entity.first_point() } else { entity.last_point() };
        order.push((i, best.1));
    }
    order
}
