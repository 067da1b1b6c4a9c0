//! Nesting of perimeter loops into a forest.
//!
//! Loops live in a flat arena and refer to each other by [`LoopId`]. Roots are
//! the depth-0 contours; every other loop hangs below the loop that encloses
//! it.

use slotmap::SlotMap;
use tracing::warn;

use crate::geometry::Polygon;

slotmap::new_key_type! {
    /// Identifier of a loop inside a [`LoopForest`].
    pub struct LoopId;
}

/// One closed perimeter at a given inset depth.
#[derive(Debug, Clone, PartialEq)]
pub struct PerimeterLoop {
    pub polygon: Polygon,
    /// Inset depth, 0 for the external perimeter.
    pub depth: usize,
    /// `true` for a contour (CCW), `false` for a hole (CW).
    pub is_contour: bool,
    pub parent: Option<LoopId>,
    pub children: Vec<LoopId>,
}

impl PerimeterLoop {
    #[must_use]
    pub fn is_external(&self) -> bool {
        self.depth == 0
    }
}

/// Arena of nested perimeter loops.
#[derive(Debug, Default, Clone)]
pub struct LoopForest {
    loops: SlotMap<LoopId, PerimeterLoop>,
    roots: Vec<LoopId>,
}

impl LoopForest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the forest from loops grouped by depth.
    ///
    /// `contours[d]` and `holes[d]` hold the loops generated at depth `d`.
    /// A hole is parented by a deeper hole containing its first point, or
    /// failing that by the deepest contour containing it. A contour is
    /// parented by the nearest shallower contour containing its first point.
    /// Depth-0 contours become roots; other unparented loops are dropped.
    #[must_use]
    pub fn nest(contours: &[Vec<Polygon>], holes: &[Vec<Polygon>]) -> Self {
        let mut forest = Self::new();
        let levels = contours.len().max(holes.len());

        let mut contour_ids: Vec<Vec<LoopId>> = vec![Vec::new(); levels];
        let mut hole_ids: Vec<Vec<LoopId>> = vec![Vec::new(); levels];
        for d in 0..levels {
            for polygon in contours.get(d).into_iter().flatten() {
                contour_ids[d].push(forest.insert(polygon.clone(), d, true));
            }
            for polygon in holes.get(d).into_iter().flatten() {
                hole_ids[d].push(forest.insert(polygon.clone(), d, false));
            }
        }

        // Holes first.
        for d in 0..levels {
            for &hole in &hole_ids[d] {
                let probe = forest.loops[hole].polygon.first_point();
                let parent = hole_ids[d + 1..]
                    .iter()
                    .flatten()
                    .chain(contour_ids.iter().rev().flatten())
                    .copied()
                    .find(|&candidate| forest.loops[candidate].polygon.contains(&probe));
                match parent {
                    Some(parent) => forest.attach(hole, parent),
                    None => warn!(depth = d, "hole loop has no enclosing loop, dropped"),
                }
            }
        }

        // Then contours, deepest first.
        for d in (1..levels).rev() {
            for &contour in &contour_ids[d] {
                let probe = forest.loops[contour].polygon.first_point();
                let parent = contour_ids[..d]
                    .iter()
                    .rev()
                    .flatten()
                    .copied()
                    .find(|&candidate| forest.loops[candidate].polygon.contains(&probe));
                match parent {
                    Some(parent) => forest.attach(contour, parent),
                    None => warn!(depth = d, "contour loop has no enclosing contour, dropped"),
                }
            }
        }

        forest.roots = contour_ids.first().cloned().unwrap_or_default();
        forest.prune_unreachable();
        forest
    }

    fn insert(&mut self, polygon: Polygon, depth: usize, is_contour: bool) -> LoopId {
        self.loops.insert(PerimeterLoop {
            polygon,
            depth,
            is_contour,
            parent: None,
            children: Vec::new(),
        })
    }

    fn attach(&mut self, child: LoopId, parent: LoopId) {
        self.loops[child].parent = Some(parent);
        self.loops[parent].children.push(child);
    }

    fn prune_unreachable(&mut self) {
        let mut reachable = std::collections::HashSet::new();
        for &root in &self.roots {
            reachable.insert(root);
            reachable.extend(self.descendants(root));
        }
        self.loops.retain(|id, _| reachable.contains(&id));
    }

    #[must_use]
    pub fn get(&self, id: LoopId) -> Option<&PerimeterLoop> {
        self.loops.get(id)
    }

    /// Depth-0 contours in generation order.
    #[must_use]
    pub fn roots(&self) -> &[LoopId] {
        &self.roots
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.loops.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (LoopId, &PerimeterLoop)> {
        self.loops.iter()
    }

    /// A contour enclosing no other contour.
    #[must_use]
    pub fn is_internal_contour(&self, id: LoopId) -> bool {
        let Some(lp) = self.loops.get(id) else {
            return false;
        };
        lp.is_contour
            && lp
                .children
                .iter()
                .all(|&c| self.loops.get(c).is_some_and(|child| !child.is_contour))
    }

    /// Every loop below `id`, in pre-order.
    #[must_use]
    pub fn descendants(&self, id: LoopId) -> Vec<LoopId> {
        let mut out = Vec::new();
        let mut stack: Vec<LoopId> = self
            .loops
            .get(id)
            .map(|lp| lp.children.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(next) = stack.pop() {
            out.push(next);
            if let Some(lp) = self.loops.get(next) {
                stack.extend(lp.children.iter().rev().copied());
            }
        }
        out
    }

    /// Chain of ancestors from the parent of `id` up to its root.
    #[must_use]
    pub fn ancestors(&self, id: LoopId) -> Vec<LoopId> {
        let mut out = Vec::new();
        let mut cur = self.loops.get(id).and_then(|lp| lp.parent);
        while let Some(p) = cur {
            if out.contains(&p) || out.len() > self.loops.len() {
                break;
            }
            out.push(p);
            cur = self.loops.get(p).and_then(|lp| lp.parent);
        }
        out
    }
}
