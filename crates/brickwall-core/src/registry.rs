//! Authoritative brick state.
//!
//! The [`Registry`] is the single source of truth for every brick. Its id
//! set is fixed when it is built from the grid dimensions; nothing is added
//! or removed afterwards. It stores state only: scheduling resets and
//! notifying sessions happen elsewhere.

use std::collections::HashMap;

use brickwall_types::{BrickId, BrickState, WallSnapshot};

use crate::config::GridConfig;
use crate::timer::ResetHandle;

/// One brick's authoritative record.
#[derive(Debug)]
pub struct Element {
    fallen: bool,
    pending_reset: Option<ResetHandle>,
}

impl Element {
    const fn upright() -> Self {
        Self {
            fallen: false,
            pending_reset: None,
        }
    }

    /// Whether the brick is down.
    pub const fn is_fallen(&self) -> bool {
        self.fallen
    }

    /// The outstanding reset, if one is scheduled.
    pub const fn pending_reset(&self) -> Option<&ResetHandle> {
        self.pending_reset.as_ref()
    }

    /// Public projection of this record.
    pub const fn state(&self) -> BrickState {
        BrickState {
            fallen: self.fallen,
        }
    }
}

/// Fixed table of every brick in the wall.
#[derive(Debug)]
pub struct Registry {
    elements: HashMap<BrickId, Element>,
}

impl Registry {
    /// Build a registry with one upright brick per grid cell.
    pub fn new(grid: GridConfig) -> Self {
        let capacity = usize::from(grid.columns).saturating_mul(usize::from(grid.rows));
        let mut elements = HashMap::with_capacity(capacity);
        for row in 0..grid.rows {
            for col in 0..grid.columns {
                elements.insert(BrickId::new(col, row), Element::upright());
            }
        }
        Self { elements }
    }

    /// Look up a brick.
    pub fn get(&self, id: &BrickId) -> Option<&Element> {
        self.elements.get(id)
    }

    /// Number of bricks.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the wall has no bricks at all.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Number of bricks currently down.
    pub fn fallen_count(&self) -> usize {
        self.elements.values().filter(|e| e.fallen).count()
    }

    /// Independent copy of every brick's public state.
    pub fn snapshot(&self) -> WallSnapshot {
        self.elements
            .iter()
            .map(|(id, element)| (id.clone(), element.state()))
            .collect()
    }

    /// Set a brick's `fallen` flag.
    ///
    /// Unknown ids are ignored. Raising a brick also drops its pending
    /// reset handle. Returns whether the id was known.
    pub fn set_fallen(&mut self, id: &BrickId, fallen: bool) -> bool {
        let Some(element) = self.elements.get_mut(id) else {
            return false;
        };
        element.fallen = fallen;
        if !fallen {
            element.pending_reset = None;
        }
        true
    }

    /// Store the reset handle of a fallen brick.
    ///
    /// # Errors
    ///
    /// Hands the handle back if the brick is unknown, upright, or already
    /// has a reset pending.
    pub fn attach_reset(&mut self, id: &BrickId, handle: ResetHandle) -> Result<(), ResetHandle> {
        match self.elements.get_mut(id) {
            Some(element) if element.fallen && element.pending_reset.is_none() => {
                element.pending_reset = Some(handle);
                Ok(())
            }
            _ => Err(handle),
        }
    }

    /// Remove every pending reset handle, leaving `fallen` flags untouched.
    pub fn drain_resets(&mut self) -> Vec<ResetHandle> {
        self.elements
            .values_mut()
            .filter_map(|element| element.pending_reset.take())
            .collect()
    }
}
