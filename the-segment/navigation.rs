//! Linear order of visible translation units for previous/next selection.
//!
//! An index is a snapshot of one document under one visibility filter. It is
//! cheap to build and must be rebuilt whenever either of them changes, so
//! nothing here caches.

use crate::model::{
  Document,
  TransUnit,
  UnitRef,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
  Backward,
  Forward,
}

impl Direction {
  /// `-1` and `1` map to a direction, anything else does not.
  pub fn from_step(step: i64) -> Option<Self> {
    match step {
      -1 => Some(Self::Backward),
      1 => Some(Self::Forward),
      _ => None,
    }
  }
}

/// Which units a list view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityFilter {
  /// Hide units whose source text is empty or whitespace only.
  pub hide_empty_sources: bool,
}

impl Default for VisibilityFilter {
  fn default() -> Self {
    Self {
      hide_empty_sources: true,
    }
  }
}

impl VisibilityFilter {
  pub fn show_all() -> Self {
    Self {
      hide_empty_sources: false,
    }
  }

  pub fn is_visible(&self, unit: &TransUnit) -> bool {
    !self.hide_empty_sources || !unit.source.is_blank()
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationIndex {
  units: Vec<UnitRef>,
}

impl NavigationIndex {
  pub fn build(document: &Document, visible: impl Fn(&TransUnit) -> bool) -> Self {
    let units = document
      .units()
      .filter(|(_, unit)| visible(*unit))
      .map(|(unit_ref, _)| unit_ref)
      .collect();
    Self { units }
  }

  pub fn with_filter(document: &Document, filter: VisibilityFilter) -> Self {
    Self::build(document, |unit| filter.is_visible(unit))
  }

  pub fn units(&self) -> &[UnitRef] {
    &self.units
  }

  pub fn len(&self) -> usize {
    self.units.len()
  }

  pub fn is_empty(&self) -> bool {
    self.units.is_empty()
  }

  pub fn first(&self) -> Option<UnitRef> {
    self.units.first().copied()
  }

  pub fn position(&self, unit: UnitRef) -> Option<usize> {
    self.units.iter().position(|&candidate| candidate == unit)
  }

  pub fn advance(&self, current: UnitRef, direction: Direction) -> UnitRef {
    advance(&self.units, current, direction)
  }
}

/// Moves one step from `current`, clamping at either end.
///
/// A `current` that is not in `units` (hidden by the filter, or gone after a
/// reload) is returned unchanged.
pub fn advance(units: &[UnitRef], current: UnitRef, direction: Direction) -> UnitRef {
  let Some(idx) = units.iter().position(|&unit| unit == current) else {
    return current;
  };
  let next = match direction {
    Direction::Backward => idx.saturating_sub(1),
    Direction::Forward => (idx + 1).min(units.len() - 1),
  };
  units[next]
}
