//! Location resolution: fill in an omitted level by handling policy.
//!
//! A source defaults to the topmost occupied level, a target to the
//! bottommost empty one. An explicit level is always returned unchanged,
//! even if that level is empty (for a source) or occupied (for a target).

use crate::error::{CoreError, Result};
use crate::location::{parse_location, Level, Location, ParsedLocation, RelocationRequest, Shelf};
use crate::occupancy::OccupancyIndex;
use crate::types::Grid;

/// Resolve the level to take stock from.
///
/// `levels_top_down` lists the shelf's levels in descending rank.
pub fn resolve_source(
    shelf: Shelf,
    level: Option<Level>,
    index: &OccupancyIndex,
    levels_top_down: &[Level],
) -> Result<Level> {
    if let Some(level) = level {
        return Ok(level);
    }
    levels_top_down
        .iter()
        .copied()
        .find(|&level| index.is_occupied(&Location::new(shelf, level)))
        .ok_or(CoreError::NoStockAtShelf(shelf))
}

/// Resolve the level to put stock on.
///
/// Scans `levels_top_down` in reverse, i.e. bottom first.
pub fn resolve_target(
    shelf: Shelf,
    level: Option<Level>,
    index: &OccupancyIndex,
    levels_top_down: &[Level],
) -> Result<Level> {
    if let Some(level) = level {
        return Ok(level);
    }
    levels_top_down
        .iter()
        .rev()
        .copied()
        .find(|&level| !index.is_occupied(&Location::new(shelf, level)))
        .ok_or(CoreError::TargetFull(shelf))
}

/// Resolver over one occupancy snapshot and grid.
pub struct Resolver<'a> {
    index: &'a OccupancyIndex,
    levels_top_down: Vec<Level>,
}

impl<'a> Resolver<'a> {
    pub fn new(grid: &Grid, index: &'a OccupancyIndex) -> Self {
        Self {
            index,
            levels_top_down: grid.levels_top_down(),
        }
    }

    pub fn source(&self, parsed: ParsedLocation) -> Result<Location> {
        let level = resolve_source(parsed.shelf, parsed.level, self.index, &self.levels_top_down)?;
        Ok(Location::new(parsed.shelf, level))
    }

    pub fn target(&self, parsed: ParsedLocation) -> Result<Location> {
        let level = resolve_target(parsed.shelf, parsed.level, self.index, &self.levels_top_down)?;
        Ok(Location::new(parsed.shelf, level))
    }

    /// Parse and resolve scanned source text.
    pub fn source_from_text(&self, text: &str) -> Result<Location> {
        self.source(parse_location(text)?)
    }

    /// Parse and resolve scanned target text.
    pub fn target_from_text(&self, text: &str) -> Result<Location> {
        self.target(parse_location(text)?)
    }

    /// Resolve both scans into a relocation request.
    pub fn request_from_text(&self, source: &str, target: &str) -> Result<RelocationRequest> {
        let source = self.source_from_text(source)?;
        let target = self.target_from_text(target)?;
        RelocationRequest::new(source, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::InventoryEntry;
    use crate::types::ItemKey;

    fn entry(key: &str) -> InventoryEntry {
        InventoryEntry::new(ItemKey::new(key).unwrap(), 1)
    }

    fn index(occupied: &[(u8, u8)]) -> OccupancyIndex {
        occupied
            .iter()
            .map(|&(shelf, level)| (Location::at(shelf, level), entry("e")))
            .collect()
    }

    fn levels() -> Vec<Level> {
        Grid::default().levels_top_down()
    }

    #[test]
    fn test_source_defaults_to_topmost_occupied() {
        let index = index(&[(1, 4), (1, 2)]);
        let level = resolve_source(Shelf::new(1), None, &index, &levels()).unwrap();
        assert_eq!(level, Level::new(4));
    }

    #[test]
    fn test_source_without_stock_fails() {
        let index = index(&[(2, 3)]);
        assert_eq!(
            resolve_source(Shelf::new(1), None, &index, &levels()),
            Err(CoreError::NoStockAtShelf(Shelf::new(1)))
        );
    }

    #[test]
    fn test_explicit_source_level_kept_even_when_empty() {
        let index = index(&[(1, 4)]);
        let level = resolve_source(Shelf::new(1), Some(Level::new(2)), &index, &levels()).unwrap();
        assert_eq!(level, Level::new(2));
    }

    #[test]
    fn test_target_defaults_to_bottommost_empty() {
        let index = index(&[(2, 1)]);
        let level = resolve_target(Shelf::new(2), None, &index, &levels()).unwrap();
        assert_eq!(level, Level::new(2));
    }

    #[test]
    fn test_full_shelf_rejected_as_target() {
        let index = index(&[(2, 1), (2, 2), (2, 3), (2, 4), (2, 5)]);
        assert_eq!(
            resolve_target(Shelf::new(2), None, &index, &levels()),
            Err(CoreError::TargetFull(Shelf::new(2)))
        );
        // An explicit level is not checked.
        let level = resolve_target(Shelf::new(2), Some(Level::new(3)), &index, &levels()).unwrap();
        assert_eq!(level, Level::new(3));
    }

    #[test]
    fn test_resolver_from_text() {
        let index = index(&[(5, 4)]);
        let grid = Grid::default();
        let resolver = Resolver::new(&grid, &index);

        let request = resolver.request_from_text("c5", "C5").unwrap();
        assert_eq!(request.source(), Location::at(5, 4));
        assert_eq!(request.target(), Location::at(5, 1));

        assert!(matches!(
            resolver.source_from_text("Z9"),
            Err(CoreError::InvalidLocationText(_))
        ));
        assert_eq!(
            resolver.request_from_text("C5-L4", "C5_L4"),
            Err(CoreError::InvalidRequest(Location::at(5, 4)))
        );
    }
}
