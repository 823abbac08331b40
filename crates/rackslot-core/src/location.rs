//! Locations: a (shelf, level) pair identifying one physical slot.
//!
//! Operators type or scan codes such as `C7`, `c12`, `C1-L5`, `C1 L5` or
//! `C1_L5`. [`parse_location`] turns that text into a [`ParsedLocation`]
//! whose level may be absent; the [`resolver`](crate::resolver) fills it in.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};

/// A shelf label in canonical form `C<number>` (no leading zeros).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Shelf(u8);

impl Shelf {
    pub const fn new(number: u8) -> Self {
        Self(number)
    }

    pub const fn number(&self) -> u8 {
        self.0
    }
}

impl fmt::Debug for Shelf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Shelf(C{})", self.0)
    }
}

impl fmt::Display for Shelf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C{}", self.0)
    }
}

impl FromStr for Shelf {
    type Err = CoreError;

    /// Parse a bare shelf label (`C7`, `c07`).
    fn from_str(s: &str) -> Result<Self> {
        match parse_location(s)? {
            ParsedLocation { shelf, level: None } => Ok(shelf),
            ParsedLocation { level: Some(_), .. } => {
                Err(CoreError::InvalidLocationText(s.trim().to_string()))
            }
        }
    }
}

/// A level within a shelf. Level 1 is the bottom.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Level(u8);

impl Level {
    pub const fn new(rank: u8) -> Self {
        Self(rank)
    }

    pub const fn get(&self) -> u8 {
        self.0
    }
}

impl fmt::Debug for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Level({})", self.0)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One physical slot. Equal iff shelf and level match.
///
/// Ordered by shelf, then level, so a `BTreeMap<Location, _>` groups a
/// shelf's levels together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    pub shelf: Shelf,
    pub level: Level,
}

impl Location {
    pub const fn new(shelf: Shelf, level: Level) -> Self {
        Self { shelf, level }
    }

    /// Shorthand used heavily in tests and fixtures.
    pub const fn at(shelf: u8, level: u8) -> Self {
        Self::new(Shelf::new(shelf), Level::new(level))
    }

    /// The persisted slot id, e.g. `C7_L3`.
    pub fn slot_id(&self) -> String {
        format!("{}_L{}", self.shelf, self.level)
    }

    /// Parse a persisted slot id back into a location.
    pub fn from_slot_id(slot_id: &str) -> Result<Self> {
        let invalid = || CoreError::InvalidSlotId(slot_id.to_string());

        let (shelf, level) = slot_id.rsplit_once("_L").ok_or_else(invalid)?;
        let shelf = shelf
            .strip_prefix('C')
            .filter(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|n| n.parse::<u8>().ok())
            .ok_or_else(invalid)?;
        if level.is_empty() || !level.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let level = level.parse::<u8>().map_err(|_| invalid())?;

        Ok(Self::at(shelf, level))
    }
}

impl fmt::Display for Location {
    /// Human form, accepted back by [`parse_location`].
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-L{}", self.shelf, self.level)
    }
}

/// The result of parsing operator input: the level may be omitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedLocation {
    pub shelf: Shelf,
    pub level: Option<Level>,
}

impl ParsedLocation {
    /// The full location, if a level was given.
    pub fn location(&self) -> Option<Location> {
        self.level.map(|level| Location::new(self.shelf, level))
    }
}

impl FromStr for ParsedLocation {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        parse_location(s)
    }
}

impl From<Location> for ParsedLocation {
    fn from(location: Location) -> Self {
        Self {
            shelf: location.shelf,
            level: Some(location.level),
        }
    }
}

/// Parse a shelf code with an optional level.
///
/// Grammar, case-insensitive with surrounding whitespace ignored:
///
/// ```text
/// location := "C" digit{1,2} [ ws* sep? ws* "L" digit ]
/// sep      := "-" | "_" | " "
/// ```
///
/// ```
/// use rackslot_core::{parse_location, Level, Shelf};
///
/// let parsed = parse_location(" c07_l5 ").unwrap();
/// assert_eq!(parsed.shelf, Shelf::new(7));
/// assert_eq!(parsed.level, Some(Level::new(5)));
/// assert!(parse_location("Z9").is_err());
/// ```
pub fn parse_location(text: &str) -> Result<ParsedLocation> {
    let trimmed = text.trim();
    let invalid = || CoreError::InvalidLocationText(trimmed.to_string());

    let upper = trimmed.to_ascii_uppercase();
    let rest = upper.strip_prefix('C').ok_or_else(invalid)?;

    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if !(1..=2).contains(&digits) {
        return Err(invalid());
    }
    let shelf = Shelf::new(rest[..digits].parse().map_err(|_| invalid())?);

    let tail = &rest[digits..];
    if tail.is_empty() {
        return Ok(ParsedLocation { shelf, level: None });
    }

    // A space separator is absorbed by the surrounding whitespace.
    let tail = tail.trim_start();
    let tail = tail.strip_prefix(|c: char| c == '-' || c == '_').unwrap_or(tail);
    let tail = tail.trim_start();

    let level = tail.strip_prefix('L').ok_or_else(invalid)?;
    match level.as_bytes() {
        [d] if d.is_ascii_digit() => Ok(ParsedLocation {
            shelf,
            level: Some(Level::new(d - b'0')),
        }),
        _ => Err(invalid()),
    }
}

/// An ephemeral request to move a whole slot. Source and target differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelocationRequest {
    source: Location,
    target: Location,
}

impl RelocationRequest {
    pub fn new(source: Location, target: Location) -> Result<Self> {
        if source == target {
            return Err(CoreError::InvalidRequest(source));
        }
        Ok(Self { source, target })
    }

    pub fn source(&self) -> Location {
        self.source
    }

    pub fn target(&self) -> Location {
        self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(shelf: u8, level: Option<u8>) -> ParsedLocation {
        ParsedLocation {
            shelf: Shelf::new(shelf),
            level: level.map(Level::new),
        }
    }

    #[test]
    fn test_parse_shelf_only() {
        assert_eq!(parse_location("c1").unwrap(), parsed(1, None));
        assert_eq!(parse_location("C12").unwrap(), parsed(12, None));
        assert_eq!(parse_location("  C07 ").unwrap(), parsed(7, None));
    }

    #[test]
    fn test_parse_with_level_separators() {
        let expected = parsed(1, Some(5));
        for text in ["C1-L5", "C1 L5", "C1_L5", "C1L5", "c1-l5", "C1 - L5", "C1  L5"] {
            assert_eq!(parse_location(text).unwrap(), expected, "input {text:?}");
        }
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for text in ["", "   ", "Z9", "C", "C123", "C1-", "C1-L", "C1-L12", "C1--L5", "L5", "C1 X5", "CC1"] {
            assert!(
                matches!(parse_location(text), Err(CoreError::InvalidLocationText(_))),
                "input {text:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_shelf_from_str_requires_bare_shelf() {
        assert_eq!("c38".parse::<Shelf>().unwrap(), Shelf::new(38));
        assert!("C3-L1".parse::<Shelf>().is_err());
    }

    #[test]
    fn test_slot_id_roundtrip() {
        let location = Location::at(7, 3);
        assert_eq!(location.slot_id(), "C7_L3");
        assert_eq!(Location::from_slot_id("C7_L3").unwrap(), location);
        assert_eq!(location.to_string(), "C7-L3");
        assert_eq!(parse_location(&location.to_string()).unwrap().location(), Some(location));
    }

    #[test]
    fn test_from_slot_id_rejects_malformed() {
        for id in ["", "C7", "C7_L", "X7_L3", "C_L3", "C7_Lx", "C7-L3"] {
            assert!(Location::from_slot_id(id).is_err(), "slot id {id:?}");
        }
    }

    #[test]
    fn test_relocation_request_rejects_same_slot() {
        let here = Location::at(4, 2);
        assert_eq!(
            RelocationRequest::new(here, here),
            Err(CoreError::InvalidRequest(here))
        );
        let request = RelocationRequest::new(here, Location::at(4, 1)).unwrap();
        assert_eq!(request.target(), Location::at(4, 1));
    }

    #[test]
    fn test_location_ordering_groups_shelves() {
        let mut locations = vec![Location::at(2, 1), Location::at(1, 5), Location::at(1, 1)];
        locations.sort();
        assert_eq!(locations, vec![Location::at(1, 1), Location::at(1, 5), Location::at(2, 1)]);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn slot_id_round_trips(shelf in 1u8..=99, level in 0u8..=9) {
                let location = Location::at(shelf, level);
                prop_assert_eq!(Location::from_slot_id(&location.slot_id()).unwrap(), location);
                prop_assert_eq!(
                    parse_location(&location.to_string()).unwrap().location(),
                    Some(location)
                );
            }

            #[test]
            fn parse_never_panics(text in "\\PC{0,12}") {
                let _ = parse_location(&text);
            }
        }
    }
}
