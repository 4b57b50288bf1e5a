use crate::model::tile_set::TileSet;
use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Highest pip value in a double-six set.
pub const MAX_PIP: u8 = 6;

/// Number of tiles in the double-six catalog.
pub const TILE_COUNT: usize = 28;

/// A domino tile stored as a canonical unordered pair (`lo <= hi`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tile {
    lo: u8,
    hi: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TileError {
    #[error("invalid tile ({lo}, {hi}): pips must satisfy 0 <= lo <= hi <= {MAX_PIP}")]
    InvalidTile { lo: u8, hi: u8 },
    #[error("cannot parse tile from {0:?}")]
    Parse(String),
}

impl Tile {
    /// Every tile of the catalog in ascending `(lo, hi)` order.
    pub const ALL: [Tile; TILE_COUNT] = build_catalog();

    /// Strict constructor: the pair must already be canonical.
    pub const fn new(lo: u8, hi: u8) -> Result<Self, TileError> {
        if lo <= hi && hi <= MAX_PIP {
            Ok(Self { lo, hi })
        } else {
            Err(TileError::InvalidTile { lo, hi })
        }
    }

    /// Builds a tile from two pips in either order.
    pub fn canonical(a: u8, b: u8) -> Result<Self, TileError> {
        Self::new(a.min(b), a.max(b))
    }

    pub const fn lo(self) -> u8 {
        self.lo
    }

    pub const fn hi(self) -> u8 {
        self.hi
    }

    pub const fn pips(self) -> (u8, u8) {
        (self.lo, self.hi)
    }

    pub const fn is_double(self) -> bool {
        self.lo == self.hi
    }

    pub const fn contains(self, value: u8) -> bool {
        self.lo == value || self.hi == value
    }

    /// Returns the pip opposite `value`, or `None` when the tile does not carry it.
    pub const fn other(self, value: u8) -> Option<u8> {
        if self.lo == value {
            Some(self.hi)
        } else if self.hi == value {
            Some(self.lo)
        } else {
            None
        }
    }

    pub const fn pip_count(self) -> u8 {
        self.lo + self.hi
    }

    /// Dense catalog index in `0..28`, ordered by `(lo, hi)`.
    pub const fn index(self) -> usize {
        let lo = self.lo as usize;
        lo * 7 - lo * lo.saturating_sub(1) / 2 + (self.hi - self.lo) as usize
    }

    pub const fn from_index(index: usize) -> Option<Self> {
        if index < TILE_COUNT {
            Some(Self::ALL[index])
        } else {
            None
        }
    }
}

const fn build_catalog() -> [Tile; TILE_COUNT] {
    let mut tiles = [Tile { lo: 0, hi: 0 }; TILE_COUNT];
    let mut idx = 0;
    let mut lo = 0;
    while lo <= MAX_PIP {
        let mut hi = lo;
        while hi <= MAX_PIP {
            tiles[idx] = Tile { lo, hi };
            idx += 1;
            hi += 1;
        }
        lo += 1;
    }
    tiles
}

const SUITS: [TileSet; 7] = build_suits();

const fn build_suits() -> [TileSet; 7] {
    let mut suits = [TileSet::EMPTY; 7];
    let mut idx = 0;
    while idx < TILE_COUNT {
        let tile = Tile::ALL[idx];
        suits[tile.lo as usize] = suits[tile.lo as usize].with(tile);
        suits[tile.hi as usize] = suits[tile.hi as usize].with(tile);
        idx += 1;
    }
    suits
}

/// The full 28-tile catalog.
pub const fn catalog() -> TileSet {
    TileSet::FULL
}

/// The seven tiles carrying `value`. Pips above six are rejected as `InvalidTile`.
pub const fn suit(value: u8) -> Result<TileSet, TileError> {
    if value > MAX_PIP {
        return Err(TileError::InvalidTile {
            lo: value,
            hi: value,
        });
    }
    Ok(SUITS[value as usize])
}

/// Tiles carrying either pip of `values`; out-of-range pips contribute nothing.
pub(crate) fn suit_union(values: impl IntoIterator<Item = u8>) -> TileSet {
    values
        .into_iter()
        .filter_map(|value| suit(value).ok())
        .fold(TileSet::EMPTY, TileSet::union)
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}|{}]", self.lo, self.hi)
    }
}

impl FromStr for Tile {
    type Err = TileError;

    /// Accepts `[a|b]`, `a|b`, `a-b` or `ab`, in either pip order.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned: String = s
            .chars()
            .filter(|c| !matches!(c, '[' | ']' | ' '))
            .collect();
        let digits: Vec<&str> = if cleaned.contains(['|', '-', ',']) {
            cleaned.split(['|', '-', ',']).collect()
        } else if cleaned.len() == 2 && cleaned.bytes().all(|b| b.is_ascii_digit()) {
            vec![&cleaned[..1], &cleaned[1..]]
        } else {
            return Err(TileError::Parse(s.to_string()));
        };
        let [a, b] = digits.as_slice() else {
            return Err(TileError::Parse(s.to_string()));
        };
        let a: u8 = a.parse().map_err(|_| TileError::Parse(s.to_string()))?;
        let b: u8 = b.parse().map_err(|_| TileError::Parse(s.to_string()))?;
        Self::canonical(a, b)
    }
}

impl TryFrom<String> for Tile {
    type Error = TileError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Tile> for String {
    fn from(tile: Tile) -> Self {
        tile.to_string()
    }
}
