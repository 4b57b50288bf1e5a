use core::fmt;
use serde::{Deserialize, Serialize};

/// Seats at the table in clockwise turn order. South is the observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Player {
    South = 0,
    West = 1,
    North = 2,
    East = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    NorthSouth,
    WestEast,
}

impl Player {
    pub const LOOP: [Player; 4] = [Player::South, Player::West, Player::North, Player::East];

    /// Seats whose hands are hidden from the observer, in inference order.
    pub const OPPONENTS: [Player; 3] = [Player::West, Player::North, Player::East];

    pub const OBSERVER: Player = Player::South;

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Player::South),
            1 => Some(Player::West),
            2 => Some(Player::North),
            3 => Some(Player::East),
            _ => None,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Position within [`Player::OPPONENTS`], `None` for the observer.
    pub const fn opponent_slot(self) -> Option<usize> {
        match self {
            Player::South => None,
            Player::West => Some(0),
            Player::North => Some(1),
            Player::East => Some(2),
        }
    }

    pub const fn is_observer(self) -> bool {
        matches!(self, Player::South)
    }

    pub const fn next(self) -> Player {
        match self {
            Player::South => Player::West,
            Player::West => Player::North,
            Player::North => Player::East,
            Player::East => Player::South,
        }
    }

    pub const fn partner(self) -> Player {
        match self {
            Player::South => Player::North,
            Player::West => Player::East,
            Player::North => Player::South,
            Player::East => Player::West,
        }
    }

    pub const fn team(self) -> Team {
        match self {
            Player::South | Player::North => Team::NorthSouth,
            Player::West | Player::East => Team::WestEast,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Player::South => "South",
            Player::West => "West",
            Player::North => "North",
            Player::East => "East",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::{Player, Team};

    #[test]
    fn next_wraps_around() {
        assert_eq!(Player::South.next(), Player::West);
        assert_eq!(Player::East.next(), Player::South);
    }

    #[test]
    fn index_roundtrip() {
        for (i, seat) in Player::LOOP.iter().enumerate() {
            assert_eq!(Player::from_index(i), Some(*seat));
            assert_eq!(seat.index(), i);
        }
        assert_eq!(Player::from_index(4), None);
    }

    #[test]
    fn opponent_slots_follow_turn_order() {
        assert_eq!(Player::South.opponent_slot(), None);
        for (slot, seat) in Player::OPPONENTS.iter().enumerate() {
            assert_eq!(seat.opponent_slot(), Some(slot));
        }
    }

    #[test]
    fn teams_pair_partners() {
        assert_eq!(Player::South.team(), Team::NorthSouth);
        assert_eq!(Player::North.team(), Team::NorthSouth);
        assert_eq!(Player::West.team(), Team::WestEast);
        for seat in Player::LOOP {
            assert_eq!(seat.partner().team(), seat.team());
            assert_eq!(seat.partner().partner(), seat);
        }
    }
}
