use glam::IVec2;

/// One of the 8 compass neighbors of a grid cell. Y-up convention:
/// North = (0, +1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
    North = 0,
    NorthEast = 1,
    East = 2,
    SouthEast = 3,
    South = 4,
    SouthWest = 5,
    West = 6,
    NorthWest = 7,
}

/// All 8 directions, clockwise from North. The discriminant doubles as
/// the bit index in a cell's link mask.
pub const ALL_DIRECTIONS: [Direction; 8] = [
    Direction::North,
    Direction::NorthEast,
    Direction::East,
    Direction::SouthEast,
    Direction::South,
    Direction::SouthWest,
    Direction::West,
    Direction::NorthWest,
];

/// Directions a scanline flood fill seeds from after walking a row:
/// everything except due east and due west.
pub const VERTICAL_DIRECTIONS: [Direction; 6] = [
    Direction::North,
    Direction::NorthEast,
    Direction::NorthWest,
    Direction::South,
    Direction::SouthEast,
    Direction::SouthWest,
];

/// The four directions whose links are owned by the cell (the other four
/// are the same edges seen from the neighbor). Iterating these over every
/// cell visits each link exactly once.
pub const FORWARD_DIRECTIONS: [Direction; 4] = [
    Direction::North,
    Direction::NorthEast,
    Direction::East,
    Direction::SouthEast,
];

impl Direction {
    /// Offset vector for this direction.
    pub fn offset(self) -> IVec2 {
        match self {
            Direction::North => IVec2::new(0, 1),
            Direction::NorthEast => IVec2::new(1, 1),
            Direction::East => IVec2::new(1, 0),
            Direction::SouthEast => IVec2::new(1, -1),
            Direction::South => IVec2::new(0, -1),
            Direction::SouthWest => IVec2::new(-1, -1),
            Direction::West => IVec2::new(-1, 0),
            Direction::NorthWest => IVec2::new(-1, 1),
        }
    }

    /// The direction pointing back at this cell from the neighbor.
    pub fn opposite(self) -> Direction {
        ALL_DIRECTIONS[(self as usize + 4) % 8]
    }

    /// Bit for this direction in an 8-bit link mask.
    pub fn bit(self) -> u8 {
        1 << (self as u8)
    }

    /// Whether this is a diagonal neighbor.
    pub fn is_diagonal(self) -> bool {
        (self as u8) % 2 == 1
    }
}
