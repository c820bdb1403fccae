use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub fn orientation(self) -> Orientation {
        match self {
            Direction::Left | Direction::Right => Orientation::Horizontal,
            Direction::Up | Direction::Down => Orientation::Vertical,
        }
    }

    /// Unit vector in screen coordinates (y grows downwards).
    pub fn unit_vector(self) -> (f64, f64) {
        match self {
            Direction::Left => (-1.0, 0.0),
            Direction::Right => (1.0, 0.0),
            Direction::Up => (0.0, -1.0),
            Direction::Down => (0.0, 1.0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn parses_from_cli_strings() {
        assert_eq!(Direction::from_str("left").unwrap(), Direction::Left);
        assert_eq!(Direction::from_str("DOWN").unwrap(), Direction::Down);
        assert!(Direction::from_str("sideways").is_err());
        assert_eq!(Direction::Up.to_string(), "up");
    }

    #[test]
    fn opposite_flips_orientation_sign_only() {
        for dir in [Direction::Left, Direction::Right, Direction::Up, Direction::Down] {
            let (x, y) = dir.unit_vector();
            let (ox, oy) = dir.opposite().unit_vector();
            assert_eq!((x, y), (-ox, -oy));
            assert_eq!(dir.orientation(), dir.opposite().orientation());
        }
    }
}
