//! Motion and sensor value types

use std::fmt;

/// Motion command direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
    Stop,
}

impl Direction {
    /// True for `Left` and `Right`.
    #[inline]
    pub fn is_turn(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }

    /// Mirror a turn; non-turns are returned unchanged.
    #[inline]
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            other => other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Backward => "backward",
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Stop => "stop",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Obstacle-presence flags from one sensor read (`true` = blocked)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SensorSnapshot {
    pub center: bool,
    pub left: bool,
    pub right: bool,
}

impl SensorSnapshot {
    /// Create new snapshot
    pub fn new(center: bool, left: bool, right: bool) -> Self {
        Self {
            center,
            left,
            right,
        }
    }

    /// Nothing detected on any side
    pub fn clear() -> Self {
        Self::default()
    }

    /// Every side blocked
    pub fn boxed_in() -> Self {
        Self::new(true, true, true)
    }

    /// Side that is currently open, preferring left when both are.
    pub fn open_side(&self) -> Option<Direction> {
        if !self.left {
            Some(Direction::Left)
        } else if !self.right {
            Some(Direction::Right)
        } else {
            None
        }
    }
}

impl fmt::Display for SensorSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |blocked: bool| if blocked { 'X' } else { '.' };
        write!(
            f,
            "[L{} C{} R{}]",
            flag(self.left),
            flag(self.center),
            flag(self.right)
        )
    }
}
