//! Eight-way isometric headings.
//!
//! Cardinal keys move straight along the screen axes. Diagonals follow the
//! isometric grid lines: their horizontal component is stretched by
//! `1 + orientation_offset` before the vector is normalised, so every one of
//! the eight headings moves at exactly the requested speed.

use serde::{Deserialize, Serialize};
use spectre_physics::Velocity;

/// Facing direction, also used to pick directional animations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Facing {
    Up,
    Down,
    Left,
    Right,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
}

impl Facing {
    /// All headings, clockwise from up.
    pub const ALL: [Facing; 8] = [
        Facing::Up,
        Facing::UpRight,
        Facing::Right,
        Facing::DownRight,
        Facing::Down,
        Facing::DownLeft,
        Facing::Left,
        Facing::UpLeft,
    ];

    /// Heading for a pair of screen axes, `None` when both are zero.
    pub fn from_axes(x: i8, y: i8) -> Option<Facing> {
        match (x.signum(), y.signum()) {
            (0, -1) => Some(Facing::Up),
            (0, 1) => Some(Facing::Down),
            (-1, 0) => Some(Facing::Left),
            (1, 0) => Some(Facing::Right),
            (-1, -1) => Some(Facing::UpLeft),
            (1, -1) => Some(Facing::UpRight),
            (-1, 1) => Some(Facing::DownLeft),
            (1, 1) => Some(Facing::DownRight),
            _ => None,
        }
    }

    /// Screen axes of this heading.
    pub fn axes(self) -> (i8, i8) {
        match self {
            Facing::Up => (0, -1),
            Facing::Down => (0, 1),
            Facing::Left => (-1, 0),
            Facing::Right => (1, 0),
            Facing::UpLeft => (-1, -1),
            Facing::UpRight => (1, -1),
            Facing::DownLeft => (-1, 1),
            Facing::DownRight => (1, 1),
        }
    }

    /// The heading closest to a screen-space vector. `None` for a zero
    /// vector.
    pub fn from_vector(dx: f64, dy: f64) -> Option<Facing> {
        if dx == 0.0 && dy == 0.0 {
            return None;
        }
        // Angle measured clockwise from screen-up, in eighths of a turn.
        let angle = dx.atan2(-dy).rem_euclid(std::f64::consts::TAU);
        let octant = (angle / std::f64::consts::FRAC_PI_4).round() as usize % 8;
        Some(Facing::ALL[octant])
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Facing::Up => "up",
            Facing::Down => "down",
            Facing::Left => "left",
            Facing::Right => "right",
            Facing::UpLeft => "up-left",
            Facing::UpRight => "up-right",
            Facing::DownLeft => "down-left",
            Facing::DownRight => "down-right",
        }
    }
}

/// Unit vector of a heading under the isometric skew.
pub fn heading(facing: Facing, orientation_offset: f64) -> (f64, f64) {
    let (x, y) = facing.axes();
    let (mut dx, dy) = (x as f64, y as f64);
    if x != 0 && y != 0 {
        dx *= 1.0 + orientation_offset;
    }
    let len = dx.hypot(dy);
    (dx / len, dy / len)
}

/// Velocity of `speed` along `facing`.
pub fn velocity_along(facing: Facing, speed: f64, orientation_offset: f64) -> Velocity {
    let (ux, uy) = heading(facing, orientation_offset);
    Velocity::new(ux * speed, uy * speed)
}

/// Velocity of `speed` pointing from `(dx, dy)` direction, or zero.
pub fn velocity_towards(dx: f64, dy: f64, speed: f64) -> Velocity {
    let len = dx.hypot(dy);
    if len <= f64::EPSILON {
        return Velocity::ZERO;
    }
    Velocity::new(dx / len * speed, dy / len * speed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_headings_have_the_same_speed() {
        for facing in Facing::ALL {
            let v = velocity_along(facing, 120.0, 1.0);
            assert!((v.speed() - 120.0).abs() < 1e-9, "{facing:?}: {}", v.speed());
        }
    }

    #[test]
    fn diagonals_follow_the_grid_slope() {
        let (dx, dy) = heading(Facing::UpRight, 1.0);
        assert!(dx > 0.0 && dy < 0.0);
        assert!((dx / -dy - 2.0).abs() < 1e-9, "2:1 slope expected");
    }

    #[test]
    fn axes_roundtrip() {
        for facing in Facing::ALL {
            let (x, y) = facing.axes();
            assert_eq!(Facing::from_axes(x, y), Some(facing));
        }
        assert_eq!(Facing::from_axes(0, 0), None);
    }

    #[test]
    fn nearest_heading_from_vector() {
        assert_eq!(Facing::from_vector(0.0, -5.0), Some(Facing::Up));
        assert_eq!(Facing::from_vector(3.0, 0.1), Some(Facing::Right));
        assert_eq!(Facing::from_vector(-2.0, 2.0), Some(Facing::DownLeft));
        assert_eq!(Facing::from_vector(0.0, 0.0), None);
    }

    #[test]
    fn towards_zero_vector_is_zero() {
        assert_eq!(velocity_towards(0.0, 0.0, 50.0), Velocity::ZERO);
        let v = velocity_towards(3.0, 4.0, 10.0);
        assert!((v.dx - 6.0).abs() < 1e-9 && (v.dy - 8.0).abs() < 1e-9);
    }
}
