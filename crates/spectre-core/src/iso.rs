//! Isometric projection helpers.
//!
//! Ground (cartesian) coordinates map to screen coordinates on a 2:1 diamond
//! grid. Every body in the physics world lives in screen space; AI distances
//! are measured back on the ground so a diagonal approach is not
//! foreshortened.

use spectre_physics::Position;

/// Project a ground point to screen space.
pub fn cart_to_iso(x: f64, y: f64) -> (f64, f64) {
    (x - y, (x + y) / 2.0)
}

/// Inverse of [`cart_to_iso`].
pub fn iso_to_cart(sx: f64, sy: f64) -> (f64, f64) {
    (sy + sx / 2.0, sy - sx / 2.0)
}

/// Ground distance between two screen-space points.
pub fn iso_distance(a: Position, b: Position) -> f64 {
    let (ax, ay) = iso_to_cart(a.x, a.y);
    let (bx, by) = iso_to_cart(b.x, b.y);
    (ax - bx).hypot(ay - by)
}

/// Render depth of something standing at screen `y`. Larger draws in front.
pub fn depth(y: f64) -> f64 {
    y
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_roundtrips() {
        for &(x, y) in &[(0.0, 0.0), (32.0, 0.0), (0.0, 32.0), (-17.5, 240.25)] {
            let (sx, sy) = cart_to_iso(x, y);
            let (cx, cy) = iso_to_cart(sx, sy);
            assert!((cx - x).abs() < 1e-9 && (cy - y).abs() < 1e-9);
        }
    }

    #[test]
    fn tile_axes_project_to_diamond() {
        assert_eq!(cart_to_iso(32.0, 0.0), (32.0, 16.0));
        assert_eq!(cart_to_iso(0.0, 32.0), (-32.0, 16.0));
    }

    #[test]
    fn ground_distance_ignores_screen_foreshortening() {
        let origin = Position::new(0.0, 0.0);
        // One tile along each ground axis.
        let (ex, ey) = cart_to_iso(32.0, 0.0);
        let (nx, ny) = cart_to_iso(0.0, 32.0);
        let east = iso_distance(origin, Position::new(ex, ey));
        let north = iso_distance(origin, Position::new(nx, ny));
        assert!((east - 32.0).abs() < 1e-9);
        assert!((north - 32.0).abs() < 1e-9);

        // Straight down on screen is a ground diagonal, longer than it looks.
        let down = iso_distance(origin, Position::new(0.0, 16.0));
        assert!(down > 16.0);
    }
}
