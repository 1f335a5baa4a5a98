use crate::limits::{CANVAS_SIZE, GRID_STEP};
use crate::model::{Position, Rect};

use super::Occupancy;

/// First-fit raster search for a free `width × height` slot.
///
/// Candidates are the `GRID_STEP` lattice, `y` ascending in the outer loop and
/// `x` ascending in the inner loop; the first candidate that lies on the
/// canvas and overlaps nothing wins. Identical inputs give identical answers.
///
/// A colliding candidate lets the scan jump straight to the first column at or
/// past the rightmost colliding edge. Every column in between still collides
/// with that rectangle, so the jump never changes which position is returned.
pub fn find_slot<O: Occupancy + ?Sized>(width: i32, height: i32, occupied: &O) -> Option<Position> {
    if width < 1 || height < 1 || width > CANVAS_SIZE || height > CANVAS_SIZE {
        return None;
    }
    let max_x = (CANVAS_SIZE - width) as i64;
    let max_y = CANVAS_SIZE - height;

    let mut y = 0;
    while y <= max_y {
        let mut x: i64 = 0;
        while x <= max_x {
            let candidate = Rect::new(x as i32, y, width, height);
            match occupied.overlapping(candidate).map(|r| r.right()).max() {
                None => return Some(candidate.position()),
                Some(edge) => x = align_up(edge),
            }
        }
        y += GRID_STEP;
    }
    None
}

/// Smallest grid column at or after `edge`.
fn align_up(edge: i64) -> i64 {
    let step = GRID_STEP as i64;
    (edge + step - 1).div_euclid(step) * step
}
