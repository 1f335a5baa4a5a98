//! Pure geometry over a snapshot of occupied rectangles.
//!
//! Nothing here locks, allocates ids or touches storage; the reservation
//! service supplies the snapshot and decides what to commit.

mod placement;
mod stats;

pub use placement::find_slot;
pub use stats::aggregate;

use crate::model::{Rect, WallState};

/// Source of occupied rectangles.
///
/// `overlapping` must yield every occupied rectangle that has positive-area
/// intersection with `query`, and nothing else. A flat slice scans linearly;
/// an indexed implementation only has to honour the same contract.
pub trait Occupancy {
    fn overlapping(&self, query: Rect) -> impl Iterator<Item = &Rect>;
}

impl Occupancy for [Rect] {
    fn overlapping(&self, query: Rect) -> impl Iterator<Item = &Rect> {
        self.iter().filter(move |r| r.overlaps(&query))
    }
}

impl Occupancy for Vec<Rect> {
    fn overlapping(&self, query: Rect) -> impl Iterator<Item = &Rect> {
        self.as_slice().overlapping(query)
    }
}

impl Occupancy for WallState {
    fn overlapping(&self, query: Rect) -> impl Iterator<Item = &Rect> {
        self.colliding(query).map(|(_, r)| r)
    }
}

/// True iff `candidate` lies on the canvas and overlaps nothing in `occupied`.
pub fn is_available<O: Occupancy + ?Sized>(candidate: &Rect, occupied: &O) -> bool {
    candidate.within_canvas() && occupied.overlapping(*candidate).next().is_none()
}
