use ulid::Ulid;

use crate::alloc;
use crate::model::*;

use super::Engine;

/// Outcome of an availability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Available,
    OutOfBounds,
    /// Blocked by the given active ad.
    Occupied(Ulid),
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }

    pub fn reason(&self) -> &'static str {
        match self {
            Availability::Available => "Space is available",
            Availability::OutOfBounds => "Space extends beyond canvas boundaries",
            Availability::Occupied(_) => "Space is already occupied",
        }
    }
}

impl Engine {
    pub async fn check_availability(&self, rect: Rect) -> Availability {
        if !rect.within_canvas() {
            return Availability::OutOfBounds;
        }
        let guard = self.state.read().await;
        match guard.colliding(rect).next() {
            Some((id, _)) => Availability::Occupied(id),
            None => Availability::Available,
        }
    }

    /// Where `reserve_auto` would place a `width × height` ad right now.
    pub async fn find_position(&self, width: i32, height: i32) -> Option<Position> {
        let guard = self.state.read().await;
        alloc::find_slot(width, height, &*guard)
    }

    /// Any ad ever created, removed ones included.
    pub async fn get_ad(&self, id: &Ulid) -> Option<Ad> {
        self.state.read().await.get(id).cloned()
    }

    /// Active ads, newest first.
    pub async fn list_active(&self) -> Vec<Ad> {
        let guard = self.state.read().await;
        let mut ads: Vec<Ad> = guard.active_ads().cloned().collect();
        ads.sort_by(|a, b| b.id.cmp(&a.id));
        ads
    }

    pub async fn stats(&self) -> Stats {
        let guard = self.state.read().await;
        alloc::aggregate(guard.active_ads())
    }
}
