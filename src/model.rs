use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;
use ulid::Ulid;

use crate::limits::CANVAS_SIZE;

/// Unix milliseconds.
pub type Ms = i64;

/// Axis-aligned rectangle covering `[x, x + width) × [y, y + height)`.
///
/// Edge arithmetic is done in `i64` so that hostile inputs near `i32::MAX`
/// cannot wrap around and pass a bounds check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn at(position: Position, width: i32, height: i32) -> Self {
        Self::new(position.x, position.y, width, height)
    }

    pub fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    pub fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }

    pub fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }

    pub fn position(&self) -> Position {
        Position { x: self.x, y: self.y }
    }

    /// Positive-area intersection (separating-axis test). Rectangles that only
    /// share an edge do not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        !(self.x as i64 >= other.right()
            || self.right() <= other.x as i64
            || self.y as i64 >= other.bottom()
            || self.bottom() <= other.y as i64)
    }

    /// Positive size and fully on the canvas.
    pub fn within_canvas(&self) -> bool {
        let size = CANVAS_SIZE as i64;
        self.x >= 0
            && self.y >= 0
            && self.width >= 1
            && self.height >= 1
            && self.right() <= size
            && self.bottom() <= size
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{} at ({}, {})", self.width, self.height, self.x, self.y)
    }
}

/// Top-left corner of a placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdStatus {
    Active,
    /// Awaiting payment. Not produced by the engine.
    Pending,
    /// Paid period over. Not produced by the engine.
    Expired,
    Removed,
}

impl AdStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdStatus::Active => "active",
            AdStatus::Pending => "pending",
            AdStatus::Expired => "expired",
            AdStatus::Removed => "removed",
        }
    }
}

impl fmt::Display for AdStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(AdStatus::Active),
            "pending" => Ok(AdStatus::Pending),
            "expired" => Ok(AdStatus::Expired),
            "removed" => Ok(AdStatus::Removed),
            other => Err(format!("unknown ad status: {other}")),
        }
    }
}

/// A claimed rectangle and its descriptive payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ad {
    pub id: Ulid,
    pub rect: Rect,
    pub status: AdStatus,
    pub price: i64,
    pub business_name: String,
    pub description: Option<String>,
    pub image_url: String,
    pub target_url: String,
    pub alt: Option<String>,
    pub created_at: Ms,
    pub updated_at: Ms,
}

impl Ad {
    pub fn is_active(&self) -> bool {
        self.status == AdStatus::Active
    }
}

/// Descriptive fields supplied with a new reservation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AdPayload {
    pub business_name: String,
    pub description: Option<String>,
    pub image_url: String,
    pub target_url: String,
    pub alt: Option<String>,
}

/// Partial update of the descriptive fields. `None` leaves a field unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AdUpdate {
    pub business_name: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub target_url: Option<String>,
    pub alt: Option<String>,
}

impl AdPayload {
    /// Surrounding whitespace stripped from every text field. A blank `alt`
    /// counts as absent.
    pub fn trimmed(self) -> Self {
        Self {
            business_name: self.business_name.trim().to_string(),
            description: self.description.map(|d| d.trim().to_string()),
            image_url: self.image_url.trim().to_string(),
            target_url: self.target_url.trim().to_string(),
            alt: self.alt.map(|a| a.trim().to_string()).filter(|a| !a.is_empty()),
        }
    }
}

impl AdUpdate {
    pub fn trimmed(self) -> Self {
        let trim = |v: Option<String>| v.map(|s| s.trim().to_string());
        Self {
            business_name: trim(self.business_name),
            description: trim(self.description),
            image_url: trim(self.image_url),
            target_url: trim(self.target_url),
            alt: trim(self.alt),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.business_name.is_none()
            && self.description.is_none()
            && self.image_url.is_none()
            && self.target_url.is_none()
            && self.alt.is_none()
    }
}

/// Occupancy figures over the active ads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Stats {
    pub total_pixels: i64,
    pub occupied_pixels: i64,
    pub available_pixels: i64,
    pub total_ads: i64,
    pub total_revenue: i64,
}

/// WAL record format. Flat, no nesting beyond geometry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    AdCreated {
        id: Ulid,
        rect: Rect,
        price: i64,
        business_name: String,
        description: Option<String>,
        image_url: String,
        target_url: String,
        alt: Option<String>,
        at: Ms,
    },
    AdUpdated {
        id: Ulid,
        business_name: Option<String>,
        description: Option<String>,
        image_url: Option<String>,
        target_url: Option<String>,
        alt: Option<String>,
        at: Ms,
    },
    AdRemoved {
        id: Ulid,
        at: Ms,
    },
}

impl Event {
    pub fn ad_id(&self) -> Ulid {
        match self {
            Event::AdCreated { id, .. } | Event::AdUpdated { id, .. } | Event::AdRemoved { id, .. } => *id,
        }
    }
}

/// Committed wall: every ad ever created (history is retained after removal)
/// plus an index of the active rectangles.
#[derive(Debug, Clone, Default)]
pub struct WallState {
    ads: HashMap<Ulid, Ad>,
    /// Active rectangles, sorted by `rect.y`.
    active: Vec<(Ulid, Rect)>,
    last_id: Option<Ulid>,
}

impl WallState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &Ulid) -> Option<&Ad> {
        self.ads.get(id)
    }

    /// All ads regardless of status, in no particular order.
    pub fn ads(&self) -> impl Iterator<Item = &Ad> {
        self.ads.values()
    }

    pub fn active_ads(&self) -> impl Iterator<Item = &Ad> {
        self.active.iter().filter_map(|(id, _)| self.ads.get(id))
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Next ad id. Strictly greater than every id applied so far, so ids sort
    /// in commit order even within the same millisecond.
    pub fn next_id(&self) -> Ulid {
        let id = Ulid::new();
        match self.last_id {
            Some(last) if id <= last => last.increment().unwrap_or(id),
            _ => id,
        }
    }

    /// Active rectangles with positive-area intersection with `query`.
    /// Binary search skips everything starting at or below `query`'s bottom edge.
    pub fn colliding(&self, query: Rect) -> impl Iterator<Item = (Ulid, &Rect)> {
        let bottom = query.bottom();
        let cutoff = self.active.partition_point(|(_, r)| (r.y as i64) < bottom);
        self.active[..cutoff]
            .iter()
            .filter(move |(_, r)| r.overlaps(&query))
            .map(|(id, r)| (*id, r))
    }

    fn index_insert(&mut self, id: Ulid, rect: Rect) {
        let pos = self.active.partition_point(|(_, r)| r.y <= rect.y);
        self.active.insert(pos, (id, rect));
    }

    fn index_remove(&mut self, id: &Ulid) {
        if let Some(pos) = self.active.iter().position(|(i, _)| i == id) {
            self.active.remove(pos);
        }
    }

    /// Apply an event. A create whose rect collides with an active ad is
    /// dropped: a log can hold an append that failed after its bytes landed,
    /// and the wall must never come back with overlapping ads.
    pub fn apply(&mut self, event: &Event) {
        match event {
            Event::AdCreated {
                id,
                rect,
                price,
                business_name,
                description,
                image_url,
                target_url,
                alt,
                at,
            } => {
                // A commit retried after a partial write can appear twice in the log.
                if self.ads.contains_key(id) {
                    return;
                }
                if let Some((other, _)) = self.colliding(*rect).next() {
                    warn!("dropping logged ad {id} at {rect}: overlaps active ad {other}");
                    return;
                }
                self.ads.insert(
                    *id,
                    Ad {
                        id: *id,
                        rect: *rect,
                        status: AdStatus::Active,
                        price: *price,
                        business_name: business_name.clone(),
                        description: description.clone(),
                        image_url: image_url.clone(),
                        target_url: target_url.clone(),
                        alt: alt.clone(),
                        created_at: *at,
                        updated_at: *at,
                    },
                );
                self.index_insert(*id, *rect);
                self.last_id = Some(self.last_id.map_or(*id, |last| last.max(*id)));
            }
            Event::AdUpdated {
                id,
                business_name,
                description,
                image_url,
                target_url,
                alt,
                at,
            } => {
                let Some(ad) = self.ads.get_mut(id) else { return };
                if let Some(v) = business_name {
                    ad.business_name = v.clone();
                }
                if let Some(v) = description {
                    ad.description = Some(v.clone());
                }
                if let Some(v) = image_url {
                    ad.image_url = v.clone();
                }
                if let Some(v) = target_url {
                    ad.target_url = v.clone();
                }
                if let Some(v) = alt {
                    ad.alt = Some(v.clone());
                }
                ad.updated_at = *at;
            }
            Event::AdRemoved { id, at } => {
                let Some(ad) = self.ads.get_mut(id) else { return };
                if ad.status != AdStatus::Active {
                    return;
                }
                ad.status = AdStatus::Removed;
                ad.updated_at = *at;
                self.index_remove(id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn created(id: Ulid, rect: Rect) -> Event {
        Event::AdCreated {
            id,
            rect,
            price: rect.area(),
            business_name: "Acme".into(),
            description: None,
            image_url: "https://acme.test/logo.png".into(),
            target_url: "https://acme.test".into(),
            alt: None,
            at: 1_000,
        }
    }

    #[test]
    fn rect_overlap() {
        let a = Rect::new(0, 0, 100, 100);
        let b = Rect::new(50, 50, 100, 100);
        let c = Rect::new(100, 0, 10, 10);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c)); // shares the x = 100 edge
    }

    #[test]
    fn rect_touching_edges_do_not_overlap() {
        let a = Rect::new(0, 0, 10, 10);
        assert!(!a.overlaps(&Rect::new(10, 0, 10, 10)));
        assert!(!a.overlaps(&Rect::new(0, 10, 10, 10)));
        assert!(!a.overlaps(&Rect::new(10, 10, 10, 10))); // corner only
        assert!(a.overlaps(&Rect::new(9, 9, 10, 10))); // one unit of overlap
    }

    #[test]
    fn rect_contained_overlaps() {
        let outer = Rect::new(0, 0, 500, 500);
        let inner = Rect::new(100, 100, 1, 1);
        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
    }

    #[test]
    fn rect_within_canvas_edges() {
        assert!(Rect::new(990, 0, 10, 10).within_canvas());
        assert!(Rect::new(0, 0, 1000, 1000).within_canvas());
        assert!(!Rect::new(991, 0, 10, 10).within_canvas());
        assert!(!Rect::new(0, 999, 1, 2).within_canvas());
        assert!(!Rect::new(-1, 0, 10, 10).within_canvas());
        assert!(!Rect::new(0, 0, 0, 10).within_canvas());
        assert!(!Rect::new(0, 0, 10, -5).within_canvas());
    }

    #[test]
    fn rect_edges_do_not_wrap() {
        let r = Rect::new(i32::MAX, 0, i32::MAX, 1);
        assert!(r.right() > i32::MAX as i64);
        assert!(!r.within_canvas());
    }

    #[test]
    fn status_parse_and_display() {
        for s in [AdStatus::Active, AdStatus::Pending, AdStatus::Expired, AdStatus::Removed] {
            assert_eq!(s.as_str().parse::<AdStatus>().unwrap(), s);
        }
        assert_eq!("ACTIVE".parse::<AdStatus>().unwrap(), AdStatus::Active);
        assert!("sold".parse::<AdStatus>().is_err());
    }

    #[test]
    fn index_stays_sorted_by_y() {
        let mut wall = WallState::new();
        wall.apply(&created(Ulid::new(), Rect::new(0, 500, 10, 10)));
        wall.apply(&created(Ulid::new(), Rect::new(0, 100, 10, 10)));
        wall.apply(&created(Ulid::new(), Rect::new(0, 300, 10, 10)));
        let ys: Vec<i32> = wall.active.iter().map(|(_, r)| r.y).collect();
        assert_eq!(ys, vec![100, 300, 500]);
    }

    #[test]
    fn colliding_skips_rects_below_query() {
        let mut wall = WallState::new();
        let hit = Ulid::new();
        wall.apply(&created(hit, Rect::new(0, 0, 100, 100)));
        wall.apply(&created(Ulid::new(), Rect::new(0, 200, 100, 100)));
        wall.apply(&created(Ulid::new(), Rect::new(500, 0, 100, 100)));

        let hits: Vec<Ulid> = wall.colliding(Rect::new(50, 50, 100, 100)).map(|(id, _)| id).collect();
        assert_eq!(hits, vec![hit]);
    }

    #[test]
    fn colliding_adjacent_not_included() {
        let mut wall = WallState::new();
        wall.apply(&created(Ulid::new(), Rect::new(0, 0, 100, 100)));
        assert_eq!(wall.colliding(Rect::new(0, 100, 100, 100)).count(), 0);
        assert_eq!(wall.colliding(Rect::new(100, 0, 100, 100)).count(), 0);
    }

    #[test]
    fn apply_lifecycle() {
        let mut wall = WallState::new();
        let id = Ulid::new();
        wall.apply(&created(id, Rect::new(10, 10, 20, 20)));
        assert_eq!(wall.active_count(), 1);

        wall.apply(&Event::AdUpdated {
            id,
            business_name: Some("Acme Two".into()),
            description: Some("now with more".into()),
            image_url: None,
            target_url: None,
            alt: None,
            at: 2_000,
        });
        let ad = wall.get(&id).unwrap();
        assert_eq!(ad.business_name, "Acme Two");
        assert_eq!(ad.description.as_deref(), Some("now with more"));
        assert_eq!(ad.image_url, "https://acme.test/logo.png");
        assert_eq!(ad.created_at, 1_000);
        assert_eq!(ad.updated_at, 2_000);

        wall.apply(&Event::AdRemoved { id, at: 3_000 });
        assert_eq!(wall.active_count(), 0);
        let ad = wall.get(&id).unwrap();
        assert_eq!(ad.status, AdStatus::Removed);
        assert_eq!(ad.rect, Rect::new(10, 10, 20, 20)); // geometry retained
        assert_eq!(ad.updated_at, 3_000);
    }

    #[test]
    fn duplicate_create_is_ignored() {
        let mut wall = WallState::new();
        let id = Ulid::new();
        wall.apply(&created(id, Rect::new(0, 0, 10, 10)));
        wall.apply(&created(id, Rect::new(0, 0, 10, 10)));
        assert_eq!(wall.active_count(), 1);
        assert_eq!(wall.ads().count(), 1);
    }

    #[test]
    fn overlapping_create_is_dropped() {
        let mut wall = WallState::new();
        let first = Ulid::new();
        let second = Ulid::new();
        wall.apply(&created(first, Rect::new(0, 0, 50, 50)));
        wall.apply(&created(second, Rect::new(40, 40, 50, 50)));
        assert_eq!(wall.active_count(), 1);
        assert!(wall.get(&second).is_none());

        // Once the space is freed the same rect is accepted again.
        wall.apply(&Event::AdRemoved { id: first, at: 2_000 });
        wall.apply(&created(second, Rect::new(40, 40, 50, 50)));
        assert_eq!(wall.active_count(), 1);
        assert!(wall.get(&second).is_some_and(Ad::is_active));
    }

    #[test]
    fn payload_is_trimmed_and_blank_alt_dropped() {
        let payload = AdPayload {
            business_name: "  Acme ".into(),
            description: Some(" bread \n".into()),
            image_url: " https://acme.test/a.png".into(),
            target_url: "https://acme.test  ".into(),
            alt: Some("   ".into()),
        }
        .trimmed();
        assert_eq!(payload.business_name, "Acme");
        assert_eq!(payload.description.as_deref(), Some("bread"));
        assert_eq!(payload.image_url, "https://acme.test/a.png");
        assert_eq!(payload.target_url, "https://acme.test");
        assert_eq!(payload.alt, None);

        let update = AdUpdate {
            alt: Some(" Shop front ".into()),
            ..AdUpdate::default()
        }
        .trimmed();
        assert_eq!(update.alt.as_deref(), Some("Shop front"));
        assert!(update.business_name.is_none());
    }

    #[test]
    fn remove_does_not_resurrect_or_repeat() {
        let mut wall = WallState::new();
        let id = Ulid::new();
        wall.apply(&created(id, Rect::new(0, 0, 10, 10)));
        wall.apply(&Event::AdRemoved { id, at: 2_000 });
        wall.apply(&Event::AdRemoved { id, at: 9_000 });
        assert_eq!(wall.get(&id).unwrap().updated_at, 2_000);
        // A replayed create for a removed id must not bring it back.
        wall.apply(&created(id, Rect::new(0, 0, 10, 10)));
        assert_eq!(wall.active_count(), 0);
    }

    #[test]
    fn next_id_is_monotonic() {
        let mut wall = WallState::new();
        let mut prev = None;
        for i in 0..50 {
            let id = wall.next_id();
            if let Some(p) = prev {
                assert!(id > p);
            }
            wall.apply(&created(id, Rect::new(i * 10, 0, 10, 10)));
            prev = Some(id);
        }
    }

    #[test]
    fn event_serialization_roundtrip() {
        let event = created(Ulid::new(), Rect::new(1, 2, 3, 4));
        let bytes = bincode::serialize(&event).unwrap();
        let decoded: Event = bincode::deserialize(&bytes).unwrap();
        assert_eq!(event, decoded);
    }
}
