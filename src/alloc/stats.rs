use crate::limits::CANVAS_AREA;
use crate::model::{Ad, Stats};

/// Occupancy and revenue over the active ads in `ads`. Other statuses are skipped.
pub fn aggregate<'a>(ads: impl IntoIterator<Item = &'a Ad>) -> Stats {
    let mut stats = Stats {
        total_pixels: CANVAS_AREA,
        ..Stats::default()
    };
    for ad in ads.into_iter().filter(|ad| ad.is_active()) {
        stats.occupied_pixels += ad.rect.area();
        stats.total_ads += 1;
        stats.total_revenue += ad.price;
    }
    stats.available_pixels = stats.total_pixels - stats.occupied_pixels;
    stats
}
