//! Fixed wall geometry and input limits.

/// Side length of the square canvas, in units.
pub const CANVAS_SIZE: i32 = 1000;

/// Total sellable area.
pub const CANVAS_AREA: i64 = (CANVAS_SIZE as i64) * (CANVAS_SIZE as i64);

/// Raster step used by the automatic placement search.
pub const GRID_STEP: i32 = 10;

/// Price of a single unit of area.
pub const PRICE_PER_UNIT: i64 = 1;

pub const MAX_BUSINESS_NAME_LEN: usize = 255;
pub const MAX_DESCRIPTION_LEN: usize = 1000;
pub const MAX_ALT_LEN: usize = 255;
pub const MAX_URL_LEN: usize = 2048;

/// Extra attempts at a WAL append before the commit gives up.
pub const MAX_COMMIT_RETRIES: u32 = 3;

/// Backoff between WAL append attempts, in milliseconds.
pub const COMMIT_BACKOFF_MS: &[u64] = &[10, 50, 200];
