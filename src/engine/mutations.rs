use std::sync::atomic::Ordering;

use tracing::{debug, info};
use ulid::Ulid;

use crate::alloc;
use crate::limits::PRICE_PER_UNIT;
use crate::model::*;
use crate::observability::RESERVATIONS_TOTAL;

use super::conflict::{check_no_conflict, now_ms, validate_payload, validate_rect, validate_size, validate_update};
use super::{Engine, EngineError};

/// `payload` must already be trimmed.
fn created_event(id: Ulid, rect: Rect, payload: AdPayload, at: Ms) -> Event {
    let alt = payload.alt.or_else(|| Some(payload.business_name.clone()));
    Event::AdCreated {
        id,
        rect,
        price: rect.area() * PRICE_PER_UNIT,
        business_name: payload.business_name,
        description: payload.description,
        image_url: payload.image_url,
        target_url: payload.target_url,
        alt,
        at,
    }
}

fn record_reservation(mode: &'static str, result: &Result<Ad, EngineError>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    };
    metrics::counter!(RESERVATIONS_TOTAL, "mode" => mode, "outcome" => outcome).increment(1);
}

impl Engine {
    /// Claim the first free `width × height` slot in raster order.
    pub async fn reserve_auto(&self, width: i32, height: i32, payload: AdPayload) -> Result<Ad, EngineError> {
        let result = self.reserve_auto_inner(width, height, payload).await;
        record_reservation("auto", &result);
        result
    }

    async fn reserve_auto_inner(&self, width: i32, height: i32, payload: AdPayload) -> Result<Ad, EngineError> {
        validate_size(width, height)?;
        let payload = payload.trimmed();
        validate_payload(&payload)?;

        let guard = self.acquire_write().await?;
        let position =
            alloc::find_slot(width, height, &*guard).ok_or(EngineError::NoSpace { width, height })?;
        let rect = Rect::at(position, width, height);
        let id = guard.next_id();
        let guard = self.commit(guard, created_event(id, rect, payload, now_ms())).await?;

        info!("reserved ad {id}: {rect}");
        committed(&guard, id)
    }

    /// Claim exactly `rect`, failing if any active ad overlaps it.
    pub async fn reserve_explicit(&self, rect: Rect, payload: AdPayload) -> Result<Ad, EngineError> {
        let result = self.reserve_explicit_inner(rect, payload).await;
        record_reservation("explicit", &result);
        result
    }

    async fn reserve_explicit_inner(&self, rect: Rect, payload: AdPayload) -> Result<Ad, EngineError> {
        validate_rect(&rect)?;
        let payload = payload.trimmed();
        validate_payload(&payload)?;

        let guard = self.acquire_write().await?;
        check_no_conflict(&guard, &rect)?;
        let id = guard.next_id();
        let guard = self.commit(guard, created_event(id, rect, payload, now_ms())).await?;

        info!("reserved ad {id}: {rect}");
        committed(&guard, id)
    }

    /// Change descriptive fields of an active ad. Geometry and price are fixed.
    pub async fn update_ad(&self, id: Ulid, update: AdUpdate) -> Result<Ad, EngineError> {
        let update = update.trimmed();
        validate_update(&update)?;

        let guard = self.acquire_write().await?;
        if !guard.get(&id).is_some_and(Ad::is_active) {
            return Err(EngineError::NotFound(id));
        }
        let event = Event::AdUpdated {
            id,
            business_name: update.business_name,
            description: update.description,
            image_url: update.image_url,
            target_url: update.target_url,
            alt: update.alt,
            at: now_ms(),
        };
        let guard = self.commit(guard, event).await?;

        debug!("updated ad {id}");
        committed(&guard, id)
    }

    /// Mark an active ad removed and return its space to the free pool.
    /// Unknown and already-removed ids are `NotFound`.
    pub async fn soft_delete(&self, id: Ulid) -> Result<(), EngineError> {
        let guard = self.acquire_write().await?;
        if !guard.get(&id).is_some_and(Ad::is_active) {
            return Err(EngineError::NotFound(id));
        }
        self.commit(guard, Event::AdRemoved { id, at: now_ms() }).await?;

        info!("removed ad {id}");
        Ok(())
    }

    /// Rewrite the log as the minimal event sequence that rebuilds the
    /// current wall, removed ads included. Returns the number of events written.
    pub async fn compact_log(&self) -> Result<usize, EngineError> {
        // Every commit holds the write guard, so the read guard keeps the
        // snapshot and the rewritten log in step.
        let guard = self.state.read().await;
        let events = snapshot_events(&guard);

        let count = events.len();
        self.log
            .compact(events)
            .await
            .map_err(|e| EngineError::StoreUnavailable(e.to_string()))?;
        self.poisoned.store(false, Ordering::SeqCst);
        Ok(count)
    }

    pub async fn log_appends_since_compact(&self) -> Result<u64, EngineError> {
        self.log
            .appends_since_compact()
            .await
            .map_err(|e| EngineError::StoreUnavailable(e.to_string()))
    }
}

/// Minimal event sequence that rebuilds `wall`, removed ads included, in id order.
pub(super) fn snapshot_events(wall: &WallState) -> Vec<Event> {
    let mut ads: Vec<&Ad> = wall.ads().collect();
    ads.sort_by_key(|ad| ad.id);

    let mut events = Vec::with_capacity(ads.len());
    for ad in ads {
        events.push(Event::AdCreated {
            id: ad.id,
            rect: ad.rect,
            price: ad.price,
            business_name: ad.business_name.clone(),
            description: ad.description.clone(),
            image_url: ad.image_url.clone(),
            target_url: ad.target_url.clone(),
            alt: ad.alt.clone(),
            at: ad.created_at,
        });
        if ad.status == AdStatus::Removed {
            events.push(Event::AdRemoved { id: ad.id, at: ad.updated_at });
        } else if ad.updated_at != ad.created_at {
            events.push(Event::AdUpdated {
                id: ad.id,
                business_name: None,
                description: None,
                image_url: None,
                target_url: None,
                alt: None,
                at: ad.updated_at,
            });
        }
    }
    events
}

fn committed(wall: &WallState, id: Ulid) -> Result<Ad, EngineError> {
    wall.get(&id)
        .cloned()
        .ok_or_else(|| EngineError::StoreUnavailable(format!("ad {id} missing after commit")))
}
