use crate::limits::*;
use crate::model::*;

use super::EngineError;

pub(crate) fn now_ms() -> Ms {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as Ms)
        .unwrap_or(0)
}

pub(crate) fn validate_rect(rect: &Rect) -> Result<(), EngineError> {
    if !rect.within_canvas() {
        return Err(EngineError::OutOfBounds(*rect));
    }
    Ok(())
}

/// Size check for an auto placement, reported against a rect at the origin.
pub(crate) fn validate_size(width: i32, height: i32) -> Result<(), EngineError> {
    validate_rect(&Rect::new(0, 0, width, height))
}

/// First active ad overlapping `rect`, as an error.
pub(crate) fn check_no_conflict(wall: &WallState, rect: &Rect) -> Result<(), EngineError> {
    match wall.colliding(*rect).next() {
        Some((id, _)) => Err(EngineError::SpaceTaken(id)),
        None => Ok(()),
    }
}

fn validate_url(url: &str) -> Result<(), EngineError> {
    if url.len() > MAX_URL_LEN {
        return Err(EngineError::Invalid("url too long"));
    }
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .ok_or(EngineError::Invalid("url must start with http:// or https://"))?;
    let host = rest.split(['/', '?', '#']).next().unwrap_or("");
    if host.is_empty() || host.contains(char::is_whitespace) {
        return Err(EngineError::Invalid("url has no host"));
    }
    Ok(())
}

fn validate_business_name(name: &str) -> Result<(), EngineError> {
    if name.trim().is_empty() {
        return Err(EngineError::Invalid("business_name is required"));
    }
    if name.chars().count() > MAX_BUSINESS_NAME_LEN {
        return Err(EngineError::Invalid("business_name too long"));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), EngineError> {
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(EngineError::Invalid("description too long"));
    }
    Ok(())
}

fn validate_alt(alt: &str) -> Result<(), EngineError> {
    if alt.chars().count() > MAX_ALT_LEN {
        return Err(EngineError::Invalid("alt too long"));
    }
    Ok(())
}

pub(crate) fn validate_payload(payload: &AdPayload) -> Result<(), EngineError> {
    validate_business_name(&payload.business_name)?;
    if let Some(d) = &payload.description {
        validate_description(d)?;
    }
    validate_url(&payload.image_url)?;
    validate_url(&payload.target_url)?;
    if let Some(a) = &payload.alt {
        validate_alt(a)?;
    }
    Ok(())
}

pub(crate) fn validate_update(update: &AdUpdate) -> Result<(), EngineError> {
    if update.is_empty() {
        return Err(EngineError::Invalid("nothing to update"));
    }
    if let Some(n) = &update.business_name {
        validate_business_name(n)?;
    }
    if let Some(d) = &update.description {
        validate_description(d)?;
    }
    if let Some(u) = &update.image_url {
        validate_url(u)?;
    }
    if let Some(u) = &update.target_url {
        validate_url(u)?;
    }
    if let Some(a) = &update.alt {
        validate_alt(a)?;
    }
    Ok(())
}
