//! Persistence layer.
//!
//! Saves and loads the player profile (stats + settings) to/from a JSON
//! file. The file holds one fixed key whose value is the profile, so the
//! same document can sit beside other keys without clashing. Loading
//! never blocks startup: anything unreadable falls back to defaults.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::store::Profile;

/// Default profile file path.
pub const DEFAULT_STATE_FILE: &str = "price_clash_state.json";

/// Key under which the profile is stored.
pub const STORAGE_KEY: &str = "solana-price-clash-storage";

/// Save the profile, preserving any other keys already in the file.
pub fn save_profile(profile: &Profile, path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_STATE_FILE);

    let mut doc = read_document(path).unwrap_or_default();
    let value = serde_json::to_value(profile).context("Failed to serialise profile")?;
    doc.insert(STORAGE_KEY.to_string(), value);

    let json = serde_json::to_string_pretty(&Value::Object(doc))
        .context("Failed to serialise profile document")?;
    std::fs::write(path, &json).context(format!("Failed to write profile to {path}"))?;

    debug!(
        path,
        games = profile.stats.total_games,
        points = profile.stats.total_points,
        "Profile saved"
    );
    Ok(())
}

/// Load the profile strictly.
/// Returns None if the file or the key doesn't exist (fresh start).
pub fn read_profile(path: Option<&str>) -> Result<Option<Profile>> {
    let path = path.unwrap_or(DEFAULT_STATE_FILE);

    if !Path::new(path).exists() {
        return Ok(None);
    }

    let mut doc = read_document(path)?;
    let Some(value) = doc.remove(STORAGE_KEY) else {
        return Ok(None);
    };

    let profile: Profile = serde_json::from_value(value)
        .context(format!("Failed to parse profile from {path}"))?;

    if !profile.stats.is_consistent() {
        anyhow::bail!("Profile in {path} has inconsistent stats: {}", profile.stats);
    }

    Ok(Some(profile))
}

/// Load the profile, falling back to defaults on any problem.
pub fn load_profile(path: Option<&str>) -> Profile {
    let shown = path.unwrap_or(DEFAULT_STATE_FILE);
    match read_profile(path) {
        Ok(Some(profile)) => {
            info!(
                path = shown,
                games = profile.stats.total_games,
                points = profile.stats.total_points,
                best_streak = profile.stats.best_streak,
                "Profile loaded from disk"
            );
            profile
        }
        Ok(None) => {
            info!(path = shown, "No saved profile found, starting fresh");
            Profile::default()
        }
        Err(e) => {
            warn!(path = shown, error = %e, "Saved profile unusable, starting fresh");
            Profile::default()
        }
    }
}

/// Delete the profile file (for testing or reset).
pub fn delete_profile(path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_STATE_FILE);
    if Path::new(path).exists() {
        std::fs::remove_file(path).context(format!("Failed to delete profile file {path}"))?;
    }
    Ok(())
}

fn read_document(path: &str) -> Result<Map<String, Value>> {
    let json = std::fs::read_to_string(path).context(format!("Failed to read profile from {path}"))?;
    match serde_json::from_str::<Value>(&json).context(format!("Failed to parse {path}"))? {
        Value::Object(map) => Ok(map),
        _ => anyhow::bail!("{path} does not contain a JSON object"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
