//! Sprite Resolver Module
//! Resolves PokeAPI sprite images with a deterministic local fallback.

use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

const POKEAPI_BASE: &str = "https://pokeapi.co/api/v2";
const DEFAULT_FALLBACK: &str = "assets/pokeball.png";

/// Alt text used whenever resolution degraded to the local fallback.
pub const FALLBACK_ALT: &str = "pokeball";

#[derive(Error, Debug)]
pub enum SpriteError {
    #[error("Fallback sprite asset missing: {}", .0.display())]
    AssetMissing(PathBuf),
    #[error("Failed to decode sprite image: {0}")]
    InvalidImage(#[from] image::ImageError),
}

/// Where a sprite ended up coming from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpriteResult {
    pub source_uri: String,
    pub is_fallback: bool,
}

/// Looks up sprites on PokeAPI and degrades to a bundled pokeball image on
/// any failure. Network trouble is absorbed, never surfaced; the only fatal
/// condition is a missing fallback asset.
pub struct SpriteResolver {
    api_base: String,
    fallback_path: PathBuf,
}

impl Default for SpriteResolver {
    fn default() -> Self {
        Self {
            api_base: POKEAPI_BASE.to_string(),
            fallback_path: PathBuf::from(DEFAULT_FALLBACK),
        }
    }
}

impl SpriteResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point at a different API root (tests point this at a local server).
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_fallback_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.fallback_path = path.into();
        self
    }

    pub fn fallback_path(&self) -> &Path {
        &self.fallback_path
    }

    /// Startup check: the fallback asset is the one thing that must exist
    /// for sprite resolution to keep its never-fails contract.
    pub fn ensure_fallback_asset(&self) -> Result<(), SpriteError> {
        if self.fallback_path.is_file() {
            Ok(())
        } else {
            Err(SpriteError::AssetMissing(self.fallback_path.clone()))
        }
    }

    /// Resolve the display URI for a dex id.
    ///
    /// Fetches `/pokemon/{id}/` metadata, extracts `sprites.front_default`,
    /// then probes that URI before trusting it. Every failure along the way
    /// lands on the local fallback with `is_fallback = true`.
    pub fn resolve_sprite_uri(&self, id: u32) -> SpriteResult {
        let metadata_url = format!("{}/pokemon/{}/", self.api_base, id);
        let body = match ureq::get(&metadata_url).call() {
            Ok(response) => match response.into_body().read_to_string() {
                Ok(body) => body,
                Err(err) => {
                    debug!("sprite metadata for dex id {id} unreadable: {err}");
                    return self.fallback_result();
                }
            },
            Err(err) => {
                debug!("sprite metadata request for dex id {id} failed: {err}");
                return self.fallback_result();
            }
        };

        let metadata: serde_json::Value = match serde_json::from_str(&body) {
            Ok(value) => value,
            Err(err) => {
                debug!("sprite metadata for dex id {id} is not valid JSON: {err}");
                return self.fallback_result();
            }
        };
        let sprite_url = metadata
            .get("sprites")
            .and_then(|sprites| sprites.get("front_default"))
            .and_then(|url| url.as_str());
        let Some(sprite_url) = sprite_url else {
            debug!("no front_default sprite listed for dex id {id}");
            return self.fallback_result();
        };

        // Probe the sprite URI itself; a dangling link degrades too.
        match ureq::get(sprite_url).call() {
            Ok(_) => SpriteResult {
                source_uri: sprite_url.to_string(),
                is_fallback: false,
            },
            Err(err) => {
                debug!("sprite image probe for dex id {id} failed: {err}");
                self.fallback_result()
            }
        }
    }

    /// Fetch the sprite bytes for a dex id, falling back to the bundled
    /// pokeball on any network failure.
    pub fn fetch_sprite_image(&self, id: u32) -> Result<Vec<u8>, SpriteError> {
        let resolved = self.resolve_sprite_uri(id);
        if !resolved.is_fallback {
            match ureq::get(&resolved.source_uri).call() {
                Ok(response) => {
                    let mut bytes = Vec::new();
                    match response.into_body().into_reader().read_to_end(&mut bytes) {
                        Ok(_) => return Ok(bytes),
                        Err(err) => {
                            debug!("sprite download for dex id {id} died mid-stream: {err}")
                        }
                    }
                }
                Err(err) => debug!("sprite download for dex id {id} failed: {err}"),
            }
        }
        self.fallback_bytes()
    }

    /// One-call convenience for panel consumers: resolve the sprite for a
    /// dex id and render its `<img>` markup.
    pub fn sprite_markup(&self, id: u32, alt: &str, width_px: u32) -> String {
        sprite_markup(&self.resolve_sprite_uri(id), alt, width_px)
    }

    /// Bytes of the bundled fallback image.
    pub fn fallback_bytes(&self) -> Result<Vec<u8>, SpriteError> {
        std::fs::read(&self.fallback_path)
            .map_err(|_| SpriteError::AssetMissing(self.fallback_path.clone()))
    }

    fn fallback_result(&self) -> SpriteResult {
        SpriteResult {
            source_uri: self.fallback_path.display().to_string(),
            is_fallback: true,
        }
    }
}

/// Render the `<img>` tag for a resolved sprite. A degraded resolution
/// replaces the caller's alt text with the fallback marker.
pub fn sprite_markup(sprite: &SpriteResult, alt: &str, width_px: u32) -> String {
    let alt = if sprite.is_fallback { FALLBACK_ALT } else { alt };
    format!(
        "<img src=\"{}\" alt=\"{}\" width={}px>",
        sprite.source_uri, alt, width_px
    )
}
