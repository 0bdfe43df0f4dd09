use crate::foundation::error::{BlitError, BlitResult};

/// Renderer configuration.
///
/// Every field has a default, so partial JSON documents are accepted. Environment
/// overrides (`BLITKIT_*`) are applied on top by [`RendererOpts::from_env`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RendererOpts {
    /// Number of open decoder sessions the image cache keeps. `0` disables caching.
    pub image_cache_size: usize,
    /// Number of textures (or baked fragments) the texture cache keeps.
    pub texture_cache_capacity: usize,
    /// Upper bound for scratch texture edges; requests are padded to a power of two up to this.
    pub max_tile_size: u32,
    /// Rounded draws narrower or shorter than this are masked per pixel instead of
    /// being split into corner/edge/center patches.
    pub ninepatch_min_size: i32,
}

impl Default for RendererOpts {
    fn default() -> Self {
        Self {
            image_cache_size: 16,
            texture_cache_capacity: 64,
            max_tile_size: 1024,
            ninepatch_min_size: 8,
        }
    }
}

impl RendererOpts {
    /// Defaults with `BLITKIT_*` environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `BLITKIT_IMAGE_CACHE_SIZE`, `BLITKIT_TEXTURE_CACHE_CAPACITY`,
    /// `BLITKIT_MAX_TILE_SIZE` and `BLITKIT_NINEPATCH_MIN_SIZE` when they parse.
    pub fn with_env_overrides(mut self) -> Self {
        // Zero is a meaningful image cache size (no caching), so it is not filtered out.
        if let Some(n) = env_parse::<usize>("BLITKIT_IMAGE_CACHE_SIZE") {
            self.image_cache_size = n;
        }
        if let Some(n) = env_parse::<usize>("BLITKIT_TEXTURE_CACHE_CAPACITY").filter(|&n| n > 0) {
            self.texture_cache_capacity = n;
        }
        if let Some(n) = env_parse::<u32>("BLITKIT_MAX_TILE_SIZE").filter(|&n| n > 0) {
            self.max_tile_size = n;
        }
        if let Some(n) = env_parse::<i32>("BLITKIT_NINEPATCH_MIN_SIZE").filter(|&n| n >= 0) {
            self.ninepatch_min_size = n;
        }
        self
    }

    /// Parse options from a JSON document.
    pub fn from_json(json: &str) -> BlitResult<Self> {
        let opts: Self = serde_json::from_str(json)
            .map_err(|e| BlitError::serde(format!("parse renderer options JSON: {e}")))?;
        opts.validate()?;
        Ok(opts)
    }

    /// Reject values the caches cannot work with.
    pub fn validate(&self) -> BlitResult<()> {
        if self.texture_cache_capacity == 0 {
            return Err(BlitError::validation("texture_cache_capacity must be > 0"));
        }
        if self.max_tile_size == 0 {
            return Err(BlitError::validation("max_tile_size must be > 0"));
        }
        if self.ninepatch_min_size < 0 {
            return Err(BlitError::validation("ninepatch_min_size must be >= 0"));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse::<T>().ok())
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
