use std::collections::HashMap;
use std::time::Instant;

use crate::cache::arena::{Arena, Handle};
use crate::decode::registry::{DecoderRegistry, DecoderSession};
use crate::decode::source::{ImageSource, SourceId};
use crate::foundation::core::Rgba8;
use crate::foundation::error::{BlitError, BlitResult};

/// Identity of a cached open image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageKey {
    /// Source identity.
    pub source: SourceId,
    /// Color handed to the decoder (alpha-only formats).
    pub color: Rgba8,
    /// Animation frame.
    pub frame_id: u32,
}

/// Counters for [`ImageCache`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImageCacheStats {
    /// Lookups served without calling a decoder.
    pub hits: u64,
    /// Lookups that went to the decoder registry.
    pub misses: u64,
    /// Entries dropped by the LRU policy.
    pub evictions: u64,
    /// Misses whose decoder open failed.
    pub open_failures: u64,
}

struct Entry {
    key: ImageKey,
    session: DecoderSession,
    last_used: u64,
    indexed: bool,
}

/// LRU cache of open decoder sessions.
///
/// With capacity `0` sessions are still opened and handed out, but they are not indexed:
/// every `open` decodes again and the caller must [`ImageCache::release`] the handle.
pub struct ImageCache {
    capacity: usize,
    entries: Arena<Entry>,
    index: HashMap<ImageKey, Handle>,
    tick: u64,
    stats: ImageCacheStats,
}

impl ImageCache {
    /// Empty cache holding at most `capacity` indexed sessions.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Arena::new(),
            index: HashMap::new(),
            tick: 0,
            stats: ImageCacheStats::default(),
        }
    }

    /// Maximum number of indexed sessions.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of indexed sessions.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> ImageCacheStats {
        self.stats
    }

    /// Whether an entry for `(src, color, frame_id)` is cached.
    pub fn contains(&self, src: &ImageSource, color: Rgba8, frame_id: u32) -> bool {
        self.index.contains_key(&ImageKey {
            source: src.id(),
            color,
            frame_id,
        })
    }

    /// Return the cached session for `(src, color, frame_id)`, opening it on a miss.
    ///
    /// A failed open is not cached.
    pub fn open(
        &mut self,
        registry: &DecoderRegistry,
        src: &ImageSource,
        color: Rgba8,
        frame_id: u32,
    ) -> BlitResult<Handle> {
        let key = ImageKey {
            source: src.id(),
            color,
            frame_id,
        };
        self.tick += 1;
        if let Some(&h) = self.index.get(&key)
            && let Some(entry) = self.entries.get_mut(h)
        {
            entry.last_used = self.tick;
            self.stats.hits = self.stats.hits.saturating_add(1);
            tracing::debug!(%src, "image cache hit");
            return Ok(h);
        }

        self.stats.misses = self.stats.misses.saturating_add(1);
        let started = Instant::now();
        let mut session = match registry.open(src, color, frame_id) {
            Ok(s) => s,
            Err(e) => {
                self.stats.open_failures = self.stats.open_failures.saturating_add(1);
                tracing::warn!(%src, error = %e, "image open failed");
                return Err(e);
            }
        };
        session.time_to_open.get_or_insert_with(|| started.elapsed());

        let indexed = self.capacity > 0;
        let h = self.entries.insert(Entry {
            key,
            session,
            last_used: self.tick,
            indexed,
        });
        if indexed {
            self.index.insert(key, h);
            self.evict_to(self.capacity, registry);
        }
        tracing::debug!(%src, indexed, "image cache miss");
        Ok(h)
    }

    /// Borrow an open session.
    pub fn get(&self, h: Handle) -> Option<&DecoderSession> {
        self.entries.get(h).map(|e| &e.session)
    }

    /// Key an open session was cached under.
    pub fn key_of(&self, h: Handle) -> Option<ImageKey> {
        self.entries.get(h).map(|e| e.key)
    }

    /// Mutably borrow an open session.
    pub fn get_mut(&mut self, h: Handle) -> Option<&mut DecoderSession> {
        self.entries.get_mut(h).map(|e| &mut e.session)
    }

    /// Read one row of an entry through its decoder.
    pub fn read_line(
        &mut self,
        registry: &DecoderRegistry,
        h: Handle,
        x: u32,
        y: u32,
        len: u32,
        out: &mut [u8],
    ) -> BlitResult<()> {
        let session = self
            .get_mut(h)
            .ok_or_else(|| BlitError::read_line("image cache entry was evicted"))?;
        registry.read_line(session, x, y, len, out)
    }

    /// Close and forget one entry. Cached entries may be released too.
    pub fn release(&mut self, registry: &DecoderRegistry, h: Handle) -> bool {
        let Some(mut entry) = self.entries.remove(h) else {
            return false;
        };
        if entry.indexed {
            self.index.remove(&entry.key);
        }
        registry.close(&mut entry.session);
        true
    }

    /// Change the capacity, evicting LRU entries when shrinking.
    pub fn set_size(&mut self, registry: &DecoderRegistry, capacity: usize) {
        self.capacity = capacity;
        self.evict_to(capacity, registry);
    }

    /// Drop every entry opened from `src`, whatever its color or frame.
    pub fn invalidate_src(&mut self, registry: &DecoderRegistry, src: &ImageSource) -> usize {
        let id = src.id();
        let stale: Vec<Handle> = self
            .index
            .iter()
            .filter(|(k, _)| k.source == id)
            .map(|(_, &h)| h)
            .collect();
        for &h in &stale {
            self.release(registry, h);
        }
        if !stale.is_empty() {
            tracing::debug!(%src, dropped = stale.len(), "image cache invalidated source");
        }
        stale.len()
    }

    /// Close every session, including unindexed ones still held by callers.
    pub fn clear(&mut self, registry: &DecoderRegistry) {
        for mut entry in self.entries.drain() {
            registry.close(&mut entry.session);
        }
        self.index.clear();
    }

    fn evict_to(&mut self, capacity: usize, registry: &DecoderRegistry) {
        while self.index.len() > capacity {
            let Some(h) = self
                .index
                .values()
                .copied()
                .min_by_key(|&h| self.entries.get(h).map_or(0, |e| e.last_used))
            else {
                break;
            };
            self.release(registry, h);
            self.stats.evictions = self.stats.evictions.saturating_add(1);
        }
    }
}

impl std::fmt::Debug for ImageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageCache")
            .field("capacity", &self.capacity)
            .field("len", &self.index.len())
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cache/image_cache.rs"]
mod tests;
