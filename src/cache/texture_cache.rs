use std::collections::HashMap;

use crate::cache::arena::{Arena, Handle};
use crate::decode::source::SourceId;
use crate::foundation::core::{Opa, Rgba8};
use crate::foundation::error::{BlitError, BlitResult};
use crate::foundation::math::next_pow2;

/// Content-addressed texture identity.
///
/// Each variant is its own key space, so entries of different kinds never collide even when
/// their numeric fields agree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureKey {
    /// Top-left corner coverage of a rounded rectangle background.
    RectBg {
        /// Effective corner radius.
        radius: i32,
        /// Fragment edge length.
        size: u32,
    },
    /// Blurred top-left corner of a rectangle shadow.
    RectShadow {
        /// Effective corner radius of the shadow core.
        radius: i32,
        /// Fragment edge length.
        size: u32,
        /// Shadow width.
        blur: i32,
    },
    /// Top-left corner of a rounded border ring.
    RectBorder {
        /// Outer radius.
        rout: i32,
        /// Inner radius.
        rin: i32,
        /// Border thickness.
        thickness: i32,
        /// Fragment edge length.
        size: u32,
    },
    /// Uploaded image pixels.
    Image {
        /// Source identity.
        source: SourceId,
        /// Recolor target.
        color: Rgba8,
        /// Recolor strength.
        recolor_opa: Opa,
        /// Animation frame.
        frame_id: u32,
    },
    /// Reusable scratch target, sized to powers of two.
    Scratch {
        /// Caller-chosen slot so concurrent scratch uses do not alias.
        slot: u8,
        /// Padded width.
        width: u32,
        /// Padded height.
        height: u32,
    },
}

/// Entry flags for [`TextureCache::put`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextureFlags {
    /// The cache owns the texture: evicted copies are handed back for destruction.
    pub managed: bool,
    /// Never evicted by the LRU policy.
    pub pinned: bool,
}

impl TextureFlags {
    /// Cache-owned, evictable.
    pub const MANAGED: Self = Self {
        managed: true,
        pinned: false,
    };
    /// Externally owned, evictable.
    pub const BORROWED: Self = Self {
        managed: false,
        pinned: false,
    };
}

/// Callback run once when an entry leaves the cache.
pub type FreeFn<T> = Box<dyn FnOnce(&TextureKey, &T) + Send>;

/// An entry removed from the cache. Managed textures must be destroyed by the receiver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Evicted<T> {
    /// Its key.
    pub key: TextureKey,
    /// The texture handle.
    pub texture: T,
    /// Whether the cache owned it.
    pub managed: bool,
}

/// Result of [`TextureCache::get_scratch`].
#[derive(Clone, Debug)]
pub struct ScratchTexture<T> {
    /// The scratch texture.
    pub texture: T,
    /// Its padded width.
    pub width: u32,
    /// Its padded height.
    pub height: u32,
    /// Entries pushed out by the insertion, if any.
    pub evicted: Vec<Evicted<T>>,
}

/// Counters for [`TextureCache`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextureCacheStats {
    /// Successful lookups.
    pub hits: u64,
    /// Failed lookups.
    pub misses: u64,
    /// Inserted entries.
    pub inserts: u64,
    /// Entries dropped by the LRU policy.
    pub evictions: u64,
}

struct Entry<T> {
    key: TextureKey,
    texture: T,
    flags: TextureFlags,
    free: Option<FreeFn<T>>,
    last_used: u64,
}

/// Strict-LRU map from [`TextureKey`] to texture handles of type `T`.
pub struct TextureCache<T> {
    capacity: usize,
    max_tile: u32,
    entries: Arena<Entry<T>>,
    index: HashMap<TextureKey, Handle>,
    tick: u64,
    stats: TextureCacheStats,
}

impl<T: Clone> TextureCache<T> {
    /// Empty cache. `max_tile` caps scratch texture dimensions.
    pub fn new(capacity: usize, max_tile: u32) -> Self {
        Self {
            capacity,
            max_tile: max_tile.max(1),
            entries: Arena::new(),
            index: HashMap::new(),
            tick: 0,
            stats: TextureCacheStats::default(),
        }
    }

    /// Maximum entry count.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current entry count.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> TextureCacheStats {
        self.stats
    }

    /// Look up `key` and mark it most recently used.
    pub fn get(&mut self, key: &TextureKey) -> Option<T> {
        self.tick += 1;
        let found = self
            .index
            .get(key)
            .and_then(|&h| self.entries.get_mut(h))
            .map(|e| {
                e.last_used = self.tick;
                e.texture.clone()
            });
        if found.is_some() {
            self.stats.hits = self.stats.hits.saturating_add(1);
        } else {
            self.stats.misses = self.stats.misses.saturating_add(1);
        }
        found
    }

    /// Look up `key` without touching LRU order.
    pub fn peek(&self, key: &TextureKey) -> Option<&T> {
        self.index
            .get(key)
            .and_then(|&h| self.entries.get(h))
            .map(|e| &e.texture)
    }

    /// Insert or replace `key`. Returns whatever left the cache as a result.
    pub fn put(&mut self, key: TextureKey, texture: T, flags: TextureFlags) -> Vec<Evicted<T>> {
        self.insert(key, texture, flags, None)
    }

    /// Like [`TextureCache::put`], running `free` when the entry later leaves the cache.
    pub fn put_with_free(
        &mut self,
        key: TextureKey,
        texture: T,
        flags: TextureFlags,
        free: FreeFn<T>,
    ) -> Vec<Evicted<T>> {
        self.insert(key, texture, flags, Some(free))
    }

    /// Remove `key`, running its free callback.
    pub fn remove(&mut self, key: &TextureKey) -> Option<Evicted<T>> {
        let h = self.index.remove(key)?;
        self.entries.remove(h).map(finish)
    }

    /// Remove every entry whose key matches `pred`.
    pub fn remove_where(&mut self, mut pred: impl FnMut(&TextureKey) -> bool) -> Vec<Evicted<T>> {
        let keys: Vec<TextureKey> = self.index.keys().filter(|k| pred(k)).copied().collect();
        keys.iter().filter_map(|k| self.remove(k)).collect()
    }

    /// Pin or unpin an entry. Returns `false` if the key is absent.
    pub fn set_pinned(&mut self, key: &TextureKey, pinned: bool) -> bool {
        match self.index.get(key).and_then(|&h| self.entries.get_mut(h)) {
            Some(e) => {
                e.flags.pinned = pinned;
                true
            }
            None => false,
        }
    }

    /// Remove everything, pinned entries included.
    pub fn clear(&mut self) -> Vec<Evicted<T>> {
        self.index.clear();
        self.entries.drain().into_iter().map(finish).collect()
    }

    /// Change capacity, evicting when shrinking.
    pub fn set_capacity(&mut self, capacity: usize) -> Vec<Evicted<T>> {
        self.capacity = capacity;
        self.trim()
    }

    /// A scratch texture at least `width x height`, padded to powers of two.
    ///
    /// Requests of similar size share one backing texture per slot. `create` is called with
    /// the padded size only on a miss; if it fails nothing is inserted.
    pub fn get_scratch(
        &mut self,
        slot: u8,
        width: u32,
        height: u32,
        create: impl FnOnce(u32, u32) -> BlitResult<T>,
    ) -> BlitResult<ScratchTexture<T>> {
        if width > self.max_tile || height > self.max_tile {
            return Err(BlitError::validation(format!(
                "scratch {width}x{height} exceeds the {} tile limit",
                self.max_tile
            )));
        }
        let pw = next_pow2(width).min(self.max_tile);
        let ph = next_pow2(height).min(self.max_tile);
        let key = TextureKey::Scratch {
            slot,
            width: pw,
            height: ph,
        };
        if let Some(texture) = self.get(&key) {
            return Ok(ScratchTexture {
                texture,
                width: pw,
                height: ph,
                evicted: Vec::new(),
            });
        }
        let texture = create(pw, ph)?;
        let evicted = self.put(key, texture.clone(), TextureFlags::MANAGED);
        Ok(ScratchTexture {
            texture,
            width: pw,
            height: ph,
            evicted,
        })
    }

    fn insert(
        &mut self,
        key: TextureKey,
        texture: T,
        flags: TextureFlags,
        free: Option<FreeFn<T>>,
    ) -> Vec<Evicted<T>> {
        let mut out = Vec::new();
        if let Some(old) = self.remove(&key) {
            out.push(old);
        }
        self.tick += 1;
        let h = self.entries.insert(Entry {
            key,
            texture,
            flags,
            free,
            last_used: self.tick,
        });
        self.index.insert(key, h);
        self.stats.inserts = self.stats.inserts.saturating_add(1);
        self.evict_over_capacity(&mut out, Some(key));
        out
    }

    /// Evict least recently used entries until the cache fits its capacity again.
    ///
    /// Inserts never evict the entry they add, so while entries are pinned the cache can
    /// hold more than `capacity`; call this once the pins are released.
    pub fn trim(&mut self) -> Vec<Evicted<T>> {
        let mut out = Vec::new();
        self.evict_over_capacity(&mut out, None);
        out
    }

    fn evict_over_capacity(&mut self, out: &mut Vec<Evicted<T>>, keep: Option<TextureKey>) {
        while self.index.len() > self.capacity {
            let victim = self
                .index
                .values()
                .copied()
                .filter_map(|h| self.entries.get(h).map(|e| (h, e)))
                .filter(|(_, e)| !e.flags.pinned && Some(e.key) != keep)
                .min_by_key(|(_, e)| e.last_used)
                .map(|(h, e)| (h, e.key));
            let Some((h, key)) = victim else {
                tracing::debug!(
                    len = self.index.len(),
                    capacity = self.capacity,
                    "texture cache over capacity until pins are released"
                );
                break;
            };
            self.index.remove(&key);
            if let Some(e) = self.entries.remove(h) {
                tracing::debug!(?key, "texture cache eviction");
                self.stats.evictions = self.stats.evictions.saturating_add(1);
                out.push(finish(e));
            }
        }
    }
}

fn finish<T>(mut e: Entry<T>) -> Evicted<T> {
    if let Some(free) = e.free.take() {
        free(&e.key, &e.texture);
    }
    Evicted {
        key: e.key,
        texture: e.texture,
        managed: e.flags.managed,
    }
}

impl<T> std::fmt::Debug for TextureCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureCache")
            .field("capacity", &self.capacity)
            .field("len", &self.index.len())
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cache/texture_cache.rs"]
mod tests;
