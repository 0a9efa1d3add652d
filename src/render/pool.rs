use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::{
    foundation::error::{LaminaError, LaminaResult},
    render::texture::{PixelFormat, Texture},
};

/// Retention and budget limits for a [`TexturePool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolOpts {
    /// Maximum bytes retained on the free lists across all sizes.
    pub max_retained_bytes: usize,
    /// Maximum number of free textures retained per `(width, height)`.
    pub max_retained_per_size: usize,
    /// Optional cap on bytes leased out at once; requests beyond it fail.
    pub max_leased_bytes: Option<usize>,
    /// Largest accepted width or height.
    pub max_dimension: u32,
}

impl Default for PoolOpts {
    fn default() -> Self {
        Self {
            max_retained_bytes: 256 * 1024 * 1024,
            max_retained_per_size: 8,
            max_leased_bytes: None,
            max_dimension: 16384,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct TextureKey {
    w: u32,
    h: u32,
}

impl TextureKey {
    fn of(tex: &Texture) -> Self {
        Self {
            w: tex.width(),
            h: tex.height(),
        }
    }

    fn byte_len(self) -> usize {
        (self.w as usize)
            .saturating_mul(self.h as usize)
            .saturating_mul(PixelFormat::Rgba8Premul.bytes_per_pixel())
    }
}

/// Pool counters.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PoolStats {
    /// Leases currently outstanding.
    pub leased_textures: usize,
    /// Bytes currently leased out.
    pub leased_bytes: usize,
    /// Free textures waiting for reuse.
    pub retained_textures: usize,
    /// Bytes held by free textures.
    pub retained_bytes: usize,
    /// Fresh allocations since creation.
    pub alloc_textures: u64,
    /// Bytes allocated since creation.
    pub alloc_bytes: u64,
    /// Requests served from a free list.
    pub reused_textures: u64,
    /// Released textures dropped because a retention cap was hit.
    pub dropped_on_release: u64,
}

#[derive(Default)]
struct PoolInner {
    stats: PoolStats,
    free: HashMap<TextureKey, Vec<Texture>>,
}

/// Thread-safe recycler of RGBA render targets keyed by exact `(width, height)`.
///
/// Recycled textures keep whatever pixels they held when released.
pub struct TexturePool {
    opts: PoolOpts,
    inner: Mutex<PoolInner>,
}

impl std::fmt::Debug for TexturePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TexturePool")
            .field("opts", &self.opts)
            .field("stats", &self.stats())
            .finish()
    }
}

impl Default for TexturePool {
    fn default() -> Self {
        Self::new(PoolOpts::default())
    }
}

impl TexturePool {
    /// Empty pool.
    pub fn new(opts: PoolOpts) -> Self {
        Self {
            opts,
            inner: Mutex::new(PoolInner::default()),
        }
    }

    /// Configured limits.
    pub fn opts(&self) -> PoolOpts {
        self.opts
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> PoolStats {
        self.lock_inner().stats.clone()
    }

    fn lock_inner(&self) -> MutexGuard<'_, PoolInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lease a `width x height` RGBA texture, reusing a free one of the same size when possible.
    pub fn request_texture(&self, width: u32, height: u32) -> LaminaResult<TextureLease<'_>> {
        if width == 0 || height == 0 {
            return Err(LaminaError::validation("texture dimensions must be > 0"));
        }
        if width > self.opts.max_dimension || height > self.opts.max_dimension {
            return Err(LaminaError::validation(format!(
                "texture {width}x{height} exceeds max dimension {}",
                self.opts.max_dimension
            )));
        }
        let key = TextureKey { w: width, h: height };
        let bytes = key.byte_len();

        let mut inner = self.lock_inner();
        if let Some(max) = self.opts.max_leased_bytes
            && inner.stats.leased_bytes.saturating_add(bytes) > max
        {
            return Err(LaminaError::evaluation(format!(
                "texture pool budget exhausted ({} of {max} bytes leased)",
                inner.stats.leased_bytes
            )));
        }

        let reused = inner.free.get_mut(&key).and_then(Vec::pop);
        let texture = match reused {
            Some(t) => {
                let st = &mut inner.stats;
                st.retained_textures = st.retained_textures.saturating_sub(1);
                st.retained_bytes = st.retained_bytes.saturating_sub(bytes);
                st.reused_textures = st.reused_textures.saturating_add(1);
                t
            }
            None => {
                let st = &mut inner.stats;
                st.alloc_textures = st.alloc_textures.saturating_add(1);
                st.alloc_bytes = st.alloc_bytes.saturating_add(bytes as u64);
                tracing::trace!(width, height, "texture pool allocation");
                Texture::new(width, height, PixelFormat::Rgba8Premul)?
            }
        };

        inner.stats.leased_textures += 1;
        inner.stats.leased_bytes = inner.stats.leased_bytes.saturating_add(bytes);
        Ok(TextureLease {
            pool: self,
            texture,
            released: false,
        })
    }

    /// Hand a previously detached texture back for reuse.
    pub fn recycle(&self, texture: Texture) {
        if !texture.is_drawable() {
            return;
        }
        let mut inner = self.lock_inner();
        self.retain(&mut inner, texture);
    }

    fn end_lease(&self, texture: Option<Texture>, bytes: usize) {
        let mut inner = self.lock_inner();
        debug_assert!(inner.stats.leased_textures > 0, "lease count underflow");
        inner.stats.leased_textures = inner.stats.leased_textures.saturating_sub(1);
        inner.stats.leased_bytes = inner.stats.leased_bytes.saturating_sub(bytes);
        if let Some(texture) = texture {
            self.retain(&mut inner, texture);
        }
    }

    fn retain(&self, inner: &mut PoolInner, texture: Texture) {
        let key = TextureKey::of(&texture);
        let bytes = key.byte_len();
        if inner.stats.retained_bytes.saturating_add(bytes) > self.opts.max_retained_bytes {
            inner.stats.dropped_on_release = inner.stats.dropped_on_release.saturating_add(1);
            return;
        }
        let bucket = inner.free.entry(key).or_default();
        if bucket.len() >= self.opts.max_retained_per_size {
            inner.stats.dropped_on_release = inner.stats.dropped_on_release.saturating_add(1);
            return;
        }
        bucket.push(texture);
        inner.stats.retained_textures += 1;
        inner.stats.retained_bytes = inner.stats.retained_bytes.saturating_add(bytes);
    }
}

/// Exclusive hold on a pooled texture. Dropping the lease returns the texture to the pool.
#[derive(Debug)]
pub struct TextureLease<'p> {
    pool: &'p TexturePool,
    texture: Texture,
    released: bool,
}

impl TextureLease<'_> {
    /// Take the texture out of the pool's bookkeeping; hand it back later with
    /// [`TexturePool::recycle`] to make it reusable.
    pub fn detach(mut self) -> Texture {
        let bytes = TextureKey::of(&self.texture).byte_len();
        let texture = std::mem::replace(&mut self.texture, Texture::detached_placeholder());
        self.released = true;
        self.pool.end_lease(None, bytes);
        texture
    }
}

impl Deref for TextureLease<'_> {
    type Target = Texture;

    fn deref(&self) -> &Texture {
        &self.texture
    }
}

impl DerefMut for TextureLease<'_> {
    fn deref_mut(&mut self) -> &mut Texture {
        &mut self.texture
    }
}

impl Drop for TextureLease<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        let bytes = TextureKey::of(&self.texture).byte_len();
        let texture = std::mem::replace(&mut self.texture, Texture::detached_placeholder());
        self.pool.end_lease(Some(texture), bytes);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/pool.rs"]
mod tests;
