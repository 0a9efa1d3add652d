use std::sync::Arc;

use crate::render::{
    pool::{PoolOpts, TexturePool},
    texture::SamplingMode,
};

/// Render-wide settings.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RenderSettings {
    /// Texture filtering used by the blend stage.
    pub sampling: SamplingMode,
    /// Limits of the pool created by [`RenderContext::new`].
    pub pool: PoolOpts,
}

/// Explicit rendering state threaded through every render call.
///
/// Cloning is cheap and clones share one [`TexturePool`], so a context can be handed to several
/// threads rendering independent frames.
#[derive(Clone, Debug)]
pub struct RenderContext {
    pool: Arc<TexturePool>,
    settings: RenderSettings,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::new(RenderSettings::default())
    }
}

impl RenderContext {
    /// Context with its own pool.
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            pool: Arc::new(TexturePool::new(settings.pool)),
            settings,
        }
    }

    /// Context sharing an existing pool; `settings.pool` is ignored.
    pub fn with_pool(pool: Arc<TexturePool>, settings: RenderSettings) -> Self {
        Self { pool, settings }
    }

    /// Shared texture pool.
    pub fn pool(&self) -> &TexturePool {
        &self.pool
    }

    /// Shared texture pool handle.
    pub fn pool_handle(&self) -> Arc<TexturePool> {
        Arc::clone(&self.pool)
    }

    /// Settings.
    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }
}
