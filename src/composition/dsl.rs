use std::sync::Arc;

use crate::{
    composition::model::{Composition, RenderLayer},
    foundation::core::{Fps, Size},
    foundation::error::LaminaResult,
};

/// Fluent construction of a validated [`Composition`].
pub struct CompositionBuilder {
    render_size: Size,
    fps: Fps,
    layers: Vec<Arc<RenderLayer>>,
}

impl CompositionBuilder {
    /// Start an empty timeline.
    pub fn new(render_size: Size, fps: Fps) -> Self {
        Self {
            render_size,
            fps,
            layers: Vec::new(),
        }
    }

    /// Append a top-level layer.
    pub fn layer(mut self, layer: RenderLayer) -> Self {
        self.layers.push(Arc::new(layer));
        self
    }

    /// Append an already shared top-level layer.
    pub fn shared_layer(mut self, layer: Arc<RenderLayer>) -> Self {
        self.layers.push(layer);
        self
    }

    /// Validate and finish.
    pub fn build(self) -> LaminaResult<Composition> {
        let comp = Composition {
            render_size: self.render_size,
            fps: self.fps,
            layers: self.layers,
        };
        comp.validate()?;
        Ok(comp)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/composition/dsl.rs"]
mod tests;
