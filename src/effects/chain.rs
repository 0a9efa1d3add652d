use crate::{effects::ops::OperationKind, render::pool::TexturePool, render::texture::Texture};

/// Apply `operations` to `target` in order and return how many ran.
///
/// Operations that read their own input receive a pooled copy of `target` taken just before they
/// run. An operation whose copy cannot be leased, or that fails, is skipped and the chain goes on.
pub fn run_effect_chain(
    pool: &TexturePool,
    operations: &[OperationKind],
    target: &mut Texture,
) -> usize {
    let mut applied = 0;
    for (index, op) in operations.iter().enumerate() {
        let result = if op.needs_source_texture() {
            match pool.request_texture(target.width(), target.height()) {
                Ok(mut source) => match source.copy_from(target) {
                    Ok(()) => op.apply(target, Some(&*source)),
                    Err(err) => Err(err),
                },
                Err(err) => {
                    tracing::warn!(index, error = %err, "no texture for effect input, skipping");
                    continue;
                }
            }
        } else {
            op.apply(target, None)
        };
        match result {
            Ok(()) => applied += 1,
            Err(err) => tracing::warn!(index, error = %err, "effect failed, skipping"),
        }
    }
    applied
}

#[cfg(test)]
#[path = "../../tests/unit/effects/chain.rs"]
mod tests;
