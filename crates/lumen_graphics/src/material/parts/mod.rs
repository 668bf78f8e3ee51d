//! # Built-in Material Parts
//!
//! | Part                  | Usages            | Depends on                    |
//! |-----------------------|-------------------|-------------------------------|
//! | `VertexTransformPart` | all               | `DepthPart`, `NormalPart`     |
//! | `TexturePart`         | default           |                               |
//! | `SpecularPart`        | default           |                               |
//! | `DepthPart`           | depth             |                               |
//! | `NormalPart`          | normal            |                               |
//! | `ShadowMapPart`       | default           | `EndLightPart`                |
//! | `EndLightPart`        | default           |                               |
//! | `PaintGroupPart`      | nested            | begin/end paint group, nested |

mod depth;
mod lighting;
mod paint;
mod specular;
mod texture;
mod vertex_transform;

pub use depth::{DepthPart, NormalPart};
pub use lighting::{EndLightPart, ShadowMapPart, DEFAULT_FILTER_SIZE, DEFAULT_SHADOW_SEED};
pub use paint::{
    BeginPaintGroupPart, EndPaintGroupPart, PaintGroupPart, CHANNELS_PER_MASK, MAX_MASK_TEXTURES,
};
pub use specular::SpecularPart;
pub use texture::TexturePart;
pub use vertex_transform::VertexTransformPart;
