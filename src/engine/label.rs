//! Text labels: a string rasterised into a small 2D canvas and shown as a
//! camera-facing sprite.

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::engine::scene::{Node, NodeId, NodeKind, Scene, SpriteSizing, TextureSource};
use crate::error::ViewerError;

pub const FONT_SIZE: f64 = 40.0;
pub const LABEL_SCALE: (f32, f32) = (20.0, 10.0);

#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font_size: f64,
    pub font_family: &'static str,
    pub bold: bool,
    pub fill: &'static str,
}

impl Default for TextStyle {
    fn default() -> Self {
        TextStyle {
            font_size: FONT_SIZE,
            font_family: "Arial",
            bold: true,
            fill: "#ffffff",
        }
    }
}

impl TextStyle {
    pub fn css_font(&self) -> String {
        if self.bold {
            format!("Bold {}px {}", self.font_size, self.font_family)
        } else {
            format!("{}px {}", self.font_size, self.font_family)
        }
    }
}

/// Draws `text` on a fresh canvas of the browser's default size. Text past the
/// right edge is clipped.
pub fn rasterize_text(text: &str, style: &TextStyle) -> Result<HtmlCanvasElement, ViewerError> {
    let document = web_sys::window()
        .ok_or(ViewerError::NoWindow)?
        .document()
        .ok_or(ViewerError::NoDocument)?;
    let canvas = document
        .create_element("canvas")?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| ViewerError::ResourceCreation("label canvas"))?;
    let ctx = canvas
        .get_context("2d")?
        .ok_or(ViewerError::Canvas2dUnavailable)?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|_| ViewerError::Canvas2dUnavailable)?;

    ctx.set_font(&style.css_font());
    js_sys::Reflect::set(
        ctx.as_ref(),
        &JsValue::from_str("fillStyle"),
        &JsValue::from_str(style.fill),
    )?;
    ctx.fill_text(text, 0.0, style.font_size)?;

    Ok(canvas)
}

/// Adds a label sprite for `text` under `parent`. The sprite keeps a fixed
/// on-screen size, matching its world size at `reference_distance`.
pub fn create_text_sprite(
    scene: &mut Scene,
    textures: &mut impl TextureSource,
    text: &str,
    reference_distance: f32,
    parent: Option<NodeId>,
) -> Result<NodeId, ViewerError> {
    let map = textures.text_texture(text)?;
    let sprite = Node::new(NodeKind::Sprite {
        map,
        sizing: SpriteSizing::Screen { reference_distance },
    })
    .with_scale(LABEL_SCALE.0, LABEL_SCALE.1, 1.0);
    Ok(scene.add(sprite, parent))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_font() {
        assert_eq!(TextStyle::default().css_font(), "Bold 40px Arial");
        let plain = TextStyle { bold: false, ..Default::default() };
        assert_eq!(plain.css_font(), "40px Arial");
    }
}
