use tessel_engine::coords::ColorRgba;
use tessel_engine::render::{BlendFactor, BlendState, GraphicsDevice, UniformValue};

use crate::state::RenderState;

/// Material state for a subtree: one colour and a blend configuration.
///
/// Unlike a shader, a presentation node restores the blend state it found
/// once its children have been drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct PresentationNode {
    color: ColorRgba,
    blend: BlendState,
}

impl Default for PresentationNode {
    fn default() -> Self {
        Self::new()
    }
}

impl PresentationNode {
    /// Opaque white, blending off.
    pub fn new() -> Self {
        Self {
            color: ColorRgba::WHITE,
            blend: BlendState::default(),
        }
    }

    /// Blending is enabled iff `color` is translucent.
    pub fn with_color(color: ColorRgba) -> Self {
        let mut node = Self::new();
        node.set_color(color);
        node
    }

    pub fn color(&self) -> ColorRgba {
        self.color
    }

    /// Components are not range-checked. A translucent colour turns blending
    /// on; an opaque one leaves the flag alone.
    pub fn set_color(&mut self, color: ColorRgba) {
        self.color = color;
        if !color.is_opaque() && !self.blend.enabled {
            self.blend.enabled = true;
        }
    }

    pub fn set_blending_enabled(&mut self, enabled: bool) {
        self.blend.enabled = enabled;
    }

    pub fn is_blending_enabled(&self) -> bool {
        self.blend.enabled
    }

    pub fn set_blend_function(&mut self, src: BlendFactor, dst: BlendFactor) {
        self.blend.src = src;
        self.blend.dst = dst;
    }

    pub fn blend_state(&self) -> BlendState {
        self.blend
    }

    /// Applies this node's material and returns the blend state to restore.
    pub fn push(&self, device: &mut dyn GraphicsDevice, state: &RenderState) -> BlendState {
        let saved = device.blend_state();
        device.set_blend_state(self.blend);
        if let Some(slot) = state.material_color_slot {
            device.set_uniform(slot, UniformValue::Vec4(self.color.to_array()));
        }
        saved
    }

    pub fn pop(&self, device: &mut dyn GraphicsDevice, saved: BlendState) {
        device.set_blend_state(saved);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessel_engine::render::RecordingDevice;

    #[test]
    fn defaults_to_opaque_white_without_blending() {
        let node = PresentationNode::new();
        assert_eq!(node.color(), ColorRgba::WHITE);
        assert_eq!(node.blend_state(), BlendState::default());
    }

    #[test]
    fn translucent_color_enables_blending() {
        assert!(PresentationNode::with_color(ColorRgba::new(0.0, 0.0, 1.0, 0.25)).is_blending_enabled());
        assert!(!PresentationNode::with_color(ColorRgba::rgb(1.0, 0.0, 0.0)).is_blending_enabled());
    }

    #[test]
    fn explicit_override_after_color_wins() {
        let mut node = PresentationNode::with_color(ColorRgba::new(1.0, 1.0, 1.0, 0.5));
        node.set_blending_enabled(false);
        assert!(!node.is_blending_enabled());

        // Opaque colour does not switch blending back off.
        node.set_blending_enabled(true);
        node.set_color(ColorRgba::WHITE);
        assert!(node.is_blending_enabled());
    }

    #[test]
    fn push_pop_restores_device_blend() {
        let mut device = RecordingDevice::new();
        let outer = BlendState {
            enabled: true,
            src: BlendFactor::One,
            dst: BlendFactor::Zero,
        };
        device.set_blend_state(outer);

        let mut node = PresentationNode::new();
        node.set_blend_function(BlendFactor::DstAlpha, BlendFactor::OneMinusDstAlpha);
        let saved = node.push(&mut device, &RenderState::default());
        assert_eq!(device.blend_state(), node.blend_state());
        node.pop(&mut device, saved);
        assert_eq!(device.blend_state(), outer);
    }
}
