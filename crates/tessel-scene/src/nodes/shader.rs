use tessel_engine::render::{
    AttributeSlot, GraphicsDevice, ProgramId, ProgramSource, UniformSlot, UniformValue,
};

use crate::error::SceneError;
use crate::shaders;
use crate::state::RenderState;

pub const DEFAULT_POINT_SIZE: f32 = 8.0;

/// Binding contract a program must satisfy.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderKind {
    /// `position`; `ortho_matrix`, `color`.
    Basic,
    /// `position`, `color` attributes; `ortho_matrix`.
    VertexColor,
    /// `position`; `ortho_matrix`, `color`, `point_size`, `viewport`.
    Points,
}

impl ShaderKind {
    /// The bundled program for this kind.
    pub fn bundled_source(self) -> ProgramSource<'static> {
        match self {
            ShaderKind::Basic => shaders::BASIC,
            ShaderKind::VertexColor => shaders::VERTEX_COLOR,
            ShaderKind::Points => shaders::POINTS,
        }
    }

    fn has_vertex_color(self) -> bool {
        self == ShaderKind::VertexColor
    }

    fn has_material_color(self) -> bool {
        self != ShaderKind::VertexColor
    }
}

/// Slots resolved once after link.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ShaderBindings {
    pub position: AttributeSlot,
    pub vertex_color: Option<AttributeSlot>,
    pub projection: UniformSlot,
    pub material_color: Option<UniformSlot>,
    pub point_size: Option<UniformSlot>,
    pub viewport: Option<UniformSlot>,
}

/// Owns a linked program and its resolved bindings.
///
/// Drawing binds the program and writes the projection, then publishes the
/// bindings through [`RenderState`] for the subtree. Nothing is restored
/// afterwards: the program stays bound for whatever is drawn next.
#[derive(Debug)]
pub struct ShaderNode {
    kind: ShaderKind,
    label: String,
    program: Option<ProgramId>,
    bindings: Option<ShaderBindings>,
    point_size: f32,
}

impl ShaderNode {
    pub fn new(kind: ShaderKind) -> Self {
        Self {
            kind,
            label: kind.bundled_source().label.to_string(),
            program: None,
            bindings: None,
            point_size: DEFAULT_POINT_SIZE,
        }
    }

    /// Creates, links and resolves the bundled program for `kind`.
    pub fn bundled(kind: ShaderKind, device: &mut dyn GraphicsDevice) -> Result<Self, SceneError> {
        let mut node = Self::new(kind);
        node.create(device, &kind.bundled_source())?;
        if let Err(err) = node.get_locations(device) {
            node.destroy(device);
            return Err(err);
        }
        Ok(node)
    }

    pub fn kind(&self) -> ShaderKind {
        self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn program(&self) -> Option<ProgramId> {
        self.program
    }

    pub fn bindings(&self) -> Option<&ShaderBindings> {
        self.bindings.as_ref()
    }

    /// Compiles and links `source`. A previous program is released first.
    pub fn create(
        &mut self,
        device: &mut dyn GraphicsDevice,
        source: &ProgramSource<'_>,
    ) -> Result<(), SceneError> {
        self.destroy(device);
        self.label = source.label.to_string();

        let program = device
            .create_program(source)
            .map_err(|e| SceneError::resource(&self.label, e))?;
        log::debug!("linked program '{}'", self.label);
        self.program = Some(program);
        Ok(())
    }

    /// Resolves every binding the kind requires. Must follow [`Self::create`].
    pub fn get_locations(&mut self, device: &dyn GraphicsDevice) -> Result<(), SceneError> {
        let Some(program) = self.program else {
            return Err(SceneError::NotCreated {
                node: self.label.clone(),
            });
        };
        let missing = |name: &str| SceneError::Configuration {
            node: self.label.clone(),
            missing: name.to_string(),
        };
        let attribute = |name: &str| device.attribute_slot(program, name).ok_or_else(|| missing(name));
        let uniform = |name: &str| device.uniform_slot(program, name).ok_or_else(|| missing(name));

        let kind = self.kind;
        let bindings = ShaderBindings {
            position: attribute("position")?,
            vertex_color: kind.has_vertex_color().then(|| attribute("color")).transpose()?,
            projection: uniform("ortho_matrix")?,
            material_color: kind.has_material_color().then(|| uniform("color")).transpose()?,
            point_size: (kind == ShaderKind::Points)
                .then(|| uniform("point_size"))
                .transpose()?,
            viewport: (kind == ShaderKind::Points).then(|| uniform("viewport")).transpose()?,
        };
        self.bindings = Some(bindings);
        Ok(())
    }

    /// Program linked and bindings resolved.
    pub fn is_ready(&self) -> bool {
        self.program.is_some() && self.bindings.is_some()
    }

    pub fn point_size(&self) -> f32 {
        self.point_size
    }

    /// Pixel size used by point programs; ignored by the other kinds.
    pub fn set_point_size(&mut self, size: f32) {
        self.point_size = size.max(1.0);
    }

    /// Activates the program and publishes its bindings.
    ///
    /// Returns `false` when the node is not ready; the caller skips the subtree.
    pub fn draw(&self, device: &mut dyn GraphicsDevice, state: &mut RenderState) -> bool {
        let (Some(program), Some(b)) = (self.program, self.bindings) else {
            return false;
        };

        device.use_program(program);
        device.set_uniform(b.projection, UniformValue::Mat4(state.projection));
        if let Some(slot) = b.point_size {
            device.set_uniform(slot, UniformValue::Float(self.point_size));
        }
        if let Some(slot) = b.viewport {
            device.set_uniform(slot, UniformValue::Vec2(state.viewport));
        }

        state.position_slot = Some(b.position);
        state.vertex_color_slot = b.vertex_color;
        state.projection_slot = Some(b.projection);
        state.material_color_slot = b.material_color;
        true
    }

    /// Releases the program. Safe to call repeatedly.
    pub fn destroy(&mut self, device: &mut dyn GraphicsDevice) {
        if let Some(program) = self.program.take() {
            device.delete_program(program);
            log::debug!("released program '{}'", self.label);
        }
        self.bindings = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessel_engine::render::{DeviceCommand, DeviceError, RecordingDevice};

    #[test]
    fn bundled_kinds_resolve_bindings() {
        let mut device = RecordingDevice::new();
        for kind in [ShaderKind::Basic, ShaderKind::VertexColor, ShaderKind::Points] {
            let node = ShaderNode::bundled(kind, &mut device).unwrap();
            assert!(node.is_ready());
            let b = node.bindings().unwrap();
            assert_eq!(b.vertex_color.is_some(), kind == ShaderKind::VertexColor);
            assert_eq!(b.material_color.is_some(), kind != ShaderKind::VertexColor);
            assert_eq!(b.point_size.is_some(), kind == ShaderKind::Points);
        }
    }

    #[test]
    fn compile_failure_is_resource_error() {
        let mut device = RecordingDevice::new();
        let mut node = ShaderNode::new(ShaderKind::Basic);
        let broken = ProgramSource {
            label: "broken",
            vertex: "@vertex fn vs_main( {",
            fragment: shaders::BASIC.fragment,
        };
        let err = node.create(&mut device, &broken).unwrap_err();
        assert!(matches!(
            err,
            SceneError::ResourceCreation {
                source: DeviceError::Compile { .. },
                ..
            }
        ));
        assert!(!node.is_ready());
        assert_eq!(device.live_program_count(), 0);
    }

    #[test]
    fn missing_binding_is_configuration_error() {
        let mut device = RecordingDevice::new();
        let mut node = ShaderNode::new(ShaderKind::Points);
        node.create(&mut device, &shaders::BASIC).unwrap();
        let err = node.get_locations(&device).unwrap_err();
        assert_eq!(
            err,
            SceneError::Configuration {
                node: "basic".into(),
                missing: "point_size".into()
            }
        );
        assert!(!node.is_ready());
    }

    #[test]
    fn locations_before_create_fail() {
        let device = RecordingDevice::new();
        let mut node = ShaderNode::new(ShaderKind::Basic);
        assert!(matches!(node.get_locations(&device), Err(SceneError::NotCreated { .. })));
    }

    #[test]
    fn draw_binds_program_and_publishes_slots() {
        let mut device = RecordingDevice::new();
        let node = ShaderNode::bundled(ShaderKind::VertexColor, &mut device).unwrap();
        let mut state = RenderState::default();
        state.material_color_slot = Some(UniformSlot(7));

        assert!(node.draw(&mut device, &mut state));
        assert_eq!(device.bound_program(), node.program());
        assert!(state.vertex_color_slot.is_some());
        assert_eq!(state.material_color_slot, None);
        assert!(device.commands().iter().any(|c| matches!(
            c,
            DeviceCommand::SetUniform { value: UniformValue::Mat4(_), .. }
        )));
    }

    #[test]
    fn destroy_is_idempotent() {
        let mut device = RecordingDevice::new();
        let mut node = ShaderNode::bundled(ShaderKind::Basic, &mut device).unwrap();
        node.destroy(&mut device);
        node.destroy(&mut device);
        assert_eq!(device.live_program_count(), 0);
        assert!(!node.draw(&mut device, &mut RenderState::default()));
    }

    #[test]
    fn point_size_has_a_floor() {
        let mut node = ShaderNode::new(ShaderKind::Points);
        assert_eq!(node.point_size(), DEFAULT_POINT_SIZE);
        node.set_point_size(0.0);
        assert_eq!(node.point_size(), 1.0);
    }
}
