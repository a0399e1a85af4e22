//! Program compilation and interface reflection.
//!
//! Each stage is parsed and validated on the CPU with naga before any GPU
//! object exists, so malformed sources surface as [`DeviceError`]s instead of
//! device-level validation panics. Linking then checks the stage interfaces
//! against each other and reflects the vertex attributes and the uniform block
//! that callers look up by name.

use naga::valid::{Capabilities, ValidationFlags, Validator};

use super::device::{AttributeSlot, DeviceError, ShaderStage, UniformSlot};

/// WGSL sources of a two-stage program.
///
/// Each stage is a separate module and must contain exactly the entry point
/// for its stage. Uniforms live in one struct bound at `@group(0) @binding(0)`;
/// when both stages declare it, the layouts must match.
#[derive(Debug, Copy, Clone)]
pub struct ProgramSource<'a> {
    pub label: &'a str,
    pub vertex: &'a str,
    pub fragment: &'a str,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct AttributeInfo {
    pub name: String,
    pub slot: AttributeSlot,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct UniformInfo {
    pub name: String,
    /// Byte offset inside the uniform block.
    pub offset: u32,
    /// Byte size of the member.
    pub size: u32,
}

/// Reflected interface of a linked program.
#[derive(Debug, Clone, Default)]
pub struct ProgramInterface {
    pub vertex_entry: String,
    pub fragment_entry: String,
    pub attributes: Vec<AttributeInfo>,
    pub uniforms: Vec<UniformInfo>,
    /// Size of the uniform block in bytes; zero when the program has none.
    pub uniform_block_size: u32,
}

impl ProgramInterface {
    pub fn attribute(&self, name: &str) -> Option<AttributeSlot> {
        self.attributes.iter().find(|a| a.name == name).map(|a| a.slot)
    }

    pub fn uniform(&self, name: &str) -> Option<UniformSlot> {
        self.uniforms
            .iter()
            .position(|u| u.name == name)
            .map(|i| UniformSlot(i as u32))
    }

    pub fn uniform_info(&self, slot: UniformSlot) -> Option<&UniformInfo> {
        self.uniforms.get(slot.0 as usize)
    }

    pub fn has_uniform_block(&self) -> bool {
        self.uniform_block_size > 0
    }
}

/// Compiles both stages and links them into a [`ProgramInterface`].
pub fn link_program(source: &ProgramSource<'_>) -> Result<ProgramInterface, DeviceError> {
    let vertex = compile_stage(source.label, ShaderStage::Vertex, source.vertex)?;
    let fragment = compile_stage(source.label, ShaderStage::Fragment, source.fragment)?;

    let link_error = |message: String| DeviceError::Link {
        label: source.label.to_string(),
        message,
    };

    let vs_entry = find_entry(&vertex, naga::ShaderStage::Vertex)
        .ok_or_else(|| link_error("vertex source declares no @vertex entry point".into()))?;
    let fs_entry = find_entry(&fragment, naga::ShaderStage::Fragment)
        .ok_or_else(|| link_error("fragment source declares no @fragment entry point".into()))?;

    let mut attributes = Vec::new();
    for arg in &vs_entry.function.arguments {
        collect_locations(&vertex, arg.name.as_deref(), arg.ty, arg.binding.as_ref(), &mut attributes);
    }
    attributes.sort_by_key(|(_, location)| *location);

    let mut outputs = Vec::new();
    if let Some(result) = &vs_entry.function.result {
        collect_locations(&vertex, None, result.ty, result.binding.as_ref(), &mut outputs);
    }

    let mut inputs = Vec::new();
    for arg in &fs_entry.function.arguments {
        collect_locations(&fragment, arg.name.as_deref(), arg.ty, arg.binding.as_ref(), &mut inputs);
    }

    for (name, location) in &inputs {
        if !outputs.iter().any(|(_, out)| out == location) {
            return Err(link_error(format!(
                "fragment input '{name}' at location {location} is not written by the vertex stage"
            )));
        }
    }

    let vs_block = uniform_block(&vertex).map_err(link_error)?;
    let fs_block = uniform_block(&fragment).map_err(link_error)?;

    let block = match (vs_block, fs_block) {
        (Some(vs), Some(fs)) if vs != fs => {
            return Err(link_error(
                "vertex and fragment stages declare different uniform block layouts".into(),
            ));
        }
        (Some(vs), _) => Some(vs),
        (None, fs) => fs,
    };

    let (uniforms, uniform_block_size) = match block {
        Some(b) => (b.members, b.size),
        None => (Vec::new(), 0),
    };

    Ok(ProgramInterface {
        vertex_entry: vs_entry.name.clone(),
        fragment_entry: fs_entry.name.clone(),
        attributes: attributes
            .into_iter()
            .map(|(name, location)| AttributeInfo {
                name,
                slot: AttributeSlot(location),
            })
            .collect(),
        uniforms,
        uniform_block_size,
    })
}

fn compile_stage(label: &str, stage: ShaderStage, source: &str) -> Result<naga::Module, DeviceError> {
    let compile_error = |message: String| DeviceError::Compile {
        label: label.to_string(),
        stage,
        message,
    };

    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| compile_error(e.emit_to_string(source)))?;

    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|e| compile_error(e.to_string()))?;

    Ok(module)
}

fn find_entry(module: &naga::Module, stage: naga::ShaderStage) -> Option<&naga::EntryPoint> {
    module.entry_points.iter().find(|ep| ep.stage == stage)
}

/// Collects `@location` bindings, descending into struct-typed arguments.
fn collect_locations(
    module: &naga::Module,
    name: Option<&str>,
    ty: naga::Handle<naga::Type>,
    binding: Option<&naga::Binding>,
    out: &mut Vec<(String, u32)>,
) {
    match binding {
        Some(naga::Binding::Location { location, .. }) => {
            out.push((name.unwrap_or_default().to_string(), *location));
        }
        Some(_) => {}
        None => {
            if let naga::TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    collect_locations(
                        module,
                        member.name.as_deref(),
                        member.ty,
                        member.binding.as_ref(),
                        out,
                    );
                }
            }
        }
    }
}

#[derive(Debug, PartialEq)]
struct UniformBlock {
    members: Vec<UniformInfo>,
    size: u32,
}

fn uniform_block(module: &naga::Module) -> Result<Option<UniformBlock>, String> {
    let mut block = None;

    for (_, var) in module.global_variables.iter() {
        let Some(binding) = &var.binding else { continue };
        let name = var.name.as_deref().unwrap_or("<unnamed>");

        if var.space != naga::AddressSpace::Uniform || binding.group != 0 || binding.binding != 0 {
            return Err(format!(
                "resource '{name}' at @group({}) @binding({}) is not supported; \
                 only a uniform struct at @group(0) @binding(0)",
                binding.group, binding.binding
            ));
        }

        let naga::TypeInner::Struct { members, span } = &module.types[var.ty].inner else {
            return Err(format!("uniform '{name}' must be a struct"));
        };

        let gctx = module.to_ctx();
        block = Some(UniformBlock {
            members: members
                .iter()
                .map(|m| UniformInfo {
                    name: m.name.clone().unwrap_or_default(),
                    offset: m.offset,
                    size: module.types[m.ty].inner.size(gctx),
                })
                .collect(),
            size: *span,
        });
    }

    Ok(block)
}
