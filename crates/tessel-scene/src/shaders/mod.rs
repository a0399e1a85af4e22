//! Programs bundled with the scene crate.
//!
//! Binding names are part of the contract with [`crate::nodes::ShaderKind`]:
//! `position` and `color` attributes, `ortho_matrix`, `color`, `point_size`
//! and `viewport` uniforms.

use tessel_engine::render::ProgramSource;

/// Flat-coloured geometry: projection plus one material colour.
pub const BASIC: ProgramSource<'static> = ProgramSource {
    label: "basic",
    vertex: include_str!("basic.vert.wgsl"),
    fragment: include_str!("basic.frag.wgsl"),
};

/// Per-vertex colour, no material colour.
pub const VERTEX_COLOR: ProgramSource<'static> = ProgramSource {
    label: "vertex_color",
    vertex: include_str!("vertex_color.vert.wgsl"),
    fragment: include_str!("vertex_color.frag.wgsl"),
};

/// Square points sized in pixels.
pub const POINTS: ProgramSource<'static> = ProgramSource {
    label: "points",
    vertex: include_str!("points.vert.wgsl"),
    fragment: include_str!("points.frag.wgsl"),
};

#[cfg(test)]
mod tests {
    use super::*;
    use tessel_engine::render::link_program;

    #[test]
    fn bundled_programs_link() {
        for source in [BASIC, VERTEX_COLOR, POINTS] {
            let iface = link_program(&source).unwrap_or_else(|e| panic!("{e}"));
            assert!(iface.attribute("position").is_some(), "{}", source.label);
            assert!(iface.uniform("ortho_matrix").is_some(), "{}", source.label);
        }
    }

    #[test]
    fn point_uniform_layout() {
        let iface = link_program(&POINTS).unwrap();
        let size = iface.uniform("point_size").and_then(|s| iface.uniform_info(s)).unwrap();
        let viewport = iface.uniform("viewport").and_then(|s| iface.uniform_info(s)).unwrap();
        assert_eq!((size.offset, size.size), (80, 4));
        assert_eq!((viewport.offset, viewport.size), (88, 8));
        assert_eq!(iface.uniform_block_size, 96);
    }

    #[test]
    fn vertex_color_reads_color_attribute() {
        let iface = link_program(&VERTEX_COLOR).unwrap();
        assert_eq!(iface.attribute("color").map(|s| s.0), Some(1));
        assert!(iface.uniform("color").is_none());
    }
}
