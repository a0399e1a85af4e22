/// Surface texture acquired for one frame, plus its encoder.
///
/// Hand it back to [`super::Gpu::submit`] promptly; the next frame cannot be
/// acquired while this one is held.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}
