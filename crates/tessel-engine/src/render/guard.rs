use super::device::{BufferId, BufferKind, DeviceError, GraphicsDevice};

/// Scoped ownership of freshly created device buffers.
///
/// Buffers created through the guard are released when it drops, unless
/// [`ResourceGuard::commit`] was called. Multi-step creation uses this so a
/// failure half-way leaves nothing allocated.
pub struct ResourceGuard<'d> {
    device: &'d mut dyn GraphicsDevice,
    buffers: Vec<BufferId>,
}

impl<'d> ResourceGuard<'d> {
    pub fn new(device: &'d mut dyn GraphicsDevice) -> Self {
        Self {
            device,
            buffers: Vec::new(),
        }
    }

    pub fn create_buffer(&mut self, kind: BufferKind, contents: &[u8]) -> Result<BufferId, DeviceError> {
        let id = self.device.create_buffer(kind, contents)?;
        self.buffers.push(id);
        Ok(id)
    }

    /// Keeps every buffer created so far.
    pub fn commit(mut self) {
        self.buffers.clear();
    }
}

impl Drop for ResourceGuard<'_> {
    fn drop(&mut self) {
        if self.buffers.is_empty() {
            return;
        }
        log::debug!("releasing {} buffer(s) from an uncommitted guard", self.buffers.len());
        for id in self.buffers.drain(..) {
            self.device.delete_buffer(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RecordingDevice;

    fn build_pair(device: &mut dyn GraphicsDevice) -> Result<(BufferId, BufferId), DeviceError> {
        let mut guard = ResourceGuard::new(device);
        let vertices = guard.create_buffer(BufferKind::Vertex, &[0; 8])?;
        let indices = guard.create_buffer(BufferKind::Index, &[0; 4])?;
        guard.commit();
        Ok((vertices, indices))
    }

    #[test]
    fn failure_midway_leaves_nothing_behind() {
        let mut dev = RecordingDevice::new();
        dev.fail_allocations(1, 1);
        assert!(build_pair(&mut dev).is_err());
        assert_eq!(dev.live_buffer_count(), 0);
    }

    #[test]
    fn committed_guard_keeps_resources() {
        let mut dev = RecordingDevice::new();
        let (a, b) = build_pair(&mut dev).unwrap();
        assert!(dev.is_buffer_live(a));
        assert!(dev.is_buffer_live(b));
    }

    #[test]
    fn dropped_guard_releases_its_buffers() {
        let mut dev = RecordingDevice::new();
        {
            let mut guard = ResourceGuard::new(&mut dev);
            guard.create_buffer(BufferKind::Vertex, &[0; 8]).unwrap();
            guard.create_buffer(BufferKind::Index, &[0; 4]).unwrap();
        }
        assert_eq!(dev.live_buffer_count(), 0);
    }
}
