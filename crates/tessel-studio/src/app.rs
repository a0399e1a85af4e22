use anyhow::Context;
use tessel_engine::core::{App, AppControl, FrameCtx, StartCtx};
use tessel_engine::input::{InputEvent, Key, KeyState, MouseButton, MouseButtonState};
use tessel_engine::render::WgpuDevice;

use crate::config::StudioConfig;
use crate::scene::StudioScene;

/// The application context: device, scene and gesture state, owned in one place.
pub struct StudioApp {
    config: StudioConfig,
    device: Option<WgpuDevice>,
    scene: Option<StudioScene>,
}

impl StudioApp {
    pub fn new(config: StudioConfig) -> Self {
        Self {
            config,
            device: None,
            scene: None,
        }
    }

    fn handle_key(&mut self, key: Key) -> AppControl {
        match key {
            Key::Escape => return AppControl::Exit,
            Key::Digit(n @ 1..=9) => {
                if let Some(scene) = self.scene.as_mut() {
                    scene.set_point_size(f32::from(n) * 2.0);
                }
            }
            _ => {}
        }
        AppControl::Continue
    }
}

impl App for StudioApp {
    fn on_start(&mut self, ctx: &mut StartCtx<'_, '_>) -> anyhow::Result<()> {
        let mut device = ctx.create_device();
        let (width, height) = ctx.window.logical_size();
        let scene = StudioScene::assemble(&mut device, width, height, self.config.world_extent)
            .context("failed to assemble the scene")?;

        log::info!("right click adds points, left drag finds intersections, 1-9 sets point size");
        self.device = Some(device);
        self.scene = Some(scene);
        Ok(())
    }

    fn on_input(&mut self, event: &InputEvent) -> AppControl {
        if let InputEvent::Key {
            key,
            state: KeyState::Pressed,
            repeat: false,
            ..
        } = event
        {
            return self.handle_key(*key);
        }

        let (Some(device), Some(scene)) = (self.device.as_mut(), self.scene.as_mut()) else {
            return AppControl::Continue;
        };

        let result = match event {
            InputEvent::Resized { width, height } => {
                scene.reshape(*width, *height);
                Ok(())
            }
            InputEvent::PointerButton(e) => {
                let p = scene.screen_to_world(e.x, e.y);
                match (e.button, e.state) {
                    (MouseButton::Right, MouseButtonState::Pressed) => scene.add_point(device, p),
                    (MouseButton::Left, MouseButtonState::Pressed) => scene.begin_drag(device, p),
                    (MouseButton::Left, MouseButtonState::Released) => scene.end_drag(device),
                    _ => Ok(()),
                }
            }
            InputEvent::PointerMoved(e) if scene.is_dragging() => {
                let p = scene.screen_to_world(e.x, e.y);
                scene.drag_to(device, p).map(|hits| {
                    if hits > 0 {
                        log::trace!("{hits} intersection(s)");
                    }
                })
            }
            _ => Ok(()),
        };

        if let Err(err) = result {
            log::warn!("{err}");
        }
        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let (Some(device), Some(scene)) = (self.device.as_mut(), self.scene.as_mut()) else {
            return AppControl::Continue;
        };

        let size = ctx.gpu.size();
        scene.set_viewport(size.width as f32, size.height as f32);
        scene.draw(device);

        let control = ctx.render(self.config.clear_color, |target| device.flush(target));
        // A skipped frame never reached flush.
        device.discard_pending();
        control
    }

    fn on_exit(&mut self) {
        if let (Some(device), Some(scene)) = (self.device.as_mut(), self.scene.as_mut()) {
            scene.destroy(device);
        }
        self.scene = None;
    }
}
