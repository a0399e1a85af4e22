mod app;
mod config;
mod scene;

use anyhow::Context;
use tessel_engine::device::GpuInit;
use tessel_engine::logging::{init_logging, LoggingConfig};
use tessel_engine::window::{Runtime, RuntimeConfig};
use winit::dpi::LogicalSize;

use crate::app::StudioApp;
use crate::config::StudioConfig;

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    let config = StudioConfig::default();
    let runtime = RuntimeConfig {
        title: config.title.clone(),
        initial_size: LogicalSize::new(config.width, config.height),
        frames_per_second: config.frames_per_second,
    };

    Runtime::run(runtime, GpuInit::default(), StudioApp::new(config)).context("tessel studio exited with an error")
}
