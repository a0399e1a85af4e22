use tessel_engine::coords::ColorRgba;

/// Studio settings. There is no config file; edit the defaults.
#[derive(Debug, Clone)]
pub struct StudioConfig {
    pub title: String,
    /// Initial window size in logical pixels.
    pub width: f64,
    pub height: f64,
    pub frames_per_second: u32,
    /// World units spanned by the smaller window dimension.
    pub world_extent: f32,
    pub clear_color: ColorRgba,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            title: "tessel studio".to_string(),
            width: 800.0,
            height: 800.0,
            frames_per_second: 30,
            world_extent: 10.0,
            clear_color: ColorRgba::rgb(0.1, 0.1, 0.12),
        }
    }
}
