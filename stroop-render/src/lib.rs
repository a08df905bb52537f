pub mod chart;
pub mod font;
pub mod render;

pub use chart::{BoxPlot, ChartFont, ChartSeries, register_chart_font, render_box_plot, save_png};
pub use font::{FONT_SEARCH_PATHS, LoadedFont, load_font, load_font_file};
pub use render::{FrameStats, SkiaRenderer, render_text_pixmap, skia_color, skia_rect};
