//! Graphics subsystem
//!
//! Surfaces and palettes at the bottom, then the drawing primitives (lines,
//! text), then the compositor itself: split-screen layout, overlays, the
//! network frame handoff and the `FrameManager` context tying them together.

pub mod buffers;
pub mod driver;
pub mod export;
pub mod font;
pub mod frame_manager;
pub mod geometry;
pub mod line;
pub mod network;
pub mod overlay;
pub mod palette;
pub mod resolution;
pub mod scene;
pub mod surface;
pub mod viewport;
pub mod world_dump;

pub use driver::{DisplayDriver, DisplayMode, DriverError, HeadlessDriver};
pub use frame_manager::{FrameError, FrameManager};
pub use geometry::{GlowBox, Point, Vector};
pub use line::{draw_line, LineMarker, LineStyle};
pub use network::{NetworkFrame, NetworkFrameExchange, NetworkFramePipeline, PipelineError};
pub use palette::{Palette, Rgb, MASK_COLOR_32, MASK_COLOR_8};
pub use scene::{Activity, DrawContext, PostEffect, PostProcess, Scene, SceneWrap, ViewTargets};
pub use surface::{PixelFormat, Surface, SurfaceError};
pub use viewport::{SplitLayout, MAX_SCREENS};
