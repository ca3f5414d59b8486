//! Layout and transition engine for the ribbon chart.

pub mod camera;
pub mod config;
pub mod data;
pub mod frame;
pub mod interaction;
pub mod layout;
pub mod mapper;
pub mod runtime;
pub mod theme;
pub mod transition;

pub use camera::{
    CameraPose, OrthoFrustum, Ray, SceneFraming, ViewMode, ViewTarget, Viewport, compute_end_pose,
    picking_ray,
};
pub use config::{ChartOptions, ControlsPolicy, FlatViewPolicy, Labels};
pub use data::{
    ChartPoint, DataError, DaySpan, Entry, Series, SeriesPoints, SeriesStats, parse_series_json,
};
pub use frame::FrameUpdate;
pub use interaction::{FadingOpacity, SegmentRef, TooltipContent};
pub use layout::{LayoutEngine, LayoutStats, ReleasedResources, SegmentMeta};
pub use mapper::{BOX_HEIGHT, DepthSlot, LayoutParams, map_point};
pub use runtime::{ChartError, ChartRuntime, DEFAULT_SCREENSHOT_NAME, RenderHost, TickOutcome};
pub use theme::{ColorError, Rgb, ThemeStyle, accent_palette};
pub use transition::{TransitionController, TransitionState, ease_in_out};
