//! Per-frame orchestrator tying layout, transitions and interaction together.
//!
//! The runtime never talks to a browser. Time, pointer positions, camera
//! controller updates and host notifications are pushed in; rendering,
//! image export and resource release go out through [`RenderHost`].

use crate::geom::{Point3, Quat};

use super::camera::{
    CameraPose, SceneFraming, ViewMode, Viewport, compute_end_pose, flat_dims, orbit_dims,
    picking_ray,
};
use super::config::ChartOptions;
use super::data::{DataError, Series, validate_series};
use super::frame::{
    CameraFrame, ControlsFrame, FrameUpdate, GridFrame, SegmentFrame, SeriesFrame, TooltipFrame,
};
use super::interaction::{
    HoverChange, HoverState, SegmentRef, TooltipContent, grid_placement, is_top_down, place_tooltip,
};
use super::layout::{LayoutEngine, LayoutStats, ReleasedResources};
use super::mapper::LayoutParams;
use super::theme::{ColorError, Rgb, ThemeStyle};
use super::transition::TransitionController;

pub const DEFAULT_SCREENSHOT_NAME: &str = "enchartix-graph.png";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ChartError {
    #[error(transparent)]
    Data(#[from] DataError),
    #[error(transparent)]
    Color(#[from] ColorError),
    #[error("chart has been destroyed")]
    Destroyed,
}

/// Rendering side of the chart.
pub trait RenderHost {
    /// Draw one frame.
    fn submit_frame(&mut self, frame: &FrameUpdate);

    /// Encode the last submitted frame as PNG and hand it to the user.
    fn export_image(&mut self, filename: &str);

    /// Dispose GPU-side objects that mirrored the released geometry.
    fn release(&mut self, released: ReleasedResources);

    /// Stop resize, visibility and theme notifications.
    fn detach_observers(&mut self);

    /// Rendered size of the tooltip for `content`, in container pixels.
    fn measure_tooltip(&mut self, content: &TooltipContent) -> (f64, f64) {
        let _ = content;
        (0.0, 0.0)
    }
}

/// What a call to [`ChartRuntime::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Rendered,
    /// Not visible; nothing was advanced.
    Paused,
    /// The loop has ended; stop scheduling ticks.
    Stopped,
}

pub struct ChartRuntime<H: RenderHost> {
    host: H,
    options: ChartOptions,
    data: Vec<Series>,
    theme: Rgb,
    style: ThemeStyle,
    layout: LayoutEngine,
    framing: SceneFraming,
    viewport: Viewport,
    camera: CameraPose,
    transition: TransitionController,
    hover: HoverState,
    tooltip: Option<TooltipFrame>,
    top_down: bool,
    visible: bool,
    running: bool,
    destroyed: bool,
    tubes_dirty: bool,
    segments_dirty: bool,
}

impl<H: RenderHost> ChartRuntime<H> {
    /// Lay out `data` in the 3D view and frame the camera on it.
    pub fn new(
        host: H,
        data: Vec<Series>,
        options: ChartOptions,
        viewport: Viewport,
        ambient_dark: bool,
        now_ms: f64,
    ) -> Result<Self, ChartError> {
        validate_series(&data)?;
        let theme = options.theme_rgb()?;
        let style = ThemeStyle::derive(theme, options.resolve_dark(ambient_dark));

        let dims = orbit_dims(data.len());
        let layout = LayoutEngine::build(&data, theme, style, dims, false);
        let framing = SceneFraming::from_bounds(layout.bounds());
        let camera = CameraPose::looking_at(framing.orbit_position(), framing.center);
        let transition = TransitionController::new(
            now_ms,
            camera,
            dims,
            options.transition_duration_ms(),
            options.inactivity_delay_ms(),
        );

        log::debug!(
            "chart created: {} series, max dim {:.1}, dark {}",
            data.len(),
            framing.max_dim,
            style.is_dark
        );

        let mut runtime = Self {
            host,
            options,
            data,
            theme,
            style,
            layout,
            framing,
            viewport,
            camera,
            transition,
            hover: HoverState::default(),
            tooltip: None,
            top_down: false,
            visible: true,
            running: true,
            destroyed: false,
            tubes_dirty: true,
            segments_dirty: true,
        };
        runtime.sync_top_down();
        Ok(runtime)
    }

    /// Advance one animation frame and submit it.
    pub fn tick(&mut self, now_ms: f64) -> TickOutcome {
        if self.destroyed || !self.running {
            return TickOutcome::Stopped;
        }
        if !self.visible {
            return TickOutcome::Paused;
        }

        if !self.transition.is_active() && self.transition.poll_inactivity(now_ms) {
            log::debug!("inactivity timeout, re-homing camera");
            self.transition.rehome(
                now_ms,
                self.camera,
                self.layout.params(),
                &self.framing,
                self.viewport,
                self.layout.series_count(),
            );
        }

        if let Some(sample) = self.transition.step(now_ms) {
            self.camera = sample.pose;
            self.layout.apply_layout(sample.dims, false);
            self.tubes_dirty = true;
            if sample.finished {
                self.layout.apply_layout(sample.dims, true);
                self.segments_dirty = true;
            }
        }

        self.hover.step_grid();
        self.layout.blend_opacities();

        self.sync_top_down();

        let frame = self.frame();
        self.host.submit_frame(&frame);
        self.tubes_dirty = false;
        self.segments_dirty = false;
        TickOutcome::Rendered
    }

    fn sync_top_down(&mut self) {
        let top_down = is_top_down(&self.camera, self.options.top_down_threshold);
        if top_down != self.top_down {
            log::trace!("top-down view: {top_down}");
            self.top_down = top_down;
            self.layout.reorient_gradients(top_down);
            self.segments_dirty = true;
        }
    }

    /// Switch between the 3D and flat views.
    pub fn toggle_view_mode(&mut self, now_ms: f64) -> Result<ViewMode, ChartError> {
        self.ensure_alive()?;
        self.clear_hover(true);
        let mode = self.transition.toggle(
            now_ms,
            self.camera,
            self.layout.params(),
            &self.framing,
            self.viewport,
            self.layout.series_count(),
        );
        Ok(mode)
    }

    /// Rebuild every series with a new accent color.
    pub fn update_theme_color(&mut self, hex: &str) -> Result<(), ChartError> {
        self.ensure_alive()?;
        let theme = Rgb::from_hex(hex)?;
        self.theme = theme;
        self.options.theme_color = hex.to_owned();
        self.style = ThemeStyle::derive(theme, self.style.is_dark);
        self.swap_layout(self.layout.params());
        log::debug!("theme color changed to {}", theme.to_hex());
        Ok(())
    }

    /// Host light/dark notification.
    pub fn set_dark(&mut self, is_dark: bool) -> Result<(), ChartError> {
        self.ensure_alive()?;
        if is_dark == self.style.is_dark {
            return Ok(());
        }
        self.style = ThemeStyle::derive(self.theme, is_dark);
        self.layout.set_style(self.style);
        if let Some(at) = self.hover.hovered() {
            self.layout.set_highlight(at, self.style.highlight_opacity);
        }
        self.tubes_dirty = true;
        self.segments_dirty = true;
        log::debug!("dark mode: {is_dark}");
        Ok(())
    }

    /// Replace the data set. Framing is recomputed from the new 3D layout.
    /// A running transition is retargeted to the new framing; otherwise the
    /// camera and box jump to the current mode's canonical state.
    pub fn rebuild(&mut self, data: Vec<Series>) -> Result<(), ChartError> {
        self.ensure_alive()?;
        validate_series(&data)?;
        self.data = data;

        let count = self.data.len();
        self.swap_layout(orbit_dims(count));
        self.framing = SceneFraming::from_bounds(self.layout.bounds());

        if self.transition.is_active() {
            self.transition.retarget(&self.framing, self.viewport, count);
        } else {
            let mode = self.transition.mode();
            let target = compute_end_pose(mode, &self.framing, self.viewport, count);
            self.camera = CameraPose {
                zoom: self.camera.zoom,
                ..target.pose
            };
            if target.dims != self.layout.params() {
                self.layout.apply_layout(target.dims, true);
            }
            self.sync_top_down();
        }
        log::debug!(
            "data replaced: {} series, max dim {:.1}",
            self.data.len(),
            self.framing.max_dim
        );
        Ok(())
    }

    fn swap_layout(&mut self, params: LayoutParams) {
        self.clear_hover(false);
        let released = self
            .layout
            .rebuild_and_swap(&self.data, self.theme, self.style, params);
        self.host.release(released);
        self.tubes_dirty = true;
        self.segments_dirty = true;
    }

    /// Container resized to `width` x `height` CSS pixels.
    pub fn resize(&mut self, width: f64, height: f64) -> Result<(), ChartError> {
        self.ensure_alive()?;
        if width <= 0.0 || height <= 0.0 {
            return Ok(());
        }
        self.viewport = Viewport::new(width, height);
        if self.transition.mode().is_flat() && !self.transition.is_active() {
            let width = flat_dims(self.framing.view_size, self.viewport.aspect()).box_width;
            let depth = self.layout.params().box_depth;
            self.layout.apply_layout(LayoutParams::new(width, depth), true);
            self.tubes_dirty = true;
            self.segments_dirty = true;
        }
        log::debug!("resized to {:.0}x{:.0}", self.viewport.width, self.viewport.height);
        Ok(())
    }

    /// Visibility notification; ticks are paused while hidden.
    pub fn set_visible(&mut self, visible: bool) {
        if self.visible != visible {
            log::trace!("visible: {visible}");
        }
        self.visible = visible;
    }

    /// The container left the document: end the loop and detach observers.
    pub fn container_detached(&mut self) {
        if self.running {
            self.running = false;
            self.host.detach_observers();
            log::debug!("container detached, render loop stopped");
        }
    }

    /// Pointer moved to container-relative pixel `(x, y)`.
    pub fn pointer_move(&mut self, x: f64, y: f64) -> Result<(), ChartError> {
        self.ensure_alive()?;
        if self.transition.is_active() {
            log::trace!("pointer ignored during transition");
            return Ok(());
        }

        let frustum = self.framing.frustum(self.viewport);
        let ray = picking_ray(&self.camera, &frustum, self.viewport.to_ndc(x, y));
        let hit = self.layout.pick(&ray);

        match self.hover.update(hit) {
            HoverChange::Entered { previous, current } => {
                if let Some(previous) = previous {
                    self.layout.set_highlight(previous, 0.0);
                }
                self.layout.set_highlight(current, self.style.highlight_opacity);
                self.layout.focus_series(Some(current.series));
            }
            HoverChange::Cleared { previous } => {
                self.layout.set_highlight(previous, 0.0);
                self.layout.focus_series(None);
            }
            HoverChange::Unchanged => {}
        }

        self.tooltip = match self.hover.hovered() {
            Some(at) => self.tooltip_at(at, (x, y)),
            None => None,
        };
        Ok(())
    }

    fn tooltip_at(&mut self, at: SegmentRef, pointer: (f64, f64)) -> Option<TooltipFrame> {
        let segment = self.layout.segment(at)?;
        let content = TooltipContent::for_segment(&segment.meta, &self.options.labels);
        let size = self.host.measure_tooltip(&content);
        let (left, top) = place_tooltip(pointer, size, self.viewport);
        Some(TooltipFrame { content, left, top })
    }

    /// Pointer left the container.
    pub fn pointer_leave(&mut self) -> Result<(), ChartError> {
        self.ensure_alive()?;
        self.clear_hover(false);
        Ok(())
    }

    fn clear_hover(&mut self, snap: bool) {
        if let HoverChange::Cleared { previous } = self.hover.clear() {
            if snap {
                self.layout.hide_highlight(previous);
            } else {
                self.layout.set_highlight(previous, 0.0);
            }
            self.layout.focus_series(None);
        }
        self.tooltip = None;
    }

    /// The camera controller started a gesture.
    pub fn controls_start(&mut self) -> Result<(), ChartError> {
        self.ensure_alive()?;
        if self.transition.controls_start() {
            self.layout.apply_layout(self.layout.params(), true);
            self.tubes_dirty = true;
            self.segments_dirty = true;
        }
        Ok(())
    }

    /// The camera controller finished a gesture.
    pub fn controls_end(&mut self, now_ms: f64) -> Result<(), ChartError> {
        self.ensure_alive()?;
        self.transition.controls_end(now_ms);
        Ok(())
    }

    /// Camera state reported by the host controller. Ignored while a
    /// transition drives the camera.
    pub fn update_camera(
        &mut self,
        position: [f64; 3],
        target: [f64; 3],
        orientation: [f64; 4],
        zoom: f64,
    ) -> Result<(), ChartError> {
        self.ensure_alive()?;
        if self.transition.is_active() {
            return Ok(());
        }
        let [x, y, z, w] = orientation;
        self.camera = CameraPose {
            position: Point3::from(position),
            target: Point3::from(target),
            orientation: Quat::new(x, y, z, w).normalized(),
            zoom,
        };
        Ok(())
    }

    /// Render the current state and ask the host to export it.
    pub fn download_screenshot(&mut self, filename: Option<&str>) -> Result<(), ChartError> {
        self.ensure_alive()?;
        let filename = filename.filter(|f| !f.trim().is_empty()).unwrap_or(DEFAULT_SCREENSHOT_NAME);
        let frame = self.full_frame();
        self.host.submit_frame(&frame);
        self.tubes_dirty = false;
        self.segments_dirty = false;
        self.host.export_image(filename);
        Ok(())
    }

    /// Release all geometry and stop the loop. Safe to call repeatedly.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.visible = false;
        self.transition.disarm_inactivity();
        if self.running {
            self.running = false;
            self.host.detach_observers();
        }
        let released = self.layout.dispose();
        self.host.release(released);
        self.hover = HoverState::default();
        self.tooltip = None;
        log::debug!("chart destroyed");
    }

    fn ensure_alive(&self) -> Result<(), ChartError> {
        if self.destroyed {
            Err(ChartError::Destroyed)
        } else {
            Ok(())
        }
    }

    /// Snapshot of the current state; mesh buffers only where they changed
    /// since the last submitted frame.
    #[must_use]
    pub fn frame(&self) -> FrameUpdate {
        self.compose_frame(self.tubes_dirty, self.segments_dirty)
    }

    /// Snapshot carrying every mesh buffer.
    #[must_use]
    pub fn full_frame(&self) -> FrameUpdate {
        self.compose_frame(true, true)
    }

    fn compose_frame(&self, with_tubes: bool, with_segments: bool) -> FrameUpdate {
        let flat = self.transition.mode().is_flat();
        let series = self
            .layout
            .records()
            .iter()
            .map(|r| SeriesFrame::new(r, with_tubes))
            .collect();
        let segments = self
            .layout
            .records()
            .iter()
            .enumerate()
            .flat_map(|(series, record)| {
                record.segments.iter().enumerate().map(move |(segment, seg)| {
                    SegmentFrame::new(SegmentRef { series, segment }, seg, with_segments)
                })
            })
            .collect();

        let grid = self.hover.grid();
        let placement = self
            .hover
            .hovered()
            .and_then(|at| self.layout.segment(at))
            .map(|seg| grid_placement(seg.volume, self.top_down));

        FrameUpdate {
            mode: self.transition.mode(),
            toggle_caption: self.options.labels.toggle_caption(flat).to_owned(),
            camera: CameraFrame::new(
                &self.camera,
                self.framing.frustum(self.viewport),
                self.transition.is_active(),
            ),
            controls: ControlsFrame::from(self.options.flat_view.controls(flat)),
            theme: self.style,
            layout: self.layout.params(),
            top_down: self.top_down,
            series,
            segments,
            highlight: self.hover.hovered(),
            grid: GridFrame {
                visible: grid.is_visible(),
                fill_progress: grid.progress(),
                target_fill: grid.target_fill(),
                placement,
            },
            tooltip: self.tooltip.clone(),
        }
    }

    #[must_use]
    pub fn mode(&self) -> ViewMode {
        self.transition.mode()
    }

    #[must_use]
    pub fn is_transitioning(&self) -> bool {
        self.transition.is_active()
    }

    #[must_use]
    pub fn camera(&self) -> &CameraPose {
        &self.camera
    }

    #[must_use]
    pub fn framing(&self) -> &SceneFraming {
        &self.framing
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[must_use]
    pub fn layout(&self) -> &LayoutEngine {
        &self.layout
    }

    #[must_use]
    pub fn layout_stats(&self) -> LayoutStats {
        self.layout.stats()
    }

    #[must_use]
    pub fn hovered(&self) -> Option<SegmentRef> {
        self.hover.hovered()
    }

    #[must_use]
    pub fn inactivity_deadline(&self) -> Option<f64> {
        self.transition.inactivity().deadline()
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }
}
