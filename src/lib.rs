#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod chart;
pub mod geom;

use std::fmt;

use chart::frame::FrameUpdate;
use chart::{
    ChartError, ChartOptions, ChartRuntime, DataError, ReleasedResources, RenderHost, Series,
    TickOutcome, TooltipContent, Viewport,
};
use js_sys::{Function, Reflect};
use serde::Serialize;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

cfg_if::cfg_if! {
    if #[cfg(all(feature = "console_error_panic_hook", target_arch = "wasm32"))] {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            console_error_panic_hook::set_once();
            init_logger();
        }
    } else {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            init_logger();
        }
    }
}

#[cfg(feature = "debug_logs")]
fn init_logger() {
    use log::LevelFilter;
    use wasm_bindgen_console_logger::DEFAULT_LOGGER;
    if log::set_logger(&DEFAULT_LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}

#[cfg(not(feature = "debug_logs"))]
fn init_logger() {}

#[macro_export]
macro_rules! debug_log {
    ($($t:tt)*) => {{
        #[cfg(feature = "debug_logs")]
        {
            #[cfg(target_arch = "wasm32")]
            {
                ::web_sys::console::log_1(&::wasm_bindgen::JsValue::from_str(&format!($($t)*)));
            }
            #[cfg(not(target_arch = "wasm32"))]
            {
                println!("{}", format!($($t)*));
            }
        }
    }};
}

/// `RenderHost` backed by a plain JS object exposing `submitFrame(frame)`,
/// `exportImage(filename)`, `release(summary)`, `detachObservers()` and
/// optionally `measureTooltip(content) -> [width, height]`.
struct JsHost {
    target: JsValue,
}

impl JsHost {
    fn method(&self, name: &str) -> Option<Function> {
        Reflect::get(&self.target, &JsValue::from_str(name))
            .ok()
            .and_then(|value| value.dyn_into::<Function>().ok())
    }

    fn call(&self, name: &str, args: &[JsValue]) -> Option<JsValue> {
        let Some(function) = self.method(name) else {
            log::trace!("host has no `{name}`");
            return None;
        };
        let result = match args {
            [] => function.call0(&self.target),
            [a] => function.call1(&self.target, a),
            [a, b, ..] => function.call2(&self.target, a, b),
        };
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                log::warn!("host `{name}` threw: {err:?}");
                None
            }
        }
    }
}

impl RenderHost for JsHost {
    fn submit_frame(&mut self, frame: &FrameUpdate) {
        match to_js_value(frame) {
            Ok(value) => {
                self.call("submitFrame", &[value]);
            }
            Err(err) => log::warn!("frame serialization failed: {err:?}"),
        }
    }

    fn export_image(&mut self, filename: &str) {
        self.call("exportImage", &[JsValue::from_str(filename)]);
    }

    fn release(&mut self, released: ReleasedResources) {
        if let Ok(value) = to_js_value(&released) {
            self.call("release", &[value]);
        }
    }

    fn detach_observers(&mut self) {
        self.call("detachObservers", &[]);
    }

    fn measure_tooltip(&mut self, content: &TooltipContent) -> (f64, f64) {
        let Ok(value) = to_js_value(content) else {
            return (0.0, 0.0);
        };
        self.call("measureTooltip", &[value])
            .and_then(|size| serde_wasm_bindgen::from_value::<(f64, f64)>(size).ok())
            .unwrap_or((0.0, 0.0))
    }
}

fn to_js_value<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, serde_wasm_bindgen::Error> {
    value.serialize(&serde_wasm_bindgen::Serializer::new().serialize_maps_as_objects(true))
}

fn series_from_js(data: JsValue) -> Result<Vec<Series>, ChartError> {
    serde_wasm_bindgen::from_value(data)
        .map_err(|err| ChartError::Data(DataError::Parse(err.to_string())))
}

fn triple(values: &[f64], what: &str) -> Result<[f64; 3], JsValue> {
    match values {
        [x, y, z] => Ok([*x, *y, *z]),
        _ => Err(js_error(&format!("{what} needs 3 components, got {}", values.len()))),
    }
}

/// Interactive ribbon chart driven by a JS render host.
#[wasm_bindgen]
pub struct Chart {
    runtime: ChartRuntime<JsHost>,
}

#[wasm_bindgen]
impl Chart {
    /// Lay out `data` (an array of `{ name, entries }`) for a container of
    /// `width` x `height` CSS pixels.
    #[wasm_bindgen(constructor)]
    pub fn new(
        host: JsValue,
        data: JsValue,
        options: JsValue,
        width: f64,
        height: f64,
        ambient_dark: bool,
        now_ms: f64,
    ) -> Result<Chart, JsValue> {
        let series = series_from_js(data).map_err(to_js_error)?;
        let options: ChartOptions = if options.is_undefined() || options.is_null() {
            ChartOptions::default()
        } else {
            serde_wasm_bindgen::from_value(options).map_err(to_js_error)?
        };

        let runtime = ChartRuntime::new(
            JsHost { target: host },
            series,
            options,
            Viewport::new(width, height),
            ambient_dark,
            now_ms,
        )
        .map_err(to_js_error)?;
        debug_log!("chart ready with {} series", runtime.layout().series_count());

        Ok(Chart { runtime })
    }

    /// Run one animation frame. Returns false once the loop has ended.
    #[wasm_bindgen]
    pub fn tick(&mut self, now_ms: f64) -> bool {
        self.runtime.tick(now_ms) != TickOutcome::Stopped
    }

    /// Returns true when the chart is now in the flat view.
    #[wasm_bindgen(js_name = toggleViewMode)]
    pub fn toggle_view_mode(&mut self, now_ms: f64) -> Result<bool, JsValue> {
        let mode = self.runtime.toggle_view_mode(now_ms).map_err(to_js_error)?;
        Ok(mode.is_flat())
    }

    #[wasm_bindgen(js_name = updateThemeColor)]
    pub fn update_theme_color(&mut self, hex: &str) -> Result<(), JsValue> {
        self.runtime.update_theme_color(hex).map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = setDark)]
    pub fn set_dark(&mut self, is_dark: bool) -> Result<(), JsValue> {
        self.runtime.set_dark(is_dark).map_err(to_js_error)
    }

    #[wasm_bindgen]
    pub fn resize(&mut self, width: f64, height: f64) -> Result<(), JsValue> {
        self.runtime.resize(width, height).map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = setVisible)]
    pub fn set_visible(&mut self, visible: bool) {
        self.runtime.set_visible(visible);
    }

    #[wasm_bindgen(js_name = containerDetached)]
    pub fn container_detached(&mut self) {
        self.runtime.container_detached();
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&mut self, x: f64, y: f64) -> Result<(), JsValue> {
        self.runtime.pointer_move(x, y).map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = pointerLeave)]
    pub fn pointer_leave(&mut self) -> Result<(), JsValue> {
        self.runtime.pointer_leave().map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = controlsStart)]
    pub fn controls_start(&mut self) -> Result<(), JsValue> {
        self.runtime.controls_start().map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = controlsEnd)]
    pub fn controls_end(&mut self, now_ms: f64) -> Result<(), JsValue> {
        self.runtime.controls_end(now_ms).map_err(to_js_error)
    }

    /// Report the controller's camera: position and target as `[x, y, z]`,
    /// orientation as `[x, y, z, w]`.
    #[wasm_bindgen(js_name = updateCamera)]
    pub fn update_camera(
        &mut self,
        position: Vec<f64>,
        target: Vec<f64>,
        quaternion: Vec<f64>,
        zoom: f64,
    ) -> Result<(), JsValue> {
        let position = triple(&position, "position")?;
        let target = triple(&target, "target")?;
        let orientation = match quaternion.as_slice() {
            [x, y, z, w] => [*x, *y, *z, *w],
            _ => return Err(js_error("quaternion needs 4 components")),
        };
        self.runtime
            .update_camera(position, target, orientation, zoom)
            .map_err(to_js_error)
    }

    /// Replace the data set.
    #[wasm_bindgen]
    pub fn rebuild(&mut self, data: JsValue) -> Result<(), JsValue> {
        let series = series_from_js(data).map_err(to_js_error)?;
        self.runtime.rebuild(series).map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = downloadScreenshot)]
    pub fn download_screenshot(&mut self, filename: Option<String>) -> Result<(), JsValue> {
        self.runtime
            .download_screenshot(filename.as_deref())
            .map_err(to_js_error)
    }

    /// Full snapshot including every mesh buffer.
    #[wasm_bindgen(js_name = getFrame)]
    pub fn get_frame(&self) -> Result<JsValue, JsValue> {
        to_js_value(&self.runtime.full_frame()).map_err(to_js_error)
    }

    #[wasm_bindgen]
    pub fn destroy(&mut self) {
        self.runtime.destroy();
    }
}

fn to_js_error<E: fmt::Display>(error: E) -> JsValue {
    js_error(&error.to_string())
}

fn js_error(message: &str) -> JsValue {
    #[cfg(target_arch = "wasm32")]
    {
        wasm_bindgen::JsError::new(message).into()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
        JsValue::NULL
    }
}
