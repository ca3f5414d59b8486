//! Chart options as passed in by the host.

use serde::{Deserialize, Serialize};

use super::theme::{ColorError, DEFAULT_THEME_COLOR, Rgb};

/// Display strings for the host UI. Missing keys keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Labels {
    #[serde(rename = "viewToggle2D")]
    pub view_toggle_2d: String,
    #[serde(rename = "viewToggle3D")]
    pub view_toggle_3d: String,
    #[serde(alias = "tooltipNoteTotal")]
    pub tooltip_daily_total: String,
    pub tooltip_cumulative: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            view_toggle_2d: "2D Flat View".to_owned(),
            view_toggle_3d: "3D Perspective".to_owned(),
            tooltip_daily_total: "Daily Total".to_owned(),
            tooltip_cumulative: "Overall Progress:".to_owned(),
        }
    }
}

impl Labels {
    /// Caption for the toggle button while in the given mode.
    #[must_use]
    pub fn toggle_caption(&self, flat: bool) -> &str {
        if flat {
            &self.view_toggle_3d
        } else {
            &self.view_toggle_2d
        }
    }
}

/// Camera-controller freedoms while the flat (2D) view is active.
/// Rotation is always disabled in the flat view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FlatViewPolicy {
    pub allow_pan: bool,
    pub allow_zoom: bool,
}

impl Default for FlatViewPolicy {
    fn default() -> Self {
        Self {
            allow_pan: true,
            allow_zoom: true,
        }
    }
}

/// Which controller inputs the host should enable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlsPolicy {
    pub enable_rotate: bool,
    pub enable_pan: bool,
    pub enable_zoom: bool,
}

impl FlatViewPolicy {
    #[must_use]
    pub const fn controls(self, flat: bool) -> ControlsPolicy {
        if flat {
            ControlsPolicy {
                enable_rotate: false,
                enable_pan: self.allow_pan,
                enable_zoom: self.allow_zoom,
            }
        } else {
            ControlsPolicy {
                enable_rotate: true,
                enable_pan: true,
                enable_zoom: true,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChartOptions {
    pub theme_color: String,
    /// `None` defers to the host's ambient dark-mode flag.
    pub is_dark: Option<bool>,
    pub labels: Labels,
    pub transition_ms: f64,
    pub inactivity_ms: f64,
    pub top_down_threshold: f64,
    pub flat_view: FlatViewPolicy,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            theme_color: DEFAULT_THEME_COLOR.to_owned(),
            is_dark: None,
            labels: Labels::default(),
            transition_ms: 900.0,
            inactivity_ms: 5000.0,
            top_down_threshold: 0.707,
            flat_view: FlatViewPolicy::default(),
        }
    }
}

impl ChartOptions {
    pub fn theme_rgb(&self) -> Result<Rgb, ColorError> {
        Rgb::from_hex(&self.theme_color)
    }

    #[must_use]
    pub fn resolve_dark(&self, ambient_dark: bool) -> bool {
        self.is_dark.unwrap_or(ambient_dark)
    }

    /// Transition duration, at least 1 ms.
    #[must_use]
    pub fn transition_duration_ms(&self) -> f64 {
        if self.transition_ms.is_finite() {
            self.transition_ms.max(1.0)
        } else {
            900.0
        }
    }

    #[must_use]
    pub fn inactivity_delay_ms(&self) -> f64 {
        if self.inactivity_ms.is_finite() {
            self.inactivity_ms.max(0.0)
        } else {
            5000.0
        }
    }
}
