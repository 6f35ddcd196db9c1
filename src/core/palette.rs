use serde::{Deserialize, Serialize};

/// RGBA color in normalized 0..=1 channel values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub alpha: f64,
}

impl Color {
    #[must_use]
    pub const fn rgba(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    #[must_use]
    pub fn from_rgb8(red: u8, green: u8, blue: u8) -> Self {
        Self::rgba(
            f64::from(red) / 255.0,
            f64::from(green) / 255.0,
            f64::from(blue) / 255.0,
            1.0,
        )
    }

    #[must_use]
    pub fn with_alpha(self, alpha: f64) -> Self {
        Self { alpha, ..self }
    }

    /// CSS `rgba(...)` notation.
    #[must_use]
    pub fn to_css(self) -> String {
        let channel = |value: f64| (value.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!(
            "rgba({}, {}, {}, {})",
            channel(self.red),
            channel(self.green),
            channel(self.blue),
            (self.alpha.clamp(0.0, 1.0) * 100.0).round() / 100.0
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Fixed color set for one theme.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    pub background: Color,
    pub text: Color,
    pub muted_text: Color,
    pub grid: Color,
    pub crosshair: Color,
    pub up: Color,
    pub down: Color,
    pub line: Color,
    pub volume_up: Color,
    pub volume_down: Color,
}

impl Palette {
    #[must_use]
    pub fn for_theme(theme: Theme) -> Self {
        let up = Color::from_rgb8(0x26, 0xa6, 0x9a);
        let down = Color::from_rgb8(0xef, 0x53, 0x50);
        match theme {
            Theme::Light => Self {
                background: Color::from_rgb8(0xff, 0xff, 0xff),
                text: Color::from_rgb8(0x19, 0x1f, 0x2e),
                muted_text: Color::from_rgb8(0x78, 0x7b, 0x86),
                grid: Color::from_rgb8(0xf0, 0xf3, 0xfa),
                crosshair: Color::from_rgb8(0x95, 0x98, 0xa1),
                up,
                down,
                line: Color::from_rgb8(0x29, 0x62, 0xff),
                volume_up: up.with_alpha(0.5),
                volume_down: down.with_alpha(0.5),
            },
            Theme::Dark => Self {
                background: Color::from_rgb8(0x13, 0x17, 0x22),
                text: Color::from_rgb8(0xd1, 0xd4, 0xdc),
                muted_text: Color::from_rgb8(0x86, 0x8b, 0x98),
                grid: Color::from_rgb8(0x2a, 0x2e, 0x39),
                crosshair: Color::from_rgb8(0x75, 0x86, 0x96),
                up,
                down,
                line: Color::from_rgb8(0x4c, 0xaf, 0xff),
                volume_up: up.with_alpha(0.4),
                volume_down: down.with_alpha(0.4),
            },
        }
    }

    #[must_use]
    pub fn direction_color(&self, is_up: bool) -> Color {
        if is_up { self.up } else { self.down }
    }
}
