//! Per-kind element properties.
//!
//! Style-affecting fields are sparse: `None` means "keep the running value",
//! never "reset to default". Geometry fields are mandatory.

use serde::Deserialize;

/// Bit mask of font decorations carried by text elements (`fm`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(from = "u8")]
pub struct FontMask(u8);

impl FontMask {
    pub const BOLD: u8 = 0x01;
    pub const ITALIC: u8 = 0x02;
    pub const UNDERLINE: u8 = 0x04;
    pub const STRIKEOUT: u8 = 0x08;

    pub const fn new(bits: u8) -> Self {
        Self(bits & 0x0f)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_bold(self) -> bool {
        self.0 & Self::BOLD != 0
    }

    pub const fn is_italic(self) -> bool {
        self.0 & Self::ITALIC != 0
    }

    pub const fn is_underline(self) -> bool {
        self.0 & Self::UNDERLINE != 0
    }

    pub const fn is_strikeout(self) -> bool {
        self.0 & Self::STRIKEOUT != 0
    }
}

impl From<u8> for FontMask {
    fn from(bits: u8) -> Self {
        Self::new(bits)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct TextProps {
    #[serde(rename = "fn")]
    pub font: Option<String>,
    #[serde(rename = "fs")]
    pub font_size: Option<f64>,
    #[serde(rename = "tc")]
    pub text_color: Option<String>,
    #[serde(rename = "fm")]
    pub font_mask: Option<FontMask>,
    /// Marks the runs of this node as a drill-down link. Not inherited.
    #[serde(rename = "l")]
    pub link: Option<bool>,
    /// Rotation in degrees around (`rx`, `ry`). Not inherited.
    #[serde(rename = "r")]
    pub rotation: Option<f64>,
    #[serde(rename = "rx")]
    pub rotation_x: Option<f64>,
    #[serde(rename = "ry")]
    pub rotation_y: Option<f64>,
}

impl TextProps {
    pub fn is_link(&self) -> bool {
        self.link == Some(true)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TextRun {
    pub x: f64,
    pub y: f64,
    #[serde(rename = "t")]
    pub text: String,
}

/// Draw style tag of shapes (`st`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum DrawStyle {
    #[serde(rename = "S")]
    Stroke,
    #[serde(rename = "F")]
    Fill,
    #[serde(rename = "P")]
    Path,
    #[serde(rename = "C")]
    Clear,
}

impl DrawStyle {
    pub const fn code(self) -> char {
        match self {
            DrawStyle::Stroke => 'S',
            DrawStyle::Fill => 'F',
            DrawStyle::Path => 'P',
            DrawStyle::Clear => 'C',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ShapeProps {
    #[serde(rename = "st")]
    pub draw_style: Option<DrawStyle>,
    #[serde(rename = "fc")]
    pub fill_color: Option<String>,
    #[serde(rename = "sc")]
    pub stroke_color: Option<String>,
    #[serde(rename = "sw")]
    pub stroke_width: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LineGeometry {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RectGeometry {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    #[serde(rename = "rr")]
    pub radius: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
pub enum HAlign {
    #[default]
    #[serde(rename = "L")]
    Left,
    #[serde(rename = "C")]
    Center,
    #[serde(rename = "R")]
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
pub enum VAlign {
    #[default]
    #[serde(rename = "T")]
    Top,
    #[serde(rename = "M")]
    Middle,
    #[serde(rename = "B")]
    Bottom,
}

/// How an image is fitted into its element box (`s`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
pub enum ScaleMode {
    /// Only the part that fits is shown, never stretched.
    #[default]
    #[serde(rename = "CL")]
    Clip,
    /// Stretched to exactly fill the box; aspect ratio is lost.
    #[serde(rename = "FF")]
    FitFill,
    /// Uniformly scaled to fit, keeping the original shape.
    #[serde(rename = "RS")]
    ResizeKeepShape,
    /// Scaled to the box height unless that overflows the width.
    #[serde(rename = "RH")]
    ResizeHeight,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImageProps {
    #[serde(rename = "u")]
    pub source: String,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    #[serde(rename = "ha", default)]
    pub h_align: HAlign,
    #[serde(rename = "va", default)]
    pub v_align: VAlign,
    #[serde(rename = "s", default)]
    pub scale: ScaleMode,
    /// Natural pixel size, when the server knows it.
    #[serde(rename = "nw")]
    pub natural_width: Option<f64>,
    #[serde(rename = "nh")]
    pub natural_height: Option<f64>,
}

impl ImageProps {
    pub fn box_width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn box_height(&self) -> f64 {
        self.y2 - self.y1
    }

    pub fn natural_size(&self) -> Option<(f64, f64)> {
        match (self.natural_width, self.natural_height) {
            (Some(w), Some(h)) if w > 0.0 && h > 0.0 => Some((w, h)),
            _ => None,
        }
    }
}
