//! Page model pushed by the server on every render.

pub mod props;

pub use props::{
    DrawStyle, FontMask, HAlign, ImageProps, LineGeometry, RectGeometry, ScaleMode, ShapeProps,
    TextProps, TextRun, VAlign,
};

use serde::Deserialize;
use serde_json::Value;

use crate::{error::PageError, schema};

/// One rendered page: geometry plus bands ordered top to bottom.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Page {
    #[serde(rename = "p")]
    pub properties: PageProperties,
    #[serde(rename = "e", default)]
    pub bands: Vec<Band>,
}

impl Page {
    /// Parse and validate a page from its JSON text.
    pub fn from_json_str(source: &str) -> Result<Self, PageError> {
        let value: Value = serde_json::from_str(source)?;
        Self::from_value(value)
    }

    /// Validate a decoded JSON value and convert it into a typed page.
    pub fn from_value(value: Value) -> Result<Self, PageError> {
        schema::validate_page_value(&value).map_err(|err| PageError::Malformed(err.to_string()))?;
        serde_json::from_value(value).map_err(|err| PageError::Malformed(err.to_string()))
    }

    pub fn width(&self) -> f64 {
        self.properties.width
    }

    pub fn height(&self) -> f64 {
        self.properties.height
    }

    /// Detail bands paired with their position in `bands`.
    pub fn detail_bands(&self) -> impl Iterator<Item = (usize, &Band)> {
        self.bands
            .iter()
            .enumerate()
            .filter(|(_, band)| band.kind == BandKind::Detail)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PageProperties {
    #[serde(rename = "w")]
    pub width: f64,
    #[serde(rename = "h")]
    pub height: f64,
    #[serde(rename = "ml", default)]
    pub margin_left: f64,
    #[serde(rename = "mt", default)]
    pub margin_top: f64,
    #[serde(rename = "mr", default)]
    pub margin_right: f64,
    #[serde(rename = "mb", default)]
    pub margin_bottom: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(from = "String")]
pub enum BandKind {
    Header,
    Detail,
    Footer,
    #[default]
    Other,
}

impl From<String> for BandKind {
    fn from(code: String) -> Self {
        match code.as_str() {
            "DT" => BandKind::Detail,
            "PH" | "CH" | "TI" | "GH" => BandKind::Header,
            "PF" | "CF" | "LPF" | "SU" | "GF" => BandKind::Footer,
            _ => BandKind::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Band {
    #[serde(rename = "t", default)]
    pub kind: BandKind,
    #[serde(rename = "p")]
    pub properties: BandProperties,
    #[serde(rename = "e", default)]
    pub elements: Vec<Element>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BandProperties {
    #[serde(rename = "oy")]
    pub offset_y: f64,
    #[serde(rename = "h")]
    pub height: f64,
}

/// Elements embedded before or after a node.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ElementGroup {
    #[serde(rename = "e", default)]
    pub elements: Vec<Element>,
}

/// Recursive page node. `before`, the node itself, `children` and `after`
/// are always rendered in that order.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawElement")]
pub struct Element {
    pub kind: ElementKind,
    pub before: Option<ElementGroup>,
    pub children: Vec<Element>,
    pub after: Option<ElementGroup>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    Text {
        props: TextProps,
        runs: Vec<TextRun>,
    },
    Line {
        shape: ShapeProps,
        geometry: LineGeometry,
    },
    Rect {
        shape: ShapeProps,
        geometry: RectGeometry,
    },
    Image(ImageProps),
    /// A kind this build does not know; kept so the walk can still visit
    /// its embedded groups.
    Unknown(String),
}

impl ElementKind {
    pub fn code(&self) -> &str {
        match self {
            ElementKind::Text { .. } => "T",
            ElementKind::Line { .. } => "L",
            ElementKind::Rect { .. } => "R",
            ElementKind::Image(_) => "I",
            ElementKind::Unknown(code) => code,
        }
    }
}

impl Element {
    pub fn before_elements(&self) -> &[Element] {
        self.before
            .as_ref()
            .map(|group| group.elements.as_slice())
            .unwrap_or(&[])
    }

    pub fn after_elements(&self) -> &[Element] {
        self.after
            .as_ref()
            .map(|group| group.elements.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Deserialize)]
struct RawElement {
    t: String,
    #[serde(default)]
    p: Value,
    #[serde(default)]
    b: Option<ElementGroup>,
    #[serde(default)]
    e: Vec<Element>,
    #[serde(default)]
    f: Option<ElementGroup>,
    #[serde(default)]
    ts: Vec<TextRun>,
}

fn decode_props<T: serde::de::DeserializeOwned>(code: &str, props: &Value) -> Result<T, PageError> {
    let props = if props.is_null() {
        Value::Object(Default::default())
    } else {
        props.clone()
    };
    serde_json::from_value(props)
        .map_err(|err| PageError::Malformed(format!("'{code}' element properties: {err}")))
}

impl TryFrom<RawElement> for Element {
    type Error = PageError;

    fn try_from(raw: RawElement) -> Result<Self, Self::Error> {
        let kind = match raw.t.as_str() {
            "T" => ElementKind::Text {
                props: decode_props(&raw.t, &raw.p)?,
                runs: raw.ts,
            },
            "L" => ElementKind::Line {
                shape: decode_props(&raw.t, &raw.p)?,
                geometry: decode_props(&raw.t, &raw.p)?,
            },
            "R" => ElementKind::Rect {
                shape: decode_props(&raw.t, &raw.p)?,
                geometry: decode_props(&raw.t, &raw.p)?,
            },
            "I" => ElementKind::Image(decode_props(&raw.t, &raw.p)?),
            _ => ElementKind::Unknown(raw.t),
        };
        Ok(Element {
            kind,
            before: raw.b,
            children: raw.e,
            after: raw.f,
        })
    }
}
