//! Style class deduplication.
//!
//! Every distinct resolved style becomes one named class whose rule is
//! inserted into the bound stylesheet exactly once. Class names encode the
//! resolved values, so equal styles collide to the same name across renders.

use std::collections::HashSet;
use std::str::FromStr;

use csscolorparser::Color as CssColor;
use epaper_ir::page::{DrawStyle, FontMask};

use crate::error::SceneError;

/// Insert-rule capability of the stylesheet a surface renders against.
pub trait StyleSheet {
    fn insert_rule(&mut self, rule: &str) -> anyhow::Result<()>;
}

/// In-memory stylesheet; keeps rules in insertion order.
#[derive(Debug, Clone, Default)]
pub struct RuleList {
    rules: Vec<String>,
}

impl RuleList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rules(&self) -> &[String] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// All rules joined as one CSS text.
    pub fn to_css(&self) -> String {
        self.rules.join("\n")
    }
}

impl StyleSheet for RuleList {
    fn insert_rule(&mut self, rule: &str) -> anyhow::Result<()> {
        self.rules.push(rule.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font: String,
    pub size: f64,
    pub color: String,
    pub mask: FontMask,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineStyle {
    pub color: String,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShapeStyle {
    pub draw_style: DrawStyle,
    pub fill: String,
    pub stroke: String,
    pub width: f64,
}

/// Fully resolved values of one style, ready to be turned into a class.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedStyle {
    Text(TextStyle),
    Line(LineStyle),
    Shape(ShapeStyle),
}

impl ResolvedStyle {
    /// Deterministic class name for these values.
    pub fn class_name(&self) -> String {
        match self {
            ResolvedStyle::Text(text) => format!(
                "T-{}-{}-{}-{}",
                slug(&text.font),
                number_slug(text.size),
                color_slug(&text.color),
                text.mask.bits()
            ),
            ResolvedStyle::Line(line) => format!(
                "L-{}-{}",
                color_slug(&line.color),
                number_slug(line.width)
            ),
            ResolvedStyle::Shape(shape) => format!(
                "R-{}-{}-{}-{}",
                shape.draw_style.code(),
                color_slug(&shape.fill),
                color_slug(&shape.stroke),
                number_slug(shape.width)
            ),
        }
    }

    /// CSS rule text for `class`.
    pub fn rule_text(&self, class: &str) -> String {
        match self {
            ResolvedStyle::Text(text) => {
                let mut decorations = Vec::new();
                if text.mask.is_underline() {
                    decorations.push("underline");
                }
                if text.mask.is_strikeout() {
                    decorations.push("line-through");
                }
                let decoration = if decorations.is_empty() {
                    "none".to_string()
                } else {
                    decorations.join(" ")
                };
                format!(
                    ".{class} {{ font-family: \"{}\"; font-size: {}px; fill: {}; font-weight: {}; font-style: {}; text-decoration: {}; }}",
                    text.font,
                    text.size,
                    css_color(&text.color),
                    if text.mask.is_bold() { "bold" } else { "normal" },
                    if text.mask.is_italic() { "italic" } else { "normal" },
                    decoration
                )
            }
            ResolvedStyle::Line(line) => format!(
                ".{class} {{ stroke: {}; stroke-width: {}; }}",
                css_color(&line.color),
                line.width
            ),
            ResolvedStyle::Shape(shape) => {
                let (fill, stroke) = match shape.draw_style {
                    DrawStyle::Stroke => ("none".to_string(), css_color(&shape.stroke)),
                    DrawStyle::Fill => (css_color(&shape.fill), "none".to_string()),
                    DrawStyle::Path => (css_color(&shape.fill), css_color(&shape.stroke)),
                    DrawStyle::Clear => ("none".to_string(), "none".to_string()),
                };
                format!(
                    ".{class} {{ fill: {fill}; stroke: {stroke}; stroke-width: {}; }}",
                    shape.width
                )
            }
        }
    }
}

/// A class created by the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleClass {
    pub key: String,
    pub rule_text: String,
}

/// Set of known class keys plus the append-only list of rules inserted into
/// the bound stylesheet. Never cleared while the stylesheet lives.
#[derive(Debug)]
pub struct StyleCache<S> {
    sheet: S,
    keys: HashSet<String>,
    classes: Vec<StyleClass>,
}

impl<S: StyleSheet> StyleCache<S> {
    pub fn new(sheet: S) -> Self {
        Self {
            sheet,
            keys: HashSet::new(),
            classes: Vec::new(),
        }
    }

    /// Class name for `style`, inserting its rule on first sight.
    pub fn resolve(&mut self, style: &ResolvedStyle) -> Result<String, SceneError> {
        let key = style.class_name();
        if self.keys.contains(&key) {
            return Ok(key);
        }

        let rule_text = style.rule_text(&key);
        self.sheet
            .insert_rule(&rule_text)
            .map_err(|err| SceneError::StyleInsert {
                class: key.clone(),
                reason: format!("{err:#}"),
            })?;

        tracing::trace!(class = %key, "inserted style rule");
        self.keys.insert(key.clone());
        self.classes.push(StyleClass {
            key: key.clone(),
            rule_text,
        });
        Ok(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn classes(&self) -> &[StyleClass] {
        &self.classes
    }

    pub fn sheet(&self) -> &S {
        &self.sheet
    }
}

/// Normalize a color to lowercase `#rrggbb`, or `#rrggbbaa` when it is not
/// opaque. Accepts anything CSS does (`#abc`, `rgb(..)`, named colors).
pub fn normalize_color(color_str: &str) -> Option<String> {
    let color = CssColor::from_str(color_str.trim()).ok()?;
    let [r, g, b, a] = [color.r, color.g, color.b, color.a]
        .map(|channel| (channel * 255.0).round().clamp(0.0, 255.0) as u8);
    if a == u8::MAX {
        Some(format!("#{r:02x}{g:02x}{b:02x}"))
    } else {
        Some(format!("#{r:02x}{g:02x}{b:02x}{a:02x}"))
    }
}

fn css_color(color: &str) -> String {
    normalize_color(color).unwrap_or_else(|| color.trim().to_string())
}

fn color_slug(color: &str) -> String {
    match normalize_color(color) {
        Some(hex) => hex[1..].to_string(),
        None => slug(color),
    }
}

/// Lowercase alphanumerics, everything else collapsed to single dashes.
fn slug(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.trim().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}

/// Numbers as class-name safe text: `10` → `10`, `0.5` → `0_5`, `-1` → `m1`.
fn number_slug(value: f64) -> String {
    let text = if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    };
    text.replace('.', "_").replace('-', "m")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(size: f64, color: &str, mask: u8) -> ResolvedStyle {
        ResolvedStyle::Text(TextStyle {
            font: "DejaVu Sans Condensed".to_string(),
            size,
            color: color.to_string(),
            mask: FontMask::new(mask),
        })
    }

    struct RejectingSheet;

    impl StyleSheet for RejectingSheet {
        fn insert_rule(&mut self, _rule: &str) -> anyhow::Result<()> {
            anyhow::bail!("sheet is read-only")
        }
    }

    #[test]
    fn class_names_encode_resolved_values() {
        assert_eq!(
            text(10.0, "#000000", 1).class_name(),
            "T-dejavu-sans-condensed-10-000000-1"
        );
        assert_eq!(
            text(7.5, "#FFF", 0).class_name(),
            "T-dejavu-sans-condensed-7_5-ffffff-0"
        );
        let line = ResolvedStyle::Line(LineStyle {
            color: "#336699".to_string(),
            width: 0.5,
        });
        assert_eq!(line.class_name(), "L-336699-0_5");
    }

    #[test]
    fn equal_styles_insert_one_rule() {
        let mut cache = StyleCache::new(RuleList::new());
        let first = cache.resolve(&text(10.0, "#000000", 0)).unwrap();
        let second = cache.resolve(&text(10.0, "#000000", 0)).unwrap();
        let upper = cache.resolve(&text(10.0, "#000", 0)).unwrap();

        assert_eq!(first, second);
        assert_eq!(first, upper);
        assert_eq!(cache.sheet().len(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn text_rule_reflects_mask() {
        let style = text(12.0, "#ff0000", FontMask::BOLD | FontMask::UNDERLINE);
        let rule = style.rule_text("x");
        assert!(rule.contains("font-weight: bold"));
        assert!(rule.contains("text-decoration: underline"));
        assert!(rule.contains("fill: #ff0000"));
    }

    #[test]
    fn clear_shapes_paint_nothing() {
        let style = ResolvedStyle::Shape(ShapeStyle {
            draw_style: DrawStyle::Clear,
            fill: "#ffffff".to_string(),
            stroke: "#000000".to_string(),
            width: 1.0,
        });
        assert_eq!(style.class_name(), "R-C-ffffff-000000-1");
        assert!(style.rule_text("c").contains("fill: none; stroke: none"));
    }

    #[test]
    fn rejected_rule_is_not_recorded() {
        let mut cache = StyleCache::new(RejectingSheet);
        let err = cache.resolve(&text(10.0, "#000000", 0)).unwrap_err();

        assert!(matches!(err, SceneError::StyleInsert { .. }));
        assert!(cache.is_empty());
        assert!(!cache.contains("T-dejavu-sans-condensed-10-000000-0"));
    }

    #[test]
    fn normalize_color_formats() {
        assert_eq!(normalize_color("#ABCDEF").as_deref(), Some("#abcdef"));
        assert_eq!(normalize_color("#abc").as_deref(), Some("#aabbcc"));
        assert_eq!(normalize_color("#11223344").as_deref(), Some("#11223344"));
        assert_eq!(normalize_color("#112233ff").as_deref(), Some("#112233"));
        assert_eq!(normalize_color("red").as_deref(), Some("#ff0000"));
        assert_eq!(normalize_color(" rgb(0, 128, 255) ").as_deref(), Some("#0080ff"));
        assert_eq!(normalize_color("#12345"), None);
        assert_eq!(normalize_color("not a color"), None);
    }

    #[test]
    fn equivalent_colors_share_a_class() {
        let hex = text(10.0, "#FF0000", 0);
        let named = text(10.0, "red", 0);
        let functional = text(10.0, "rgb(255,0,0)", 0);

        assert_eq!(hex.class_name(), named.class_name());
        assert_eq!(hex.class_name(), functional.class_name());
        assert_eq!(hex.class_name(), "T-dejavu-sans-condensed-10-ff0000-0");
    }
}
