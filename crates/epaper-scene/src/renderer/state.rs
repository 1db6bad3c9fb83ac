//! Running style state threaded through the element walk.

use epaper_ir::page::{DrawStyle, FontMask, ShapeProps, TextProps};

use super::RenderOptions;
use crate::style::{LineStyle, ResolvedStyle, ShapeStyle, TextStyle};

/// Current text and shape values. Element properties are sparse deltas
/// applied on top of it; absent properties keep the running value.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleState {
    pub font: String,
    pub font_size: f64,
    pub text_color: String,
    pub font_mask: FontMask,
    pub draw_style: DrawStyle,
    pub fill_color: String,
    pub stroke_color: String,
    pub stroke_width: f64,
}

impl StyleState {
    /// Values every page starts from.
    pub fn initial(options: &RenderOptions) -> Self {
        Self {
            font: options.default_font.clone(),
            font_size: options.default_font_size,
            text_color: "#000000".to_string(),
            font_mask: FontMask::default(),
            draw_style: DrawStyle::Stroke,
            fill_color: "#ffffff".to_string(),
            stroke_color: "#000000".to_string(),
            stroke_width: 1.0,
        }
    }

    pub fn with_text(mut self, props: &TextProps) -> Self {
        if let Some(font) = &props.font {
            self.font = font.clone();
        }
        if let Some(size) = props.font_size {
            self.font_size = size;
        }
        if let Some(color) = &props.text_color {
            self.text_color = color.clone();
        }
        if let Some(mask) = props.font_mask {
            self.font_mask = mask;
        }
        self
    }

    pub fn with_shape(mut self, props: &ShapeProps) -> Self {
        if let Some(draw_style) = props.draw_style {
            self.draw_style = draw_style;
        }
        if let Some(color) = &props.fill_color {
            self.fill_color = color.clone();
        }
        if let Some(color) = &props.stroke_color {
            self.stroke_color = color.clone();
        }
        if let Some(width) = props.stroke_width {
            self.stroke_width = width;
        }
        self
    }

    pub fn text_style(&self) -> ResolvedStyle {
        ResolvedStyle::Text(TextStyle {
            font: self.font.clone(),
            size: self.font_size,
            color: self.text_color.clone(),
            mask: self.font_mask,
        })
    }

    pub fn line_style(&self) -> ResolvedStyle {
        ResolvedStyle::Line(LineStyle {
            color: self.stroke_color.clone(),
            width: self.stroke_width,
        })
    }

    pub fn shape_style(&self) -> ResolvedStyle {
        ResolvedStyle::Shape(ShapeStyle {
            draw_style: self.draw_style,
            fill: self.fill_color.clone(),
            stroke: self.stroke_color.clone(),
            width: self.stroke_width,
        })
    }
}
