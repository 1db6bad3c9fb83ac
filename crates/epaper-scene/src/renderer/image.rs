//! Image placement policy.
//!
//! Given the natural image size and the element box, computes where the
//! image lands and how big it is. When the natural size is unknown the whole
//! box is emitted and the receiving renderer aligns the image itself, driven
//! by the alignment directive.

use epaper_ir::page::{HAlign, ImageProps, ScaleMode, VAlign};

/// Natural size lookup for images the page does not describe.
pub trait ImageMetrics {
    fn natural_size(&self, source: &str) -> Option<(f64, f64)>;
}

/// Knows no image sizes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoImageMetrics;

impl ImageMetrics for NoImageMetrics {
    fn natural_size(&self, _source: &str) -> Option<(f64, f64)> {
        None
    }
}

/// Visible part of the natural image, in image pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImagePlacement {
    pub href: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Set for clipped images; the placed box shows only this part.
    pub source: Option<SourceRect>,
    /// Natural size, when known.
    pub natural: Option<(f64, f64)>,
    /// `preserveAspectRatio` value for the receiving renderer.
    pub aspect: String,
}

/// Combined horizontal/vertical anchor, e.g. `xMidYMax`.
pub fn alignment(h_align: HAlign, v_align: VAlign) -> String {
    let x = match h_align {
        HAlign::Left => "xMin",
        HAlign::Center => "xMid",
        HAlign::Right => "xMax",
    };
    let y = match v_align {
        VAlign::Top => "YMin",
        VAlign::Middle => "YMid",
        VAlign::Bottom => "YMax",
    };
    format!("{x}{y}")
}

/// Alignment plus fit directive for `mode`.
pub fn alignment_directive(h_align: HAlign, v_align: VAlign, mode: ScaleMode) -> String {
    match mode {
        ScaleMode::FitFill => "none".to_string(),
        ScaleMode::Clip => format!("{} slice", alignment(h_align, v_align)),
        ScaleMode::ResizeKeepShape | ScaleMode::ResizeHeight => {
            format!("{} meet", alignment(h_align, v_align))
        }
    }
}

/// Size of the placed image for a natural size and a target box.
pub fn scaled_size(mode: ScaleMode, natural: (f64, f64), target: (f64, f64)) -> (f64, f64) {
    let (nw, nh) = natural;
    let (bw, bh) = target;
    match mode {
        ScaleMode::Clip => (bw.min(nw), bh.min(nh)),
        ScaleMode::FitFill => (bw, bh),
        ScaleMode::ResizeKeepShape => {
            let factor = (bw / nw).min(bh / nh);
            ((nw * factor).min(bw), (nh * factor).min(bh))
        }
        ScaleMode::ResizeHeight => {
            let mut factor = bh / nh;
            if nw * factor > bw {
                factor = bw / nw;
            }
            (nw * factor, nh * factor)
        }
    }
}

fn anchor(start: f64, extent: f64, size: f64, leading: bool, trailing: bool) -> f64 {
    if trailing {
        start + extent - size
    } else if leading {
        start
    } else {
        start + (extent - size) / 2.0
    }
}

/// Absolute href for an image source.
pub fn resolve_href(base_url: &str, source: &str) -> String {
    if base_url.is_empty() || source.contains("://") || source.starts_with("data:") {
        return source.to_string();
    }
    match (base_url.ends_with('/'), source.starts_with('/')) {
        (true, true) => format!("{base_url}{}", &source[1..]),
        (false, false) => format!("{base_url}/{source}"),
        _ => format!("{base_url}{source}"),
    }
}

/// Place `props` inside its box.
pub fn place_image(props: &ImageProps, natural: Option<(f64, f64)>, base_url: &str) -> ImagePlacement {
    let href = resolve_href(base_url, &props.source);
    let (bw, bh) = (props.box_width(), props.box_height());

    let Some((nw, nh)) = natural else {
        return ImagePlacement {
            href,
            x: props.x1,
            y: props.y1,
            width: bw,
            height: bh,
            source: None,
            natural: None,
            aspect: alignment_directive(props.h_align, props.v_align, props.scale),
        };
    };

    let (width, height) = scaled_size(props.scale, (nw, nh), (bw, bh));
    let x = anchor(
        props.x1,
        bw,
        width,
        props.h_align == HAlign::Left,
        props.h_align == HAlign::Right,
    );
    let y = anchor(
        props.y1,
        bh,
        height,
        props.v_align == VAlign::Top,
        props.v_align == VAlign::Bottom,
    );

    let source = (props.scale == ScaleMode::Clip).then(|| SourceRect {
        x: anchor(
            0.0,
            nw,
            width,
            props.h_align == HAlign::Left,
            props.h_align == HAlign::Right,
        ),
        y: anchor(
            0.0,
            nh,
            height,
            props.v_align == VAlign::Top,
            props.v_align == VAlign::Bottom,
        ),
        width,
        height,
    });

    ImagePlacement {
        href,
        x,
        y,
        width,
        height,
        source,
        natural: Some((nw, nh)),
        aspect: "none".to_string(),
    }
}
