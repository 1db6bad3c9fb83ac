//! Element walk: `before`, own geometry, `children`, `after`.

use epaper_ir::page::{Element, ElementKind, ImageProps, LineGeometry, RectGeometry, TextProps, TextRun};
use tracing::{debug, warn};

use super::image::{ImageMetrics, place_image};
use super::state::StyleState;
use super::RenderOptions;
use crate::error::SceneError;
use crate::roles::{Role, RoleTable};
use crate::style::{StyleCache, StyleSheet};
use crate::tree::{NodeId, NodeKind, VectorTree};

/// Class carried by link groups and their text nodes.
pub const LINK_CLASS: &str = "epaper-link";

/// Everything one page render writes into.
pub(super) struct RenderContext<'a, S> {
    pub styles: &'a mut StyleCache<S>,
    pub options: &'a RenderOptions,
    pub metrics: &'a dyn ImageMetrics,
    pub tree: &'a mut VectorTree,
    pub roles: &'a mut RoleTable,
    /// Fills and text.
    pub background: NodeId,
    /// Line strokes, above fills.
    pub foreground: NodeId,
}

/// Render `element` and return the running style for its next sibling.
pub(super) fn render_element<S: StyleSheet>(
    cx: &mut RenderContext<'_, S>,
    element: &Element,
    mut state: StyleState,
) -> Result<StyleState, SceneError> {
    for before in element.before_elements() {
        state = render_element(cx, before, state)?;
    }

    state = match &element.kind {
        ElementKind::Text { props, runs } => render_text(cx, props, runs, state)?,
        ElementKind::Line { shape, geometry } => {
            let state = state.with_shape(shape);
            render_line(cx, geometry, &state)?;
            state
        }
        ElementKind::Rect { shape, geometry } => {
            let state = state.with_shape(shape);
            render_rect(cx, geometry, &state)?;
            state
        }
        ElementKind::Image(props) => {
            render_image(cx, props);
            state
        }
        ElementKind::Unknown(code) => {
            warn!(kind = %code, "skipping unknown page element");
            state
        }
    };

    for child in &element.children {
        state = render_element(cx, child, state)?;
    }
    for after in element.after_elements() {
        state = render_element(cx, after, state)?;
    }
    Ok(state)
}

fn render_text<S: StyleSheet>(
    cx: &mut RenderContext<'_, S>,
    props: &TextProps,
    runs: &[TextRun],
    state: StyleState,
) -> Result<StyleState, SceneError> {
    let state = state.with_text(props);
    if runs.is_empty() {
        return Ok(state);
    }
    let class = cx.styles.resolve(&state.text_style())?;

    let (parent, link_text) = if props.is_link() {
        let text = runs
            .iter()
            .map(|run| run.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let group = cx.tree.append(cx.background, NodeKind::Group);
        cx.tree.add_class(group, LINK_CLASS);
        cx.roles.register(group, Role::Link { text: text.clone() });
        (group, Some(text))
    } else {
        (cx.background, None)
    };

    let transform = props.rotation.filter(|angle| *angle != 0.0).map(|angle| {
        format!(
            "rotate({angle} {} {})",
            props.rotation_x.unwrap_or(0.0),
            props.rotation_y.unwrap_or(0.0)
        )
    });

    for run in runs {
        let node = cx.tree.append(
            parent,
            NodeKind::Text {
                x: run.x,
                y: run.y,
                text: run.text.clone(),
            },
        );
        cx.tree.add_class(node, &class);
        if let Some(text) = &link_text {
            cx.tree.add_class(node, LINK_CLASS);
            cx.roles.register(node, Role::Link { text: text.clone() });
        }
        if let Some(transform) = &transform {
            cx.tree.set_attribute(node, "transform", transform.clone());
        }
    }
    Ok(state)
}

fn render_line<S: StyleSheet>(
    cx: &mut RenderContext<'_, S>,
    geometry: &LineGeometry,
    state: &StyleState,
) -> Result<(), SceneError> {
    let class = cx.styles.resolve(&state.line_style())?;
    let node = cx.tree.append(
        cx.foreground,
        NodeKind::Line {
            x1: geometry.x1,
            y1: geometry.y1,
            x2: geometry.x2,
            y2: geometry.y2,
        },
    );
    cx.tree.add_class(node, &class);
    Ok(())
}

fn render_rect<S: StyleSheet>(
    cx: &mut RenderContext<'_, S>,
    geometry: &RectGeometry,
    state: &StyleState,
) -> Result<(), SceneError> {
    let class = cx.styles.resolve(&state.shape_style())?;
    let node = cx.tree.append(
        cx.background,
        NodeKind::Rect {
            x: geometry.x,
            y: geometry.y,
            width: geometry.w,
            height: geometry.h,
            radius: geometry.radius.filter(|r| *r > 0.0),
        },
    );
    cx.tree.add_class(node, &class);
    Ok(())
}

fn render_image<S: StyleSheet>(cx: &mut RenderContext<'_, S>, props: &ImageProps) {
    if props.source.trim().len() <= 1 {
        debug!(source = %props.source, "image without source, skipped");
        return;
    }
    let natural = props
        .natural_size()
        .or_else(|| cx.metrics.natural_size(&props.source));
    let placement = place_image(props, natural, &cx.options.asset_base_url);
    cx.tree.append(cx.background, NodeKind::Image(placement));
}
