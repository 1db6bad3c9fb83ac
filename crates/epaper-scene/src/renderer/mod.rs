//! Page → vector tree renderer.
//!
//! # Layers
//!
//! The root holds three ordered layers:
//! - band layer: one underlay rect per detail band (hover target)
//! - tooltip layer: empty until [`SceneRenderer::render_tooltips`]
//! - content layer: background (fills, text) then foreground (lines)
//!
//! # Usage
//!
//! ```ignore
//! let mut renderer = SceneRenderer::new(RuleList::new(), RenderOptions::default());
//! let rendered = renderer.render_page(&page)?;
//! let hit = rendered.band_index.find_by_y(120.0);
//! ```

pub mod elements;
pub mod image;
pub mod state;

use epaper_config::RenderConfig;
use epaper_ir::page::Page;
use epaper_ir::protocol::HintRect;
use tracing::debug;

use self::elements::{RenderContext, render_element};
use self::image::{ImageMetrics, NoImageMetrics};
use self::state::StyleState;
use crate::band_index::{BandEntry, BandIndex};
use crate::error::SceneError;
use crate::roles::{Role, RoleTable};
use crate::style::{RuleList, StyleCache, StyleSheet};
use crate::tree::{NodeId, NodeKind, VectorTree};

pub const DETAIL_CLASS: &str = "detail";
pub const TOOLTIP_CLASS: &str = "tooltip";
pub const DEBUG_MARGIN_CLASS: &str = "debug-margin";
pub const TOOLTIP_LAYER_ID: &str = "tt-layer";

#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub default_font: String,
    pub default_font_size: f64,
    pub debug_margins: bool,
    pub asset_base_url: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::from(&RenderConfig::default())
    }
}

impl From<&RenderConfig> for RenderOptions {
    fn from(config: &RenderConfig) -> Self {
        Self {
            default_font: config.default_font.clone(),
            default_font_size: config.default_font_size,
            debug_margins: config.debug_margins,
            asset_base_url: config.asset_base_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layers {
    pub bands: NodeId,
    pub tooltips: NodeId,
    pub content: NodeId,
    pub background: NodeId,
    pub foreground: NodeId,
}

/// Output of one page render.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub tree: VectorTree,
    pub band_index: BandIndex,
    pub roles: RoleTable,
    pub layers: Layers,
    pub width: f64,
    pub height: f64,
}

/// Renders pages against one stylesheet for its whole lifetime.
pub struct SceneRenderer<S = RuleList> {
    styles: StyleCache<S>,
    options: RenderOptions,
    metrics: Box<dyn ImageMetrics + Send + Sync>,
}

impl<S: StyleSheet> SceneRenderer<S> {
    pub fn new(sheet: S, options: RenderOptions) -> Self {
        Self {
            styles: StyleCache::new(sheet),
            options,
            metrics: Box::new(NoImageMetrics),
        }
    }

    pub fn with_image_metrics(mut self, metrics: Box<dyn ImageMetrics + Send + Sync>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn styles(&self) -> &StyleCache<S> {
        &self.styles
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Render `page` into a fresh tree. The caller replaces its visible tree
    /// only on success.
    pub fn render_page(&mut self, page: &Page) -> Result<RenderedPage, SceneError> {
        let props = page.properties;
        for (name, value) in [("width", props.width), ("height", props.height)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(SceneError::Malformed(format!("page {name} is {value}")));
            }
        }

        let mut tree = VectorTree::new(props.width, props.height);
        let root = tree.root();
        let bands = tree.append(root, NodeKind::Group);
        let tooltips = tree.append(root, NodeKind::Group);
        let content = tree.append(root, NodeKind::Group);
        let layers = Layers {
            bands,
            tooltips,
            content,
            background: tree.append(content, NodeKind::Group),
            foreground: tree.append(content, NodeKind::Group),
        };
        tree.set_id(layers.tooltips, TOOLTIP_LAYER_ID);

        if self.options.debug_margins {
            let margin = tree.append(
                layers.bands,
                NodeKind::Rect {
                    x: props.margin_left,
                    y: props.margin_top,
                    width: props.width - props.margin_left - props.margin_right,
                    height: props.height - props.margin_top - props.margin_bottom,
                    radius: None,
                },
            );
            tree.add_class(margin, DEBUG_MARGIN_CLASS);
        }

        let mut roles = RoleTable::new();
        let mut band_index = BandIndex::new();
        for (index, band) in page.detail_bands() {
            let y1 = band.properties.offset_y;
            let y2 = y1 + band.properties.height;
            let node = tree.append(
                layers.bands,
                NodeKind::Rect {
                    x: 0.0,
                    y: y1,
                    width: props.width,
                    height: band.properties.height,
                    radius: None,
                },
            );
            tree.add_class(node, DETAIL_CLASS);
            roles.register(node, Role::DetailBand { index });
            band_index.push(BandEntry {
                y1,
                y2,
                source_index: index,
                node,
            });
        }

        let mut cx = RenderContext {
            styles: &mut self.styles,
            options: &self.options,
            metrics: self.metrics.as_ref(),
            tree: &mut tree,
            roles: &mut roles,
            background: layers.background,
            foreground: layers.foreground,
        };
        let mut state = StyleState::initial(&self.options);
        for band in &page.bands {
            for element in &band.elements {
                state = render_element(&mut cx, element, state)?;
            }
        }

        debug!(
            bands = page.bands.len(),
            detail_bands = band_index.len(),
            nodes = tree.len(),
            "rendered page"
        );
        Ok(RenderedPage {
            tree,
            band_index,
            roles,
            layers,
            width: props.width,
            height: props.height,
        })
    }

    /// Replace the tooltip layer of `rendered` with one rect per hint.
    /// Bands and content are left alone.
    pub fn render_tooltips(&self, rendered: &mut RenderedPage, hints: &[HintRect]) {
        rendered.tree.clear_children(rendered.layers.tooltips);
        rendered.roles.clear_tooltips();

        for hint in hints {
            let node = rendered.tree.append(
                rendered.layers.tooltips,
                NodeKind::Rect {
                    x: hint.x,
                    y: hint.y,
                    width: hint.w,
                    height: hint.h,
                    radius: None,
                },
            );
            rendered.tree.add_class(node, TOOLTIP_CLASS);
            rendered
                .tree
                .set_attribute(node, "tooltip", hint.text.clone());
            rendered.roles.register(
                node,
                Role::Tooltip {
                    text: hint.text.clone(),
                },
            );
        }
    }
}

impl RenderedPage {
    /// Text of the tooltip under (`x`, `y`), last hint first.
    pub fn tooltip_at(&self, x: f64, y: f64) -> Option<&str> {
        self.tree
            .children(self.layers.tooltips)
            .iter()
            .rev()
            .find_map(|id| {
                let node = self.tree.node(*id)?;
                match (&node.kind, self.roles.role(*id)) {
                    (
                        NodeKind::Rect {
                            x: rx,
                            y: ry,
                            width,
                            height,
                            ..
                        },
                        Some(Role::Tooltip { text }),
                    ) if x >= *rx && x <= rx + width && y >= *ry && y <= ry + height => {
                        Some(text.as_str())
                    }
                    _ => None,
                }
            })
    }
}
