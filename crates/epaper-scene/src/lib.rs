//! Scene-graph renderer for epaper pages.
//!
//! Turns a [`epaper_ir::Page`] into a styled [`tree::VectorTree`] with
//! deduplicated style classes, a [`band_index::BandIndex`] for vertical hit
//! testing and a [`roles::RoleTable`] naming what rendered nodes mean.

pub mod band_index;
pub mod error;
pub mod renderer;
pub mod roles;
pub mod style;
pub mod svg;
pub mod tree;

pub use band_index::{BandEntry, BandHover, BandIndex, HoverChange};
pub use error::SceneError;
pub use renderer::{RenderOptions, RenderedPage, SceneRenderer};
pub use roles::{Role, RoleTable};
pub use style::{RuleList, StyleCache, StyleSheet};
pub use tree::{NodeId, NodeKind, VectorTree};
