//! SVG text output of a rendered page.

use quick_xml::escape::escape;

use crate::renderer::RenderedPage;
use crate::renderer::image::ImagePlacement;
use crate::tree::{Node, NodeId, NodeKind, VectorTree};

impl RenderedPage {
    /// Serialize the tree as a standalone SVG document.
    pub fn to_svg(&self) -> String {
        self.write_svg(None)
    }

    /// Same as [`to_svg`](Self::to_svg) with `css` embedded in a `<style>` block.
    pub fn to_svg_with_style(&self, css: &str) -> String {
        self.write_svg(Some(css))
    }

    fn write_svg(&self, css: Option<&str>) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 {} {}\" class=\"epaper-svg\">\n",
            self.width, self.height
        ));
        if let Some(css) = css {
            out.push_str("<style>\n");
            out.push_str(css);
            out.push_str("\n</style>\n");
        }
        for child in self.tree.children(self.tree.root()) {
            write_node(&self.tree, *child, 1, &mut out);
        }
        out.push_str("</svg>\n");
        out
    }
}

fn write_node(tree: &VectorTree, id: NodeId, depth: usize, out: &mut String) {
    let Some(node) = tree.node(id) else {
        return;
    };
    let indent = "  ".repeat(depth);

    if let NodeKind::Image(placement) = &node.kind {
        if placement.source.is_some() {
            write_clipped_image(placement, &indent, out);
            return;
        }
    }

    out.push_str(&indent);
    out.push('<');
    out.push_str(node.kind.tag());
    write_geometry(&node.kind, out);
    write_common(node, out);

    match &node.kind {
        NodeKind::Text { text, .. } => {
            out.push('>');
            out.push_str(&escape(text));
            out.push_str("</text>\n");
        }
        NodeKind::Group | NodeKind::Root { .. } if !node.children().is_empty() => {
            out.push_str(">\n");
            for child in node.children() {
                write_node(tree, *child, depth + 1, out);
            }
            out.push_str(&indent);
            out.push_str("</g>\n");
        }
        _ => out.push_str("/>\n"),
    }
}

fn write_geometry(kind: &NodeKind, out: &mut String) {
    match kind {
        NodeKind::Rect {
            x,
            y,
            width,
            height,
            radius,
        } => {
            out.push_str(&format!(
                " x=\"{x}\" y=\"{y}\" width=\"{width}\" height=\"{height}\""
            ));
            if let Some(r) = radius {
                out.push_str(&format!(" rx=\"{r}\" ry=\"{r}\""));
            }
        }
        NodeKind::Line { x1, y1, x2, y2 } => out.push_str(&format!(
            " x1=\"{x1}\" y1=\"{y1}\" x2=\"{x2}\" y2=\"{y2}\""
        )),
        NodeKind::Text { x, y, .. } => out.push_str(&format!(" x=\"{x}\" y=\"{y}\"")),
        NodeKind::Image(placement) => out.push_str(&format!(
            " x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" href=\"{}\" preserveAspectRatio=\"{}\"",
            placement.x,
            placement.y,
            placement.width,
            placement.height,
            escape(&placement.href),
            placement.aspect
        )),
        NodeKind::Root { .. } | NodeKind::Group => {}
    }
}

fn write_common(node: &Node, out: &mut String) {
    if let Some(id) = &node.id {
        out.push_str(&format!(" id=\"{}\"", escape(id)));
    }
    if !node.classes.is_empty() {
        out.push_str(&format!(" class=\"{}\"", escape(&node.classes.join(" "))));
    }
    for (name, value) in &node.attributes {
        out.push_str(&format!(" {name}=\"{}\"", escape(value)));
    }
}

/// Clipped images become a nested viewport showing only the source rect.
fn write_clipped_image(placement: &ImagePlacement, indent: &str, out: &mut String) {
    let (Some(source), Some((nw, nh))) = (placement.source, placement.natural) else {
        return;
    };
    out.push_str(&format!(
        "{indent}<svg x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" viewBox=\"{} {} {} {}\">",
        placement.x,
        placement.y,
        placement.width,
        placement.height,
        source.x,
        source.y,
        source.width,
        source.height
    ));
    out.push_str(&format!(
        "<image width=\"{nw}\" height=\"{nh}\" href=\"{}\"/></svg>\n",
        escape(&placement.href)
    ));
}
