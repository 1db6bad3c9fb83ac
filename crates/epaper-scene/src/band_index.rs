//! Vertical index of detail bands used for hover and line editing.

use crate::tree::{NodeId, VectorTree};

/// Class carried by the underlay of the hovered detail band.
pub const HOVER_CLASS: &str = "hover-detail";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandEntry {
    pub y1: f64,
    pub y2: f64,
    /// Position of the band in the page's band list.
    pub source_index: usize,
    /// Underlay rect in the band layer.
    pub node: NodeId,
}

impl BandEntry {
    pub fn contains(&self, y: f64) -> bool {
        self.y1 <= y && y <= self.y2
    }

    pub fn midpoint(&self) -> f64 {
        self.y1 + (self.y2 - self.y1) / 2.0
    }
}

/// Detail bands in ascending `y1` order.
///
/// The renderer appends bands in page order, which is already top to bottom.
/// Lookups on an index that is not sorted return wrong answers; nothing checks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BandIndex {
    entries: Vec<BandEntry>,
}

impl BandIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: BandEntry) {
        self.entries.push(entry);
    }

    /// Band whose `[y1, y2]` range holds `y`, both ends inclusive.
    pub fn find_by_y(&self, y: f64) -> Option<&BandEntry> {
        let mut min: isize = 0;
        let mut max: isize = self.entries.len() as isize - 1;

        while min <= max {
            let mid = (min + max) / 2;
            let entry = &self.entries[mid as usize];
            if entry.contains(y) {
                return Some(entry);
            }
            if entry.y1 < y {
                min = mid + 1;
            } else {
                max = mid - 1;
            }
        }
        None
    }

    /// Entry of the band at `source_index` in the page.
    pub fn by_source_index(&self, source_index: usize) -> Option<&BandEntry> {
        self.entries
            .iter()
            .find(|entry| entry.source_index == source_index)
    }

    pub fn entries(&self) -> &[BandEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HoverChange {
    pub left: Option<BandEntry>,
    pub entered: Option<BandEntry>,
}

impl HoverChange {
    pub fn is_empty(&self) -> bool {
        self.left.is_none() && self.entered.is_none()
    }
}

/// Tracks which detail band the pointer is over.
#[derive(Debug, Clone, Default)]
pub struct BandHover {
    current: Option<BandEntry>,
}

impl BandHover {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&BandEntry> {
        self.current.as_ref()
    }

    /// Update hover state for pointer `y` and toggle [`HOVER_CLASS`] on the
    /// underlays involved.
    pub fn pointer_moved(&mut self, index: &BandIndex, tree: &mut VectorTree, y: f64) -> HoverChange {
        let mut change = HoverChange::default();

        if let Some(current) = self.current {
            if current.contains(y) {
                return change;
            }
            tree.remove_class(current.node, HOVER_CLASS);
            self.current = None;
            change.left = Some(current);
        }

        if let Some(entry) = index.find_by_y(y).copied() {
            tree.add_class(entry.node, HOVER_CLASS);
            self.current = Some(entry);
            change.entered = Some(entry);
        }
        change
    }

    /// Forget the hovered band, e.g. after the page was replaced.
    pub fn reset(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeKind;

    fn index_with(ranges: &[(f64, f64)]) -> (VectorTree, BandIndex) {
        let mut tree = VectorTree::new(100.0, 500.0);
        let mut index = BandIndex::new();
        for (i, (y1, y2)) in ranges.iter().enumerate() {
            let node = tree.append(
                tree.root(),
                NodeKind::Rect {
                    x: 0.0,
                    y: *y1,
                    width: 100.0,
                    height: y2 - y1,
                    radius: None,
                },
            );
            index.push(BandEntry {
                y1: *y1,
                y2: *y2,
                source_index: i + 1,
                node,
            });
        }
        (tree, index)
    }

    #[test]
    fn boundaries_are_inclusive() {
        let (_, index) = index_with(&[(10.0, 20.0), (30.0, 40.0), (40.0, 55.0)]);

        assert_eq!(index.find_by_y(10.0).map(|e| e.source_index), Some(1));
        assert_eq!(index.find_by_y(20.0).map(|e| e.source_index), Some(1));
        assert_eq!(index.find_by_y(35.0).map(|e| e.source_index), Some(2));
        assert_eq!(index.find_by_y(55.0).map(|e| e.source_index), Some(3));
    }

    #[test]
    fn gaps_and_outside_are_not_found() {
        let (_, index) = index_with(&[(10.0, 20.0), (30.0, 40.0), (60.0, 80.0)]);

        assert!(index.find_by_y(5.0).is_none());
        assert!(index.find_by_y(25.0).is_none());
        assert!(index.find_by_y(50.0).is_none());
        assert!(index.find_by_y(81.0).is_none());
        assert!(BandIndex::new().find_by_y(0.0).is_none());
    }

    #[test]
    fn every_point_matches_linear_scan() {
        let ranges: Vec<(f64, f64)> = (0..17)
            .map(|i| (i as f64 * 12.0, i as f64 * 12.0 + 9.0))
            .collect();
        let (_, index) = index_with(&ranges);

        for step in -4..220 {
            let y = step as f64;
            let expected = index.entries().iter().find(|e| e.contains(y));
            assert_eq!(index.find_by_y(y), expected, "y = {y}");
        }
    }

    #[test]
    fn hover_moves_class_between_bands() {
        let (mut tree, index) = index_with(&[(10.0, 20.0), (30.0, 40.0)]);
        let mut hover = BandHover::new();

        let change = hover.pointer_moved(&index, &mut tree, 15.0);
        let first = index.entries()[0].node;
        assert_eq!(change.entered.map(|e| e.source_index), Some(1));
        assert!(tree.has_class(first, HOVER_CLASS));

        assert!(hover.pointer_moved(&index, &mut tree, 18.0).is_empty());

        let change = hover.pointer_moved(&index, &mut tree, 35.0);
        assert_eq!(change.left.map(|e| e.source_index), Some(1));
        assert_eq!(change.entered.map(|e| e.source_index), Some(2));
        assert!(!tree.has_class(first, HOVER_CLASS));

        let change = hover.pointer_moved(&index, &mut tree, 25.0);
        assert_eq!(change.left.map(|e| e.source_index), Some(2));
        assert!(change.entered.is_none());
        assert!(hover.current().is_none());
    }
}
