//! World-space geometry shared by the canvas and its tests.
//!
//! Everything here works on plain world coordinates; the canvas applies the pan
//! offset when drawing.

use crate::constants::{CARD_HEIGHT, CARD_WIDTH, GRID_SIZE, LINK_DOT_DROP, LINK_MENU_DROP, SNAP_RADIUS};
use crate::types::{CardLink, NodeId, SchemaNode};
use eframe::egui::{self, Pos2, Rect};

/// Rectangle of a card whose top-left corner is `pos`.
pub fn card_rect_at(pos: Pos2) -> Rect {
    Rect::from_min_size(pos, egui::vec2(CARD_WIDTH, CARD_HEIGHT))
}

/// Rectangle of a card at its stored position.
pub fn card_rect(node: &SchemaNode) -> Rect {
    card_rect_at(node.position().into())
}

/// Snaps a position to the nearest grid point.
///
/// # Arguments
///
/// * `pos` - Position to snap
///
/// # Returns
///
/// The position with each coordinate rounded to a multiple of the grid size
pub fn snap_to_grid(pos: Pos2) -> Pos2 {
    egui::pos2(
        (pos.x / GRID_SIZE).round() * GRID_SIZE,
        (pos.y / GRID_SIZE).round() * GRID_SIZE,
    )
}

/// Midpoint of a rectangle's bottom edge.
pub fn bottom_centre(rect: Rect) -> Pos2 {
    rect.center_bottom()
}

/// Horizontal gap between two cards, measured from the left card's right edge
/// to the right card's left edge. Negative when they overlap.
pub fn horizontal_gap(a: Rect, b: Rect) -> f32 {
    let (left, right) = if a.min.x <= b.min.x { (a, b) } else { (b, a) };
    right.min.x - left.max.x
}

/// Whether the vertical extents of two rectangles strictly overlap.
pub fn overlaps_vertically(a: Rect, b: Rect) -> bool {
    a.min.y.max(b.min.y) < a.max.y.min(b.max.y)
}

/// Two unlinked cards close enough to be offered as a link.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityPair {
    /// Left card
    pub source: NodeId,
    /// Right card
    pub target: NodeId,
    /// Where the link dot is offered
    pub midpoint: Pos2,
    /// Horizontal gap between the cards
    pub gap: f32,
}

/// Finds every pair of unlinked cards eligible for quick linking.
///
/// A pair qualifies when the horizontal gap is in `(0, SNAP_RADIUS]` and the
/// cards overlap vertically. The left card becomes the source regardless of
/// the order the cards were added in.
///
/// # Arguments
///
/// * `cards` - Card ids with their current world rectangles
/// * `links` - Existing links; pairs that are already linked are skipped
pub fn proximity_pairs(cards: &[(NodeId, Rect)], links: &[CardLink]) -> Vec<ProximityPair> {
    let mut pairs = Vec::new();
    for (i, &(id_a, rect_a)) in cards.iter().enumerate() {
        for &(id_b, rect_b) in &cards[i + 1..] {
            let ((source, left), (target, right)) = if rect_a.min.x <= rect_b.min.x {
                ((id_a, rect_a), (id_b, rect_b))
            } else {
                ((id_b, rect_b), (id_a, rect_a))
            };

            let gap = right.min.x - left.max.x;
            if gap <= 0.0 || gap > SNAP_RADIUS || !overlaps_vertically(left, right) {
                continue;
            }
            if links.iter().any(|l| l.joins(source, target)) {
                continue;
            }

            let midpoint = egui::pos2(
                (left.center().x + right.center().x) / 2.0,
                left.max.y.max(right.max.y) + LINK_DOT_DROP,
            );
            pairs.push(ProximityPair {
                source,
                target,
                midpoint,
                gap,
            });
        }
    }
    pairs
}

/// Whether the stored dot of an existing link is still shown.
///
/// The dot stays while the cards are at most twice the snap radius apart.
pub fn link_dot_visible(a: Rect, b: Rect) -> bool {
    horizontal_gap(a, b) <= SNAP_RADIUS * 2.0
}

/// Anchor of the action menu hanging under a link dot.
pub fn link_menu_anchor(dot: Pos2) -> Pos2 {
    dot + egui::vec2(0.0, LINK_MENU_DROP)
}

/// Line segments drawn for an existing link.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkConnectors {
    /// Source card bottom centre to the dot
    pub source: [Pos2; 2],
    /// Target card bottom centre to the dot
    pub target: [Pos2; 2],
    /// Dot to the menu node, when the menu has been placed
    pub leader: Option<[Pos2; 2]>,
}

/// Computes the connector segments of a link.
pub fn link_connectors(source: Rect, target: Rect, link: &CardLink) -> LinkConnectors {
    let dot: Pos2 = link.link_dot_position.into();
    LinkConnectors {
        source: [bottom_centre(source), dot],
        target: [bottom_centre(target), dot],
        leader: link.menu_node_position.map(|menu| [dot, menu.into()]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Point;
    use uuid::Uuid;

    fn card(x: f32, y: f32) -> (NodeId, Rect) {
        (Uuid::new_v4(), card_rect_at(egui::pos2(x, y)))
    }

    #[test]
    fn test_card_rect_uses_node_position() {
        let node = crate::types::SchemaNode::new(
            "number",
            "Number",
            None,
            Point::new(40.0, 60.0),
            Default::default(),
        );
        let rect = card_rect(&node);
        assert_eq!(rect.min, egui::pos2(40.0, 60.0));
        assert_eq!(rect.size(), egui::vec2(248.0, 160.0));
    }

    #[test]
    fn test_snap_to_grid() {
        assert_eq!(snap_to_grid(egui::pos2(29.0, 31.0)), egui::pos2(20.0, 40.0));
        assert_eq!(snap_to_grid(egui::pos2(-9.0, -11.0)), egui::pos2(0.0, -20.0));
        assert_eq!(snap_to_grid(egui::pos2(120.0, 60.0)), egui::pos2(120.0, 60.0));
    }

    #[test]
    fn test_pair_detected_with_midpoint() {
        let a = card(0.0, 0.0);
        let b = card(268.0, 20.0);
        let pairs = proximity_pairs(&[a, b], &[]);

        assert_eq!(pairs.len(), 1);
        let pair = pairs[0];
        assert_eq!(pair.source, a.0);
        assert_eq!(pair.target, b.0);
        assert_eq!(pair.gap, 20.0);
        // Mean of centre x's (124 and 392), max bottom (180) + 36
        assert_eq!(pair.midpoint, egui::pos2(258.0, 216.0));
    }

    #[test]
    fn test_pair_is_order_independent() {
        let right = card(288.0, 0.0);
        let left = card(0.0, 0.0);
        let pairs = proximity_pairs(&[right, left], &[]);

        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].source, left.0);
        assert_eq!(pairs[0].target, right.0);
    }

    #[test]
    fn test_gap_bounds() {
        // Touching edges: gap 0 is excluded
        assert!(proximity_pairs(&[card(0.0, 0.0), card(248.0, 0.0)], &[]).is_empty());
        // Exactly the snap radius is included
        assert_eq!(proximity_pairs(&[card(0.0, 0.0), card(288.0, 0.0)], &[]).len(), 1);
        // Just beyond is excluded
        assert!(proximity_pairs(&[card(0.0, 0.0), card(289.0, 0.0)], &[]).is_empty());
    }

    #[test]
    fn test_vertical_overlap_is_strict() {
        // Bottom of the first card exactly meets the top of the second
        assert!(proximity_pairs(&[card(0.0, 0.0), card(268.0, 160.0)], &[]).is_empty());
        assert_eq!(proximity_pairs(&[card(0.0, 0.0), card(268.0, 159.0)], &[]).len(), 1);
    }

    #[test]
    fn test_linked_pairs_skipped() {
        let a = card(0.0, 0.0);
        let b = card(268.0, 0.0);
        let link = CardLink::new(b.0, a.0, Point::new(258.0, 196.0));
        assert!(proximity_pairs(&[a, b], &[link]).is_empty());
    }

    #[test]
    fn test_link_dot_visibility() {
        let a = card_rect_at(egui::pos2(0.0, 0.0));
        assert!(link_dot_visible(a, card_rect_at(egui::pos2(328.0, 0.0))));
        assert!(!link_dot_visible(a, card_rect_at(egui::pos2(329.0, 0.0))));
        // Symmetric in argument order
        assert!(!link_dot_visible(card_rect_at(egui::pos2(329.0, 0.0)), a));
    }

    #[test]
    fn test_link_connectors() {
        let source = card_rect_at(egui::pos2(0.0, 0.0));
        let target = card_rect_at(egui::pos2(268.0, 0.0));
        let mut link = CardLink::new(Uuid::new_v4(), Uuid::new_v4(), Point::new(258.0, 196.0));

        let lines = link_connectors(source, target, &link);
        assert_eq!(lines.source, [egui::pos2(124.0, 160.0), egui::pos2(258.0, 196.0)]);
        assert_eq!(lines.target[0], egui::pos2(392.0, 160.0));
        assert!(lines.leader.is_none());

        link.menu_node_position = Some(link_menu_anchor(egui::pos2(258.0, 196.0)).into());
        let lines = link_connectors(source, target, &link);
        assert_eq!(lines.leader, Some([egui::pos2(258.0, 196.0), egui::pos2(258.0, 256.0)]));
    }
}
