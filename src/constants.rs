//! Shared application-wide constants.
//! Centralizes tweakable values used across layout, rendering and interactions.

// Card geometry
/// Width of a card on the canvas, in world units.
pub const CARD_WIDTH: f32 = 248.0;
/// Height of a card on the canvas, in world units.
pub const CARD_HEIGHT: f32 = 160.0;
/// Corner radius for cards and panels (in screen pixels).
pub const CARD_CORNER_RADIUS: f32 = 5.0;

// Grid/drawing
/// Grid cell size in world units. Card positions snap to this on release.
pub const GRID_SIZE: f32 = 20.0;
/// Spacing between background dots (in world units).
pub const DOT_SPACING: f32 = 20.0;
/// Radius of background dots (in screen pixels).
pub const DOT_RADIUS: f32 = 1.0;

// Linking
/// Maximum horizontal gap between two cards for them to be offered as a link.
pub const SNAP_RADIUS: f32 = 40.0;
/// Vertical distance from the lower card bottom to a link dot.
pub const LINK_DOT_DROP: f32 = 36.0;
/// Radius of a link dot.
pub const LINK_DOT_RADIUS: f32 = 16.0;
/// Vertical distance from a link dot to its action menu.
pub const LINK_MENU_DROP: f32 = 60.0;

// Menus and overlays
/// Width of the stage / link action menus.
pub const MENU_WIDTH: f32 = 153.0;
/// Gap between a "+" node and the menu hanging under it.
pub const MENU_TOP_OFFSET: f32 = 44.0;
/// Width of overlay cards opened from a link menu.
pub const OVERLAY_WIDTH: f32 = 248.0;
/// Vertical gap between a link menu anchor and an overlay card.
pub const OVERLAY_DROP: f32 = 8.0;

// Flow stages
/// Vertical gap between a card (or previous stage) and the next stage frame.
pub const FRAME_GAP: f32 = 48.0;
/// Distance from the bottom of an open stage frame to its connector node.
pub const CONNECTOR_DROP: f32 = 32.0;
/// Radius of the "+" flow nodes.
pub const FLOW_NODE_RADIUS: f32 = 16.0;
/// Minimum change in measured height that triggers a re-layout.
pub const HEIGHT_EPSILON: f32 = 1.0;

// Thresholds
/// Default threshold value offered by condition panels.
pub const DEFAULT_THRESHOLD: f64 = 36.0;
/// Upper bound of threshold sliders.
pub const THRESHOLD_MAX: f64 = 100.0;
/// Default number of days for a custom check cadence.
pub const DEFAULT_CUSTOM_DAYS: u32 = 7;
/// Largest accepted custom cadence in days.
pub const MAX_CUSTOM_DAYS: u32 = 365;

// Palette
/// Lower bound of the random world position for newly added cards.
pub const SPAWN_MIN: f32 = 200.0;
/// Size of the random spawn window.
pub const SPAWN_SPREAD: f32 = 200.0;

// Toasts
/// How long a toast stays on screen, in seconds.
pub const TOAST_SECONDS: f64 = 4.0;
