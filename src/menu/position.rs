//! Viewport-aware placement of menus
//!
//! Top-level menus are placed at the pointer and flipped or centered to stay
//! on screen. Submenus are anchored to their parent item and flip to the other
//! side or upwards based on where they were measured.

use serde::{Deserialize, Serialize};

use crate::layout::{Point, Rect, Size};

/// Top-left corner of a left-to-right menu opened at `desired`
///
/// Flips up when the menu would overflow the bottom edge and left when it
/// would overflow the right edge. If a flipped edge ends up negative the menu
/// is centered on that axis, or pinned to 0 when it is larger than the
/// viewport.
pub fn menu_position(desired: Point, menu: Size, viewport: Size) -> Point {
    let mut top = desired.y;
    let mut left = desired.x;

    if desired.y + menu.height > viewport.height {
        top -= menu.height;
    }
    if desired.x + menu.width > viewport.width {
        left -= menu.width;
    }

    if top < 0.0 {
        top = center(menu.height, viewport.height);
    }
    if left < 0.0 {
        left = center(menu.width, viewport.width);
    }

    Point::new(left, top)
}

/// Top-left corner of a right-to-left menu opened at `desired`
///
/// The menu's right edge sits at the pointer; it moves to the right of the
/// pointer when there is no room on the left.
pub fn rtl_menu_position(desired: Point, menu: Size, viewport: Size) -> Point {
    let mut top = desired.y;
    let mut left = desired.x - menu.width;

    if desired.y + menu.height > viewport.height {
        top -= menu.height;
    }
    if left < 0.0 {
        left += menu.width;
    }

    if top < 0.0 {
        top = center(menu.height, viewport.height);
    }
    if left + menu.width > viewport.width {
        left = center(menu.width, viewport.width);
    }

    Point::new(left, top)
}

fn center(extent: f32, available: f32) -> f32 {
    if extent < available {
        (available - extent) / 2.0
    } else {
        0.0
    }
}

/// Vertical edge a submenu is pinned to, relative to its parent item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAnchor {
    /// `top: 0`, extends downwards
    #[default]
    Top,
    /// `bottom: 0`, extends upwards
    Bottom,
}

/// Side of the parent item a submenu opens on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAnchor {
    /// `left: 100%`
    #[default]
    Right,
    /// `right: 100%`
    Left,
}

/// Placement of a submenu relative to its parent item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubMenuAnchor {
    pub vertical: VerticalAnchor,
    pub horizontal: HorizontalAnchor,
}

/// Flip-to-fit anchor for a submenu measured at `rect`
///
/// Without a measurement the submenu keeps the reading-direction default.
pub fn submenu_anchor(rect: Option<Rect>, viewport: Size, rtl: bool) -> SubMenuAnchor {
    let Some(rect) = rect else {
        return SubMenuAnchor {
            vertical: VerticalAnchor::Top,
            horizontal: if rtl {
                HorizontalAnchor::Left
            } else {
                HorizontalAnchor::Right
            },
        };
    };

    let vertical = if rect.bottom() > viewport.height {
        VerticalAnchor::Bottom
    } else {
        VerticalAnchor::Top
    };

    let horizontal = if rtl {
        if rect.left() < 0.0 {
            HorizontalAnchor::Right
        } else {
            HorizontalAnchor::Left
        }
    } else if rect.right() < viewport.width {
        HorizontalAnchor::Right
    } else {
        HorizontalAnchor::Left
    };

    SubMenuAnchor {
        vertical,
        horizontal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Size = Size {
        width: 800.0,
        height: 600.0,
    };

    #[test]
    fn test_fits_as_requested() {
        let p = menu_position(Point::new(100.0, 100.0), Size::new(200.0, 150.0), VIEWPORT);
        assert_eq!(p, Point::new(100.0, 100.0));
    }

    #[test]
    fn test_flips_up_and_left_near_bottom_right() {
        let menu = Size::new(200.0, 150.0);
        let p = menu_position(Point::new(750.0, 580.0), menu, VIEWPORT);
        assert_eq!(p, Point::new(550.0, 430.0));
        assert!(p.y + menu.height <= VIEWPORT.height);
        assert!(p.x + menu.width <= VIEWPORT.width);
    }

    #[test]
    fn test_centers_when_flip_goes_negative() {
        let menu = Size::new(300.0, 500.0);
        let p = menu_position(Point::new(100.0, 400.0), menu, VIEWPORT);
        assert_eq!(p, Point::new(100.0, 50.0));
    }

    #[test]
    fn test_pins_to_zero_when_larger_than_viewport() {
        let p = menu_position(Point::new(10.0, 10.0), Size::new(900.0, 700.0), VIEWPORT);
        assert_eq!(p, Point::new(0.0, 0.0));
    }

    #[test]
    fn test_overflow_property_over_a_grid() {
        let menus = [Size::new(120.0, 80.0), Size::new(400.0, 590.0), Size::new(799.0, 10.0)];
        for menu in menus {
            for x in (0..=800).step_by(50) {
                for y in (0..=600).step_by(50) {
                    let p = menu_position(Point::new(x as f32, y as f32), menu, VIEWPORT);
                    assert!(p.x >= 0.0 && p.y >= 0.0, "{menu:?} at ({x}, {y}) -> {p:?}");
                    let fits_x = p.x + menu.width <= VIEWPORT.width;
                    let centered_x = p.x == (VIEWPORT.width - menu.width) / 2.0;
                    assert!(fits_x || centered_x, "{menu:?} at ({x}, {y}) -> {p:?}");
                    let fits_y = p.y + menu.height <= VIEWPORT.height;
                    let centered_y = p.y == (VIEWPORT.height - menu.height) / 2.0;
                    assert!(fits_y || centered_y, "{menu:?} at ({x}, {y}) -> {p:?}");
                }
            }
        }
    }

    #[test]
    fn test_rtl_anchors_right_edge_at_cursor() {
        let p = rtl_menu_position(Point::new(400.0, 100.0), Size::new(200.0, 150.0), VIEWPORT);
        assert_eq!(p, Point::new(200.0, 100.0));
    }

    #[test]
    fn test_rtl_moves_right_when_no_room_on_left() {
        let p = rtl_menu_position(Point::new(50.0, 100.0), Size::new(200.0, 150.0), VIEWPORT);
        assert_eq!(p, Point::new(50.0, 100.0));
    }

    #[test]
    fn test_rtl_flips_up_and_centers_wide_menus() {
        let p = rtl_menu_position(Point::new(100.0, 550.0), Size::new(750.0, 100.0), VIEWPORT);
        assert_eq!(p, Point::new(25.0, 450.0));
    }

    #[test]
    fn test_submenu_defaults_without_measurement() {
        assert_eq!(submenu_anchor(None, VIEWPORT, false), SubMenuAnchor::default());
        assert_eq!(
            submenu_anchor(None, VIEWPORT, true).horizontal,
            HorizontalAnchor::Left
        );
    }

    #[test]
    fn test_submenu_flips_near_edges() {
        let inside = Rect::new(300.0, 200.0, 150.0, 100.0);
        assert_eq!(submenu_anchor(Some(inside), VIEWPORT, false), SubMenuAnchor::default());

        let bottom_right = Rect::new(700.0, 550.0, 150.0, 100.0);
        assert_eq!(
            submenu_anchor(Some(bottom_right), VIEWPORT, false),
            SubMenuAnchor {
                vertical: VerticalAnchor::Bottom,
                horizontal: HorizontalAnchor::Left,
            }
        );
    }

    #[test]
    fn test_rtl_submenu_flips_right_when_off_left_edge() {
        let off_left = Rect::new(-20.0, 100.0, 150.0, 100.0);
        assert_eq!(
            submenu_anchor(Some(off_left), VIEWPORT, true).horizontal,
            HorizontalAnchor::Right
        );
        let inside = Rect::new(200.0, 100.0, 150.0, 100.0);
        assert_eq!(
            submenu_anchor(Some(inside), VIEWPORT, true).horizontal,
            HorizontalAnchor::Left
        );
    }
}
