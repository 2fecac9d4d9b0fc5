//! Menus, submenus and the pieces they share

pub mod context_menu;
pub mod navigation;
pub mod node;
pub mod position;
pub mod submenu;

pub use context_menu::{ContextMenu, ContextMenuProps, MenuStyle, MenuSurface, MouseLeave};
pub use navigation::{
    collect_selectable, next_enabled_index, render_children, NavigationState, Navigator,
    RenderHooks, Selectable,
};
pub use node::{
    ActivationHandle, ActivationRegistrar, ClickSource, ItemClick, ItemKey, MenuItem, MenuNode,
    RenderChild, RenderItem, RenderSubMenu, SubMenuBinding,
};
pub use position::{
    menu_position, rtl_menu_position, submenu_anchor, HorizontalAnchor, SubMenuAnchor,
    VerticalAnchor,
};
pub use submenu::{SubMenu, SubMenuProps, SubMenuSurface, CLOSE_TRANSITION};
