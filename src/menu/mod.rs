//! Paged client menus.
//!
//! A client menu has ten key slots (`1`..`9`, `0`). A [`PagedMenu`] shows up to
//! [`MAX_ITEMS_PER_PAGE`] selectable items per page on slots 0..=7 and reserves slot
//! [`KEY_BACK`] for "Back" and slot [`KEY_NEXT`] for "Next". [`MenuStates`] keeps, per
//! viewer, which menu is open, the page, and the exact items the last render bound to
//! each slot. Only that last render is ever actionable.
use std::collections::HashMap;
use std::fmt;
use std::fmt::Write as _;
use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

use crate::config::MenuConfig;
use crate::host::{Host, UserId, Viewer};

pub const MAX_ITEMS_PER_PAGE: usize = 8;
pub const KEY_BACK: usize = 8;
pub const KEY_NEXT: usize = 9;

/// Runs on the owning thread when an item is chosen.
pub type MenuAction = Arc<dyn Fn(&mut Host, &Viewer) + Send + Sync>;

#[derive(Clone)]
pub struct MenuItem {
    text: String,
    enabled: bool,
    selectable: bool,
    action: Option<MenuAction>,
}

impl MenuItem {
    /// Selectable, enabled item without an action.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            enabled: true,
            selectable: true,
            action: None,
        }
    }

    /// Informational line. Takes no key slot.
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            selectable: false,
            ..Self::new(text)
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn on_select<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut Host, &Viewer) + Send + Sync + 'static,
    {
        self.action = Some(Arc::new(action));
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_selectable(&self) -> bool {
        self.selectable
    }

    pub fn action(&self) -> Option<MenuAction> {
        self.action.clone()
    }
}

impl fmt::Debug for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MenuItem")
            .field("text", &self.text)
            .field("enabled", &self.enabled)
            .field("selectable", &self.selectable)
            .field("has_action", &self.action.is_some())
            .finish()
    }
}

/// Produces the items of one page.
pub trait ItemSource: Send + Sync {
    /// Push the items at positions `window` onto `acc` and return the total item count.
    fn collect(&self, viewer: &Viewer, window: Range<usize>, acc: &mut Vec<MenuItem>) -> usize;
}

/// A fixed item list.
pub struct ListSource(pub Vec<MenuItem>);

impl ItemSource for ListSource {
    fn collect(&self, _viewer: &Viewer, window: Range<usize>, acc: &mut Vec<MenuItem>) -> usize {
        let end = window.end.min(self.0.len());
        if window.start < end {
            acc.extend(self.0[window.start..end].iter().cloned());
        }
        self.0.len()
    }
}

pub struct PagedMenu {
    title: String,
    items_per_page: usize,
    display_time: Option<Duration>,
    source: Box<dyn ItemSource>,
}

impl PagedMenu {
    pub fn new(title: impl Into<String>, source: impl ItemSource + 'static) -> Self {
        Self {
            title: title.into(),
            items_per_page: MAX_ITEMS_PER_PAGE,
            display_time: None,
            source: Box::new(source),
        }
    }

    pub fn from_items(title: impl Into<String>, items: Vec<MenuItem>) -> Self {
        Self::new(title, ListSource(items))
    }

    /// Clamped to `1..=MAX_ITEMS_PER_PAGE`.
    pub fn items_per_page(mut self, n: usize) -> Self {
        self.items_per_page = n.clamp(1, MAX_ITEMS_PER_PAGE);
        self
    }

    pub fn display_time(mut self, time: Option<Duration>) -> Self {
        self.display_time = time;
        self
    }

    pub fn with_settings(self, settings: &MenuSettings) -> Self {
        self.items_per_page(settings.items_per_page)
            .display_time(settings.display_time)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn page_size(&self) -> usize {
        self.items_per_page
    }

    /// Last page index for `total` items.
    pub fn max_page(&self, total: usize) -> usize {
        total / self.items_per_page
    }

    fn render(&self, viewer: &Viewer, page: usize) -> Rendered {
        let start = page.saturating_mul(self.items_per_page);
        let mut acc = Vec::with_capacity(self.items_per_page);
        let total = self
            .source
            .collect(viewer, start..start + self.items_per_page, &mut acc);
        acc.truncate(self.items_per_page);
        let max_page = self.max_page(total);

        let mut body = String::new();
        let _ = write!(body, "{} ({}/{})\n\n", self.title, page + 1, max_page + 1);

        let mut keys: u16 = 0;
        let mut slots = Vec::with_capacity(acc.len());
        for item in acc {
            if !item.selectable {
                let _ = writeln!(body, "{}", item.text);
                continue;
            }
            let slot = slots.len();
            if item.enabled {
                keys |= 1 << slot;
                let _ = writeln!(body, "{}. {}", slot + 1, item.text);
            } else {
                let _ = writeln!(body, "(x) {}. {}", slot + 1, item.text);
            }
            slots.push(item);
        }
        body.push_str("\n\n");

        if page > 0 {
            keys |= 1 << KEY_BACK;
            body.push_str("9. Back\n");
        }
        if page < max_page {
            keys |= 1 << KEY_NEXT;
            body.push_str("0. Next\n");
        }

        let display_time = match self.display_time {
            Some(d) => i32::try_from(d.as_secs()).unwrap_or(i32::MAX),
            None => -1,
        };
        Rendered {
            slots,
            frame: MenuFrame {
                keys,
                display_time,
                body,
            },
        }
    }
}

struct Rendered {
    slots: Vec<MenuItem>,
    frame: MenuFrame,
}

/// Page size and timeout applied to menus built by commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuSettings {
    pub items_per_page: usize,
    pub display_time: Option<Duration>,
}

impl Default for MenuSettings {
    fn default() -> Self {
        Self {
            items_per_page: MAX_ITEMS_PER_PAGE,
            display_time: None,
        }
    }
}

impl From<&MenuConfig> for MenuSettings {
    fn from(cfg: &MenuConfig) -> Self {
        Self {
            items_per_page: cfg.items_per_page.clamp(1, MAX_ITEMS_PER_PAGE),
            display_time: cfg.display_time(),
        }
    }
}

/// What the client transport receives: key bitmask, timeout in seconds (-1 = none) and text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuFrame {
    pub keys: u16,
    pub display_time: i32,
    pub body: String,
}

impl MenuFrame {
    pub fn has_key(&self, slot: usize) -> bool {
        slot < 16 && self.keys & (1 << slot) != 0
    }
}

/// Result of [`MenuStates::select`].
#[derive(Debug)]
pub enum Selection {
    /// No menu, key not offered, or nothing bound to it.
    Ignored,
    /// Page changed; send the new frame.
    Render(MenuFrame),
    /// The menu was closed and this item picked.
    Chosen(MenuItem),
}

struct MenuState {
    menu: Arc<PagedMenu>,
    page: usize,
    slots: Vec<MenuItem>,
    keys: u16,
}

/// Per-viewer menu state. Owning thread only.
#[derive(Default)]
pub struct MenuStates {
    states: HashMap<UserId, MenuState>,
}

impl MenuStates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render `menu` for `viewer`. Keeps the page when the same menu is already
    /// open, starts at page 0 otherwise.
    pub fn show(&mut self, viewer: &Viewer, menu: &Arc<PagedMenu>) -> MenuFrame {
        let page = match self.states.get(&viewer.user_id) {
            Some(state) if Arc::ptr_eq(&state.menu, menu) => state.page,
            _ => 0,
        };
        self.render_page(viewer, menu.clone(), page)
    }

    /// Handle slot `key_index` (0..=9).
    pub fn select(&mut self, viewer: &Viewer, key_index: usize) -> Selection {
        let Some(state) = self.states.get(&viewer.user_id) else {
            return Selection::Ignored;
        };
        if key_index >= 16 || state.keys & (1 << key_index) == 0 {
            return Selection::Ignored;
        }
        let menu = state.menu.clone();
        match key_index {
            KEY_BACK => {
                let page = state.page.saturating_sub(1);
                Selection::Render(self.render_page(viewer, menu, page))
            }
            KEY_NEXT => {
                let page = state.page + 1;
                Selection::Render(self.render_page(viewer, menu, page))
            }
            slot => match state.slots.get(slot).cloned() {
                Some(item) => {
                    self.states.remove(&viewer.user_id);
                    Selection::Chosen(item)
                }
                None => Selection::Ignored,
            },
        }
    }

    fn render_page(&mut self, viewer: &Viewer, menu: Arc<PagedMenu>, page: usize) -> MenuFrame {
        let Rendered { slots, frame } = menu.render(viewer, page);
        self.states.insert(
            viewer.user_id,
            MenuState {
                menu,
                page,
                slots,
                keys: frame.keys,
            },
        );
        frame
    }

    /// Close the viewer's menu. Returns whether one was open.
    pub fn close(&mut self, token: UserId) -> bool {
        self.states.remove(&token).is_some()
    }

    /// Drop state for a departed viewer.
    pub fn forget(&mut self, token: UserId) {
        self.states.remove(&token);
    }

    pub fn is_active(&self, token: UserId) -> bool {
        self.states.contains_key(&token)
    }

    pub fn page_of(&self, token: UserId) -> Option<usize> {
        self.states.get(&token).map(|s| s.page)
    }
}

/// Map a client key (`1`..`9`, `0`) to its slot index.
pub fn key_index_from_key(key: u8) -> Option<usize> {
    match key {
        0 => Some(KEY_NEXT),
        1..=9 => Some(key as usize - 1),
        _ => None,
    }
}
