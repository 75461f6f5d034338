//! # Built-in admin commands
//!
//! | command | arity | privilege | background work |
//! |---|---|---|---|
//! | `kick <target> [reason...]` | 2.. | `kick` | kick record |
//! | `ban <target> <duration> [reason...]` | 3.. | `ban` | ban record, then kick on success |
//! | `unban <authid>` | 2 | `unban` | ban removal |
//! | `bans` | 1 | `ban` + `unban` | ban listing |
//! | `who` | 1 | `status` | none |
//! | `reloadadmins` | 1 | any | roster file read |
//! | `map <name>` | 2 | `map` | map-change record |
//! | `maps` | 1 | `map` | map directory listing |
//! | `help [command]` | 1..2 | none | none |
//!
//! Listings go to a paged menu when a player asked and to console lines otherwise.
use std::sync::Arc;

use log::debug;

use crate::command::privileges::{IMMUNITY, NO_BAN, NO_KICK};
use crate::command::{CommandError, CommandRegistry};
use crate::host::{Host, UserId, Viewer};
use crate::menu::{MenuItem, PagedMenu};
use crate::storage::PlayerRef;

pub mod ban;
pub mod bans;
pub mod help;
pub mod kick;
pub mod map;
pub mod maps;
pub mod reload;
pub mod unban;
pub mod who;

/// Register every built-in command.
pub fn register_defaults(registry: &mut CommandRegistry) -> Result<(), CommandError> {
    registry.register(kick::descriptor(), kick::build)?;
    registry.register(ban::descriptor(), ban::build)?;
    registry.register(unban::descriptor(), unban::build)?;
    registry.register(bans::descriptor(), bans::build)?;
    registry.register(who::descriptor(), who::build)?;
    registry.register(reload::descriptor(), reload::build)?;
    registry.register(map::descriptor(), map::build)?;
    registry.register(maps::descriptor(), maps::build)?;
    registry.register(help::descriptor(), help::build)?;
    Ok(())
}

/// Line to report when `target` is protected from the action guarded by `specific`.
pub(crate) fn protection(target: &Viewer, specific: &str) -> Option<&'static str> {
    if target.privileges.has(IMMUNITY) {
        return Some("Target has general immunity");
    }
    if target.privileges.has(specific) {
        return match specific {
            NO_KICK => Some("Target has kick immunity"),
            NO_BAN => Some("Target has ban immunity"),
            _ => Some("Target is immune"),
        };
    }
    None
}

pub(crate) fn admin_ref(issuer: Option<&Viewer>) -> Option<PlayerRef> {
    issuer.map(PlayerRef::from)
}

/// Deliver a listing computed in the background.
///
/// `issued_by` is the token captured at execute time and `viewer` its re-resolution.
/// A player gets `items` as a menu, the console gets `lines`, and a player who left
/// in the meantime gets nothing.
pub(crate) fn present_listing(
    host: &mut Host,
    issued_by: Option<UserId>,
    viewer: Option<&Viewer>,
    title: &str,
    items: impl FnOnce() -> Vec<MenuItem>,
    lines: impl FnOnce() -> Vec<String>,
) {
    match (issued_by, viewer) {
        (_, Some(v)) => {
            let menu = Arc::new(PagedMenu::from_items(title, items()).with_settings(&host.menu_settings));
            host.show_menu(v, &menu);
        }
        (None, None) => {
            for line in lines() {
                host.write_line(None, &line);
            }
        }
        (Some(token), None) => {
            debug!("{} left before '{}' was ready; dropping it", token, title);
        }
    }
}
