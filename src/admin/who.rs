use std::sync::Arc;

use crate::command::privileges::STATUS;
use crate::command::{Arguments, Command, CommandDescriptor, Invocation, Requirement};
use crate::host::{Host, Viewer};
use crate::menu::{MenuItem, PagedMenu};
use crate::table::{Align, TextTable};

pub fn descriptor() -> CommandDescriptor {
    CommandDescriptor::new("who", "- shows the active player list with the according privileges")
        .requires(Requirement::one(STATUS))
}

pub fn build(_args: Arguments) -> Arc<dyn Command> {
    Arc::new(Who)
}

pub struct Who;

/// One row per connected player: slot, nick, auth id, `#userid`, privileges.
pub fn player_table(players: &[Viewer]) -> TextTable {
    let mut table = TextTable::new(["#", "nick", "authid", "userid", "privileges"])
        .align(0, Align::Right)
        .align(3, Align::Right);
    for p in players {
        table.push_row([
            p.index.to_string(),
            p.name.clone(),
            p.auth_id.clone(),
            p.user_id.to_string(),
            p.privileges.summary(),
        ]);
    }
    table
}

impl Command for Who {
    fn execute(self: Arc<Self>, host: &mut Host, issuer: Option<&Viewer>) {
        let players = host.players.players();
        let table = player_table(&players);

        let Some(viewer) = issuer else {
            for line in table.render() {
                host.write_line(None, &line);
            }
            return;
        };

        let items = table
            .row_lines()
            .into_iter()
            .zip(players.iter())
            .map(|(line, p)| {
                let target = p.user_id.to_string();
                MenuItem::new(line).on_select(move |host, viewer| {
                    host.invoke(Invocation::new("kick").arg(target.clone()), Some(viewer));
                })
            })
            .collect();
        let menu = Arc::new(
            PagedMenu::from_items(table.header_line(), items).with_settings(&host.menu_settings),
        );
        host.show_menu(viewer, &menu);
    }
}
