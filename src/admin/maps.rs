use std::sync::Arc;

use log::warn;

use super::present_listing;
use crate::command::privileges::MAP;
use crate::command::{Arguments, Command, CommandDescriptor, Invocation, Requirement};
use crate::host::{issuer_token, Host, UserId, Viewer};
use crate::menu::MenuItem;

pub fn descriptor() -> CommandDescriptor {
    CommandDescriptor::new("maps", "- lists all available maps").requires(Requirement::one(MAP))
}

pub fn build(_args: Arguments) -> Arc<dyn Command> {
    Arc::new(ListMaps)
}

pub struct ListMaps;

/// Runs on the owning thread: the engine decides which listed files are loadable.
fn show(host: &mut Host, issued_by: Option<UserId>, viewer: Option<&Viewer>, found: Vec<String>) {
    let maps: Vec<String> = found
        .into_iter()
        .filter(|m| host.engine.is_map_valid(m))
        .collect();
    let current = host.engine.current_map();
    present_listing(
        host,
        issued_by,
        viewer,
        "Maps",
        || {
            maps.iter()
                .map(|name| {
                    let item = MenuItem::new(name.clone());
                    if *name == current {
                        return item.disabled();
                    }
                    let name = name.clone();
                    item.on_select(move |host, viewer| {
                        host.invoke(Invocation::new("map").arg(name.clone()), Some(viewer));
                    })
                })
                .collect()
        },
        || maps.clone(),
    );
}

impl Command for ListMaps {
    fn execute(self: Arc<Self>, host: &mut Host, issuer: Option<&Viewer>) {
        let token = issuer_token(issuer);
        let catalog = host.catalog.clone();
        host.tasks.schedule(self, token, "map listing", move |task| {
            match catalog.list_maps() {
                Ok(found) => task.join(move |host, viewer| show(host, token, viewer, found)),
                Err(e) => {
                    warn!("failed to read map directory: {}", e);
                    task.fail();
                }
            }
        });
    }

    fn on_failure(&self, host: &mut Host, viewer: Option<&Viewer>) {
        host.reply(viewer, "Failed to read map list");
    }
}
