use std::sync::Arc;

use log::warn;

use super::present_listing;
use crate::command::privileges::{BAN, UNBAN};
use crate::command::{Arguments, Command, CommandDescriptor, Invocation, Requirement};
use crate::host::{issuer_token, Host, UserId, Viewer};
use crate::menu::MenuItem;
use crate::storage::BanRecord;

pub fn descriptor() -> CommandDescriptor {
    CommandDescriptor::new("bans", "- lists all bans")
        .requires(Requirement::All(vec![BAN, UNBAN]))
}

pub fn build(_args: Arguments) -> Arc<dyn Command> {
    Arc::new(ListBans)
}

pub struct ListBans;

fn describe(ban: &BanRecord) -> String {
    let mut line = format!("{} {} ({})", ban.target.auth_id, ban.target.name, ban.length());
    if !ban.reason.is_empty() {
        line.push_str(" - ");
        line.push_str(&ban.reason);
    }
    line
}

fn show(host: &mut Host, issued_by: Option<UserId>, viewer: Option<&Viewer>, bans: Vec<BanRecord>) {
    if bans.is_empty() {
        host.reply(viewer, "No active bans");
        return;
    }
    present_listing(
        host,
        issued_by,
        viewer,
        "Bans",
        || {
            bans.iter()
                .map(|ban| {
                    let auth_id = ban.target.auth_id.clone();
                    MenuItem::new(describe(ban)).on_select(move |host, viewer| {
                        host.invoke(Invocation::new("unban").arg(auth_id.clone()), Some(viewer));
                    })
                })
                .collect()
        },
        || {
            let mut lines = vec![format!("Listing bans from 1 to {}", bans.len())];
            lines.extend(bans.iter().map(describe));
            lines
        },
    );
}

impl Command for ListBans {
    fn execute(self: Arc<Self>, host: &mut Host, issuer: Option<&Viewer>) {
        let token = issuer_token(issuer);
        let store = host.store.clone();
        host.tasks.schedule(self, token, "ban listing", move |task| {
            match store.list_bans() {
                Ok(bans) => task.join(move |host, viewer| show(host, token, viewer, bans)),
                Err(e) => {
                    warn!("failed to list bans: {}", e);
                    task.fail();
                }
            }
        });
    }

    fn on_failure(&self, host: &mut Host, viewer: Option<&Viewer>) {
        host.reply(viewer, "Failed to read ban list");
    }
}
