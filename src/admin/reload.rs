use std::sync::Arc;

use log::{debug, info, warn};

use crate::command::{Arguments, Command, CommandDescriptor, Requirement};
use crate::host::{issuer_token, Host, Viewer};
use crate::roster::read_admins;

pub fn descriptor() -> CommandDescriptor {
    CommandDescriptor::new("reloadadmins", "- reloads the admins").requires(Requirement::AnyPrivilege)
}

pub fn build(_args: Arguments) -> Arc<dyn Command> {
    Arc::new(ReloadAdmins)
}

/// The roster file is read and parsed in the background; the entries are swapped in
/// when the join runs.
pub struct ReloadAdmins;

impl Command for ReloadAdmins {
    fn execute(self: Arc<Self>, host: &mut Host, issuer: Option<&Viewer>) {
        host.write_line(issuer, "Reloading all admin privileges");
        let file = host.players.roster_file();
        host.tasks
            .schedule(self, issuer_token(issuer), "admin roster", move |task| {
                let Some(path) = file else {
                    task.join(|_, _| debug!("no admin roster file; privileges unchanged"));
                    return;
                };
                match read_admins(&path) {
                    Ok(admins) => task.join(move |host, _viewer| {
                        let count = host.players.apply_roster(admins);
                        info!("admin roster reloaded: {} entries", count);
                    }),
                    Err(e) => {
                        warn!("admin roster reload failed: {:#}", e);
                        task.fail();
                    }
                }
            });
    }

    fn on_failure(&self, host: &mut Host, viewer: Option<&Viewer>) {
        host.reply(viewer, "Failed to reload admins");
    }
}
