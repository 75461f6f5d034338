use std::sync::Arc;

use log::warn;

use crate::command::privileges::UNBAN;
use crate::command::{Arguments, Command, CommandDescriptor, Requirement};
use crate::host::{issuer_token, Host, Viewer};
use crate::logutil::{escape_log, sec_log};

pub fn descriptor() -> CommandDescriptor {
    CommandDescriptor::new("unban", "<authid> - removes the ban on an auth id")
        .min_args(2)
        .max_args(2)
        .requires(Requirement::one(UNBAN))
}

pub fn build(args: Arguments) -> Arc<dyn Command> {
    Arc::new(Unban { args })
}

pub struct Unban {
    args: Arguments,
}

impl Unban {
    pub fn auth_id(&self) -> &str {
        self.args.arg(1)
    }
}

impl Command for Unban {
    fn execute(self: Arc<Self>, host: &mut Host, issuer: Option<&Viewer>) {
        let auth_id = self.auth_id().trim().to_string();
        let admin = issuer
            .map(|v| escape_log(&v.name))
            .unwrap_or_else(|| "console".into());
        let store = host.store.clone();
        host.tasks
            .schedule(self, issuer_token(issuer), "ban removal", move |task| {
                match store.remove_ban(&auth_id) {
                    Ok(removed) => task.join(move |host, viewer| {
                        if removed {
                            sec_log!("{} removed ban for {}", admin, escape_log(&auth_id));
                            host.reply(viewer, &format!("Removed ban for {}", auth_id));
                        } else {
                            host.reply(viewer, &format!("No ban found for {}", auth_id));
                        }
                    }),
                    Err(e) => {
                        warn!("failed to remove ban for {}: {}", escape_log(&auth_id), e);
                        task.fail();
                    }
                }
            });
    }

    fn on_failure(&self, host: &mut Host, viewer: Option<&Viewer>) {
        host.reply(viewer, &format!("Failed to remove ban for {}", self.auth_id()));
    }
}
