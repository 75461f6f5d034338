use std::sync::Arc;

use log::warn;

use super::{admin_ref, protection};
use crate::command::privileges::{KICK, NO_KICK};
use crate::command::target::find_target;
use crate::command::{Arguments, Command, CommandDescriptor, Requirement};
use crate::host::{issuer_token, Host, Viewer};
use crate::logutil::{escape_log, sec_log};
use crate::storage::{KickRecord, PlayerRef};
use crate::validation::sanitize_reason;

pub fn descriptor() -> CommandDescriptor {
    CommandDescriptor::new(
        "kick",
        "<target> [reason] - kicks a target by #userid, partial auth id, nick or address with the reason",
    )
    .min_args(2)
    .unbounded()
    .requires(Requirement::one(KICK))
}

pub fn build(args: Arguments) -> Arc<dyn Command> {
    Arc::new(Kick { args })
}

/// Kicks on the owning thread right away; only the record is written in the background.
pub struct Kick {
    args: Arguments,
}

impl Kick {
    pub fn target(&self) -> &str {
        self.args.arg(1)
    }

    pub fn reason(&self) -> String {
        sanitize_reason(&self.args.rest(2))
    }
}

impl Command for Kick {
    fn execute(self: Arc<Self>, host: &mut Host, issuer: Option<&Viewer>) {
        let players = host.players.players();
        let target = match find_target(&players, self.target()) {
            Ok(t) => t.clone(),
            Err(e) => {
                host.write_line(issuer, &e.to_string());
                return;
            }
        };
        if let Some(line) = protection(&target, NO_KICK) {
            host.write_line(issuer, line);
            return;
        }

        let reason = self.reason();
        let record = KickRecord::new(PlayerRef::from(&target), admin_ref(issuer), reason.clone());
        host.players.kick(target.user_id, &reason);
        sec_log!(
            "{} kicked {} ({}): {}",
            issuer.map(|v| escape_log(&v.name)).unwrap_or_else(|| "console".into()),
            escape_log(&target.name),
            target.auth_id,
            escape_log(&reason)
        );

        let store = host.store.clone();
        host.tasks
            .schedule(self, issuer_token(issuer), "kick record", move |task| {
                match store.add_kick(record) {
                    Ok(()) => task.succeed(),
                    Err(e) => {
                        warn!("failed to store kick record: {}", e);
                        task.fail();
                    }
                }
            });
    }

    fn on_failure(&self, host: &mut Host, viewer: Option<&Viewer>) {
        host.reply(viewer, "Kick was not recorded");
    }
}
