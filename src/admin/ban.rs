use std::sync::Arc;

use log::{debug, warn};

use super::{admin_ref, protection};
use crate::command::privileges::{BAN, NO_BAN};
use crate::command::target::{find_target, parse_duration, BanLength};
use crate::command::{Arguments, Command, CommandDescriptor, Requirement};
use crate::host::{issuer_token, Host, UserId, Viewer};
use crate::logutil::{escape_log, sec_log};
use crate::storage::{BanRecord, PlayerRef};
use crate::validation::sanitize_reason;

pub fn descriptor() -> CommandDescriptor {
    CommandDescriptor::new(
        "ban",
        "<target> <duration> [reason] - bans a target for n minutes (or nm, nh, nd; 0 = permanent) with an optional reason",
    )
    .min_args(3)
    .unbounded()
    .requires(Requirement::one(BAN))
}

pub fn build(args: Arguments) -> Arc<dyn Command> {
    Arc::new(Ban { args, target: None })
}

/// `target` is filled in once the ban has been resolved; that instance is the one
/// whose hooks run after the record is stored.
pub struct Ban {
    args: Arguments,
    target: Option<UserId>,
}

impl Ban {
    pub fn target_spec(&self) -> &str {
        self.args.arg(1)
    }

    pub fn duration(&self) -> &str {
        self.args.arg(2)
    }

    pub fn reason(&self) -> String {
        sanitize_reason(&self.args.rest(3))
    }
}

impl Command for Ban {
    fn execute(self: Arc<Self>, host: &mut Host, issuer: Option<&Viewer>) {
        let players = host.players.players();
        let target = match find_target(&players, self.target_spec()) {
            Ok(t) => t.clone(),
            Err(e) => {
                host.write_line(issuer, &e.to_string());
                return;
            }
        };
        if let Some(line) = protection(&target, NO_BAN) {
            host.write_line(issuer, line);
            return;
        }
        let length: BanLength = match parse_duration(self.duration()) {
            Ok(l) => l,
            Err(e) => {
                host.write_line(issuer, &e.to_string());
                return;
            }
        };

        let reason = self.reason();
        let record = BanRecord::new(PlayerRef::from(&target), admin_ref(issuer), length, reason.clone());
        sec_log!(
            "{} banned {} ({}) for {}: {}",
            issuer.map(|v| escape_log(&v.name)).unwrap_or_else(|| "console".into()),
            escape_log(&target.name),
            target.auth_id,
            length,
            escape_log(&reason)
        );

        let resolved = Arc::new(Ban {
            args: self.args.clone(),
            target: Some(target.user_id),
        });
        let store = host.store.clone();
        host.tasks
            .schedule(resolved, issuer_token(issuer), "ban record", move |task| {
                match store.add_ban(record) {
                    Ok(()) => task.succeed(),
                    Err(e) => {
                        warn!("failed to store ban: {}", e);
                        task.fail();
                    }
                }
            });
    }

    fn on_success(&self, host: &mut Host, _viewer: Option<&Viewer>) {
        let Some(target) = self.target else {
            return;
        };
        if host.players.resolve(target).is_none() {
            debug!("banned player {} already gone", target);
            return;
        }
        host.players.kick(target, &self.reason());
    }

    fn on_failure(&self, host: &mut Host, viewer: Option<&Viewer>) {
        host.reply(viewer, "Failed to store ban");
    }
}
