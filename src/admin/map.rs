use std::sync::Arc;

use log::warn;

use super::admin_ref;
use crate::command::privileges::MAP;
use crate::command::{Arguments, Command, CommandDescriptor, Requirement};
use crate::host::{issuer_token, Host, Viewer};
use crate::logutil::{escape_log, sec_log};
use crate::storage::MapChangeRecord;
use crate::validation::validate_map_name;

pub fn descriptor() -> CommandDescriptor {
    CommandDescriptor::new("map", "<map> - changes the active map to <map>")
        .min_args(2)
        .max_args(2)
        .requires(Requirement::one(MAP))
}

pub fn build(args: Arguments) -> Arc<dyn Command> {
    Arc::new(ChangeMap { args })
}

pub struct ChangeMap {
    args: Arguments,
}

impl ChangeMap {
    pub fn map(&self) -> &str {
        self.args.arg(1)
    }
}

impl Command for ChangeMap {
    fn execute(self: Arc<Self>, host: &mut Host, issuer: Option<&Viewer>) {
        let map = self.map().to_string();
        if validate_map_name(&map).is_err() || !host.engine.is_map_valid(&map) {
            host.write_line(issuer, "invalid map provided");
            return;
        }

        let record = MapChangeRecord::new(admin_ref(issuer), host.engine.current_map(), map.clone());
        let store = host.store.clone();
        host.tasks
            .schedule(self, issuer_token(issuer), "map change record", move |task| {
                match store.add_map_change(record) {
                    Ok(()) => task.succeed(),
                    Err(e) => {
                        warn!("failed to store map change: {}", e);
                        task.fail();
                    }
                }
            });

        sec_log!(
            "{} changed map to {}",
            issuer.map(|v| escape_log(&v.name)).unwrap_or_else(|| "console".into()),
            map
        );
        host.engine.change_level(&map);
        host.write_line(None, &format!("Changing map to {}", map));
    }

    fn on_failure(&self, _host: &mut Host, _viewer: Option<&Viewer>) {
        warn!("map change to {} was not recorded", self.map());
    }
}
