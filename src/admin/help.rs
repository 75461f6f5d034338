use std::sync::Arc;

use crate::command::{Arguments, Command, CommandDescriptor};
use crate::host::{Host, Viewer};

pub fn descriptor() -> CommandDescriptor {
    CommandDescriptor::new("help", "[command] - lists the commands you can use, or shows one command's usage")
        .max_args(2)
}

pub fn build(args: Arguments) -> Arc<dyn Command> {
    Arc::new(Help { args })
}

pub struct Help {
    args: Arguments,
}

impl Command for Help {
    fn execute(self: Arc<Self>, host: &mut Host, issuer: Option<&Viewer>) {
        let topic = self.args.arg(1);
        if !topic.is_empty() {
            let line = match host.registry.lookup(topic) {
                Some(entry) => entry.descriptor.usage(),
                None => format!("No such command: {}", topic),
            };
            host.write_line(issuer, &line);
            return;
        }

        let lines: Vec<String> = host
            .registry
            .descriptors()
            .filter(|d| d.scope.allows(issuer.is_none()))
            .filter(|d| match issuer {
                None => true,
                Some(v) => d.requirement.check(&v.privileges).is_ok(),
            })
            .map(|d| format!("{} {}", d.name, d.help.trim()))
            .collect();
        for line in lines {
            host.write_line(issuer, &line);
        }
    }
}
