//! Command registration and the single dispatch path every command goes through.
use std::collections::BTreeMap;
use std::sync::Arc;

use log::{debug, info};
use thiserror::Error;

use super::descriptor::CommandDescriptor;
use super::{tokenizer, Arguments, Command, Invocation};
use crate::host::{Host, Viewer};
use crate::logutil::{sec_log, tokens_for_log};
use crate::metrics;

/// Builds a command instance from validated arguments.
pub type CommandFactory = fn(Arguments) -> Arc<dyn Command>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("command '{0}' is already registered")]
    DuplicateCommand(String),

    #[error("command names must be non-empty lowercase words without spaces (got '{0}')")]
    InvalidName(String),
}

/// What [`Host::dispatch`] did with a token vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Blank input.
    Empty,
    /// No such command; left for the caller to report.
    Unknown,
    /// Issued from the console for a client-only command, or the reverse.
    WrongScope,
    /// Token count outside the descriptor's bounds.
    Usage,
    /// Issuer lacks the required privileges.
    Denied,
    Executed,
}

pub struct RegisteredCommand {
    pub descriptor: CommandDescriptor,
    factory: CommandFactory,
}

/// Name → command table. Filled at startup, read on the owning thread.
#[derive(Default)]
pub struct CommandRegistry {
    commands: BTreeMap<&'static str, Arc<RegisteredCommand>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        descriptor: CommandDescriptor,
        factory: CommandFactory,
    ) -> Result<(), CommandError> {
        let name = descriptor.name;
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| !c.is_whitespace() && !c.is_ascii_uppercase());
        if !valid {
            return Err(CommandError::InvalidName(name.to_string()));
        }
        if self.commands.contains_key(name) {
            return Err(CommandError::DuplicateCommand(name.to_string()));
        }
        debug!("registered command '{}'", name);
        self.commands
            .insert(name, Arc::new(RegisteredCommand { descriptor, factory }));
        Ok(())
    }

    /// Exact lookup after lowercasing the typed name.
    pub fn lookup(&self, name: &str) -> Option<Arc<RegisteredCommand>> {
        self.commands.get(name.to_ascii_lowercase().as_str()).cloned()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &CommandDescriptor> {
        self.commands.values().map(|c| &c.descriptor)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Host {
    /// Validate and run a command. Called on the owning thread only.
    ///
    /// Order of checks: lookup, scope, arity, privileges. A console issuer (`None`)
    /// skips the privilege check. Every rejection writes exactly one line to the issuer.
    pub fn dispatch(&mut self, tokens: Vec<String>, issuer: Option<&Viewer>) -> DispatchOutcome {
        let Some(first) = tokens.first() else {
            return DispatchOutcome::Empty;
        };
        let Some(entry) = self.registry.lookup(first) else {
            debug!("unknown command dropped: {}", tokens_for_log(&tokens));
            return DispatchOutcome::Unknown;
        };
        let descriptor = &entry.descriptor;
        let who = issuer.map(|v| v.name.as_str()).unwrap_or("console");

        if !descriptor.scope.allows(issuer.is_none()) {
            metrics::inc_usage_errors();
            self.write_line(issuer, "This command is not available here");
            return DispatchOutcome::WrongScope;
        }

        if !descriptor.accepts_count(tokens.len()) {
            metrics::inc_usage_errors();
            debug!(
                "usage error from {}: {}",
                crate::logutil::escape_log(who),
                tokens_for_log(&tokens)
            );
            self.write_line(issuer, &descriptor.usage());
            return DispatchOutcome::Usage;
        }

        if let Some(viewer) = issuer {
            if let Err(denial) = descriptor.requirement.check(&viewer.privileges) {
                metrics::inc_privilege_denials();
                sec_log!(
                    "denied '{}' for {} ({} {}): {}",
                    descriptor.name,
                    crate::logutil::escape_log(&viewer.name),
                    viewer.auth_id,
                    viewer.user_id,
                    denial
                );
                self.write_line(issuer, &denial);
                return DispatchOutcome::Denied;
            }
        }

        metrics::inc_commands_dispatched();
        info!(
            "{} issued: {}",
            crate::logutil::escape_log(who),
            tokens_for_log(&tokens)
        );
        let mut tokens = tokens;
        tokens[0] = descriptor.name.to_string();
        let command = (entry.factory)(Arguments::new(tokens));
        command.execute(self, issuer);
        DispatchOutcome::Executed
    }

    /// Tokenize a typed line and dispatch it.
    pub fn dispatch_line(&mut self, line: &str, issuer: Option<&Viewer>) -> DispatchOutcome {
        self.dispatch(tokenizer::tokenize(line), issuer)
    }

    /// Run a command built in code. Same validation as typed input.
    pub fn invoke(&mut self, invocation: Invocation, issuer: Option<&Viewer>) -> DispatchOutcome {
        self.dispatch(invocation.into_tokens(), issuer)
    }
}
