//! Static metadata describing a command: name, arity, privileges, scope and help.
use super::privileges::Requirement;

/// Where a command may be issued from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandScope {
    /// Server console / system only.
    Console,
    /// Connected players only.
    Client,
    Both,
}

impl CommandScope {
    pub fn allows(self, from_console: bool) -> bool {
        match self {
            CommandScope::Both => true,
            CommandScope::Console => from_console,
            CommandScope::Client => !from_console,
        }
    }
}

/// Upper bound on the token count, command name included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxArgs {
    Bounded(usize),
    Unbounded,
}

/// Immutable description of a registered command.
///
/// Argument counts include the command name itself, so `kick <target>` has a
/// minimum of 2. Names are matched exactly after lowercasing.
#[derive(Debug, Clone)]
pub struct CommandDescriptor {
    pub name: &'static str,
    pub min_args: usize,
    pub max_args: MaxArgs,
    pub requirement: Requirement,
    pub scope: CommandScope,
    pub help: &'static str,
}

impl CommandDescriptor {
    pub fn new(name: &'static str, help: &'static str) -> Self {
        Self {
            name,
            min_args: 1,
            max_args: MaxArgs::Bounded(1),
            requirement: Requirement::None,
            scope: CommandScope::Both,
            help,
        }
    }

    pub fn min_args(mut self, min: usize) -> Self {
        self.min_args = min.max(1);
        self
    }

    pub fn max_args(mut self, max: usize) -> Self {
        self.max_args = MaxArgs::Bounded(max.max(1));
        self
    }

    pub fn unbounded(mut self) -> Self {
        self.max_args = MaxArgs::Unbounded;
        self
    }

    pub fn requires(mut self, requirement: Requirement) -> Self {
        self.requirement = requirement;
        self
    }

    pub fn scope(mut self, scope: CommandScope) -> Self {
        self.scope = scope;
        self
    }

    /// Whether `count` tokens (name included) fit this command's arity.
    pub fn accepts_count(&self, count: usize) -> bool {
        if count < self.min_args {
            return false;
        }
        match self.max_args {
            MaxArgs::Unbounded => true,
            MaxArgs::Bounded(max) => count <= max,
        }
    }

    /// One-line usage shown on arity errors.
    pub fn usage(&self) -> String {
        format!("Usage: {} {}", self.name, self.help.trim())
    }
}
