//! # Command Protocol
//!
//! Commands arrive as token vectors, either from [`tokenizer::tokenize`] or built in code
//! with [`Invocation`]. Both go through [`Host::dispatch`](crate::host::Host::dispatch),
//! which looks up the [`descriptor::CommandDescriptor`], checks arity, scope and
//! privileges, and only then builds the command and calls [`Command::execute`].
//!
//! A command is a flat, immutable unit: its [`Arguments`] plus three hooks. `execute`
//! runs on the owning thread and either finishes there or hands slow work to the
//! [`TaskScheduler`](crate::tasks::TaskScheduler). `on_success` and `on_failure` are
//! only ever called when that work is joined back on the owning thread.
//!
//! ## Components
//!
//! - [`tokenizer`] - raw line splitting with quoted groups
//! - [`privileges`] - privilege sets and requirements
//! - [`descriptor`] - per-command metadata
//! - [`registry`] - registration, lookup and the dispatch path
//! - [`target`] - player lookup by `#userid`, auth id, name or fragment; ban lengths
use std::sync::Arc;

use crate::host::{Host, Viewer};

pub mod descriptor;
pub mod privileges;
pub mod registry;
pub mod target;
pub mod tokenizer;

pub use descriptor::{CommandDescriptor, CommandScope, MaxArgs};
pub use privileges::{PrivilegeSet, Requirement};
pub use registry::{CommandError, CommandFactory, CommandRegistry, DispatchOutcome};

/// A command instance built from validated arguments.
///
/// `issuer`/`viewer` is `None` for the console. In `on_success`/`on_failure` it is also
/// `None` when the issuing player disconnected while the work was in flight; those
/// hooks must still do their bookkeeping and just skip the player-facing output.
pub trait Command: Send + Sync + 'static {
    fn execute(self: Arc<Self>, host: &mut Host, issuer: Option<&Viewer>);

    fn on_success(&self, _host: &mut Host, _viewer: Option<&Viewer>) {}

    fn on_failure(&self, _host: &mut Host, _viewer: Option<&Viewer>) {}
}

/// Token vector of a dispatched command, name at index 0.
///
/// Only constructed after the arity check, so every position below the descriptor's
/// minimum is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arguments(Vec<String>);

impl Arguments {
    pub(crate) fn new(tokens: Vec<String>) -> Self {
        Self(tokens)
    }

    pub fn name(&self) -> &str {
        self.arg(0)
    }

    /// Token at `index`, empty for optional positions that were not given.
    pub fn arg(&self, index: usize) -> &str {
        self.0.get(index).map(String::as_str).unwrap_or("")
    }

    /// Remaining tokens from `index`, space separated.
    pub fn rest(&self, index: usize) -> String {
        tokenizer::join_from(&self.0, index, ' ')
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn tokens(&self) -> &[String] {
        &self.0
    }
}

/// Builder for commands issued from code rather than typed text.
///
/// ```
/// use gsadmin::command::Invocation;
/// let tokens = Invocation::new("kick").arg("#7").arg("idle too long").into_tokens();
/// assert_eq!(tokens, vec!["kick", "#7", "idle too long"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    tokens: Vec<String>,
}

impl Invocation {
    pub fn new(name: &str) -> Self {
        Self {
            tokens: vec![name.to_string()],
        }
    }

    pub fn arg(mut self, value: impl Into<String>) -> Self {
        self.tokens.push(value.into());
        self
    }

    pub fn into_tokens(self) -> Vec<String> {
        self.tokens
    }
}
