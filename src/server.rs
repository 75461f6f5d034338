//! Console server: the owning-thread tick loop around a [`Host`].
//!
//! The task running [`AdminServer::run`] is the owning thread. Every tick drains the
//! join queue; console lines are dispatched between ticks. Console syntax:
//!
//! ```text
//! <command> [args...]                 run as the console (no privilege checks)
//! @<userid> <command> [args...]       run as a connected player
//! /connect <name> <authid> [priv,...] add a simulated player
//! /disconnect <userid>                remove a player
//! /key <userid> <1-9|0>               press a menu key for a player
//! /quit                               shut down
//! ```
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use log::{debug, info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::runtime::Handle;
use tokio::time::MissedTickBehavior;

use crate::admin;
use crate::catalog;
use crate::command::tokenizer::tokenize;
use crate::command::{CommandRegistry, DispatchOutcome, PrivilegeSet};
use crate::config::Config;
use crate::console::{ConsoleEngine, ConsoleTransport};
use crate::host::{Collaborators, Host, UserId};
use crate::menu::{key_index_from_key, MenuSettings};
use crate::metrics;
use crate::roster::{AdminRoster, Lobby};
use crate::storage::SledStore;
use crate::tasks::{self, JoinQueue};

/// Longest wait for in-flight background work on shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);
const METRICS_INTERVAL: Duration = Duration::from_secs(60);

pub struct AdminServer {
    config: Config,
    host: Host,
    joins: JoinQueue,
    last_metrics: metrics::Snapshot,
}

impl AdminServer {
    /// Build a server with the sled store, the roster file and the console engine.
    pub async fn new(config: Config) -> Result<Self> {
        let store = SledStore::open(config.storage.records_path())
            .map_err(|e| anyhow!("Failed to open record store: {}", e))?;
        let roster = AdminRoster::load(&config.admins.file)?;
        let parts = Collaborators {
            players: Box::new(Lobby::new(roster)),
            engine: Box::new(ConsoleEngine::new(
                &config.server.maps_dir,
                config.server.start_map.clone(),
            )),
            transport: Box::new(ConsoleTransport),
            store: Arc::new(store),
            catalog: catalog::for_server(&config.server),
        };
        Self::from_parts(config, parts)
    }

    /// Build a server around caller-supplied collaborators. Must run inside a tokio runtime.
    pub fn from_parts(config: Config, parts: Collaborators) -> Result<Self> {
        let mut registry = CommandRegistry::new();
        admin::register_defaults(&mut registry)?;
        let runtime = Handle::try_current()
            .map_err(|e| anyhow!("AdminServer needs a tokio runtime: {}", e))?;
        let (scheduler, joins) = tasks::channel(runtime);
        let host = Host::new(registry, parts, scheduler, MenuSettings::from(&config.menu));
        Ok(Self {
            config,
            host,
            joins,
            last_metrics: metrics::Snapshot::default(),
        })
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut Host {
        &mut self.host
    }

    /// One owning-thread tick: run every join that has arrived. Returns how many ran.
    pub fn tick(&mut self) -> usize {
        self.joins.drain(&mut self.host)
    }

    pub fn outstanding(&self) -> usize {
        self.joins.outstanding()
    }

    /// Handle one console line. Returns false when the console asked to quit.
    pub fn handle_console_line(&mut self, line: &str) -> bool {
        let line = line.trim();
        if line.is_empty() {
            return true;
        }
        if let Some(rest) = line.strip_prefix('/') {
            return self.shell_command(rest);
        }
        if let Some(rest) = line.strip_prefix('@') {
            let (id, command) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            let Some(viewer) = parse_user_id(id).and_then(|t| self.host.players.resolve(t)) else {
                self.host.write_line(None, &format!("No player {}", id));
                return true;
            };
            let outcome = self.host.dispatch_line(command, Some(&viewer));
            self.report_unknown(outcome, command);
            return true;
        }
        let outcome = self.host.dispatch_line(line, None);
        self.report_unknown(outcome, line);
        true
    }

    fn report_unknown(&mut self, outcome: DispatchOutcome, line: &str) {
        if outcome == DispatchOutcome::Unknown {
            let name = line.split_whitespace().next().unwrap_or("");
            self.host
                .write_line(None, &format!("Unknown command: {} (try 'help')", name));
        }
    }

    fn shell_command(&mut self, rest: &str) -> bool {
        let tokens = tokenize(rest);
        let arg = |i: usize| tokens.get(i).map(String::as_str).unwrap_or("");
        match arg(0) {
            "quit" | "exit" => return false,
            "connect" if tokens.len() >= 3 => {
                let grants = PrivilegeSet::with(arg(3).split(','));
                let address = format!("127.0.0.1:{}", 27005 + self.host.players.players().len());
                match self.host.players.connect(arg(1), arg(2), &address, grants) {
                    Some(v) => self.host.write_line(
                        None,
                        &format!("{} connected as {} ({})", v.name, v.user_id, v.privileges),
                    ),
                    None => self.host.write_line(None, "This server cannot add players"),
                }
            }
            "disconnect" if tokens.len() == 2 => match parse_user_id(arg(1)) {
                Some(token) => match self.host.disconnect(token) {
                    Some(v) => self.host.write_line(None, &format!("{} disconnected", v.name)),
                    None => self.host.write_line(None, &format!("No player {}", arg(1))),
                },
                None => self.host.write_line(None, "Usage: /disconnect <userid>"),
            },
            "key" if tokens.len() == 3 => {
                let viewer = parse_user_id(arg(1)).and_then(|t| self.host.players.resolve(t));
                let key = arg(2).parse::<u8>().ok().and_then(key_index_from_key);
                match (viewer, key) {
                    (Some(v), Some(index)) => self.host.select_menu(&v, index),
                    (None, _) => self.host.write_line(None, &format!("No player {}", arg(1))),
                    (_, None) => self.host.write_line(None, "Keys are 1-9 and 0"),
                }
            }
            _ => self.host.write_line(
                None,
                "Shell commands: /connect <name> <authid> [priv,...], /disconnect <userid>, /key <userid> <1-9|0>, /quit",
            ),
        }
        true
    }

    fn log_metrics(&mut self) {
        let now = metrics::snapshot();
        if now != self.last_metrics {
            debug!(
                "metrics: dispatched={} usage_errors={} denials={} scheduled={} joined={} abandoned={} orphaned={} in_flight={}",
                now.commands_dispatched,
                now.usage_errors,
                now.privilege_denials,
                now.tasks_scheduled,
                now.joins_delivered,
                now.tasks_abandoned,
                now.joins_orphaned,
                now.in_flight()
            );
            self.last_metrics = now;
        }
    }

    /// Run until ctrl-c or `/quit`.
    pub async fn run(&mut self) -> Result<()> {
        info!(
            "'{}' started on map {} (tick {}ms)",
            self.config.server.name,
            self.host.engine.current_map(),
            self.config.server.tick_ms
        );
        let mut tick = tokio::time::interval(self.config.tick_interval());
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut stats = tokio::time::interval(METRICS_INTERVAL);
        stats.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdin_open = true;

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    self.tick();
                }
                line = lines.next_line(), if stdin_open => match line {
                    Ok(Some(line)) => {
                        if !self.handle_console_line(&line) {
                            info!("console requested shutdown");
                            break;
                        }
                    }
                    Ok(None) => {
                        info!("console input closed; running until interrupted");
                        stdin_open = false;
                    }
                    Err(e) => {
                        warn!("console read error: {}", e);
                        stdin_open = false;
                    }
                },
                _ = stats.tick() => self.log_metrics(),
                _ = tokio::signal::ctrl_c() => {
                    info!("interrupt received; shutting down");
                    break;
                }
            }
        }
        self.shutdown().await;
        Ok(())
    }

    /// Keep draining until background work is done or the grace period ends.
    pub async fn shutdown(&mut self) {
        let deadline = Instant::now() + SHUTDOWN_GRACE;
        self.tick();
        while self.outstanding() > 0 && Instant::now() < deadline {
            tokio::time::sleep(self.config.tick_interval()).await;
            self.tick();
        }
        let left = self.outstanding();
        if left > 0 {
            warn!("shutting down with {} background task(s) still running", left);
        }
        self.log_metrics();
        info!("'{}' stopped", self.config.server.name);
    }
}

/// Accepts `7` or `#7`.
fn parse_user_id(text: &str) -> Option<UserId> {
    text.trim_start_matches('#').parse().ok().map(UserId)
}
