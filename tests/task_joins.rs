mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use common::{registry, Harness};
use gsadmin::command::privileges::{BAN, KICK};
use gsadmin::command::{Arguments, Command, CommandDescriptor};
use gsadmin::host::{issuer_token, Host, Viewer};
use gsadmin::menu::MenuSettings;

#[tokio::test(flavor = "multi_thread")]
async fn store_runs_off_thread_and_joins_run_on_the_owning_thread() {
    let mut h = Harness::new();
    let admin = h.connect("admin", "STEAM_0:0:1", &[BAN]);
    h.connect("Alice", "STEAM_0:1:42", &[]);
    h.store.set_failing(true);

    h.as_player(&admin, "ban Alice 10 test");
    h.settle().await;

    let owning = thread::current().id();
    let store_threads = h.store.threads.lock().unwrap().clone();
    assert_eq!(store_threads.len(), 1);
    assert_ne!(store_threads[0], owning);

    assert_eq!(h.out.lines_to(Some(admin.user_id)), vec!["Failed to store ban"]);
    assert!(h.out.threads().iter().all(|t| *t == owning));
}

#[tokio::test(flavor = "multi_thread")]
async fn disconnect_before_drain_still_persists_the_ban() {
    let mut h = Harness::new();
    let admin = h.connect("admin", "STEAM_0:0:1", &[BAN]);
    let alice = h.connect("Alice", "STEAM_0:1:42", &[]);

    h.as_player(&admin, "ban Alice 30 spam");
    h.host.disconnect(admin.user_id);
    h.settle().await;

    let bans = h.store.bans();
    assert_eq!(bans.len(), 1);
    assert_eq!(bans[0].admin.as_ref().map(|a| a.name.as_str()), Some("admin"));
    // on_success still runs with no viewer and kicks the target.
    assert!(!h.is_connected(alice.user_id));
    assert!(h.out.lines_to(Some(admin.user_id)).is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn failure_for_departed_issuer_is_only_logged() {
    let mut h = Harness::new();
    let admin = h.connect("admin", "STEAM_0:0:1", &[KICK]);
    h.connect("bob", "STEAM_0:0:2", &[]);
    h.store.set_failing(true);

    h.as_player(&admin, "kick bob");
    h.host.disconnect(admin.user_id);
    h.settle().await;

    assert_eq!(h.store.calls(), 1);
    assert!(h.out.all().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn console_failures_still_reach_the_console() {
    let mut h = Harness::new();
    h.connect("bob", "STEAM_0:0:2", &[]);
    h.store.set_failing(true);

    h.console("kick bob");
    h.settle().await;

    assert_eq!(h.out.lines_to(None), vec!["Kick was not recorded"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn banned_target_who_left_is_not_kicked_again() {
    let mut h = Harness::new();
    let alice = h.connect("Alice", "STEAM_0:1:42", &[]);

    h.console("ban Alice 0");
    h.host.disconnect(alice.user_id);
    let bob = h.connect("bob", "STEAM_0:0:2", &[]);
    h.settle().await;

    assert_eq!(h.store.bans().len(), 1);
    assert!(h.is_connected(bob.user_id));
}

#[tokio::test(flavor = "multi_thread")]
async fn every_scheduled_task_joins_exactly_once() {
    let mut h = Harness::new();
    for i in 0..5 {
        h.connect(&format!("p{}", i), &format!("STEAM_0:0:10{}", i), &[]);
    }
    for i in 0..5 {
        h.console(&format!("ban p{} {} r{}", i, i + 1, i));
    }
    let ran = h.settle().await;
    assert_eq!(ran, 5);
    assert_eq!(h.store.bans().len(), 5);
    assert!(h.host.players.players().is_empty());
    assert_eq!(h.joins.drain(&mut h.host), 0);
}

/// Work that dies without producing an outcome.
struct Crashes;

impl Command for Crashes {
    fn execute(self: Arc<Self>, host: &mut Host, issuer: Option<&Viewer>) {
        host.tasks
            .schedule(self, issuer_token(issuer), "crash", |_task| panic!("worker blew up"));
    }

    fn on_failure(&self, host: &mut Host, viewer: Option<&Viewer>) {
        host.write_line(viewer, "crash reported");
    }
}

fn build_crashes(_args: Arguments) -> Arc<dyn Command> {
    Arc::new(Crashes)
}

/// Work that completes with data computed off-thread.
struct Echo;

impl Command for Echo {
    fn execute(self: Arc<Self>, host: &mut Host, issuer: Option<&Viewer>) {
        host.tasks.schedule(self, issuer_token(issuer), "echo", |task| {
            let worker = format!("{:?}", thread::current().id());
            task.join(move |host, viewer| {
                host.write_line(viewer, &worker);
            });
        });
    }
}

fn build_echo(_args: Arguments) -> Arc<dyn Command> {
    Arc::new(Echo)
}

/// Completions handed back so far by `turn` work.
static TURNS_TAKEN: AtomicUsize = AtomicUsize::new(0);

/// Holds its worker until `slot` other `turn` tasks have joined, then joins its label.
struct Turn {
    slot: usize,
    label: String,
}

impl Command for Turn {
    fn execute(self: Arc<Self>, host: &mut Host, issuer: Option<&Viewer>) {
        let slot = self.slot;
        let label = self.label.clone();
        host.tasks.schedule(self, issuer_token(issuer), "turn", move |task| {
            let deadline = Instant::now() + Duration::from_secs(5);
            while TURNS_TAKEN.load(Ordering::SeqCst) != slot {
                if Instant::now() > deadline {
                    return;
                }
                thread::sleep(Duration::from_millis(1));
            }
            task.join(move |host, viewer| host.write_line(viewer, &label));
            TURNS_TAKEN.fetch_add(1, Ordering::SeqCst);
        });
    }
}

fn build_turn(args: Arguments) -> Arc<dyn Command> {
    Arc::new(Turn {
        slot: args.arg(1).parse().unwrap_or(usize::MAX),
        label: args.arg(2).to_string(),
    })
}

fn harness_with_test_commands() -> Harness {
    let mut registry = registry();
    registry
        .register(CommandDescriptor::new("crash", "- panics in the background"), build_crashes)
        .unwrap();
    registry
        .register(CommandDescriptor::new("echo", "- reports the worker thread"), build_echo)
        .unwrap();
    registry
        .register(
            CommandDescriptor::new("turn", "<slot> <label> - joins <label> once <slot> turns are done")
                .min_args(3)
                .max_args(3),
            build_turn,
        )
        .unwrap();
    Harness::build(registry, common::default_maps(), MenuSettings::default())
}

#[tokio::test(flavor = "multi_thread")]
async fn panicking_work_still_joins_failure() {
    let mut h = harness_with_test_commands();
    let p = h.connect("p", "STEAM_0:0:1", &[]);

    h.as_player(&p, "crash");
    h.settle().await;

    assert_eq!(h.out.lines_to(Some(p.user_id)), vec!["crash reported"]);
    assert_eq!(h.host.tasks.outstanding(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn handler_joins_carry_worker_results_back() {
    let mut h = harness_with_test_commands();

    h.console("echo");
    h.settle().await;

    let lines = h.out.lines_to(None);
    assert_eq!(lines.len(), 1);
    assert_ne!(lines[0], format!("{:?}", thread::current().id()));
    assert_eq!(h.out.threads(), vec![thread::current().id()]);
}

#[tokio::test(flavor = "multi_thread")]
async fn joins_drain_in_the_order_they_were_queued() {
    let mut h = harness_with_test_commands();

    // j0 is scheduled first but queued last: slots run 7, 6, .., 0.
    for i in 0..8 {
        h.console(&format!("turn {} j{}", 7 - i, i));
    }
    assert_eq!(h.settle().await, 8);

    let queued: Vec<String> = (0..8).rev().map(|i| format!("j{}", i)).collect();
    assert_eq!(h.out.lines_to(None), queued);
}
