//! Phase engine: a single task that owns the executor's phase record.
//!
//! Start requests arrive over a command channel, turns come from a ticker that
//! only exists while a phase runs, and star updates from the feed task of the
//! current hit. Readers never touch the record directly; they see the latest
//! snapshot through a watch channel.

use std::sync::Arc;

use heist_core::{
    verify_crew_cut, Ack, CutDetails, LootDetails, PhaseKind, PhaseSnapshot, Role, StartAck,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::CrewConfig;
use crate::error::{CrewError, Result};
use crate::feed::{forward_severity, FeedRetry, SeverityFeed, SeverityUpdate};
use crate::state::{PhaseState, TurnOutcome};

const COMMAND_CAPACITY: usize = 16;
const SEVERITY_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy)]
enum Order {
    Distraction { turns_needed: u32 },
    Hit { turns_needed: u32, loot: u64 },
}

impl Order {
    fn kind(&self) -> PhaseKind {
        match self {
            Self::Distraction { .. } => PhaseKind::Distraction,
            Self::Hit { .. } => PhaseKind::Hit,
        }
    }

    fn turns_needed(&self) -> u32 {
        match self {
            Self::Distraction { turns_needed } | Self::Hit { turns_needed, .. } => *turns_needed,
        }
    }
}

struct Command {
    order: Order,
    reply: oneshot::Sender<Result<()>>,
}

/// Handle to a running phase engine. Cheap to clone.
#[derive(Clone)]
pub struct PhaseEngine {
    role: Role,
    commands: mpsc::Sender<Command>,
    status: watch::Receiver<PhaseSnapshot>,
    shutdown: CancellationToken,
}

impl PhaseEngine {
    /// Spawn the engine task on the current runtime.
    pub fn spawn(config: CrewConfig, feed: Arc<dyn SeverityFeed>) -> Result<Self> {
        config.validate()?;

        let role = config.role;
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (status_tx, status_rx) = watch::channel(PhaseSnapshot::default());
        let shutdown = CancellationToken::new();

        let actor = PhaseActor::new(config, feed, status_tx, commands_rx, shutdown.clone());
        tokio::spawn(actor.run());

        info!(role = %role, "Phase engine started");
        Ok(Self {
            role,
            commands: commands_tx,
            status: status_rx,
            shutdown,
        })
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub async fn start_distraction(&self, turns_needed: u32) -> Result<StartAck> {
        self.start(Order::Distraction { turns_needed }).await
    }

    pub async fn start_hit(&self, turns_needed: u32, loot: u64) -> Result<StartAck> {
        self.start(Order::Hit { turns_needed, loot }).await
    }

    pub fn check_status(&self) -> PhaseSnapshot {
        self.status.borrow().clone()
    }

    /// Loot recorded by the last successful hit, zero before that.
    pub fn retrieve_loot(&self) -> LootDetails {
        let snapshot = self.status.borrow();
        LootDetails {
            loot: snapshot.total_loot.saturating_sub(snapshot.extra_loot),
            extra_loot: snapshot.extra_loot,
        }
    }

    pub fn confirm_cut(&self, cut: &CutDetails) -> Ack {
        let ack = verify_crew_cut(cut);
        info!(
            role = %self.role,
            loot = cut.loot,
            extra_loot = cut.extra_loot,
            share = cut.share,
            ok = ack.ok,
            "Confirming cut"
        );
        ack
    }

    pub fn watch(&self) -> watch::Receiver<PhaseSnapshot> {
        self.status.clone()
    }

    /// Resolve once the current phase reaches success or failure.
    pub async fn wait_until_terminal(&self) -> Result<PhaseSnapshot> {
        let mut status = self.status.clone();
        let snapshot = status
            .wait_for(|snapshot| snapshot.status.is_terminal())
            .await
            .map_err(|_| CrewError::EngineStopped)?;
        Ok(snapshot.clone())
    }

    /// Stop the engine task and any feed it is listening to.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    async fn start(&self, order: Order) -> Result<StartAck> {
        let kind = order.kind();
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command { order, reply })
            .await
            .map_err(|_| CrewError::EngineStopped)?;
        response.await.map_err(|_| CrewError::EngineStopped)??;

        Ok(StartAck {
            phase: kind,
            accepted: true,
            message: format!("{} started by {}", kind.title(), self.role.display_name()),
        })
    }
}

struct Run {
    id: u64,
    order: Order,
    turn: u32,
    ticker: Interval,
    feed_cancel: Option<CancellationToken>,
}

enum Step {
    Command(Command),
    Tick,
    Severity(SeverityUpdate),
    Shutdown,
}

struct PhaseActor {
    config: CrewConfig,
    feed: Arc<dyn SeverityFeed>,
    state: PhaseState,
    rng: StdRng,
    status: watch::Sender<PhaseSnapshot>,
    commands: mpsc::Receiver<Command>,
    severity_tx: mpsc::Sender<SeverityUpdate>,
    severity_rx: mpsc::Receiver<SeverityUpdate>,
    run: Option<Run>,
    next_run_id: u64,
    shutdown: CancellationToken,
}

impl PhaseActor {
    fn new(
        config: CrewConfig,
        feed: Arc<dyn SeverityFeed>,
        status: watch::Sender<PhaseSnapshot>,
        commands: mpsc::Receiver<Command>,
        shutdown: CancellationToken,
    ) -> Self {
        let (severity_tx, severity_rx) = mpsc::channel(SEVERITY_CAPACITY);
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            config,
            feed,
            state: PhaseState::new(),
            rng,
            status,
            commands,
            severity_tx,
            severity_rx,
            run: None,
            next_run_id: 0,
            shutdown,
        }
    }

    async fn run(mut self) {
        loop {
            let step = tokio::select! {
                _ = self.shutdown.cancelled() => Step::Shutdown,
                command = self.commands.recv() => match command {
                    Some(command) => Step::Command(command),
                    None => Step::Shutdown,
                },
                Some(update) = self.severity_rx.recv() => Step::Severity(update),
                _ = next_tick(&mut self.run) => Step::Tick,
            };

            match step {
                Step::Command(command) => self.handle_command(command),
                Step::Tick => self.handle_tick(),
                Step::Severity(update) => self.handle_severity(update),
                Step::Shutdown => break,
            }
        }

        self.end_run();
        debug!(role = %self.config.role, "Phase engine stopped");
    }

    fn handle_command(&mut self, Command { order, reply }: Command) {
        let result = self.begin(order);
        self.publish();
        let _ = reply.send(result);
    }

    fn begin(&mut self, order: Order) -> Result<()> {
        let role = self.config.role;
        let kind = order.kind();
        self.state.begin(kind)?;
        info!(
            role = %role,
            phase = kind.as_str(),
            turns_needed = order.turns_needed(),
            "Phase started"
        );

        if order.turns_needed() == 0 {
            match order {
                Order::Distraction { .. } => self.state.complete_distraction(role, 0)?,
                Order::Hit { loot, .. } => self.state.complete_hit(role, 0, loot)?,
            }
            return Ok(());
        }

        self.next_run_id += 1;
        let id = self.next_run_id;

        let feed_cancel = match order {
            Order::Hit { .. } => {
                let cancel = self.shutdown.child_token();
                tokio::spawn(forward_severity(
                    self.feed.clone(),
                    id,
                    self.severity_tx.clone(),
                    cancel.clone(),
                    FeedRetry {
                        attempts: self.config.feed_retry_attempts,
                        initial_backoff: self.config.feed_initial_backoff,
                        max_backoff: self.config.feed_max_backoff,
                    },
                ));
                Some(cancel)
            }
            Order::Distraction { .. } => None,
        };

        let tick = self.config.tick;
        let mut ticker = interval_at(Instant::now() + tick, tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        self.run = Some(Run {
            id,
            order,
            turn: 0,
            ticker,
            feed_cancel,
        });
        Ok(())
    }

    fn handle_tick(&mut self) {
        let Some(run) = self.run.as_mut() else {
            return;
        };
        run.turn += 1;
        let role = self.config.role;
        let turn = run.turn;

        let outcome = match run.order {
            Order::Distraction { turns_needed } => {
                let failure_percent = self.config.distraction_failure_percent;
                let rng = &mut self.rng;
                self.state.distraction_turn(role, turn, turns_needed, || {
                    rng.gen_range(0..100) < failure_percent
                })
            }
            Order::Hit { turns_needed, loot } => {
                self.state.hit_turn(role, turn, turns_needed, loot)
            }
        };

        match outcome {
            Ok(TurnOutcome::Continue) => {}
            Ok(TurnOutcome::Finished) => self.end_run(),
            Err(e) => {
                warn!(role = %role, error = %e, "Phase turn rejected, abandoning run");
                self.end_run();
            }
        }
        self.publish();
    }

    fn handle_severity(&mut self, update: SeverityUpdate) {
        let current = self.run.as_ref().map(|run| run.id);
        if current != Some(update.run_id) {
            debug!(run_id = update.run_id, stars = update.stars, "Dropping stale star update");
            return;
        }
        if self.state.apply_severity(update.stars) {
            debug!(role = %self.config.role, stars = update.stars, "Stars updated");
            self.publish();
        }
    }

    fn end_run(&mut self) {
        if let Some(run) = self.run.take() {
            if let Some(cancel) = run.feed_cancel {
                cancel.cancel();
            }
        }
    }

    fn publish(&self) {
        let snapshot = self.state.snapshot();
        self.status.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}

async fn next_tick(run: &mut Option<Run>) {
    match run {
        Some(run) => {
            run.ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::BusSeverityFeed;
    use crate::state::HIT_FAILURE_MESSAGE;
    use events::{EventBus, StarsUpdate};
    use heist_core::{PhaseStatus, CREW_CUT_OK, CREW_CUT_WRONG};
    use std::time::Duration;

    fn engine_with(config: CrewConfig) -> (PhaseEngine, EventBus) {
        let bus = EventBus::new();
        let feed = Arc::new(BusSeverityFeed::new(bus.clone()));
        let engine = PhaseEngine::spawn(config, feed).unwrap();
        (engine, bus)
    }

    fn reliable(role: Role) -> CrewConfig {
        let mut config = CrewConfig::new(role).with_seed(1);
        config.distraction_failure_percent = 0;
        config
    }

    async fn wait_for_listener(bus: &EventBus) {
        while bus.subscriber_count() == 0 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_status_awaits_orders() {
        let (engine, _bus) = engine_with(reliable(Role::Trevor));
        let snapshot = engine.check_status();
        assert_eq!(snapshot.status, PhaseStatus::AwaitingOrders);
        assert_eq!(engine.retrieve_loot(), LootDetails::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_distraction_runs_for_its_turns() {
        let (engine, _bus) = engine_with(reliable(Role::Trevor));

        let start = Instant::now();
        let ack = engine.start_distraction(20).await.unwrap();
        assert!(ack.accepted);
        assert_eq!(ack.phase, PhaseKind::Distraction);
        assert_eq!(engine.check_status().status, PhaseStatus::InProgress);

        let snapshot = engine.wait_until_terminal().await.unwrap();
        assert_eq!(snapshot.status, PhaseStatus::Success);
        assert!(start.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_distraction_can_fail_at_midpoint() {
        let mut config = CrewConfig::new(Role::Franklin).with_seed(3);
        config.distraction_failure_percent = 100;
        let (engine, _bus) = engine_with(config);

        let start = Instant::now();
        engine.start_distraction(100).await.unwrap();
        let snapshot = engine.wait_until_terminal().await.unwrap();

        assert_eq!(snapshot.status, PhaseStatus::Failure);
        assert_eq!(snapshot.message, Role::Franklin.distraction_failure_message());
        assert!(start.elapsed() < Duration::from_millis(1_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_turns_completes_immediately() {
        let mut config = CrewConfig::new(Role::Trevor);
        config.distraction_failure_percent = 100;
        let (engine, _bus) = engine_with(config);

        engine.start_distraction(0).await.unwrap();
        assert_eq!(engine.check_status().status, PhaseStatus::Success);

        engine.start_hit(0, 42).await.unwrap();
        assert_eq!(engine.check_status().status, PhaseStatus::Success);
        assert_eq!(engine.retrieve_loot().total(), 42);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_rejected_while_running() {
        let (engine, _bus) = engine_with(reliable(Role::Trevor));
        engine.start_distraction(50).await.unwrap();

        let err = engine.start_hit(10, 1).await.unwrap_err();
        assert!(matches!(
            err,
            CrewError::PhaseBusy {
                requested: PhaseKind::Hit
            }
        ));

        let snapshot = engine.wait_until_terminal().await.unwrap();
        assert_eq!(snapshot.status, PhaseStatus::Success);

        assert!(engine.start_hit(1, 10).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hit_success_records_loot() {
        let (engine, bus) = engine_with(reliable(Role::Franklin));

        engine.start_hit(30, 1_500_000).await.unwrap();
        wait_for_listener(&bus).await;
        bus.publish(StarsUpdate::new(3));

        let snapshot = engine.wait_until_terminal().await.unwrap();
        assert_eq!(snapshot.status, PhaseStatus::Success);
        assert_eq!(snapshot.current_severity, 0);
        assert_eq!(snapshot.total_loot, 1_500_000);
        assert_eq!(
            engine.retrieve_loot(),
            LootDetails {
                loot: 1_500_000,
                extra_loot: 0
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_hit_fails_at_seven_stars() {
        let (engine, bus) = engine_with(reliable(Role::Trevor));

        engine.start_hit(10_000, 500).await.unwrap();
        wait_for_listener(&bus).await;

        bus.publish(StarsUpdate::new(5));
        let mut status = engine.watch();
        status.wait_for(|s| s.ability_active).await.unwrap();

        bus.publish(StarsUpdate::new(7));
        let snapshot = engine.wait_until_terminal().await.unwrap();
        assert_eq!(snapshot.status, PhaseStatus::Failure);
        assert_eq!(snapshot.message, HIT_FAILURE_MESSAGE);
        assert_eq!(engine.retrieve_loot().total(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_feed_released_after_hit() {
        let (engine, bus) = engine_with(reliable(Role::Trevor));

        engine.start_hit(5, 10).await.unwrap();
        wait_for_listener(&bus).await;
        engine.wait_until_terminal().await.unwrap();

        while bus.subscriber_count() > 0 {
            tokio::task::yield_now().await;
        }
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_hit_resets_loot() {
        let (engine, bus) = engine_with(reliable(Role::Trevor));
        engine.start_hit(0, 900).await.unwrap();
        assert_eq!(engine.retrieve_loot().total(), 900);

        engine.start_hit(10_000, 100).await.unwrap();
        assert_eq!(engine.retrieve_loot().total(), 0);

        wait_for_listener(&bus).await;
        bus.publish(StarsUpdate::new(9));
        let snapshot = engine.wait_until_terminal().await.unwrap();
        assert_eq!(snapshot.status, PhaseStatus::Failure);
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirm_cut() {
        let (engine, _bus) = engine_with(reliable(Role::Franklin));

        let ack = engine.confirm_cut(&CutDetails::new(1_000_001, 0, 250_000));
        assert!(ack.ok);
        assert_eq!(ack.message, CREW_CUT_OK);

        let ack = engine.confirm_cut(&CutDetails::new(1_000_001, 0, 250_001));
        assert!(!ack.ok);
        assert_eq!(ack.message, CREW_CUT_WRONG);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stars_from_previous_hit_are_dropped() {
        let bus = EventBus::new();
        let (status_tx, status) = watch::channel(PhaseSnapshot::default());
        let (_commands_tx, commands_rx) = mpsc::channel(1);
        let mut actor = PhaseActor::new(
            reliable(Role::Franklin),
            Arc::new(BusSeverityFeed::new(bus)),
            status_tx,
            commands_rx,
            CancellationToken::new(),
        );

        actor.begin(Order::Hit { turns_needed: 10_000, loot: 1 }).unwrap();
        let first_run = actor.run.as_ref().unwrap().id;
        actor.state.complete_hit(Role::Franklin, 1, 1).unwrap();
        actor.end_run();

        actor.begin(Order::Hit { turns_needed: 10_000, loot: 2 }).unwrap();
        let second_run = actor.run.as_ref().unwrap().id;
        assert_ne!(first_run, second_run);

        actor.handle_severity(SeverityUpdate { run_id: first_run, stars: 9 });
        assert_eq!(actor.state.current_severity(), 0);
        assert_eq!(actor.state.status(), PhaseStatus::InProgress);

        actor.handle_severity(SeverityUpdate { run_id: second_run, stars: 3 });
        assert_eq!(actor.state.current_severity(), 3);
        assert_eq!(status.borrow().current_severity, 3);

        actor.end_run();
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_engine() {
        let (engine, _bus) = engine_with(reliable(Role::Trevor));
        engine.shutdown();

        loop {
            match engine.start_distraction(1).await {
                Err(CrewError::EngineStopped) => break,
                _ => tokio::task::yield_now().await,
            }
        }
    }
}
