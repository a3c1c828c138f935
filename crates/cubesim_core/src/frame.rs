//! # Frame Coordinator
//!
//! One call per engine frame. The tick is split in two phases:
//!
//! ```text
//! tick():
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │ LOCKED (graph lock held)                                           │
//! │  1. acquire the graph lock                                          │
//! │  2. latch: live slots -> snapshot slots, collect stale nodes        │
//! │  3. drain the event queue, deliver in order to the engine; repeat   │
//! │     while the engine's own callbacks queued more                    │
//! │  4. if anything latched, deliver one neighborhood-changed           │
//! │  5. advance the frame, release the lock                             │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │ UNLOCKED                                                            │
//! │  6. run each stale node's hook exactly once                         │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Hooks run after the lock is gone because they may need something owned by
//! a thread that is, right now, blocked on the graph lock (a UI-owned
//! drawing surface, say). Calling them while locked could deadlock.

use std::sync::Arc;
use std::time::Instant;

use crate::engine::{Engine, NodeHooks};
use crate::events::collapse_transient;
use crate::graph::NeighborGraph;
use crate::node::NodeId;

/// What one tick did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Frame number this tick completed (first tick is 0).
    pub frame: u64,
    /// Events handed to the engine.
    pub delivered: usize,
    /// Events dropped as transient links.
    pub collapsed: usize,
    /// Events an earlier tick should have drained.
    pub missed_events: usize,
    /// Nodes whose hooks ran, in registry order.
    pub stale_nodes: Vec<NodeId>,
    /// Whether the aggregate neighborhood-changed signal was sent.
    pub neighborhood_changed: bool,
}

/// Totals across ticks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Ticks run.
    pub ticks: u64,
    /// Events delivered.
    pub delivered: u64,
    /// Events collapsed.
    pub collapsed: u64,
    /// Missed events seen.
    pub missed_events: u64,
    /// Hook invocations.
    pub hooks_run: u64,
    /// Ticks that sent neighborhood-changed.
    pub neighborhood_changes: u64,
    /// Longest locked phase, in microseconds.
    pub max_locked_us: u64,
}

impl FrameStats {
    fn record(&mut self, report: &FrameReport, locked_us: u64) {
        self.ticks += 1;
        self.delivered += report.delivered as u64;
        self.collapsed += report.collapsed as u64;
        self.missed_events += report.missed_events as u64;
        self.hooks_run += report.stale_nodes.len() as u64;
        self.neighborhood_changes += u64::from(report.neighborhood_changed);
        self.max_locked_us = self.max_locked_us.max(locked_us);
    }
}

/// Runs frame ticks against a shared graph.
#[derive(Debug)]
pub struct FrameCoordinator {
    graph: Arc<NeighborGraph>,
    stats: FrameStats,
}

impl FrameCoordinator {
    /// Drain passes per tick. Events the engine keeps queueing past this
    /// are left for the next tick and show up there as missed.
    pub const MAX_DRAIN_ROUNDS: usize = 16;

    /// Creates a coordinator for `graph`.
    #[must_use]
    pub fn new(graph: Arc<NeighborGraph>) -> Self {
        Self {
            graph,
            stats: FrameStats::default(),
        }
    }

    /// The graph being ticked.
    #[inline]
    #[must_use]
    pub fn graph(&self) -> &Arc<NeighborGraph> {
        &self.graph
    }

    /// Totals so far.
    #[inline]
    #[must_use]
    pub const fn stats(&self) -> &FrameStats {
        &self.stats
    }

    /// Runs one frame tick. Blocks the caller for its whole duration.
    pub fn tick<E, H>(&mut self, engine: &mut E, hooks: &H) -> FrameReport
    where
        E: Engine + ?Sized,
        H: NodeHooks + ?Sized,
    {
        let start = Instant::now();
        let report = self.locked_phase(engine);
        let locked_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);

        for &node in &report.stale_nodes {
            hooks.neighbors_changed(node);
        }

        tracing::debug!(
            frame = report.frame,
            delivered = report.delivered,
            collapsed = report.collapsed,
            hooks = report.stale_nodes.len(),
            locked_us,
            "frame tick"
        );
        self.stats.record(&report, locked_us);
        report
    }

    fn locked_phase<E: Engine + ?Sized>(&self, engine: &mut E) -> FrameReport {
        let config = *self.graph.config();
        let guard = self.graph.state.lock();

        // The RefCell borrow must end before any engine callback: the engine
        // may re-enter the graph from this thread.
        let (frame, missed_events, stale_nodes) = {
            let mut state = guard.borrow_mut();
            let frame = state.frame;

            let missed_events = state.queue.older_than(frame);
            if missed_events > 0 && config.warn_on_missed_tick {
                tracing::warn!(
                    frame,
                    missed_events,
                    "event queue was not drained by an earlier tick"
                );
            }

            let mut stale_nodes = Vec::new();
            for node in &mut state.nodes {
                if node.latch() {
                    stale_nodes.push(node.id());
                }
            }
            if !stale_nodes.is_empty() {
                state.neighborhood_stale = true;
            }

            (frame, missed_events, stale_nodes)
        };

        // Events the engine queues from its own callbacks join this drain.
        let mut delivered = 0;
        let mut collapsed = 0;
        for round in 0..Self::MAX_DRAIN_ROUNDS {
            let mut events = guard.borrow_mut().queue.drain();
            if events.is_empty() {
                break;
            }
            if round > 0 {
                tracing::trace!(
                    frame,
                    round,
                    events = events.len(),
                    "draining events queued during delivery"
                );
            }
            if config.collapse_transient_links {
                collapsed += collapse_transient(&mut events);
            }
            for event in &events {
                event.deliver(engine);
            }
            delivered += events.len();
        }

        let leftover = guard.borrow().queue.len();
        if leftover > 0 {
            tracing::warn!(
                frame,
                leftover,
                rounds = Self::MAX_DRAIN_ROUNDS,
                "engine kept queueing events during delivery, rest waits for the next tick"
            );
        }

        let neighborhood_changed = std::mem::take(&mut guard.borrow_mut().neighborhood_stale);
        if neighborhood_changed {
            engine.on_neighborhood_changed();
        }

        {
            let mut state = guard.borrow_mut();
            for node in &stale_nodes {
                state.nodes[node.index()].take_stale();
            }
            state.frame = frame + 1;
        }
        drop(guard);

        FrameReport {
            frame,
            delivered,
            collapsed,
            missed_events,
            stale_nodes,
            neighborhood_changed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GraphConfig;
    use crate::engine::{Delivered, NullSurface, RecordingEngine};
    use crate::side::Side;
    use cubesim_shared::CubeId;
    use std::cell::{Cell, RefCell};

    fn setup(capacity: usize, config: GraphConfig) -> (FrameCoordinator, Vec<NodeId>) {
        let graph = Arc::new(NeighborGraph::new(capacity, config).unwrap());
        let ids = (0..capacity)
            .map(|_| graph.register_node(Arc::new(NullSurface)).unwrap())
            .collect();
        (FrameCoordinator::new(graph), ids)
    }

    #[test]
    fn test_empty_tick_is_quiet() {
        let (mut frames, _) = setup(2, GraphConfig::default());
        let mut engine = RecordingEngine::new();
        let hooks_run = Cell::new(0);
        let report = frames.tick(&mut engine, &|_: NodeId| hooks_run.set(hooks_run.get() + 1));

        assert_eq!(hooks_run.get(), 0);
        assert_eq!(report.frame, 0);
        assert!(!report.neighborhood_changed);
        assert!(engine.delivered.is_empty());
        assert_eq!(frames.graph().frame(), 1);
    }

    #[test]
    fn test_stale_flag_is_cleared_before_hooks_run() {
        let (mut frames, n) = setup(2, GraphConfig::default());
        let graph = Arc::clone(frames.graph());
        graph.set_neighbor(n[0], Side::Bottom, Some(n[1])).unwrap();

        let seen = RefCell::new(Vec::new());
        let report = frames.tick(&mut RecordingEngine::new(), &|node: NodeId| {
            seen.borrow_mut().push(graph.with_node(node, |node| node.is_stale()));
        });

        assert_eq!(report.stale_nodes, vec![n[0], n[1]]);
        assert_eq!(*seen.borrow(), vec![Ok(false), Ok(false)]);
    }

    #[test]
    fn test_tick_latches_and_runs_hooks_once() {
        let (mut frames, n) = setup(2, GraphConfig::default());
        let graph = Arc::clone(frames.graph());
        graph.set_neighbor(n[0], Side::Right, Some(n[1])).unwrap();

        assert_eq!(graph.latched_neighbor(n[0], Side::Right), Ok(None));

        let mut engine = RecordingEngine::new();
        let hooked = RefCell::new(Vec::new());
        let report = frames.tick(&mut engine, &|node: NodeId| hooked.borrow_mut().push(node));

        assert_eq!(report.stale_nodes, vec![n[0], n[1]]);
        assert_eq!(*hooked.borrow(), vec![n[0], n[1]]);
        assert!(report.neighborhood_changed);
        assert_eq!(graph.latched_neighbor(n[0], Side::Right), Ok(Some(n[1])));
        assert_eq!(graph.with_node(n[0], |node| node.is_stale()), Ok(false));

        let delivered = engine.take();
        assert_eq!(delivered.len(), 2);
        assert!(matches!(delivered[0], Delivered::Added(_)));
        assert_eq!(delivered[1], Delivered::NeighborhoodChanged);

        // Nothing changed since: no hooks, no signal.
        hooked.borrow_mut().clear();
        let report = frames.tick(&mut engine, &|node: NodeId| hooked.borrow_mut().push(node));
        assert!(report.stale_nodes.is_empty());
        assert!(!report.neighborhood_changed);
        assert!(hooked.borrow().is_empty());
    }

    #[test]
    fn test_touch_is_delivered_without_neighborhood_signal() {
        let (mut frames, n) = setup(1, GraphConfig::default());
        frames.graph().touch(n[0]).unwrap();

        let mut engine = RecordingEngine::new();
        let report = frames.tick(&mut engine, &|_: NodeId| {});
        assert_eq!(engine.take(), vec![Delivered::Touch(CubeId(0))]);
        assert!(!report.neighborhood_changed);
    }

    #[test]
    fn test_collapse_can_be_disabled() {
        let config = GraphConfig {
            collapse_transient_links: false,
            ..GraphConfig::default()
        };
        let (mut frames, n) = setup(3, config);
        let graph = Arc::clone(frames.graph());
        graph.set_neighbor(n[0], Side::Right, Some(n[1])).unwrap();
        graph.set_neighbor(n[0], Side::Right, Some(n[2])).unwrap();

        let mut engine = RecordingEngine::new();
        let report = frames.tick(&mut engine, &|_: NodeId| {});
        assert_eq!(report.collapsed, 0);
        assert_eq!(report.delivered, 3);
    }

    #[test]
    fn test_stats_accumulate() {
        let (mut frames, n) = setup(2, GraphConfig::default());
        let mut engine = RecordingEngine::new();
        frames.graph().set_neighbor(n[0], Side::Top, Some(n[1])).unwrap();
        frames.tick(&mut engine, &|_: NodeId| {});
        frames.tick(&mut engine, &|_: NodeId| {});

        let stats = frames.stats();
        assert_eq!(stats.ticks, 2);
        assert_eq!(stats.delivered, 1);
        assert_eq!(stats.hooks_run, 2);
        assert_eq!(stats.neighborhood_changes, 1);
    }
}
