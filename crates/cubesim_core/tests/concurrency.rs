//! Concurrency tests: a UI thread mutating while an engine thread ticks.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use cubesim_core::shared::{CubeId, NeighborRecord};
use cubesim_core::{
    ChannelHooks, Delivered, Engine, FrameCoordinator, GraphConfig, HookMessage, NeighborGraph,
    NodeId, NullSurface, RecordingEngine, Side,
};
use parking_lot::Mutex;

fn setup(capacity: usize) -> (Arc<NeighborGraph>, Vec<NodeId>) {
    let graph = Arc::new(NeighborGraph::new(capacity, GraphConfig::default()).unwrap());
    let ids = (0..capacity)
        .map(|_| graph.register_node(Arc::new(NullSurface)).unwrap())
        .collect();
    (graph, ids)
}

#[test]
fn test_concurrent_mutation_and_ticks_stay_symmetric() {
    let (graph, n) = setup(4);
    let done = Arc::new(AtomicBool::new(false));

    let ui = {
        let graph = Arc::clone(&graph);
        let n = n.clone();
        let done = Arc::clone(&done);
        thread::spawn(move || {
            for i in 0..5_000usize {
                let node = n[i % 4];
                let other = n[(i / 4 + 1 + i % 4) % 4];
                let side = Side::ALL[(i / 7) % 4];
                if node != other {
                    graph.set_neighbor(node, side, Some(other)).unwrap();
                }
                if i % 11 == 0 {
                    graph.touch(node).unwrap();
                }
            }
            done.store(true, Ordering::Release);
        })
    };

    let mut frames = FrameCoordinator::new(Arc::clone(&graph));
    let mut engine = RecordingEngine::with_capacity(4);
    while !done.load(Ordering::Acquire) {
        frames.tick(&mut engine, &|_: NodeId| {});
        assert!(graph.is_symmetric());
        engine.take();
    }
    ui.join().unwrap();

    // One last tick drains whatever the UI thread left behind.
    frames.tick(&mut engine, &|_: NodeId| {});
    assert!(graph.pending_events().is_empty());
    assert!(graph.is_symmetric());
    assert_eq!(frames.stats().missed_events, 0);

    // The latched view now matches the live one.
    for &node in &n {
        for side in Side::ALL {
            assert_eq!(
                graph.latched_neighbor(node, side).unwrap(),
                graph.neighbor(node, side).unwrap()
            );
        }
    }
}

/// Engine that queries the graph from inside its callbacks.
struct QueryingEngine {
    graph: Arc<NeighborGraph>,
    seen: Vec<CubeId>,
}

impl Engine for QueryingEngine {
    fn cube_capacity(&self) -> usize {
        self.graph.capacity()
    }

    fn on_touch(&mut self, cube: CubeId) {
        self.seen.push(self.graph.neighborhood_cube_at(cube, Side::Right).unwrap());
    }

    fn on_neighbor_added(&mut self, record: NeighborRecord) {
        self.seen.push(self.graph.neighborhood_cube_at(record.first, Side::Right).unwrap());
    }

    fn on_neighbor_removed(&mut self, _record: NeighborRecord) {}

    fn on_neighborhood_changed(&mut self) {}
}

#[test]
fn test_engine_can_query_during_delivery() {
    let (graph, n) = setup(2);
    graph.set_neighbor(n[0], Side::Right, Some(n[1])).unwrap();
    graph.touch(n[0]).unwrap();

    let mut frames = FrameCoordinator::new(Arc::clone(&graph));
    let mut engine = QueryingEngine {
        graph: Arc::clone(&graph),
        seen: Vec::new(),
    };
    frames.tick(&mut engine, &|_: NodeId| {});

    // Latching happens before delivery, so the engine sees this frame's links.
    assert_eq!(engine.seen, vec![CubeId(1), CubeId(1)]);
}

/// Engine that mutates the graph while its own tick is delivering.
struct MutatingEngine {
    graph: Arc<NeighborGraph>,
    nodes: Vec<NodeId>,
    delivered: Vec<Delivered>,
}

impl Engine for MutatingEngine {
    fn cube_capacity(&self) -> usize {
        self.graph.capacity()
    }

    fn on_touch(&mut self, cube: CubeId) {
        self.delivered.push(Delivered::Touch(cube));
        self.graph
            .set_neighbor(self.nodes[0], Side::Top, Some(self.nodes[1]))
            .unwrap();
    }

    fn on_neighbor_added(&mut self, record: NeighborRecord) {
        self.delivered.push(Delivered::Added(record));
    }

    fn on_neighbor_removed(&mut self, record: NeighborRecord) {
        self.delivered.push(Delivered::Removed(record));
    }

    fn on_neighborhood_changed(&mut self) {
        self.delivered.push(Delivered::NeighborhoodChanged);
    }
}

#[test]
fn test_reentrant_mutation_is_delivered_in_same_tick() {
    let (graph, n) = setup(2);
    graph.touch(n[0]).unwrap();

    let mut frames = FrameCoordinator::new(Arc::clone(&graph));
    let mut engine = MutatingEngine {
        graph: Arc::clone(&graph),
        nodes: n.clone(),
        delivered: Vec::new(),
    };

    let first = frames.tick(&mut engine, &|_: NodeId| {});
    assert_eq!(first.missed_events, 0);
    assert_eq!(first.delivered, 2);
    assert_eq!(engine.delivered[0], Delivered::Touch(CubeId(0)));
    assert!(matches!(
        engine.delivered[1],
        Delivered::Added(r) if r.first == CubeId(0) && r.second == CubeId(1)
    ));
    // The tick leaves nothing behind.
    assert!(graph.pending_events().is_empty());
    // This frame's snapshot predates the link.
    assert!(!first.neighborhood_changed);
    assert_eq!(graph.neighborhood_cube_at(CubeId(0), Side::Top), Ok(CubeId::INVALID));

    engine.delivered.clear();
    let second = frames.tick(&mut engine, &|_: NodeId| {});
    assert_eq!(second.missed_events, 0);
    assert_eq!(second.delivered, 0);
    assert!(second.neighborhood_changed);
    assert_eq!(second.stale_nodes, vec![n[0], n[1]]);
    assert_eq!(engine.delivered, vec![Delivered::NeighborhoodChanged]);
    assert_eq!(graph.neighborhood_cube_at(CubeId(0), Side::Top), Ok(CubeId(1)));
    assert_eq!(frames.stats().missed_events, 0);
}

/// Engine that queues another touch from every touch it receives.
struct EchoEngine {
    graph: Arc<NeighborGraph>,
    echoes_left: usize,
    touches: usize,
}

impl Engine for EchoEngine {
    fn cube_capacity(&self) -> usize {
        self.graph.capacity()
    }

    fn on_touch(&mut self, cube: CubeId) {
        self.touches += 1;
        if self.echoes_left > 0 {
            self.echoes_left -= 1;
            self.graph.touch(NodeId::new(u32::from(cube.0))).unwrap();
        }
    }

    fn on_neighbor_added(&mut self, _record: NeighborRecord) {}
    fn on_neighbor_removed(&mut self, _record: NeighborRecord) {}
    fn on_neighborhood_changed(&mut self) {}
}

#[test]
fn test_runaway_engine_leaves_rest_for_next_tick() {
    let (graph, n) = setup(1);
    graph.touch(n[0]).unwrap();

    let mut frames = FrameCoordinator::new(Arc::clone(&graph));
    let mut engine = EchoEngine {
        graph: Arc::clone(&graph),
        echoes_left: 20,
        touches: 0,
    };

    let rounds = FrameCoordinator::MAX_DRAIN_ROUNDS;
    let first = frames.tick(&mut engine, &|_: NodeId| {});
    assert_eq!(first.delivered, rounds);
    assert_eq!(first.missed_events, 0);
    assert_eq!(graph.pending_events().len(), 1);

    // The leftover was never drained: that is a real missed tick.
    let second = frames.tick(&mut engine, &|_: NodeId| {});
    assert_eq!(second.missed_events, 1);
    assert_eq!(second.delivered, 21 - rounds);
    assert!(graph.pending_events().is_empty());
    assert_eq!(engine.touches, 21);
}

#[test]
fn test_hooks_run_unlocked_and_may_mutate() {
    // A hook that needs the graph lock would deadlock if called while the
    // ticking thread still held it across threads. Route the hook through a
    // second thread that mutates the graph and wait for it.
    let (graph, n) = setup(3);
    graph.set_neighbor(n[0], Side::Right, Some(n[1])).unwrap();

    let mut frames = FrameCoordinator::new(Arc::clone(&graph));
    let mut engine = RecordingEngine::with_capacity(3);

    let hook_graph = Arc::clone(&graph);
    let extra = n[2];
    let hooks_run = AtomicUsize::new(0);
    let hook = |node: NodeId| {
        hooks_run.fetch_add(1, Ordering::Relaxed);
        let graph = Arc::clone(&hook_graph);
        // Another thread must be able to take the lock right now.
        thread::spawn(move || {
            if node.index() == 0 {
                graph.set_neighbor(node, Side::Bottom, Some(extra)).unwrap();
            }
        })
        .join()
        .unwrap();
    };

    let report = frames.tick(&mut engine, &hook);
    assert_eq!(report.stale_nodes.len(), 2);
    assert_eq!(hooks_run.load(Ordering::Relaxed), 2);

    // The hook's mutation is queued for the next tick and is not "missed".
    assert_eq!(graph.pending_events().len(), 1);
    let next = frames.tick(&mut engine, &|_: NodeId| {});
    assert_eq!(next.missed_events, 0);
    assert_eq!(next.stale_nodes, vec![n[0], n[2]]);
}

#[test]
fn test_ui_thread_blocked_during_locked_phase_is_not_lost() {
    // The engine parks inside delivery until the UI thread is waiting on the
    // lock. The UI mutation must then land after the tick, intact.
    struct ParkingEngine {
        barrier: Arc<Barrier>,
    }

    impl Engine for ParkingEngine {
        fn cube_capacity(&self) -> usize {
            2
        }
        fn on_touch(&mut self, _cube: CubeId) {
            self.barrier.wait();
            thread::sleep(Duration::from_millis(20));
        }
        fn on_neighbor_added(&mut self, _record: NeighborRecord) {}
        fn on_neighbor_removed(&mut self, _record: NeighborRecord) {}
        fn on_neighborhood_changed(&mut self) {}
    }

    let (graph, n) = setup(2);
    graph.touch(n[0]).unwrap();
    let barrier = Arc::new(Barrier::new(2));

    let ui = {
        let graph = Arc::clone(&graph);
        let barrier = Arc::clone(&barrier);
        let (a, b) = (n[0], n[1]);
        thread::spawn(move || {
            barrier.wait();
            graph.set_neighbor(a, Side::Left, Some(b)).unwrap();
        })
    };

    let mut frames = FrameCoordinator::new(Arc::clone(&graph));
    let mut engine = ParkingEngine { barrier };
    let report = frames.tick(&mut engine, &|_: NodeId| {});
    ui.join().unwrap();

    assert!(!report.neighborhood_changed);
    assert_eq!(graph.neighbor(n[0], Side::Left), Ok(Some(n[1])));
    assert_eq!(graph.pending_events().len(), 1);
    assert!(graph.is_symmetric());
}

#[test]
fn test_channel_hooks_marshal_to_ui_thread() {
    let (graph, n) = setup(2);
    let (hooks, receiver) = ChannelHooks::pair();
    let received = Arc::new(Mutex::new(Vec::new()));

    graph.set_neighbor(n[0], Side::Right, Some(n[1])).unwrap();
    let mut frames = FrameCoordinator::new(Arc::clone(&graph));
    let mut engine = RecordingEngine::with_capacity(2);
    let frame = graph.frame();
    frames.tick(&mut engine, &hooks.for_frame(frame));

    let ui = {
        let received = Arc::clone(&received);
        thread::spawn(move || {
            receiver.drain(|message| received.lock().push(message));
        })
    };
    ui.join().unwrap();

    assert_eq!(
        *received.lock(),
        vec![
            HookMessage::NeighborsChanged { node: n[0], frame: 0 },
            HookMessage::NeighborsChanged { node: n[1], frame: 0 },
        ]
    );
}
