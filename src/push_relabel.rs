//! Highest-label push-relabel maximum flow over a [`FlowGraph`].
//!
//! Heights only ever increase, so the active-node set is naturally served by
//! [`PriorityQueueWithRestrictedPush`]: a node made active by a push always
//! sits exactly one level below the node being discharged, and a node
//! re-activated after its own relabel always rises strictly above everything
//! else still queued. Both cases satisfy the queue's "new priority is within
//! one of the current max" precondition, which is what lets push/pop stay
//! O(1) instead of falling back to a binary heap.

use crate::flow_graph::{ArcId, FlowGraph, FlowGraphBuilder, FlowQuantity, NodeId};
use crate::priority_queue::PriorityQueueWithRestrictedPush;
use bitvec::vec::BitVec;
use log::{debug, trace};
use std::collections::VecDeque;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Default)]
pub enum Status {
    #[default]
    #[error("max-flow solver has not been run yet")]
    NotSolved,
    #[error("max-flow solved to optimality")]
    Optimal,
    #[error("flow value exceeds the representable maximum")]
    IntOverflow,
    #[error("source and sink must be distinct nodes")]
    BadInput,
}

/// Single-source, single-sink maximum flow solver.
///
/// Owns the [`FlowGraph`] it solves over; residual capacities and flow live
/// in the graph itself, heights/excess/cursors live here.
pub struct PushRelabel {
    graph: FlowGraph,
    source: NodeId,
    sink: NodeId,
    status: Status,
    height: Vec<i64>,
    excess: Vec<FlowQuantity>,
    current_arc: Vec<ArcId>,
    active: PriorityQueueWithRestrictedPush<i64>,
    in_queue: BitVec,
    relabel_count: usize,
    overflow_during_init: bool,
}

impl PushRelabel {
    pub fn new(graph: FlowGraph, source: NodeId, sink: NodeId) -> Self {
        let n = graph.num_nodes();
        Self {
            graph,
            source,
            sink,
            status: Status::NotSolved,
            height: vec![0; n],
            excess: vec![0; n],
            current_arc: vec![0; n],
            active: PriorityQueueWithRestrictedPush::new(),
            in_queue: BitVec::repeat(false, n),
            relabel_count: 0,
            overflow_during_init: false,
        }
    }

    pub fn graph(&self) -> &FlowGraph {
        &self.graph
    }

    pub fn into_graph(self) -> FlowGraph {
        self.graph
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Changes an arc's capacity in place. If the arc was carrying more flow
    /// than the new capacity allows, the excess that has to come off the arc
    /// is applied to `excess[tail]`/`excess[head]` so a following `solve()`
    /// picks the node back up rather than silently losing the conservation
    /// invariant.
    pub fn set_arc_capacity(&mut self, arc: ArcId, capacity: FlowQuantity) {
        if let Some(excess_delta) = self.graph.set_capacity(arc, capacity) {
            let tail = self.graph.tail(arc);
            let head = self.graph.head(arc);
            self.excess[tail] += excess_delta;
            self.excess[head] -= excess_delta;
        }
        self.status = Status::NotSolved;
    }

    pub fn capacity(&self, arc: ArcId) -> FlowQuantity {
        self.graph.capacity(arc)
    }

    pub fn flow(&self, arc: ArcId) -> FlowQuantity {
        self.graph.flow(arc)
    }

    pub fn optimal_flow(&self) -> FlowQuantity {
        self.excess[self.sink]
    }

    pub fn solve(&mut self) -> Status {
        let n = self.graph.num_nodes();
        if self.source == self.sink {
            debug!("source and sink are both node {}, rejecting as bad input", self.source);
            self.status = Status::BadInput;
            return self.status;
        }
        if self.source >= n || self.sink >= n {
            // Out-of-range source/sink: treated as disconnected, matching the
            // reference engine's compatibility behavior rather than
            // rejecting with a dedicated error (see the Open Questions
            // resolved section).
            debug!(
                "source {} / sink {} out of range for {n} nodes, reporting zero flow",
                self.source, self.sink
            );
            self.status = Status::Optimal;
            return self.status;
        }
        self.zero_out_self_loops();
        self.initialize_preflow();
        self.global_update();
        self.run_main_phase();
        self.return_excess_to_source();

        self.status = if self.overflow_during_init && self.augmenting_path_exists() {
            Status::IntOverflow
        } else {
            Status::Optimal
        };
        debug!(
            "max-flow solved: value={}, status={:?}",
            self.optimal_flow(),
            self.status
        );
        self.status
    }

    fn zero_out_self_loops(&mut self) {
        for v in 0..self.graph.num_nodes() {
            let self_loops: Vec<ArcId> = self
                .graph
                .outgoing_arcs(v)
                .filter(|&a| self.graph.head(a) == v)
                .collect();
            for arc in self_loops {
                self.graph.set_capacity(arc, 0);
            }
        }
    }

    fn initialize_preflow(&mut self) {
        let n = self.graph.num_nodes();
        self.height[self.source] = n as i64;
        let mut budget = FlowQuantity::MAX;
        let mut overflowed = false;
        let arcs: Vec<ArcId> = self.graph.outgoing_arcs(self.source).collect();
        for arc in arcs {
            let head = self.graph.head(arc);
            if head == self.source {
                continue;
            }
            let cap = self.graph.remaining_capacity(arc);
            if cap <= 0 || budget <= 0 {
                if cap > 0 {
                    overflowed = true;
                }
                continue;
            }
            let amount = cap.min(budget);
            if amount < cap {
                overflowed = true;
            }
            self.graph.push_flow(arc, amount);
            self.excess[self.source] -= amount;
            self.excess[head] += amount;
            budget -= amount;
            trace!("saturated source arc {arc} by {amount}");
        }
        self.overflow_during_init = overflowed;
    }

    fn run_main_phase(&mut self) {
        let n = self.graph.num_nodes();
        while !self.active.is_empty() {
            let v = self.active.pop();
            self.in_queue.set(v, false);
            if v == self.source || v == self.sink {
                continue;
            }
            if self.excess[v] <= 0 || (self.height[v] as usize) >= n {
                continue;
            }
            self.discharge(v);
            if self.excess[v] > 0 && (self.height[v] as usize) < n {
                self.enqueue_active(v);
            }
        }
    }

    fn enqueue_active(&mut self, v: NodeId) {
        if self.in_queue[v] {
            return;
        }
        self.in_queue.set(v, true);
        self.active.push(v, self.height[v]);
    }

    fn discharge(&mut self, v: NodeId) {
        let range = self.graph.outgoing_arcs(v);
        let (start, end) = (range.start, range.end);
        let mut arc = self.current_arc[v].clamp(start, end.max(start));
        loop {
            if self.excess[v] <= 0 {
                self.current_arc[v] = arc;
                return;
            }
            if arc >= end {
                self.relabel(v);
                if (self.height[v] as usize) >= 2 * self.graph.num_nodes() - 1 {
                    self.current_arc[v] = start;
                    return;
                }
                arc = start;
                continue;
            }
            if self.graph.is_admissible(arc) && self.height[v] == self.height[self.graph.head(arc)] + 1
            {
                let delta = self.excess[v].min(self.graph.remaining_capacity(arc));
                self.push(arc, delta);
                if self.excess[v] == 0 {
                    self.current_arc[v] = arc;
                    return;
                }
            }
            arc += 1;
        }
    }

    fn push(&mut self, arc: ArcId, delta: FlowQuantity) {
        let tail = self.graph.tail(arc);
        let head = self.graph.head(arc);
        self.graph.push_flow(arc, delta);
        self.excess[tail] -= delta;
        let was_active = self.excess[head] > 0;
        self.excess[head] += delta;
        trace!("pushed {delta} on arc {arc} ({tail} -> {head})");
        if !was_active && head != self.source && head != self.sink {
            self.enqueue_active(head);
        }
    }

    /// Sets `height(v)` to the exact minimum admitted by a residual out-arc,
    /// plus one. `discharge` only calls `relabel` once `v` has no admissible
    /// out-arc left, and the height invariant (`height(v) <= height(head)+1`
    /// on every residual arc) then guarantees no residual out-arc has
    /// `height(head) < height(v)` — so a candidate at exactly `height(v)`
    /// is already the true minimum and the scan can stop there.
    fn relabel(&mut self, v: NodeId) {
        let n = self.graph.num_nodes();
        let current_height = self.height[v];
        let mut min_height = i64::MAX;
        for arc in self.graph.outgoing_arcs(v) {
            if self.graph.is_admissible(arc) {
                let h = self.height[self.graph.head(arc)];
                if h < min_height {
                    min_height = h;
                }
                if h == current_height {
                    break;
                }
            }
        }
        self.height[v] = if min_height == i64::MAX {
            2 * (n as i64) - 1
        } else {
            min_height + 1
        };
        trace!("relabeled {v} to height {}", self.height[v]);
        self.relabel_count += 1;
        if n > 0 && self.relabel_count % n == 0 {
            self.global_update();
        }
    }

    /// Reverse BFS from the sink over the residual graph, recomputing exact
    /// heights and reseeding the active-node queue from scratch. As each
    /// node is first reached, any excess it already carries is immediately
    /// pushed toward the node that discovered it (the arc that connected
    /// them just certified residual capacity in that direction), saving
    /// `discharge` from having to rediscover the same move later.
    fn global_update(&mut self) {
        let n = self.graph.num_nodes();
        if n == 0 {
            return;
        }
        let unreachable = 2 * (n as i64) - 1;
        self.height.fill(unreachable);
        self.height[self.sink] = 0;
        self.active.clear();
        self.in_queue.fill(false);

        let mut queue = VecDeque::new();
        queue.push_back(self.sink);
        while let Some(u) = queue.pop_front() {
            let arcs: Vec<ArcId> = self.graph.outgoing_arcs(u).collect();
            for arc in arcs {
                let rev = self.graph.opposite(arc);
                if self.graph.remaining_capacity(rev) > 0 {
                    let v = self.graph.head(arc);
                    if self.height[v] == unreachable {
                        self.height[v] = self.height[u] + 1;
                        queue.push_back(v);
                        if v != self.source && self.excess[v] > 0 {
                            let steal = self.excess[v].min(self.graph.remaining_capacity(rev));
                            if steal > 0 {
                                self.push(rev, steal);
                            }
                        }
                    }
                }
            }
        }
        self.height[self.source] = n as i64;

        for v in 0..n {
            self.current_arc[v] = self.graph.outgoing_arcs(v).start;
            if v != self.source && v != self.sink && self.excess[v] > 0 && (self.height[v] as usize) < n
            {
                self.enqueue_active(v);
            }
        }
        debug!("global update complete");
    }

    /// Drains any excess left at nodes that can no longer reach the sink
    /// back to the source, by BFS along arcs that currently carry flow
    /// (pushing along their reverse un-sends that flow). Left-over
    /// circulating flow on cycles disjoint from source/sink is harmless —
    /// it still satisfies flow conservation at every node on the cycle — so
    /// it is not explicitly canceled.
    fn return_excess_to_source(&mut self) {
        let n = self.graph.num_nodes();
        loop {
            let Some(start) = (0..n).find(|&v| v != self.source && v != self.sink && self.excess[v] > 0)
            else {
                break;
            };

            let mut parent_arc: Vec<Option<ArcId>> = vec![None; n];
            let mut visited = vec![false; n];
            visited[start] = true;
            let mut queue = VecDeque::new();
            queue.push_back(start);
            let mut found = false;
            while let Some(u) = queue.pop_front() {
                if u == self.source {
                    found = true;
                    break;
                }
                for arc in self.graph.outgoing_arcs(u) {
                    if self.graph.is_direct(arc) || self.graph.remaining_capacity(arc) <= 0 {
                        continue;
                    }
                    let w = self.graph.head(arc);
                    if !visited[w] {
                        visited[w] = true;
                        parent_arc[w] = Some(arc);
                        queue.push_back(w);
                    }
                }
            }
            debug_assert!(found, "leftover excess must be returnable to the source");
            if !found {
                break;
            }

            let mut arcs_to_source = Vec::new();
            let mut cur = self.source;
            while cur != start {
                let arc = parent_arc[cur].expect("BFS parent chain must reach `start`");
                arcs_to_source.push(arc);
                cur = self.graph.tail(arc);
            }

            let mut bottleneck = self.excess[start];
            for &arc in &arcs_to_source {
                bottleneck = bottleneck.min(self.graph.remaining_capacity(arc));
            }
            for arc in arcs_to_source {
                let tail = self.graph.tail(arc);
                let head = self.graph.head(arc);
                self.graph.push_flow(arc, bottleneck);
                self.excess[tail] -= bottleneck;
                self.excess[head] += bottleneck;
            }
        }
    }

    pub fn augmenting_path_exists(&self) -> bool {
        let n = self.graph.num_nodes();
        if self.source >= n || self.sink >= n {
            return false;
        }
        let mut visited = vec![false; n];
        let mut stack = vec![self.source];
        visited[self.source] = true;
        while let Some(u) = stack.pop() {
            if u == self.sink {
                return true;
            }
            for arc in self.graph.outgoing_arcs(u) {
                if self.graph.remaining_capacity(arc) > 0 {
                    let v = self.graph.head(arc);
                    if !visited[v] {
                        visited[v] = true;
                        stack.push(v);
                    }
                }
            }
        }
        false
    }

    /// Nodes reachable from the source in the residual graph.
    pub fn get_source_side_min_cut(&self, out: &mut Vec<NodeId>) {
        out.clear();
        let n = self.graph.num_nodes();
        if self.source >= n {
            return;
        }
        let mut visited = vec![false; n];
        visited[self.source] = true;
        out.push(self.source);
        let mut stack = vec![self.source];
        while let Some(u) = stack.pop() {
            for arc in self.graph.outgoing_arcs(u) {
                if self.graph.remaining_capacity(arc) > 0 {
                    let v = self.graph.head(arc);
                    if !visited[v] {
                        visited[v] = true;
                        out.push(v);
                        stack.push(v);
                    }
                }
            }
        }
    }

    /// Nodes that can reach the sink in the residual graph.
    pub fn get_sink_side_min_cut(&self, out: &mut Vec<NodeId>) {
        out.clear();
        let n = self.graph.num_nodes();
        if self.sink >= n {
            return;
        }
        let mut visited = vec![false; n];
        visited[self.sink] = true;
        out.push(self.sink);
        let mut queue = VecDeque::new();
        queue.push_back(self.sink);
        while let Some(u) = queue.pop_front() {
            for arc in self.graph.outgoing_arcs(u) {
                let rev = self.graph.opposite(arc);
                if self.graph.remaining_capacity(rev) > 0 {
                    let v = self.graph.head(arc);
                    if !visited[v] {
                        visited[v] = true;
                        out.push(v);
                        queue.push_back(v);
                    }
                }
            }
        }
    }
}

/// Builder-style max-flow entry point: accumulate arcs lazily, finalize into
/// a [`FlowGraph`] on `solve`, and translate caller-order arc indices
/// through the finalization permutation.
#[derive(Default)]
pub struct SimpleMaxFlow {
    builder: FlowGraphBuilder,
    solved: Option<(PushRelabel, Vec<ArcId>)>,
}

impl SimpleMaxFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_arc_with_capacity(&mut self, tail: NodeId, head: NodeId, capacity: FlowQuantity) -> ArcId {
        self.solved = None;
        self.builder.add_arc(tail, head, capacity)
    }

    pub fn set_arc_capacity(&mut self, arc: ArcId, capacity: FlowQuantity) {
        match &mut self.solved {
            Some((pr, permutation)) => pr.set_arc_capacity(permutation[arc], capacity),
            None => panic!("set_arc_capacity called before solve()"),
        }
    }

    pub fn num_nodes(&self) -> NodeId {
        match &self.solved {
            Some((pr, _)) => pr.graph().num_nodes(),
            None => self.builder.num_nodes(),
        }
    }

    pub fn num_arcs(&self) -> ArcId {
        match &self.solved {
            Some((_, permutation)) => permutation.len(),
            None => self.builder.num_arcs(),
        }
    }

    /// Re-solving after nothing but `set_arc_capacity` calls reuses the
    /// already-built [`PushRelabel`] instance (whose excess was already
    /// adjusted by those calls) rather than rebuilding from the builder,
    /// which by this point has been drained by the first `solve()`.
    pub fn solve(&mut self, source: NodeId, sink: NodeId) -> Status {
        if let Some((pr, _)) = &mut self.solved {
            return pr.solve();
        }
        let builder = std::mem::take(&mut self.builder);
        let (graph, permutation) = builder.build();
        let mut pr = PushRelabel::new(graph, source, sink);
        let status = pr.solve();
        self.solved = Some((pr, permutation));
        status
    }

    fn solved(&self) -> &(PushRelabel, Vec<ArcId>) {
        self.solved.as_ref().expect("solve() must be called first")
    }

    pub fn optimal_flow(&self) -> FlowQuantity {
        self.solved().0.optimal_flow()
    }

    pub fn flow(&self, arc: ArcId) -> FlowQuantity {
        let (pr, permutation) = self.solved();
        pr.flow(permutation[arc])
    }

    pub fn capacity(&self, arc: ArcId) -> FlowQuantity {
        let (pr, permutation) = self.solved();
        pr.capacity(permutation[arc])
    }

    pub fn tail(&self, arc: ArcId) -> NodeId {
        let (pr, permutation) = self.solved();
        pr.graph().tail(permutation[arc])
    }

    pub fn head(&self, arc: ArcId) -> NodeId {
        let (pr, permutation) = self.solved();
        pr.graph().head(permutation[arc])
    }

    pub fn get_source_side_min_cut(&self, out: &mut Vec<NodeId>) {
        self.solved().0.get_source_side_min_cut(out);
    }

    pub fn get_sink_side_min_cut(&self, out: &mut Vec<NodeId>) {
        self.solved().0.get_sink_side_min_cut(out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow_graph::FlowGraphBuilder;

    fn solved_flow(arcs: &[(NodeId, NodeId, FlowQuantity)], source: NodeId, sink: NodeId) -> PushRelabel {
        let mut builder = FlowGraphBuilder::new();
        for &(t, h, c) in arcs {
            builder.add_arc(t, h, c);
        }
        let (graph, _) = builder.build();
        let mut pr = PushRelabel::new(graph, source, sink);
        pr.solve();
        pr
    }

    #[test]
    fn clr_max_flow_value() {
        let _ = env_logger::try_init();
        let arcs = [
            (0, 1, 16),
            (0, 2, 13),
            (1, 2, 10),
            (1, 3, 12),
            (2, 1, 4),
            (2, 4, 14),
            (3, 2, 9),
            (3, 5, 20),
            (4, 3, 7),
            (4, 5, 4),
        ];
        let pr = solved_flow(&arcs, 0, 5);
        assert_eq!(pr.status(), Status::Optimal);
        assert_eq!(pr.optimal_flow(), 23);
    }

    #[test]
    fn taha_6_4_2() {
        let arcs = [
            (0, 1, 20),
            (0, 2, 30),
            (0, 3, 10),
            (1, 2, 40),
            (1, 4, 30),
            (2, 3, 10),
            (2, 4, 20),
            (3, 2, 5),
            (3, 4, 20),
        ];
        let pr = solved_flow(&arcs, 0, 4);
        assert_eq!(pr.optimal_flow(), 60);
    }

    #[test]
    fn assignment_structure_per_arc_flow() {
        let arcs = [
            (0, 1, 5),
            (0, 2, 8),
            (0, 3, 5),
            (0, 4, 3),
            (1, 3, 4),
            (2, 4, 5),
            (3, 4, 6),
            (3, 5, 6),
            (4, 5, 4),
        ];
        let mut builder = FlowGraphBuilder::new();
        let ids: Vec<ArcId> = arcs.iter().map(|&(t, h, c)| builder.add_arc(t, h, c)).collect();
        let (graph, permutation) = builder.build();
        let mut pr = PushRelabel::new(graph, 0, 5);
        pr.solve();
        assert_eq!(pr.optimal_flow(), 10);
        let expected = [1, 1, 5, 3, 1, 1, 0, 6, 4];
        for (i, &id) in ids.iter().enumerate() {
            assert_eq!(pr.flow(permutation[id]), expected[i], "arc {i}");
        }
    }

    #[test]
    fn conservation_holds_at_every_interior_node() {
        let arcs = [
            (0, 1, 16),
            (0, 2, 13),
            (1, 2, 10),
            (1, 3, 12),
            (2, 1, 4),
            (2, 4, 14),
            (3, 2, 9),
            (3, 5, 20),
            (4, 3, 7),
            (4, 5, 4),
        ];
        let pr = solved_flow(&arcs, 0, 5);
        for v in 0..pr.graph().num_nodes() {
            if v == 0 || v == 5 {
                continue;
            }
            let mut net = 0;
            for arc in pr.graph().outgoing_arcs(v) {
                net += pr.graph().flow(arc);
            }
            assert_eq!(net, 0, "node {v} should conserve flow");
        }
    }

    #[test]
    fn self_loop_capacity_is_ignored() {
        let mut builder = FlowGraphBuilder::new();
        builder.add_arc(0, 0, 100);
        builder.add_arc(0, 1, 5);
        let (graph, _) = builder.build();
        let mut pr = PushRelabel::new(graph, 0, 1);
        pr.solve();
        assert_eq!(pr.optimal_flow(), 5);
    }

    #[test]
    fn out_of_range_sink_reports_zero_flow() {
        let mut builder = FlowGraphBuilder::new();
        builder.add_arc(0, 1, 5);
        let (graph, _) = builder.build();
        let mut pr = PushRelabel::new(graph, 0, 9);
        assert_eq!(pr.solve(), Status::Optimal);
        assert_eq!(pr.optimal_flow(), 0);
    }

    #[test]
    fn simple_max_flow_wrapper_round_trips_caller_arc_order() {
        let mut solver = SimpleMaxFlow::new();
        let a0 = solver.add_arc_with_capacity(0, 1, 16);
        let a1 = solver.add_arc_with_capacity(0, 2, 13);
        let a2 = solver.add_arc_with_capacity(1, 2, 10);
        let a3 = solver.add_arc_with_capacity(1, 3, 12);
        let a4 = solver.add_arc_with_capacity(2, 3, 14);
        solver.solve(0, 3);
        assert_eq!(solver.tail(a0), 0);
        assert_eq!(solver.head(a4), 3);
        assert_eq!(solver.optimal_flow(), 23);
        let mut cut = Vec::new();
        solver.get_source_side_min_cut(&mut cut);
        assert!(cut.contains(&0));
        assert!(!cut.contains(&3));
        let _ = (a1, a2, a3);
    }

    #[test]
    fn source_equals_sink_is_bad_input() {
        let mut builder = FlowGraphBuilder::new();
        builder.add_arc(0, 1, 5);
        let (graph, _) = builder.build();
        let mut pr = PushRelabel::new(graph, 1, 1);
        assert_eq!(pr.solve(), Status::BadInput);
    }

    #[test]
    fn set_arc_capacity_after_solve_is_picked_up_on_resolve() {
        let mut solver = SimpleMaxFlow::new();
        let arc = solver.add_arc_with_capacity(0, 1, 10);
        assert_eq!(solver.solve(0, 1), Status::Optimal);
        assert_eq!(solver.optimal_flow(), 10);

        solver.set_arc_capacity(arc, 3);
        assert_eq!(solver.solve(0, 1), Status::Optimal);
        assert_eq!(solver.optimal_flow(), 3);
    }

    #[test]
    fn bipartite_vertex_cover_example_max_flow() {
        // Built directly as a max-flow instance: super source -> lefts ->
        // rights -> super sink, all capacity 1. Left nodes 0 and 2 both
        // have right node 1 as their only neighbor, so at most one of them
        // can ever be matched — the maximum matching tops out at 3, not 4.
        let num_left = 4;
        let num_right = 4;
        let edges: [(NodeId, NodeId); 8] = [
            (0, 1),
            (1, 0),
            (1, 1),
            (1, 2),
            (2, 1),
            (3, 1),
            (3, 2),
            (3, 3),
        ];
        let super_source = num_left + num_right;
        let super_sink = super_source + 1;
        let mut solver = SimpleMaxFlow::new();
        for l in 0..num_left {
            solver.add_arc_with_capacity(super_source, l, 1);
        }
        for r in 0..num_right {
            solver.add_arc_with_capacity(num_left + r, super_sink, 1);
        }
        for (l, r) in edges {
            solver.add_arc_with_capacity(l, num_left + r, 1);
        }
        solver.solve(super_source, super_sink);
        assert_eq!(solver.optimal_flow(), 3);
    }
}
