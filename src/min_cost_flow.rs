//! Cost-scaling push-relabel minimum-cost flow over a [`FlowGraph`].
//!
//! A Goldberg-Tarjan style epsilon-scaling solver: costs are scaled by
//! `num_nodes + 1` up front, then epsilon is divided down in rounds from
//! `max |scaled cost|` down to 1, maintaining epsilon-optimality (every
//! residual arc's reduced cost is >= -epsilon) at the end of each round.
//! When epsilon reaches 1, epsilon-optimality with integer reduced costs
//! implies exact optimality.

use crate::flow_graph::{ArcId, CostValue, FlowGraph, FlowGraphBuilder, FlowQuantity, NodeId};
use crate::push_relabel::PushRelabel;
use log::debug;
use std::collections::VecDeque;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Default)]
pub enum Status {
    #[default]
    #[error("min-cost-flow solver has not been run yet")]
    NotSolved,
    #[error("min-cost-flow solved to optimality")]
    Optimal,
    #[error("a feasible flow exists satisfying every supply/demand")]
    Feasible,
    #[error("supplies and demands cannot be satisfied by any flow")]
    Infeasible,
    #[error("total supply does not equal total demand")]
    Unbalanced,
    #[error("solver produced a result that fails conservation or optimality checks")]
    BadResult,
    #[error("a cost value is outside the representable range after scaling")]
    BadCostRange,
    #[error("a capacity value is outside the representable range")]
    BadCapacityRange,
}

/// Default divisor for epsilon between refine rounds.
const DEFAULT_ALPHA: CostValue = 5;

/// Minimum-cost flow via successive epsilon-optimal refinements.
pub struct MinCostFlow {
    graph: FlowGraph,
    supply: Vec<FlowQuantity>,
    status: Status,
    potential: Vec<CostValue>,
    excess: Vec<FlowQuantity>,
    current_arc: Vec<ArcId>,
    scaled_cost: Vec<CostValue>,
    epsilon: CostValue,
    cost_scale: CostValue,
    alpha: CostValue,
    check_feasibility_enabled: bool,
    price_scaling_enabled: bool,
    use_update_prices: bool,
    relabel_count: usize,
    maximum_flow: FlowQuantity,
}

impl MinCostFlow {
    pub fn new(graph: FlowGraph, supply: Vec<FlowQuantity>) -> Self {
        let n = graph.num_nodes();
        debug_assert_eq!(supply.len(), n);
        let num_all_arcs = graph.num_all_arcs();
        Self {
            graph,
            supply,
            status: Status::NotSolved,
            potential: vec![0; n],
            excess: vec![0; n],
            current_arc: vec![0; n],
            scaled_cost: vec![0; num_all_arcs],
            epsilon: 1,
            cost_scale: (n as CostValue) + 1,
            alpha: DEFAULT_ALPHA,
            check_feasibility_enabled: true,
            price_scaling_enabled: true,
            use_update_prices: false,
            relabel_count: 0,
            maximum_flow: 0,
        }
    }

    pub fn graph(&self) -> &FlowGraph {
        &self.graph
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn flow(&self, arc: ArcId) -> FlowQuantity {
        self.graph.flow(arc)
    }

    /// Maximum flow value found by the last feasibility probe (or, via
    /// [`solve_max_flow_with_min_cost`], the value the min-cost instance was
    /// built to realize exactly).
    pub fn maximum_flow(&self) -> FlowQuantity {
        self.maximum_flow
    }

    /// Changes an arc's unit cost. Takes effect on the next `solve()`; the
    /// stored value is always the caller's unscaled cost, never a
    /// previously scaled one (see the scaling note on `solve`).
    pub fn set_arc_unit_cost(&mut self, arc: ArcId, cost: CostValue) {
        self.graph.set_cost(arc, cost);
        self.status = Status::NotSolved;
    }

    /// Changes an arc's capacity in place, applying any live-flow excess
    /// delta to its endpoints. Unlike max-flow's preflow, min-cost-flow's
    /// pseudo-flow already tolerates a node ending up with positive or
    /// negative excess between solves, so no special deficit-repair is
    /// needed beyond bookkeeping the delta — the next `solve()`'s
    /// excess-from-current-flow reseed (see `solve`) picks it up.
    pub fn set_arc_capacity(&mut self, arc: ArcId, capacity: FlowQuantity) {
        if let Some(excess_delta) = self.graph.set_capacity(arc, capacity) {
            let tail = self.graph.tail(arc);
            let head = self.graph.head(arc);
            self.excess[tail] += excess_delta;
            self.excess[head] -= excess_delta;
        }
        self.status = Status::NotSolved;
    }

    pub fn set_node_supply(&mut self, node: NodeId, supply: FlowQuantity) {
        self.supply[node] = supply;
        self.status = Status::NotSolved;
    }

    /// Enables or disables the pre-solve feasibility probe (on by default).
    /// Disabling it saves the probe's auxiliary max-flow solve at the cost
    /// of reporting `BadResult` instead of `Infeasible` for an infeasible
    /// instance, since `check_result` still rejects any answer that fails
    /// conservation.
    pub fn set_check_feasibility(&mut self, enabled: bool) {
        self.check_feasibility_enabled = enabled;
        self.status = Status::NotSolved;
    }

    /// Enables or disables cost scaling (on by default). Disabled, costs
    /// run through the refine loop unscaled at `epsilon == 1` only — cheap,
    /// but only exact when the input costs are themselves already small
    /// enough that a single round suffices.
    pub fn set_price_scaling(&mut self, enabled: bool) {
        self.price_scaling_enabled = enabled;
        self.status = Status::NotSolved;
    }

    /// Enables the global price update heuristic (off by default, matching
    /// the reference engine's default): every `num_nodes` relabels, a
    /// reverse BFS from every node with negative excess finds the largest
    /// potential decrease that keeps every boundary arc epsilon-optimal,
    /// shortcutting a lot of individual relabels.
    pub fn set_use_update_prices(&mut self, enabled: bool) {
        self.use_update_prices = enabled;
        self.status = Status::NotSolved;
    }

    fn reduced_cost(&self, arc: ArcId) -> CostValue {
        self.scaled_cost[arc] + self.potential[self.graph.tail(arc)] - self.potential[self.graph.head(arc)]
    }

    fn is_admissible(&self, arc: ArcId) -> bool {
        self.graph.remaining_capacity(arc) > 0 && self.reduced_cost(arc) < 0
    }

    /// Every node's maximum possible in-flow/out-flow (summed direct-arc
    /// capacity plus supply/demand) must still fit in `FlowQuantity`, or a
    /// later push could silently wrap.
    fn check_capacity_range(&self) -> bool {
        let n = self.graph.num_nodes();
        let mut max_out = vec![0i128; n];
        let mut max_in = vec![0i128; n];
        for arc in self.graph.all_arcs() {
            if !self.graph.is_direct(arc) {
                continue;
            }
            max_out[self.graph.tail(arc)] += self.graph.capacity(arc) as i128;
            max_in[self.graph.head(arc)] += self.graph.capacity(arc) as i128;
        }
        for v in 0..n {
            let out_total = max_out[v] + self.supply[v].min(0).unsigned_abs() as i128;
            let in_total = max_in[v] + self.supply[v].max(0) as i128;
            if out_total > FlowQuantity::MAX as i128 || in_total > FlowQuantity::MAX as i128 {
                return false;
            }
        }
        true
    }

    pub fn solve(&mut self) -> Status {
        let n = self.graph.num_nodes();
        let total_supply: i128 = self.supply.iter().map(|&s| s as i128).sum();
        if total_supply != 0 {
            debug!("total supply {total_supply} is non-zero, unbalanced instance");
            self.status = Status::Unbalanced;
            return self.status;
        }

        if !self.check_capacity_range() {
            self.status = Status::BadCapacityRange;
            return self.status;
        }

        if self.check_feasibility_enabled && !self.check_feasibility() {
            self.status = Status::Infeasible;
            return self.status;
        }

        self.cost_scale = if self.price_scaling_enabled { (n as CostValue) + 1 } else { 1 };
        let max_abs_cost = self
            .graph
            .all_arcs()
            .map(|a| self.graph.cost(a).unsigned_abs())
            .max()
            .unwrap_or(0);
        let Some(scaled_max) = (max_abs_cost as CostValue).checked_mul(self.cost_scale) else {
            self.status = Status::BadCostRange;
            return self.status;
        };
        for arc in self.graph.all_arcs() {
            let Some(scaled) = self.graph.cost(arc).checked_mul(self.cost_scale) else {
                self.status = Status::BadCostRange;
                return self.status;
            };
            self.scaled_cost[arc] = scaled;
        }

        // Reseed excess from the flow already sitting on the graph (not
        // just the raw supply) so a re-solve after `set_arc_capacity` /
        // `set_arc_unit_cost` / `set_node_supply` starts from a consistent
        // pseudo-flow instead of assuming every arc starts at zero flow.
        self.potential.fill(0);
        for v in 0..n {
            let net_out: FlowQuantity = self.graph.outgoing_arcs(v).map(|a| self.graph.flow(a)).sum();
            self.excess[v] = self.supply[v] - net_out;
        }

        for arc in self.graph.all_arcs() {
            if !self.graph.is_direct(arc) {
                continue;
            }
            // Route as much as possible along negative-cost arcs up front so
            // early rounds start from a reasonable preflow instead of zero.
            if self.scaled_cost[arc] < 0 {
                let cap = self.graph.remaining_capacity(arc);
                if cap > 0 {
                    let tail = self.graph.tail(arc);
                    self.graph.push_flow(arc, cap);
                    self.excess[tail] -= cap;
                    self.excess[self.graph.head(arc)] += cap;
                }
            }
        }

        // Always run at least one round at epsilon == 1, even when costs are
        // all zero or already within [-1, 1] and the halving loop below
        // never executes — excess still needs routing to reach a feasible,
        // conservation-satisfying flow.
        self.epsilon = scaled_max.max(1);
        loop {
            self.epsilon = (self.epsilon / self.alpha).max(1);
            self.refine();
            if self.epsilon == 1 {
                break;
            }
        }

        self.status = if self.check_result() {
            Status::Optimal
        } else {
            Status::BadResult
        };
        debug!("min-cost-flow solved: status={:?}", self.status);
        self.status
    }

    /// One round of saturate-admissible / discharge-all-active at the
    /// current epsilon.
    fn refine(&mut self) {
        self.saturate_admissible_arcs();
        for v in 0..self.graph.num_nodes() {
            self.current_arc[v] = self.graph.outgoing_arcs(v).start;
        }
        let mut queue: VecDeque<NodeId> = (0..self.graph.num_nodes())
            .filter(|&v| self.excess[v] > 0)
            .collect();
        let mut in_queue = vec![false; self.graph.num_nodes()];
        for &v in &queue {
            in_queue[v] = true;
        }
        while let Some(v) = queue.pop_front() {
            in_queue[v] = false;
            if self.excess[v] <= 0 {
                continue;
            }
            self.discharge(v, &mut queue, &mut in_queue);
        }
    }

    fn saturate_admissible_arcs(&mut self) {
        for arc in self.graph.all_arcs() {
            if self.is_admissible(arc) {
                let cap = self.graph.remaining_capacity(arc);
                let tail = self.graph.tail(arc);
                let head = self.graph.head(arc);
                self.graph.push_flow(arc, cap);
                self.excess[tail] -= cap;
                self.excess[head] += cap;
            }
        }
    }

    fn has_admissible_out_arc(&self, v: NodeId) -> bool {
        self.graph.outgoing_arcs(v).any(|a| self.is_admissible(a))
    }

    fn discharge(&mut self, v: NodeId, queue: &mut VecDeque<NodeId>, in_queue: &mut [bool]) {
        let range = self.graph.outgoing_arcs(v);
        let (start, end) = (range.start, range.end);
        let mut arc = self.current_arc[v].clamp(start, end.max(start));
        while self.excess[v] > 0 {
            if arc >= end {
                self.relabel(v);
                arc = start;
                continue;
            }
            if self.is_admissible(arc) {
                // Push look-ahead: if the head has no admissible out-arc of
                // its own and wouldn't immediately start returning excess,
                // relabel it now rather than pushing into a node that
                // `discharge` would just have to relabel anyway on its next
                // turn. Relabeling it can make this very arc inadmissible
                // (its reduced cost only rises), so it's rechecked below.
                let head = self.graph.head(arc);
                if self.excess[head] >= 0 && !self.has_admissible_out_arc(head) {
                    self.relabel(head);
                }
                if !self.is_admissible(arc) {
                    arc += 1;
                    continue;
                }
                let delta = self.excess[v].min(self.graph.remaining_capacity(arc));
                self.graph.push_flow(arc, delta);
                self.excess[v] -= delta;
                let was_active = self.excess[head] > 0;
                self.excess[head] += delta;
                if !was_active && !in_queue[head] {
                    in_queue[head] = true;
                    queue.push_back(head);
                }
                if self.excess[v] == 0 {
                    break;
                }
            } else {
                arc += 1;
            }
        }
        self.current_arc[v] = arc;
    }

    /// `potential[v] = max over admissible-if-relabeled residual arcs of
    /// (potential[head] - cost[arc]) - epsilon`. Equivalently, the least
    /// increase that restores an admissible residual arc out of `v`.
    fn relabel(&mut self, v: NodeId) {
        let mut best = CostValue::MIN;
        for arc in self.graph.outgoing_arcs(v) {
            if self.graph.remaining_capacity(arc) > 0 {
                let head = self.graph.head(arc);
                let candidate = self.potential[head] - self.scaled_cost[arc];
                if candidate > best {
                    best = candidate;
                }
            }
        }
        if best != CostValue::MIN {
            self.potential[v] = best.saturating_sub(self.epsilon);
        } else {
            self.potential[v] = self.potential[v].saturating_sub(self.epsilon);
        }
        self.relabel_count += 1;
        let n = self.graph.num_nodes();
        if self.use_update_prices && n > 0 && self.relabel_count % n == 0 {
            self.update_prices();
        }
    }

    /// Global price update (Goldberg-Tarjan): BFS backward from every node
    /// with negative excess along reverse-admissible arcs, then lower every
    /// reached node's potential by the largest amount that keeps every arc
    /// leaving the reached set epsilon-optimal. Reached nodes are exactly
    /// those for which every relabel would otherwise have to climb one step
    /// at a time; this does it in one jump while provably preserving
    /// epsilon-optimality everywhere.
    fn update_prices(&mut self) {
        let n = self.graph.num_nodes();
        if n == 0 {
            return;
        }
        let mut reached = vec![false; n];
        let mut queue = VecDeque::new();
        for v in 0..n {
            if self.excess[v] < 0 {
                reached[v] = true;
                queue.push_back(v);
            }
        }
        while let Some(u) = queue.pop_front() {
            let arcs: Vec<ArcId> = self.graph.outgoing_arcs(u).collect();
            for arc in arcs {
                let rev = self.graph.opposite(arc);
                let x = self.graph.head(arc);
                if !reached[x] && self.graph.remaining_capacity(rev) > 0 && self.reduced_cost(rev) < 0 {
                    reached[x] = true;
                    queue.push_back(x);
                }
            }
        }

        let mut delta = CostValue::MAX;
        for arc in self.graph.all_arcs() {
            if self.graph.remaining_capacity(arc) <= 0 {
                continue;
            }
            let tail = self.graph.tail(arc);
            let head = self.graph.head(arc);
            if reached[tail] && !reached[head] {
                let bound = self.reduced_cost(arc) + self.epsilon;
                if bound < delta {
                    delta = bound;
                }
            }
        }
        if delta == CostValue::MAX || delta <= 0 {
            return;
        }
        for v in 0..n {
            if reached[v] {
                self.potential[v] = self.potential[v].saturating_sub(delta);
            }
        }
        debug!("global price update lowered {} node(s) by {delta}", reached.iter().filter(|&&r| r).count());
    }

    /// Whether the supplies/demands can be satisfied at all: probes via an
    /// ordinary max-flow from a synthesized super-source (one arc per
    /// positive-supply node) to a synthesized super-sink (one arc per
    /// negative-supply node), both of exactly the node's supply magnitude.
    /// Stashes the probe's flow value in `maximum_flow`.
    fn check_feasibility(&mut self) -> bool {
        let n = self.graph.num_nodes();
        let super_source = n;
        let super_sink = n + 1;
        let mut builder = FlowGraphBuilder::new();
        builder.reserve_nodes(n + 2);
        let mut total_positive: i128 = 0;
        for arc in self.graph.all_arcs() {
            if self.graph.is_direct(arc) {
                builder.add_arc(
                    self.graph.tail(arc),
                    self.graph.head(arc),
                    self.graph.capacity(arc),
                );
            }
        }
        for v in 0..n {
            if self.supply[v] > 0 {
                builder.add_arc(super_source, v, self.supply[v]);
                total_positive += self.supply[v] as i128;
            } else if self.supply[v] < 0 {
                builder.add_arc(v, super_sink, -self.supply[v]);
            }
        }
        let (graph, _) = builder.build();
        let mut probe = PushRelabel::new(graph, super_source, super_sink);
        probe.solve();
        self.maximum_flow = probe.optimal_flow();
        (probe.optimal_flow() as i128) == total_positive
    }

    /// Validates conservation (node excess equals supply for every node,
    /// after accounting for flow on incident arcs) and epsilon-optimality
    /// with epsilon == 1, which for integer reduced costs means every
    /// residual arc has reduced cost >= 0.
    fn check_result(&self) -> bool {
        for v in 0..self.graph.num_nodes() {
            let mut net_out = 0i128;
            for arc in self.graph.outgoing_arcs(v) {
                if self.graph.is_direct(arc) {
                    net_out += self.graph.flow(arc) as i128;
                } else {
                    net_out -= self.graph.flow(self.graph.opposite(arc)) as i128;
                }
            }
            if net_out != self.supply[v] as i128 {
                return false;
            }
        }
        for arc in self.graph.all_arcs() {
            if self.graph.remaining_capacity(arc) > 0 && self.reduced_cost(arc) < 0 {
                return false;
            }
        }
        true
    }

    /// Total cost of the current flow, in the caller's original (unscaled)
    /// cost units.
    pub fn get_optimal_cost(&self) -> i128 {
        let mut total = 0i128;
        for arc in self.graph.all_arcs() {
            if self.graph.is_direct(arc) {
                total += (self.graph.flow(arc) as i128) * (self.graph.cost(arc) as i128);
            }
        }
        total
    }
}

/// Builder-style min-cost-flow entry point, mirroring [`crate::push_relabel::SimpleMaxFlow`].
#[derive(Default)]
pub struct SimpleMinCostFlow {
    builder: FlowGraphBuilder,
    supply: Vec<FlowQuantity>,
    status: Status,
    maximum_flow: FlowQuantity,
    solved: Option<(MinCostFlow, Vec<ArcId>)>,
}

impl SimpleMinCostFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_arc_with_capacity_and_unit_cost(
        &mut self,
        tail: NodeId,
        head: NodeId,
        capacity: FlowQuantity,
        cost: CostValue,
    ) -> ArcId {
        self.solved = None;
        self.builder.add_arc_with_cost(tail, head, capacity, cost)
    }

    pub fn set_node_supply(&mut self, node: NodeId, supply: FlowQuantity) {
        self.solved = None;
        if self.supply.len() <= node {
            self.supply.resize(node + 1, 0);
        }
        self.builder.reserve_nodes(node + 1);
        self.supply[node] = supply;
    }

    pub fn solve(&mut self) -> Status {
        let builder = self.builder.clone();
        let (graph, permutation) = builder.build();
        let mut supply = self.supply.clone();
        supply.resize(graph.num_nodes(), 0);
        let mut solver = MinCostFlow::new(graph, supply);
        let status = solver.solve();
        self.maximum_flow = solver.maximum_flow();
        self.status = status;
        self.solved = Some((solver, permutation));
        status
    }

    /// Finds the maximum flow value achievable between `source` and `sink`,
    /// then re-solves for the cheapest flow realizing exactly that value.
    /// Since the resulting instance's supply was derived from the achieved
    /// max-flow value rather than supplied by the caller, success is
    /// reported as `Feasible` rather than `Optimal` — there was no original
    /// balanced supply/demand to be optimal *for*.
    pub fn solve_max_flow_with_min_cost(&mut self, source: NodeId, sink: NodeId) -> Status {
        let (max_flow_value, _cost, solver, permutation) =
            solve_max_flow_with_min_cost(&self.builder, source, sink);
        let status = match solver.status() {
            Status::Optimal => Status::Feasible,
            other => other,
        };
        self.maximum_flow = max_flow_value;
        self.status = status;
        self.solved = Some((solver, permutation));
        status
    }

    pub fn maximum_flow(&self) -> FlowQuantity {
        self.maximum_flow
    }

    fn solved(&self) -> &(MinCostFlow, Vec<ArcId>) {
        self.solved.as_ref().expect("solve() must be called first")
    }

    pub fn optimal_cost(&self) -> i128 {
        self.solved().0.get_optimal_cost()
    }

    pub fn flow(&self, arc: ArcId) -> FlowQuantity {
        let (solver, permutation) = self.solved();
        solver.flow(permutation[arc])
    }

    pub fn status(&self) -> Status {
        self.status
    }
}

/// Two-pass driver (component E): finds the maximum flow value achievable
/// between `source` and `sink`, then re-solves for the cheapest flow that
/// realizes exactly that value. `builder` is consumed via clone because two
/// distinct graphs (an augmented probe, and the real min-cost instance) are
/// built from the same raw arc set.
pub fn solve_max_flow_with_min_cost(
    builder: &FlowGraphBuilder,
    source: NodeId,
    sink: NodeId,
) -> (FlowQuantity, i128, MinCostFlow, Vec<ArcId>) {
    let probe_builder = builder.clone();
    let (probe_graph, _) = probe_builder.build();
    let mut probe = PushRelabel::new(probe_graph, source, sink);
    probe.solve();
    let max_flow_value = probe.optimal_flow();

    let mut real_builder = builder.clone();
    let n = real_builder.num_nodes();
    real_builder.reserve_nodes(n);
    let (graph, permutation) = real_builder.build();
    let mut supply = vec![0 as FlowQuantity; graph.num_nodes()];
    supply[source] += max_flow_value;
    supply[sink] -= max_flow_value;
    let mut solver = MinCostFlow::new(graph, supply);
    // The probe already establishes the achievable flow value; skip
    // re-probing feasibility for an instance built to be feasible by
    // construction.
    solver.set_check_feasibility(false);
    solver.maximum_flow = max_flow_value;
    solver.solve();
    let cost = solver.get_optimal_cost();
    (max_flow_value, cost, solver, permutation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow_graph::FlowGraphBuilder;

    #[test]
    fn four_by_four_assignment_cost() {
        // S3 from the spec: a 4x4 assignment problem with known optimal
        // cost 275. Left nodes 0-3, right nodes 4-7.
        let costs = [
            [90, 75, 75, 80],
            [35, 85, 55, 65],
            [125, 95, 90, 105],
            [45, 110, 95, 115],
        ];
        let mut builder = FlowGraphBuilder::new();
        for (l, row) in costs.iter().enumerate() {
            for (r, &c) in row.iter().enumerate() {
                builder.add_arc_with_cost(l, 4 + r, 1, c);
            }
        }
        let mut supply = vec![0i64; 8];
        for l in 0..4 {
            supply[l] = 1;
        }
        for r in 4..8 {
            supply[r] = -1;
        }
        let (graph, _) = builder.build();
        let mut solver = MinCostFlow::new(graph, supply);
        let status = solver.solve();
        assert_eq!(status, Status::Optimal);
        assert_eq!(solver.get_optimal_cost(), 275);
    }

    #[test]
    fn unbalanced_supply_is_rejected() {
        let mut builder = FlowGraphBuilder::new();
        builder.add_arc_with_cost(0, 1, 5, 1);
        let (graph, _) = builder.build();
        let mut solver = MinCostFlow::new(graph, vec![3, 0]);
        assert_eq!(solver.solve(), Status::Unbalanced);
    }

    #[test]
    fn infeasible_supply_is_detected() {
        let mut builder = FlowGraphBuilder::new();
        builder.add_arc_with_cost(0, 1, 2, 1);
        let (graph, _) = builder.build();
        let mut solver = MinCostFlow::new(graph, vec![5, -5]);
        assert_eq!(solver.solve(), Status::Infeasible);
    }

    #[test]
    fn zero_supply_zero_cost() {
        let mut builder = FlowGraphBuilder::new();
        builder.add_arc_with_cost(0, 1, 5, 7);
        let (graph, _) = builder.build();
        let mut solver = MinCostFlow::new(graph, vec![0, 0]);
        assert_eq!(solver.solve(), Status::Optimal);
        assert_eq!(solver.get_optimal_cost(), 0);
    }

    #[test]
    fn capacity_overflow_is_rejected() {
        let mut builder = FlowGraphBuilder::new();
        builder.add_arc_with_cost(0, 1, FlowQuantity::MAX, 1);
        builder.add_arc_with_cost(0, 1, FlowQuantity::MAX, 1);
        let (graph, _) = builder.build();
        let mut solver = MinCostFlow::new(graph, vec![0, 0]);
        assert_eq!(solver.solve(), Status::BadCapacityRange);
    }

    #[test]
    fn simple_min_cost_flow_wrapper_matches_assignment_cost() {
        let costs = [[90, 75, 75, 80], [35, 85, 55, 65], [125, 95, 90, 105], [45, 110, 95, 115]];
        let mut solver = SimpleMinCostFlow::new();
        for (l, row) in costs.iter().enumerate() {
            for (r, &c) in row.iter().enumerate() {
                solver.add_arc_with_capacity_and_unit_cost(l, 4 + r, 1, c);
            }
        }
        for l in 0..4 {
            solver.set_node_supply(l, 1);
        }
        for r in 4..8 {
            solver.set_node_supply(r, -1);
        }
        assert_eq!(solver.solve(), Status::Optimal);
        assert_eq!(solver.optimal_cost(), 275);
    }

    #[test]
    fn max_flow_with_min_cost_picks_cheapest_realization() {
        // Two parallel paths of equal capacity but different cost; the
        // driver must choose the max achievable flow value (2) and route it
        // entirely through the cheap path then overflow onto the costly one.
        let mut builder = FlowGraphBuilder::new();
        builder.add_arc_with_cost(0, 1, 1, 1);
        builder.add_arc_with_cost(0, 1, 1, 100);
        let (max_flow_value, cost, solver, _) = solve_max_flow_with_min_cost(&builder, 0, 1);
        assert_eq!(max_flow_value, 2);
        assert_eq!(cost, 101);
        assert_eq!(solver.status(), Status::Optimal);
    }

    #[test]
    fn simple_wrapper_max_flow_with_min_cost_reports_feasible() {
        let mut solver = SimpleMinCostFlow::new();
        solver.add_arc_with_capacity_and_unit_cost(0, 1, 1, 1);
        solver.add_arc_with_capacity_and_unit_cost(0, 1, 1, 100);
        let status = solver.solve_max_flow_with_min_cost(0, 1);
        assert_eq!(status, Status::Feasible);
        assert_eq!(solver.status(), Status::Feasible);
        assert_eq!(solver.maximum_flow(), 2);
        assert_eq!(solver.optimal_cost(), 101);
    }

    #[test]
    fn live_capacity_change_is_picked_up_on_resolve() {
        let mut builder = FlowGraphBuilder::new();
        let a = builder.add_arc_with_cost(0, 1, 10, 1);
        let (graph, permutation) = builder.build();
        let arc = permutation[a];
        let mut solver = MinCostFlow::new(graph, vec![10, -10]);
        assert_eq!(solver.solve(), Status::Optimal);
        assert_eq!(solver.flow(arc), 10);

        solver.set_arc_capacity(arc, 4);
        solver.set_node_supply(0, 4);
        solver.set_node_supply(1, -4);
        assert_eq!(solver.solve(), Status::Optimal);
        assert_eq!(solver.flow(arc), 4);
        assert_eq!(solver.get_optimal_cost(), 4);
    }

    #[test]
    fn update_prices_heuristic_still_reaches_optimum() {
        let costs = [
            [90, 75, 75, 80],
            [35, 85, 55, 65],
            [125, 95, 90, 105],
            [45, 110, 95, 115],
        ];
        let mut builder = FlowGraphBuilder::new();
        for (l, row) in costs.iter().enumerate() {
            for (r, &c) in row.iter().enumerate() {
                builder.add_arc_with_cost(l, 4 + r, 1, c);
            }
        }
        let mut supply = vec![0i64; 8];
        for l in 0..4 {
            supply[l] = 1;
        }
        for r in 4..8 {
            supply[r] = -1;
        }
        let (graph, _) = builder.build();
        let mut solver = MinCostFlow::new(graph, supply);
        solver.set_use_update_prices(true);
        assert_eq!(solver.solve(), Status::Optimal);
        assert_eq!(solver.get_optimal_cost(), 275);
    }
}
