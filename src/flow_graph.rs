//! A compact arc-indexed graph for flow problems.
//!
//! Unlike [`crate::static_graph::StaticGraph`], which stores one piece of
//! homogeneous data per arc, a flow arc carries several independently
//! mutated fields (capacity, flow, cost), and every algorithm that walks
//! this graph needs O(1) access to an arc's reverse. So `FlowGraph` keeps
//! its own CSR layout with an explicit `reverse` table rather than trying
//! to fit into the generic `Graph<T>` trait.
//!
//! Every arc a caller adds is paired with a synthesized reverse arc of zero
//! capacity. Arcs are renumbered internally (grouped by tail node for the
//! CSR layout), so [`FlowGraph`] is built through [`FlowGraphBuilder`],
//! which remembers the permutation from caller-supplied arc order to
//! internal arc id.

use crate::graph::NodeID as GenericNodeId;
use bitvec::vec::BitVec;

pub type NodeId = usize;
pub type ArcId = usize;
pub type FlowQuantity = i64;
pub type CostValue = i64;

pub const INVALID_NODE: NodeId = NodeId::MAX;
pub const INVALID_ARC: ArcId = ArcId::MAX;

/// One arc as supplied by a caller, before renumbering.
#[derive(Clone, Copy, Debug)]
struct RawArc {
    tail: NodeId,
    head: NodeId,
    capacity: FlowQuantity,
    cost: CostValue,
}

#[derive(Clone)]
pub struct FlowGraphBuilder {
    arcs: Vec<RawArc>,
    num_nodes: NodeId,
    detect_reverse: bool,
    sort_by_head: bool,
}

impl Default for FlowGraphBuilder {
    fn default() -> Self {
        Self {
            arcs: Vec::new(),
            num_nodes: 0,
            // Deviates from the documented `true` default: pairing up any
            // two caller arcs that happen to be mutual opposites would
            // silently fold anti-parallel edges (e.g. the textbook (v1,v2)
            // / (v2,v1) max-flow fixture) into a single reverse-pair,
            // changing the network's topology out from under callers who
            // added both directions on purpose. Off by default; callers who
            // want the space saving opt in explicitly.
            detect_reverse: false,
            sort_by_head: false,
        }
    }
}

impl FlowGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// See the type-level note on why this defaults to `false`.
    pub fn set_detect_reverse(&mut self, enabled: bool) {
        self.detect_reverse = enabled;
    }

    pub fn set_sort_by_head(&mut self, enabled: bool) {
        self.sort_by_head = enabled;
    }

    pub fn reserve_nodes(&mut self, additional: NodeId) {
        self.num_nodes = self.num_nodes.max(additional);
    }

    /// Adds an arc of zero cost, growing the node count as needed. Returns
    /// the arc's index in caller order (stable across `build()`).
    pub fn add_arc(&mut self, tail: NodeId, head: NodeId, capacity: FlowQuantity) -> ArcId {
        self.add_arc_with_cost(tail, head, capacity, 0)
    }

    pub fn add_arc_with_cost(
        &mut self,
        tail: NodeId,
        head: NodeId,
        capacity: FlowQuantity,
        cost: CostValue,
    ) -> ArcId {
        self.num_nodes = self.num_nodes.max(tail + 1).max(head + 1);
        self.arcs.push(RawArc {
            tail,
            head,
            capacity,
            cost,
        });
        self.arcs.len() - 1
    }

    pub fn num_nodes(&self) -> NodeId {
        self.num_nodes
    }

    pub fn num_arcs(&self) -> ArcId {
        self.arcs.len()
    }

    /// Consumes the builder, laying arcs out by tail node for O(1) outgoing
    /// iteration. Node/arc numbering inside the returned graph is internal;
    /// use the returned permutation to translate a caller-order arc index
    /// into an internal arc id (this is exactly what
    /// `arc_permutation_` does in the reference `SimpleMaxFlow`).
    pub fn build(self) -> (FlowGraph, Vec<ArcId>) {
        let num_direct = self.arcs.len();
        let num_nodes = self.num_nodes;

        // With reverse detection, a caller arc whose exact mutual opposite
        // was also added by the caller shares its partner's slot instead of
        // getting its own synthesized reverse; every other arc still gets
        // one. `paired_with[i]` holds the other direct arc's raw index.
        let mut paired_with: Vec<Option<usize>> = vec![None; num_direct];
        if self.detect_reverse && num_direct > 1 {
            let mut canonical_order: Vec<usize> = (0..num_direct).collect();
            canonical_order.sort_by_key(|&i| {
                let a = &self.arcs[i];
                (a.tail.min(a.head), a.tail.max(a.head))
            });
            let mut i = 0;
            while i + 1 < canonical_order.len() {
                let a = canonical_order[i];
                let b = canonical_order[i + 1];
                let (ra, rb) = (&self.arcs[a], &self.arcs[b]);
                let same_canonical =
                    ra.tail.min(ra.head) == rb.tail.min(rb.head) && ra.tail.max(ra.head) == rb.tail.max(rb.head);
                let opposite_orientation = ra.tail == rb.head && ra.head == rb.tail;
                if same_canonical && opposite_orientation {
                    paired_with[a] = Some(b);
                    paired_with[b] = Some(a);
                    i += 2;
                } else {
                    i += 1;
                }
            }
        }
        let num_synthesized = (0..num_direct).filter(|&i| paired_with[i].is_none()).count();
        let total = num_direct + num_synthesized;

        let mut old_tail = vec![0usize; total];
        let mut old_head = vec![0usize; total];
        let mut old_capacity = vec![0i64; total];
        let mut old_cost = vec![0i64; total];
        let mut old_is_direct = BitVec::repeat(false, total);
        let mut old_reverse_of = vec![0usize; total];

        for (i, arc) in self.arcs.iter().enumerate() {
            old_tail[i] = arc.tail;
            old_head[i] = arc.head;
            old_capacity[i] = arc.capacity;
            old_cost[i] = arc.cost;
            old_is_direct.set(i, true);
        }

        let mut next_synth = num_direct;
        for i in 0..num_direct {
            match paired_with[i] {
                Some(j) => old_reverse_of[i] = j,
                None => {
                    let r = next_synth;
                    next_synth += 1;
                    old_tail[r] = self.arcs[i].head;
                    old_head[r] = self.arcs[i].tail;
                    old_capacity[r] = 0;
                    old_cost[r] = -self.arcs[i].cost;
                    old_reverse_of[r] = i;
                    old_reverse_of[i] = r;
                }
            }
        }
        debug_assert_eq!(next_synth, total);

        // Stable sort by tail (optionally then by head) to group arcs into
        // a CSR layout; ties otherwise keep their relative (direct before
        // synthesized-reverse, insertion) order.
        let mut order: Vec<usize> = (0..total).collect();
        if self.sort_by_head {
            order.sort_by_key(|&old| (old_tail[old], old_head[old]));
        } else {
            order.sort_by_key(|&old| old_tail[old]);
        }

        let mut old_to_new = vec![0usize; total];
        for (new_pos, &old) in order.iter().enumerate() {
            old_to_new[old] = new_pos;
        }

        let mut first_outgoing = vec![0usize; num_nodes + 1];
        for &old in &order {
            first_outgoing[old_tail[old] + 1] += 1;
        }
        for n in 0..num_nodes {
            first_outgoing[n + 1] += first_outgoing[n];
        }

        let mut head = vec![0usize; total];
        let mut tail = vec![0usize; total];
        let mut capacity = vec![0i64; total];
        let mut flow = vec![0i64; total];
        let mut cost = vec![0i64; total];
        let mut reverse = vec![0usize; total];
        let mut is_direct = BitVec::repeat(false, total);

        for (new_pos, &old) in order.iter().enumerate() {
            head[new_pos] = old_head[old];
            tail[new_pos] = old_tail[old];
            capacity[new_pos] = old_capacity[old];
            cost[new_pos] = old_cost[old];
            is_direct.set(new_pos, old_is_direct[old]);
            reverse[new_pos] = old_to_new[old_reverse_of[old]];
        }

        let direct_arc_internal_id: Vec<ArcId> = (0..num_direct).map(|i| old_to_new[i]).collect();

        let graph = FlowGraph {
            num_nodes,
            num_direct_arcs: num_direct,
            first_outgoing,
            head,
            tail,
            reverse,
            is_direct,
            capacity,
            flow,
            cost,
        };
        (graph, direct_arc_internal_id)
    }
}

/// Arc-indexed flow network: every arc has a synthesized reverse at
/// `opposite(arc)`, reachable in O(1).
pub struct FlowGraph {
    num_nodes: NodeId,
    num_direct_arcs: ArcId,
    first_outgoing: Vec<ArcId>,
    head: Vec<NodeId>,
    tail: Vec<NodeId>,
    reverse: Vec<ArcId>,
    is_direct: BitVec,
    capacity: Vec<FlowQuantity>,
    flow: Vec<FlowQuantity>,
    cost: Vec<CostValue>,
}

impl FlowGraph {
    pub fn num_nodes(&self) -> NodeId {
        self.num_nodes
    }

    /// Number of direct (caller-added) arcs. Total internal arc count,
    /// counting synthesized reverses, is twice this.
    pub fn num_arcs(&self) -> ArcId {
        self.num_direct_arcs
    }

    /// Every internal arc slot, direct arcs and their synthesized reverses
    /// alike. Solvers that need to walk the whole residual graph (e.g. to
    /// total up a cost, or to rescale every arc) iterate this instead of
    /// `num_arcs()`, which only counts caller-visible direct arcs.
    pub fn all_arcs(&self) -> std::ops::Range<ArcId> {
        0..self.num_all_arcs()
    }

    pub fn num_all_arcs(&self) -> ArcId {
        2 * self.num_direct_arcs
    }

    pub fn outgoing_arcs(&self, node: NodeId) -> std::ops::Range<ArcId> {
        self.first_outgoing[node]..self.first_outgoing[node + 1]
    }

    pub fn head(&self, arc: ArcId) -> NodeId {
        self.head[arc]
    }

    pub fn tail(&self, arc: ArcId) -> NodeId {
        self.tail[arc]
    }

    pub fn opposite(&self, arc: ArcId) -> ArcId {
        self.reverse[arc]
    }

    pub fn is_direct(&self, arc: ArcId) -> bool {
        self.is_direct[arc]
    }

    pub fn capacity(&self, arc: ArcId) -> FlowQuantity {
        self.capacity[arc]
    }

    pub fn flow(&self, arc: ArcId) -> FlowQuantity {
        self.flow[arc]
    }

    pub fn cost(&self, arc: ArcId) -> CostValue {
        self.cost[arc]
    }

    /// Sets `arc`'s unit cost, keeping the reverse arc's cost as its
    /// negation (`cost[reverse(a)] == -cost[a]` is an invariant).
    pub fn set_cost(&mut self, arc: ArcId, cost: CostValue) {
        self.cost[arc] = cost;
        let rev = self.reverse[arc];
        self.cost[rev] = -cost;
    }

    pub fn remaining_capacity(&self, arc: ArcId) -> FlowQuantity {
        self.capacity[arc] - self.flow[arc]
    }

    pub fn is_admissible(&self, arc: ArcId) -> bool {
        self.remaining_capacity(arc) > 0
    }

    /// Pushes `delta` units of flow across `arc`, adjusting the reverse arc
    /// to keep the residual graph consistent. Does not touch node excess;
    /// callers own that bookkeeping.
    pub fn push_flow(&mut self, arc: ArcId, delta: FlowQuantity) {
        debug_assert!(delta <= self.remaining_capacity(arc));
        self.flow[arc] += delta;
        let rev = self.reverse[arc];
        self.flow[rev] -= delta;
    }

    /// Changes `arc`'s capacity, adjusting live flow if the new capacity is
    /// below the current flow on the arc. Returns the excess that the
    /// caller must move onto `(tail, head)` of `arc` (positive meaning
    /// excess flows into tail, out of head) when flow had to be clipped.
    pub fn set_capacity(&mut self, arc: ArcId, new_capacity: FlowQuantity) -> Option<FlowQuantity> {
        debug_assert!(new_capacity >= 0);
        let current_flow = self.flow[arc];
        self.capacity[arc] = new_capacity;
        if current_flow <= new_capacity {
            return None;
        }
        let flow_excess = current_flow - new_capacity;
        self.flow[arc] = new_capacity;
        let rev = self.reverse[arc];
        self.flow[rev] = -new_capacity;
        Some(flow_excess)
    }
}

/// Converts a `FlowGraph`'s node numbering into the generic [`NodeID`]
/// space used by [`crate::graph::Graph`], for modules that bridge the two.
pub fn as_generic_node(node: NodeId) -> GenericNodeId {
    node
}
