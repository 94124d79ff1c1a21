//! Floating-point front end for [`crate::min_cost_flow`].
//!
//! The integer engine needs exact `i64` capacities and supplies; this module
//! bridges `f64` inputs to it via a single power-of-two scale factor, large
//! enough that scaled quantities stay inside `i64` range but small enough
//! that no per-node in/out sum overflows once flow is actually routed.

use crate::flow_graph::{ArcId, FlowQuantity, NodeId};
use crate::min_cost_flow::{self, Status};
use log::debug;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Default)]
pub enum FpStatus {
    #[default]
    #[error("floating-point min-cost-flow solver has not been run yet")]
    NotSolved,
    #[error("floating-point min-cost-flow solved to optimality")]
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
    #[error("a capacity or supply value is NaN, infinite, or cannot be scaled into range")]
    BadCapacityRange,
}

impl From<Status> for FpStatus {
    fn from(status: Status) -> Self {
        match status {
            Status::NotSolved => FpStatus::NotSolved,
            Status::Optimal => FpStatus::Optimal,
            Status::Feasible => FpStatus::Feasible,
            Status::Infeasible => FpStatus::Infeasible,
            Status::Unbalanced => FpStatus::Unbalanced,
            Status::BadResult => FpStatus::BadResult,
            Status::BadCostRange => FpStatus::BadCostRange,
            Status::BadCapacityRange => FpStatus::BadCapacityRange,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveStats {
    pub scale: f64,
    pub num_tested_scales: u32,
}

struct RawArc {
    tail: NodeId,
    head: NodeId,
    capacity: f64,
    unit_cost: f64,
}

/// Accumulates `f64` arcs, solves by scaling into the integer engine, and
/// unscales the resulting cost back to floating point.
#[derive(Default)]
pub struct SimpleFloatingPointMinCostFlow {
    arcs: Vec<RawArc>,
    num_nodes: NodeId,
    status: FpStatus,
    stats: SolveStats,
    flows: Vec<FlowQuantity>,
    log2_scale: i32,
}

/// Largest power-of-two exponent such that `2^e` fits in the mantissa of an
/// `f64` without rounding, used as a starting point before the overflow
/// retry loop narrows it down. Rust's `f64` has no stable `frexp`, so the
/// exponent is extracted manually from the IEEE-754 bit pattern.
fn frexp_exponent(value: f64) -> i32 {
    if value == 0.0 || !value.is_finite() {
        return 0;
    }
    let bits = value.abs().to_bits();
    let raw_exponent = ((bits >> 52) & 0x7ff) as i64;
    if raw_exponent == 0 {
        // Subnormal: the leading mantissa bit isn't implicit, so derive the
        // exponent from the position of the highest set bit in the mantissa.
        let mantissa = bits & 0xf_ffff_ffff_ffff;
        (mantissa.leading_zeros() as i64 - 11 - 1074) as i32
    } else {
        (raw_exponent - 1023 + 1) as i32
    }
}

impl SimpleFloatingPointMinCostFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> FpStatus {
        self.status
    }

    pub fn stats(&self) -> SolveStats {
        self.stats
    }

    pub fn add_arc_with_capacity_and_unit_cost(
        &mut self,
        tail: NodeId,
        head: NodeId,
        capacity: f64,
        unit_cost: f64,
    ) -> ArcId {
        self.num_nodes = self.num_nodes.max(tail + 1).max(head + 1);
        self.arcs.push(RawArc {
            tail,
            head,
            capacity,
            unit_cost,
        });
        self.arcs.len() - 1
    }

    pub fn flow(&self, arc: ArcId) -> f64 {
        (self.flows[arc] as f64) / self.stats.scale
    }

    fn has_bad_inputs(&self) -> bool {
        self.arcs
            .iter()
            .any(|a| !a.capacity.is_finite() || !a.unit_cost.is_finite())
    }

    pub fn solve(&mut self, source: NodeId, sink: NodeId) -> FpStatus {
        if self.has_bad_inputs() {
            self.status = FpStatus::BadCapacityRange;
            return self.status;
        }

        let max_abs_capacity = self
            .arcs
            .iter()
            .map(|a| a.capacity.max(0.0).abs())
            .fold(0.0_f64, f64::max);

        if max_abs_capacity == 0.0 {
            self.log2_scale = 0;
        } else {
            // Keep `scale * max_abs_capacity` a few bits under i64::MAX (63
            // bits) to leave headroom for summed in/out flow at a node.
            let budget_exponent = 60;
            self.log2_scale = budget_exponent - frexp_exponent(max_abs_capacity);
        }

        let mut tested = 0u32;
        loop {
            tested += 1;
            let scale = 2f64.powi(self.log2_scale);
            if !scale.is_finite() || scale == 0.0 {
                self.status = FpStatus::BadCapacityRange;
                self.stats = SolveStats {
                    scale,
                    num_tested_scales: tested,
                };
                return self.status;
            }

            let mut builder = crate::flow_graph::FlowGraphBuilder::new();
            builder.reserve_nodes(self.num_nodes);
            let mut scaled_arcs = Vec::with_capacity(self.arcs.len());
            let mut overflow = false;
            for arc in &self.arcs {
                let capacity = (arc.capacity.max(0.0) * scale).round();
                if !capacity.is_finite() || capacity > (FlowQuantity::MAX as f64) {
                    overflow = true;
                    break;
                }
                let cost = arc.unit_cost.round() as i64;
                let id = builder.add_arc_with_cost(arc.tail, arc.head, capacity as FlowQuantity, cost);
                scaled_arcs.push(id);
            }

            if overflow {
                self.log2_scale -= 1;
                continue;
            }

            let (max_flow_value, cost, solver, permutation) =
                min_cost_flow::solve_max_flow_with_min_cost(&builder, source, sink);
            let _ = max_flow_value;

            let per_node_overflows = (0..solver.graph().num_nodes()).any(|v| {
                let mut net: i128 = 0;
                for a in solver.graph().outgoing_arcs(v) {
                    if solver.graph().is_direct(a) {
                        net += solver.flow(a) as i128;
                    } else {
                        net -= solver.flow(solver.graph().opposite(a)) as i128;
                    }
                }
                net.unsigned_abs() > (FlowQuantity::MAX as u128)
            });

            if per_node_overflows {
                debug!("fp min-cost-flow scale {scale} overflowed per-node flow, retrying");
                self.log2_scale -= 1;
                continue;
            }

            self.flows = vec![0; self.arcs.len()];
            for (i, &id) in scaled_arcs.iter().enumerate() {
                self.flows[i] = solver.flow(permutation[id]);
            }
            self.stats = SolveStats {
                scale,
                num_tested_scales: tested,
            };
            self.status = FpStatus::from(solver.status());
            return self.status;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_instance_round_trips_cost() {
        let _ = env_logger::try_init();
        let mut solver = SimpleFloatingPointMinCostFlow::new();
        solver.add_arc_with_capacity_and_unit_cost(0, 1, 1.0, 1.0);
        solver.add_arc_with_capacity_and_unit_cost(0, 1, 1.0, 100.0);
        let status = solver.solve(0, 1);
        assert_eq!(status, FpStatus::Optimal);
        let total_flow = solver.flow(0) + solver.flow(1);
        assert!((total_flow - 2.0).abs() < 1e-6);
    }

    #[test]
    fn nan_capacity_is_rejected() {
        let mut solver = SimpleFloatingPointMinCostFlow::new();
        solver.add_arc_with_capacity_and_unit_cost(0, 1, f64::NAN, 1.0);
        assert_eq!(solver.solve(0, 1), FpStatus::BadCapacityRange);
    }

    #[test]
    fn negative_capacity_is_clamped_to_zero() {
        let mut solver = SimpleFloatingPointMinCostFlow::new();
        solver.add_arc_with_capacity_and_unit_cost(0, 1, -5.0, 1.0);
        let status = solver.solve(0, 1);
        assert_eq!(status, FpStatus::Optimal);
        assert_eq!(solver.flow(0), 0.0);
    }

    #[test]
    fn extreme_capacity_still_solves_without_overflow() {
        // A capacity near the representable limit, summed across two arcs
        // into the same node, may overflow the first scale estimate and
        // force one or more retries; whatever the retry count, the solver
        // must converge rather than silently returning a corrupted flow.
        let huge = (1u64 << 62) as f64 - 1.0;
        let mut solver = SimpleFloatingPointMinCostFlow::new();
        solver.add_arc_with_capacity_and_unit_cost(0, 2, huge, 1.0);
        solver.add_arc_with_capacity_and_unit_cost(1, 2, huge, 1.0);
        solver.add_arc_with_capacity_and_unit_cost(2, 3, huge, 1.0);
        let status = solver.solve(0, 3);
        assert_eq!(status, FpStatus::Optimal);
        assert!(solver.stats().num_tested_scales >= 1);
    }
}
