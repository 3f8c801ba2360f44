use {
    super::{
        base::{next_subset_sum, Attached, Context, Step, Strategy},
        IncrementalStrategy, MaxSatResult,
    },
    crate::{
        callbacks::Handler,
        clause::Lit,
        core::{SolveResult, Solver},
        encodings::Encoder,
        error::Result,
        interface::SolverInterface,
    },
    std::collections::HashMap,
};

/// Weighted MSU3: active clauses are bounded by a pseudo-Boolean
/// constraint, and the lower bound jumps to the next weight the active
/// clauses can actually sum to.
pub(crate) struct Wmsu3 {
    solver: Solver,
    encoder: Encoder,
    relax: Vec<Lit>,
    weights: Vec<u64>,
    active: Vec<bool>,
    soft_of: HashMap<Lit, usize>,
    /// Assumptions enforcing the current bound
    bound: Vec<Lit>,
    iterative: bool,
}

impl Wmsu3 {
    pub(crate) fn new(ctx: &mut Context) -> Result<Self> {
        let n = ctx.formula.soft.len();
        let mut relax = Vec::with_capacity(n);
        let mut soft_of = HashMap::new();
        for i in 0..n {
            let r = ctx.formula.new_lit();
            ctx.formula.soft[i].relaxation.push(r);
            relax.push(r);
            soft_of.insert(!r, i);
        }
        Ok(Wmsu3 {
            solver: ctx.rebuild_solver()?,
            encoder: ctx.config.encoder(),
            relax,
            weights: ctx.formula.soft.iter().map(|s| s.weight).collect(),
            active: vec![false; n],
            soft_of,
            bound: vec![],
            iterative: ctx.config.incremental == IncrementalStrategy::Iterative,
        })
    }

    fn active_objective(&self) -> (Vec<Lit>, Vec<u64>) {
        (0..self.relax.len())
            .filter(|&i| self.active[i])
            .map(|i| (self.relax[i], self.weights[i]))
            .unzip()
    }
}

impl Strategy for Wmsu3 {
    fn step(&mut self, ctx: &mut Context, handler: &mut dyn Handler) -> Result<Step> {
        let mut assumptions: Vec<Lit> = self
            .relax
            .iter()
            .zip(&self.active)
            .filter(|&(_, &a)| !a)
            .map(|(&r, _)| !r)
            .collect();
        assumptions.extend_from_slice(&self.bound);

        let sat = sat_or_return!(ctx.solve(&mut self.solver, &assumptions, handler)?);
        if sat {
            check_canceled!(ctx.new_model(&self.solver, handler));
            return Ok(Step::Done(ctx.optimum()));
        }

        let core: Vec<usize> = self
            .solver
            .unsat_core()
            .iter()
            .filter_map(|l| self.soft_of.get(l).cloned())
            .collect();
        ctx.record_core(core.len());
        for i in core {
            self.active[i] = true;
        }
        let (lits, weights) = self.active_objective();
        let lb = match next_subset_sum(&weights, ctx.lb_cost + 1) {
            Some(lb) => lb,
            None => return Ok(Step::Done(MaxSatResult::Unsatisfiable)),
        };
        check_canceled!(ctx.raise_lower_bound(lb, handler));

        if self.iterative {
            // a fresh counter over the active clauses, the old ones are
            // only enforced by assumptions we no longer make
            self.bound.clear();
            let mut sink = Attached {
                formula: &mut *ctx.formula,
                solver: &mut self.solver,
            };
            self.encoder
                .inc_encode_pb(&mut sink, &lits, &weights, lb, &mut self.bound)?;
        } else {
            self.solver = ctx.rebuild_solver()?;
            self.encoder = ctx.config.encoder();
            let mut sink = Attached {
                formula: &mut *ctx.formula,
                solver: &mut self.solver,
            };
            self.encoder.encode_pb(&mut sink, &lits, &weights, lb)?;
        }
        Ok(Step::Continue)
    }
}
