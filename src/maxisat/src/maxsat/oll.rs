use {
    super::{
        base::{next_threshold, Attached, Context, Step, Strategy},
        MaxSatResult,
    },
    crate::{
        callbacks::Handler,
        clause::Lit,
        core::{SolveResult, Solver},
        encodings::Totalizer,
        error::Result,
        interface::SolverInterface,
    },
    std::collections::{BTreeMap, HashMap},
};

/// OLL (Andres, Kaufmann, Matheis & Schaub; Morgado, Dodaro &
/// Marques-Silva): core-guided search with soft cardinality constraints.
///
/// Every assumed literal has a weight. A core of weight `w` raises `lb`
/// by `w` and takes `w` off each of its literals. The negations of the
/// core literals are then counted by a new totalizer, and "at most one
/// of them" becomes a new soft literal of weight `w`. When a soft
/// totalizer bound "at most `k`" is itself in a core, "at most `k+1`"
/// takes over.
pub(crate) struct Oll {
    solver: Solver,
    /// Assumable literal and the weight left on it
    weights: BTreeMap<Lit, u64>,
    /// Totalizer bound literal, with the index of its totalizer and its bound
    bounds: HashMap<Lit, (usize, u64)>,
    totalizers: Vec<Totalizer>,
    threshold: u64,
}

impl Oll {
    pub(crate) fn new(ctx: &mut Context) -> Result<Self> {
        let mut weights = BTreeMap::new();
        for i in 0..ctx.formula.soft.len() {
            let r = ctx.formula.new_lit();
            ctx.formula.soft[i].relaxation.push(r);
            weights.insert(!r, ctx.formula.soft[i].weight);
        }
        Ok(Oll {
            solver: ctx.rebuild_solver()?,
            weights,
            bounds: HashMap::new(),
            totalizers: vec![],
            threshold: ctx.first_weight(),
        })
    }

    /// Take `w` off every literal of `core`, and add the soft
    /// cardinality constraints replacing it.
    fn relax_core(&mut self, ctx: &mut Context, core: &[Lit], w: u64) {
        let mut sink = Attached {
            formula: &mut *ctx.formula,
            solver: &mut self.solver,
        };
        let mut sum = Vec::with_capacity(core.len());
        for &l in core {
            match self.weights.get_mut(&l) {
                Some(lw) if *lw > w => *lw -= w,
                _ => {
                    self.weights.remove(&l);
                }
            }
            sum.push(!l);
            if let Some(&(t, k)) = self.bounds.get(&l) {
                let tot = &mut self.totalizers[t];
                if k + 1 < tot.num_inputs() as u64 {
                    tot.extend(&mut sink, k + 1);
                    if let Some(b) = tot.bound_lit(k + 1) {
                        self.bounds.insert(b, (t, k + 1));
                        *self.weights.entry(b).or_insert(0) += w;
                    }
                }
            }
        }
        if sum.len() > 1 {
            let mut tot = Totalizer::new();
            tot.build(&mut sink, &sum, 1);
            if let Some(b) = tot.bound_lit(1) {
                self.bounds.insert(b, (self.totalizers.len(), 1));
                *self.weights.entry(b).or_insert(0) += w;
            }
            self.totalizers.push(tot);
        }
        trace!("oll.totalizers {}", self.totalizers.len());
    }
}

impl Strategy for Oll {
    fn step(&mut self, ctx: &mut Context, handler: &mut dyn Handler) -> Result<Step> {
        let assumptions: Vec<Lit> = self
            .weights
            .iter()
            .filter(|&(_, &w)| w >= self.threshold)
            .map(|(&l, _)| l)
            .collect();

        let sat = sat_or_return!(ctx.solve(&mut self.solver, &assumptions, handler)?);
        if sat {
            check_canceled!(ctx.new_model(&self.solver, handler));
            if ctx.closed() {
                return Ok(Step::Done(ctx.optimum()));
            }
            let ws: Vec<u64> = self.weights.values().cloned().collect();
            return Ok(
                match next_threshold(ctx.config.weight_strategy, &ws, self.threshold) {
                    Some(w) => {
                        debug!("oll.threshold {}", w);
                        self.threshold = w;
                        Step::Continue
                    }
                    None => Step::Done(ctx.optimum()),
                },
            );
        }

        let core = self.solver.unsat_core().to_vec();
        if core.is_empty() {
            return Ok(Step::Done(MaxSatResult::Unsatisfiable));
        }
        ctx.record_core(core.len());
        let w = core
            .iter()
            .filter_map(|l| self.weights.get(l).cloned())
            .min()
            .unwrap_or(1);
        info!("oll.core size={} weight={}", core.len(), w);
        check_canceled!(ctx.raise_lower_bound(ctx.lb_cost + w, handler));
        self.relax_core(ctx, &core, w);
        if ctx.closed() {
            return Ok(Step::Done(ctx.optimum()));
        }
        Ok(Step::Continue)
    }
}
