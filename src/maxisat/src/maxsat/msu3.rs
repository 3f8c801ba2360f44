use {
    super::{
        base::{Attached, Context, Step, Strategy},
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

/// MSU3 (Marques-Silva & Planes), unweighted.
///
/// Soft clauses start inactive, their relaxation literal assumed false.
/// Each core activates its clauses: they join a cardinality constraint
/// "at most `lb` active clauses are falsified", and `lb` grows by one.
pub(crate) struct Msu3 {
    solver: Solver,
    encoder: Encoder,
    relax: Vec<Lit>,
    active: Vec<bool>,
    /// Assumed literal to soft clause
    soft_of: HashMap<Lit, usize>,
    /// Activated since the last update of the encoding
    pending: Vec<Lit>,
    iterative: bool,
}

impl Msu3 {
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
        let mut s = Msu3 {
            solver: ctx.rebuild_solver()?,
            encoder: ctx.config.encoder(),
            relax,
            active: vec![false; n],
            soft_of,
            pending: vec![],
            iterative: ctx.config.incremental == IncrementalStrategy::Iterative,
        };
        if s.iterative {
            let mut sink = Attached {
                formula: &mut *ctx.formula,
                solver: &mut s.solver,
            };
            s.encoder.build_cardinality(&mut sink, &[], 0)?;
        }
        Ok(s)
    }
}

impl Strategy for Msu3 {
    fn step(&mut self, ctx: &mut Context, handler: &mut dyn Handler) -> Result<Step> {
        let mut assumptions: Vec<Lit> = self
            .relax
            .iter()
            .zip(&self.active)
            .filter(|&(_, &a)| !a)
            .map(|(&r, _)| !r)
            .collect();
        if self.iterative {
            let mut sink = Attached {
                formula: &mut *ctx.formula,
                solver: &mut self.solver,
            };
            self.encoder.inc_update_cardinality(
                &mut sink,
                &self.pending,
                ctx.lb_cost,
                &mut assumptions,
            )?;
            self.pending.clear();
        }

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
        let n_active = self.active.iter().filter(|&&a| a).count() as u64;
        if core.is_empty() && ctx.lb_cost >= n_active {
            return Ok(Step::Done(MaxSatResult::Unsatisfiable));
        }
        let lb = ctx.lb_cost + 1;
        check_canceled!(ctx.raise_lower_bound(lb, handler));
        for i in core {
            self.active[i] = true;
            self.pending.push(self.relax[i]);
        }

        if !self.iterative {
            self.solver = ctx.rebuild_solver()?;
            self.encoder = ctx.config.encoder();
            let lits: Vec<Lit> = self
                .relax
                .iter()
                .zip(&self.active)
                .filter(|&(_, &a)| a)
                .map(|(&r, _)| r)
                .collect();
            let mut sink = Attached {
                formula: &mut *ctx.formula,
                solver: &mut self.solver,
            };
            self.encoder.encode_cardinality(&mut sink, &lits, lb);
            self.pending.clear();
        }
        Ok(Step::Continue)
    }
}
