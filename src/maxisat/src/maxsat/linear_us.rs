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
    },
};

/// Linear search from below, for unweighted instances: allow `lb`
/// falsified soft clauses, and raise `lb` on every UNSAT answer. The
/// first model is optimal.
pub(crate) struct LinearUs {
    solver: Solver,
    encoder: Encoder,
    relax: Vec<Lit>,
    iterative: bool,
}

impl LinearUs {
    pub(crate) fn new(ctx: &mut Context) -> Result<Self> {
        let mut relax = Vec::with_capacity(ctx.formula.soft.len());
        for i in 0..ctx.formula.soft.len() {
            let r = ctx.formula.new_lit();
            ctx.formula.soft[i].relaxation.push(r);
            relax.push(r);
        }
        let mut s = LinearUs {
            solver: ctx.rebuild_solver()?,
            encoder: ctx.config.encoder(),
            relax,
            iterative: ctx.config.incremental == IncrementalStrategy::Iterative,
        };
        let mut sink = Attached {
            formula: &mut *ctx.formula,
            solver: &mut s.solver,
        };
        if s.iterative {
            s.encoder.build_cardinality(&mut sink, &s.relax, 0)?;
        } else {
            s.encoder.encode_cardinality(&mut sink, &s.relax, 0);
        }
        Ok(s)
    }
}

impl Strategy for LinearUs {
    fn step(&mut self, ctx: &mut Context, handler: &mut dyn Handler) -> Result<Step> {
        let mut assumptions = vec![];
        if self.iterative {
            let mut sink = Attached {
                formula: &mut *ctx.formula,
                solver: &mut self.solver,
            };
            self.encoder
                .inc_update_cardinality(&mut sink, &[], ctx.lb_cost, &mut assumptions)?;
        }
        let sat = sat_or_return!(ctx.solve(&mut self.solver, &assumptions, handler)?);
        if sat {
            check_canceled!(ctx.new_model(&self.solver, handler));
            return Ok(Step::Done(ctx.optimum()));
        }

        // the bound is trivial once it reaches the number of soft clauses
        if ctx.lb_cost >= self.relax.len() as u64 {
            return Ok(Step::Done(MaxSatResult::Unsatisfiable));
        }
        let lb = ctx.lb_cost + 1;
        check_canceled!(ctx.raise_lower_bound(lb, handler));
        if !self.iterative {
            self.solver = ctx.rebuild_solver()?;
            self.encoder = ctx.config.encoder();
            let mut sink = Attached {
                formula: &mut *ctx.formula,
                solver: &mut self.solver,
            };
            self.encoder.encode_cardinality(&mut sink, &self.relax, lb);
        }
        Ok(Step::Continue)
    }
}
