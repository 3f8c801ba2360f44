use {
    super::{
        base::{model_of, Attached, Context, Step, Strategy},
        MaxSatResult,
    },
    crate::{
        callbacks::Handler,
        clause::Lit,
        core::{SolveResult, Solver},
        encodings::Encoder,
        error::Result,
    },
};

/// Linear search from above: every model found tightens the bound on
/// the relaxation variables to strictly below its cost, until the
/// solver answers UNSAT.
///
/// When the weights allow it, the weight levels are optimized one at a
/// time, heaviest first, each level's optimum being fixed before moving
/// to the next one.
pub(crate) struct LinearSu {
    solver: Solver,
    encoder: Encoder,
    /// One relaxation literal per soft clause
    relax: Vec<Lit>,
    weights: Vec<u64>,
    weighted: bool,
    found: bool,
    /// Weight levels, heaviest first; empty unless optimizing lexicographically
    levels: Vec<u64>,
    level: usize,
    level_best: Option<u64>,
    /// Relaxation literals of each finished level, with its optimum
    fixed: Vec<(Vec<Lit>, u64)>,
}

impl LinearSu {
    pub(crate) fn new(ctx: &mut Context, weighted: bool) -> Result<Self> {
        let mut relax = Vec::with_capacity(ctx.formula.soft.len());
        for i in 0..ctx.formula.soft.len() {
            let r = ctx.formula.new_lit();
            ctx.formula.soft[i].relaxation.push(r);
            relax.push(r);
        }
        let weights = ctx.formula.soft.iter().map(|s| s.weight).collect();
        let levels = if weighted && ctx.config.bmo && ctx.formula.is_bmo() {
            debug!("linear_su.bmo");
            ctx.formula.weights_desc()
        } else {
            vec![]
        };
        Ok(LinearSu {
            solver: ctx.rebuild_solver()?,
            encoder: ctx.config.encoder(),
            relax,
            weights,
            weighted,
            found: false,
            levels,
            level: 0,
            level_best: None,
            fixed: vec![],
        })
    }

    /// Relaxation literals of the soft clauses of weight `w`.
    fn level_lits(&self, w: u64) -> Vec<Lit> {
        self.relax
            .iter()
            .zip(&self.weights)
            .filter(|&(_, &sw)| sw == w)
            .map(|(&r, _)| r)
            .collect()
    }

    fn step_normal(&mut self, ctx: &mut Context, handler: &mut dyn Handler) -> Result<Step> {
        let sat = sat_or_return!(ctx.solve(&mut self.solver, &[], handler)?);
        if !sat {
            return Ok(Step::Done(if self.found {
                ctx.optimum()
            } else {
                MaxSatResult::Unsatisfiable
            }));
        }
        self.found = true;
        check_canceled!(ctx.new_model(&self.solver, handler));
        let ub = ctx.ub_cost.unwrap_or(0);
        if ub == 0 {
            return Ok(Step::Done(ctx.optimum()));
        }

        let mut sink = Attached {
            formula: &mut *ctx.formula,
            solver: &mut self.solver,
        };
        if self.weighted {
            if self.encoder.has_pb_encoding() {
                self.encoder.update_pb(&mut sink, ub - 1)?;
            } else {
                self.encoder.encode_pb(&mut sink, &self.relax, &self.weights, ub - 1)?;
            }
        } else if self.encoder.has_cardinality_encoding() {
            self.encoder.update_cardinality(&mut sink, ub - 1)?;
        } else {
            self.encoder.encode_cardinality(&mut sink, &self.relax, ub - 1);
        }
        Ok(Step::Continue)
    }

    fn step_bmo(&mut self, ctx: &mut Context, handler: &mut dyn Handler) -> Result<Step> {
        let w = self.levels[self.level];
        let sat = sat_or_return!(ctx.solve(&mut self.solver, &[], handler)?);
        if !sat && !self.found {
            return Ok(Step::Done(MaxSatResult::Unsatisfiable));
        }
        if sat {
            self.found = true;
            check_canceled!(ctx.new_model(&self.solver, handler));
            let level_cost = ctx.formula.cost(&model_of(&self.solver), Some(w)) / w;
            trace!("linear_su.level weight={} cost={}", w, level_cost);
            if level_cost > 0 {
                self.level_best = Some(level_cost);
                let lits = self.level_lits(w);
                let mut sink = Attached {
                    formula: &mut *ctx.formula,
                    solver: &mut self.solver,
                };
                if self.encoder.has_cardinality_encoding() {
                    self.encoder.update_cardinality(&mut sink, level_cost - 1)?;
                } else {
                    self.encoder.encode_cardinality(&mut sink, &lits, level_cost - 1);
                }
                return Ok(Step::Continue);
            }
            self.level_best = Some(0);
        }

        // this level is optimal, fix it and move on
        let best = self.level_best.take().unwrap_or(0);
        self.fixed.push((self.level_lits(w), best));
        self.level += 1;
        if self.level == self.levels.len() || ctx.ub_cost == Some(0) {
            return Ok(Step::Done(ctx.optimum()));
        }
        self.solver = ctx.rebuild_solver()?;
        self.encoder = ctx.config.encoder();
        for (lits, bound) in &self.fixed {
            let mut sink = Attached {
                formula: &mut *ctx.formula,
                solver: &mut self.solver,
            };
            ctx.config.encoder().encode_cardinality(&mut sink, lits, *bound);
        }
        Ok(Step::Continue)
    }
}

impl Strategy for LinearSu {
    fn step(&mut self, ctx: &mut Context, handler: &mut dyn Handler) -> Result<Step> {
        if self.levels.is_empty() {
            self.step_normal(ctx, handler)
        } else {
            self.step_bmo(ctx, handler)
        }
    }
}
