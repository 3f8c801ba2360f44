use {
    super::{
        base::{sync_vars, Attached, Context, SoftClause, Step, Strategy},
        MaxSatResult, MaxSatStats,
    },
    crate::{
        callbacks::Handler,
        clause::Lit,
        core::{SolveResult, Solver},
        encodings::{ClauseSink, Encoder},
        error::Result,
        interface::SolverInterface,
    },
    std::collections::{BTreeMap, HashMap, HashSet},
};

/// Weighted Boolean optimization (Manquinho, Marques-Silva & Planes),
/// a weighted Fu & Malik.
///
/// Each soft clause carries an assumption literal. A core of weight `w`
/// (its lightest clause) raises `lb` by `w`; heavier clauses of the core
/// are split in two, and the part of weight `w` of every clause gets a
/// new relaxation literal, at most one of which can be true.
///
/// Clauses are only active once their weight reaches the stratification
/// threshold. The incremental variant keeps one solver for the whole
/// search instead of rebuilding it after each core.
pub(crate) struct Wbo {
    incremental: bool,
    solver: Solver,
    encoder: Encoder,
    threshold: u64,
    n_cores: usize,
    /// Relaxation literals of each fully relaxed clause, with their core
    history: HashMap<usize, Vec<(usize, Lit)>>,
    /// Symmetry breaking clauses already added, as pairs of variables
    symmetries: HashSet<(u32, u32)>,
}

impl Wbo {
    pub(crate) fn new(ctx: &mut Context, incremental: bool) -> Result<Self> {
        for i in 0..ctx.formula.soft.len() {
            let a = ctx.formula.new_lit();
            ctx.formula.soft[i].assumption = a;
        }
        Ok(Wbo {
            incremental,
            solver: ctx.rebuild_solver()?,
            encoder: ctx.config.encoder(),
            threshold: ctx.first_weight(),
            n_cores: 0,
            history: HashMap::new(),
            symmetries: HashSet::new(),
        })
    }

    /// Split or relax every clause of `core`, whose weight is `w`.
    fn relax_core(&mut self, ctx: &mut Context, core: &[usize], w: u64) {
        let core_id = self.n_cores;
        self.n_cores += 1;
        let mut new_relax = Vec::with_capacity(core.len());
        let mut relaxed = vec![];
        for &i in core {
            let p = ctx.formula.new_lit();
            let a = ctx.formula.new_lit();
            new_relax.push(p);
            let soft = &mut ctx.formula.soft[i];
            if soft.weight > w {
                // the part shares the relaxation literals recorded so far
                self.history.remove(&i);
                soft.weight -= w;
                let mut part = SoftClause::new(soft.clause.clone(), w);
                part.relaxation = soft.relaxation.clone();
                part.relaxation.push(p);
                part.assumption = a;
                if self.incremental {
                    sync_vars(&mut self.solver, ctx.formula.n_vars);
                    self.solver.add_clause(&part.relaxed());
                }
                ctx.formula.soft.push(part);
            } else {
                let old = soft.assumption;
                soft.relaxation.push(p);
                soft.assumption = a;
                if self.incremental {
                    let c = soft.relaxed();
                    sync_vars(&mut self.solver, ctx.formula.n_vars);
                    self.solver.add_clause(&[old]);
                    self.solver.add_clause(&c);
                }
                self.history.entry(i).or_insert_with(Vec::new).push((core_id, p));
                relaxed.push(i);
            }
        }

        let mut attached;
        let sink: &mut dyn ClauseSink = if self.incremental {
            attached = Attached {
                formula: &mut *ctx.formula,
                solver: &mut self.solver,
            };
            &mut attached
        } else {
            &mut *ctx.formula
        };
        self.encoder.encode_amo(sink, &new_relax);
        if ctx.config.symmetry {
            break_symmetries(
                sink,
                &self.history,
                &relaxed,
                &mut self.symmetries,
                &mut ctx.stats,
                ctx.config.symmetry_limit,
            );
        }
    }
}

/// For two clauses relaxed together in an earlier core and in this one,
/// forbid the first one's earlier relaxation together with the second
/// one's new relaxation: the swapped assignment is equivalent.
fn break_symmetries(
    sink: &mut dyn ClauseSink,
    history: &HashMap<usize, Vec<(usize, Lit)>>,
    relaxed: &[usize],
    seen: &mut HashSet<(u32, u32)>,
    stats: &mut MaxSatStats,
    limit: u64,
) {
    let mut earlier: BTreeMap<usize, Vec<Lit>> = BTreeMap::new();
    let mut current: BTreeMap<usize, Vec<Lit>> = BTreeMap::new();
    for i in relaxed {
        let h = match history.get(i) {
            Some(h) if h.len() > 1 => h,
            _ => continue,
        };
        let (_, now) = h[h.len() - 1];
        for &(c, r) in &h[..h.len() - 1] {
            earlier.entry(c).or_insert_with(Vec::new).push(r);
            current.entry(c).or_insert_with(Vec::new).push(now);
        }
    }
    for (c, old) in &earlier {
        let cur = &current[c];
        for x in 0..old.len() {
            for y in x + 1..cur.len() {
                if stats.symmetry_clauses >= limit {
                    return;
                }
                let (a, b) = (old[x].var().idx(), cur[y].var().idx());
                if seen.insert((a.min(b), a.max(b))) {
                    sink.emit(&[!old[x], !cur[y]]);
                    stats.symmetry_clauses += 1;
                }
            }
        }
    }
}

impl Strategy for Wbo {
    fn step(&mut self, ctx: &mut Context, handler: &mut dyn Handler) -> Result<Step> {
        sync_vars(&mut self.solver, ctx.formula.n_vars);
        let mut soft_of = HashMap::new();
        let mut assumptions = vec![];
        for (i, s) in ctx.formula.soft.iter().enumerate() {
            // assumption literals only occur in their own soft clause
            self.solver.set_selector(s.assumption.var());
            if s.weight >= self.threshold {
                assumptions.push(!s.assumption);
                soft_of.insert(!s.assumption, i);
            }
        }

        let sat = sat_or_return!(ctx.solve(&mut self.solver, &assumptions, handler)?);
        if sat {
            check_canceled!(ctx.new_model(&self.solver, handler));
            if ctx.closed() {
                return Ok(Step::Done(ctx.optimum()));
            }
            return Ok(match ctx.next_weight(self.threshold) {
                Some(w) => {
                    debug!("wbo.threshold {}", w);
                    self.threshold = w;
                    Step::Continue
                }
                None => Step::Done(ctx.optimum()),
            });
        }

        let core: Vec<usize> = self
            .solver
            .unsat_core()
            .iter()
            .filter_map(|l| soft_of.get(l).cloned())
            .collect();
        if core.is_empty() {
            return Ok(Step::Done(MaxSatResult::Unsatisfiable));
        }
        ctx.record_core(core.len());
        let w = core
            .iter()
            .map(|&i| ctx.formula.soft[i].weight)
            .min()
            .unwrap_or(1);
        let lb = ctx.lb_cost + w;
        check_canceled!(ctx.raise_lower_bound(lb, handler));
        self.relax_core(ctx, &core, w);
        if ctx.closed() {
            return Ok(Step::Done(ctx.optimum()));
        }
        if !self.incremental {
            self.solver = ctx.rebuild_solver()?;
        }
        Ok(Step::Continue)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::clause::Var;

    fn lit(i: u32) -> Lit {
        Lit::new(Var::from_idx(i), true)
    }

    #[test]
    fn test_symmetry_clauses() {
        // clauses 0 and 1 were relaxed together in core 0, and again now
        let mut history = HashMap::new();
        history.insert(0, vec![(0, lit(10)), (1, lit(12))]);
        history.insert(1, vec![(0, lit(11)), (1, lit(13))]);
        let mut f = super::super::base::Formula::default();
        let mut seen = HashSet::new();
        let mut stats = MaxSatStats::default();
        break_symmetries(&mut f, &history, &[0, 1], &mut seen, &mut stats, 100);
        assert_eq!(f.hard, vec![vec![!lit(10), !lit(13)]]);
        assert_eq!(stats.symmetry_clauses, 1);

        // no duplicates, and the limit holds
        break_symmetries(&mut f, &history, &[0, 1], &mut seen, &mut stats, 100);
        assert_eq!(f.hard.len(), 1);
        let mut seen = HashSet::new();
        break_symmetries(&mut f, &history, &[0, 1], &mut seen, &mut stats, 1);
        assert_eq!(f.hard.len(), 1);
    }
}
