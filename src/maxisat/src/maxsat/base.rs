//! State shared by the MaxSAT algorithms.

use {
    super::{MaxSatConfig, MaxSatResult, MaxSatStats, WeightStrategy},
    crate::{
        callbacks::{Event, Handler},
        clause::{lbool, Lit, Var},
        core::{SolveResult, Solver},
        encodings::ClauseSink,
        error::Result,
        interface::SolverInterface,
    },
    std::collections::BTreeSet,
};

/// A weighted soft clause, along with what the algorithms attached to it.
#[derive(Debug, Clone)]
pub(crate) struct SoftClause {
    pub(crate) clause: Vec<Lit>,
    pub(crate) weight: u64,
    /// Literals added to the clause to relax it
    pub(crate) relaxation: Vec<Lit>,
    /// Literal added to the clause whose negation is assumed, or `UNDEF`
    pub(crate) assumption: Lit,
}

impl SoftClause {
    pub(crate) fn new(clause: Vec<Lit>, weight: u64) -> Self {
        SoftClause {
            clause,
            weight,
            relaxation: vec![],
            assumption: Lit::UNDEF,
        }
    }

    /// The clause as given to the SAT solver.
    pub(crate) fn relaxed(&self) -> Vec<Lit> {
        let mut c = self.clause.clone();
        c.extend_from_slice(&self.relaxation);
        if self.assumption != Lit::UNDEF {
            c.push(self.assumption);
        }
        c
    }
}

/// Hard clauses, hard at-most constraints, and soft clauses.
#[derive(Debug, Clone, Default)]
pub(crate) struct Formula {
    pub(crate) n_vars: u32,
    pub(crate) hard: Vec<Vec<Lit>>,
    pub(crate) at_most: Vec<(Vec<Lit>, u32)>,
    pub(crate) soft: Vec<SoftClause>,
}

impl Formula {
    pub(crate) fn new_lit(&mut self) -> Lit {
        let v = Var::from_idx(self.n_vars);
        self.n_vars += 1;
        Lit::new(v, true)
    }

    /// Make sure `v` is a variable of the formula.
    pub(crate) fn reserve_var(&mut self, v: Var) {
        if v.idx() >= self.n_vars {
            self.n_vars = v.idx() + 1;
        }
    }

    pub(crate) fn sum_weights(&self) -> u64 {
        self.soft.iter().map(|s| s.weight).sum()
    }

    pub(crate) fn max_weight(&self) -> u64 {
        self.soft.iter().map(|s| s.weight).max().unwrap_or(0)
    }

    pub(crate) fn is_weighted(&self) -> bool {
        self.max_weight() > 1
    }

    /// Distinct weights, heaviest first.
    pub(crate) fn weights_desc(&self) -> Vec<u64> {
        let ws: BTreeSet<u64> = self.soft.iter().map(|s| s.weight).collect();
        ws.into_iter().rev().collect()
    }

    /// Does every weight exceed the sum of all the lighter soft clauses?
    pub(crate) fn is_bmo(&self) -> bool {
        let ws = self.weights_desc();
        ws.iter().all(|&w| {
            let lighter: u64 = self
                .soft
                .iter()
                .filter(|s| s.weight < w)
                .map(|s| s.weight)
                .sum();
            w > lighter
        })
    }

    /// Weight of the soft clauses falsified by `model`, only counting
    /// clauses of weight `only` if it is given.
    pub(crate) fn cost(&self, model: &[bool], only: Option<u64>) -> u64 {
        self.soft
            .iter()
            .filter(|s| only.map_or(true, |w| s.weight == w))
            .filter(|s| !s.clause.iter().any(|&l| lit_holds(model, l)))
            .map(|s| s.weight)
            .sum()
    }
}

pub(crate) fn lit_holds(model: &[bool], l: Lit) -> bool {
    model.get(l.var().idx() as usize).map_or(false, |&b| b == l.sign())
}

impl ClauseSink for Formula {
    fn fresh_lit(&mut self) -> Lit {
        self.new_lit()
    }

    fn emit(&mut self, clause: &[Lit]) {
        self.hard.push(clause.to_vec());
    }

    fn at_most(&mut self, lits: &[Lit], k: u32) -> bool {
        self.at_most.push((lits.to_vec(), k));
        true
    }
}

/// Add variables to `solver` until it has `n`.
pub(crate) fn sync_vars(solver: &mut Solver, n: u32) {
    while solver.num_vars() < n {
        solver.new_var_default();
    }
}

/// A formula and the solver it is loaded in, for algorithms that keep a
/// single solver: fresh variables go to both, clauses only to the solver.
pub(crate) struct Attached<'a> {
    pub(crate) formula: &'a mut Formula,
    pub(crate) solver: &'a mut Solver,
}

impl<'a> ClauseSink for Attached<'a> {
    fn fresh_lit(&mut self) -> Lit {
        let l = self.formula.new_lit();
        sync_vars(self.solver, self.formula.n_vars);
        l
    }

    fn emit(&mut self, clause: &[Lit]) {
        self.solver.add_clause(clause);
    }

    fn at_most(&mut self, lits: &[Lit], k: u32) -> bool {
        self.solver.at_most(lits, k)
    }
}

/// What a strategy step decided.
pub(crate) enum Step {
    Continue,
    Done(MaxSatResult),
}

/// A MaxSAT algorithm, run one SAT call at a time by `MaxSatSolver`.
pub(crate) trait Strategy {
    fn step(&mut self, ctx: &mut Context, handler: &mut dyn Handler) -> Result<Step>;
}

/// Stop the step with `Canceled` if the handler refused a bound.
macro_rules! check_canceled {
    ($e:expr) => {
        match $e {
            Ok(v) => v,
            Err(event) => return Ok(Step::Done(MaxSatResult::Canceled(event))),
        }
    };
}

/// Stop the step on a canceled SAT call, otherwise return whether it
/// was satisfiable.
macro_rules! sat_or_return {
    ($e:expr) => {
        match $e {
            SolveResult::Sat => true,
            SolveResult::Unsat => false,
            SolveResult::Canceled(event) => return Ok(Step::Done(MaxSatResult::Canceled(event))),
        }
    };
}

/// Bounds, best model and counters of a running search.
pub(crate) struct Context<'a> {
    pub(crate) formula: &'a mut Formula,
    pub(crate) config: &'a MaxSatConfig,
    pub(crate) ub_cost: Option<u64>,
    pub(crate) lb_cost: u64,
    /// Best model so far, over the formula variables at the time
    pub(crate) model: Vec<bool>,
    pub(crate) stats: MaxSatStats,
    sum_core_size: u64,
    n_user_vars: u32,
}

impl<'a> Context<'a> {
    pub(crate) fn new(formula: &'a mut Formula, config: &'a MaxSatConfig) -> Self {
        let n_user_vars = formula.n_vars;
        Context {
            formula,
            config,
            ub_cost: None,
            lb_cost: 0,
            model: vec![],
            stats: MaxSatStats::default(),
            sum_core_size: 0,
            n_user_vars,
        }
    }

    /// A solver with every variable, hard constraint and (relaxed) soft
    /// clause of the formula.
    pub(crate) fn rebuild_solver(&self) -> Result<Solver> {
        let mut solver = Solver::new(self.config.solver.clone())?;
        sync_vars(&mut solver, self.formula.n_vars);
        for c in &self.formula.hard {
            solver.add_clause(c);
        }
        for (lits, k) in &self.formula.at_most {
            solver.add_at_most(lits, *k)?;
        }
        for s in &self.formula.soft {
            solver.add_clause(&s.relaxed());
        }
        Ok(solver)
    }

    pub(crate) fn solve(
        &mut self,
        solver: &mut Solver,
        assumptions: &[Lit],
        handler: &mut dyn Handler,
    ) -> Result<SolveResult> {
        sync_vars(solver, self.formula.n_vars);
        let res = solver.solve_with(assumptions, handler)?;
        match res {
            SolveResult::Sat => self.stats.sat_calls += 1,
            SolveResult::Unsat => self.stats.unsat_calls += 1,
            SolveResult::Canceled(_) => (),
        }
        Ok(res)
    }

    /// Record the model of the last satisfiable call, returning its cost.
    ///
    /// Fails with the event if the handler cancels on a new upper bound.
    pub(crate) fn new_model(
        &mut self,
        solver: &Solver,
        handler: &mut dyn Handler,
    ) -> std::result::Result<u64, Event> {
        let model = model_of(solver);
        let cost = self.formula.cost(&model, None);
        if self.ub_cost.map_or(true, |ub| cost < ub) {
            info!("maxsat.new_ub {}", cost);
            self.ub_cost = Some(cost);
            self.model = model;
            self.stats.ub_cost = Some(cost);
            let e = Event::MaxSatNewUpperBound(cost);
            if !handler.should_resume(&e) {
                return Err(e);
            }
        }
        Ok(cost)
    }

    /// Raise the lower bound to `lb`.
    pub(crate) fn raise_lower_bound(
        &mut self,
        lb: u64,
        handler: &mut dyn Handler,
    ) -> std::result::Result<(), Event> {
        if lb <= self.lb_cost {
            return Ok(());
        }
        debug!("maxsat.new_lb {}", lb);
        self.lb_cost = lb;
        self.stats.lb_cost = lb;
        let e = Event::MaxSatNewLowerBound(lb);
        if handler.should_resume(&e) {
            Ok(())
        } else {
            Err(e)
        }
    }

    pub(crate) fn record_core(&mut self, size: usize) {
        self.stats.cores += 1;
        self.sum_core_size += size as u64;
        self.stats.avg_core_size = self.sum_core_size as f64 / self.stats.cores as f64;
        trace!("maxsat.core size={}", size);
    }

    /// Are the bounds known to meet?
    pub(crate) fn closed(&self) -> bool {
        self.ub_cost == Some(self.lb_cost)
    }

    /// The best model found, as the optimum.
    pub(crate) fn optimum(&self) -> MaxSatResult {
        match self.ub_cost {
            None => MaxSatResult::Unsatisfiable,
            Some(cost) => {
                let mut model = self.model.clone();
                model.resize(self.n_user_vars as usize, false);
                info!("maxsat.optimum {}", cost);
                MaxSatResult::Optimum { cost, model }
            }
        }
    }

    pub(crate) fn into_stats(self) -> MaxSatStats {
        self.stats
    }

    fn soft_weights(&self) -> Vec<u64> {
        self.formula.soft.iter().map(|s| s.weight).collect()
    }

    /// The stratification threshold below `current` for the soft clauses.
    pub(crate) fn next_weight(&self, current: u64) -> Option<u64> {
        next_threshold(self.config.weight_strategy, &self.soft_weights(), current)
    }

    /// The first stratification threshold for the soft clauses.
    pub(crate) fn first_weight(&self) -> u64 {
        first_threshold(self.config.weight_strategy, &self.soft_weights())
    }
}

/// The stratification threshold below `current`, following `strategy`,
/// or `None` if every weight is already at least `current`.
pub(crate) fn next_threshold(strategy: WeightStrategy, weights: &[u64], current: u64) -> Option<u64> {
    let mut lighter: Vec<u64> = weights.iter().cloned().filter(|&w| w < current).collect();
    lighter.sort_unstable_by(|a, b| b.cmp(a));
    lighter.dedup();
    match strategy {
        WeightStrategy::None => lighter.last().cloned(),
        WeightStrategy::Normal => lighter.first().cloned(),
        WeightStrategy::Diversify => {
            // at least a quarter more active clauses
            let active = |t: u64| weights.iter().filter(|&&w| w >= t).count();
            let now = active(current);
            lighter
                .iter()
                .cloned()
                .find(|&w| active(w) * 4 >= now * 5)
                .or_else(|| lighter.last().cloned())
        }
    }
}

pub(crate) fn first_threshold(strategy: WeightStrategy, weights: &[u64]) -> u64 {
    let w = match strategy {
        WeightStrategy::None => weights.iter().cloned().min(),
        _ => weights.iter().cloned().max(),
    };
    w.unwrap_or(1).max(1)
}

/// The model of the last satisfiable call, unassigned variables as `false`.
pub(crate) fn model_of(solver: &Solver) -> Vec<bool> {
    solver.get_model().iter().map(|&v| v == lbool::TRUE).collect()
}

/// Smallest sum of a sub-multiset of `weights` that is at least `target`.
///
/// Falls back to `target` itself when there are too many distinct sums.
pub(crate) fn next_subset_sum(weights: &[u64], target: u64) -> Option<u64> {
    const MAX_SUMS: usize = 1 << 16;
    let total: u64 = weights.iter().sum();
    if target == 0 {
        return Some(0);
    } else if total < target {
        return None;
    }
    let mut below: BTreeSet<u64> = BTreeSet::new();
    below.insert(0);
    let mut best = total;
    for &w in weights {
        let mut added = vec![];
        for &s in &below {
            let t = s + w;
            if t >= target {
                best = best.min(t);
            } else {
                added.push(t);
            }
        }
        below.extend(added);
        if below.len() > MAX_SUMS {
            return Some(target);
        }
    }
    Some(best)
}

#[cfg(test)]
mod test {
    use super::*;

    fn formula(weights: &[u64]) -> Formula {
        let mut f = Formula::default();
        for &w in weights {
            let l = f.new_lit();
            f.soft.push(SoftClause::new(vec![l], w));
        }
        f
    }

    #[test]
    fn test_bmo() {
        assert!(formula(&[1, 1, 3, 10]).is_bmo());
        // 5 == 2 + 3: strict
        assert!(!formula(&[2, 3, 5]).is_bmo());
        assert!(formula(&[1, 1, 1]).is_bmo());
        assert!(!formula(&[4, 4, 5]).is_bmo());
    }

    #[test]
    fn test_cost() {
        let f = formula(&[1, 2, 4]);
        assert_eq!(f.cost(&[true, true, true], None), 0);
        assert_eq!(f.cost(&[false, true, false], None), 5);
        assert_eq!(f.cost(&[false, true, false], Some(4)), 4);
        // variables missing from the model are false
        assert_eq!(f.cost(&[true], None), 6);
    }

    #[test]
    fn test_thresholds() {
        let ws = [1, 1, 2, 5, 5, 8, 8, 8, 8];
        assert_eq!(first_threshold(WeightStrategy::Normal, &ws), 8);
        assert_eq!(first_threshold(WeightStrategy::None, &ws), 1);
        assert_eq!(first_threshold(WeightStrategy::Normal, &[]), 1);
        assert_eq!(next_threshold(WeightStrategy::Normal, &ws, 8), Some(5));
        assert_eq!(next_threshold(WeightStrategy::Normal, &ws, 1), None);
        assert_eq!(next_threshold(WeightStrategy::None, &ws, 8), Some(1));
        // 4 active clauses, 5 is enough to get 6 of them
        assert_eq!(next_threshold(WeightStrategy::Diversify, &ws, 8), Some(5));
        // 6 active, 2 only brings 7: go down to 1
        assert_eq!(next_threshold(WeightStrategy::Diversify, &ws, 5), Some(1));
    }

    #[test]
    fn test_subset_sum() {
        assert_eq!(next_subset_sum(&[3, 5], 1), Some(3));
        assert_eq!(next_subset_sum(&[3, 5], 4), Some(5));
        assert_eq!(next_subset_sum(&[3, 5], 6), Some(8));
        assert_eq!(next_subset_sum(&[3, 5], 9), None);
        assert_eq!(next_subset_sum(&[], 0), Some(0));
    }

    #[test]
    fn test_attached_sink() {
        let mut f = formula(&[1, 1]);
        let mut s = Solver::default();
        sync_vars(&mut s, f.n_vars);
        let l = {
            let mut sink = Attached {
                formula: &mut f,
                solver: &mut s,
            };
            let l = sink.fresh_lit();
            sink.emit(&[!l]);
            l
        };
        assert_eq!(f.n_vars, 3);
        assert_eq!(s.num_vars(), 3);
        assert!(f.hard.is_empty());
        assert_eq!(s.solve(&[l]), Ok(SolveResult::Unsat));
    }
}
