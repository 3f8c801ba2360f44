//! Every MaxSAT algorithm against exhaustive enumeration.

use maxisat::*;
use rand::{rngs::SmallRng, Rng, SeedableRng};

#[derive(Debug, Clone)]
struct Instance {
    n_vars: i32,
    hard: Vec<Vec<i32>>,
    soft: Vec<(Vec<i32>, u64)>,
}

fn holds(model: u32, lit: i32) -> bool {
    (model & (1 << (lit.abs() - 1)) != 0) == (lit > 0)
}

fn random_clause(rng: &mut SmallRng, n_vars: i32) -> Vec<i32> {
    (0..rng.gen_range(1..=3))
        .map(|_| {
            let v = rng.gen_range(1..=n_vars);
            if rng.gen_bool(0.5) {
                v
            } else {
                -v
            }
        })
        .collect()
}

fn random_instance(rng: &mut SmallRng, max_weight: u64) -> Instance {
    let n_vars = rng.gen_range(2..=7);
    let hard = (0..rng.gen_range(0..=n_vars as usize * 2))
        .map(|_| random_clause(rng, n_vars))
        .collect();
    let soft = (0..rng.gen_range(1..=8))
        .map(|_| (random_clause(rng, n_vars), rng.gen_range(1..=max_weight)))
        .collect();
    Instance { n_vars, hard, soft }
}

impl Instance {
    fn cost(&self, m: u32) -> Option<u64> {
        if !self.hard.iter().all(|c| c.iter().any(|&l| holds(m, l))) {
            return None;
        }
        Some(
            self.soft
                .iter()
                .filter(|(c, _)| !c.iter().any(|&l| holds(m, l)))
                .map(|(_, w)| w)
                .sum(),
        )
    }

    fn optimum(&self) -> Option<u64> {
        (0..1u32 << self.n_vars).filter_map(|m| self.cost(m)).min()
    }

    fn solver(&self, config: MaxSatConfig) -> MaxSatSolver {
        let mut s = MaxSatSolver::new(config);
        for c in &self.hard {
            s.add_hard_clause(c).unwrap();
        }
        for (c, w) in &self.soft {
            s.add_soft_clause(c, *w).unwrap();
        }
        s
    }

    /// Solve with `config` and compare with the enumerated optimum.
    fn check(&self, config: MaxSatConfig) {
        let name = format!("{:?}", config.algorithm);
        let mut s = self.solver(config);
        let out = s.search().unwrap();
        match (self.optimum(), &out.result) {
            (None, MaxSatResult::Unsatisfiable) => (),
            (Some(opt), MaxSatResult::Optimum { cost, model }) => {
                assert_eq!(*cost, opt, "{} on {:?}", name, self);
                let mut m = 0u32;
                for (i, &b) in model.iter().enumerate().take(self.n_vars as usize) {
                    if b {
                        m |= 1 << i;
                    }
                }
                assert_eq!(self.cost(m), Some(opt), "{}: bad model on {:?}", name, self);
                assert_eq!(out.stats.ub_cost, Some(opt));
                assert!(out.stats.lb_cost <= opt);
            }
            (expected, res) => panic!("{}: expected {:?}, got {:?} on {:?}", name, expected, res, self),
        }
    }
}

fn config(algorithm: Algorithm) -> MaxSatConfig {
    MaxSatConfig::new(algorithm)
}

fn unweighted_configs() -> Vec<MaxSatConfig> {
    let mut v: Vec<MaxSatConfig> = [
        Algorithm::Wbo,
        Algorithm::IncWbo,
        Algorithm::LinearSu,
        Algorithm::LinearUs,
        Algorithm::Msu3,
        Algorithm::Wmsu3,
        Algorithm::Oll,
    ]
    .iter()
    .map(|&a| config(a))
    .collect();

    for &a in &[Algorithm::Msu3, Algorithm::LinearUs] {
        let mut c = config(a);
        c.incremental = IncrementalStrategy::Iterative;
        v.push(c);
        let mut c = config(a);
        c.cardinality = CardinalityEncoding::Sequential;
        v.push(c);
    }
    let mut c = config(Algorithm::LinearSu);
    c.cardinality = CardinalityEncoding::Sequential;
    v.push(c);
    let mut c = config(Algorithm::Wbo);
    c.amo = AmoEncoding::Native;
    v.push(c);
    let mut c = config(Algorithm::IncWbo);
    c.amo = AmoEncoding::Native;
    c.symmetry = false;
    v.push(c);
    v
}

fn weighted_configs() -> Vec<MaxSatConfig> {
    let mut v = vec![];
    for &ws in &[WeightStrategy::None, WeightStrategy::Normal, WeightStrategy::Diversify] {
        for &a in &[Algorithm::Wbo, Algorithm::IncWbo, Algorithm::Oll] {
            let mut c = config(a);
            c.weight_strategy = ws;
            v.push(c);
        }
    }
    for &pb in &[PbEncoding::Swc, PbEncoding::Gte] {
        for &bmo in &[false, true] {
            let mut c = config(Algorithm::LinearSu);
            c.pb = pb;
            c.bmo = bmo;
            v.push(c);
        }
        let mut c = config(Algorithm::Wmsu3);
        c.pb = pb;
        v.push(c);
    }
    let mut c = config(Algorithm::Wmsu3);
    c.incremental = IncrementalStrategy::Iterative;
    v.push(c);
    let mut c = config(Algorithm::Wbo);
    c.symmetry_limit = 0;
    v.push(c);
    v
}

#[test]
fn test_unweighted_against_brute_force() {
    let _ = env_logger::try_init();
    let mut rng = SmallRng::seed_from_u64(2024);
    for _ in 0..60 {
        let inst = random_instance(&mut rng, 1);
        for c in unweighted_configs() {
            inst.check(c);
        }
    }
}

#[test]
fn test_weighted_against_brute_force() {
    let _ = env_logger::try_init();
    let mut rng = SmallRng::seed_from_u64(77);
    for _ in 0..60 {
        let inst = random_instance(&mut rng, 6);
        for c in weighted_configs() {
            inst.check(c);
        }
    }
}

#[test]
fn test_lexicographic_weights() {
    let _ = env_logger::try_init();
    let mut rng = SmallRng::seed_from_u64(5);
    for _ in 0..30 {
        let mut inst = random_instance(&mut rng, 1);
        // weights 1, 10, 100 with at most 8 soft clauses are lexicographic
        for (i, s) in inst.soft.iter_mut().enumerate() {
            s.1 = [1, 10, 100][i % 3];
        }
        let mut c = config(Algorithm::LinearSu);
        c.bmo = true;
        inst.check(c);
    }
}

#[test]
fn test_oll_weights_scale() {
    let _ = env_logger::try_init();
    let mut rng = SmallRng::seed_from_u64(31);
    for _ in 0..40 {
        let inst = random_instance(&mut rng, 1);
        let mut scaled = inst.clone();
        for s in scaled.soft.iter_mut() {
            s.1 = 3;
        }
        let a = inst.solver(config(Algorithm::Oll)).search().unwrap().result;
        let b = scaled.solver(config(Algorithm::Oll)).search().unwrap().result;
        assert_eq!(a.cost().map(|c| c * 3), b.cost(), "{:?}", inst);
    }
}

#[test]
fn test_weighted_example() {
    // hard (x1 ∨ x2), soft ¬x1 (1), soft ¬x2 (2)
    for c in weighted_configs() {
        let mut s = MaxSatSolver::new(c);
        s.add_hard_clause(&[1, 2]).unwrap();
        s.add_soft_clause(&[-1], 1).unwrap();
        s.add_soft_clause(&[-2], 2).unwrap();
        let out = s.search().unwrap();
        assert_eq!(
            out.result,
            MaxSatResult::Optimum {
                cost: 1,
                model: vec![true, false]
            }
        );
    }
}

#[test]
fn test_unweighted_example() {
    for c in unweighted_configs() {
        let mut s = MaxSatSolver::new(c);
        s.add_hard_clause(&[1, 2]).unwrap();
        s.add_soft_clause(&[-1], 1).unwrap();
        s.add_soft_clause(&[-2], 1).unwrap();
        assert_eq!(s.search().unwrap().result.cost(), Some(1));
    }
}

#[test]
fn test_hard_unsat() {
    for c in unweighted_configs() {
        let mut s = MaxSatSolver::new(c);
        s.add_hard_clause(&[1]).unwrap();
        s.add_hard_clause(&[-1]).unwrap();
        s.add_soft_clause(&[2], 1).unwrap();
        assert_eq!(s.search().unwrap().result, MaxSatResult::Unsatisfiable);
    }
}

#[test]
fn test_no_soft_clauses() {
    for c in unweighted_configs() {
        let mut s = MaxSatSolver::new(c);
        s.add_hard_clause(&[1, -2]).unwrap();
        assert_eq!(s.search().unwrap().result.cost(), Some(0));
    }
}

#[test]
fn test_search_again_after_adding() {
    let mut s = MaxSatSolver::new(config(Algorithm::Oll));
    s.add_hard_clause(&[1, 2]).unwrap();
    s.add_soft_clause(&[-1], 1).unwrap();
    let first = s.search().unwrap();
    assert_eq!(first.result.cost(), Some(0));
    let (n_vars, n_hard) = (s.num_vars(), s.num_hard());

    // the search leaves the problem as it found it
    s.add_soft_clause(&[-2], 1).unwrap();
    assert_eq!(s.num_vars(), n_vars);
    assert_eq!(s.num_hard(), n_hard);
    assert_eq!(s.search().unwrap().result.cost(), Some(1));
    s.config_mut().algorithm = Algorithm::Wbo;
    assert_eq!(s.search().unwrap().result.cost(), Some(1));
}

#[test]
fn test_stats() {
    let mut s = MaxSatSolver::new(config(Algorithm::Msu3));
    for i in 1..=4 {
        s.add_soft_clause(&[i], 1).unwrap();
    }
    // at most one of x1..x4
    for i in 1..=4 {
        for j in i + 1..=4 {
            s.add_hard_clause(&[-i, -j]).unwrap();
        }
    }
    let out = s.search().unwrap();
    assert_eq!(out.result.cost(), Some(3));
    assert_eq!(out.stats.lb_cost, 3);
    assert_eq!(out.stats.sat_calls, 1);
    assert_eq!(out.stats.unsat_calls, 3);
    assert_eq!(out.stats.cores, 3);
    assert!(out.stats.avg_core_size > 0.0);
}

#[test]
fn test_cancel_on_upper_bound() {
    let mut s = MaxSatSolver::new(config(Algorithm::LinearSu));
    s.add_hard_clause(&[1, 2, 3]).unwrap();
    for i in 1..=3 {
        s.add_soft_clause(&[-i], 1).unwrap();
    }
    let mut h = BasicHandler::new();
    h.set_stop(|e| match e {
        Event::MaxSatNewUpperBound(_) => true,
        _ => false,
    });
    let out = s.search_with(&mut h).unwrap();
    match out.result {
        MaxSatResult::Canceled(Event::MaxSatNewUpperBound(c)) => {
            assert!(c >= 1);
            assert_eq!(out.stats.ub_cost, Some(c));
        }
        r => panic!("unexpected {:?}", r),
    }
    // the solver can still be used afterwards
    assert_eq!(s.search().unwrap().result.cost(), Some(1));
}

#[test]
fn test_cancel_on_lower_bound() {
    let mut s = MaxSatSolver::new(config(Algorithm::Oll));
    s.add_hard_clause(&[1, 2]).unwrap();
    s.add_soft_clause(&[-1], 1).unwrap();
    s.add_soft_clause(&[-2], 1).unwrap();
    let mut h = BasicHandler::new();
    h.set_stop(|e| *e == Event::MaxSatNewLowerBound(1));
    let out = s.search_with(&mut h).unwrap();
    assert_eq!(out.result, MaxSatResult::Canceled(Event::MaxSatNewLowerBound(1)));
}

#[test]
fn test_cancel_inside_sat_call() {
    // pigeon hole 7 into 6 as hard clauses: many conflicts
    let mut s = MaxSatSolver::new(config(Algorithm::Wbo));
    let p = |i: i32, h: i32| i * 6 + h + 1;
    for i in 0..7 {
        s.add_hard_clause(&(0..6).map(|h| p(i, h)).collect::<Vec<_>>()).unwrap();
    }
    for h in 0..6 {
        for i in 0..7 {
            for j in i + 1..7 {
                s.add_hard_clause(&[-p(i, h), -p(j, h)]).unwrap();
            }
        }
    }
    s.add_soft_clause(&[1], 1).unwrap();
    let mut h = BasicHandler::new();
    h.set_stop(|e| *e == Event::ConflictDetected);
    let out = s.search_with(&mut h).unwrap();
    assert_eq!(out.result, MaxSatResult::Canceled(Event::ConflictDetected));
}

/// Keeps the bounds announced during a search.
#[derive(Default)]
struct Bounds {
    upper: Vec<u64>,
    lower: Vec<u64>,
}

impl Handler for Bounds {
    fn should_resume(&mut self, e: &Event) -> bool {
        match *e {
            Event::MaxSatNewUpperBound(c) => self.upper.push(c),
            Event::MaxSatNewLowerBound(c) => self.lower.push(c),
            _ => (),
        }
        true
    }
}

#[test]
fn test_bounds_are_monotonic() {
    let _ = env_logger::try_init();
    let mut rng = SmallRng::seed_from_u64(31);
    for round in 0..80 {
        let weighted = round % 2 == 0;
        let inst = random_instance(&mut rng, if weighted { 6 } else { 1 });
        let configs = if weighted {
            weighted_configs()
        } else {
            unweighted_configs()
        };
        for c in configs {
            let name = format!("{:?}", c.algorithm);
            let mut s = inst.solver(c);
            let mut b = Bounds::default();
            let out = s.search_with(&mut b).unwrap();
            assert!(b.upper.windows(2).all(|w| w[0] > w[1]), "{}: {:?}", name, b.upper);
            assert!(b.lower.windows(2).all(|w| w[0] < w[1]), "{}: {:?}", name, b.lower);
            match out.result {
                MaxSatResult::Optimum { cost, .. } => {
                    assert_eq!(b.upper.last(), Some(&cost), "{} on {:?}", name, inst);
                    assert!(b.lower.iter().all(|&lb| lb <= cost), "{}: {:?}", name, b.lower);
                }
                MaxSatResult::Unsatisfiable => assert!(b.upper.is_empty()),
                r => panic!("{}: unexpected {:?}", name, r),
            }
        }
    }
}
