//! Random small CNF instances, checked against exhaustive enumeration.

use maxisat::*;
use rand::{rngs::SmallRng, Rng, SeedableRng};

fn random_cnf(rng: &mut SmallRng, n_vars: i32, n_clauses: usize) -> Vec<Vec<i32>> {
    (0..n_clauses)
        .map(|_| {
            let len = rng.gen_range(1..=3);
            (0..len)
                .map(|_| {
                    let v = rng.gen_range(1..=n_vars);
                    if rng.gen_bool(0.5) {
                        v
                    } else {
                        -v
                    }
                })
                .collect()
        })
        .collect()
}

fn holds(model: u32, lit: i32) -> bool {
    let bit = model & (1 << (lit.abs() - 1)) != 0;
    bit == (lit > 0)
}

fn brute_force_sat(n_vars: i32, cnf: &[Vec<i32>], assumptions: &[i32]) -> bool {
    (0..1u32 << n_vars).any(|m| {
        assumptions.iter().all(|&l| holds(m, l)) && cnf.iter().all(|c| c.iter().any(|&l| holds(m, l)))
    })
}

fn load(s: &mut Solver, n_vars: i32, cnf: &[Vec<i32>]) -> Vec<Var> {
    let vars: Vec<Var> = (0..n_vars).map(|_| s.new_var_default()).collect();
    for c in cnf {
        let lits: Vec<Lit> = c.iter().map(|&l| to_lit(&vars, l)).collect();
        s.add_clause(&lits);
    }
    vars
}

fn to_lit(vars: &[Var], l: i32) -> Lit {
    Lit::new(vars[(l.abs() - 1) as usize], l > 0)
}

#[test]
fn test_random_cnf_against_brute_force() {
    let _ = env_logger::try_init();
    let mut rng = SmallRng::seed_from_u64(42);
    for round in 0..300 {
        let n_vars = rng.gen_range(3..=9);
        let n_clauses = rng.gen_range(1..=(n_vars as usize * 5));
        let cnf = random_cnf(&mut rng, n_vars, n_clauses);
        let mut s = Solver::default();
        let vars = load(&mut s, n_vars, &cnf);
        let expected = brute_force_sat(n_vars, &cnf, &[]);
        let res = s.solve(&[]).unwrap();
        assert_eq!(res.is_sat(), expected, "round {} cnf {:?}", round, cnf);
        if res.is_sat() {
            for c in &cnf {
                assert!(
                    c.iter().any(|&l| s.value_lit(to_lit(&vars, l)) == lbool::TRUE),
                    "clause {:?} falsified",
                    c
                );
            }
        }
    }
}

#[test]
fn test_random_assumptions_and_cores() {
    let _ = env_logger::try_init();
    let mut rng = SmallRng::seed_from_u64(7);
    for round in 0..200 {
        let n_vars = rng.gen_range(3..=8);
        let cnf = random_cnf(&mut rng, n_vars, n_vars as usize * 2);
        let mut s = Solver::default();
        let vars = load(&mut s, n_vars, &cnf);
        // several calls on the same solver
        for _ in 0..4 {
            let mut assumps: Vec<i32> = vec![];
            for v in 1..=n_vars {
                if rng.gen_bool(0.4) {
                    assumps.push(if rng.gen_bool(0.5) { v } else { -v });
                }
            }
            let lits: Vec<Lit> = assumps.iter().map(|&l| to_lit(&vars, l)).collect();
            let res = s.solve(&lits).unwrap();
            assert_eq!(
                res.is_sat(),
                brute_force_sat(n_vars, &cnf, &assumps),
                "round {} cnf {:?} assumptions {:?}",
                round,
                cnf,
                assumps
            );
            if res.is_sat() {
                for &l in &lits {
                    assert_eq!(s.value_lit(l), lbool::TRUE);
                }
            } else {
                let core: Vec<i32> = s.unsat_core().iter().map(|l| l.to_dimacs()).collect();
                for l in &core {
                    assert!(assumps.contains(l), "{} is not an assumption", l);
                }
                assert!(!brute_force_sat(n_vars, &cnf, &core), "core {:?} is satisfiable", core);
            }
        }
    }
}

#[test]
fn test_random_selector_groups() {
    let _ = env_logger::try_init();
    let mut rng = SmallRng::seed_from_u64(11);
    for round in 0..150 {
        let n_vars = rng.gen_range(6..=12);
        let cnf = random_cnf(&mut rng, n_vars, n_vars as usize * 4);
        let mut s = Solver::default();
        let vars: Vec<Var> = (0..n_vars).map(|_| s.new_var_default()).collect();
        // every clause is switched on by its own selector
        let mut sel = vec![];
        for c in &cnf {
            let g = s.new_var_default();
            s.set_selector(g);
            let mut lits: Vec<Lit> = c.iter().map(|&l| to_lit(&vars, l)).collect();
            lits.push(Lit::new(g, false));
            s.add_clause(&lits);
            sel.push(Lit::new(g, true));
        }
        for _ in 0..4 {
            let on: Vec<usize> = (0..cnf.len()).filter(|_| rng.gen_bool(0.7)).collect();
            let active: Vec<Vec<i32>> = on.iter().map(|&i| cnf[i].clone()).collect();
            let assumps: Vec<Lit> = on.iter().map(|&i| sel[i]).collect();
            let res = s.solve(&assumps).unwrap();
            assert_eq!(res.is_sat(), brute_force_sat(n_vars, &active, &[]), "round {}", round);
            if res.is_sat() {
                for c in &active {
                    assert!(c.iter().any(|&l| s.value_lit(to_lit(&vars, l)) == lbool::TRUE));
                }
            } else {
                let core: Vec<Vec<i32>> = s
                    .unsat_core()
                    .iter()
                    .map(|l| {
                        assert!(assumps.contains(l));
                        cnf[sel.iter().position(|g| g == l).unwrap()].clone()
                    })
                    .collect();
                assert!(!brute_force_sat(n_vars, &core, &[]), "round {}", round);
            }
        }
    }
}

#[test]
fn test_random_at_most() {
    let _ = env_logger::try_init();
    let mut rng = SmallRng::seed_from_u64(1234);
    for round in 0..150 {
        let n_vars = rng.gen_range(3..=8);
        let cnf = random_cnf(&mut rng, n_vars, n_vars as usize);
        let mut card: Vec<i32> = (1..=n_vars).filter(|_| rng.gen_bool(0.6)).collect();
        card.sort();
        card.dedup();
        let k = rng.gen_range(0..=card.len()) as u32;

        let mut s = Solver::default();
        let vars = load(&mut s, n_vars, &cnf);
        let lits: Vec<Lit> = card.iter().map(|&l| to_lit(&vars, l)).collect();
        s.add_at_most(&lits, k).unwrap();

        let expected = (0..1u32 << n_vars).any(|m| {
            cnf.iter().all(|c| c.iter().any(|&l| holds(m, l)))
                && card.iter().filter(|&&l| holds(m, l)).count() as u32 <= k
        });
        let res = s.solve(&[]).unwrap();
        assert_eq!(res.is_sat(), expected, "round {} cnf {:?} card {:?} <= {}", round, cnf, card, k);
        if res.is_sat() {
            let n_true = lits.iter().filter(|&&l| s.value_lit(l) == lbool::TRUE).count();
            assert!(n_true as u32 <= k);
        }
    }
}

#[test]
fn test_unsat_formula() {
    // (x1 ∨ x2), (¬x1 ∨ x2), (¬x2)
    let mut s = Solver::default();
    load(&mut s, 2, &[vec![1, 2], vec![-1, 2], vec![-2]]);
    assert_eq!(s.solve(&[]), Ok(SolveResult::Unsat));
}

#[test]
fn test_sat_under_assumption() {
    let mut s = Solver::default();
    let vars = load(&mut s, 2, &[vec![1, 2]]);
    let x1 = to_lit(&vars, 1);
    assert_eq!(s.solve(&[!x1]), Ok(SolveResult::Sat));
    assert_eq!(s.value_var(vars[0]), lbool::FALSE);
    assert_eq!(s.value_var(vars[1]), lbool::TRUE);
}
