use {super::ClauseSink, crate::clause::Lit};

/// Ladder encoding of "at most one of `lits`".
///
/// `y[i]` is implied by "one of the first `i+1` inputs is true"; an input
/// cannot be true once the ladder below it is up.
pub fn encode_ladder<S: ClauseSink + ?Sized>(sink: &mut S, lits: &[Lit]) {
    if lits.len() <= 1 {
        return;
    }
    if lits.len() == 2 {
        sink.emit(&[!lits[0], !lits[1]]);
        return;
    }
    let n = lits.len();
    let y: Vec<Lit> = (0..n - 1).map(|_| sink.fresh_lit()).collect();
    for i in 0..n {
        if i < n - 1 {
            sink.emit(&[!lits[i], y[i]]);
        }
        if i > 0 {
            sink.emit(&[!lits[i], !y[i - 1]]);
            if i < n - 1 {
                sink.emit(&[!y[i - 1], y[i]]);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::super::testing::*;
    use super::*;
    use crate::core::Solver;

    #[test]
    fn test_ladder() {
        for n in 0..6 {
            let mut s = Solver::default();
            let x = new_lits(&mut s, n);
            encode_ladder(&mut s, &x);
            for on in subsets(n) {
                assert_eq!(allows(&mut s, &x, &on), on.len() <= 1, "n={} on={:?}", n, on);
            }
        }
    }
}
