use {super::ClauseSink, crate::clause::Lit};

/// Sequential counter (Sinz 2005) for "at most `k` of `lits`".
///
/// Register `s[i][j]` is implied by "at least `j+1` of the first `i+1`
/// inputs are true".
pub fn encode_at_most_k<S: ClauseSink + ?Sized>(sink: &mut S, lits: &[Lit], k: u64) {
    let n = lits.len();
    if k as usize >= n {
        return;
    }
    if k == 0 {
        for &x in lits {
            sink.emit(&[!x]);
        }
        return;
    }
    let k = k as usize;
    let mut prev: Vec<Lit> = Vec::with_capacity(k);
    for (i, &x) in lits.iter().enumerate() {
        if i == n - 1 {
            sink.emit(&[!x, !prev[k - 1]]);
            break;
        }
        let cur: Vec<Lit> = (0..k).map(|_| sink.fresh_lit()).collect();
        sink.emit(&[!x, cur[0]]);
        if i == 0 {
            for &s in &cur[1..] {
                sink.emit(&[!s]);
            }
        } else {
            for j in 0..k {
                sink.emit(&[!prev[j], cur[j]]);
            }
            for j in 1..k {
                sink.emit(&[!x, !prev[j - 1], cur[j]]);
            }
            sink.emit(&[!x, !prev[k - 1]]);
        }
        prev = cur;
    }
}
