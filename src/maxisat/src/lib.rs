/*****************************************************************************************[lib.rs]
Copyright (c) 2018-2018, Masaki Hara

Permission is hereby granted, free of charge, to any person obtaining a copy of this software and
associated documentation files (the "Software"), to deal in the Software without restriction,
including without limitation the rights to use, copy, modify, merge, publish, distribute,
sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all copies or
substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT
NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT
OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
**************************************************************************************************/

//! A CDCL SAT solver with cardinality constraints, checkpoints, and a
//! family of MaxSAT algorithms built on top of it.
//!
//! ```
//! use maxisat::*;
//! let mut s = Solver::default();
//! let a = Lit::new(s.new_var_default(), true);
//! let b = Lit::new(s.new_var_default(), true);
//! s.add_clause(&[a, b]);
//! s.add_clause(&[!a]);
//! assert_eq!(s.solve(&[]), Ok(SolveResult::Sat));
//! assert_eq!(s.value_lit(b), lbool::TRUE);
//! ```

//======== LOG ============

// stubs when logging is not enabled
#[cfg(not(feature = "logging"))]
#[macro_use]
pub(crate) mod log {
    macro_rules! trace {
        ($( $x:expr ),*) => {};
    }
    macro_rules! debug {
        ($( $x:expr ),*) => {};
    }
    macro_rules! info {
        ($( $x:expr ),*) => {};
    }
}

#[cfg(feature = "logging")]
#[macro_use]
pub extern crate log;

//======== PUBLIC INTERFACE ============

pub mod alloc;
pub mod callbacks;
pub mod clause;
pub mod core;
pub mod drat;
pub mod encodings;
pub mod error;
pub mod interface;
pub mod intmap;
pub mod maxsat;

pub use crate::{
    callbacks::{Basic as BasicHandler, Computation, Event, Handler, NoHandler, Timeout},
    clause::{display::Print, lbool, LMap, LSet, Lit, VMap, Var},
    core::{ClauseMinimization, RestartPolicy, SolveResult, Solver, SolverOpts, SolverState},
    drat::Proof,
    encodings::{ClauseSink, Encoder, EncodingError},
    error::{Error, Result},
    interface::SolverInterface,
    maxsat::{
        Algorithm, AmoEncoding, CardinalityEncoding, IncrementalStrategy, MaxSatConfig,
        MaxSatOutcome, MaxSatResult, MaxSatSolver, MaxSatState, MaxSatStats, PbEncoding,
        WeightStrategy,
    },
};
