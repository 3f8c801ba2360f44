use std::time::{Duration, Instant};

/// The kind of computation a handler is notified about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Computation {
    /// A single call to the SAT solver
    SatCall,
    /// A whole MaxSAT search
    MaxSatCall,
}

/// Checkpoints at which a computation polls its handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    ComputationStarted(Computation),
    ComputationFinished(Computation),
    /// The SAT solver just hit a conflict
    ConflictDetected,
    /// A MaxSAT algorithm found a model with this cost
    MaxSatNewUpperBound(u64),
    /// A MaxSAT algorithm proved the optimum is at least this cost
    MaxSatNewLowerBound(u64),
}

/// Polled handler used to observe and cancel computations.
///
/// Handlers cannot interrupt propagation; they are only asked at the
/// checkpoints listed in `Event`. Returning `false` cancels the computation,
/// which then reports the event that triggered the cancellation.
pub trait Handler {
    /// Should the computation go on after `event`?
    fn should_resume(&mut self, _event: &Event) -> bool {
        true
    }
}

/// Handler that never cancels anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHandler;

impl Handler for NoHandler {}

/// Basic handler
///
/// This doesn't do anything except storing a function deciding when to `stop`
pub struct Basic {
    stop: Option<Box<dyn FnMut(&Event) -> bool>>,
}

impl Handler for Basic {
    fn should_resume(&mut self, event: &Event) -> bool {
        match self.stop {
            None => true,
            Some(ref mut f) => !f(event),
        }
    }
}

impl Basic {
    /// Allocate a new handler
    pub fn new() -> Self {
        Basic { stop: None }
    }

    /// Set the `stop` function. The computation is canceled as soon as it
    /// returns `true`.
    pub fn set_stop<F>(&mut self, f: F)
    where
        F: 'static + FnMut(&Event) -> bool,
    {
        self.stop = Some(Box::new(f));
    }
}

impl Default for Basic {
    fn default() -> Self {
        Basic::new()
    }
}

/// Cancels the computation at the first checkpoint after a deadline.
#[derive(Debug, Clone, Copy)]
pub struct Timeout {
    deadline: Instant,
}

impl Timeout {
    pub fn new(d: Duration) -> Self {
        Timeout {
            deadline: Instant::now() + d,
        }
    }

    pub fn at(deadline: Instant) -> Self {
        Timeout { deadline }
    }
}

impl Handler for Timeout {
    fn should_resume(&mut self, _event: &Event) -> bool {
        Instant::now() < self.deadline
    }
}

impl<'a, H: Handler + ?Sized> Handler for &'a mut H {
    fn should_resume(&mut self, event: &Event) -> bool {
        (**self).should_resume(event)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::{cell::Cell, rc::Rc};

    #[test]
    fn test_basic_stop() {
        let n = Rc::new(Cell::new(0));
        let n2 = n.clone();
        let mut h = Basic::new();
        assert!(h.should_resume(&Event::ConflictDetected));
        h.set_stop(move |e| {
            if *e == Event::ConflictDetected {
                n2.set(n2.get() + 1);
            }
            n2.get() >= 2
        });
        assert!(h.should_resume(&Event::ConflictDetected));
        assert!(h.should_resume(&Event::ComputationStarted(Computation::SatCall)));
        assert!(!h.should_resume(&Event::ConflictDetected));
        assert_eq!(n.get(), 2);
    }

    #[test]
    fn test_timeout() {
        let mut h = Timeout::new(Duration::from_secs(3600));
        assert!(h.should_resume(&Event::ConflictDetected));
        let mut h = Timeout::at(Instant::now() - Duration::from_millis(1));
        assert!(!h.should_resume(&Event::ConflictDetected));
    }
}
