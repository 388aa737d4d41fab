//! Work-list planning of the types reachable from a root message.
//!
//! Generators discover new types while they run, so reachable types are found by draining a
//! queue to fixpoint rather than by recursion. The visited set makes the drain terminate on
//! self-referential and mutually recursive type graphs, and guarantees each type is generated
//! exactly once however many parents refer to it.

use std::collections::{HashSet, VecDeque};

use indexmap::IndexSet;
use log::trace;

use crate::error::{Error, GenerateError};

/// The lifecycle of a [`TypePlanner`]. One planner serves exactly one generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerState {
    /// Nothing has been requested yet.
    Empty,
    /// Types are queued and the queue has not been drained.
    Pending,
    /// The queue is being drained; generators may still queue more types.
    Draining,
    /// The queue was drained to fixpoint.
    Done,
}

/// The output of one generator, tagged with the fully-qualified name it was requested under.
#[derive(Debug)]
pub struct Planned<T> {
    pub name: String,
    pub output: T,
}

/// Plans generation of every type reachable from a root, generating each exactly once.
#[derive(Debug)]
pub struct TypePlanner<G> {
    queue: VecDeque<(String, G)>,
    pending: HashSet<String>,
    visited: IndexSet<String>,
    state: PlannerState,
}

impl<G> Default for TypePlanner<G> {
    fn default() -> Self {
        TypePlanner {
            queue: VecDeque::new(),
            pending: HashSet::new(),
            visited: IndexSet::new(),
            state: PlannerState::Empty,
        }
    }
}

impl<G> TypePlanner<G> {
    pub fn new() -> Self {
        TypePlanner::default()
    }

    pub fn state(&self) -> PlannerState {
        self.state
    }

    /// Whether the named type has already been handed to its generator.
    pub fn is_visited(&self, name: &str) -> bool {
        self.visited.contains(name)
    }

    /// Queues `generator` to produce the named type, unless the type is already visited or
    /// pending. Returns `true` if the request was queued.
    pub fn request_type(&mut self, name: &str, generator: G) -> bool {
        if self.visited.contains(name) || self.pending.contains(name) {
            return false;
        }

        trace!("requested type {}", name);
        self.pending.insert(name.to_string());
        self.queue.push_back((name.to_string(), generator));
        if self.state == PlannerState::Empty {
            self.set_state(PlannerState::Pending);
        }
        true
    }

    /// Drains the queue to fixpoint, invoking each generator once, and returns the generated
    /// outputs in visit order.
    ///
    /// `generate` receives the planner so that it may request further types. The first
    /// generator error aborts the drain, discarding everything generated so far.
    pub fn drain<T, F>(mut self, mut generate: F) -> Result<Vec<Planned<T>>, Error>
    where
        F: FnMut(G, &mut Self) -> Result<T, GenerateError>,
    {
        self.set_state(PlannerState::Draining);

        let mut planned = Vec::with_capacity(self.queue.len());
        while let Some((name, generator)) = self.queue.pop_front() {
            self.pending.remove(&name);
            // Visited before generating, so a generator never re-queues its own type.
            self.visited.insert(name.clone());

            let output = generate(generator, &mut self).map_err(|source| Error::Generation {
                type_name: name.clone(),
                source,
            })?;
            planned.push(Planned { name, output });
        }

        self.set_state(PlannerState::Done);
        Ok(planned)
    }

    fn set_state(&mut self, state: PlannerState) {
        trace!("planner: {:?} -> {:?}", self.state, state);
        self.state = state;
    }
}
