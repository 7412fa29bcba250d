//! Content-model matching.
//!
//! Each element-only content model is compiled into a Thompson NFA and
//! simulated on sets of states, so matching is linear in the number of
//! children and never backtracks.

use std::collections::BTreeSet;

use super::grammar::{Occurrence, Particle};

type StateSet = BTreeSet<usize>;

#[derive(Debug, Clone)]
enum Edge {
    Epsilon(usize),
    Name(String, usize),
}

#[derive(Debug, Clone)]
pub struct ContentAutomaton {
    edges: Vec<Vec<Edge>>,
    start: usize,
    accept: usize,
}

/// Where a child sequence stopped matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    /// The child at `index` is not allowed at that point.
    Unexpected { index: usize, expected: Vec<String> },
    /// All children matched but the model needs more.
    Incomplete { expected: Vec<String> },
}

impl ContentAutomaton {
    pub fn compile(particle: &Particle) -> Self {
        let mut builder = Builder::default();
        let (start, accept) = builder.fragment(particle);
        Self {
            edges: builder.edges,
            start,
            accept,
        }
    }

    /// Run the child element names through the automaton.
    pub fn check<'a>(&self, children: impl IntoIterator<Item = &'a str>) -> Result<(), Mismatch> {
        let mut states = self.closure([self.start]);
        for (index, name) in children.into_iter().enumerate() {
            let next = self.step(&states, name);
            if next.is_empty() {
                return Err(Mismatch::Unexpected {
                    index,
                    expected: self.expected(&states),
                });
            }
            states = next;
        }
        if states.contains(&self.accept) {
            Ok(())
        } else {
            Err(Mismatch::Incomplete {
                expected: self.expected(&states),
            })
        }
    }

    fn step(&self, states: &StateSet, name: &str) -> StateSet {
        let targets = states.iter().flat_map(|&state| {
            self.edges[state].iter().filter_map(move |edge| match edge {
                Edge::Name(label, target) if label == name => Some(*target),
                _ => None,
            })
        });
        self.closure(targets)
    }

    fn closure(&self, seeds: impl IntoIterator<Item = usize>) -> StateSet {
        let mut seen = StateSet::new();
        let mut stack: Vec<usize> = seeds.into_iter().collect();
        while let Some(state) = stack.pop() {
            if !seen.insert(state) {
                continue;
            }
            for edge in &self.edges[state] {
                if let Edge::Epsilon(target) = edge {
                    stack.push(*target);
                }
            }
        }
        seen
    }

    /// Names that may follow, sorted and deduplicated.
    fn expected(&self, states: &StateSet) -> Vec<String> {
        let names: BTreeSet<&str> = states
            .iter()
            .flat_map(|&state| &self.edges[state])
            .filter_map(|edge| match edge {
                Edge::Name(label, _) => Some(label.as_str()),
                Edge::Epsilon(_) => None,
            })
            .collect();
        names.into_iter().map(str::to_string).collect()
    }
}

#[derive(Default)]
struct Builder {
    edges: Vec<Vec<Edge>>,
}

impl Builder {
    fn state(&mut self) -> usize {
        self.edges.push(Vec::new());
        self.edges.len() - 1
    }

    fn epsilon(&mut self, from: usize, to: usize) {
        self.edges[from].push(Edge::Epsilon(to));
    }

    /// Returns the (entry, exit) states of the fragment.
    fn fragment(&mut self, particle: &Particle) -> (usize, usize) {
        let (entry, exit) = match particle {
            Particle::Name(name, _) => {
                let entry = self.state();
                let exit = self.state();
                self.edges[entry].push(Edge::Name(name.clone(), exit));
                (entry, exit)
            }
            Particle::Seq(items, _) => {
                let entry = self.state();
                let mut exit = entry;
                for item in items {
                    let (item_entry, item_exit) = self.fragment(item);
                    self.epsilon(exit, item_entry);
                    exit = item_exit;
                }
                (entry, exit)
            }
            Particle::Choice(items, _) => {
                let entry = self.state();
                let exit = self.state();
                for item in items {
                    let (item_entry, item_exit) = self.fragment(item);
                    self.epsilon(entry, item_entry);
                    self.epsilon(item_exit, exit);
                }
                (entry, exit)
            }
        };
        self.repeat(particle.occurrence(), entry, exit)
    }

    fn repeat(&mut self, occurrence: Occurrence, entry: usize, exit: usize) -> (usize, usize) {
        if occurrence == Occurrence::Once {
            return (entry, exit);
        }
        let outer_entry = self.state();
        let outer_exit = self.state();
        self.epsilon(outer_entry, entry);
        self.epsilon(exit, outer_exit);
        if matches!(occurrence, Occurrence::Optional | Occurrence::ZeroOrMore) {
            self.epsilon(outer_entry, outer_exit);
        }
        if matches!(occurrence, Occurrence::ZeroOrMore | Occurrence::OneOrMore) {
            self.epsilon(exit, entry);
        }
        (outer_entry, outer_exit)
    }
}
