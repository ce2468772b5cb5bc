use tracing::debug;

use super::{PaperGraph, TredMark};

const NO_COMPONENT: u32 = u32::MAX;

/// Reference edges of the included subgraph that survive reduction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransitiveReduction {
    pub edges: Vec<(usize, usize)>,
    pub removed: usize,
}

/// Strongly connected components of the included subgraph.
struct Components {
    of_paper: Vec<u32>,
    count: usize,
}

/// A reduction in progress, worked off a slice at a time with
/// [`TredJob::advance`].
///
/// Only components that can reach a changed paper are queued: the edges of
/// any other paper see the same reachable subgraph as before, so their marks
/// stand. Papers not reduced yet keep their previous marks. Admitting papers
/// only adds paths, so a reference already marked redundant stays
/// redundant.
pub struct TredJob {
    components: Components,
    /// Condensation edges, sorted and deduplicated per component.
    successors: Vec<Vec<u32>>,
    members: Vec<Vec<usize>>,
    queue: Vec<u32>,
    visited: Vec<u32>,
    direct: Vec<u32>,
    stamp: u32,
    walk: Vec<u32>,
    redundant: Vec<u32>,
}

impl TredJob {
    /// Components still waiting to be reduced.
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    pub fn is_finished(&self) -> bool {
        self.queue.is_empty()
    }

    /// Reduces queued components until about `budget` condensation edges
    /// have been walked, writing the marks of their papers. At least one
    /// component is reduced per call. Returns whether the job is finished.
    pub fn advance(&mut self, graph: &mut PaperGraph, budget: usize) -> bool {
        let mut work = 0usize;
        while let Some(from) = self.queue.pop() {
            work = work.saturating_add(self.reduce_component(from));
            self.apply_marks(graph, from);
            if work >= budget {
                break;
            }
        }
        self.is_finished()
    }

    /// Collects into `self.redundant` the direct successors of `from` that
    /// are also reached through another successor. Returns the edges walked.
    fn reduce_component(&mut self, from: u32) -> usize {
        self.stamp += 1;
        let stamp = self.stamp;
        self.redundant.clear();

        let direct_successors = &self.successors[from as usize];
        for &to in direct_successors {
            self.direct[to as usize] = stamp;
        }

        let mut work = direct_successors.len();
        for &root in direct_successors {
            if self.visited[root as usize] == stamp {
                continue;
            }
            self.visited[root as usize] = stamp;
            self.walk.push(root);
            while let Some(component) = self.walk.pop() {
                let next_components = &self.successors[component as usize];
                work += next_components.len();
                for &next in next_components {
                    if self.direct[next as usize] == stamp {
                        self.redundant.push(next);
                    }
                    if self.visited[next as usize] != stamp {
                        self.visited[next as usize] = stamp;
                        self.walk.push(next);
                    }
                }
            }
        }

        self.redundant.sort_unstable();
        self.redundant.dedup();
        work
    }

    fn apply_marks(&self, graph: &mut PaperGraph, from: u32) {
        for &source in &self.members[from as usize] {
            let paper = &mut graph.papers[source];
            for (reference, mark) in paper.refs.iter().zip(paper.tred.refs_marks.iter_mut()) {
                let to = self.components.of_paper[reference.target];
                *mark = if reference.target == source || to == NO_COMPONENT {
                    TredMark::Unresolved
                } else if to != from && self.redundant.binary_search(&to).is_ok() {
                    TredMark::Redundant
                } else {
                    TredMark::Kept
                };
            }
        }
    }
}

impl PaperGraph {
    /// Removes every included reference `u -> v` whose target stays reachable
    /// through other references.
    ///
    /// References between papers on a common citation cycle are always kept.
    /// The rest are reduced on the acyclic graph of cycles, which makes the
    /// result exact for acyclic inputs and reachability-preserving for all.
    pub fn compute_transitive_reduction(&mut self) -> TransitiveReduction {
        for paper in &mut self.papers {
            paper.tred.refs_marks.fill(TredMark::Unresolved);
        }

        let included = self
            .papers
            .iter()
            .filter(|paper| paper.included)
            .map(|paper| paper.index)
            .collect::<Vec<_>>();
        let mut job = self.start_transitive_reduction(&included);
        job.advance(self, usize::MAX);
        self.reduction_from_marks()
    }

    /// Prepares a reduction that brings the marks up to date after the papers
    /// in `changed` joined the included set. Finding the components costs one
    /// pass over the included references; the reduction itself is left to
    /// [`TredJob::advance`].
    pub fn start_transitive_reduction(&mut self, changed: &[usize]) -> TredJob {
        let components = self.strongly_connected_components();
        let successors = self.component_successors(&components);

        let mut affected = vec![false; self.papers.len()];
        let mut stack = Vec::new();
        for &index in changed {
            if self.papers.get(index).is_some_and(|paper| paper.included) && !affected[index] {
                affected[index] = true;
                stack.push(index);
            }
        }
        while let Some(index) = stack.pop() {
            for &citing in &self.papers[index].cites {
                if self.papers[citing].included && !affected[citing] {
                    affected[citing] = true;
                    stack.push(citing);
                }
            }
        }

        let mut members = vec![Vec::new(); components.count];
        let mut queue = Vec::new();
        for (index, _) in affected.iter().enumerate().filter(|(_, affected)| **affected) {
            let component = components.of_paper[index];
            if members[component as usize].is_empty() {
                queue.push(component);
            }
            members[component as usize].push(index);
        }

        debug!(
            changed = changed.len(),
            queued = queue.len(),
            components = components.count,
            "started transitive reduction"
        );
        TredJob {
            visited: vec![0; components.count],
            direct: vec![0; components.count],
            components,
            successors,
            members,
            queue,
            stamp: 0,
            walk: Vec::new(),
            redundant: Vec::new(),
        }
    }

    /// Kept edges and the removed count, as currently marked.
    pub fn reduction_from_marks(&self) -> TransitiveReduction {
        let mut result = TransitiveReduction::default();
        for paper in self.papers.iter().filter(|paper| paper.included) {
            for (reference, &mark) in paper.refs.iter().zip(&paper.tred.refs_marks) {
                match mark {
                    TredMark::Kept => result.edges.push((paper.index, reference.target)),
                    TredMark::Redundant => result.removed += 1,
                    TredMark::Unresolved => {}
                }
            }
        }
        result
    }

    /// Tarjan's algorithm over included references. The papers' follow-back
    /// links act as the call stack and the visit stamp as discovery order.
    fn strongly_connected_components(&mut self) -> Components {
        let count = self.papers.len();
        let mut of_paper = vec![NO_COMPONENT; count];
        let mut low = vec![0u32; count];
        let mut on_stack = vec![false; count];
        let mut stack = Vec::new();
        let mut next_stamp = 1u32;
        let mut next_component = 0u32;

        for paper in &mut self.papers {
            paper.tred.visit_stamp = 0;
            paper.tred.follow_back = None;
        }

        for start in 0..count {
            if !self.papers[start].included || self.papers[start].tred.visit_stamp != 0 {
                continue;
            }

            self.papers[start].tred.visit_stamp = next_stamp;
            low[start] = next_stamp;
            next_stamp += 1;
            stack.push(start);
            on_stack[start] = true;

            let mut current = start;
            let mut slot = 0usize;
            loop {
                if let Some(reference) = self.papers[current].refs.get(slot) {
                    let next = reference.target;
                    slot += 1;
                    if !self.papers[next].included {
                        continue;
                    }

                    let next_visit = self.papers[next].tred.visit_stamp;
                    if next_visit == 0 {
                        self.papers[next].tred.visit_stamp = next_stamp;
                        self.papers[next].tred.follow_back = Some((current, slot));
                        low[next] = next_stamp;
                        next_stamp += 1;
                        stack.push(next);
                        on_stack[next] = true;
                        current = next;
                        slot = 0;
                    } else if on_stack[next] {
                        // Back to a paper still being visited: a cycle.
                        low[current] = low[current].min(next_visit);
                    }
                    continue;
                }

                if low[current] == self.papers[current].tred.visit_stamp {
                    while let Some(member) = stack.pop() {
                        on_stack[member] = false;
                        of_paper[member] = next_component;
                        if member == current {
                            break;
                        }
                    }
                    next_component += 1;
                }

                match self.papers[current].tred.follow_back.take() {
                    Some((parent, resume)) => {
                        low[parent] = low[parent].min(low[current]);
                        current = parent;
                        slot = resume;
                    }
                    None => break,
                }
            }
        }

        Components {
            of_paper,
            count: next_component as usize,
        }
    }

    fn component_successors(&self, components: &Components) -> Vec<Vec<u32>> {
        let mut successors = vec![Vec::new(); components.count];
        for paper in self.papers.iter().filter(|paper| paper.included) {
            let from = components.of_paper[paper.index];
            for reference in &paper.refs {
                let to = components.of_paper[reference.target];
                if to != NO_COMPONENT && to != from {
                    successors[from as usize].push(to);
                }
            }
        }
        for list in &mut successors {
            list.sort_unstable();
            list.dedup();
        }
        successors
    }
}
