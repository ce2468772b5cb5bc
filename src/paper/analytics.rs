use std::collections::BTreeMap;

use tracing::{debug, info};

use super::PaperGraph;

/// Summary of the last colouring pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComponentStats {
    pub num_colours: u32,
    pub largest_colour: u32,
    pub largest_size: usize,
    /// Component size -> number of components of that size.
    pub histogram: BTreeMap<usize, usize>,
}

impl PaperGraph {
    /// Counts, for every paper, the included papers referencing it. Only
    /// edges between two included papers contribute.
    pub fn recompute_included_citation_counts(&mut self) {
        for paper in &mut self.papers {
            paper.num_included_cites = 0;
        }

        for from in 0..self.papers.len() {
            if !self.papers[from].included {
                continue;
            }
            for slot in 0..self.papers[from].refs.len() {
                let target = self.papers[from].refs[slot].target;
                if self.papers[target].included {
                    self.papers[target].num_included_cites += 1;
                }
            }
        }
    }

    /// Floods one colour over the included component holding `start`.
    fn paint(&mut self, start: usize, colour: u32, stack: &mut Vec<usize>) {
        stack.clear();
        stack.push(start);

        while let Some(index) = stack.pop() {
            let paper = &mut self.papers[index];
            if !paper.included || paper.colour == colour {
                continue;
            }
            if paper.colour != 0 {
                panic!(
                    "paper {} already has colour {} while painting colour {}",
                    paper.id, paper.colour, colour
                );
            }
            paper.colour = colour;

            let paper = &self.papers[index];
            stack.extend(
                paper
                    .refs
                    .iter()
                    .map(|reference| reference.target)
                    .chain(paper.cites.iter().copied())
                    .filter(|&next| {
                        let next = &self.papers[next];
                        next.included && next.colour != colour
                    }),
            );
        }
    }

    /// Assigns each included connected component its own colour, in order of
    /// the lowest paper id in the component, and stores component sizes.
    pub fn recompute_colours(&mut self, verbose: bool) -> ComponentStats {
        for paper in &mut self.papers {
            paper.colour = 0;
            paper.num_with_my_colour = 0;
        }

        let mut next_colour = 1u32;
        let mut stack = Vec::new();
        for index in 0..self.papers.len() {
            let paper = &self.papers[index];
            if paper.included && paper.colour == 0 {
                self.paint(index, next_colour, &mut stack);
                next_colour += 1;
            }
        }

        let num_colours = next_colour - 1;
        let mut sizes = vec![0usize; next_colour as usize];
        for paper in &self.papers {
            if paper.colour != 0 {
                sizes[paper.colour as usize] += 1;
            }
        }
        for paper in &mut self.papers {
            if paper.colour != 0 {
                paper.num_with_my_colour = sizes[paper.colour as usize];
            }
        }

        let mut stats = ComponentStats {
            num_colours,
            ..ComponentStats::default()
        };
        for (colour, &size) in sizes.iter().enumerate().skip(1) {
            *stats.histogram.entry(size).or_default() += 1;
            if size > stats.largest_size {
                stats.largest_size = size;
                stats.largest_colour = colour as u32;
            }
        }

        if verbose {
            info!("{num_colours} colours");
            for (size, count) in &stats.histogram {
                info!("size {size} occurred {count} times");
            }
        } else {
            debug!(
                num_colours,
                largest = stats.largest_size,
                "recomputed colours"
            );
        }

        stats
    }
}
