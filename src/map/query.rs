use std::fmt;

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use super::MapEnv;
use crate::error::{MapError, Result};
use crate::paper::category_name;

/// What the viewer shows about a clicked paper.
#[derive(Clone, Debug, PartialEq)]
pub struct PaperInfo {
    pub index: usize,
    pub id: u32,
    pub category: &'static str,
    pub num_refs: usize,
    pub num_cites: usize,
    pub num_included_cites: usize,
    pub colour: u32,
    pub component_size: usize,
    pub authors: String,
    pub title: String,
}

impl fmt::Display for PaperInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "paper[{}] = {} ({} refs, {} cites) {} -- {}",
            self.index, self.id, self.num_refs, self.num_cites, self.authors, self.title
        )
    }
}

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

impl MapEnv {
    pub fn paper_info(&self, index: usize) -> Result<PaperInfo> {
        let paper = self.graph.paper(index)?;
        if !paper.included {
            return Err(MapError::NotIncluded { index });
        }

        Ok(PaperInfo {
            index,
            id: paper.id,
            category: category_name(paper.main_category()),
            num_refs: paper.refs.len(),
            num_cites: paper.cites.len(),
            num_included_cites: paper.num_included_cites,
            colour: paper.colour,
            component_size: paper.num_with_my_colour,
            authors: paper.authors.clone(),
            title: paper.title.clone(),
        })
    }

    /// Included papers whose title or authors fuzzily match `query`, best
    /// first.
    pub fn find_papers(&self, query: &str, limit: usize) -> Vec<usize> {
        let query = query.trim();
        if query.is_empty() || limit == 0 {
            return Vec::new();
        }

        let matcher = SkimMatcherV2::default();
        let mut scored = self
            .graph
            .papers()
            .iter()
            .filter(|paper| paper.included)
            .filter_map(|paper| {
                let title = fuzzy_match_score(&matcher, &paper.title, query);
                let authors = fuzzy_match_score(&matcher, &paper.authors, query);
                title.max(authors).map(|score| (score, paper.index))
            })
            .collect::<Vec<_>>();

        scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        scored.truncate(limit);
        scored.into_iter().map(|(_, index)| index).collect()
    }
}
