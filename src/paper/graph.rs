use eframe::egui::Vec2;
use tracing::{debug, info, warn};

use crate::error::{MapError, Result};

use super::refs::decode_refs;

pub const MAX_CATEGORIES: usize = 4;

/// A paper as handed over by the loader, before its references are resolved.
#[derive(Clone, Debug, Default)]
pub struct PaperRecord {
    pub id: u32,
    pub categories: Vec<u8>,
    pub authors: String,
    pub title: String,
    pub refs_blob: Vec<u8>,
    /// Optional secondary weight per blob record, in blob order.
    pub other_weights: Option<Vec<f32>>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reference {
    pub target: usize,
    pub ref_freq: u8,
    pub other_weight: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TredMark {
    #[default]
    Unresolved,
    Kept,
    Redundant,
}

/// Scratch state owned by the transitive reduction walk.
#[derive(Clone, Debug, Default)]
pub struct TredState {
    pub(crate) visit_stamp: u32,
    pub(crate) refs_marks: Vec<TredMark>,
    /// Paper the walk arrived from and the ref slot to resume at there.
    pub(crate) follow_back: Option<(usize, usize)>,
}

#[derive(Clone, Debug)]
pub struct Paper {
    pub id: u32,
    pub index: usize,
    pub categories: [u8; MAX_CATEGORIES],
    pub authors: String,
    pub title: String,
    pub refs: Vec<Reference>,
    pub cites: Vec<usize>,
    pub included: bool,
    pub colour: u32,
    pub num_with_my_colour: usize,
    pub num_included_cites: usize,
    pub fake_links: Vec<usize>,
    pub pos: Vec2,
    pub velocity: Vec2,
    pub age: f32,
    pub radius: f32,
    pub mass: f32,
    pub(crate) tred: TredState,
}

impl Paper {
    fn new(index: usize, record: PaperRecord, refs: Vec<Reference>) -> Self {
        let mut categories = [0u8; MAX_CATEGORIES];
        for (slot, code) in categories.iter_mut().zip(record.categories) {
            *slot = code;
        }

        let tred = TredState {
            refs_marks: vec![TredMark::Unresolved; refs.len()],
            ..TredState::default()
        };

        Self {
            id: record.id,
            index,
            categories,
            authors: record.authors,
            title: record.title,
            refs,
            cites: Vec::new(),
            included: false,
            colour: 0,
            num_with_my_colour: 0,
            num_included_cites: 0,
            fake_links: Vec::new(),
            pos: Vec2::ZERO,
            velocity: Vec2::ZERO,
            age: 0.0,
            radius: 0.0,
            mass: 0.0,
            tred,
        }
    }

    pub fn main_category(&self) -> u8 {
        self.categories[0]
    }
}

/// Paper arena sorted ascending by id. All adjacency is stored as indices
/// into this arena.
#[derive(Clone, Debug, Default)]
pub struct PaperGraph {
    pub(crate) papers: Vec<Paper>,
    num_refs: usize,
}

fn search_sorted(papers: &[Paper], id: u32) -> Option<usize> {
    papers.binary_search_by_key(&id, |paper| paper.id).ok()
}

impl PaperGraph {
    pub fn build(mut records: Vec<PaperRecord>) -> Result<Self> {
        records.sort_by_key(|record| record.id);
        let received = records.len();
        records.dedup_by_key(|record| record.id);
        if records.len() != received {
            warn!(
                dropped = received - records.len(),
                "duplicate paper ids in input; keeping the first of each"
            );
        }
        info!("read {} papers", records.len());

        let ids = records.iter().map(|record| record.id).collect::<Vec<_>>();
        let mut papers = Vec::with_capacity(records.len());
        let mut num_refs = 0usize;
        let mut unresolved = 0usize;

        for (index, record) in records.into_iter().enumerate() {
            let decoded = decode_refs(record.id, &record.refs_blob)?;
            let weights = record.other_weights.as_deref().unwrap_or(&[]);

            let mut refs = Vec::with_capacity(decoded.len());
            for (slot, entry) in decoded.iter().enumerate() {
                let Ok(target) = ids.binary_search(&entry.id) else {
                    unresolved += 1;
                    continue;
                };
                refs.push(Reference {
                    target,
                    ref_freq: entry.freq.min(u16::from(u8::MAX)) as u8,
                    other_weight: weights.get(slot).copied().unwrap_or(1.0),
                });
            }

            num_refs += refs.len();
            papers.push(Paper::new(index, record, refs));
        }

        info!("read {num_refs} total refs");
        debug!(unresolved, "dropped refs to papers outside the loaded set");

        let mut cite_counts = vec![0usize; papers.len()];
        for paper in &papers {
            for reference in &paper.refs {
                cite_counts[reference.target] += 1;
            }
        }
        for (paper, &count) in papers.iter_mut().zip(&cite_counts) {
            paper.cites = Vec::with_capacity(count);
        }
        for from in 0..papers.len() {
            for slot in 0..papers[from].refs.len() {
                let target = papers[from].refs[slot].target;
                papers[target].cites.push(from);
            }
        }

        Ok(Self { papers, num_refs })
    }

    pub fn lookup_by_id(&self, id: u32) -> Option<usize> {
        search_sorted(&self.papers, id)
    }

    pub fn len(&self) -> usize {
        self.papers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.papers.is_empty()
    }

    pub fn num_refs(&self) -> usize {
        self.num_refs
    }

    pub fn num_included(&self) -> usize {
        self.papers.iter().filter(|paper| paper.included).count()
    }

    pub fn papers(&self) -> &[Paper] {
        &self.papers
    }

    pub fn paper(&self, index: usize) -> Result<&Paper> {
        self.papers
            .get(index)
            .ok_or(MapError::UnknownIndex { index })
    }
}
