use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use tracing::info;

use super::graph::{MAX_CATEGORIES, PaperRecord};

const CATEGORIES: [&str; 4] = ["hep-th", "hep-ph", "gr-qc", "astro-ph"];
const OTHER_CATEGORY: u8 = CATEGORIES.len() as u8 + 1;

#[derive(Clone, Debug, Deserialize)]
struct RawPaper {
    id: u32,
    #[serde(default)]
    categories: Vec<String>,
    #[serde(default)]
    authors: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    refs: String,
    #[serde(default)]
    other_weights: Option<Vec<f32>>,
}

/// Maps an arXiv category name to its compact code. Code 0 is reserved for
/// empty category slots.
pub fn category_code(name: &str) -> u8 {
    CATEGORIES
        .iter()
        .position(|known| known.eq_ignore_ascii_case(name))
        .map(|position| position as u8 + 1)
        .unwrap_or(OTHER_CATEGORY)
}

pub fn category_name(code: u8) -> &'static str {
    match code {
        0 => "unknown",
        code if code <= CATEGORIES.len() as u8 => CATEGORIES[code as usize - 1],
        _ => "other",
    }
}

fn parse_papers(raw: &str, wanted_categories: &[String]) -> Result<Vec<PaperRecord>> {
    let parsed: Vec<RawPaper> =
        serde_json::from_str(raw).context("invalid JSON in paper dump")?;

    let mut records = Vec::with_capacity(parsed.len());
    for paper in parsed {
        if !wanted_categories.is_empty()
            && !paper.categories.iter().any(|category| {
                wanted_categories
                    .iter()
                    .any(|wanted| wanted.eq_ignore_ascii_case(category))
            })
        {
            continue;
        }

        let refs_blob = hex::decode(paper.refs.trim())
            .with_context(|| format!("refs of paper {} are not valid hex", paper.id))?;

        records.push(PaperRecord {
            id: paper.id,
            categories: paper
                .categories
                .iter()
                .take(MAX_CATEGORIES)
                .map(|category| category_code(category))
                .collect(),
            authors: paper.authors,
            title: paper.title,
            refs_blob,
            other_weights: paper.other_weights,
        });
    }

    Ok(records)
}

/// Reads a JSON array of paper records, keeping only papers in one of
/// `wanted_categories` when that list is non-empty.
pub fn load_papers(path: &Path, wanted_categories: &[String]) -> Result<Vec<PaperRecord>> {
    info!("reading papers from {}", path.display());
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read paper dump {}", path.display()))?;
    let records = parse_papers(&raw, wanted_categories)
        .with_context(|| format!("failed to parse paper dump {}", path.display()))?;

    if records.is_empty() {
        return Err(anyhow!("no papers matched in {}", path.display()));
    }
    info!("loaded {} paper records", records.len());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::paper::refs::{RefRecord, encode_refs};

    fn refs_hex(ids: &[u32]) -> String {
        let records = ids
            .iter()
            .map(|&id| RefRecord {
                id,
                order: 0,
                freq: 1,
                cites: 0,
            })
            .collect::<Vec<_>>();
        hex::encode(encode_refs(&records))
    }

    #[test]
    fn category_codes_round_trip_known_names() {
        assert_eq!(category_code("hep-th"), 1);
        assert_eq!(category_code("HEP-PH"), 2);
        assert_eq!(category_code("math.AG"), OTHER_CATEGORY);
        assert_eq!(category_name(category_code("gr-qc")), "gr-qc");
        assert_eq!(category_name(0), "unknown");
        assert_eq!(category_name(OTHER_CATEGORY), "other");
    }

    #[test]
    fn parses_records_and_filters_categories() {
        let raw = format!(
            r#"[
                {{"id": 1, "categories": ["hep-th"], "authors": "A", "title": "One", "refs": ""}},
                {{"id": 2, "categories": ["cond-mat", "hep-ph"], "title": "Two", "refs": "{}"}},
                {{"id": 3, "categories": ["math.AG"], "refs": ""}}
            ]"#,
            refs_hex(&[1])
        );

        let all = parse_papers(&raw, &[]).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[1].categories, vec![OTHER_CATEGORY, 2]);
        assert_eq!(all[1].refs_blob.len(), 10);

        let filtered = parse_papers(&raw, &["hep-th".to_owned(), "hep-ph".to_owned()]).unwrap();
        let ids = filtered.iter().map(|record| record.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn bad_hex_is_reported_with_the_paper_id() {
        let error = parse_papers(r#"[{"id": 9, "refs": "zz"}]"#, &[]).unwrap_err();
        assert!(format!("{error:#}").contains("paper 9"));
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id": 5, "categories": ["gr-qc"], "refs": "{}"}}, {{"id": 6}}]"#,
            refs_hex(&[6])
        )
        .unwrap();

        let records = load_papers(file.path(), &[]).unwrap();
        assert_eq!(records.len(), 2);
        assert!(load_papers(file.path(), &["astro-ph".to_owned()]).is_err());
    }
}
