use tracing::debug;

use crate::paper::{ComponentStats, PaperGraph};

/// Rebuilds the layout-only links that tie every smaller component to the
/// largest one. The lowest-id paper of each component is linked to the
/// member of the largest component closest to it in id. Returns the number
/// of links made.
pub fn rebuild_fake_links(graph: &mut PaperGraph, stats: &ComponentStats) -> usize {
    for paper in &mut graph.papers {
        paper.fake_links.clear();
    }
    if stats.num_colours < 2 || stats.largest_colour == 0 {
        return 0;
    }

    let anchors = graph
        .papers()
        .iter()
        .filter(|paper| paper.included && paper.colour == stats.largest_colour)
        .map(|paper| paper.index)
        .collect::<Vec<_>>();
    if anchors.is_empty() {
        return 0;
    }

    let mut linked = vec![false; stats.num_colours as usize + 1];
    linked[stats.largest_colour as usize] = true;
    let mut made = 0usize;

    for index in 0..graph.papers.len() {
        let colour = graph.papers[index].colour as usize;
        if !graph.papers[index].included || colour == 0 || colour >= linked.len() || linked[colour]
        {
            continue;
        }
        linked[colour] = true;

        let anchor = nearest_anchor(graph, &anchors, index);
        graph.papers[index].fake_links.push(anchor);
        made += 1;
    }

    debug!(links = made, "rebuilt component links");
    made
}

fn nearest_anchor(graph: &PaperGraph, anchors: &[usize], index: usize) -> usize {
    let id = graph.papers()[index].id;
    let split = anchors.partition_point(|&anchor| anchor < index);
    let after = anchors.get(split).copied();
    let before = split.checked_sub(1).map(|slot| anchors[slot]);

    match (before, after) {
        (Some(before), Some(after)) => {
            let before_gap = id - graph.papers()[before].id;
            let after_gap = graph.papers()[after].id - id;
            if after_gap < before_gap { after } else { before }
        }
        (Some(only), None) | (None, Some(only)) => only,
        (None, None) => index,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paper::test_support::{graph_from_refs, include_all};

    fn fake_targets(graph: &PaperGraph) -> Vec<(u32, Vec<u32>)> {
        graph
            .papers()
            .iter()
            .filter(|paper| !paper.fake_links.is_empty())
            .map(|paper| {
                let targets = paper
                    .fake_links
                    .iter()
                    .map(|&target| graph.papers()[target].id)
                    .collect();
                (paper.id, targets)
            })
            .collect()
    }

    #[test]
    fn small_components_link_to_the_nearest_id_in_the_largest() {
        let mut graph = graph_from_refs(&[
            (10, &[]),
            (20, &[10]),
            (30, &[20]),
            (40, &[30]),
            (25, &[]),
            (26, &[25]),
            (90, &[]),
        ]);
        include_all(&mut graph);
        let stats = graph.recompute_colours(false);

        assert_eq!(rebuild_fake_links(&mut graph, &stats), 2);
        assert_eq!(
            fake_targets(&graph),
            vec![(25, vec![20]), (90, vec![40])]
        );
    }

    #[test]
    fn links_are_rebuilt_from_scratch() {
        let mut graph = graph_from_refs(&[(1, &[]), (2, &[1]), (3, &[])]);
        include_all(&mut graph);
        let stats = graph.recompute_colours(false);
        rebuild_fake_links(&mut graph, &stats);
        assert_eq!(fake_targets(&graph), vec![(3, vec![2])]);

        graph.papers[2].included = false;
        let stats = graph.recompute_colours(false);
        assert_eq!(rebuild_fake_links(&mut graph, &stats), 0);
        assert!(fake_targets(&graph).is_empty());
    }

    #[test]
    fn fake_links_leave_analytics_alone() {
        let mut graph = graph_from_refs(&[(1, &[]), (2, &[1]), (3, &[])]);
        include_all(&mut graph);
        let stats = graph.recompute_colours(false);
        rebuild_fake_links(&mut graph, &stats);

        let again = graph.recompute_colours(false);
        assert_eq!(again, stats);
        assert_eq!(again.num_colours, 2);
        assert_eq!(graph.papers()[2].num_with_my_colour, 1);
    }
}
