//! Dataset normalization
//!
//! Every external source passes through here before reaching a renderer. Two entry
//! points exist: [`from_document`] for the pre-built `{nodes, edges}` document and
//! [`from_notes`] for live note records.
//!
//! # Scaling limit
//!
//! The live path detects shared tags by comparing every pair of notes, which is
//! O(n²) in the number of notes. That is fine for corpora of a few hundred notes and
//! is kept as-is; large corpora will see this pass as the dominant load latency.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::model::{Category, Dataset, Edge, EdgeKind, GraphDocument, Node, NoteRecord};

/// Navigation path for a live note record
pub fn note_path(base_url: &str, id: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(id.as_bytes()).collect();
    format!("{}/docs/view/?id={}", base_url.trim_end_matches('/'), encoded)
}

/// Normalize a static `{nodes, edges}` document.
///
/// Duplicate node ids keep their first occurrence. Edges pointing at unknown nodes
/// and self-loops are dropped, parallel edges collapse onto one (a backlink wins over
/// a tag edge for the same pair), and neighbour counts are recomputed.
pub fn from_document(doc: GraphDocument) -> Dataset {
    let mut seen = HashSet::new();
    let mut nodes: Vec<Node> = doc
        .nodes
        .into_iter()
        .filter(|n| seen.insert(n.id.clone()))
        .collect();

    let mut order: Vec<String> = Vec::new();
    let mut by_key: HashMap<String, Edge> = HashMap::new();
    for edge in doc.edges {
        let known = seen.contains(&edge.source) && seen.contains(&edge.target);
        if edge.source == edge.target || !known {
            continue;
        }
        let key = Edge::dedup_key(&edge.source, &edge.target);
        match by_key.get_mut(&key) {
            Some(existing) => {
                if edge.kind == EdgeKind::Backlink {
                    existing.kind = EdgeKind::Backlink;
                }
            }
            None => {
                order.push(key.clone());
                by_key.insert(key, edge);
            }
        }
    }
    let edges: Vec<Edge> = order
        .iter()
        .filter_map(|key| by_key.remove(key))
        .collect();

    recount_neighbours(&mut nodes, &edges);
    debug!(
        nodes = nodes.len(),
        edges = edges.len(),
        "normalized static graph document"
    );
    Dataset::from_parts(nodes, edges)
}

/// Normalize live note records.
///
/// Records without a (non-blank) title are skipped. Every unordered pair of notes
/// sharing at least one tag gets exactly one `tag` edge.
pub fn from_notes(records: &[NoteRecord], base_url: &str) -> Dataset {
    let mut seen = HashSet::new();
    let mut nodes: Vec<Node> = records
        .iter()
        .filter_map(|record| {
            let title = record.title.as_deref()?.trim();
            if title.is_empty() || !seen.insert(record.id.clone()) {
                return None;
            }
            Some(Node {
                id: record.id.clone(),
                label: title.to_string(),
                path: note_path(base_url, &record.id),
                category: record
                    .destination
                    .as_deref()
                    .map(Category::from_destination)
                    .unwrap_or(Category::Default),
                tags: record.tags.clone(),
                number_neighbours: 0,
            })
        })
        .collect();

    let edges = tag_edges(&nodes);
    recount_neighbours(&mut nodes, &edges);
    debug!(
        records = records.len(),
        nodes = nodes.len(),
        edges = edges.len(),
        "normalized live note records"
    );
    Dataset::from_parts(nodes, edges)
}

/// Build one `tag` edge per unordered pair of nodes sharing a tag.
fn tag_edges(nodes: &[Node]) -> Vec<Edge> {
    let tag_sets: Vec<HashSet<&str>> = nodes
        .iter()
        .map(|n| n.tags.iter().map(String::as_str).collect())
        .collect();

    let mut keys = HashSet::new();
    let mut edges = Vec::new();
    for i in 0..nodes.len() {
        if tag_sets[i].is_empty() {
            continue;
        }
        for j in (i + 1)..nodes.len() {
            if tag_sets[i].is_disjoint(&tag_sets[j]) {
                continue;
            }
            let (a, b) = (&nodes[i].id, &nodes[j].id);
            if a == b || !keys.insert(Edge::dedup_key(a, b)) {
                continue;
            }
            let (source, target) = if a <= b { (a, b) } else { (b, a) };
            edges.push(Edge {
                source: source.clone(),
                target: target.clone(),
                kind: EdgeKind::Tag,
            });
        }
    }
    edges
}

fn recount_neighbours(nodes: &mut [Node], edges: &[Edge]) {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for edge in edges {
        *counts.entry(edge.source.as_str()).or_default() += 1;
        *counts.entry(edge.target.as_str()).or_default() += 1;
    }
    for node in nodes.iter_mut() {
        node.number_neighbours = counts.get(node.id.as_str()).copied().unwrap_or(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(id: &str, title: Option<&str>, destination: &str, tags: &[&str]) -> NoteRecord {
        NoteRecord {
            id: id.to_string(),
            title: title.map(str::to_string),
            destination: Some(destination.to_string()),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    fn node(id: &str) -> Node {
        Node {
            id: id.to_string(),
            label: id.to_uppercase(),
            path: format!("/notes/{id}/"),
            category: Category::Topics,
            tags: vec![],
            number_neighbours: 99,
        }
    }

    fn edge(source: &str, target: &str, kind: EdgeKind) -> Edge {
        Edge {
            source: source.to_string(),
            target: target.to_string(),
            kind,
        }
    }

    fn assert_neighbour_counts_match(dataset: &Dataset) {
        for n in dataset.nodes() {
            let incident = dataset.edges().iter().filter(|e| e.touches(&n.id)).count();
            assert_eq!(n.number_neighbours, incident, "node {}", n.id);
        }
    }

    #[test]
    fn untitled_records_are_skipped() {
        let records = vec![
            note("1", Some("Alpha"), "books", &[]),
            note("2", None, "books", &[]),
            note("3", Some("   "), "books", &[]),
        ];
        let dataset = from_notes(&records, "");
        assert_eq!(dataset.nodes().len(), 1);
        assert_eq!(dataset.nodes()[0].label, "Alpha");
    }

    #[test]
    fn destination_becomes_category_and_path_is_encoded() {
        let records = vec![note("a b/c", Some("Alpha"), "snippets", &[])];
        let dataset = from_notes(&records, "https://example.org/");
        let n = &dataset.nodes()[0];
        assert_eq!(n.category, Category::Snippets);
        assert_eq!(n.path, "https://example.org/docs/view/?id=a+b%2Fc");
    }

    #[test]
    fn shared_tags_produce_exactly_one_edge_per_pair() {
        let records = vec![
            note("1", Some("One"), "topics", &["rust", "graphs"]),
            note("2", Some("Two"), "topics", &["graphs", "rust"]),
            note("3", Some("Three"), "inbox", &["rust"]),
            note("4", Some("Four"), "inbox", &["cooking"]),
        ];
        let dataset = from_notes(&records, "");

        assert_eq!(dataset.edges().len(), 3);
        let mut keys: Vec<String> = dataset
            .edges()
            .iter()
            .map(|e| Edge::dedup_key(&e.source, &e.target))
            .collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys, vec!["1|2", "1|3", "2|3"]);
        assert!(dataset.edges().iter().all(|e| e.kind == EdgeKind::Tag));
        assert!(dataset.edges().iter().all(|e| e.source != e.target));
        assert_neighbour_counts_match(&dataset);
        assert_eq!(dataset.node("4").unwrap().number_neighbours, 0);
    }

    #[test]
    fn edge_set_independent_of_record_order() {
        let forward = vec![
            note("x", Some("X"), "topics", &["t"]),
            note("y", Some("Y"), "topics", &["t"]),
            note("z", Some("Z"), "topics", &["t", "u"]),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        let keys = |records: &[NoteRecord]| {
            let mut k: Vec<String> = from_notes(records, "")
                .edges()
                .iter()
                .map(|e| format!("{}|{}", e.source, e.target))
                .collect();
            k.sort();
            k
        };
        assert_eq!(keys(&forward), keys(&reversed));
    }

    #[test]
    fn duplicate_note_ids_do_not_create_self_loops() {
        let records = vec![
            note("1", Some("One"), "topics", &["t"]),
            note("1", Some("One again"), "topics", &["t"]),
        ];
        let dataset = from_notes(&records, "");
        assert_eq!(dataset.nodes().len(), 1);
        assert!(dataset.edges().is_empty());
    }

    #[test]
    fn static_document_is_deduplicated_and_recounted() {
        let doc = GraphDocument {
            nodes: vec![node("a"), node("b"), node("c"), node("a")],
            edges: vec![
                edge("a", "b", EdgeKind::Tag),
                edge("b", "a", EdgeKind::Backlink),
                edge("a", "a", EdgeKind::Tag),
                edge("a", "missing", EdgeKind::Tag),
                edge("c", "b", EdgeKind::Tag),
            ],
        };
        let dataset = from_document(doc);

        assert_eq!(dataset.nodes().len(), 3);
        assert_eq!(dataset.edges().len(), 2);
        assert_eq!(dataset.edges()[0].kind, EdgeKind::Backlink);
        assert_eq!(dataset.node("a").unwrap().number_neighbours, 1);
        assert_eq!(dataset.node("b").unwrap().number_neighbours, 2);
        assert_neighbour_counts_match(&dataset);
    }

    #[test]
    fn empty_inputs_produce_empty_dataset() {
        assert!(from_notes(&[], "").is_empty());
        assert!(from_document(GraphDocument::default()).is_empty());
    }
}
