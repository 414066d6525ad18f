//! Transitive closure over a synonym dictionary.
//!
//! Synonymy as judged pairwise is noisy and only locally consistent; the
//! closure makes it usable as an equivalence-ish relation by completing every
//! connected component into a clique: if A–B and B–C were registered, A–C is
//! added. Applied offline after population runs; the live generators only
//! ever read the result.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use tracing::debug;

use crate::store::SynonymDict;

/// Return a copy of `dict` with every synonym component fully connected.
/// Idempotent: a second application changes nothing.
pub fn closure(dict: &SynonymDict) -> SynonymDict {
  let graph = build_graph(&dict.synonyms);
  let components = connected_components(&graph);

  let mut result = dict.clone();
  let mut added = 0usize;
  for component in &components {
    for term in component {
      let entry = result.synonyms.entry(term.clone()).or_default();
      let have: HashSet<&String> = entry.iter().collect();
      let missing: Vec<String> = component
        .iter()
        .filter(|other| *other != term && !have.contains(other))
        .cloned()
        .collect();
      added += missing.len();
      entry.extend(missing);
    }
  }
  debug!(
    components = components.len(),
    edges_added = added,
    "Computed synonym closure"
  );
  result
}

/// Undirected adjacency from a possibly asymmetric, possibly partial mapping.
fn build_graph(synonyms: &BTreeMap<String, Vec<String>>) -> HashMap<String, HashSet<String>> {
  let mut graph: HashMap<String, HashSet<String>> = HashMap::new();
  for (term, listed) in synonyms {
    let entry = graph.entry(term.clone()).or_default();
    entry.extend(listed.iter().cloned());
    for synonym in listed {
      graph.entry(synonym.clone()).or_default().insert(term.clone());
    }
  }
  graph
}

/// BFS connected components; only components with more than one member are
/// returned since singletons need no completion.
fn connected_components(graph: &HashMap<String, HashSet<String>>) -> Vec<BTreeSet<String>> {
  let mut visited: HashSet<&String> = HashSet::new();
  let mut components = Vec::new();

  let mut terms: Vec<&String> = graph.keys().collect();
  terms.sort();
  for start in terms {
    if visited.contains(start) {
      continue;
    }
    let mut component = BTreeSet::new();
    let mut queue = VecDeque::new();
    visited.insert(start);
    component.insert(start.clone());
    queue.push_back(start);
    while let Some(current) = queue.pop_front() {
      if let Some(neighbors) = graph.get(current) {
        for neighbor in neighbors {
          if visited.insert(neighbor) {
            component.insert(neighbor.clone());
            queue.push_back(neighbor);
          }
        }
      }
    }
    if component.len() > 1 {
      components.push(component);
    }
  }
  components
}
