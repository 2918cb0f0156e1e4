use crate::article::ArticleRef;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use std::collections::HashMap;

/// Directed "A links to B" graph over articles. Nodes are never removed, so
/// node indices follow insertion order.
#[derive(Debug, Clone)]
pub struct LinkGraph {
    graph: DiGraph<ArticleRef, ()>,
    index: HashMap<ArticleRef, NodeIndex>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphExport {
    pub seed: String,
    pub node_count: usize,
    pub edge_count: usize,
    pub nodes: Vec<String>,
    pub edges: Vec<(String, String)>,
}

impl LinkGraph {
    pub fn new(seed: ArticleRef) -> Self {
        let mut graph = Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
        };
        graph.add_node(seed);
        graph
    }

    pub fn add_node(&mut self, article: ArticleRef) -> NodeIndex {
        if let Some(idx) = self.index.get(&article) {
            return *idx;
        }
        let idx = self.graph.add_node(article.clone());
        self.index.insert(article, idx);
        idx
    }

    /// Adds `from -> to`, creating missing nodes. Returns false when the
    /// edge already existed.
    pub fn add_edge(&mut self, from: &ArticleRef, to: &ArticleRef) -> bool {
        let a = self.add_node(from.clone());
        let b = self.add_node(to.clone());
        if self.graph.find_edge(a, b).is_some() {
            return false;
        }
        self.graph.add_edge(a, b, ());
        true
    }

    /// The first node ever added.
    pub fn seed(&self) -> &ArticleRef {
        &self.graph[NodeIndex::new(0)]
    }

    pub fn contains(&self, article: &ArticleRef) -> bool {
        self.index.contains_key(article)
    }

    pub fn contains_edge(&self, from: &ArticleRef, to: &ArticleRef) -> bool {
        match (self.index.get(from), self.index.get(to)) {
            (Some(a), Some(b)) => self.graph.contains_edge(*a, *b),
            _ => false,
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &ArticleRef> {
        self.graph.node_indices().map(|idx| &self.graph[idx])
    }

    pub fn edges(&self) -> impl Iterator<Item = (&ArticleRef, &ArticleRef)> {
        self.graph.raw_edges().iter().map(|edge| {
            (
                &self.graph[edge.source()],
                &self.graph[edge.target()],
            )
        })
    }

    pub fn in_degree(&self, article: &ArticleRef) -> usize {
        self.degree(article, Direction::Incoming)
    }

    pub fn out_degree(&self, article: &ArticleRef) -> usize {
        self.degree(article, Direction::Outgoing)
    }

    /// `(article, in-degree)` for every node, in insertion order.
    pub fn in_degrees(&self) -> Vec<(&ArticleRef, usize)> {
        self.graph
            .node_indices()
            .map(|idx| {
                (
                    &self.graph[idx],
                    self.graph.neighbors_directed(idx, Direction::Incoming).count(),
                )
            })
            .collect()
    }

    pub fn successors(&self, article: &ArticleRef) -> Vec<&ArticleRef> {
        let Some(idx) = self.index.get(article) else {
            return Vec::new();
        };
        let mut targets: Vec<&ArticleRef> = self
            .graph
            .neighbors_directed(*idx, Direction::Outgoing)
            .map(|n| &self.graph[n])
            .collect();
        // petgraph walks the adjacency list newest first
        targets.reverse();
        targets
    }

    pub fn export(&self) -> GraphExport {
        GraphExport {
            seed: self.seed().url().to_string(),
            node_count: self.node_count(),
            edge_count: self.edge_count(),
            nodes: self.nodes().map(|n| n.url().to_string()).collect(),
            edges: self
                .edges()
                .map(|(a, b)| (a.url().to_string(), b.url().to_string()))
                .collect(),
        }
    }

    fn degree(&self, article: &ArticleRef, direction: Direction) -> usize {
        self.index
            .get(article)
            .map(|idx| self.graph.neighbors_directed(*idx, direction).count())
            .unwrap_or(0)
    }
}
