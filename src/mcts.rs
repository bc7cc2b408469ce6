//! Single-player Monte Carlo Tree Search (SP-MCTS).
//!
//! This module implements the search described by Schadd et al. (2008):
//! - Random selection among expanded children until a node has enough visits
//! - A modified UCT with a variance term once it has
//! - One child expanded per iteration, in blob order
//! - Random playouts scored by total clicks from the root
//!
//! The tree lives in an arena (`Vec<Node>`) addressed by [`NodeId`]. Each
//! node owns its own board snapshot; the parent link is a plain index used
//! only for backpropagation and solution extraction. Nodes are never
//! removed, so ids stay valid for the lifetime of the search.

use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::board::{Board, Move};
use crate::config::SearchConfig;
use crate::constants::TREE_CAPACITY;
use crate::playout::random_playout;

/// Index of a node in its [`Tree`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Expansion state of a node.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NodeState {
    Unexpanded,
    PartiallyExpanded,
    FullyExpanded,
}

/// A node in the search tree.
#[derive(Debug, Clone)]
pub struct Node {
    /// Board reached by the moves from the root to this node
    pub board: Board,
    /// Number of moves from the root
    pub depth: usize,
    pub parent: Option<NodeId>,
    /// Move that produced this node (`None` at the root)
    pub mv: Option<Move>,
    /// Candidate moves, one per blob, in scan order
    pub blobs: Vec<Move>,
    /// Expanded children, aligned 1:1 with the prefix of `blobs`
    pub children: Vec<NodeId>,
    pub visits: u32,
    /// Running mean of backpropagated scores
    pub mean: f64,
    /// Running sum of squared scores
    pub sum_squares: f64,
}

impl Node {
    fn new(board: Board, depth: usize, parent: Option<NodeId>, mv: Option<Move>) -> Self {
        let blobs = board.blobs();
        Self {
            board,
            depth,
            parent,
            mv,
            blobs,
            children: Vec::new(),
            visits: 0,
            mean: 0.0,
            sum_squares: 0.0,
        }
    }

    /// True while some blob has no child yet.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.len() < self.blobs.len()
    }

    /// True when the board at this node is clear.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.blobs.is_empty()
    }

    pub fn state(&self) -> NodeState {
        if self.children.is_empty() && !self.blobs.is_empty() {
            NodeState::Unexpanded
        } else if self.is_leaf() {
            NodeState::PartiallyExpanded
        } else {
            NodeState::FullyExpanded
        }
    }
}

/// Arena holding every node of one search.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn new(board: Board) -> Self {
        let mut nodes = Vec::with_capacity(TREE_CAPACITY);
        nodes.push(Node::new(board, 0, None, None));
        Self { nodes }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    #[inline]
    fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Moves leading from the root to `id`.
    pub fn moves_to(&self, id: NodeId) -> Vec<Move> {
        let mut moves = Vec::with_capacity(self.get(id).depth);
        let mut node = self.get(id);
        while let (Some(parent), Some(mv)) = (node.parent, node.mv) {
            moves.push(mv);
            node = self.get(parent);
        }
        moves.reverse();
        moves
    }

    /// Depth of the deepest node.
    pub fn max_depth(&self) -> usize {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }
}

/// Counters describing a finished (or running) search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchStats {
    pub iterations: u64,
    pub nodes: usize,
    pub max_depth: usize,
    pub elapsed: Duration,
    /// Length of the best solution, if one was found.
    pub best_depth: Option<usize>,
}

/// One SP-MCTS engine: a tree, a private random source, and a configuration.
pub struct Mcts {
    tree: Tree,
    config: SearchConfig,
    rng: fastrand::Rng,
    /// Cell count of the root board, the denominator of the score.
    max_moves: usize,
    best: Option<NodeId>,
    stats: SearchStats,
}

impl Mcts {
    /// Create an engine searching from a private copy of `board`.
    pub fn new(board: &Board, seed: u64, config: SearchConfig) -> Self {
        let max_moves = board.cell_count();
        Self {
            tree: Tree::new(board.clone()),
            config,
            rng: fastrand::Rng::with_seed(seed),
            max_moves,
            best: None,
            stats: SearchStats::default(),
        }
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    /// Run iterations until the budget is spent and return the best solution.
    ///
    /// The budget ends at the first of: the time limit, the iteration cap,
    /// or the node cap. Returns an empty sequence if no clear board was
    /// reached.
    pub fn search(&mut self) -> Vec<Move> {
        let start = Instant::now();
        // An unrepresentable deadline means the other caps bound the search.
        let deadline = start.checked_add(self.config.time_limit);

        while !self.budget_spent(deadline) {
            self.iterate();
        }

        self.stats.elapsed = start.elapsed();
        self.stats.nodes = self.tree.len();
        self.stats.max_depth = self.tree.max_depth();
        debug!(
            iterations = self.stats.iterations,
            nodes = self.stats.nodes,
            max_depth = self.stats.max_depth,
            best = ?self.stats.best_depth,
            elapsed_ms = self.stats.elapsed.as_millis() as u64,
            "search finished"
        );

        self.best_solution()
    }

    fn budget_spent(&self, deadline: Option<Instant>) -> bool {
        let iterations = self.stats.iterations;
        if self.config.max_iterations.is_some_and(|cap| iterations >= cap) {
            return true;
        }
        if self.config.max_nodes.is_some_and(|cap| self.tree.len() >= cap) {
            return true;
        }
        deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Run one selection, expansion, simulation and backpropagation cycle.
    pub fn iterate(&mut self) {
        let mut node = self.select();
        if self.tree.get(node).is_leaf() {
            node = self.expand(node);
        }
        let score = self.simulate(node);
        self.backpropagate(node, score);
        self.stats.iterations += 1;
    }

    /// Moves of the shortest solution found so far.
    pub fn best_solution(&self) -> Vec<Move> {
        self.best
            .map(|id| self.tree.moves_to(id))
            .unwrap_or_default()
    }

    /// Descend from the root to the node this iteration will work on.
    ///
    /// Stops at the first leaf, or at a clear board, which is recorded as a
    /// candidate solution.
    fn select(&mut self) -> NodeId {
        let mut id = self.tree.root();
        while !self.tree.get(id).is_leaf() {
            if self.tree.get(id).is_terminal() {
                self.record_terminal(id);
                return id;
            }
            id = self.choose_child(id);
        }
        id
    }

    /// Pick the child of a fully expanded node to descend into.
    fn choose_child(&mut self, id: NodeId) -> NodeId {
        let node = self.tree.get(id);
        let children = &node.children;
        let unvisited = children.iter().any(|&c| self.tree.get(c).visits == 0);

        if node.visits < self.config.selection_threshold || unvisited {
            return children[self.rng.usize(..children.len())];
        }

        let mut best = children[0];
        let mut best_value = f64::NEG_INFINITY;
        for &child in children {
            let value = self.uct(id, child);
            if value > best_value {
                best = child;
                best_value = value;
            }
        }
        best
    }

    /// Modified UCT value of `child` under `parent`.
    ///
    /// `mean + C * sqrt(ln(N) / n) + sqrt((sum_sq - n * mean^2 + D) / n)`.
    /// The child must have been visited at least once.
    pub fn uct(&self, parent: NodeId, child: NodeId) -> f64 {
        let parent_visits = f64::from(self.tree.get(parent).visits);
        let c = self.tree.get(child);
        let n = f64::from(c.visits);
        debug_assert!(c.visits > 0, "uct on an unvisited child");

        let exploration = self.config.exploration * (parent_visits.ln() / n).sqrt();
        // Cancellation can push the raw variance slightly below zero.
        let spread = (c.sum_squares - n * c.mean * c.mean).max(0.0);
        let deviation = ((spread + self.config.variance_smoothing) / n).sqrt();
        c.mean + exploration + deviation
    }

    /// Add a child for the next untried blob of `id` and return it.
    fn expand(&mut self, id: NodeId) -> NodeId {
        let node = self.tree.get(id);
        let mv = node.blobs[node.children.len()];
        let board = node.board.apply(mv);
        let depth = node.depth + 1;

        let child = self.tree.alloc(Node::new(board, depth, Some(id), Some(mv)));
        self.tree.get_mut(id).children.push(child);
        child
    }

    /// Score a random playout from `id`.
    fn simulate(&mut self, id: NodeId) -> f64 {
        let node = self.tree.get(id);
        let mut scratch = node.board.clone();
        let depth = node.depth;
        let n_moves = random_playout(&mut scratch, &mut self.rng);
        self.config.scoring.score(depth + n_moves, self.max_moves)
    }

    /// Fold `score` into every node from `id` up to the root.
    fn backpropagate(&mut self, id: NodeId, score: f64) {
        let mut current = Some(id);
        while let Some(nid) = current {
            let node = self.tree.get_mut(nid);
            node.visits += 1;
            node.mean += (score - node.mean) / f64::from(node.visits);
            node.sum_squares += score * score;
            current = node.parent;
        }
    }

    /// Keep `id` as the best solution if it is strictly shorter.
    ///
    /// Only called when selection reaches a clear board, so among solutions
    /// of equal length the first one selection walks into is kept.
    fn record_terminal(&mut self, id: NodeId) {
        let depth = self.tree.get(id).depth;
        let improved = match self.best {
            Some(best) => depth < self.tree.get(best).depth,
            None => true,
        };
        if improved {
            trace!(depth, iteration = self.stats.iterations, "new best solution");
            self.best = Some(id);
            self.stats.best_depth = Some(depth);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(s: &str, seed: u64, threshold: u32) -> Mcts {
        let board: Board = s.parse().unwrap();
        let config = SearchConfig::default().with_selection_threshold(threshold);
        Mcts::new(&board, seed, config)
    }

    #[test]
    fn test_root_has_depth_zero_and_blob_candidates() {
        let m = engine("BBG\nGBG\nGGO", 0, 1);
        let root = m.tree().get(m.tree().root());
        assert_eq!(root.depth, 0);
        assert!(root.parent.is_none());
        assert!(root.mv.is_none());
        assert_eq!(root.blobs.len(), 4);
        assert_eq!(root.state(), NodeState::Unexpanded);
    }

    #[test]
    fn test_expansion_follows_blob_order() {
        let mut m = engine("BBG\nGBG\nGGO", 0, 1);
        for _ in 0..4 {
            m.iterate();
        }
        let tree = m.tree();
        let root = tree.get(tree.root());
        assert_eq!(root.state(), NodeState::FullyExpanded);
        for (i, &child) in root.children.iter().enumerate() {
            assert_eq!(tree.get(child).mv, Some(root.blobs[i]));
            assert_eq!(tree.get(child).depth, 1);
            assert_eq!(tree.get(child).parent, Some(tree.root()));
        }
    }

    #[test]
    fn test_partial_expansion_state() {
        let mut m = engine("BBG\nGBG\nGGO", 0, 1);
        m.iterate();
        let root = m.tree().get(m.tree().root());
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.state(), NodeState::PartiallyExpanded);
        assert!(root.is_leaf());
    }

    #[test]
    fn test_root_visits_equal_iterations() {
        let mut m = engine("BGPO\nGGPB\nOBBP\nPOGG", 9, 3);
        for _ in 0..200 {
            m.iterate();
        }
        let tree = m.tree();
        assert_eq!(u64::from(tree.get(tree.root()).visits), m.stats().iterations);
        for (_, node) in tree.nodes() {
            let child_visits: u32 = node.children.iter().map(|&c| tree.get(c).visits).sum();
            assert!(node.visits >= child_visits);
            assert!(node.children.len() <= node.blobs.len());
            assert!(node.visits >= 1);
        }
    }

    #[test]
    fn test_backpropagation_statistics() {
        let mut m = engine("BG", 0, 1);
        let root = m.tree().root();
        m.backpropagate(root, 2.0);
        m.backpropagate(root, 4.0);
        let node = m.tree().get(root);
        assert_eq!(node.visits, 2);
        assert!((node.mean - 3.0).abs() < 1e-12);
        assert!((node.sum_squares - 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_uct_matches_formula() {
        let mut m = engine("BG", 0, 1);
        m.iterate();
        m.iterate();
        let tree = m.tree();
        let root = tree.root();
        let child = tree.get(root).children[0];
        let p = tree.get(root);
        let c = tree.get(child);
        let n = f64::from(c.visits);
        let expected = c.mean
            + m.config().exploration * (f64::from(p.visits).ln() / n).sqrt()
            + ((c.sum_squares - n * c.mean * c.mean).max(0.0) + m.config().variance_smoothing)
                .sqrt()
                / n.sqrt();
        assert!((m.uct(root, child) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_terminal_root_yields_empty_solution() {
        let board = Board::new(3, 2);
        let config = SearchConfig::default().with_max_iterations(5);
        let mut m = Mcts::new(&board, 0, config);
        assert!(m.search().is_empty());
        assert_eq!(m.stats().best_depth, Some(0));
        assert_eq!(m.stats().iterations, 5);
    }

    /// Expand every root blob of a one-row board of singletons.
    fn expanded_root(threshold: u32) -> Mcts {
        let mut m = engine("BGP", 3, threshold);
        for _ in 0..3 {
            m.iterate();
        }
        m
    }

    /// Overwrite the statistics of `id` with `visits` copies of `score`.
    fn set_stats(m: &mut Mcts, id: NodeId, visits: u32, score: f64) {
        let node = m.tree.get_mut(id);
        node.visits = visits;
        node.mean = score;
        node.sum_squares = f64::from(visits) * score * score;
    }

    #[test]
    fn test_choose_child_random_below_threshold() {
        let mut m = expanded_root(1_000);
        let root = m.tree().root();
        let children = m.tree().get(root).children.clone();
        assert_eq!(children.len(), 3);
        // A dominant child must not attract every pick while below threshold.
        set_stats(&mut m, children[2], 1, 1e9);

        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            let picked = m.choose_child(root);
            assert!(children.contains(&picked));
            seen.insert(picked);
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_choose_child_uses_uct_at_threshold() {
        let mut m = expanded_root(3);
        let root = m.tree().root();
        let children = m.tree().get(root).children.clone();
        assert_eq!(m.tree().get(root).visits, 3);

        m.backpropagate(children[1], 9_000.0);
        m.backpropagate(children[1], 9_000.0);
        set_stats(&mut m, children[0], 1, 100.0);
        set_stats(&mut m, children[2], 1, 200.0);

        let best = children
            .iter()
            .copied()
            .max_by(|&a, &b| m.uct(root, a).total_cmp(&m.uct(root, b)))
            .unwrap();
        assert_eq!(best, children[1]);
        for _ in 0..20 {
            assert_eq!(m.choose_child(root), children[1]);
        }
    }

    #[test]
    fn test_choose_child_ties_keep_first() {
        let mut m = expanded_root(1);
        let root = m.tree().root();
        let children = m.tree().get(root).children.clone();
        set_stats(&mut m, children[0], 2, 500.0);
        set_stats(&mut m, children[1], 4, 50.0);
        set_stats(&mut m, children[2], 2, 500.0);
        m.tree.get_mut(root).visits = 8;

        assert_eq!(m.uct(root, children[0]), m.uct(root, children[2]));
        assert_eq!(m.choose_child(root), children[0]);
    }

    #[test]
    fn test_choose_child_unvisited_sibling_forces_random() {
        let mut m = expanded_root(1);
        let root = m.tree().root();
        let children = m.tree().get(root).children.clone();
        set_stats(&mut m, children[1], 0, 0.0);
        for _ in 0..50 {
            assert!(children.contains(&m.choose_child(root)));
        }
    }

    #[test]
    fn test_terminal_child_recorded_when_selected() {
        let board: Board = "BB\nBB".parse().unwrap();
        let mut m = Mcts::new(&board, 0, SearchConfig::default().with_selection_threshold(1));
        m.iterate();
        assert_eq!(m.tree().len(), 2);
        assert!(m.best_solution().is_empty());
        m.iterate();
        assert_eq!(m.best_solution(), vec![Move::new(0, 0)]);
        assert_eq!(m.stats().best_depth, Some(1));
    }

    #[test]
    fn test_single_blob_board_solved_in_one_move() {
        let board: Board = "BB\nBB".parse().unwrap();
        let config = SearchConfig::default()
            .with_selection_threshold(1)
            .with_max_iterations(10);
        let mut m = Mcts::new(&board, 1, config);
        let moves = m.search();
        assert_eq!(moves, vec![Move::new(0, 0)]);
        assert!(board.replay(&moves).is_terminal());
    }

    #[test]
    fn test_node_cap_stops_search() {
        let board = Board::random(6, 6, &mut fastrand::Rng::with_seed(4));
        let config = SearchConfig::default().with_max_nodes(25);
        let mut m = Mcts::new(&board, 4, config);
        m.search();
        assert_eq!(m.tree().len(), 25);
        assert_eq!(m.stats().nodes, 25);
    }

    #[test]
    fn test_best_solution_only_improves() {
        let board = Board::random(4, 4, &mut fastrand::Rng::with_seed(8));
        let config = SearchConfig::default().with_selection_threshold(2);
        let mut m = Mcts::new(&board, 8, config);
        let mut last = usize::MAX;
        for _ in 0..300 {
            m.iterate();
            if let Some(depth) = m.stats().best_depth {
                assert!(depth <= last);
                last = depth;
            }
        }
        let moves = m.best_solution();
        if m.stats().best_depth.is_some() {
            assert_eq!(moves.len(), last);
            assert!(board.replay(&moves).is_terminal());
        }
    }
}
