//! Parallel Monte Carlo Tree Search driver.
//!
//! One search runs `num_simulations` simulations in batches of up to
//! `parallel_leaves`. Each batch:
//!
//! 1. selects that many paths in parallel, applying virtual loss on the way
//!    down so concurrent paths spread over the tree,
//! 2. backs up terminal leaves immediately with their game outcome,
//! 3. evaluates every claimed leaf with one network call,
//! 4. expands and backs up the evaluated leaves in parallel.
//!
//! A failed leaf evaluation drops that simulation (its virtual loss is
//! rolled back and the budget is still spent). A path that ends on a leaf
//! already claimed by another path of the same batch is rolled back without
//! spending budget and selected again in the next batch. Cancellation through
//! a [`StopHandle`] or the time budget is checked between batches, so a batch
//! that has been selected is always settled.

use crate::batch::{LeafBatch, PendingLeaf};
use crate::config::MctsConfig;
use crate::error::SearchError;
use crate::expand;
use crate::network::{Evaluation, Network, NetworkError};
use crate::path::SearchPath;
use crate::policy;
use crate::puct;
use crate::tree::SearchTree;
use alphazero_core::{Game, Policy, Value};
use rand::Rng;
use rand_distr::{Dirichlet, Distribution};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// Counters describing how a search went.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchStats {
    /// Simulations that were backed up.
    pub simulations: u32,
    /// Simulations dropped because their leaf evaluation failed.
    pub dropped: u32,
    /// Batches of up to `parallel_leaves` simulations that were run.
    pub batches: u32,
    /// True if the search stopped before spending its budget.
    pub cancelled: bool,
    pub elapsed: Duration,
}

/// Result of an MCTS search.
#[derive(Clone, Debug)]
pub struct SearchResult {
    /// Chosen action, `None` when the root was terminal.
    pub action: Option<usize>,

    /// Visit-count policy over all `game.num_actions()` indices; zero for
    /// illegal actions. One-hot when the move was picked greedily.
    pub policy: Vec<f32>,

    /// Q(root): mean backed-up value for the player to move at the root.
    /// For a terminal root, the game outcome for that player.
    pub root_value: f32,

    /// Visit count of each root child, in ascending action order.
    pub visit_counts: Vec<(usize, u32)>,

    pub stats: SearchStats,
}

impl SearchResult {
    /// Result for a root that is already decided.
    fn terminal(num_actions: usize, value: f32) -> Self {
        Self {
            action: None,
            policy: vec![0.0; num_actions],
            root_value: value,
            visit_counts: Vec::new(),
            stats: SearchStats::default(),
        }
    }

    /// Most visited action, lowest id on ties.
    pub fn best_action(&self) -> Option<usize> {
        policy::greedy_action(&self.visit_counts)
    }

    /// Pick an action from the same visit counts at another temperature.
    pub fn select_action<R: Rng + ?Sized>(&self, temperature: f32, rng: &mut R) -> Option<usize> {
        if policy::is_greedy(temperature, false) {
            return self.best_action();
        }
        let num_actions = self.policy.len();
        let pi = policy::visit_distribution(&self.visit_counts, num_actions, temperature, false);
        policy::sample_action(&pi, rng).or_else(|| self.best_action())
    }

    /// Get the policy as a typed Policy (enforces sum to 1.0 invariant).
    ///
    /// # Errors
    /// Returns error for a terminal root, whose policy is all zeros.
    pub fn typed_policy(&self) -> alphazero_core::Result<Policy> {
        Policy::new(self.policy.clone())
    }

    /// Get the root value as a typed Value (clamped to [-1, 1]).
    pub fn typed_value(&self) -> Value {
        Value::clamped(self.root_value)
    }
}

/// Cloneable handle that stops a running search after its current batch.
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Build a pool of `num_threads` search workers, for use with
/// [`Mcts::with_pool`].
///
/// # Errors
/// `SearchError::ThreadPool` if the threads cannot be started.
pub fn worker_pool(num_threads: usize) -> Result<ThreadPool, SearchError> {
    let pool = ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .thread_name(|i| format!("mcts-worker-{}", i))
        .build()?;
    Ok(pool)
}

/// Driver states of one search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    Running { remaining: usize },
    Done,
}

/// Monte Carlo Tree Search with PUCT selection and batched evaluation.
///
/// Generic over:
/// - `G`: The game being played
/// - `N`: The network evaluating leaves
/// - `R`: The random number generator (root noise and action sampling)
pub struct Mcts<G: Game, N: Network, R: Rng> {
    config: MctsConfig,
    network: N,
    rng: R,
    pool: Option<Arc<ThreadPool>>,
    tree: Option<SearchTree<G::State>>,
    stop: StopHandle,
}

impl<G, N, R> Mcts<G, N, R>
where
    G: Game,
    N: Network,
    R: Rng,
{
    /// Create a new MCTS instance. Builds a pool of `parallel_leaves`
    /// worker threads when more than one leaf is batched.
    ///
    /// # Errors
    /// `SearchError::Game` wrapping `InvalidConfig` for an invalid config,
    /// `SearchError::ThreadPool` if the workers cannot be started.
    pub fn new(config: MctsConfig, network: N, rng: R) -> Result<Self, SearchError> {
        config.validate()?;
        let pool = if config.parallel_leaves > 1 {
            Some(Arc::new(worker_pool(config.parallel_leaves)?))
        } else {
            None
        };
        Ok(Self::with_parts(config, network, rng, pool))
    }

    /// Create an instance whose batches run on `pool`, which may be shared
    /// with other searches. The pool is left unused when only one leaf is
    /// batched.
    ///
    /// # Errors
    /// `SearchError::Game` wrapping `InvalidConfig` for an invalid config.
    pub fn with_pool(
        config: MctsConfig,
        network: N,
        rng: R,
        pool: Arc<ThreadPool>,
    ) -> Result<Self, SearchError> {
        config.validate()?;
        let pool = (config.parallel_leaves > 1).then_some(pool);
        Ok(Self::with_parts(config, network, rng, pool))
    }

    fn with_parts(config: MctsConfig, network: N, rng: R, pool: Option<Arc<ThreadPool>>) -> Self {
        Self {
            config,
            network,
            rng,
            pool,
            tree: None,
            stop: StopHandle::default(),
        }
    }

    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    /// Handle to stop a search running on another thread.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Tree of the most recent search, after any `advance`.
    pub fn tree(&self) -> Option<&SearchTree<G::State>> {
        self.tree.as_ref()
    }

    /// Forget the retained tree.
    pub fn reset(&mut self) {
        self.tree = None;
    }

    /// Commit `action` in the retained tree. With `reuse_tree` the tree is
    /// re-rooted at that child; otherwise it is discarded.
    ///
    /// # Errors
    /// An invalid-action error if `action` cannot be played in the retained
    /// root state. The retained tree is discarded in that case.
    pub fn advance(&mut self, game: &G, action: usize) -> Result<(), SearchError> {
        let Some(tree) = self.tree.take() else {
            return Ok(());
        };
        if self.config.reuse_tree {
            self.tree = Some(tree.advance(game, action)?);
        } else {
            game.apply(tree.state(), action)?;
        }
        Ok(())
    }

    /// Run MCTS from the given state, returning search results.
    ///
    /// # Errors
    /// - `ZeroBudget` when `num_simulations` is 0 and the root is not terminal
    /// - `Evaluation` when the network cannot evaluate the root
    /// - `Game` when the environment rejects an action during the search
    /// - `NoSimulations` when no root child has a visit after the budget
    ///   loop, so there is nothing to pick a move from; the expanded root is
    ///   still retained
    pub fn search(&mut self, game: &G, state: &G::State) -> Result<SearchResult, SearchError> {
        let started = Instant::now();
        let num_actions = game.num_actions();

        if let Some(value) = game.terminal_value(state) {
            debug!(root_value = value, "search called on a terminal root");
            self.tree = None;
            return Ok(SearchResult::terminal(num_actions, value));
        }
        if self.config.num_simulations == 0 {
            return Err(SearchError::ZeroBudget);
        }

        let mut tree = match self.tree.take() {
            Some(tree) if self.config.reuse_tree && tree.state() == state => {
                trace!(nodes = tree.len(), "reusing subtree");
                tree
            }
            _ => SearchTree::new(state.clone()),
        };

        if !tree.root().is_expanded() {
            self.expand_root(game, &tree)?;
        }
        if self.config.root_noise {
            self.add_root_noise(&mut tree);
        }

        self.stop.reset();
        let mut stats = {
            let simulator = Simulator {
                game,
                network: &self.network,
                config: &self.config,
                pool: self.pool.as_deref(),
                stop: &self.stop,
                num_actions,
            };
            simulator.run(&tree, started)?
        };
        stats.elapsed = started.elapsed();

        if tree.root().children().iter().all(|child| child.visit_count() == 0) {
            warn!(
                dropped = stats.dropped,
                cancelled = stats.cancelled,
                "search finished without a single simulation"
            );
            self.tree = Some(tree);
            return Err(SearchError::NoSimulations {
                dropped: stats.dropped,
                cancelled: stats.cancelled,
            });
        }

        let result = self.extract_result(&tree, num_actions, stats);
        debug!(
            simulations = result.stats.simulations,
            dropped = result.stats.dropped,
            batches = result.stats.batches,
            cancelled = result.stats.cancelled,
            elapsed_ms = result.stats.elapsed.as_millis() as u64,
            root_value = result.root_value,
            action = ?result.action,
            "search finished"
        );

        self.tree = Some(tree);
        Ok(result)
    }

    /// Evaluate and expand the root outside the simulation budget.
    fn expand_root(&self, game: &G, tree: &SearchTree<G::State>) -> Result<(), SearchError> {
        let observation = game.encode(tree.state());
        let mut evaluations = self.network.evaluate(&[observation.as_slice()])?;
        if evaluations.len() != 1 {
            return Err(NetworkError::BatchSizeMismatch {
                expected: 1,
                got: evaluations.len(),
            }
            .into());
        }
        let evaluation = evaluations.swap_remove(0);
        evaluation.validate(game.num_actions())?;

        let legal = game.legal_actions(tree.state());
        expand::expand(tree.root(), &legal, &evaluation.policy)?;
        Ok(())
    }

    /// Add Dirichlet noise to root priors for exploration.
    fn add_root_noise(&mut self, tree: &mut SearchTree<G::State>) {
        let num_children = tree.root().children().len();

        // Dirichlet requires at least 2 elements
        if num_children < 2 {
            return;
        }

        let alpha = vec![f64::from(self.config.dirichlet_alpha); num_children];
        let noise: Vec<f64> = match Dirichlet::new(&alpha) {
            Ok(dirichlet) => dirichlet.sample(&mut self.rng),
            Err(err) => {
                warn!(%err, "skipping root noise");
                return;
            }
        };
        // Tiny alphas can underflow every gamma draw to zero
        if noise.iter().any(|n| !n.is_finite()) {
            warn!(alpha = self.config.dirichlet_alpha, "degenerate noise sample, skipping root noise");
            return;
        }
        let noise: Vec<f32> = noise.into_iter().map(|n| n as f32).collect();
        tree.mix_root_noise(&noise, self.config.exploration_fraction);
    }

    /// Extract search results from the root.
    fn extract_result(
        &mut self,
        tree: &SearchTree<G::State>,
        num_actions: usize,
        stats: SearchStats,
    ) -> SearchResult {
        let root = tree.root();
        let visit_counts: Vec<(usize, u32)> = root
            .children()
            .iter()
            .filter_map(|child| Some((child.action()?, child.visit_count())))
            .collect();

        let greedy = policy::is_greedy(self.config.temperature, self.config.deterministic);
        let pi = policy::visit_distribution(
            &visit_counts,
            num_actions,
            self.config.temperature,
            self.config.deterministic,
        );
        let action = if greedy {
            policy::greedy_action(&visit_counts)
        } else {
            policy::sample_action(&pi, &mut self.rng).or_else(|| policy::greedy_action(&visit_counts))
        };

        SearchResult {
            action,
            policy: pi,
            root_value: root.mean_value().unwrap_or(0.0),
            visit_counts,
            stats,
        }
    }
}

/// Outcome of selecting one path.
enum Selection<'t, S> {
    /// Reached a finished game; `value` is for the player to move there.
    Terminal { path: SearchPath<'t>, value: f32 },
    /// Claimed an unexpanded leaf that needs the network.
    Leaf(PendingLeaf<'t, S>),
    /// Reached a leaf another path of this batch already claimed.
    Collision(SearchPath<'t>),
}

/// Per-batch tallies.
#[derive(Default)]
struct BatchTally {
    backed_up: u32,
    dropped: u32,
    /// Collided paths rolled back to be selected again.
    requeued: u32,
}

impl BatchTally {
    fn merge(mut self, other: Self) -> Self {
        self.backed_up += other.backed_up;
        self.dropped += other.dropped;
        self.requeued += other.requeued;
        self
    }

    /// Simulations taken out of the budget.
    fn spent(&self) -> usize {
        (self.backed_up + self.dropped) as usize
    }
}

/// Shared, read-only view of one search used by every worker.
struct Simulator<'a, G: Game, N> {
    game: &'a G,
    network: &'a N,
    config: &'a MctsConfig,
    pool: Option<&'a ThreadPool>,
    stop: &'a StopHandle,
    num_actions: usize,
}

impl<'a, G, N> Simulator<'a, G, N>
where
    G: Game,
    N: Network,
{
    /// Spend the simulation budget on `tree`.
    fn run(&self, tree: &SearchTree<G::State>, started: Instant) -> Result<SearchStats, SearchError> {
        let deadline = self.config.time_budget().map(|budget| started + budget);
        let mut stats = SearchStats::default();
        let mut phase = Phase::Idle;

        loop {
            phase = match phase {
                Phase::Idle => Phase::Running {
                    remaining: self.config.num_simulations,
                },
                Phase::Running { remaining: 0 } => Phase::Done,
                Phase::Running { remaining } => {
                    let out_of_time = deadline.is_some_and(|d| Instant::now() >= d);
                    if self.stop.is_stopped() || out_of_time {
                        stats.cancelled = true;
                        Phase::Done
                    } else {
                        let width = remaining.min(self.config.parallel_leaves);
                        let tally = self.run_batch(tree, width)?;
                        stats.simulations += tally.backed_up;
                        stats.dropped += tally.dropped;
                        stats.batches += 1;
                        Phase::Running {
                            remaining: remaining - tally.spent(),
                        }
                    }
                }
                Phase::Done => return Ok(stats),
            };
        }
    }

    /// Select, evaluate and settle `width` simulations.
    fn run_batch(&self, tree: &SearchTree<G::State>, width: usize) -> Result<BatchTally, SearchError> {
        let selections = self.select_paths(tree, width);

        let mut batch = LeafBatch::with_capacity(width);
        let mut collisions = Vec::new();
        let mut tally = BatchTally::default();
        let mut failure = None;

        for selection in selections {
            match selection {
                Ok(Selection::Terminal { path, value }) => {
                    path.backup(value);
                    tally.backed_up += 1;
                }
                Ok(Selection::Leaf(leaf)) => batch.push(leaf),
                Ok(Selection::Collision(path)) => collisions.push(path),
                Err(err) => {
                    if failure.is_none() {
                        failure = Some(err);
                    }
                }
            }
        }

        if let Some(err) = failure {
            drop(collisions);
            batch.abandon();
            return Err(err);
        }

        // Selection is over, so collided paths no longer need their virtual loss
        let collided = collisions.len() as u32;
        for path in collisions {
            path.revert();
        }
        if batch.is_empty() && tally.backed_up == 0 {
            // Every claim is held outside this batch; spend the paths so the budget shrinks
            warn!(paths = collided, "no leaf to evaluate, dropping collided simulations");
            tally.dropped += collided;
        } else {
            tally.requeued += collided;
        }

        if !batch.is_empty() {
            trace!(
                width,
                leaves = batch.len(),
                terminal = tally.backed_up,
                requeued = tally.requeued,
                "evaluating batch"
            );
        }
        let evaluated = batch.evaluate(self.network, self.num_actions);
        let settled = match self.pool {
            Some(pool) if evaluated.len() > 1 => pool.install(|| {
                evaluated
                    .into_par_iter()
                    .map(|(leaf, evaluation)| self.settle(leaf, evaluation))
                    .reduce(BatchTally::default, BatchTally::merge)
            }),
            _ => evaluated
                .into_iter()
                .map(|(leaf, evaluation)| self.settle(leaf, evaluation))
                .fold(BatchTally::default(), BatchTally::merge),
        };

        Ok(tally.merge(settled))
    }

    /// Select `width` paths, in parallel when a worker pool exists.
    fn select_paths<'t>(
        &self,
        tree: &'t SearchTree<G::State>,
        width: usize,
    ) -> Vec<Result<Selection<'t, G::State>, SearchError>> {
        match self.pool {
            Some(pool) if width > 1 => pool.install(|| {
                (0..width)
                    .into_par_iter()
                    .map(|_| self.select(tree))
                    .collect()
            }),
            _ => (0..width).map(|_| self.select(tree)).collect(),
        }
    }

    /// Descend from the root by PUCT until a terminal state or an
    /// unexpanded node.
    fn select<'t>(&self, tree: &'t SearchTree<G::State>) -> Result<Selection<'t, G::State>, SearchError> {
        let mut path = SearchPath::new(tree.root());
        let mut state = tree.state().clone();
        let mut node = tree.root();

        while let Some((action, child)) = puct::select_child(node, self.config) {
            // On error the path is dropped, which rolls back its virtual loss
            state = self.game.apply(&state, action)?;
            path.push(child);
            node = child;

            if let Some(value) = self.game.terminal_value(&state) {
                return Ok(Selection::Terminal { path, value });
            }
        }

        if node.try_claim() {
            let observation = self.game.encode(&state);
            Ok(Selection::Leaf(PendingLeaf::new(path, state, observation)))
        } else {
            Ok(Selection::Collision(path))
        }
    }

    /// Expand an evaluated leaf and back it up, or drop it on failure.
    fn settle(
        &self,
        leaf: PendingLeaf<'_, G::State>,
        evaluation: Result<Evaluation, NetworkError>,
    ) -> BatchTally {
        let expanded = evaluation.map_err(|e| e.to_string()).and_then(|eval| {
            let legal = self.game.legal_actions(&leaf.state);
            expand::expand(leaf.path.leaf(), &legal, &eval.policy)
                .map(|_| Value::clamped(eval.value))
                .map_err(|e| e.to_string())
        });

        match expanded {
            Ok(value) => {
                leaf.backup(value.get());
                BatchTally {
                    backed_up: 1,
                    ..BatchTally::default()
                }
            }
            Err(reason) => {
                warn!(%reason, depth = leaf.path.depth(), "leaf evaluation failed, dropping simulation");
                leaf.abandon();
                BatchTally {
                    dropped: 1,
                    ..BatchTally::default()
                }
            }
        }
    }
}
