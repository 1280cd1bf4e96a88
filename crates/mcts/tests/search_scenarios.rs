//! End-to-end search scenarios: prior-driven visit ordering, parallel vs
//! sequential agreement, failing networks, short tactics and cancellation.

use alphazero_core::{Game, Outcome, Player, Result as GameResult};
use alphazero_gomoku::Gomoku;
use alphazero_mcts::{
    Evaluation, Mcts, MctsConfig, Network, NetworkError, SearchError, UniformNetwork,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

// =============================================================================
// Fixtures
// =============================================================================

/// Three actions at every node; the game ends in a draw after `depth` moves.
struct ThreeWay {
    depth: usize,
}

impl Game for ThreeWay {
    type State = Vec<usize>;

    fn initial_state(&self) -> Vec<usize> {
        Vec::new()
    }

    fn legal_actions(&self, state: &Vec<usize>) -> Vec<usize> {
        if self.is_terminal(state) {
            Vec::new()
        } else {
            vec![0, 1, 2]
        }
    }

    fn apply(&self, state: &Vec<usize>, action: usize) -> GameResult<Vec<usize>> {
        if action >= 3 {
            return Err(alphazero_core::AlphaZeroError::ActionOutOfBounds {
                action,
                num_actions: 3,
            });
        }
        let mut next = state.clone();
        next.push(action);
        Ok(next)
    }

    fn is_terminal(&self, state: &Vec<usize>) -> bool {
        state.len() >= self.depth
    }

    fn outcome(&self, state: &Vec<usize>) -> Option<Outcome> {
        self.is_terminal(state).then_some(Outcome::Draw)
    }

    fn current_player(&self, state: &Vec<usize>) -> Player {
        if state.len() % 2 == 0 {
            Player::Black
        } else {
            Player::White
        }
    }

    fn encode(&self, state: &Vec<usize>) -> Vec<f32> {
        vec![state.len() as f32]
    }

    fn observation_shape(&self) -> [usize; 3] {
        [1, 1, 1]
    }

    fn num_actions(&self) -> usize {
        3
    }
}

/// Fixed priors and a neutral value.
struct FixedPriors(Vec<f32>);

impl Network for FixedPriors {
    fn evaluate(&self, batch: &[&[f32]]) -> Result<Vec<Evaluation>, NetworkError> {
        Ok(batch
            .iter()
            .map(|_| Evaluation::new(self.0.clone(), 0.0))
            .collect())
    }
}

/// Fails every third call after the first.
struct FlakyNetwork {
    calls: AtomicUsize,
    inner: UniformNetwork,
}

impl Network for FlakyNetwork {
    fn evaluate(&self, batch: &[&[f32]]) -> Result<Vec<Evaluation>, NetworkError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call % 3 == 2 {
            return Err(NetworkError::Failed(format!("call {call} timed out")));
        }
        self.inner.evaluate(batch)
    }
}

/// Network that cannot evaluate anything.
struct DeadNetwork;

impl Network for DeadNetwork {
    fn evaluate(&self, _batch: &[&[f32]]) -> Result<Vec<Evaluation>, NetworkError> {
        Err(NetworkError::Failed("no backend".into()))
    }
}

/// Evaluates the root, then fails every leaf.
struct RootOnlyNetwork {
    calls: AtomicUsize,
    inner: UniformNetwork,
}

impl Network for RootOnlyNetwork {
    fn evaluate(&self, batch: &[&[f32]]) -> Result<Vec<Evaluation>, NetworkError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) > 0 {
            return Err(NetworkError::Failed("backend went away".into()));
        }
        self.inner.evaluate(batch)
    }
}

fn rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

fn play(game: &Gomoku, moves: &[usize]) -> <Gomoku as Game>::State {
    moves.iter().fold(game.initial_state(), |state, &a| {
        game.apply(&state, a).unwrap()
    })
}

fn visit_fractions(visit_counts: &[(usize, u32)]) -> Vec<f32> {
    let total: u32 = visit_counts.iter().map(|(_, c)| c).sum();
    visit_counts
        .iter()
        .map(|&(_, c)| c as f32 / total as f32)
        .collect()
}

// =============================================================================
// Prior-driven search
// =============================================================================

#[test]
fn test_visits_follow_priors_with_neutral_values() {
    let game = ThreeWay { depth: 4 };
    let config = MctsConfig::for_evaluation(100).with_parallel_leaves(1);
    let network = FixedPriors(vec![0.5, 0.3, 0.2]);
    let mut mcts = Mcts::new(config, network, rng(0)).unwrap();

    let result = mcts.search(&game, &game.initial_state()).unwrap();
    let visits: Vec<u32> = result.visit_counts.iter().map(|&(_, c)| c).collect();
    assert_eq!(visits.iter().sum::<u32>(), 100);
    assert!(
        visits[0] >= visits[1] && visits[1] >= visits[2],
        "visits {visits:?} do not follow the priors"
    );
    assert_eq!(result.action, Some(0));

    // Same seed, same tree
    let mut again = Mcts::new(
        MctsConfig::for_evaluation(100).with_parallel_leaves(1),
        FixedPriors(vec![0.5, 0.3, 0.2]),
        rng(0),
    )
    .unwrap();
    let repeat = again.search(&game, &game.initial_state()).unwrap();
    assert_eq!(result.visit_counts, repeat.visit_counts);
}

#[test]
fn test_parallel_search_matches_sequential() {
    let game = ThreeWay { depth: 6 };
    let priors = vec![0.5, 0.3, 0.2];

    let run = |parallel_leaves: usize| {
        let config = MctsConfig::for_evaluation(800).with_parallel_leaves(parallel_leaves);
        let mut mcts = Mcts::new(config, FixedPriors(priors.clone()), rng(7)).unwrap();
        mcts.search(&game, &game.initial_state()).unwrap()
    };

    let sequential = run(1);
    let parallel = run(8);
    assert_eq!(parallel.stats.simulations, 800);
    // Collided paths are re-selected in extra batches
    assert!(parallel.stats.batches >= 100);

    let seq = visit_fractions(&sequential.visit_counts);
    let par = visit_fractions(&parallel.visit_counts);
    for (action, (s, p)) in seq.iter().zip(&par).enumerate() {
        assert!(
            (s - p).abs() < 0.1,
            "action {action}: sequential {s}, parallel {p}"
        );
    }
}

// =============================================================================
// Evaluation failures
// =============================================================================

#[test]
fn test_failed_leaves_are_dropped() {
    let game = Gomoku::new(3, 3).unwrap();
    let network = FlakyNetwork {
        calls: AtomicUsize::new(0),
        inner: UniformNetwork::new(9),
    };
    let config = MctsConfig::for_evaluation(60).with_parallel_leaves(1);
    let mut mcts = Mcts::new(config, network, rng(1)).unwrap();

    let result = mcts.search(&game, &game.initial_state()).unwrap();
    let stats = &result.stats;
    assert!(stats.dropped > 0);
    assert_eq!(stats.simulations + stats.dropped, 60);

    let total: u32 = result.visit_counts.iter().map(|(_, c)| c).sum();
    assert_eq!(total, stats.simulations);

    let root = mcts.tree().unwrap().root();
    assert_eq!(root.virtual_loss(), 0);
    assert!(root.children().iter().all(|c| c.virtual_loss() == 0));
}

#[test]
fn test_failed_batches_keep_tree_consistent() {
    let game = Gomoku::new(4, 3).unwrap();
    let network = FlakyNetwork {
        calls: AtomicUsize::new(0),
        inner: UniformNetwork::new(16),
    };
    let config = MctsConfig::for_evaluation(200).with_parallel_leaves(8);
    let mut mcts = Mcts::new(config, network, rng(2)).unwrap();

    let result = mcts.search(&game, &game.initial_state()).unwrap();
    assert!(result.stats.dropped > 0);
    assert_eq!(result.stats.simulations + result.stats.dropped, 200);
    assert_eq!(
        mcts.tree().unwrap().root().visit_count(),
        result.stats.simulations
    );
}

#[test]
fn test_root_evaluation_failure_is_an_error() {
    let game = Gomoku::new(3, 3).unwrap();
    let mut mcts = Mcts::new(MctsConfig::for_evaluation(10), DeadNetwork, rng(0)).unwrap();
    let err = mcts.search(&game, &game.initial_state()).unwrap_err();
    assert!(matches!(err, SearchError::Evaluation(NetworkError::Failed(_))));
}

#[test]
fn test_every_leaf_dropped_is_an_error() {
    let game = Gomoku::new(3, 3).unwrap();
    let network = RootOnlyNetwork {
        calls: AtomicUsize::new(0),
        inner: UniformNetwork::new(9),
    };
    let config = MctsConfig::for_evaluation(20).with_parallel_leaves(4);
    let mut mcts = Mcts::new(config, network, rng(0)).unwrap();

    let err = mcts.search(&game, &game.initial_state()).unwrap_err();
    assert!(matches!(
        err,
        SearchError::NoSimulations {
            dropped: 20,
            cancelled: false
        }
    ));
    let root = mcts.tree().unwrap().root();
    assert_eq!(root.visit_count(), 0);
    assert!(root.children().iter().all(|c| c.virtual_loss() == 0));
}

// =============================================================================
// Tactics
// =============================================================================

#[test]
fn test_takes_immediate_win() {
    // X: 0, 1   O: 3, 4   X to move
    let game = Gomoku::new(3, 3).unwrap();
    let state = play(&game, &[0, 3, 1, 4]);

    for parallel_leaves in [1, 8] {
        let config = MctsConfig::for_evaluation(200).with_parallel_leaves(parallel_leaves);
        let mut mcts = Mcts::new(config, UniformNetwork::new(9), rng(3)).unwrap();
        let result = mcts.search(&game, &state).unwrap();
        assert_eq!(result.action, Some(2), "K={parallel_leaves}");
        assert_eq!(result.policy[2], 1.0);
        assert!(result.root_value > 0.0);
    }
}

#[test]
fn test_blocks_immediate_loss() {
    // X: 0, 1   O: 4   O to move and must block at 2
    let game = Gomoku::new(3, 3).unwrap();
    let state = play(&game, &[0, 4, 1]);

    let config = MctsConfig::for_evaluation(1600).with_parallel_leaves(1);
    let mut mcts = Mcts::new(config, UniformNetwork::new(9), rng(4)).unwrap();
    let result = mcts.search(&game, &state).unwrap();
    assert_eq!(result.action, Some(2));
}

// =============================================================================
// Budget, cancellation and tree reuse
// =============================================================================

#[test]
fn test_zero_budget() {
    let game = Gomoku::new(3, 3).unwrap();
    let mut mcts = Mcts::new(MctsConfig::for_evaluation(0), UniformNetwork::new(9), rng(0)).unwrap();
    assert!(matches!(
        mcts.search(&game, &game.initial_state()),
        Err(SearchError::ZeroBudget)
    ));
}

#[test]
fn test_time_budget_stops_search() {
    let game = Gomoku::new(9, 5).unwrap();
    let config = MctsConfig {
        time_budget_ms: Some(50),
        ..MctsConfig::for_evaluation(10_000_000).with_parallel_leaves(4)
    };
    let mut mcts = Mcts::new(config, UniformNetwork::new(81), rng(5)).unwrap();

    let result = mcts.search(&game, &game.initial_state()).unwrap();
    assert!(result.stats.cancelled);
    assert!(result.stats.simulations < 10_000_000);
    assert!(result.action.is_some());
    assert_eq!(mcts.tree().unwrap().root().virtual_loss(), 0);
}

#[test]
fn test_no_move_without_simulations() {
    // The network strongly prefers the center, but nothing was searched
    let game = Gomoku::new(3, 3).unwrap();
    let mut priors = vec![0.01; 9];
    priors[4] = 0.92;
    let config = MctsConfig {
        time_budget_ms: Some(0),
        ..MctsConfig::for_evaluation(100)
    };
    let mut mcts = Mcts::new(config, FixedPriors(priors), rng(0)).unwrap();

    match mcts.search(&game, &game.initial_state()) {
        Err(SearchError::NoSimulations { cancelled, .. }) => assert!(cancelled),
        other => panic!("expected NoSimulations, got {other:?}"),
    }
    let root = mcts.tree().unwrap().root();
    assert!((root.child(4).unwrap().prior() - 0.92).abs() < 1e-6);
}

#[test]
fn test_stop_handle_cancels_running_search() {
    let game = Gomoku::new(9, 5).unwrap();
    let config = MctsConfig::for_evaluation(10_000_000).with_parallel_leaves(2);
    let mut mcts = Mcts::new(config, UniformNetwork::new(81), rng(6)).unwrap();
    let handle = mcts.stop_handle();

    let result = std::thread::scope(|s| {
        s.spawn(|| {
            std::thread::sleep(Duration::from_millis(50));
            handle.stop();
        });
        mcts.search(&game, &game.initial_state())
    })
    .unwrap();

    assert!(result.stats.cancelled);
    let total: u32 = result.visit_counts.iter().map(|(_, c)| c).sum();
    assert_eq!(total, result.stats.simulations);
}

#[test]
fn test_advance_rejects_invalid_action() {
    let game = Gomoku::new(3, 3).unwrap();
    let config = MctsConfig {
        reuse_tree: true,
        ..MctsConfig::for_evaluation(30)
    };
    let mut mcts = Mcts::new(config, UniformNetwork::new(9), rng(0)).unwrap();
    mcts.search(&game, &game.initial_state()).unwrap();

    let err = mcts.advance(&game, 99).unwrap_err();
    assert!(err.is_invalid_action());
    assert!(mcts.tree().is_none());
}

#[test]
fn test_reuse_across_a_game() {
    let game = Gomoku::new(3, 3).unwrap();
    let config = MctsConfig {
        reuse_tree: true,
        ..MctsConfig::for_evaluation(100).with_parallel_leaves(4)
    };
    let mut mcts = Mcts::new(config, UniformNetwork::new(9), rng(8)).unwrap();
    let mut state = game.initial_state();

    while !game.is_terminal(&state) {
        let result = mcts.search(&game, &state).unwrap();
        let action = result.action.unwrap();
        let kept = mcts.tree().unwrap().root().child(action).map(|c| c.visit_count());

        mcts.advance(&game, action).unwrap();
        state = game.apply(&state, action).unwrap();
        if let Some(kept) = kept {
            assert_eq!(mcts.tree().unwrap().root().visit_count(), kept);
        }
    }

    assert!(game.outcome(&state).is_some());
    assert!(mcts.tree().is_some());
}
