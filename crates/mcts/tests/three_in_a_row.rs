//! Playing strength on 3x3 three-in-a-row.
//!
//! Guided only by terminal outcomes (uniform network), a couple of thousand
//! simulations per move are enough to never lose to a random player and to
//! convert gravity wins.

use alphazero_core::{Game, Outcome, Player};
use alphazero_gomoku::{Board, Gomoku, GravityGomoku};
use alphazero_mcts::{Mcts, MctsConfig, UniformNetwork};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn create_mcts<G: Game>(game: &G, seed: u64, simulations: usize) -> Mcts<G, UniformNetwork, ChaCha8Rng> {
    let config = MctsConfig::for_evaluation(simulations).with_parallel_leaves(1);
    Mcts::new(
        config,
        UniformNetwork::new(game.num_actions()),
        ChaCha8Rng::seed_from_u64(seed),
    )
    .unwrap()
}

/// Play MCTS as `mcts_player` against uniformly random moves.
fn play_against_random(seed: u64, mcts_player: Player) -> Board {
    let game = Gomoku::new(3, 3).unwrap();
    let mut mcts = create_mcts(&game, seed, 1500);
    let mut rng = ChaCha8Rng::seed_from_u64(seed + 1000);
    let mut state = game.initial_state();

    while !game.is_terminal(&state) {
        let action = if game.current_player(&state) == mcts_player {
            mcts.search(&game, &state).unwrap().action.unwrap()
        } else {
            *game.legal_actions(&state).choose(&mut rng).unwrap()
        };
        state = game.apply(&state, action).unwrap();
    }
    state
}

/// True if `player` lost the finished game.
fn lost(game: &Gomoku, state: &Board, player: Player) -> bool {
    let last_mover = game.current_player(state).opponent();
    game.outcome(state) == Some(Outcome::Win) && last_mover != player
}

#[test]
fn test_never_loses_as_black() {
    let game = Gomoku::new(3, 3).unwrap();
    for seed in 0..20 {
        let state = play_against_random(seed, Player::Black);
        assert!(
            !lost(&game, &state, Player::Black),
            "MCTS (X) lost game with seed {}. Final state:\n{}",
            seed,
            state
        );
    }
}

#[test]
fn test_never_loses_as_white() {
    let game = Gomoku::new(3, 3).unwrap();
    for seed in 0..20 {
        let state = play_against_random(seed, Player::White);
        assert!(
            !lost(&game, &state, Player::White),
            "MCTS (O) lost game with seed {}. Final state:\n{}",
            seed,
            state
        );
    }
}

#[test]
fn test_same_seed_same_game() {
    let game = Gomoku::new(3, 3).unwrap();
    let play = |seed: u64| {
        let mut mcts = create_mcts(&game, seed, 100);
        let mut state = game.initial_state();
        let mut moves = Vec::new();
        while !game.is_terminal(&state) {
            let action = mcts.search(&game, &state).unwrap().action.unwrap();
            moves.push(action);
            state = game.apply(&state, action).unwrap();
        }
        moves
    };

    assert_eq!(play(12345), play(12345));
}

#[test]
fn test_opening_value_is_not_lost() {
    let game = Gomoku::new(3, 3).unwrap();
    let mut mcts = create_mcts(&game, 42, 2000);
    let result = mcts.search(&game, &game.initial_state()).unwrap();
    assert!(
        result.root_value >= -0.3,
        "opening value should be a draw or better, got {}",
        result.root_value
    );
}

#[test]
fn test_gravity_stacks_for_the_win() {
    // Black owns the bottom of column 0 twice; a third stone on top wins
    let game = GravityGomoku::new(4, 3).unwrap();
    let mut state = game.initial_state();
    for action in [0, 1, 4, 5] {
        state = game.apply(&state, action).unwrap();
    }

    let mut mcts = create_mcts(&game, 7, 400);
    let result = mcts.search(&game, &state).unwrap();
    assert_eq!(result.action, Some(8));
}
