//! Single-threaded move algebra and golden serializations.
//!
//! The 1260-cycle sequence comes from the order of R U² D⁻¹ B D⁻¹ in the
//! cube group; any correct move kernel must return to the start.

use rand::Rng;
use rotor::opposite;
use rotor::prelude::*;

const SOLVED_3: &str = "000000000111111111222222222333333333444444444555555555";

fn color_counts(state: &str) -> [usize; 6] {
    let mut counts = [0usize; 6];
    for b in state.bytes() {
        counts[(b - b'0') as usize] += 1;
    }
    counts
}

#[test]
fn solved_show_matches_golden() {
    let cube = Cube::new(3).unwrap();
    assert_eq!(cube.show().unwrap(), SOLVED_3);
}

#[test]
fn show_has_expected_shape() {
    for size in [1usize, 2, 4, 7] {
        let cube = Cube::new(size).unwrap();
        let state = cube.show().unwrap();
        assert_eq!(state.len(), 6 * size * size);
        assert!(state.bytes().all(|b| (b'0'..=b'5').contains(&b)));
        assert_eq!(color_counts(&state), [size * size; 6]);
    }
}

#[test]
fn right_turn_matches_golden() {
    let cube = Cube::new(3).unwrap();
    cube.rotate(3, 0).unwrap();
    assert_eq!(
        cube.show().unwrap(),
        "002002002111111111225225225333333333044044044554554554",
    );
}

#[test]
fn four_identical_turns_are_identity() {
    let mut rng = rand::thread_rng();
    for size in [1usize, 2, 3, 4, 5, 10] {
        let cube = Cube::new(size).unwrap();
        let start = cube.show().unwrap();
        for _ in 0..300 {
            let side = rng.gen_range(0..6);
            let layer = rng.gen_range(0..size);
            for _ in 0..4 {
                cube.rotate(side, layer).unwrap();
            }
        }
        assert_eq!(cube.show().unwrap(), start, "size {size}");
    }
}

#[test]
fn magic_sequence_1260_returns_to_start() {
    for size in [1usize, 2, 3, 5] {
        let cube = Cube::new(size).unwrap();
        let start = cube.show().unwrap();
        for _ in 0..1260 {
            for (side, layer) in [
                (3, 0),
                (0, 0),
                (0, 0),
                (5, 0),
                (5, 0),
                (5, 0),
                (4, 0),
                (5, 0),
                (5, 0),
                (5, 0),
            ] {
                cube.rotate(side, layer).unwrap();
            }
        }
        assert_eq!(cube.show().unwrap(), start, "size {size}");
    }
}

#[test]
fn random_walk_preserves_color_counts() {
    let mut rng = rand::thread_rng();
    let size = 6;
    let cube = Cube::new(size).unwrap();
    for _ in 0..500 {
        cube.rotate(rng.gen_range(0..6), rng.gen_range(0..size)).unwrap();
    }
    assert_eq!(color_counts(&cube.show().unwrap()), [size * size; 6]);
}

#[test]
fn deep_layer_equals_triple_opposite_turn() {
    for size in [2usize, 3, 6] {
        for side in 0..6 {
            let a = Cube::new(size).unwrap();
            a.rotate(side, size - 1).unwrap();

            let b = Cube::new(size).unwrap();
            for _ in 0..3 {
                b.rotate(opposite(side), 0).unwrap();
            }
            assert_eq!(a.show().unwrap(), b.show().unwrap(), "side {side}");
        }
    }
}
