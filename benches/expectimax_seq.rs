use criterion::{criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, SeedableRng};
use reverse_2048::engine::{Board, Move, StartConfig};
use reverse_2048::expectimax::{Expectimax, ExpectimaxConfig, Heuristic};
use std::hint::black_box;

fn corpus(start: StartConfig) -> Vec<Board> {
    let spawns = start.spawn_set();
    let mut rng = StdRng::seed_from_u64(4242);
    let mut boards = Vec::new();
    let mut b = start.initial_board(&mut rng);
    boards.push(b);
    let seq = [Move::Left, Move::Up, Move::Right, Move::Down];
    for i in 0..16 {
        let dir = seq[i % seq.len()];
        let nb = b.shift(dir);
        if nb != b {
            b = spawns.spawn(nb, &mut rng);
        }
        boards.push(b);
    }
    boards
}

fn bench_seq_branch_and_value(c: &mut Criterion) {
    let start = StartConfig::new(256, 4).unwrap();
    let boards = corpus(start);
    let cfg = ExpectimaxConfig { depth: 4, ..Default::default() };
    let mut ex = Expectimax::with_config(start.spawn_set(), cfg);

    c.bench_function("expectimax_seq/branch_evals", |bch| {
        bch.iter(|| {
            let mut acc = 0.0;
            for &bd in &boards {
                for be in ex.branch_evals(bd) {
                    if be.legal && be.ev.is_finite() {
                        acc += be.ev;
                    }
                }
            }
            black_box(acc)
        })
    });

    c.bench_function("expectimax_seq/best_move", |bch| {
        bch.iter(|| {
            let mut acc = 0u8;
            for &bd in &boards {
                acc ^= ex.best_move(bd).map_or(0xFF, Move::to_u8);
            }
            black_box(acc)
        })
    });

    let mut uncached = Expectimax::with_config(start.spawn_set(), ExpectimaxConfig { cache_enabled: false, ..cfg });
    c.bench_function("expectimax_seq/state_value_uncached", |bch| {
        bch.iter(|| {
            let mut acc = 0.0;
            for &bd in &boards[..4] {
                acc += uncached.state_value(bd);
            }
            black_box(acc)
        })
    });
}

fn bench_heuristic(c: &mut Criterion) {
    let boards = corpus(StartConfig::new(512, 5).unwrap());
    let h = Heuristic::new(&ExpectimaxConfig::default());
    c.bench_function("heuristic/evaluate", |bch| {
        bch.iter(|| {
            let mut acc = 0f64;
            for &bd in &boards {
                acc = acc.mul_add(1.000_000_1, h.evaluate(bd));
            }
            black_box(acc)
        })
    });
}

criterion_group!(expectimax_seq, bench_seq_branch_and_value, bench_heuristic);
criterion_main!(expectimax_seq);
