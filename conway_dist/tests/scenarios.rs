use conway_dist::{ALIVE, Cell, Event, Grid, MemoryStore, Params, State, patterns};
use tokio::sync::mpsc;

fn params(width: usize, height: usize, turns: usize, threads: usize) -> Params {
    Params { image_width: width, image_height: height, turns, threads }
}

/// Run to completion with no key presses and return every event in order.
async fn play(params: Params, world: &Grid) -> (MemoryStore, Vec<Event>) {
    let store = MemoryStore::new();
    store.insert(params.input_name(), world.cells().to_vec());
    let (events_tx, mut events) = mpsc::channel(1000);
    let (_keys_tx, keys) = mpsc::channel(10);

    let run = tokio::spawn(conway_dist::run(params, store.clone(), events_tx, keys));
    let mut seen = Vec::new();
    while let Some(event) = events.recv().await {
        seen.push(event);
    }
    let turns = run.await.expect("join").expect("run succeeds");
    assert_eq!(turns, params.turns);
    (store, seen)
}

fn flips_in(events: &[Event], turn: usize) -> Vec<Cell> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::CellFlipped { completed_turns, cell } if *completed_turns == turn => Some(*cell),
            _ => None,
        })
        .collect()
}

fn lifecycle(events: &[Event]) -> Vec<Event> {
    events
        .iter()
        .filter(|e| !matches!(e, Event::CellFlipped { .. } | Event::AliveCellsCount { .. }))
        .cloned()
        .collect()
}

#[tokio::test]
async fn all_dead_board_stays_dead() {
    let (store, events) = play(params(4, 4, 1, 1), &Grid::new(4, 4)).await;

    assert!(flips_in(&events, 0).is_empty() && flips_in(&events, 1).is_empty());
    assert_eq!(
        lifecycle(&events),
        vec![
            Event::TurnComplete { completed_turns: 1 },
            Event::FinalTurnComplete { completed_turns: 1, alive: vec![] },
            Event::ImageOutputComplete { completed_turns: 1, filename: "4x4x1".into() },
            Event::StateChange { completed_turns: 1, new_state: State::Quitting },
        ]
    );
    assert_eq!(store.get("4x4x1"), Some(vec![0; 16]));
}

#[tokio::test]
async fn lonely_cell_dies_with_a_single_flip() {
    let world = Grid::from_alive(3, 3, &[Cell::new(1, 1)]);
    let (store, events) = play(params(3, 3, 1, 1), &world).await;

    assert_eq!(flips_in(&events, 0), vec![Cell::new(1, 1)]);
    assert_eq!(flips_in(&events, 1), vec![Cell::new(1, 1)]);
    assert_eq!(store.get("3x3x1"), Some(vec![0; 9]));
}

#[tokio::test]
async fn glider_returns_after_crossing_the_torus() {
    let glider = patterns::find("glider").expect("glider");
    let mut world = Grid::new(8, 8);
    glider.place(&mut world, 0, 0);

    // Period four, one cell diagonally per period: back home after 8 periods on an 8x8 torus
    let (_, events) = play(params(8, 8, 4, 4), &world).await;
    let mut moved = Grid::new(8, 8);
    glider.place(&mut moved, 1, 1);
    match lifecycle(&events).iter().find(|e| matches!(e, Event::FinalTurnComplete { .. })) {
        Some(Event::FinalTurnComplete { completed_turns: 4, alive }) => assert_eq!(alive, &moved.alive_cells()),
        other => panic!("unexpected final event {other:?}"),
    }

    let (store, _) = play(params(8, 8, 32, 3), &world).await;
    assert_eq!(store.get("8x8x32").as_deref(), Some(world.cells()));
}

#[tokio::test]
async fn flips_for_a_turn_precede_its_completion() {
    let world = patterns::random_grid(24, 18, 11);
    let (_, events) = play(params(24, 18, 6, 5), &world).await;

    let mut completed = 0;
    let mut board = Grid::new(24, 18);
    for event in &events {
        match event {
            Event::CellFlipped { completed_turns, cell } => {
                if *completed_turns == 0 {
                    assert_eq!(completed, 0, "initial board flips come first");
                } else {
                    assert_eq!(*completed_turns, completed + 1);
                }
                let flipped = if board.is_alive(cell.x, cell.y) { 0 } else { ALIVE };
                board.set(cell.x, cell.y, flipped);
            }
            Event::TurnComplete { completed_turns } => {
                assert_eq!(*completed_turns, completed + 1);
                completed += 1;
            }
            Event::FinalTurnComplete { alive, .. } => assert_eq!(alive, &board.alive_cells()),
            _ => {}
        }
    }
    assert_eq!(completed, 6);
}

#[tokio::test]
async fn more_workers_than_rows_still_progresses() {
    let world = patterns::find("blinker").expect("blinker").centred(6, 5);
    let (store, events) = play(params(6, 5, 2, 16), &world).await;

    let turns: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            Event::TurnComplete { completed_turns } => Some(*completed_turns),
            _ => None,
        })
        .collect();
    assert_eq!(turns, vec![1, 2]);
    assert_eq!(store.get("6x5x2").as_deref(), Some(world.cells()));
}

#[tokio::test]
async fn invalid_params_and_missing_images_fail_before_any_turn() {
    let (events_tx, mut events) = mpsc::channel(10);
    let (_keys_tx, keys) = mpsc::channel(1);
    let err = conway_dist::run(params(0, 4, 1, 1), MemoryStore::new(), events_tx, keys)
        .await
        .expect_err("zero width");
    assert!(err.to_string().contains("non-zero"));
    assert_eq!(events.recv().await, None);

    let (events_tx, _events) = mpsc::channel(10);
    let (_keys_tx, keys) = mpsc::channel(1);
    let err = conway_dist::run(params(4, 4, 1, 1), MemoryStore::new(), events_tx, keys)
        .await
        .expect_err("no image");
    assert!(err.to_string().contains("4x4"));
}

#[tokio::test]
async fn keyboard_pause_snapshot_and_quit() {
    let world = patterns::find("gosper glider gun").expect("gun").centred(48, 32);
    let store = MemoryStore::new();
    store.insert("48x32", world.cells().to_vec());
    let (events_tx, mut events) = mpsc::channel(64);
    let (keys_tx, keys) = mpsc::channel(10);
    let run = tokio::spawn(conway_dist::run(params(48, 32, 1_000_000, 6), store.clone(), events_tx, keys));

    keys_tx.send('p').await.expect("pause key");
    let mut paused_at = None;
    let mut outputs = Vec::new();
    let mut finals = 0;
    let mut last_state = None;
    while let Some(event) = events.recv().await {
        match event {
            Event::StateChange { completed_turns, new_state } => {
                last_state = Some(new_state);
                if new_state == State::Paused {
                    paused_at = Some(completed_turns);
                    keys_tx.send('x').await.expect("ignored key");
                    keys_tx.send('s').await.expect("snapshot key");
                }
            }
            Event::TurnComplete { .. } => assert!(paused_at.is_none(), "turn ran while paused"),
            Event::ImageOutputComplete { completed_turns, filename } => {
                outputs.push(completed_turns);
                if outputs.len() == 1 {
                    assert_eq!(filename, format!("48x32x{completed_turns}"));
                    keys_tx.send('q').await.expect("quit key");
                }
            }
            Event::FinalTurnComplete { .. } => finals += 1,
            _ => {}
        }
    }

    let paused_at = paused_at.expect("run paused");
    assert_eq!(run.await.expect("join").expect("run"), paused_at);
    // One snapshot from `s`, one from quitting, both of the paused board
    assert_eq!(outputs, vec![paused_at, paused_at]);
    assert_eq!(finals, 1);
    assert_eq!(last_state, Some(State::Quitting));
    assert!(store.get(&format!("48x32x{paused_at}")).is_some());
}
