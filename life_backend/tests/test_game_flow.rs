use candid::Principal;
use life_backend::types::{
    FAUCET_AMOUNT, GENERATIONS_PER_TICK, SLOT_GRACE_PERIOD_NS, WIPE_INTERVAL_NS,
};
use life_backend::{LifeEngine, LifeError};

fn principal(n: u8) -> Principal {
    Principal::from_slice(&[0x07, n])
}

fn owner_at(engine: &LifeEngine, x: i32, y: i32) -> u8 {
    engine.cell_at(x, y).unwrap().owner
}

#[test]
fn test_faucet_then_place_then_tick() {
    let mut engine = LifeEngine::new();
    let alice = principal(1);

    assert_eq!(engine.balance_of(&alice), Err(LifeError::NotAPlayer));
    assert_eq!(engine.faucet(alice), FAUCET_AMOUNT);

    // Blinker
    let result = engine.place_cells(alice, &[(40, 39), (40, 40), (40, 41)]).unwrap();
    assert_eq!(result.placed, 3);
    assert_eq!(result.generation, 0);
    assert_eq!(result.new_balance, FAUCET_AMOUNT - 3);

    let report = engine.tick(1_000);
    assert!(report.ran);
    assert_eq!(engine.generation(), GENERATIONS_PER_TICK as u64);
    assert_eq!(engine.alive_count(), 3);
    assert_eq!(engine.audit_potential(), Ok(()));

    let state = engine.state_for(&alice);
    assert_eq!(state.player_num, Some(1));
    assert_eq!(state.players, vec![alice]);
    assert_eq!(state.alive_cells.len(), 3);
    // Reborn tips start with 0 coins, so only the center keeps its coin
    let coins: u32 = state
        .alive_cells
        .iter()
        .chain(state.territory.iter())
        .map(|c| c.coins as u32)
        .sum();
    assert_eq!(coins, 1);
}

#[test]
fn test_join_slot_inherits_territory() {
    let mut engine = LifeEngine::new();
    let alice = principal(1);
    let bob = principal(2);
    engine.faucet(alice);
    engine.place_cells(alice, &[(10, 10)]).unwrap();

    assert_eq!(engine.join_slot(bob, 1, 0), Err(LifeError::SlotOccupied(1)));
    assert_eq!(engine.join_slot(bob, 0, 0), Err(LifeError::InvalidSlot(0)));

    // The lone cell dies on the first tick; its territory outlives the slot
    let start = 1_000;
    engine.tick(start);
    assert_eq!(engine.alive_count(), 0);
    assert_eq!(owner_at(&engine, 10, 10), 1);
    assert_eq!(engine.tick(start + SLOT_GRACE_PERIOD_NS).released_slots, vec![1]);

    assert_eq!(engine.join_slot(bob, 1, start + SLOT_GRACE_PERIOD_NS), Ok(1));
    assert_eq!(engine.join_game(bob), Ok(1));
    let slot = &engine.slots_info()[0];
    assert!(slot.occupied);
    assert_eq!(slot.territory_cells, 1);
    assert_eq!(slot.territory_coins, 1);
}

#[test]
fn test_idle_slot_released_after_grace_period() {
    let mut engine = LifeEngine::new();
    let alice = principal(1);
    let bob = principal(2);
    engine.join_game(alice).unwrap();

    let start = 5_000;
    assert!(engine.tick(start).released_slots.is_empty());
    assert!(engine
        .tick(start + SLOT_GRACE_PERIOD_NS - 1)
        .released_slots
        .is_empty());
    assert_eq!(engine.tick(start + SLOT_GRACE_PERIOD_NS).released_slots, vec![1]);

    let slots = engine.slots_info();
    assert!(!slots[0].occupied);
    assert_eq!(engine.join_game(bob), Ok(1));
}

#[test]
fn test_wipe_runs_on_schedule() {
    let mut engine = LifeEngine::new();
    let alice = principal(1);
    engine.faucet(alice);
    // Block in quadrant 0 stays put until wiped
    engine
        .place_cells(alice, &[(5, 5), (6, 5), (5, 6), (6, 6)])
        .unwrap();

    let t0 = 1_000_000;
    assert!(engine.tick(t0).wipe.is_none());
    assert_eq!(engine.next_wipe(t0).quadrant, 0);
    assert_eq!(engine.next_wipe(t0).seconds_remaining, WIPE_INTERVAL_NS / 1_000_000_000);
    assert_eq!(engine.alive_count(), 4);

    let wipe = engine.tick(t0 + WIPE_INTERVAL_NS).wipe.unwrap();
    assert_eq!(wipe.quadrant, 0);
    assert_eq!(wipe.killed, 4);
    assert_eq!(engine.alive_count(), 0);
    assert_eq!(engine.next_wipe(t0 + WIPE_INTERVAL_NS).quadrant, 1);

    // Territory and coins survive the wipe
    let info = engine.quadrant_info();
    assert_eq!(info[0].territory_by_player[0], 4);
    assert_eq!(info[0].total_coins, 4);
    assert_eq!(engine.audit_potential(), Ok(()));
}

#[test]
fn test_pause_freezes_the_world() {
    let mut engine = LifeEngine::new();
    let alice = principal(1);
    engine.faucet(alice);
    engine.place_cells(alice, &[(1, 1), (1, 2), (1, 3)]).unwrap();

    engine.pause();
    assert!(!engine.tick(10).ran);
    assert_eq!(engine.generation(), 0);

    // Placement still works while paused
    assert_eq!(engine.place_cells(alice, &[(50, 50)]).unwrap().placed, 1);

    engine.resume();
    assert!(engine.tick(20).ran);
}

#[test]
fn test_capture_between_two_players() {
    let mut engine = LifeEngine::new();
    let alice = principal(1);
    let bob = principal(2);
    engine.faucet(alice);
    engine.faucet(bob);

    // Alice's lone cell dies and leaves one coin behind at (60, 61)
    engine.place_cells(alice, &[(60, 61)]).unwrap();
    engine.step_generation();
    assert_eq!(owner_at(&engine, 60, 61), 1);

    // Bob's row above it gives birth on (60, 61)
    engine.place_cells(bob, &[(59, 60), (60, 60), (61, 60)]).unwrap();
    let bob_before = engine.balance_of(&bob).unwrap();
    let report = engine.step_generation();

    let cell = engine.cell_at(60, 61).unwrap();
    assert_eq!(cell.owner, 2);
    assert_eq!(cell.coins, 0);
    assert_eq!(report.captures, 1);
    assert_eq!(engine.balance_of(&bob), Ok(bob_before + 1));
    assert_eq!(engine.balance_of(&alice), Ok(FAUCET_AMOUNT - 1));
}
