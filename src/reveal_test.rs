use super::*;

fn msg(id: &str) -> Message {
    Message {
        id: id.into(),
        content: format!("message {id}"),
        user_name: "ada".into(),
        user_id: "u1".into(),
        created_at: 1_700_000_000,
    }
}

fn snapshot(prefix: &str, n: usize) -> Vec<Message> {
    (0..n).map(|i| msg(&format!("{prefix}{i}"))).collect()
}

fn settle(state: &mut RevealState) -> usize {
    let mut ticks = 0;
    while state.tick() {
        ticks += 1;
    }
    ticks
}

// =============================================================================
// seeding
// =============================================================================

#[test]
fn starts_empty() {
    let state = RevealState::default();
    assert_eq!(state.phase(), Phase::Empty);
    assert!(state.messages().is_empty());
    assert!(!state.has_more());
    assert_eq!(state.total_messages(), 0);
}

#[test]
fn seed_shows_min_of_ten_and_n() {
    for n in [0, 1, 2, 9, 10, 11, 25, 100] {
        let mut state = RevealState::new(RevealLimits::default());
        state.observe(snapshot("m", n));
        assert_eq!(state.displayed_count(), n.min(10), "n = {n}");
        assert_eq!(state.has_more(), n > 10, "n = {n}");
    }
}

#[test]
fn two_message_snapshot_is_settled_after_seed() {
    let mut state = RevealState::default();
    let snap = vec![msg("1"), msg("2")];
    let change = state.observe(snap.clone());
    assert_eq!(change, SnapshotChange::Seeded { shown: 2, total: 2 });
    assert_eq!(state.messages(), snap.as_slice());
    assert!(!state.has_more());
    assert_eq!(state.phase(), Phase::Settled);
}

#[test]
fn twenty_five_messages_settle_after_fifteen_ticks() {
    let mut state = RevealState::default();
    state.observe(snapshot("m", 25));
    assert_eq!(state.displayed_count(), 10);
    assert!(state.has_more());
    assert_eq!(state.phase(), Phase::Revealing);

    assert_eq!(settle(&mut state), 15);
    assert_eq!(state.displayed_count(), 25);
    assert!(!state.has_more());
    assert_eq!(state.phase(), Phase::Settled);
}

#[test]
fn ticks_reveal_in_array_order_and_monotonically() {
    let mut state = RevealState::default();
    let snap = snapshot("m", 14);
    state.observe(snap.clone());

    let mut last = state.displayed_count();
    while state.tick() {
        assert_eq!(state.displayed_count(), last + 1);
        assert_eq!(state.messages().last(), Some(&snap[last]));
        last = state.displayed_count();
    }
    assert_eq!(state.messages(), snap.as_slice());
}

#[test]
fn tick_when_settled_is_noop() {
    let mut state = RevealState::default();
    state.observe(snapshot("m", 3));
    assert!(!state.tick());
    assert_eq!(state.displayed_count(), 3);
}

// =============================================================================
// change detection
// =============================================================================

#[test]
fn equal_copy_does_not_restart_reveal() {
    let mut state = RevealState::default();
    let snap = snapshot("m", 25);
    state.observe(snap.clone());
    state.tick();
    state.tick();

    assert_eq!(state.observe(snap.clone()), SnapshotChange::Unchanged);
    assert_eq!(state.displayed_count(), 12);
}

#[test]
fn changing_one_id_restarts_reveal() {
    let mut state = RevealState::default();
    let mut snap = snapshot("m", 25);
    state.observe(snap.clone());
    settle(&mut state);

    snap[24].id = "other".into();
    assert_eq!(state.observe(snap), SnapshotChange::Seeded { shown: 10, total: 25 });
    assert_eq!(state.displayed_count(), 10);
}

#[test]
fn new_snapshot_mid_reveal_reseeds_from_new_snapshot() {
    let mut state = RevealState::new(RevealLimits { initial_display_count: 3, batch_size: 15 });
    state.observe(snapshot("a", 25));
    state.tick();
    state.tick();
    assert_eq!(state.displayed_count(), 5);

    let newer = snapshot("b", 30);
    assert_eq!(state.observe(newer.clone()), SnapshotChange::Seeded { shown: 3, total: 30 });
    assert_eq!(state.messages(), &newer[..3]);
    assert_eq!(state.total_messages(), 30);
    assert!(state.has_more());
}

#[test]
fn new_snapshot_after_show_all_reseeds_ten_of_thirty() {
    let mut state = RevealState::default();
    state.observe(snapshot("a", 25));
    state.show_all();
    let newer = snapshot("b", 30);
    assert_eq!(state.observe(newer.clone()), SnapshotChange::Seeded { shown: 10, total: 30 });
    assert_eq!(state.messages(), &newer[..10]);
    assert!(state.has_more());
}

#[test]
fn empty_snapshot_clears_even_mid_reveal() {
    let mut state = RevealState::default();
    state.observe(snapshot("m", 25));
    state.tick();
    assert_eq!(state.observe(Vec::new()), SnapshotChange::Cleared);
    assert_eq!(state.phase(), Phase::Empty);
    assert!(state.messages().is_empty());
    assert!(!state.has_more());
    assert_eq!(state.total_messages(), 0);
}

#[test]
fn empty_snapshot_when_already_empty_is_unchanged() {
    let mut state = RevealState::default();
    assert_eq!(state.observe(Vec::new()), SnapshotChange::Unchanged);
}

#[test]
fn shrinking_snapshot_reseeds() {
    let mut state = RevealState::default();
    let snap = snapshot("m", 20);
    state.observe(snap.clone());
    settle(&mut state);

    let shrunk = snap[..12].to_vec();
    assert_eq!(state.observe(shrunk), SnapshotChange::Seeded { shown: 10, total: 12 });
    assert_eq!(state.displayed_count(), 10);
}

#[test]
fn same_ids_after_clear_seed_again() {
    let mut state = RevealState::default();
    let snap = snapshot("m", 4);
    state.observe(snap.clone());
    state.observe(Vec::new());
    assert_eq!(state.observe(snap), SnapshotChange::Seeded { shown: 4, total: 4 });
}

// =============================================================================
// load_more / show_all
// =============================================================================

#[test]
fn load_more_extends_by_batch() {
    let mut state = RevealState::default();
    state.observe(snapshot("m", 40));
    assert!(state.load_more());
    assert_eq!(state.displayed_count(), 25);
    assert!(state.has_more());
    assert!(!state.is_loading_more());
}

#[test]
fn load_more_caps_at_total_and_converges() {
    let mut state = RevealState::default();
    state.observe(snapshot("m", 33));
    while state.load_more() {
        assert!(state.displayed_count() <= 33);
    }
    assert_eq!(state.displayed_count(), 33);
    assert!(!state.has_more());
    assert!(!state.load_more());
}

#[test]
fn load_more_without_more_is_noop() {
    let mut state = RevealState::default();
    state.observe(snapshot("m", 5));
    assert!(!state.load_more());
    assert_eq!(state.displayed_count(), 5);
}

#[test]
fn begin_load_more_guards_against_reentry() {
    let mut state = RevealState::default();
    state.observe(snapshot("m", 50));
    assert!(state.begin_load_more());
    assert!(state.is_loading_more());
    assert!(!state.begin_load_more());
    state.complete_load_more();
    assert!(!state.is_loading_more());
    assert_eq!(state.displayed_count(), 25);
}

#[test]
fn complete_without_begin_is_noop() {
    let mut state = RevealState::default();
    state.observe(snapshot("m", 50));
    state.complete_load_more();
    assert_eq!(state.displayed_count(), 10);
}

#[test]
fn show_all_displays_everything() {
    let mut state = RevealState::default();
    let snap = snapshot("m", 25);
    state.observe(snap.clone());
    state.show_all();
    assert_eq!(state.messages(), snap.as_slice());
    assert!(!state.has_more());
    assert_eq!(state.phase(), Phase::Settled);
    assert!(!state.tick());
}

#[test]
fn show_all_is_idempotent() {
    let mut state = RevealState::default();
    state.observe(snapshot("m", 25));
    state.show_all();
    let once = (state.displayed_count(), state.has_more(), state.phase());
    state.show_all();
    assert_eq!((state.displayed_count(), state.has_more(), state.phase()), once);
}

#[test]
fn show_all_on_empty_stays_empty() {
    let mut state = RevealState::default();
    state.show_all();
    assert_eq!(state.phase(), Phase::Empty);
    assert_eq!(state.displayed_count(), 0);
}
