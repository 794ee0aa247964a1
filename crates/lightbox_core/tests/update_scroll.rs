use std::collections::BTreeSet;

use lightbox_core::{
    update, AppState, CatalogEntry, Effect, Msg, PhotoId, ScrollState,
};

fn loaded_state(count: usize) -> AppState {
    let entries = (1..=count)
        .map(|i| CatalogEntry {
            name: format!("photo-{i}"),
            url: format!("https://photos.example.com/{i}.jpg"),
        })
        .collect();
    let (state, _) = update(AppState::new(), Msg::CatalogLoaded(entries));
    state
}

fn visible(ids: &[PhotoId]) -> Msg {
    Msg::ViewportChanged(ids.iter().copied().collect::<BTreeSet<_>>())
}

#[test]
fn drag_begin_suspends_both_queues() {
    let state = loaded_state(3);

    let (state, effects) = update(state, Msg::DragBegan);

    assert_eq!(effects, vec![Effect::SetQueuesSuspended(true)]);
    assert_eq!(state.scroll_state(), ScrollState::Dragging);
}

#[test]
fn no_admissions_while_dragging() {
    let state = loaded_state(3);
    let (state, _) = update(state, Msg::DragBegan);

    let (state, effects) = update(state, visible(&[1, 2]));
    assert_eq!(effects, Vec::new());

    let (state, effects) = update(state, Msg::PhotoDisplayed(1));
    assert_eq!(effects, Vec::new());
    assert!(state.registry().is_empty());
}

#[test]
fn drag_end_without_deceleration_resumes_and_reconciles() {
    let state = loaded_state(3);
    let (state, _) = update(state, Msg::DragBegan);
    let (state, _) = update(state, visible(&[1, 2]));

    let (state, effects) = update(
        state,
        Msg::DragEnded {
            will_decelerate: false,
        },
    );

    assert_eq!(state.scroll_state(), ScrollState::Idle);
    assert_eq!(effects[0], Effect::SetQueuesSuspended(false));
    let started: Vec<_> = effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::StartFetch { photo_id, .. } => Some(*photo_id),
            _ => None,
        })
        .collect();
    assert_eq!(started, vec![1, 2]);
}

#[test]
fn deceleration_defers_reconcile_until_it_ends() {
    let state = loaded_state(3);
    let (state, _) = update(state, Msg::DragBegan);

    let (state, effects) = update(
        state,
        Msg::DragEnded {
            will_decelerate: true,
        },
    );
    assert_eq!(effects, Vec::new());
    assert_eq!(state.scroll_state(), ScrollState::Decelerating);

    // The viewport keeps reporting while decelerating; only recorded.
    let (state, effects) = update(state, visible(&[3]));
    assert_eq!(effects, Vec::new());

    let (state, effects) = update(state, Msg::DecelerationEnded);
    assert_eq!(state.scroll_state(), ScrollState::Idle);
    assert_eq!(effects[0], Effect::SetQueuesSuspended(false));
    assert!(effects
        .iter()
        .any(|effect| matches!(effect, Effect::StartFetch { photo_id: 3, .. })));
}

#[test]
fn stray_deceleration_end_is_a_noop() {
    let state = loaded_state(3);
    let (_, effects) = update(state, Msg::DecelerationEnded);
    assert_eq!(effects, Vec::new());
}

#[test]
fn drag_during_deceleration_keeps_queues_suspended() {
    let state = loaded_state(3);
    let (state, _) = update(state, Msg::DragBegan);
    let (state, _) = update(
        state,
        Msg::DragEnded {
            will_decelerate: true,
        },
    );

    // A second touch-down while still decelerating; no duplicate suspend.
    let (state, effects) = update(state, Msg::DragBegan);
    assert_eq!(effects, Vec::new());
    assert_eq!(state.scroll_state(), ScrollState::Dragging);
}

#[test]
fn mid_fetch_drag_cancels_offscreen_work_at_drag_end() {
    let state = loaded_state(3);
    let (state, started) = update(state, visible(&[1, 2]));
    assert_eq!(started.len(), 2);

    let (state, _) = update(state, Msg::DragBegan);
    // The scroll leaves photos 1 and 2 behind; nothing happens yet.
    let (state, effects) = update(state, visible(&[3]));
    assert_eq!(effects, Vec::new());

    let (state, effects) = update(
        state,
        Msg::DragEnded {
            will_decelerate: false,
        },
    );
    assert_eq!(effects[0], Effect::SetQueuesSuspended(false));
    let cancels = effects
        .iter()
        .filter(|effect| matches!(effect, Effect::CancelTask { .. }))
        .count();
    assert_eq!(cancels, 2);
    assert!(effects
        .iter()
        .any(|effect| matches!(effect, Effect::StartFetch { photo_id: 3, .. })));
    assert!(!state.registry().is_pending(lightbox_core::StageKind::Fetch, 1));
}
