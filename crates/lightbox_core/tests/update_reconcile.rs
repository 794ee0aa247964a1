use std::collections::BTreeSet;

use pretty_assertions::assert_eq;

use lightbox_core::{
    update, AppState, CatalogEntry, Effect, Msg, PhotoId, RetryPolicy, StageKind, StageOutcome,
    StageState, TaskId,
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

fn fetch_task(effects: &[Effect]) -> TaskId {
    effects
        .iter()
        .find_map(|effect| match effect {
            Effect::StartFetch { task_id, .. } => Some(*task_id),
            _ => None,
        })
        .expect("a StartFetch effect")
}

fn transform_task(effects: &[Effect]) -> TaskId {
    effects
        .iter()
        .find_map(|effect| match effect {
            Effect::StartTransform { task_id, .. } => Some(*task_id),
            _ => None,
        })
        .expect("a StartTransform effect")
}

#[test]
fn only_visible_photos_are_admitted() {
    let state = loaded_state(3);

    let (state, effects) = update(state, visible(&[2]));

    assert_eq!(
        effects,
        vec![Effect::StartFetch {
            task_id: 1,
            photo_id: 2,
            url: "https://photos.example.com/2.jpg".to_string(),
        }]
    );
    assert!(state.registry().is_pending(StageKind::Fetch, 2));
    assert!(!state.registry().is_pending(StageKind::Fetch, 1));
    assert!(!state.registry().is_pending(StageKind::Fetch, 3));
}

#[test]
fn fetch_success_does_not_auto_admit_transform() {
    let state = loaded_state(3);
    let (state, effects) = update(state, visible(&[2]));
    let task_id = fetch_task(&effects);

    let (mut state, effects) = update(
        state,
        Msg::StageFinished {
            photo_id: 2,
            stage: StageKind::Fetch,
            task_id,
            outcome: StageOutcome::Success(b"raw".to_vec()),
        },
    );

    assert_eq!(effects, vec![Effect::PhotoChanged { photo_id: 2 }]);
    let record = state.photo(2).unwrap();
    assert_eq!(record.state(), StageState::Fetched);
    assert_eq!(record.artifact(), b"raw");
    assert!(state.registry().is_empty());
    assert!(state.consume_dirty());

    // The transform is admitted only by the next reconcile.
    let (_, effects) = update(state, visible(&[2]));
    assert_eq!(
        effects,
        vec![Effect::StartTransform {
            task_id: 2,
            photo_id: 2,
            raw: b"raw".to_vec(),
        }]
    );
}

#[test]
fn transform_success_reaches_ready() {
    let state = loaded_state(1);
    let (state, effects) = update(state, visible(&[1]));
    let (state, _) = update(
        state,
        Msg::StageFinished {
            photo_id: 1,
            stage: StageKind::Fetch,
            task_id: fetch_task(&effects),
            outcome: StageOutcome::Success(b"raw".to_vec()),
        },
    );
    let (state, effects) = update(state, visible(&[1]));
    let (state, effects) = update(
        state,
        Msg::StageFinished {
            photo_id: 1,
            stage: StageKind::Transform,
            task_id: transform_task(&effects),
            outcome: StageOutcome::Success(b"derived".to_vec()),
        },
    );

    assert_eq!(effects, vec![Effect::PhotoChanged { photo_id: 1 }]);
    let record = state.photo(1).unwrap();
    assert_eq!(record.state(), StageState::Ready);
    assert_eq!(record.artifact(), b"derived");

    // Terminal: a further reconcile starts nothing.
    let (_, effects) = update(state, visible(&[1]));
    assert_eq!(effects, Vec::new());
}

#[test]
fn reconcile_is_idempotent_for_a_fixed_visible_set() {
    let state = loaded_state(3);
    let (state, first) = update(state, visible(&[1, 2]));
    assert_eq!(first.len(), 2);

    let (_, second) = update(state, visible(&[1, 2]));
    assert_eq!(second, Vec::new());
}

#[test]
fn reconcile_with_nothing_pending_cancels_nothing() {
    let state = loaded_state(3);
    let (_, effects) = update(state, visible(&[]));
    assert_eq!(effects, Vec::new());
}

#[test]
fn scrolling_away_cancels_and_late_completion_is_ignored() {
    let state = loaded_state(3);
    let (state, effects) = update(state, visible(&[2]));
    let task_id = fetch_task(&effects);

    // Photo 2 left the screen; id 5 is not in the catalog and is skipped.
    let (state, effects) = update(state, visible(&[5]));
    assert_eq!(effects, vec![Effect::CancelTask { task_id }]);
    assert!(state.registry().is_empty());

    // The cancelled task's completion arrives anyway and must change nothing.
    let (state, effects) = update(
        state,
        Msg::StageFinished {
            photo_id: 2,
            stage: StageKind::Fetch,
            task_id,
            outcome: StageOutcome::Success(b"raw".to_vec()),
        },
    );
    assert_eq!(effects, Vec::new());
    assert_eq!(state.photo(2).unwrap().state(), StageState::Pending);
    assert!(state.photo(2).unwrap().artifact().is_empty());
}

#[test]
fn stale_task_id_does_not_complete_a_newer_task() {
    let state = loaded_state(1);
    let (state, effects) = update(state, visible(&[1]));
    let current = fetch_task(&effects);

    let (state, effects) = update(
        state,
        Msg::StageFinished {
            photo_id: 1,
            stage: StageKind::Fetch,
            task_id: current + 100,
            outcome: StageOutcome::Failed,
        },
    );

    assert_eq!(effects, Vec::new());
    assert_eq!(state.photo(1).unwrap().state(), StageState::Pending);
    assert!(state.registry().is_pending(StageKind::Fetch, 1));
}

#[test]
fn displayed_photo_admits_once_while_pending() {
    let state = loaded_state(2);

    let (state, effects) = update(state, Msg::PhotoDisplayed(1));
    assert_eq!(effects.len(), 1);

    // Second display request while the fetch is still in flight: benign no-op.
    let (_, effects) = update(state, Msg::PhotoDisplayed(1));
    assert_eq!(effects, Vec::new());
}

#[test]
fn displayed_unknown_photo_is_ignored() {
    let state = loaded_state(2);
    let (_, effects) = update(state, Msg::PhotoDisplayed(99));
    assert_eq!(effects, Vec::new());
}

#[test]
fn fetch_failure_marks_failed_and_stays_failed() {
    let state = loaded_state(3);
    let (state, effects) = update(state, visible(&[2]));

    let (state, effects) = update(
        state,
        Msg::StageFinished {
            photo_id: 2,
            stage: StageKind::Fetch,
            task_id: fetch_task(&effects),
            outcome: StageOutcome::Failed,
        },
    );
    assert_eq!(effects, vec![Effect::PhotoChanged { photo_id: 2 }]);
    assert_eq!(state.photo(2).unwrap().state(), StageState::Failed);

    // Failed is terminal under the default policy.
    let (_, effects) = update(state, visible(&[2]));
    assert_eq!(effects, Vec::new());
}

#[test]
fn transform_failure_is_terminal() {
    let state = loaded_state(1);
    let (state, effects) = update(state, visible(&[1]));
    let (state, _) = update(
        state,
        Msg::StageFinished {
            photo_id: 1,
            stage: StageKind::Fetch,
            task_id: fetch_task(&effects),
            outcome: StageOutcome::Success(b"raw".to_vec()),
        },
    );
    let (state, effects) = update(state, visible(&[1]));
    let (state, effects) = update(
        state,
        Msg::StageFinished {
            photo_id: 1,
            stage: StageKind::Transform,
            task_id: transform_task(&effects),
            outcome: StageOutcome::Failed,
        },
    );
    assert_eq!(effects, vec![Effect::PhotoChanged { photo_id: 1 }]);
    assert_eq!(state.photo(1).unwrap().state(), StageState::Failed);

    let (_, effects) = update(state, visible(&[1]));
    assert_eq!(effects, Vec::new());
}

#[test]
fn retry_on_revisit_readmits_a_failed_photo() {
    let entries = vec![CatalogEntry {
        name: "dawn".to_string(),
        url: "https://photos.example.com/dawn.jpg".to_string(),
    }];
    let state = AppState::with_retry_policy(RetryPolicy::RetryOnRevisit);
    let (state, _) = update(state, Msg::CatalogLoaded(entries));

    let (state, effects) = update(state, visible(&[1]));
    let (state, _) = update(
        state,
        Msg::StageFinished {
            photo_id: 1,
            stage: StageKind::Fetch,
            task_id: fetch_task(&effects),
            outcome: StageOutcome::Failed,
        },
    );
    assert_eq!(state.photo(1).unwrap().state(), StageState::Failed);

    // Re-entering the visible set resets the record and admits a new fetch.
    let (state, effects) = update(state, visible(&[1]));
    assert_eq!(
        effects,
        vec![Effect::StartFetch {
            task_id: 2,
            photo_id: 1,
            url: "https://photos.example.com/dawn.jpg".to_string(),
        }]
    );
    assert_eq!(state.photo(1).unwrap().state(), StageState::Pending);
}
