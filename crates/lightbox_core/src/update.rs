use crate::{
    AppState, CatalogEntry, Effect, Msg, PhotoId, PhotoRecord, RetryPolicy, ScrollState,
    StageKind, StageOutcome, StageState, TaskId,
};

/// Pure update function: applies a message to state and returns any effects.
///
/// Every registry mutation, record transition and presenter notification in
/// the system goes through here, serially. It never fails; malformed or
/// stale messages fall out as empty effect lists.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::CatalogLoaded(entries) => apply_catalog(&mut state, entries),
        Msg::CatalogFailed(reason) => vec![Effect::CatalogFailed { reason }],
        Msg::PhotoDisplayed(photo_id) => {
            if state.scroll == ScrollState::Idle {
                start_operations(&mut state, photo_id)
            } else {
                Vec::new()
            }
        }
        Msg::ViewportChanged(visible) => {
            state.visible = visible;
            if state.scroll == ScrollState::Idle {
                reconcile(&mut state)
            } else {
                // Recorded only; the drag-end reconcile will act on it.
                Vec::new()
            }
        }
        Msg::DragBegan => {
            let effects = if state.scroll == ScrollState::Idle {
                vec![Effect::SetQueuesSuspended(true)]
            } else {
                // A new drag during deceleration; queues are already gated.
                Vec::new()
            };
            state.scroll = ScrollState::Dragging;
            effects
        }
        Msg::DragEnded { will_decelerate } => {
            if state.scroll != ScrollState::Dragging {
                Vec::new()
            } else if will_decelerate {
                state.scroll = ScrollState::Decelerating;
                Vec::new()
            } else {
                settle(&mut state)
            }
        }
        Msg::DecelerationEnded => {
            if state.scroll == ScrollState::Decelerating {
                settle(&mut state)
            } else {
                Vec::new()
            }
        }
        Msg::StageFinished {
            photo_id,
            stage,
            task_id,
            outcome,
        } => apply_stage_finished(&mut state, photo_id, stage, task_id, outcome),
    };

    (state, effects)
}

/// Replaces the photo list. Any in-flight work belongs to the old list and
/// is cancelled before the records are dropped.
fn apply_catalog(state: &mut AppState, entries: Vec<CatalogEntry>) -> Vec<Effect> {
    let mut effects: Vec<Effect> = state
        .registry
        .drain()
        .into_iter()
        .map(|task_id| Effect::CancelTask { task_id })
        .collect();

    state.photos = entries
        .into_iter()
        .zip(1u64..)
        .map(|(entry, id)| (id, PhotoRecord::new(id, entry.name, entry.url)))
        .collect();
    state.visible.clear();
    state.dirty = true;

    effects.push(Effect::CatalogLoaded);
    effects
}

/// Per-item admission: starts the next stage a record is eligible for.
/// Invoked when a row is about to be displayed and from reconciliation.
fn start_operations(state: &mut AppState, photo_id: PhotoId) -> Vec<Effect> {
    let Some(record) = state.photos.get(&photo_id) else {
        return Vec::new();
    };

    match record.state() {
        StageState::Pending => admit_fetch(state, photo_id),
        StageState::Fetched => admit_transform(state, photo_id),
        StageState::Ready => Vec::new(),
        StageState::Failed => match state.retry_policy {
            RetryPolicy::KeepFailed => Vec::new(),
            RetryPolicy::RetryOnRevisit => {
                if let Some(record) = state.photos.get_mut(&photo_id) {
                    record.reset_for_retry();
                    state.dirty = true;
                }
                admit_fetch(state, photo_id)
            }
        },
    }
}

fn admit_fetch(state: &mut AppState, photo_id: PhotoId) -> Vec<Effect> {
    let Some(task_id) = admit(state, StageKind::Fetch, photo_id) else {
        return Vec::new();
    };
    let url = match state.photos.get(&photo_id) {
        Some(record) => record.url.clone(),
        None => return Vec::new(),
    };
    vec![Effect::StartFetch {
        task_id,
        photo_id,
        url,
    }]
}

fn admit_transform(state: &mut AppState, photo_id: PhotoId) -> Vec<Effect> {
    let Some(task_id) = admit(state, StageKind::Transform, photo_id) else {
        return Vec::new();
    };
    // The worker owns its input buffer; the record keeps the raw bytes until
    // the transform result replaces them.
    let raw = match state.photos.get(&photo_id) {
        Some(record) => record.artifact().to_vec(),
        None => return Vec::new(),
    };
    vec![Effect::StartTransform {
        task_id,
        photo_id,
        raw,
    }]
}

/// Registers a new task for `(stage, photo_id)`. `AlreadyPending` is the
/// expected no-op path when the previous task is still in flight.
fn admit(state: &mut AppState, stage: StageKind, photo_id: PhotoId) -> Option<TaskId> {
    if state.registry.is_pending(stage, photo_id) {
        return None;
    }
    let task_id = state.mint_task_id();
    if state.registry.register(stage, photo_id, task_id).is_err() {
        return None;
    }
    Some(task_id)
}

/// Visibility reconciliation: cancel everything pending for off-screen
/// photos, then admit work for visible photos with nothing in flight.
fn reconcile(state: &mut AppState) -> Vec<Effect> {
    let pending = state.registry.pending_ids();
    let mut effects = Vec::new();

    let to_cancel: Vec<PhotoId> = pending.difference(&state.visible).copied().collect();
    for photo_id in to_cancel {
        for task_id in state.registry.remove_all(photo_id) {
            effects.push(Effect::CancelTask { task_id });
        }
    }

    let to_start: Vec<PhotoId> = state.visible.difference(&pending).copied().collect();
    for photo_id in to_start {
        effects.extend(start_operations(state, photo_id));
    }

    effects
}

/// Drag or deceleration came to rest: resume the queues and reconcile
/// against the last reported visible set.
fn settle(state: &mut AppState) -> Vec<Effect> {
    state.scroll = ScrollState::Idle;
    let mut effects = vec![Effect::SetQueuesSuspended(false)];
    effects.extend(reconcile(state));
    effects
}

fn apply_stage_finished(
    state: &mut AppState,
    photo_id: PhotoId,
    stage: StageKind,
    task_id: TaskId,
    outcome: StageOutcome,
) -> Vec<Effect> {
    // A report whose handle is no longer registered comes from a cancelled
    // or superseded task; it must not touch the record.
    if state.registry.task_for(stage, photo_id) != Some(task_id) {
        return Vec::new();
    }
    state.registry.unregister(stage, photo_id);

    let Some(record) = state.photos.get_mut(&photo_id) else {
        return Vec::new();
    };

    match (stage, outcome) {
        (StageKind::Fetch, StageOutcome::Success(raw)) => record.mark_fetched(raw),
        (StageKind::Transform, StageOutcome::Success(derived)) => record.mark_ready(derived),
        (_, StageOutcome::Failed) => record.mark_failed(),
    }
    state.dirty = true;

    vec![Effect::PhotoChanged { photo_id }]
}
