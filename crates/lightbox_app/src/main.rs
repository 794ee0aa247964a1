mod effects;
mod logging;
mod presenter;

use std::collections::BTreeSet;
use std::env;
use std::thread;
use std::time::{Duration, Instant};

use engine_logging::engine_info;
use lightbox_core::{update, AppState, Effect, Msg, PhotoId, StageState};
use lightbox_engine::EngineConfig;

use crate::effects::EffectRunner;
use crate::presenter::ConsolePresenter;

/// How many rows the simulated viewport shows at once.
const VISIBLE_ROWS: usize = 6;

fn main() {
    logging::initialize(logging::LogDestination::Terminal);

    let Some(catalog_url) = env::args().nth(1) else {
        eprintln!("usage: lightbox_app <catalog-url>");
        std::process::exit(2);
    };

    let runner = EffectRunner::new(EngineConfig::default());
    let presenter = ConsolePresenter;
    engine_info!("loading catalog from {}", catalog_url);
    runner.load_catalog(&catalog_url);

    let mut state = AppState::new();
    let mut visible: BTreeSet<PhotoId> = BTreeSet::new();
    let deadline = Instant::now() + Duration::from_secs(120);

    while Instant::now() < deadline {
        let Some(msg) = runner.poll_msg() else {
            if !visible.is_empty() && all_settled(&state, &visible) {
                break;
            }
            thread::sleep(Duration::from_millis(20));
            continue;
        };

        let catalog_loaded = matches!(msg, Msg::CatalogLoaded(_));
        let catalog_failed = matches!(msg, Msg::CatalogFailed(_));
        let (next, effects) = apply(state, msg, &runner, &presenter);
        state = next;
        if catalog_failed {
            std::process::exit(1);
        }
        if catalog_loaded {
            // The first screenful of rows comes into view.
            let count = state.photo_count().min(VISIBLE_ROWS) as PhotoId;
            visible = (1..=count).collect();
            let (next, _) = apply(
                state,
                Msg::ViewportChanged(visible.clone()),
                &runner,
                &presenter,
            );
            state = next;
        }

        // A changed visible row gets re-displayed and asks for its next
        // stage, the way a reloaded on-screen cell would.
        for photo_id in changed_ids(&effects) {
            if visible.contains(&photo_id) {
                let (next, _) = apply(state, Msg::PhotoDisplayed(photo_id), &runner, &presenter);
                state = next;
            }
        }
    }

    engine_info!("session finished");
    render(&state);
}

fn apply(
    state: AppState,
    msg: Msg,
    runner: &EffectRunner,
    presenter: &ConsolePresenter,
) -> (AppState, Vec<Effect>) {
    let (mut state, effects) = update(state, msg);
    runner.run(effects.clone(), presenter);
    if state.consume_dirty() {
        render(&state);
    }
    (state, effects)
}

fn changed_ids(effects: &[Effect]) -> Vec<PhotoId> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::PhotoChanged { photo_id } => Some(*photo_id),
            _ => None,
        })
        .collect()
}

fn all_settled(state: &AppState, visible: &BTreeSet<PhotoId>) -> bool {
    visible.iter().all(|photo_id| {
        matches!(
            state.photo(*photo_id).map(|record| record.state()),
            Some(StageState::Ready | StageState::Failed)
        )
    })
}

fn render(state: &AppState) {
    for row in state.view().photos {
        let marker = match row.state {
            StageState::Pending => "…",
            StageState::Fetched => "◐",
            StageState::Ready => "●",
            StageState::Failed => "✗",
        };
        println!("{:>3}  {}  {}", row.photo_id, marker, row.name);
    }
    println!();
}
