//! Paper Federation
//!
//! Headless shell around the simulation core. Autoplays a seeded run with
//! a simple strategy, logs what happens, and verifies that replaying the
//! recorded actions reproduces the same state hash.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use paper_federation::{
    config::{RunConfig, DEFAULT_TUNING_PATH},
    content::{Content, ValidationMode},
    game::{
        gate, reduce, replay, selectors, Action, IncubationMode, Resource, RunEventKind, RunPhase, RunState,
        UnionId,
    },
    persistence::{self, FileStore, SaveFormat},
    VERSION,
};

/// Upper bound on autoplay steps.
const MAX_STEPS: usize = 500;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "paper-federation")]
#[command(about = "Autoplay a seeded Paper Federation run")]
struct Args {
    /// RNG seed
    #[arg(long, default_value_t = 42)]
    seed: u32,

    /// Directory holding events.json, footnotes.json and names.json
    #[arg(long)]
    content: Option<PathBuf>,

    /// Accept invalid content with warnings (development only)
    #[arg(long)]
    lenient: bool,

    /// Tuning file
    #[arg(long, default_value = DEFAULT_TUNING_PATH)]
    tuning: PathBuf,

    /// Save the finished run into this directory
    #[arg(long)]
    save_dir: Option<PathBuf>,

    /// Save in binary instead of JSON
    #[arg(long)]
    binary: bool,
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("failed to set tracing subscriber")?;

    let args = Args::parse();
    info!("Paper Federation v{}", VERSION);

    let config = RunConfig::load_or_default(&args.tuning)
        .with_context(|| format!("loading tuning from {}", args.tuning.display()))?;
    let content = match &args.content {
        Some(dir) => {
            let mode = if args.lenient {
                ValidationMode::Lenient
            } else {
                ValidationMode::Strict
            };
            Content::load_dir(dir, mode).with_context(|| format!("loading content from {}", dir.display()))?
        }
        None => Content::bundled().context("bundled content is invalid")?,
    };
    info!(
        "{} events, {} footnotes, {} cycles, threshold {} delegates",
        content.events.len(),
        content.footnotes.len(),
        config.run.max_cycles,
        config.run.delegate_threshold
    );

    let (state, actions) = autoplay(args.seed, &content, &config)?;
    report(&state, &content);

    let hash = state.compute_hash();
    info!("Final state hash: {}", hex::encode(hash));

    info!("=== Verifying Determinism ===");
    let replayed = replay(args.seed, &actions, &content, &config);
    let replay_hash = replayed.compute_hash();
    info!("Replay state hash: {}", hex::encode(replay_hash));
    if hash != replay_hash {
        bail!("replay diverged after {} actions", actions.len());
    }
    info!("DETERMINISM VERIFIED: {} actions, hashes match", actions.len());

    if let Some(dir) = &args.save_dir {
        let format = if args.binary {
            SaveFormat::Binary
        } else {
            SaveFormat::Json
        };
        let mut store = FileStore::new(dir);
        persistence::save(&mut store, &state, format).context("saving run")?;
        info!("Saved to {}", store.path_for(persistence::SAVE_KEY).display());
    }

    Ok(())
}

/// Play a whole run. Returns the final state and every action dispatched.
fn autoplay(seed: u32, content: &Content, config: &RunConfig) -> Result<(RunState, Vec<Action>)> {
    let mut state = RunState::start(seed, config);
    let mut actions = Vec::new();
    info!("=== Run {} ===", seed);

    let mut dispatch = |state: &mut RunState, action: Action| {
        *state = reduce(state, &action, content, config);
        actions.push(action);
    };

    for _ in 0..MAX_STEPS {
        match state.phase {
            RunPhase::Ended => break,
            RunPhase::Election => dispatch(&mut state, Action::ResolveElection),
            RunPhase::Event => {
                let Some(choice) = pick_choice(&state, content) else {
                    bail!("event {:?} offers no eligible choice", state.active_event);
                };
                dispatch(&mut state, Action::ChooseOption { choice });
            }
            RunPhase::Playing => {
                for action in plan_cycle(&state, config) {
                    dispatch(&mut state, action);
                }
                let cycle = state.cycle;
                dispatch(&mut state, Action::DrawEvent);
                if state.phase == RunPhase::Playing && state.cycle == cycle {
                    dispatch(&mut state, Action::AdvanceCycle);
                }
            }
            RunPhase::Menu => bail!("run fell back to the menu"),
        }
    }

    if !state.is_ended() {
        warn!("autoplay stopped after {} steps without an ending", MAX_STEPS);
    }
    Ok((state, actions))
}

/// Generate, license, discipline, federate. Rejected actions are no-ops,
/// so the plan can be optimistic.
fn plan_cycle(state: &RunState, config: &RunConfig) -> Vec<Action> {
    let mut plan = Vec::new();
    let reserve = config.costs.federation_paperwork;
    let mut paperwork = state.resources.get(Resource::Paperwork);

    if !state.generated_this_cycle {
        plan.push(Action::GenerateUnions);
        paperwork -= config.costs.generate_paperwork;
    }

    // Unions the batch will create are not visible yet; name them ahead
    let upcoming = (state.next_union_id..state.next_union_id + config.run.generation_batch)
        .map(UnionId);
    let candidates = state
        .unions
        .values()
        .filter(|u| !u.is_licensed && !u.is_cracked)
        .map(|u| u.id)
        .chain(upcoming);
    for union in candidates {
        if paperwork - config.costs.license_paperwork < reserve {
            break;
        }
        plan.push(Action::LicenseUnion { union });
        paperwork -= config.costs.license_paperwork;
    }

    if let Some(union) = selectors::available_unions(state)
        .into_iter()
        .filter(|u| !u.is_incubated && u.stats.loyalty() < 60)
        .map(|u| u.id)
        .next()
    {
        if paperwork - config.costs.incubate_paperwork >= reserve {
            plan.push(Action::IncubateUnion {
                union,
                mode: IncubationMode::Discipline,
            });
        }
    }

    let available: Vec<_> = selectors::available_unions(state).iter().map(|u| u.id).collect();
    if available.len() >= 2 {
        plan.push(Action::CreateFederation {
            members: available[..2].to_vec(),
        });
    }
    plan
}

/// First eligible choice that does not end the run.
fn pick_choice(state: &RunState, content: &Content) -> Option<String> {
    let event = content.event(state.active_event.as_deref()?)?;
    let choices = gate::eligible_choices(state, event);
    choices
        .iter()
        .find(|c| c.ending.is_none())
        .or_else(|| choices.first())
        .map(|c| c.id.clone())
}

fn report(state: &RunState, content: &Content) {
    info!("=== Run Results ===");
    for entry in &state.journal {
        match &entry.kind {
            RunEventKind::FederationFormed { federation, members } => {
                info!("cycle {}: {} formed with {} members", entry.cycle, federation, members.len());
            }
            RunEventKind::UnionCracked { union, .. } => {
                info!("cycle {}: {} cracked", entry.cycle, union);
            }
            RunEventKind::ChoiceResolved { event_id, choice_id } => {
                info!("cycle {}: {} -> {}", entry.cycle, event_id, choice_id);
            }
            _ => {}
        }
    }

    info!(
        "unions {} ({} cracked), federations {}, delegates on paper {}",
        state.unions.len(),
        selectors::cracked_count(state),
        state.federations.len(),
        selectors::total_delegates(state)
    );
    if let Some(election) = &state.election {
        for tally in &election.federations {
            info!(
                "  {} {}: {}/{} at loyalty {}",
                tally.id, tally.name, tally.secured, tally.delegates, tally.average_loyalty
            );
        }
        info!(
            "Election: {}/{} secured, {} lost",
            election.secured,
            election.expected,
            election.lost()
        );
    }
    if let Some(loss) = selectors::active_loss(state) {
        info!("Loss condition: {:?}", loss);
    }
    info!("Ending: {:?} at cycle {}", state.ending, state.cycle);

    for id in &state.unlocked_footnotes {
        if let Some(footnote) = content.footnote(id) {
            info!("Footnote [{}] {}: {}", footnote.era, footnote.title, footnote.summary);
        }
    }
}
