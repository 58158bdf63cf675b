pub mod analysis;
pub mod components;
pub mod conditions;
pub mod config;
pub mod controller;
pub mod dot_cloud;
pub mod error;
pub mod fsm;
pub mod params;
pub mod record;
pub mod resources;
pub mod stimulus;
pub mod systems;

pub use components::*;
pub use conditions::{ConditionGrid, ConditionRow, TrialOrder};
pub use config::Config;
pub use controller::*;
pub use dot_cloud::{DotCloud, SpawnCovariance};
pub use error::{CloudError, ConditionError, ConfigError, Error, RecordError, Result};
pub use fsm::{Phase, PhaseEvent, PhaseMachine};
pub use params::*;
pub use record::{CsvTrialWriter, MemorySink, RecordSink, Sample, TrialRecord};
pub use resources::*;
pub use stimulus::{DrawKind, Shape, Stimulus};

use glam::Vec2;
use hecs::World;

/// Populate an empty world with the stimuli of one condition: the start
/// zone, the pre-cursor dot, the cursor (placed at the start) and the target.
pub fn spawn_trial(
    world: &mut World,
    row: &ConditionRow,
    config: &Config,
    rng: &mut ExperimentRng,
) -> std::result::Result<(), CloudError> {
    let cursor = Stimulus::build(
        row.n_dots_cursor,
        row.start(),
        row.cursor_size(),
        config.lifespan,
        config.spawn_correlation,
        &mut rng.0,
    )?;
    let target = Stimulus::build(
        row.n_dots_target,
        row.target(),
        row.target_size(),
        config.lifespan,
        config.spawn_correlation,
        &mut rng.0,
    )?;

    world.spawn((StartZone::new(row.start(), row.start_radius),));
    world.spawn((Precursor::new(row.start(), config.precursor_radius),));
    world.spawn((cursor, Role::Cursor));
    world.spawn((target, Role::Target));
    Ok(())
}

/// Everything the renderer draws this frame
pub fn draw_list(world: &World, phase: Phase) -> Vec<DrawItem> {
    let mut items = Vec::new();
    match phase {
        Phase::AwaitingStart => {
            for (_, zone) in world.query::<&StartZone>().iter() {
                items.push(DrawItem {
                    layer: DrawLayer::StartZone,
                    kind: DrawKind::Ellipse {
                        center: zone.center,
                        radii: Vec2::splat(zone.radius),
                    },
                });
            }
            for (_, precursor) in world.query::<&Precursor>().iter() {
                items.push(DrawItem {
                    layer: DrawLayer::Precursor,
                    kind: DrawKind::Ellipse {
                        center: precursor.position,
                        radii: Vec2::splat(precursor.radius),
                    },
                });
            }
        }
        Phase::Reaching => {
            // Target first so the cursor is drawn on top
            for wanted in [Role::Target, Role::Cursor] {
                for (_, (stimulus, role)) in world.query::<(&Stimulus, &Role)>().iter() {
                    if *role == wanted {
                        items.push(DrawItem {
                            layer: match role {
                                Role::Target => DrawLayer::Target,
                                Role::Cursor => DrawLayer::Cursor,
                            },
                            kind: stimulus.draw_kind(),
                        });
                    }
                }
            }
        }
    }
    items
}

/// What a draw item depicts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawLayer {
    StartZone,
    Precursor,
    Target,
    Cursor,
}

/// One shape or dot set for the renderer, in draw order
#[derive(Debug, Clone, PartialEq)]
pub struct DrawItem {
    pub layer: DrawLayer,
    pub kind: DrawKind,
}
