// ECS systems driving the flock once per frame.
// The flock and its draw list are resources; the schedule runs reset, then tick.

use bevy_ecs::prelude::*;
use glam::DVec2;

use super::agent::Agent;
use super::flock::{Flock, FrameSink};

/// What the renderer needs from one agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentDraw {
    pub position: DVec2,
    pub heading: f64,
}

/// Render state captured at the start of the last tick, in flock order.
#[derive(Resource, Debug, Default)]
pub struct FrameDraws {
    pub agents: Vec<AgentDraw>,
}

impl FrameSink for FrameDraws {
    fn consume(&mut self, agents: &[Agent]) {
        self.agents.clear();
        self.agents.extend(agents.iter().map(|a| AgentDraw {
            position: a.position,
            heading: a.heading(),
        }));
    }
}

/// Run control toggled from the keyboard.
#[derive(Resource, Debug, Default)]
pub struct SimControl {
    pub paused: bool,
    pub reset_requested: bool,
    /// Update passes run since startup or the last reset.
    pub ticks: u64,
}

pub fn reset_system(mut flock: ResMut<Flock>, mut control: ResMut<SimControl>) {
    if !control.reset_requested {
        return;
    }
    control.reset_requested = false;
    control.ticks = 0;
    flock.reset(&mut rand::thread_rng());
    log::debug!("flock reset with {} agents", flock.len());
}

/// Render-state pass then update pass. While paused only the render state
/// is refreshed.
pub fn flock_tick_system(
    mut flock: ResMut<Flock>,
    mut draws: ResMut<FrameDraws>,
    mut control: ResMut<SimControl>,
) {
    if control.paused {
        draws.consume(flock.agents());
        return;
    }
    flock.tick(&mut *draws);
    control.ticks += 1;
}

pub fn build_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems((reset_system, flock_tick_system).chain());
    schedule
}

/// World with every resource the schedule expects.
pub fn build_world(flock: Flock) -> World {
    let mut world = World::new();
    world.insert_resource(flock);
    world.init_resource::<FrameDraws>();
    world.init_resource::<SimControl>();
    world
}
