// The simulation loop: an ordered flock of agents advanced one tick at a time.
//
// The update pass walks the flock by index and mutates each agent in place,
// so agents later in the order see the already-updated state of agents
// earlier in the order. Neighbour queries are never taken from a snapshot.

use bevy_ecs::prelude::*;
use glam::DVec2;
use rand::Rng;

use super::agent::{Agent, angle_delta};
use super::config::{ConfigError, FlockConfig, HeadingAverage};

/// Consumer of the per-tick render state. Receives every agent in flock
/// order before the update pass runs and cannot mutate them.
pub trait FrameSink {
    fn consume(&mut self, agents: &[Agent]);
}

#[derive(Resource, Debug, Clone)]
pub struct Flock {
    agents: Vec<Agent>,
    config: FlockConfig,
}

impl Flock {
    /// Spawn `config.population` agents at random integer positions with
    /// random integer headings.
    pub fn new<R: Rng + ?Sized>(config: FlockConfig, rng: &mut R) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut flock = Self {
            agents: Vec::with_capacity(config.population),
            config,
        };
        flock.reset(rng);
        Ok(flock)
    }

    /// Build a flock from explicit agents. The config is still validated.
    pub fn from_agents(config: FlockConfig, agents: Vec<Agent>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { agents, config })
    }

    /// Replace every agent with a freshly spawned one.
    pub fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        // Integer cells, as in a pixel grid.
        let cols = (self.config.width.ceil() as u64).max(1);
        let rows = (self.config.height.ceil() as u64).max(1);

        self.agents.clear();
        for _ in 0..self.config.population {
            let x = rng.gen_range(0..cols) as f64;
            let y = rng.gen_range(0..rows) as f64;
            let heading = rng.gen_range(0..360u32) as f64;
            let agent = Agent::new(DVec2::new(x, y), heading);
            log::trace!("spawn x={} y={} heading={}", agent.position.x, agent.position.y, agent.heading());
            self.agents.push(agent);
        }
        log::debug!(
            "spawned {} agents in {} x {}",
            self.agents.len(),
            self.config.width,
            self.config.height
        );
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn config(&self) -> &FlockConfig {
        &self.config
    }

    /// One frame: hand the current state to `sink`, then run the update pass.
    pub fn tick<S: FrameSink + ?Sized>(&mut self, sink: &mut S) {
        sink.consume(&self.agents);
        self.update();
    }

    /// The update pass alone.
    pub fn update(&mut self) {
        let cfg = &self.config;
        let view = cfg.view_filter();

        for i in 0..self.agents.len() {
            self.agents[i].move_forward(cfg.movement_dist, cfg.width, cfg.height);

            let agent = &self.agents[i];
            let Some(nearest) = agent.find_nearest(&self.agents, view) else {
                continue;
            };
            let nearest_pos = nearest.position;
            let target_angle = agent.bearing_to(nearest_pos);
            let target_dist = agent.distance_to(nearest_pos);

            let delta = if target_dist > cfg.group_dist {
                (target_angle - agent.heading()) * cfg.maneuverability
            } else {
                let radius = cfg.angle_average_radius;
                let gap = match cfg.heading_average {
                    HeadingAverage::Arithmetic => {
                        agent.average_heading_within(&self.agents, radius) - agent.heading()
                    }
                    // Shortest way round, otherwise the seam problem comes back.
                    HeadingAverage::Circular => {
                        angle_delta(agent.circular_heading_within(&self.agents, radius), agent.heading())
                    }
                };
                gap * cfg.maneuverability
            };
            self.agents[i].turn(delta);

            if cfg.enable_collision_avoidance && target_dist < cfg.collision_dist {
                let agent = &self.agents[i];
                let angle = cfg.collision_avoid_angle;
                let left = agent.project_point(cfg.movement_dist, angle, cfg.width, cfg.height);
                let right = agent.project_point(cfg.movement_dist, -angle, cfg.width, cfg.height);
                // Veer toward whichever side ends up farther from the neighbour.
                let turn = if nearest_pos.distance(left) > nearest_pos.distance(right) {
                    angle
                } else {
                    -angle
                };
                self.agents[i].turn(turn);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const EPS: f64 = 1e-9;

    fn small_config() -> FlockConfig {
        FlockConfig::default().with_domain(100.0, 100.0)
    }

    fn agent(x: f64, y: f64, heading: f64) -> Agent {
        Agent::new(DVec2::new(x, y), heading)
    }

    #[derive(Default)]
    struct Recorder {
        frames: Vec<Vec<Agent>>,
    }

    impl FrameSink for Recorder {
        fn consume(&mut self, agents: &[Agent]) {
            self.frames.push(agents.to_vec());
        }
    }

    #[test]
    fn new_spawns_population_inside_domain() {
        let mut rng = StdRng::seed_from_u64(7);
        let config = FlockConfig::default().with_population(64);
        let flock = Flock::new(config, &mut rng).unwrap();

        assert_eq!(flock.len(), 64);
        for a in flock.agents() {
            assert!((0.0..1500.0).contains(&a.position.x));
            assert!((0.0..1000.0).contains(&a.position.y));
            assert_eq!(a.position.x.fract(), 0.0);
            assert_eq!(a.heading().fract(), 0.0);
            assert!((0.0..360.0).contains(&a.heading()));
        }
    }

    #[test]
    fn same_seed_same_flock() {
        let a = Flock::new(small_config(), &mut StdRng::seed_from_u64(3)).unwrap();
        let b = Flock::new(small_config(), &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(a.agents(), b.agents());
    }

    #[test]
    fn new_rejects_bad_config() {
        let config = FlockConfig::default().with_domain(-1.0, 10.0);
        assert!(Flock::new(config, &mut StdRng::seed_from_u64(0)).is_err());
    }

    #[test]
    fn empty_flock_ticks() {
        let config = small_config().with_population(0);
        let mut flock = Flock::new(config, &mut StdRng::seed_from_u64(0)).unwrap();
        assert!(flock.is_empty());
        flock.update();
        assert!(flock.is_empty());
    }

    #[test]
    fn lone_agent_moves_without_steering() {
        let mut flock = Flock::from_agents(small_config(), vec![agent(10.0, 10.0, 90.0)]).unwrap();
        flock.update();
        let a = flock.agents()[0];
        assert!((a.position.y - 15.0).abs() < EPS);
        assert_eq!(a.heading(), 90.0);
    }

    #[test]
    fn two_agents_align_in_order() {
        let agents = vec![agent(0.0, 0.0, 0.0), agent(10.0, 0.0, 180.0)];
        let mut flock = Flock::from_agents(small_config(), agents).unwrap();
        flock.update();

        let first = flock.agents()[0];
        assert!((first.position.x - 5.0).abs() < EPS);
        assert!(first.position.y.abs() < EPS);
        // Within group distance: (0 + 180) / 2 = 90, closed by 1/30.
        assert!((first.heading() - 3.0).abs() < EPS);

        let second = flock.agents()[1];
        assert!((second.position.x - 5.0).abs() < EPS);
        assert!(second.position.y.abs() < 1e-6);
        // Sees the first agent's updated heading of 3.
        let expected = 180.0 + ((180.0 + 3.0) / 2.0 - 180.0) / 30.0;
        assert!((second.heading() - expected).abs() < EPS);
    }

    #[test]
    fn distant_agent_steers_toward_nearest() {
        let agents = vec![agent(10.0, 10.0, 0.0), agent(15.0, 60.0, 0.0)];
        let mut flock = Flock::from_agents(small_config(), agents).unwrap();
        flock.update();

        // First agent moved to (15, 10); target straight along +y.
        let first = flock.agents()[0];
        assert!((first.heading() - 3.0).abs() < EPS);
    }

    #[test]
    fn neighbour_exactly_at_group_distance_aligns() {
        // After the move the first agent sits at (5, 0), exactly 25 away.
        let agents = vec![agent(0.0, 0.0, 0.0), agent(30.0, 0.0, 90.0)];
        let mut flock = Flock::from_agents(small_config(), agents).unwrap();
        flock.update();

        let first = flock.agents()[0];
        assert_eq!(first.position, DVec2::new(5.0, 0.0));
        // Align: (0 + 90) / 2 = 45, closed by 1/30. Steering would give 0.
        assert!((first.heading() - 1.5).abs() < EPS);
    }

    #[test]
    fn tick_renders_before_updating() {
        let agents = vec![agent(0.0, 0.0, 0.0), agent(50.0, 50.0, 90.0)];
        let before = agents.clone();
        let mut flock = Flock::from_agents(small_config(), agents).unwrap();

        let mut recorder = Recorder::default();
        flock.tick(&mut recorder);

        assert_eq!(recorder.frames, vec![before.clone()]);
        assert_ne!(flock.agents(), before.as_slice());
    }

    #[test]
    fn view_filter_changes_neighbour_choice() {
        // Nearest neighbour sits behind; a farther one is straight ahead.
        let agents = vec![
            agent(50.0, 50.0, 0.0),
            agent(40.0, 50.0, 90.0),
            agent(90.0, 52.0, 0.0),
        ];
        let mut plain = Flock::from_agents(small_config(), agents.clone()).unwrap();
        let mut filtered = Flock::from_agents(small_config().with_view_filter(true), agents).unwrap();
        plain.update();
        filtered.update();

        // Behind neighbour is 15 away: aligns with group average (0 + 90 + 0) / 3.
        assert!((plain.agents()[0].heading() - 1.0).abs() < EPS);
        // Ahead neighbour is ~35 away: steers toward it, a small right turn.
        let h = filtered.agents()[0].heading();
        assert!(h > 0.0 && h < 1.0);
    }

    #[test]
    fn collision_avoidance_veers_away() {
        // Neighbour slightly above the path; avoidance should turn toward -y.
        let agents = vec![agent(50.0, 50.0, 0.0), agent(60.0, 53.0, 0.0)];
        let config = small_config().with_collision_avoidance(true);
        let mut plain = Flock::from_agents(small_config(), agents.clone()).unwrap();
        let mut avoiding = Flock::from_agents(config, agents).unwrap();
        plain.update();
        avoiding.update();

        let expected = plain.agents()[0].heading() - 5.0;
        let got = avoiding.agents()[0].heading();
        assert!((got - expected.rem_euclid(360.0)).abs() < EPS);
    }

    #[test]
    fn circular_mode_keeps_group_near_seam() {
        let agents = vec![agent(50.0, 50.0, 350.0), agent(52.0, 50.0, 10.0)];
        let config = small_config().with_heading_average(HeadingAverage::Circular);
        let mut flock = Flock::from_agents(config, agents).unwrap();
        flock.update();

        let h = flock.agents()[0].heading();
        assert!(h > 350.0 || h < 10.0, "heading {h} swung away from the seam");
    }

    #[test]
    fn headings_and_positions_stay_bounded() {
        let mut rng = StdRng::seed_from_u64(11);
        let config = FlockConfig::default().with_domain(200.0, 120.0).with_population(40);
        let mut flock = Flock::new(config, &mut rng).unwrap();
        for _ in 0..200 {
            flock.update();
        }
        for a in flock.agents() {
            assert!((0.0..200.0).contains(&a.position.x));
            assert!((0.0..120.0).contains(&a.position.y));
            assert!((0.0..360.0).contains(&a.heading()));
        }
    }
}
