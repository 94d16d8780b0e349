use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::forces::Force;

/// Position and velocity of one simulated node.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub index: usize,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    /// Pinned coordinates; set while the node is dragged.
    pub fx: Option<f64>,
    pub fy: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub alpha_min: f64,
    pub alpha_decay: f64,
    /// Fraction of velocity lost per tick.
    pub velocity_decay: f64,
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let alpha_min: f64 = 0.001;
        Self {
            alpha_min,
            // Cools from 1 to alpha_min in about 300 ticks.
            alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
            velocity_decay: 0.4,
            seed: None,
        }
    }
}

/// Velocity Verlet style force simulation over a fixed set of bodies.
///
/// There is no timer: callers advance it with [`Simulation::tick`] or
/// [`Simulation::run`].
pub struct Simulation {
    bodies: Vec<Body>,
    forces: Vec<(String, Box<dyn Force>)>,
    alpha: f64,
    alpha_min: f64,
    alpha_decay: f64,
    alpha_target: f64,
    velocity_factor: f64,
    rng: StdRng,
    ticks: usize,
}

impl Simulation {
    /// Create `count` bodies laid out on a phyllotaxis spiral around the origin.
    pub fn new(count: usize, config: &SimulationConfig) -> Self {
        let initial_radius = 10.0;
        let initial_angle = std::f64::consts::PI * (3.0 - 5f64.sqrt());

        let bodies = (0..count)
            .map(|i| {
                let radius = initial_radius * (0.5 + i as f64).sqrt();
                let angle = i as f64 * initial_angle;
                Body {
                    index: i,
                    x: radius * angle.cos(),
                    y: radius * angle.sin(),
                    vx: 0.0,
                    vy: 0.0,
                    fx: None,
                    fy: None,
                }
            })
            .collect();

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            bodies,
            forces: Vec::new(),
            alpha: 1.0,
            alpha_min: config.alpha_min,
            alpha_decay: config.alpha_decay,
            alpha_target: 0.0,
            velocity_factor: 1.0 - config.velocity_decay,
            rng,
            ticks: 0,
        }
    }

    /// Attach a named force. A force with the same name is replaced.
    pub fn with_force(mut self, name: &str, mut force: impl Force + 'static) -> Self {
        force.initialize(&self.bodies);
        self.forces.retain(|(existing, _)| existing != name);
        self.forces.push((name.to_string(), Box::new(force)));
        self
    }

    pub fn force_names(&self) -> Vec<&str> {
        self.forces.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn body_mut(&mut self, index: usize) -> Option<&mut Body> {
        self.bodies.get_mut(index)
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn set_alpha(&mut self, alpha: f64) {
        self.alpha = alpha;
    }

    pub fn alpha_target(&self) -> f64 {
        self.alpha_target
    }

    pub fn set_alpha_target(&mut self, target: f64) {
        self.alpha_target = target;
    }

    pub fn ticks(&self) -> usize {
        self.ticks
    }

    /// True once alpha has cooled below its minimum.
    pub fn is_settled(&self) -> bool {
        self.alpha < self.alpha_min
    }

    /// Advance one step: decay alpha, apply every force, integrate.
    pub fn tick(&mut self) {
        self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;

        for (_, force) in self.forces.iter_mut() {
            force.apply(&mut self.bodies, self.alpha, &mut self.rng);
        }

        for body in self.bodies.iter_mut() {
            match body.fx {
                Some(fx) => {
                    body.x = fx;
                    body.vx = 0.0;
                }
                None => {
                    body.vx *= self.velocity_factor;
                    body.x += body.vx;
                }
            }
            match body.fy {
                Some(fy) => {
                    body.y = fy;
                    body.vy = 0.0;
                }
                None => {
                    body.vy *= self.velocity_factor;
                    body.y += body.vy;
                }
            }
        }

        self.ticks += 1;
    }

    /// Tick until the simulation settles or `max_ticks` steps have run.
    /// Returns the number of ticks performed.
    pub fn run(&mut self, max_ticks: usize) -> usize {
        let mut performed = 0;
        while performed < max_ticks && !self.is_settled() {
            self.tick();
            performed += 1;
        }
        performed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forces::{CenterForce, LinkForce, ManyBodyForce};

    fn seeded() -> SimulationConfig {
        SimulationConfig {
            seed: Some(7),
            ..Default::default()
        }
    }

    #[test]
    fn test_initial_layout_is_spiral() {
        let sim = Simulation::new(3, &seeded());
        let b = sim.bodies();
        assert!((b[0].x - 10.0 * 0.5f64.sqrt()).abs() < 1e-9);
        assert_eq!(b[0].y, 0.0);
        assert_ne!(b[1].x, b[2].x);
    }

    #[test]
    fn test_cools_in_about_300_ticks() {
        let mut sim = Simulation::new(2, &seeded());
        let ticks = sim.run(1000);
        assert!(sim.is_settled());
        assert!((295..=305).contains(&ticks), "ticks = {}", ticks);
    }

    #[test]
    fn test_target_keeps_simulation_warm() {
        let mut sim = Simulation::new(2, &seeded());
        sim.set_alpha_target(0.3);
        assert_eq!(sim.run(500), 500);
        assert!(sim.alpha() > 0.29);
    }

    #[test]
    fn test_pinned_body_stays_put() {
        let mut sim = Simulation::new(3, &seeded())
            .with_force("charge", ManyBodyForce::new().strength(-500.0));
        if let Some(body) = sim.body_mut(1) {
            body.fx = Some(42.0);
            body.fy = Some(-3.0);
        }
        sim.run(50);
        let pinned = &sim.bodies()[1];
        assert_eq!((pinned.x, pinned.y), (42.0, -3.0));
        assert_eq!((pinned.vx, pinned.vy), (0.0, 0.0));
    }

    #[test]
    fn test_replacing_force_by_name() {
        let sim = Simulation::new(2, &seeded())
            .with_force("link", LinkForce::new(vec![(0, 1)]))
            .with_force("center", CenterForce::new(0.0, 0.0))
            .with_force("link", LinkForce::new(vec![]));
        assert_eq!(sim.force_names(), vec!["center", "link"]);
    }

    #[test]
    fn test_linked_bodies_approach_link_distance() {
        let mut sim = Simulation::new(2, &seeded())
            .with_force("link", LinkForce::new(vec![(0, 1)]).distance(150.0).strength(0.5));
        sim.run(300);
        let b = sim.bodies();
        let d = ((b[1].x - b[0].x).powi(2) + (b[1].y - b[0].y).powi(2)).sqrt();
        assert!((d - 150.0).abs() < 5.0, "distance = {}", d);
    }
}
