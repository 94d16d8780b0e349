//! Forces for [`crate::Simulation`].
//!
//! Each force nudges body velocities (or, for centering, positions) once per
//! tick, scaled by the current alpha. Interactions are computed pairwise;
//! conflict graphs stay small enough that no spatial index is needed.

use rand::Rng;
use rand::rngs::StdRng;

use crate::simulation::Body;

/// Tiny random offset used to separate coincident bodies.
pub(crate) fn jiggle(rng: &mut StdRng) -> f64 {
    (rng.r#gen::<f64>() - 0.5) * 1e-6
}

pub trait Force: Send + Sync {
    /// Called once when the force is attached, with the initial bodies.
    fn initialize(&mut self, _bodies: &[Body]) {}

    fn apply(&mut self, bodies: &mut [Body], alpha: f64, rng: &mut StdRng);
}

/// Spring between linked bodies pulling them toward `distance`.
pub struct LinkForce {
    links: Vec<(usize, usize)>,
    bias: Vec<f64>,
    distance: f64,
    strength: f64,
}

impl LinkForce {
    pub fn new(links: Vec<(usize, usize)>) -> Self {
        Self {
            links,
            bias: Vec::new(),
            distance: 30.0,
            strength: 1.0,
        }
    }

    pub fn distance(mut self, distance: f64) -> Self {
        self.distance = distance;
        self
    }

    pub fn strength(mut self, strength: f64) -> Self {
        self.strength = strength;
        self
    }
}

impl Force for LinkForce {
    fn initialize(&mut self, bodies: &[Body]) {
        // Weight the displacement by degree so hubs move less.
        let mut degree = vec![0usize; bodies.len()];
        for &(s, t) in &self.links {
            degree[s] += 1;
            degree[t] += 1;
        }
        self.bias = self
            .links
            .iter()
            .map(|&(s, t)| degree[s] as f64 / (degree[s] + degree[t]) as f64)
            .collect();
    }

    fn apply(&mut self, bodies: &mut [Body], alpha: f64, rng: &mut StdRng) {
        for (i, &(s, t)) in self.links.iter().enumerate() {
            let mut x = bodies[t].x + bodies[t].vx - bodies[s].x - bodies[s].vx;
            let mut y = bodies[t].y + bodies[t].vy - bodies[s].y - bodies[s].vy;
            if x == 0.0 {
                x = jiggle(rng);
            }
            if y == 0.0 {
                y = jiggle(rng);
            }

            let len = (x * x + y * y).sqrt();
            let l = (len - self.distance) / len * alpha * self.strength;
            x *= l;
            y *= l;

            let b = self.bias.get(i).copied().unwrap_or(0.5);
            bodies[t].vx -= x * b;
            bodies[t].vy -= y * b;
            bodies[s].vx += x * (1.0 - b);
            bodies[s].vy += y * (1.0 - b);
        }
    }
}

/// Charge between every pair of bodies; negative strength repels.
pub struct ManyBodyForce {
    strength: f64,
    distance_min2: f64,
    distance_max2: f64,
}

impl ManyBodyForce {
    pub fn new() -> Self {
        Self {
            strength: -30.0,
            distance_min2: 1.0,
            distance_max2: f64::INFINITY,
        }
    }

    pub fn strength(mut self, strength: f64) -> Self {
        self.strength = strength;
        self
    }

    pub fn distance_max(mut self, distance: f64) -> Self {
        self.distance_max2 = distance * distance;
        self
    }
}

impl Default for ManyBodyForce {
    fn default() -> Self {
        Self::new()
    }
}

impl Force for ManyBodyForce {
    fn apply(&mut self, bodies: &mut [Body], alpha: f64, rng: &mut StdRng) {
        let n = bodies.len();
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let mut x = bodies[j].x - bodies[i].x;
                let mut y = bodies[j].y - bodies[i].y;
                let mut l = x * x + y * y;
                if l >= self.distance_max2 {
                    continue;
                }
                if x == 0.0 {
                    x = jiggle(rng);
                    l += x * x;
                }
                if y == 0.0 {
                    y = jiggle(rng);
                    l += y * y;
                }
                if l < self.distance_min2 {
                    l = (self.distance_min2 * l).sqrt();
                }

                let w = self.strength * alpha / l;
                bodies[i].vx += x * w;
                bodies[i].vy += y * w;
            }
        }
    }
}

/// Translates all bodies so their barycenter sits at (`x`, `y`).
pub struct CenterForce {
    x: f64,
    y: f64,
    strength: f64,
}

impl CenterForce {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, strength: 1.0 }
    }
}

impl Force for CenterForce {
    fn apply(&mut self, bodies: &mut [Body], _alpha: f64, _rng: &mut StdRng) {
        if bodies.is_empty() {
            return;
        }
        let n = bodies.len() as f64;
        let (sx, sy) = bodies
            .iter()
            .fold((0.0, 0.0), |(sx, sy), b| (sx + b.x, sy + b.y));
        let dx = (sx / n - self.x) * self.strength;
        let dy = (sy / n - self.y) * self.strength;
        for body in bodies.iter_mut() {
            body.x -= dx;
            body.y -= dy;
        }
    }
}

/// Keeps bodies at least `2 * radius` apart.
pub struct CollideForce {
    radius: f64,
    strength: f64,
}

impl CollideForce {
    pub fn new(radius: f64) -> Self {
        Self {
            radius,
            strength: 1.0,
        }
    }

    pub fn strength(mut self, strength: f64) -> Self {
        self.strength = strength;
        self
    }
}

impl Force for CollideForce {
    fn apply(&mut self, bodies: &mut [Body], _alpha: f64, rng: &mut StdRng) {
        let n = bodies.len();
        let ri = self.radius;
        let rj = self.radius;
        let r = ri + rj;
        // Share of the push taken by the first body of the pair.
        let share = (rj * rj) / (ri * ri + rj * rj);

        for i in 0..n {
            let xi = bodies[i].x + bodies[i].vx;
            let yi = bodies[i].y + bodies[i].vy;
            for j in (i + 1)..n {
                let mut x = xi - bodies[j].x - bodies[j].vx;
                let mut y = yi - bodies[j].y - bodies[j].vy;
                let mut l = x * x + y * y;
                if l >= r * r {
                    continue;
                }
                if x == 0.0 {
                    x = jiggle(rng);
                    l += x * x;
                }
                if y == 0.0 {
                    y = jiggle(rng);
                    l += y * y;
                }
                let len = l.sqrt();
                let k = (r - len) / len * self.strength;
                x *= k;
                y *= k;

                bodies[i].vx += x * share;
                bodies[i].vy += y * share;
                bodies[j].vx -= x * (1.0 - share);
                bodies[j].vy -= y * (1.0 - share);
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Axis {
    X,
    Y,
}

/// Pulls each body toward a fixed coordinate on one axis.
pub struct PositionForce {
    axis: Axis,
    target: f64,
    strength: f64,
}

impl PositionForce {
    pub fn x(target: f64) -> Self {
        Self {
            axis: Axis::X,
            target,
            strength: 0.1,
        }
    }

    pub fn y(target: f64) -> Self {
        Self {
            axis: Axis::Y,
            target,
            strength: 0.1,
        }
    }

    pub fn strength(mut self, strength: f64) -> Self {
        self.strength = strength;
        self
    }
}

impl Force for PositionForce {
    fn apply(&mut self, bodies: &mut [Body], alpha: f64, _rng: &mut StdRng) {
        for body in bodies.iter_mut() {
            match self.axis {
                Axis::X => body.vx += (self.target - body.x) * self.strength * alpha,
                Axis::Y => body.vy += (self.target - body.y) * self.strength * alpha,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn body(index: usize, x: f64, y: f64) -> Body {
        Body {
            index,
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            fx: None,
            fy: None,
        }
    }

    #[test]
    fn test_link_pulls_distant_bodies_together() {
        let mut bodies = vec![body(0, 0.0, 0.0), body(1, 300.0, 0.0)];
        let mut link = LinkForce::new(vec![(0, 1)]).distance(150.0).strength(0.5);
        link.initialize(&bodies);
        link.apply(&mut bodies, 1.0, &mut StdRng::seed_from_u64(1));

        assert!(bodies[0].vx > 0.0);
        assert!(bodies[1].vx < 0.0);
        assert!((bodies[0].vx + bodies[1].vx).abs() < 1e-9);
    }

    #[test]
    fn test_many_body_repels_within_range_only() {
        let mut bodies = vec![body(0, 0.0, 0.0), body(1, 100.0, 0.0), body(2, 1000.0, 0.0)];
        let mut charge = ManyBodyForce::new().strength(-500.0).distance_max(400.0);
        charge.apply(&mut bodies, 1.0, &mut StdRng::seed_from_u64(1));

        assert!(bodies[0].vx < 0.0);
        assert!(bodies[1].vx > 0.0);
        assert_eq!(bodies[2].vx, 0.0);
    }

    #[test]
    fn test_center_moves_barycenter() {
        let mut bodies = vec![body(0, 0.0, 0.0), body(1, 10.0, 20.0)];
        CenterForce::new(100.0, 100.0).apply(&mut bodies, 1.0, &mut StdRng::seed_from_u64(1));

        let cx = (bodies[0].x + bodies[1].x) / 2.0;
        let cy = (bodies[0].y + bodies[1].y) / 2.0;
        assert!((cx - 100.0).abs() < 1e-9);
        assert!((cy - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_collide_separates_overlapping_bodies() {
        let mut bodies = vec![body(0, 0.0, 0.0), body(1, 10.0, 0.0)];
        CollideForce::new(50.0)
            .strength(0.8)
            .apply(&mut bodies, 1.0, &mut StdRng::seed_from_u64(1));

        assert!(bodies[0].vx < 0.0);
        assert!(bodies[1].vx > 0.0);
    }

    #[test]
    fn test_position_force_pulls_toward_axis() {
        let mut bodies = vec![body(0, 0.0, 500.0)];
        PositionForce::x(200.0).apply(&mut bodies, 0.5, &mut StdRng::seed_from_u64(1));
        PositionForce::y(200.0).apply(&mut bodies, 0.5, &mut StdRng::seed_from_u64(1));

        assert!((bodies[0].vx - 10.0).abs() < 1e-9);
        assert!((bodies[0].vy + 15.0).abs() < 1e-9);
    }
}
