// A single boid: position on a toroidal plane plus a heading in degrees.
// All queries are plain Euclidean; distances do not wrap across the seams.

use glam::DVec2;

/// Wrap `value` into `[0, size)`.
#[inline]
fn wrap(value: f64, size: f64) -> f64 {
    let mut v = value % size;
    if v < 0.0 {
        v += size;
    }
    // -1e-17 + size rounds to size
    if v >= size { 0.0 } else { v }
}

/// Signed difference `a - b` folded into (-180, 180].
#[inline]
pub fn angle_delta(a: f64, b: f64) -> f64 {
    let d = wrap(a - b, 360.0);
    if d > 180.0 { d - 360.0 } else { d }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Agent {
    pub position: DVec2,
    /// Degrees in [0, 360). 0 points along +x, 90 along +y.
    heading: f64,
}

impl Agent {
    pub fn new(position: DVec2, heading: f64) -> Self {
        Self {
            position,
            heading: wrap(heading, 360.0),
        }
    }

    pub fn heading(&self) -> f64 {
        self.heading
    }

    fn step(&self, heading: f64, distance: f64, width: f64, height: f64) -> DVec2 {
        let rad = heading.to_radians();
        let next = self.position + DVec2::new(rad.cos(), rad.sin()) * distance;
        DVec2::new(wrap(next.x, width), wrap(next.y, height))
    }

    /// Advance `distance` along the current heading, wrapping at the edges.
    pub fn move_forward(&mut self, distance: f64, width: f64, height: f64) {
        self.position = self.step(self.heading, distance, width, height);
    }

    /// Rotate by `delta` degrees (positive is toward +y).
    pub fn turn(&mut self, delta: f64) {
        self.heading = wrap(self.heading + delta, 360.0);
    }

    pub fn distance_to(&self, point: DVec2) -> f64 {
        let d = (self.position - point).abs();
        (d.x * d.x + d.y * d.y).sqrt()
    }

    /// Direction to `point` in degrees, in (-180, 180].
    pub fn bearing_to(&self, point: DVec2) -> f64 {
        let d = point - self.position;
        d.y.atan2(d.x).to_degrees()
    }

    /// Where this agent would land after turning by `turn_offset` and moving
    /// `distance`. Does not mutate.
    pub fn project_point(&self, distance: f64, turn_offset: f64, width: f64, height: f64) -> DVec2 {
        self.step(self.heading + turn_offset, distance, width, height)
    }

    fn is_self(&self, other: &Agent) -> bool {
        std::ptr::eq(self, other)
    }

    /// Closest other agent in `agents`, skipping `self` by address.
    ///
    /// Ties go to whichever agent comes first. With `view_angle` set, only
    /// agents whose bearing lies within `±view_angle` of the heading count.
    pub fn find_nearest<'a>(&self, agents: &'a [Agent], view_angle: Option<f64>) -> Option<&'a Agent> {
        let mut nearest = None;
        let mut min_dist = f64::INFINITY;

        for other in agents {
            if self.is_self(other) {
                continue;
            }
            if let Some(view) = view_angle {
                let off = angle_delta(self.bearing_to(other.position), self.heading).abs();
                if off >= view {
                    continue;
                }
            }
            let dist = self.distance_to(other.position);
            if dist < min_dist {
                min_dist = dist;
                nearest = Some(other);
            }
        }

        nearest
    }

    fn neighbours_within<'a>(&'a self, agents: &'a [Agent], radius: f64) -> impl Iterator<Item = &'a Agent> {
        agents
            .iter()
            .filter(move |other| !self.is_self(other) && self.distance_to(other.position) < radius)
    }

    /// Arithmetic mean of this agent's heading and those of other agents
    /// strictly closer than `radius`. No wraparound handling.
    pub fn average_heading_within(&self, agents: &[Agent], radius: f64) -> f64 {
        let mut total = self.heading;
        let mut count = 1usize;
        for other in self.neighbours_within(agents, radius) {
            total += other.heading;
            count += 1;
        }
        total / count as f64
    }

    /// Circular mean over the same set as `average_heading_within`, in
    /// [0, 360). Falls back to the own heading when the vectors cancel out.
    pub fn circular_heading_within(&self, agents: &[Agent], radius: f64) -> f64 {
        let unit = |deg: f64| {
            let rad = deg.to_radians();
            DVec2::new(rad.cos(), rad.sin())
        };
        let sum = self
            .neighbours_within(agents, radius)
            .fold(unit(self.heading), |acc, other| acc + unit(other.heading));

        if sum.length_squared() < 1e-18 {
            return self.heading;
        }
        wrap(sum.y.atan2(sum.x).to_degrees(), 360.0)
    }
}
