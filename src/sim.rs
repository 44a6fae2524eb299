//! A small kinematic drone used to drive the stepping side without a physics simulator.
//!
//! The drone flies inside a square arena centred on the origin. Walls are the only obstacles and
//! the four range sensors report the distance to them along the body axes.

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use bon::Builder;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::command::{Action, Command};
use crate::snapshot::{DistanceSnapshot, LogLevel, Position};
use crate::stepping::SteppingAdapter;

#[derive(Debug, Clone, Builder)]
pub struct SimConfig {
    /// Half the side length of the arena, in metres.
    #[builder(default = 5.0)]
    pub arena_half_extent: f32,
    #[builder(default = 1.0)]
    pub cruise_altitude: f32,
    /// Distance covered per tick, in metres.
    #[builder(default = 0.05)]
    pub speed: f32,
    /// Turn away once a wall is closer than this.
    #[builder(default = 0.5)]
    pub wall_threshold: f32,
    /// Readings past this range are reported as [`DistanceSnapshot::NO_READING`].
    #[builder(default = 2.0)]
    pub sensor_range: f32,
    /// Battery percentage drained per airborne tick.
    #[builder(default = 0.01)]
    pub battery_drain: f32,
    #[builder(default)]
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[derive(Debug)]
pub struct SimDrone {
    config: SimConfig,
    base: Position,
    position: Position,
    heading: f32,
    battery: f32,
    rng: StdRng,
}

impl SimDrone {
    /// A landed drone with a full battery, sitting on `base`.
    pub fn new(base: Position, config: SimConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            base,
            position: base,
            heading: 0.0,
            battery: 100.0,
            rng,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn heading(&self) -> f32 {
        self.heading
    }

    pub fn battery(&self) -> f32 {
        self.battery
    }

    pub fn is_airborne(&self) -> bool {
        self.position.z > 0.0
    }

    /// Run one control tick against `adapter`.
    pub fn step(&mut self, adapter: &mut SteppingAdapter) {
        let previous = adapter.current_action();
        if let Some(cmd) = adapter.take_next_command() {
            self.on_command(adapter, &cmd, previous);
        }

        match adapter.current_action() {
            Action::Start => {
                if self.climb() {
                    adapter.set_action(Action::Move);
                }
            }
            Action::Move => {
                if self.should_change_direction() {
                    adapter.set_action(Action::ChooseAngle);
                } else {
                    self.advance();
                }
            }
            Action::ChooseAngle => {
                self.heading = self.rng.random_range(0.0..TAU);
                adapter.set_action(Action::Move);
            }
            Action::ChoosePerpendicularAngle => {
                self.heading = (self.heading + FRAC_PI_2).rem_euclid(TAU);
                adapter.set_action(Action::Move);
            }
            Action::Return => {
                if self.fly_home() {
                    adapter.log("Landed at base", LogLevel::Info);
                    adapter.signal_completion();
                    adapter.set_action(Action::None);
                }
            }
            Action::None
            | Action::Identify
            | Action::Stop
            | Action::EmergencyStop
            | Action::Done => {}
        }

        if self.is_airborne() {
            self.battery = (self.battery - self.config.battery_drain).max(0.0);
        }

        adapter.publish_state(adapter.state_snapshot(self.position, self.battery));
        adapter.publish_distances(self.distance_readings());
    }

    fn on_command(&mut self, adapter: &mut SteppingAdapter, cmd: &Command, previous: Action) {
        match cmd.action {
            // Identify is a side request, the drone carries on with what it was doing
            Action::Identify => {
                adapter.log(format!("Identifying while in {previous:?}"), LogLevel::Info);
                adapter.set_action(previous);
            }
            Action::EmergencyStop => adapter.log("Emergency stop", LogLevel::Warning),
            action => adapter.log(format!("Executing {action:?}"), LogLevel::Debug),
        }
    }

    /// Returns `true` once cruise altitude is reached.
    fn climb(&mut self) -> bool {
        let target = self.config.cruise_altitude;
        self.position.z = (self.position.z + self.config.speed).min(target);
        self.position.z >= target
    }

    fn advance(&mut self) {
        let limit = self.config.arena_half_extent;
        let (dy, dx) = self.heading.sin_cos();
        self.position.x = (self.position.x + dx * self.config.speed).clamp(-limit, limit);
        self.position.y = (self.position.y + dy * self.config.speed).clamp(-limit, limit);
    }

    /// Move towards base then descend. Returns `true` once landed on it.
    fn fly_home(&mut self) -> bool {
        let speed = self.config.speed;
        let remaining = self.position.planar_distance(&self.base);

        if remaining > speed {
            self.position.x += (self.base.x - self.position.x) / remaining * speed;
            self.position.y += (self.base.y - self.position.y) / remaining * speed;
            return false;
        }

        self.position.x = self.base.x;
        self.position.y = self.base.y;
        self.position.z = (self.position.z - speed).max(self.base.z);
        self.position.z <= self.base.z
    }

    fn should_change_direction(&self) -> bool {
        let front = self.range_along(self.heading);
        front != DistanceSnapshot::NO_READING && front < self.config.wall_threshold
    }

    pub fn distance_readings(&self) -> DistanceSnapshot {
        DistanceSnapshot {
            front: self.range_along(self.heading),
            back: self.range_along(self.heading + PI),
            left: self.range_along(self.heading + FRAC_PI_2),
            right: self.range_along(self.heading - FRAC_PI_2),
            position: self.position,
        }
    }

    /// Distance to the arena wall along `angle`, or the sentinel when out of sensor range.
    fn range_along(&self, angle: f32) -> f32 {
        let limit = self.config.arena_half_extent;
        let (dy, dx) = angle.sin_cos();

        let axis = |pos: f32, dir: f32| {
            if dir > f32::EPSILON {
                (limit - pos) / dir
            } else if dir < -f32::EPSILON {
                (-limit - pos) / dir
            } else {
                f32::INFINITY
            }
        };

        let range = axis(self.position.x, dx).min(axis(self.position.y, dy));
        if range > self.config.sensor_range {
            DistanceSnapshot::NO_READING
        } else {
            range
        }
    }
}
