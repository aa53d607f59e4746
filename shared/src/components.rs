//! ECS components and resources the world host attaches to generated content

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::structures::StructureSpec;

// =============================================================================
// WORLD TIME / DAY-NIGHT CYCLE
// =============================================================================

/// Day/night clock. Ghost odds read [`WorldTime::is_night`] when a ruin is built.
#[derive(Resource, Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct WorldTime {
    /// Current time within the full day+night cycle.
    pub seconds_in_cycle: f32,
    /// Duration of the "day" portion in seconds.
    pub day_duration: f32,
    /// Duration of the "night" portion in seconds.
    pub night_duration: f32,
}

impl WorldTime {
    /// 20 minutes of daylight.
    pub const DEFAULT_DAY_DURATION: f32 = 20.0 * 60.0;
    /// 7 minutes of night.
    pub const DEFAULT_NIGHT_DURATION: f32 = 7.0 * 60.0;

    pub fn new(day_duration: f32, night_duration: f32, seconds_in_cycle: f32) -> Self {
        let mut wt = Self {
            seconds_in_cycle,
            day_duration,
            night_duration,
        };
        wt.wrap();
        wt
    }

    pub fn cycle_duration(&self) -> f32 {
        self.day_duration + self.night_duration
    }

    pub fn is_day(&self) -> bool {
        self.seconds_in_cycle < self.day_duration
    }

    pub fn is_night(&self) -> bool {
        !self.is_day()
    }

    pub fn advance(&mut self, dt: f32) {
        self.seconds_in_cycle += dt.max(0.0);
        self.wrap();
    }

    fn wrap(&mut self) {
        let cycle = self.cycle_duration();
        if cycle > 0.0 {
            self.seconds_in_cycle = self.seconds_in_cycle.rem_euclid(cycle);
        } else {
            self.seconds_in_cycle = 0.0;
        }
    }
}

impl Default for WorldTime {
    fn default() -> Self {
        // Start just after sunrise
        Self::new(Self::DEFAULT_DAY_DURATION, Self::DEFAULT_NIGHT_DURATION, 30.0)
    }
}

// =============================================================================
// GENERATED CONTENT
// =============================================================================

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GhostKind {
    Friendly,
    Hostile,
}

/// A ghost haunting a ruin
#[derive(Component, Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Ghost {
    pub kind: GhostKind,
    /// Floor column it rose from
    pub home: IVec2,
}

/// Treasure billboard resting on a ruin floor
#[derive(Component, Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Treasure {
    pub block: IVec3,
}

/// One materialized ruin
#[derive(Component, Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Ruin {
    pub spec: StructureSpec,
    pub base_y: i32,
}
