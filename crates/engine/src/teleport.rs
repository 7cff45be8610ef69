use std::time::Duration;

use tracing::{debug, info};

use crate::config::PortalConfig;
use crate::geometry::Vec2;
use crate::portal::Portal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DwellState {
    Idle,
    /// `ticks` counts consecutive frames at the portal center, the entry
    /// frame included.
    Dwelling { portal_index: usize, ticks: u32 },
    Teleporting { portal_index: usize },
}

/// Dwell-to-teleport state machine. Standing near a portal's center for the
/// configured number of frames fades the world and fires a teleport once.
#[derive(Debug, Clone)]
pub struct PortalInteraction {
    state: DwellState,
    elapsed: Duration,
    grace_period: Duration,
    trigger_radius: f32,
    center_radius: f32,
    delay_ticks: u32,
    faded_opacity: f32,
}

impl PortalInteraction {
    pub fn new(config: &PortalConfig) -> Self {
        Self {
            state: DwellState::Idle,
            elapsed: Duration::ZERO,
            grace_period: config.trigger_grace_period(),
            trigger_radius: config.trigger_radius,
            center_radius: config.center_radius,
            delay_ticks: config.teleport_delay_ticks.max(1),
            faded_opacity: config.faded_opacity,
        }
    }

    pub fn state(&self) -> DwellState {
        self.state
    }

    pub fn in_grace_period(&self) -> bool {
        self.elapsed < self.grace_period
    }

    /// Advances one frame. Returns the portal index on the frame the dwell
    /// completes; every later call returns `None` until `reset`.
    pub fn update(
        &mut self,
        dt: Duration,
        player_center: Vec2,
        portals: &[Portal],
    ) -> Option<usize> {
        self.elapsed = self.elapsed.saturating_add(dt);

        if matches!(self.state, DwellState::Teleporting { .. }) || self.in_grace_period() {
            return None;
        }

        let target = portals
            .iter()
            .map(|portal| (portal.index, player_center.distance(portal.position)))
            .filter(|(_, distance)| *distance <= self.trigger_radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .filter(|(_, distance)| *distance <= self.center_radius)
            .map(|(index, _)| index);

        self.state = match (self.state, target) {
            (DwellState::Dwelling { portal_index, ticks }, Some(index)) if portal_index == index => {
                DwellState::Dwelling {
                    portal_index,
                    ticks: ticks + 1,
                }
            }
            (_, Some(index)) => {
                debug!(portal_index = index, "dwell_started");
                DwellState::Dwelling {
                    portal_index: index,
                    ticks: 1,
                }
            }
            (DwellState::Dwelling { portal_index, ticks }, None) => {
                debug!(portal_index, ticks, "dwell_cancelled");
                DwellState::Idle
            }
            (state, None) => state,
        };

        if let DwellState::Dwelling { portal_index, ticks } = self.state {
            if ticks >= self.delay_ticks {
                info!(portal_index, "teleport_triggered");
                self.state = DwellState::Teleporting { portal_index };
                return Some(portal_index);
            }
        }
        None
    }

    /// Returns to `Idle`, e.g. when a triggered portal has nowhere to go.
    pub fn reset(&mut self) {
        self.state = DwellState::Idle;
    }

    /// World opacity for the current state. Full until half the dwell has
    /// elapsed, then linear down to the faded value at the trigger frame.
    pub fn opacity(&self) -> f32 {
        match self.state {
            DwellState::Idle => 1.0,
            DwellState::Teleporting { .. } => self.faded_opacity,
            DwellState::Dwelling { ticks, .. } => {
                let half = self.delay_ticks as f32 / 2.0;
                let ticks = ticks as f32;
                if ticks <= half {
                    1.0
                } else {
                    let progress = ((ticks - half) / half).min(1.0);
                    1.0 - (1.0 - self.faded_opacity) * progress
                }
            }
        }
    }
}
