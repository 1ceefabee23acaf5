//! Proximity detection for the portfolio zones.

use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{self, ConfigError, check_positive};

/// The fixed set of points of interest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneId {
    About,
    Skills,
    Projects,
    Experience,
    Contact,
}

impl ZoneId {
    pub const ALL: [ZoneId; 5] = [
        ZoneId::About,
        ZoneId::Skills,
        ZoneId::Projects,
        ZoneId::Experience,
        ZoneId::Contact,
    ];

    /// Stable lowercase key.
    pub fn key(self) -> &'static str {
        match self {
            ZoneId::About => "about",
            ZoneId::Skills => "skills",
            ZoneId::Projects => "projects",
            ZoneId::Experience => "experience",
            ZoneId::Contact => "contact",
        }
    }

    /// Label shown on the marker.
    pub fn label(self) -> &'static str {
        match self {
            ZoneId::About => "About Me",
            ZoneId::Skills => "Skills",
            ZoneId::Projects => "Projects",
            ZoneId::Experience => "Experience",
            ZoneId::Contact => "Contact",
        }
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A point of interest with a proximity radius.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub position: Vec3,
    pub radius: f32,
}

impl Zone {
    /// Strictly inside the radius.
    pub fn contains(&self, point: Vec3) -> bool {
        point.distance(self.position) < self.radius
    }
}

/// Ordered zone list. Order decides overlaps: the first containing zone wins.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneLayout {
    pub zones: Vec<Zone>,
}

impl Default for ZoneLayout {
    fn default() -> Self {
        const RADIUS: f32 = 4.0;
        let zone = |id, x, z| Zone {
            id,
            position: Vec3::new(x, 0.0, z),
            radius: RADIUS,
        };
        Self {
            zones: vec![
                zone(ZoneId::About, 10.0, 0.0),
                zone(ZoneId::Skills, 0.0, 10.0),
                zone(ZoneId::Projects, -10.0, 0.0),
                zone(ZoneId::Experience, 0.0, -10.0),
                zone(ZoneId::Contact, 8.0, 8.0),
            ],
        }
    }
}

impl ZoneLayout {
    pub fn get(&self, id: ZoneId) -> Option<&Zone> {
        self.zones.iter().find(|zone| zone.id == id)
    }

    /// The first zone containing `point`.
    pub fn zone_at(&self, point: Vec3) -> Option<&Zone> {
        self.zones.iter().find(|zone| zone.contains(point))
    }

    pub(crate) fn validate(&self) -> error::Result<()> {
        if self.zones.is_empty() {
            return Err(ConfigError::NoZones);
        }
        for (i, zone) in self.zones.iter().enumerate() {
            if self.zones[..i].iter().any(|other| other.id == zone.id) {
                return Err(ConfigError::DuplicateZone(zone.id));
            }
            check_positive("zones.radius", zone.radius)?;
            if !zone.position.is_finite() {
                return Err(ConfigError::OutOfRange {
                    field: "zones.position",
                    value: f32::NAN,
                    expected: "finite",
                });
            }
        }
        Ok(())
    }
}

// ============================================================================
// Detection
// ============================================================================

/// A single edge of the active-zone state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoneEvent {
    Exited(ZoneId),
    Entered(ZoneId),
}

/// A change of active zone. At least one side is set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ZoneTransition {
    pub exited: Option<ZoneId>,
    pub entered: Option<ZoneId>,
}

impl ZoneTransition {
    /// Events in order: the exit (if any) always precedes the entry.
    pub fn events(&self) -> impl Iterator<Item = ZoneEvent> {
        self.exited
            .map(ZoneEvent::Exited)
            .into_iter()
            .chain(self.entered.map(ZoneEvent::Entered))
    }
}

/// Tracks which zone, if any, the vehicle is in.
#[derive(Clone, Debug, Default)]
pub struct ZoneDetector {
    layout: ZoneLayout,
    active: Option<ZoneId>,
}

impl ZoneDetector {
    pub fn new(layout: ZoneLayout) -> Self {
        Self {
            layout,
            active: None,
        }
    }

    pub fn layout(&self) -> &ZoneLayout {
        &self.layout
    }

    pub fn active(&self) -> Option<ZoneId> {
        self.active
    }

    /// Re-evaluate the active zone for a new vehicle position.
    ///
    /// Returns the transition if the active zone changed.
    pub fn update(&mut self, position: Vec3) -> Option<ZoneTransition> {
        let next = self.layout.zone_at(position).map(|zone| zone.id);
        if next == self.active {
            return None;
        }

        let transition = ZoneTransition {
            exited: self.active,
            entered: next,
        };
        self.active = next;
        tracing::debug!(
            "Zone transition: {:?} -> {:?}",
            transition.exited,
            transition.entered
        );
        Some(transition)
    }

    /// Forget the active zone without emitting events.
    pub fn reset(&mut self) {
        self.active = None;
    }
}
