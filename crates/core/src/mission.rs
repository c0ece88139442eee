//! Mission model - a vehicle trip and its status lifecycle.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::geo::{Coordinates, DistanceSource};
use crate::id::{DriverId, MissionId, UserId, VehicleId};
use crate::Time;

/// A mission order: one vehicle trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    /// Unique identifier
    pub id: MissionId,

    /// Assigned vehicle
    pub vehicle_id: VehicleId,

    /// Assigned driver
    pub driver_id: Option<DriverId>,

    /// Why the trip happens
    pub purpose: String,

    /// Where the trip goes, as free text
    pub destination: String,

    /// Departure date
    pub departure_date: NaiveDate,

    /// Planned return date
    pub return_date: Option<NaiveDate>,

    /// People carried, free text
    pub personnel: String,

    /// Lifecycle status
    pub status: MissionStatus,

    /// Starting point
    pub origin: Option<Coordinates>,

    /// Destination point
    pub destination_coords: Option<Coordinates>,

    /// Trip distance in kilometres
    pub distance_km: Option<f64>,

    /// Trip duration in minutes
    pub duration_min: Option<u32>,

    /// How `distance_km` was obtained
    pub distance_source: Option<DistanceSource>,

    /// Whether `distance_km` has been added to the vehicle odometer.
    /// Once true it never goes back to false.
    pub distance_applied: bool,

    /// Odometer reading when the vehicle left, km
    #[serde(default)]
    pub start_odometer_km: Option<f64>,

    /// Odometer reading when the vehicle came back, km
    #[serde(default)]
    pub return_odometer_km: Option<f64>,

    /// Free text
    pub notes: String,

    /// User who last wrote the mission
    pub responsible_id: UserId,

    /// Creation timestamp
    pub created_at: Time,

    /// Last update timestamp
    pub updated_at: Time,
}

/// Mission lifecycle status.
///
/// Missions start `Planned`. Any status may be set by an explicit update; the
/// only transition with a side effect is entering `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionStatus {
    /// Scheduled, not started
    #[default]
    Planned,
    /// On the road
    InProgress,
    /// Trip done
    Completed,
    /// Called off
    Cancelled,
}

impl MissionStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [MissionStatus; 4] = [
        MissionStatus::Planned,
        MissionStatus::InProgress,
        MissionStatus::Completed,
        MissionStatus::Cancelled,
    ];

    /// Stable snake_case name, as stored and serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// True when moving from `previous` (or from nothing, on creation) to
    /// `self` enters the completed state.
    pub fn enters_completed(&self, previous: Option<MissionStatus>) -> bool {
        *self == Self::Completed && previous != Some(Self::Completed)
    }
}

impl std::fmt::Display for MissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MissionStatus {
    type Err = crate::ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "planned" => Ok(Self::Planned),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(crate::ParseEnumError::new("mission status", s)),
        }
    }
}

impl Mission {
    /// Distance owed to the vehicle odometer after a write that moved the
    /// mission from `previous` to its current status.
    ///
    /// `None` unless the mission is entering `Completed`, carries a distance,
    /// and has not been credited yet.
    pub fn pending_odometer_credit(&self, previous: Option<MissionStatus>) -> Option<f64> {
        if self.distance_applied || !self.status.enters_completed(previous) {
            return None;
        }
        self.distance_km
    }

    /// Kilometres between the start and return odometer readings, when both
    /// were recorded.
    pub fn travelled_km(&self) -> Option<f64> {
        match (self.start_odometer_km, self.return_odometer_km) {
            (Some(start), Some(back)) => Some(crate::geo::round_km(back - start)),
            _ => None,
        }
    }
}

/// Filter for querying missions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MissionFilter {
    /// Only this status
    pub status: Option<MissionStatus>,

    /// Only this vehicle
    pub vehicle_id: Option<VehicleId>,
}

impl MissionFilter {
    /// Whether `mission` passes the filter.
    pub fn matches(&self, mission: &Mission) -> bool {
        self.status.map_or(true, |s| mission.status == s)
            && self.vehicle_id.map_or(true, |v| mission.vehicle_id == v)
    }
}

/// Mission counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MissionStats {
    /// All missions
    pub total: usize,
    /// Planned missions
    pub planned: usize,
    /// Missions on the road
    pub in_progress: usize,
    /// Completed missions
    pub completed: usize,
    /// Cancelled missions
    pub cancelled: usize,
    /// Sum of known distances of completed missions, km
    pub completed_distance_km: f64,
}

impl MissionStats {
    /// Tally a set of missions.
    pub fn from_missions(missions: &[Mission]) -> Self {
        let mut stats = Self {
            total: missions.len(),
            ..Default::default()
        };
        for mission in missions {
            match mission.status {
                MissionStatus::Planned => stats.planned += 1,
                MissionStatus::InProgress => stats.in_progress += 1,
                MissionStatus::Completed => {
                    stats.completed += 1;
                    stats.completed_distance_km += mission.distance_km.unwrap_or(0.0);
                }
                MissionStatus::Cancelled => stats.cancelled += 1,
            }
        }
        stats.completed_distance_km = crate::geo::round_km(stats.completed_distance_km);
        stats
    }
}
