//! Vehicle model - a car of the fleet with its cumulative odometer.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::id::VehicleId;
use crate::Time;

/// A vehicle owned by the organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    /// Unique identifier
    pub id: VehicleId,

    /// Display name
    pub name: String,

    /// Manufacturer
    pub brand: String,

    /// Model name
    pub model: String,

    /// Licence plate, unique across the fleet
    pub registration: String,

    /// Date the vehicle was first put on the road
    pub first_registration: Option<NaiveDate>,

    /// Fuel type
    pub fuel: FuelType,

    /// Gearbox
    pub transmission: Option<Transmission>,

    /// Number of doors
    pub doors: Option<u8>,

    /// Mechanical condition
    pub condition: MechanicalCondition,

    /// Fiscal horsepower (CV)
    pub fiscal_power: Option<u8>,

    /// Tank capacity in litres
    pub tank_capacity_l: Option<f64>,

    /// Cumulative odometer reading in kilometres
    pub odometer_km: f64,

    /// Average consumption in L/100km
    pub consumption_l_per_100km: Option<f64>,

    /// Free text
    pub description: String,

    /// Creation timestamp
    pub created_at: Time,

    /// Last update timestamp
    pub updated_at: Time,
}

/// Fuel type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuelType {
    /// Gasoline
    Petrol,
    /// Diesel
    Diesel,
}

/// Gearbox type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transmission {
    /// Manual gearbox
    Manual,
    /// Automatic gearbox
    Automatic,
}

/// Mechanical condition of a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MechanicalCondition {
    /// Needs work
    Poor,
    /// Road-worthy
    Good,
    /// Like new
    Excellent,
}

impl FuelType {
    /// Stable lowercase name, as stored.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Petrol => "petrol",
            Self::Diesel => "diesel",
        }
    }
}

impl std::str::FromStr for FuelType {
    type Err = crate::ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "petrol" => Ok(Self::Petrol),
            "diesel" => Ok(Self::Diesel),
            _ => Err(crate::ParseEnumError::new("fuel type", s)),
        }
    }
}

impl Transmission {
    /// Stable lowercase name, as stored.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Automatic => "automatic",
        }
    }
}

impl std::str::FromStr for Transmission {
    type Err = crate::ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "manual" => Ok(Self::Manual),
            "automatic" => Ok(Self::Automatic),
            _ => Err(crate::ParseEnumError::new("transmission", s)),
        }
    }
}

impl MechanicalCondition {
    /// Stable lowercase name, as stored.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Poor => "poor",
            Self::Good => "good",
            Self::Excellent => "excellent",
        }
    }
}

impl std::str::FromStr for MechanicalCondition {
    type Err = crate::ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "poor" => Ok(Self::Poor),
            "good" => Ok(Self::Good),
            "excellent" => Ok(Self::Excellent),
            _ => Err(crate::ParseEnumError::new("mechanical condition", s)),
        }
    }
}

/// Fleet-wide vehicle counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleStats {
    /// Number of vehicles
    pub total: usize,
    /// Vehicles in excellent condition
    pub excellent: usize,
    /// Vehicles in good condition
    pub good: usize,
    /// Vehicles in poor condition
    pub poor: usize,
    /// Petrol vehicles
    pub petrol: usize,
    /// Diesel vehicles
    pub diesel: usize,
}

impl VehicleStats {
    /// Tally a set of vehicles.
    pub fn from_vehicles(vehicles: &[Vehicle]) -> Self {
        let mut stats = Self {
            total: vehicles.len(),
            ..Default::default()
        };
        for vehicle in vehicles {
            match vehicle.condition {
                MechanicalCondition::Excellent => stats.excellent += 1,
                MechanicalCondition::Good => stats.good += 1,
                MechanicalCondition::Poor => stats.poor += 1,
            }
            match vehicle.fuel {
                FuelType::Petrol => stats.petrol += 1,
                FuelType::Diesel => stats.diesel += 1,
            }
        }
        stats
    }
}
