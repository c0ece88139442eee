//! Auto Parc CLI - fleet API server and administration.

use std::path::PathBuf;

use anyhow::{Context, Result};
use autoparc_core::{MissionFilter, MissionStats, MissionStatus, UserRole, VehicleId};
use autoparc_fleet::{MissionService, UserService, VehicleService};
use autoparc_geo::DistanceResolver;
use autoparc_server::{open_storage, Config, StorageKind};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "autoparc")]
#[command(about = "Vehicle fleet and mission management", long_about = None)]
struct Cli {
    /// Storage backend (sqlite or json), overrides AUTOPARC_STORAGE
    #[arg(long, global = true)]
    storage: Option<StorageKind>,

    /// SQLite URL, overrides AUTOPARC_DATABASE_URL
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// JSON store directory, overrides AUTOPARC_DATA_DIR
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Listening port, overrides AUTOPARC_PORT
        #[arg(long)]
        port: Option<u16>,
    },
    /// Manage API users
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// List vehicles
    Vehicles,
    /// List missions
    Missions {
        /// Filter by status
        #[arg(long)]
        status: Option<MissionStatus>,
        /// Filter by vehicle
        #[arg(long)]
        vehicle: Option<VehicleId>,
    },
    /// Show fleet status
    Status,
}

#[derive(Subcommand)]
enum UserCommands {
    /// Create a user and print its API token
    Add {
        /// Display name
        name: String,
        /// Email address
        email: String,
        /// admin, manager or operator
        #[arg(long, default_value = "operator")]
        role: UserRole,
    },
    /// List users
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env().context("reading configuration")?;
    if let Some(storage) = cli.storage {
        config.storage = storage;
    }
    if let Some(url) = cli.database_url {
        config.database_url = url;
    }
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    if let Commands::Serve { port } = cli.command {
        if let Some(port) = port {
            config.port = port;
        }
        autoparc_server::serve(config).await?;
        return Ok(());
    }

    let storage = open_storage(&config).await?;

    match cli.command {
        Commands::Serve { .. } => {}
        Commands::User { command } => {
            let users = UserService::new(storage);
            match command {
                UserCommands::Add { name, email, role } => {
                    let user = users.create(&name, &email, role).await?;
                    info!("Created user {}", user.id);
                    println!("User: {} ({})", user.name, user.role.as_str());
                    println!("  ID: {}", user.id);
                    println!("  Token: {}", user.api_token);
                }
                UserCommands::List => {
                    let all = users.list().await?;
                    println!("Users ({})", all.len());
                    for user in all {
                        println!(
                            "  {} | {} | {} | {}",
                            user.id,
                            user.role.as_str(),
                            if user.active { "active" } else { "inactive" },
                            user.email,
                        );
                    }
                }
            }
        }
        Commands::Vehicles => {
            let vehicles = VehicleService::new(storage).list().await?;
            println!("Vehicles ({})", vehicles.len());
            for v in vehicles {
                println!(
                    "  {} | {} | {} {} | {:.2} km",
                    v.id, v.registration, v.brand, v.model, v.odometer_km
                );
            }
        }
        Commands::Missions { status, vehicle } => {
            let service = MissionService::new(storage, DistanceResolver::offline());
            let filter = MissionFilter {
                status,
                vehicle_id: vehicle,
            };
            let missions = service.list(&filter).await?;
            println!("Missions ({})", missions.len());
            for details in missions {
                let m = &details.mission;
                println!(
                    "  {} | {} | {} | {} | {} | {}",
                    m.id,
                    m.departure_date,
                    m.status,
                    details.registration.as_deref().unwrap_or("-"),
                    m.destination,
                    m.distance_km
                        .map(|d| format!("{d:.2} km"))
                        .unwrap_or_else(|| "-".to_string()),
                );
            }
        }
        Commands::Status => {
            let healthy = storage.health_check().await;
            let vehicles = VehicleService::new(storage.clone()).stats().await?;
            let missions: MissionStats = MissionService::new(storage, DistanceResolver::offline())
                .stats()
                .await?;

            println!("Auto Parc Status");
            println!("  Storage: {}", if healthy { "ok" } else { "unreachable" });
            println!("  Vehicles: {}", vehicles.total);
            for status in MissionStatus::ALL {
                let count = match status {
                    MissionStatus::Planned => missions.planned,
                    MissionStatus::InProgress => missions.in_progress,
                    MissionStatus::Completed => missions.completed,
                    MissionStatus::Cancelled => missions.cancelled,
                };
                println!("  Missions {}: {}", status, count);
            }
            println!("  Completed distance: {:.2} km", missions.completed_distance_km);
        }
    }

    Ok(())
}
