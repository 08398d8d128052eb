//! Domain layer health check functionality

use std::collections::HashMap;

use serde::Serialize;
use tracing::warn;

use health_tracker_data::database::DatabasePool;

/// System health status
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemStatus {
    /// All components are healthy
    Healthy,
    /// Some components are degraded but the system is functional
    Degraded,
    /// System is not functioning properly
    Unhealthy,
}

/// Component health status
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Represents a health component with status and optional details
#[derive(Debug, Clone, Serialize)]
pub struct HealthComponent {
    pub status: ComponentStatus,
    pub details: Option<String>,
}

/// Represents the overall health of the system
#[derive(Debug, Clone, Serialize)]
pub struct SystemHealth {
    pub status: SystemStatus,
    /// Map of component names to their health status
    pub components: HashMap<String, HealthComponent>,
}

/// Check if the database is available and functioning properly
///
/// Returns:
/// - Ok(true) if the SQLite database answers queries
/// - Ok(false) if the service runs without a database (in-memory storage)
/// - Err if the database is configured but unavailable
pub async fn check_database_status(pool: Option<&DatabasePool>) -> Result<bool, String> {
    match pool {
        Some(pool) => pool
            .connection_info()
            .map(|_| true)
            .map_err(|e| format!("Database connection error: {}", e)),
        None => Ok(false),
    }
}

/// Get overall system health
pub async fn get_system_health(pool: Option<&DatabasePool>) -> SystemHealth {
    let db_component = match check_database_status(pool).await {
        Ok(true) => HealthComponent {
            status: ComponentStatus::Healthy,
            details: pool.map(|p| p.location().to_string()),
        },
        Ok(false) => HealthComponent {
            status: ComponentStatus::Degraded,
            details: Some("Running on in-memory storage; readings are not persisted".to_string()),
        },
        Err(e) => {
            warn!("Health check failed: {}", e);
            HealthComponent {
                status: ComponentStatus::Unhealthy,
                details: Some(e),
            }
        }
    };

    let overall_status = match db_component.status {
        ComponentStatus::Unhealthy => SystemStatus::Unhealthy,
        ComponentStatus::Degraded => SystemStatus::Degraded,
        ComponentStatus::Healthy => SystemStatus::Healthy,
    };

    SystemHealth {
        status: overall_status,
        components: vec![("database".to_string(), db_component)].into_iter().collect(),
    }
}
