//! Modelo de Submission
//!
//! Este módulo contiene el struct Submission tipado, sus parámetros VRP,
//! el resultado de ejecución y las variantes de actualización que acepta el store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Type;
use uuid::Uuid;

use crate::utils::validation::double_option;

/// Estado de la submission - mapea al ENUM submission_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "submission_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    NotReady,
    Ready,
    Executed,
}

/// Conjunto de ubicaciones predefinido que recibe el solver
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "i16", into = "i16")]
pub enum LocationsSelector {
    Small = 1,
    Medium = 2,
    Large = 3,
}

impl LocationsSelector {
    pub const ALLOWED: [i64; 3] = [1, 2, 3];

    pub fn value(self) -> i16 {
        self as i16
    }
}

impl TryFrom<i64> for LocationsSelector {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(LocationsSelector::Small),
            2 => Ok(LocationsSelector::Medium),
            3 => Ok(LocationsSelector::Large),
            other => Err(format!("locations selector must be 1, 2 or 3, got {}", other)),
        }
    }
}

impl TryFrom<i16> for LocationsSelector {
    type Error = String;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        LocationsSelector::try_from(i64::from(value))
    }
}

impl From<LocationsSelector> for i16 {
    fn from(selector: LocationsSelector) -> Self {
        selector.value()
    }
}

/// Parámetros del problema; todos nulos hasta que el dueño los completa
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionParameters {
    pub num_vehicles: Option<u32>,
    pub depot: Option<u32>,
    pub max_distance: Option<u32>,
    pub locations_selector: Option<LocationsSelector>,
}

/// Parámetros completos, listos para invocar el solver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadyParameters {
    pub num_vehicles: u32,
    pub depot: u32,
    pub max_distance: u32,
    pub locations_selector: LocationsSelector,
}

impl SubmissionParameters {
    pub fn ready(&self) -> Option<ReadyParameters> {
        Some(ReadyParameters {
            num_vehicles: self.num_vehicles?,
            depot: self.depot?,
            max_distance: self.max_distance?,
            locations_selector: self.locations_selector?,
        })
    }

    pub fn is_complete(&self) -> bool {
        self.ready().is_some()
    }

    /// Estado que corresponde a estos parámetros antes de ejecutar
    pub fn readiness(&self) -> SubmissionStatus {
        if self.is_complete() {
            SubmissionStatus::Ready
        } else {
            SubmissionStatus::NotReady
        }
    }
}

/// Ruta de un vehículo tal como la reporta el solver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteResult {
    pub vehicle_id: i64,
    pub visited: Vec<u32>,
    pub distance: Option<i64>,
}

/// Resultado de una ejecución; existe solo en submissions Executed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub objective_value: Option<i64>,
    pub routes: Vec<RouteResult>,
    pub raw_result_text: String,
    pub execution_time: f64,
    pub credits_charged: u64,
}

/// Submission principal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub parameters: SubmissionParameters,
    pub status: SubmissionStatus,
    pub result: Option<ExecutionResult>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Submission {
    pub fn new(id: Uuid, owner_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id,
            owner_id,
            name: String::new(),
            parameters: SubmissionParameters::default(),
            status: SubmissionStatus::NotReady,
            result: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Aplicar una actualización en memoria (mismo efecto que el UPDATE en SQL)
    pub fn apply(&mut self, update: SubmissionUpdate) {
        match update {
            SubmissionUpdate::Parameters {
                name,
                parameters,
                status,
            } => {
                self.name = name;
                self.parameters = parameters;
                self.status = status;
            }
            SubmissionUpdate::Execution(result) => {
                self.status = SubmissionStatus::Executed;
                self.result = Some(result);
            }
        }
        self.updated_at = Utc::now();
    }
}

/// Campos que el store puede escribir en una sola operación
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionUpdate {
    Parameters {
        name: String,
        parameters: SubmissionParameters,
        status: SubmissionStatus,
    },
    Execution(ExecutionResult),
}

/// Edición parcial de parámetros.
///
/// `None` deja el campo igual, `Some(None)` lo borra y `Some(Some(v))` lo asigna.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParameterUpdate {
    #[serde(default, deserialize_with = "double_option")]
    pub num_vehicles: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub depot: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub max_distance: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub locations_selector: Option<Option<i64>>,
    #[serde(default)]
    pub name: Option<String>,
}
