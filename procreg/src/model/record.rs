//! Execution record and the context it is created from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

use super::{ExecutionId, UnitId, UnitStatus};

/// What the engine knows about an execution when it starts.
///
/// Carried by the summary signal. The unit set is fixed here: no unit is
/// added or removed from the record afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub execution_id: ExecutionId,
    #[serde(default)]
    pub schema_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub sql: Option<String>,
    #[serde(default = "Utc::now")]
    pub start_time: DateTime<Utc>,
    pub units: Vec<UnitId>,
}

impl ExecutionContext {
    pub fn new(execution_id: impl Into<ExecutionId>, units: Vec<UnitId>) -> Self {
        Self {
            execution_id: execution_id.into(),
            schema_name: None,
            username: None,
            hostname: None,
            sql: None,
            start_time: Utc::now(),
            units,
        }
    }

    pub fn with_schema(mut self, schema_name: impl Into<String>) -> Self {
        self.schema_name = Some(schema_name.into());
        self
    }

    pub fn with_user(mut self, username: impl Into<String>, hostname: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.hostname = Some(hostname.into());
        self
    }

    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.sql = Some(sql.into());
        self
    }
}

/// One unit entry as it appears in the encoded record.
///
/// A missing `status` decodes as `PENDING`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionUnit {
    pub unit_id: UnitId,
    #[serde(default)]
    pub status: UnitStatus,
}

/// Per-execution aggregate of unit statuses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub execution_id: ExecutionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(
        default,
        serialize_with = "serialize_units",
        deserialize_with = "deserialize_units"
    )]
    unit_statuses: BTreeMap<UnitId, UnitStatus>,
}

impl ExecutionRecord {
    /// Build the initial record: every unit of the context is `PENDING`.
    pub fn from_context(context: &ExecutionContext) -> Self {
        Self {
            execution_id: context.execution_id.clone(),
            schema_name: context.schema_name.clone(),
            username: context.username.clone(),
            hostname: context.hostname.clone(),
            sql: context.sql.clone(),
            start_time: Some(context.start_time),
            unit_statuses: context
                .units
                .iter()
                .map(|unit| (unit.clone(), UnitStatus::Pending))
                .collect(),
        }
    }

    pub fn unit_statuses(&self) -> &BTreeMap<UnitId, UnitStatus> {
        &self.unit_statuses
    }

    pub fn status(&self, unit_id: &UnitId) -> Option<UnitStatus> {
        self.unit_statuses.get(unit_id).copied()
    }

    pub fn contains_unit(&self, unit_id: &UnitId) -> bool {
        self.unit_statuses.contains_key(unit_id)
    }

    /// Overwrite the status of a member unit.
    ///
    /// Returns `false` and leaves the record untouched when the unit is not
    /// part of the initial set.
    pub fn set_status(&mut self, unit_id: &UnitId, status: UnitStatus) -> bool {
        match self.unit_statuses.get_mut(unit_id) {
            Some(current) => {
                *current = status;
                true
            }
            None => false,
        }
    }

    pub fn unit_count(&self) -> usize {
        self.unit_statuses.len()
    }

    pub fn pending_units(&self) -> Vec<UnitId> {
        self.unit_statuses
            .iter()
            .filter(|(_, status)| !status.is_done())
            .map(|(unit, _)| unit.clone())
            .collect()
    }

    pub fn all_done(&self) -> bool {
        self.unit_statuses.values().all(UnitStatus::is_done)
    }

    pub fn done_count(&self) -> usize {
        self.unit_statuses.values().filter(|s| s.is_done()).count()
    }
}

fn serialize_units<S>(units: &BTreeMap<UnitId, UnitStatus>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let entries: Vec<ExecutionUnit> = units
        .iter()
        .map(|(unit_id, status)| ExecutionUnit {
            unit_id: unit_id.clone(),
            status: *status,
        })
        .collect();
    entries.serialize(serializer)
}

fn deserialize_units<'de, D>(deserializer: D) -> Result<BTreeMap<UnitId, UnitStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = Vec::<ExecutionUnit>::deserialize(deserializer)?;
    let mut units = BTreeMap::new();
    for entry in entries {
        if units.insert(entry.unit_id.clone(), entry.status).is_some() {
            return Err(serde::de::Error::custom(format!(
                "duplicate unit id '{}'",
                entry.unit_id
            )));
        }
    }
    Ok(units)
}
