use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{AvailabilityBlock, DoctorError, WeeklyScheduleEntry};

/// Persistence for recurring schedule entries, indexed by `(doctor_id, weekday)`.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    /// Entries for one doctor and weekday, ordered by start time.
    async fn entries_for(&self, doctor_id: Uuid, weekday: u8) -> Result<Vec<WeeklyScheduleEntry>, DoctorError>;

    /// All entries of a doctor ordered by `(weekday, start_time)`.
    async fn entries_for_doctor(&self, doctor_id: Uuid) -> Result<Vec<WeeklyScheduleEntry>, DoctorError>;

    /// Inserts the entry, replacing one with the same `(doctor, weekday, start_time)`.
    async fn upsert_entry(&self, entry: WeeklyScheduleEntry) -> Result<WeeklyScheduleEntry, DoctorError>;

    async fn remove_entry(&self, doctor_id: Uuid, entry_id: Uuid) -> Result<WeeklyScheduleEntry, DoctorError>;
}

/// Persistence for availability blocks, indexed by `(doctor_id, start)`.
#[async_trait]
pub trait BlockStore: Send + Sync {
    async fn insert_block(&self, block: AvailabilityBlock) -> Result<AvailabilityBlock, DoctorError>;

    /// Blocks intersecting the half-open range `[start, end)`, ordered by start.
    async fn blocks_overlapping(
        &self,
        doctor_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<AvailabilityBlock>, DoctorError>;

    async fn remove_block(&self, doctor_id: Uuid, block_id: Uuid) -> Result<AvailabilityBlock, DoctorError>;
}

#[derive(Default)]
pub struct InMemoryScheduleStore {
    entries: RwLock<HashMap<(Uuid, u8), Vec<WeeklyScheduleEntry>>>,
    blocks: RwLock<HashMap<Uuid, BTreeMap<(DateTime<Utc>, Uuid), AvailabilityBlock>>>,
}

impl InMemoryScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScheduleStore for InMemoryScheduleStore {
    async fn entries_for(&self, doctor_id: Uuid, weekday: u8) -> Result<Vec<WeeklyScheduleEntry>, DoctorError> {
        let entries = self.entries.read().await;
        Ok(entries.get(&(doctor_id, weekday)).cloned().unwrap_or_default())
    }

    async fn entries_for_doctor(&self, doctor_id: Uuid) -> Result<Vec<WeeklyScheduleEntry>, DoctorError> {
        let entries = self.entries.read().await;
        Ok((0..7u8)
            .filter_map(|weekday| entries.get(&(doctor_id, weekday)))
            .flatten()
            .cloned()
            .collect())
    }

    async fn upsert_entry(&self, entry: WeeklyScheduleEntry) -> Result<WeeklyScheduleEntry, DoctorError> {
        let mut entries = self.entries.write().await;
        let day = entries.entry((entry.doctor_id, entry.weekday)).or_default();

        day.retain(|existing| existing.start_time != entry.start_time);
        day.push(entry.clone());
        day.sort_by_key(|existing| existing.start_time);

        Ok(entry)
    }

    async fn remove_entry(&self, doctor_id: Uuid, entry_id: Uuid) -> Result<WeeklyScheduleEntry, DoctorError> {
        let mut entries = self.entries.write().await;

        for weekday in 0..7u8 {
            if let Some(day) = entries.get_mut(&(doctor_id, weekday)) {
                if let Some(position) = day.iter().position(|entry| entry.id == entry_id) {
                    return Ok(day.remove(position));
                }
            }
        }

        Err(DoctorError::NotFound("Schedule entry".to_string()))
    }
}

#[async_trait]
impl BlockStore for InMemoryScheduleStore {
    async fn insert_block(&self, block: AvailabilityBlock) -> Result<AvailabilityBlock, DoctorError> {
        let mut blocks = self.blocks.write().await;
        blocks
            .entry(block.doctor_id)
            .or_default()
            .insert((block.start, block.id), block.clone());
        Ok(block)
    }

    async fn blocks_overlapping(
        &self,
        doctor_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<AvailabilityBlock>, DoctorError> {
        let blocks = self.blocks.read().await;
        let Some(by_start) = blocks.get(&doctor_id) else {
            return Ok(Vec::new());
        };

        // Keys below (end, nil) are exactly the blocks starting before `end`.
        Ok(by_start
            .range(..(end, Uuid::nil()))
            .map(|(_, block)| block)
            .filter(|block| block.end > start)
            .cloned()
            .collect())
    }

    async fn remove_block(&self, doctor_id: Uuid, block_id: Uuid) -> Result<AvailabilityBlock, DoctorError> {
        let mut blocks = self.blocks.write().await;
        let by_start = blocks
            .get_mut(&doctor_id)
            .ok_or_else(|| DoctorError::NotFound("Availability block".to_string()))?;

        let key = by_start
            .iter()
            .find(|(_, block)| block.id == block_id)
            .map(|(key, _)| *key)
            .ok_or_else(|| DoctorError::NotFound("Availability block".to_string()))?;

        by_start
            .remove(&key)
            .ok_or_else(|| DoctorError::NotFound("Availability block".to_string()))
    }
}
