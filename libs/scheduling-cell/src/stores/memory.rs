//! In-memory store backend.
//!
//! Used by the test suites and by callers embedding the core without a
//! database. Each mutation takes a single write guard; reads clone the
//! matching rows and sort them per the trait contracts.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use shared_models::SchedulingError;

use crate::models::{Appointment, AppointmentStatus, AvailabilityException, AvailabilityTemplate};
use crate::stores::{AppointmentStore, AvailabilityExceptionStore, AvailabilityTemplateStore};

#[derive(Default)]
pub struct InMemoryTemplateStore {
    rows: Arc<RwLock<HashMap<Uuid, AvailabilityTemplate>>>,
}

impl InMemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AvailabilityTemplateStore for InMemoryTemplateStore {
    async fn insert(
        &self,
        template: AvailabilityTemplate,
    ) -> Result<AvailabilityTemplate, SchedulingError> {
        let mut rows = self.rows.write().await;
        rows.insert(template.id, template.clone());
        Ok(template)
    }

    async fn update(
        &self,
        template: AvailabilityTemplate,
    ) -> Result<AvailabilityTemplate, SchedulingError> {
        let mut rows = self.rows.write().await;
        if !rows.contains_key(&template.id) {
            return Err(SchedulingError::database(format!(
                "template {} vanished before update",
                template.id
            )));
        }
        rows.insert(template.id, template.clone());
        Ok(template)
    }

    async fn delete(&self, doctor_id: Uuid, id: Uuid) -> Result<(), SchedulingError> {
        let mut rows = self.rows.write().await;
        if let Some(existing) = rows.get(&id) {
            if existing.doctor_id == doctor_id {
                rows.remove(&id);
            }
        }
        Ok(())
    }

    async fn find_by_id(
        &self,
        doctor_id: Uuid,
        id: Uuid,
    ) -> Result<Option<AvailabilityTemplate>, SchedulingError> {
        let rows = self.rows.read().await;
        Ok(rows
            .get(&id)
            .filter(|template| template.doctor_id == doctor_id)
            .cloned())
    }

    async fn find_all_by_doctor(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<AvailabilityTemplate>, SchedulingError> {
        let rows = self.rows.read().await;
        let mut templates: Vec<AvailabilityTemplate> = rows
            .values()
            .filter(|template| template.doctor_id == doctor_id)
            .cloned()
            .collect();
        sort_templates(&mut templates);
        Ok(templates)
    }

    async fn find_by_doctor_and_weekdays(
        &self,
        doctor_id: Uuid,
        weekdays: &[i32],
    ) -> Result<Vec<AvailabilityTemplate>, SchedulingError> {
        let rows = self.rows.read().await;
        let mut templates: Vec<AvailabilityTemplate> = rows
            .values()
            .filter(|template| {
                template.doctor_id == doctor_id && weekdays.contains(&template.weekday)
            })
            .cloned()
            .collect();
        sort_templates(&mut templates);
        Ok(templates)
    }
}

// "HH:MM" compares correctly as a string, zero-padding keeps it lexicographic
fn sort_templates(templates: &mut [AvailabilityTemplate]) {
    templates.sort_by(|a, b| {
        a.weekday
            .cmp(&b.weekday)
            .then_with(|| a.start_time.cmp(&b.start_time))
    });
}

#[derive(Default)]
pub struct InMemoryExceptionStore {
    rows: Arc<RwLock<HashMap<Uuid, AvailabilityException>>>,
}

impl InMemoryExceptionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AvailabilityExceptionStore for InMemoryExceptionStore {
    async fn insert(
        &self,
        exception: AvailabilityException,
    ) -> Result<AvailabilityException, SchedulingError> {
        let mut rows = self.rows.write().await;
        rows.insert(exception.id, exception.clone());
        Ok(exception)
    }

    async fn update(
        &self,
        exception: AvailabilityException,
    ) -> Result<AvailabilityException, SchedulingError> {
        let mut rows = self.rows.write().await;
        if !rows.contains_key(&exception.id) {
            return Err(SchedulingError::database(format!(
                "exception {} vanished before update",
                exception.id
            )));
        }
        rows.insert(exception.id, exception.clone());
        Ok(exception)
    }

    async fn delete(&self, doctor_id: Uuid, id: Uuid) -> Result<(), SchedulingError> {
        let mut rows = self.rows.write().await;
        if let Some(existing) = rows.get(&id) {
            if existing.doctor_id == doctor_id {
                rows.remove(&id);
            }
        }
        Ok(())
    }

    async fn find_by_id(
        &self,
        doctor_id: Uuid,
        id: Uuid,
    ) -> Result<Option<AvailabilityException>, SchedulingError> {
        let rows = self.rows.read().await;
        Ok(rows
            .get(&id)
            .filter(|exception| exception.doctor_id == doctor_id)
            .cloned())
    }

    async fn find_all_by_doctor(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<AvailabilityException>, SchedulingError> {
        let rows = self.rows.read().await;
        let mut exceptions: Vec<AvailabilityException> = rows
            .values()
            .filter(|exception| exception.doctor_id == doctor_id)
            .cloned()
            .collect();
        exceptions.sort_by_key(|exception| exception.date);
        Ok(exceptions)
    }

    async fn find_by_doctor_and_date_range(
        &self,
        doctor_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AvailabilityException>, SchedulingError> {
        let rows = self.rows.read().await;
        let mut exceptions: Vec<AvailabilityException> = rows
            .values()
            .filter(|exception| {
                exception.doctor_id == doctor_id
                    && exception.date >= start
                    && exception.date <= end
            })
            .cloned()
            .collect();
        exceptions.sort_by_key(|exception| exception.date);
        Ok(exceptions)
    }
}

#[derive(Default)]
pub struct InMemoryAppointmentStore {
    rows: Arc<RwLock<Vec<Appointment>>>,
}

impl InMemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a booked appointment; the scheduling core itself never
    /// writes appointments.
    pub async fn insert(&self, appointment: Appointment) {
        let mut rows = self.rows.write().await;
        rows.push(appointment);
    }
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn find_by_doctor_and_date_range(
        &self,
        doctor_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        let rows = self.rows.read().await;
        let mut appointments: Vec<Appointment> = rows
            .iter()
            .filter(|appointment| {
                appointment.doctor_id == doctor_id
                    && appointment.status != AppointmentStatus::Cancelled
                    && appointment.start_time >= start
                    && appointment.start_time <= end
            })
            .cloned()
            .collect();
        appointments.sort_by_key(|appointment| appointment.start_time);
        Ok(appointments)
    }
}
