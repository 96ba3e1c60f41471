use serde::Deserialize;
use uuid::Uuid;

use crate::models::{RawSchedule, Requisites, Section, Teacher, Vacancy};

/// One course section as the upstream source returns it. The schedule field
/// accepts any of the historical shapes; everything is normalized on the way
/// into the store.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSection {
    #[serde(rename = "NRC")]
    pub nrc: i32,
    pub initials: String,
    pub section: i32,
    pub name: String,
    #[serde(default)]
    pub school: Option<String>,
    pub year: i32,
    pub period: i32,
    #[serde(default)]
    pub credits: i32,
    #[serde(default)]
    pub information: Option<String>,
    #[serde(default)]
    pub droppable: bool,
    #[serde(default)]
    pub english: bool,
    #[serde(default)]
    pub special_approval: bool,
    #[serde(default)]
    pub teachers: Vec<Teacher>,
    #[serde(default)]
    pub vacancy: Vacancy,
    #[serde(default)]
    pub schedule: RawSchedule,
    #[serde(default)]
    pub requisites: Requisites,
}

impl RawSection {
    pub fn into_section(self, ingested_at: &str) -> Section {
        Section {
            id: Uuid::new_v4().to_string(),
            nrc: self.nrc,
            initials: self.initials,
            section: self.section,
            name: self.name,
            school: self.school,
            year: self.year,
            period: self.period,
            credits: self.credits,
            information: self.information,
            droppable: self.droppable,
            english: self.english,
            special_approval: self.special_approval,
            teachers: self.teachers,
            vacancy: self.vacancy,
            schedule: self.schedule.normalize(),
            requisites: self.requisites,
            ingested_at: ingested_at.to_string(),
        }
    }
}
