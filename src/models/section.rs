use serde::{Deserialize, Serialize};

use crate::models::schedule::Schedule;

/// One stored row: a single section of a course in one academic period.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    #[serde(rename = "NRC")]
    pub nrc: i32,
    pub initials: String,
    pub section: i32,
    pub name: String,
    pub school: Option<String>,
    pub year: i32,
    pub period: i32,
    pub credits: i32,
    pub information: Option<String>,
    pub droppable: bool,
    pub english: bool,
    pub special_approval: bool,
    pub teachers: Vec<Teacher>,
    pub vacancy: Vacancy,
    pub schedule: Schedule,
    pub requisites: Requisites,
    pub ingested_at: String,
}

/// The deduplicated projection of all sections sharing
/// (initials, year, period): no NRC, section number, schedule, vacancy
/// or teachers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub initials: String,
    pub name: String,
    pub school: Option<String>,
    pub year: i32,
    pub period: i32,
    pub credits: i32,
    pub information: Option<String>,
    pub droppable: bool,
    pub english: bool,
    pub special_approval: bool,
    pub requisites: Requisites,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Teacher {
    pub name: String,
    #[serde(rename = "photoURL", default)]
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Vacancy {
    #[serde(default)]
    pub total: Option<i32>,
    #[serde(default)]
    pub available: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Requisites {
    #[serde(default)]
    pub relation: Option<String>,
    #[serde(default)]
    pub equivalences: Vec<String>,
    #[serde(default)]
    pub restrictions: Vec<Restriction>,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Restriction {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Requirement {
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub corequisites: Vec<String>,
}
