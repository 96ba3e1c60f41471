pub mod schedule;
pub mod section;

pub use schedule::{Location, RawSchedule, Schedule, ScheduleBlock};
pub use section::{Course, Requirement, Requisites, Restriction, Section, Teacher, Vacancy};
