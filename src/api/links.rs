//! Navigation links for API responses. Entities coming out of the store are
//! wrapped in a new view value; the wrapped entity itself is never touched.

use axum::http::{HeaderMap, header::HOST};
use serde::Serialize;

use crate::models::{Course, Section};
use crate::services::requisites::{Resolved, ResolvedRequirement};

/// Scheme and host of the inbound request; link targets are built from it
/// rather than from configuration.
pub struct RequestContext {
    origin: String,
}

impl RequestContext {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let scheme = headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("http");
        let host = headers
            .get(HOST)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("localhost");
        Self {
            origin: format!("{scheme}://{host}"),
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn api_base(&self) -> String {
        format!("{}/api/v1", self.origin)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Href {
    pub href: String,
}

#[derive(Debug, Serialize)]
pub struct CourseLinks {
    #[serde(rename = "self")]
    pub self_: Href,
    pub sections: Href,
    pub requirements: Href,
    pub equivalences: Href,
}

#[derive(Debug, Serialize)]
pub struct SectionLinks {
    #[serde(rename = "self")]
    pub self_: Href,
    pub course: Href,
    pub requirements: Href,
    pub equivalences: Href,
}

#[derive(Debug, Serialize)]
pub struct Linked<T, L> {
    #[serde(flatten)]
    pub entity: T,
    pub links: L,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum LinkedResolved {
    Course(Linked<Course, CourseLinks>),
    Stub { initials: String },
}

#[derive(Debug, Serialize)]
pub struct LinkedRequirement {
    pub prerequisites: Vec<LinkedResolved>,
    pub corequisites: Vec<LinkedResolved>,
}

pub fn course(ctx: &RequestContext, course: Course) -> Linked<Course, CourseLinks> {
    let base = ctx.api_base();
    let links = CourseLinks {
        self_: href(format!(
            "{base}/courses/{}/{}/{}",
            course.initials, course.year, course.period
        )),
        sections: href(format!(
            "{base}/courses/{}/{}/{}/sections",
            course.initials, course.year, course.period
        )),
        requirements: href(format!(
            "{base}/courses/{}/requirements?year={}&period={}",
            course.initials, course.year, course.period
        )),
        equivalences: href(format!(
            "{base}/courses/{}/equivalences?year={}&period={}",
            course.initials, course.year, course.period
        )),
    };
    Linked { entity: course, links }
}

pub fn courses(ctx: &RequestContext, list: Vec<Course>) -> Vec<Linked<Course, CourseLinks>> {
    list.into_iter().map(|c| course(ctx, c)).collect()
}

pub fn section(ctx: &RequestContext, section: Section) -> Linked<Section, SectionLinks> {
    let base = ctx.api_base();
    let links = SectionLinks {
        self_: href(format!("{base}/courses/NRC/{}", section.nrc)),
        course: href(format!(
            "{base}/courses/{}/{}/{}",
            section.initials, section.year, section.period
        )),
        requirements: href(format!(
            "{base}/courses/{}/requirements?year={}&period={}",
            section.initials, section.year, section.period
        )),
        equivalences: href(format!(
            "{base}/courses/{}/equivalences?year={}&period={}",
            section.initials, section.year, section.period
        )),
    };
    Linked { entity: section, links }
}

pub fn sections(ctx: &RequestContext, list: Vec<Section>) -> Vec<Linked<Section, SectionLinks>> {
    list.into_iter().map(|s| section(ctx, s)).collect()
}

pub fn resolved(ctx: &RequestContext, list: Vec<Resolved>) -> Vec<LinkedResolved> {
    list.into_iter()
        .map(|entry| match entry {
            Resolved::Course(c) => LinkedResolved::Course(course(ctx, c)),
            Resolved::Stub { initials } => LinkedResolved::Stub { initials },
        })
        .collect()
}

pub fn requirements(
    ctx: &RequestContext,
    groups: Vec<ResolvedRequirement>,
) -> Vec<LinkedRequirement> {
    groups
        .into_iter()
        .map(|group| LinkedRequirement {
            prerequisites: resolved(ctx, group.prerequisites),
            corequisites: resolved(ctx, group.corequisites),
        })
        .collect()
}

fn href(target: String) -> Href {
    Href { href: target }
}
