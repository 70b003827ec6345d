//! Raw OpenProject v3 payload shapes.
//!
//! Every field the mapping reads is optional here; defaults are applied in
//! [`crate::mapping`].

use serde::Deserialize;
use std::fmt;

/// HAL collection envelope.
#[derive(Debug, Deserialize)]
pub struct Collection<T> {
    #[serde(rename = "_embedded")]
    pub embedded: Embedded<T>,
}

#[derive(Debug, Deserialize)]
pub struct Embedded<T> {
    pub elements: Vec<T>,
}

/// A work package as returned by `/work_packages`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkPackage {
    pub id: WorkPackageId,
    pub subject: Option<String>,
    pub description: Option<Formattable>,
    pub estimated_time: Option<String>,
    pub spent_time: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    #[serde(rename = "_links", default)]
    pub links: WorkPackageLinks,
}

/// Work package ids are numeric, but accept strings too.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum WorkPackageId {
    Number(u64),
    Text(String),
}

impl Default for WorkPackageId {
    fn default() -> Self {
        Self::Number(0)
    }
}

impl fmt::Display for WorkPackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Formattable text (`{format, raw, html}`).
#[derive(Debug, Default, Deserialize)]
pub struct Formattable {
    pub raw: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkPackageLinks {
    pub project: Option<Link>,
    pub status: Option<Link>,
    pub assignee: Option<Link>,
    pub responsible: Option<Link>,
    pub priority: Option<Link>,
    pub parent: Option<Link>,
    pub children: Option<Vec<Link>>,
    pub related_to: Option<Vec<Link>>,
    pub blocks: Option<Vec<Link>>,
    pub blocked_by: Option<Vec<Link>>,
}

/// HAL link.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct Link {
    pub href: Option<String>,
    pub title: Option<String>,
}

impl Link {
    pub fn titled(href: &str, title: &str) -> Self {
        Self {
            href: Some(href.to_string()),
            title: Some(title.to_string()),
        }
    }
}

/// `/users/me` payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

/// `/projects` element.
#[derive(Debug, Deserialize)]
pub struct Project {
    pub id: u64,
    pub name: Option<String>,
}
