//! Work package → canonical task mapping.
//!
//! Defaults here are load-bearing: change detection compares the mapped
//! values verbatim, so `"Unassigned"` and `""` are different assignees.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use opsync_core::task::{
    DEFAULT_ASSIGNEE, DEFAULT_PRIORITY, DEFAULT_PROJECT, DEFAULT_STATUS, DEFAULT_TITLE,
};
use opsync_core::{CanonicalTask, ExternalId, LinkType, RelatedLink};

use crate::error::MappingError;
use crate::wire::{Link, WorkPackage, WorkPackageLinks};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Map one raw work package into its canonical form.
pub fn map_work_package(wp: &WorkPackage) -> Result<CanonicalTask, MappingError> {
    let links = &wp.links;
    let external_id = wp.id.to_string();
    let related = extract_related(links, &external_id)?;

    Ok(CanonicalTask {
        title: text_or(wp.subject.as_deref(), DEFAULT_TITLE),
        description: wp
            .description
            .as_ref()
            .and_then(|d| d.raw.clone())
            .unwrap_or_default(),
        project: link_title_or(links.project.as_ref(), DEFAULT_PROJECT),
        project_id: links
            .project
            .as_ref()
            .and_then(|l| l.href.as_deref())
            .map(trailing_segment)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        status: link_title_or(links.status.as_ref(), DEFAULT_STATUS),
        assignee: link_title_or(links.assignee.as_ref(), DEFAULT_ASSIGNEE),
        responsible: link_title(links.responsible.as_ref()).map(str::to_string),
        priority: link_title_or(links.priority.as_ref(), DEFAULT_PRIORITY),
        estimated_hours: parse_hours(wp.estimated_time.as_deref()),
        spent_hours: parse_hours(wp.spent_time.as_deref()),
        related_to: if related.is_empty() { None } else { Some(related) },
        op_created_at: normalize_timestamp("createdAt", wp.created_at.as_deref())?,
        op_updated_at: normalize_timestamp("updatedAt", wp.updated_at.as_deref())?,
        external_id: ExternalId::new(external_id),
    })
}

fn text_or(value: Option<&str>, default: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => default.to_string(),
    }
}

fn link_title(link: Option<&Link>) -> Option<&str> {
    link.and_then(|l| l.title.as_deref()).filter(|t| !t.is_empty())
}

fn link_title_or(link: Option<&Link>, default: &str) -> String {
    link_title(link).unwrap_or(default).to_string()
}

/// Last `/`-separated segment of an href.
fn trailing_segment(href: &str) -> &str {
    href.rsplit('/').next().unwrap_or_default()
}

fn extract_related(
    links: &WorkPackageLinks,
    work_package: &str,
) -> Result<Vec<RelatedLink>, MappingError> {
    let mut related = Vec::new();

    if let Some(parent) = &links.parent {
        if let Some(href) = parent.href.as_deref().filter(|h| !h.is_empty()) {
            related.push(RelatedLink::new(
                LinkType::Parent,
                trailing_segment(href),
                text_or(parent.title.as_deref(), LinkType::Parent.default_title()),
            ));
        }
    }

    let lists = [
        (LinkType::Child, &links.children),
        (LinkType::Related, &links.related_to),
        (LinkType::Blocks, &links.blocks),
        (LinkType::BlockedBy, &links.blocked_by),
    ];
    for (link_type, list) in lists {
        for link in list.iter().flatten() {
            let href = link.href.as_deref().ok_or_else(|| MappingError::MissingHref {
                link_type: link_type.as_str(),
                work_package: work_package.to_string(),
            })?;
            related.push(RelatedLink::new(
                link_type,
                trailing_segment(href),
                text_or(link.title.as_deref(), link_type.default_title()),
            ));
        }
    }

    Ok(related)
}

/// Parse an hours token such as `PT8H` or `PT1.5H`.
///
/// The first `PT` and the first `H` are removed and the longest numeric
/// prefix of the remainder is read, so `PT2H30M` yields `230.0`.
pub fn parse_hours(raw: Option<&str>) -> Option<f64> {
    let raw = raw.filter(|r| !r.is_empty())?;
    let stripped = raw.replacen("PT", "", 1).replacen('H', "", 1);
    numeric_prefix(stripped.trim_start())
}

fn numeric_prefix(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }
    s[..end].parse().ok()
}

/// Normalize an ISO-8601 timestamp to `YYYY-MM-DD HH:MM:SS` in UTC.
///
/// Values without an offset are taken as UTC.
pub fn normalize_timestamp(
    field: &'static str,
    raw: Option<&str>,
) -> Result<Option<String>, MappingError> {
    let Some(raw) = raw.filter(|r| !r.is_empty()) else {
        return Ok(None);
    };

    let parsed = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|n| n.and_utc())
        })
        .or_else(|_| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map(|d| d.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc())
        })
        .map_err(|_| MappingError::InvalidTimestamp {
            field,
            value: raw.to_string(),
        })?;

    Ok(Some(parsed.format(TIMESTAMP_FORMAT).to_string()))
}
