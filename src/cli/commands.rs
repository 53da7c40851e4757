//! CLI command implementations.

use std::fmt::Write as _;
use std::path::Path;

use chrono::{Datelike, NaiveDate};

use crate::types::{Key, XfError, XfResult, DATE_FORMAT};
use crate::view::{
    Dashboard, DashboardConfig, DashboardSnapshot, GeoBounds, Gesture, SortOrder, View, ViewBody,
};

/// Gestures requested on the command line.
#[derive(Debug, Clone, Default)]
pub struct FilterArgs {
    /// Category slices to select.
    pub categories: Vec<String>,
    /// Environment bars to select.
    pub environments: Vec<String>,
    /// First month of the brush (inclusive).
    pub from: Option<NaiveDate>,
    /// Last month of the brush (inclusive).
    pub to: Option<NaiveDate>,
    /// Map area.
    pub area: Option<GeoBounds>,
    /// Zero-based table page.
    pub page: usize,
}

/// Parse `YYYY-MM` into the first day of that month.
pub fn parse_month(value: &str) -> XfResult<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", value.trim()), DATE_FORMAT)
        .map_err(|e| XfError::InvalidFilter(format!("bad month '{}': {}", value, e)))
}

/// First day of the month after `month`.
pub fn next_month(month: NaiveDate) -> NaiveDate {
    let (year, m) = if month.month() == 12 {
        (month.year() + 1, 1)
    } else {
        (month.year(), month.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, m, 1).unwrap_or(month)
}

/// Parse `south,west,north,east`.
pub fn parse_bounds(value: &str) -> XfResult<GeoBounds> {
    let parts: Vec<f64> = value
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|e| XfError::InvalidFilter(format!("bad bounds '{}': {}", value, e)))?;
    match parts.as_slice() {
        [south, west, north, east] => Ok(GeoBounds {
            south: *south,
            west: *west,
            north: *north,
            east: *east,
        }),
        _ => Err(XfError::InvalidFilter(format!(
            "bounds need 4 values, got {}",
            parts.len()
        ))),
    }
}

/// Apply the requested gestures and return the final snapshot.
pub fn apply_filters(dashboard: &mut Dashboard, args: &FilterArgs) -> XfResult<DashboardSnapshot> {
    for category in &args.categories {
        dashboard.apply(View::Category, Gesture::ToggleKey(Key::from(category.as_str())))?;
    }
    for environment in &args.environments {
        dashboard.apply(
            View::Environment,
            Gesture::ToggleKey(Key::from(environment.as_str())),
        )?;
    }
    if args.from.is_some() || args.to.is_some() {
        let from = args.from.unwrap_or(NaiveDate::MIN);
        let to = args.to.map(next_month).unwrap_or(NaiveDate::MAX);
        dashboard.apply(
            View::Monthly,
            Gesture::Brush {
                from: Key::Date(from),
                to: Key::Date(to),
            },
        )?;
    }
    if let Some(bounds) = args.area {
        dashboard.apply(View::Map, Gesture::Area(bounds))?;
    }
    if args.page > 0 {
        dashboard.apply(View::Table, Gesture::Page(args.page))?;
    }
    dashboard.snapshot()
}

/// Print every view with no filters applied.
pub fn cmd_summary(path: &Path, config: DashboardConfig, json: bool) -> XfResult<()> {
    let dashboard = Dashboard::from_path(path, config)?;
    print_snapshot(&dashboard.snapshot()?, json)
}

/// Apply filters from the command line and print every view.
pub fn cmd_filter(
    path: &Path,
    config: DashboardConfig,
    args: &FilterArgs,
    json: bool,
) -> XfResult<()> {
    let mut dashboard = Dashboard::from_path(path, config)?;
    let snapshot = apply_filters(&mut dashboard, args)?;
    print_snapshot(&snapshot, json)
}

fn print_snapshot(snapshot: &DashboardSnapshot, json: bool) -> XfResult<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(snapshot)?);
    } else {
        print!("{}", render_text(snapshot));
    }
    Ok(())
}

/// Plain-text rendering of a snapshot.
pub fn render_text(snapshot: &DashboardSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Selected: {} of {} records",
        snapshot.selected, snapshot.total
    );
    for view in &snapshot.views {
        let marker = if view.filtered { " (filtered)" } else { "" };
        let _ = writeln!(out, "\n[{}]{}", view.name, marker);
        match &view.body {
            ViewBody::Pie { slices: entries } | ViewBody::Rows { bars: entries } => {
                for s in entries {
                    let star = if s.selected { " *" } else { "" };
                    let _ = writeln!(out, "  {}: {}{}", s.key, s.value, star);
                }
            }
            ViewBody::Line {
                domain,
                points,
                brush,
            } => {
                if let Some((lo, hi)) = domain {
                    let _ = writeln!(out, "  domain: {} .. {}", lo, hi);
                }
                if let Some((from, to)) = brush {
                    let _ = writeln!(out, "  brush: [{}, {})", from, to);
                }
                for p in points {
                    let _ = writeln!(out, "  {}: {}", p.key, p.value);
                }
            }
            ViewBody::Table {
                columns,
                rows,
                sort_column,
                sort_order,
                page,
                page_count,
                total,
            } => {
                let order = match sort_order {
                    SortOrder::Ascending => "ascending",
                    SortOrder::Descending => "descending",
                };
                let _ = writeln!(
                    out,
                    "  page {}/{} of {} rows, sorted by {} {}",
                    page + 1,
                    page_count,
                    total,
                    sort_column,
                    order
                );
                let _ = writeln!(out, "  {}", columns.join(" | "));
                for row in rows {
                    let _ = writeln!(out, "  {}", row.join(" | "));
                }
            }
            ViewBody::Map { markers } => {
                let _ = writeln!(out, "  {} markers", markers.len());
                for m in markers {
                    let _ = writeln!(
                        out,
                        "  {}  count={}  env={}",
                        m.geo,
                        m.count,
                        m.environment.as_deref().unwrap_or("-")
                    );
                }
            }
            ViewBody::Failed { reason } => {
                let _ = writeln!(out, "  unavailable: {}", reason);
            }
        }
    }
    out
}
