//! The incident dashboard: the reference wiring of dimensions, groups and views.

use std::io::Read;
use std::path::Path;

use log::{debug, warn};
use serde::Serialize;

use super::{
    CategoryChart, DataTable, Gesture, LineChart, MarkerMap, MarkerReducer, SortOrder,
    TableColumn, ViewAdapter, ViewBody, ViewSnapshot,
};
use crate::engine::{Count, CrossFilter, DimensionId, GroupHandle, GroupOptions};
use crate::ingest;
use crate::types::{Incident, Key, XfError, XfResult, DEFAULT_PAGE_SIZE};

/// Called with the full snapshot after every redraw.
pub type RedrawHook = Box<dyn FnMut(&DashboardSnapshot)>;

/// Runtime settings of the dashboard.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Rows per table page.
    pub page_size: usize,
    /// Keep zero-count entries in the pie, row and line charts.
    pub keep_empty_groups: bool,
    /// Initial table sort column label.
    pub sort_column: String,
    /// Initial table sort order.
    pub sort_order: SortOrder,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            keep_empty_groups: true,
            sort_column: "Date".to_string(),
            sort_order: SortOrder::Ascending,
        }
    }
}

/// The views of the dashboard, in render order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Category = 0,
    Environment = 1,
    Monthly = 2,
    Table = 3,
    Map = 4,
}

impl View {
    /// Every view in render order.
    pub const ALL: [View; 5] = [
        View::Category,
        View::Environment,
        View::Monthly,
        View::Table,
        View::Map,
    ];

    /// Return the view's name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Environment => "environment",
            Self::Monthly => "monthly",
            Self::Table => "table",
            Self::Map => "map",
        }
    }

    /// Parse a view from its name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "category" => Some(Self::Category),
            "environment" => Some(Self::Environment),
            "monthly" => Some(Self::Monthly),
            "table" => Some(Self::Table),
            "map" => Some(Self::Map),
            _ => None,
        }
    }
}

/// Everything the host draws after one redraw.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    /// Records passing every filter.
    pub selected: u64,
    /// Records loaded.
    pub total: usize,
    pub views: Vec<ViewSnapshot>,
}

impl DashboardSnapshot {
    /// The snapshot of one view.
    pub fn view(&self, view: View) -> Option<&ViewSnapshot> {
        self.views.iter().find(|v| v.name == view.name())
    }
}

/// Owns the coordinator and the five views; routes gestures and redraws.
pub struct Dashboard {
    xf: CrossFilter<Incident>,
    selected: GroupHandle<Count>,
    views: Vec<Box<dyn ViewAdapter<Incident>>>,
    on_redraw: Option<RedrawHook>,
}

impl Dashboard {
    /// Build the dashboard over `incidents`.
    pub fn new(incidents: Vec<Incident>, config: DashboardConfig) -> XfResult<Self> {
        let mut xf = CrossFilter::with_records(incidents)?;

        let month = xf.named_dimension("month", |i: &Incident| Key::Date(i.month()))?;
        let category =
            xf.named_dimension("category", |i: &Incident| Key::from(i.category.as_str()))?;
        let environment = xf.named_dimension("environment", |i: &Incident| {
            Key::from(i.environment.as_str())
        })?;
        let geo = xf.named_dimension("geo", |i: &Incident| Key::Text(i.geo()))?;

        let options = GroupOptions {
            keep_empty_groups: config.keep_empty_groups,
        };
        let month_group = xf.group_with(month, Key::clone, Count, options)?;
        let category_group = xf.group_with(category, Key::clone, Count, options)?;
        let environment_group = xf.group_with(environment, Key::clone, Count, options)?;
        let geo_group = xf.group(geo, Key::clone, MarkerReducer)?;
        let selected = xf.group_all(Count);

        let mut table = DataTable::new(
            View::Table.name(),
            month,
            incident_columns(),
            config.page_size,
        );
        table.sort_by(&config.sort_column, config.sort_order)?;

        let views: Vec<Box<dyn ViewAdapter<Incident>>> = vec![
            Box::new(CategoryChart::pie(
                View::Category.name(),
                category,
                category_group,
            )),
            Box::new(CategoryChart::row(
                View::Environment.name(),
                environment,
                environment_group,
            )),
            Box::new(
                LineChart::new(View::Monthly.name(), month, month_group)
                    .with_extent(|i: &Incident| Key::Date(i.date)),
            ),
            Box::new(table),
            Box::new(MarkerMap::new(View::Map.name(), geo, geo_group)),
        ];

        Ok(Self {
            xf,
            selected,
            views,
            on_redraw: None,
        })
    }

    /// Build the dashboard from a CSV stream.
    pub fn from_reader<R: Read>(reader: R, config: DashboardConfig) -> XfResult<Self> {
        Self::new(ingest::load_incidents(reader)?, config)
    }

    /// Build the dashboard from a CSV file.
    pub fn from_path(path: &Path, config: DashboardConfig) -> XfResult<Self> {
        Self::new(ingest::load_incidents_from_path(path)?, config)
    }

    /// Register an extra view built over the dashboard's coordinator. It is
    /// rendered after the five built-in views and reset with them.
    pub fn add_view<F>(&mut self, build: F) -> XfResult<()>
    where
        F: FnOnce(&mut CrossFilter<Incident>) -> XfResult<Box<dyn ViewAdapter<Incident>>>,
    {
        let view = build(&mut self.xf)?;
        debug!("Added view {}", view.name());
        self.views.push(view);
        Ok(())
    }

    /// Install the hook called after every redraw.
    pub fn set_redraw_hook(&mut self, hook: RedrawHook) {
        self.on_redraw = Some(hook);
    }

    /// Replace the data. Filters stay in place; every view redraws.
    pub fn load(&mut self, incidents: Vec<Incident>) -> XfResult<DashboardSnapshot> {
        self.xf.load(incidents)?;
        self.redraw_all()
    }

    /// The underlying coordinator.
    pub fn crossfilter(&self) -> &CrossFilter<Incident> {
        &self.xf
    }

    /// The dimension behind a view.
    pub fn dimension(&self, view: View) -> DimensionId {
        self.views[view as usize].dimension()
    }

    /// Route a gesture to one view, then redraw every view.
    ///
    /// A rejected gesture leaves all filters as they were.
    pub fn apply(&mut self, view: View, gesture: Gesture) -> XfResult<DashboardSnapshot> {
        let adapter = &mut self.views[view as usize];
        if !adapter.apply(&gesture, &mut self.xf)? {
            return Err(XfError::InvalidFilter(format!(
                "view '{}' does not accept {:?}",
                view.name(),
                gesture
            )));
        }
        debug!("Applied {:?} to {}", gesture, view.name());
        self.redraw_all()
    }

    /// Clear one view's filter, then redraw.
    pub fn reset(&mut self, view: View) -> XfResult<DashboardSnapshot> {
        self.views[view as usize].reset(&mut self.xf)?;
        self.redraw_all()
    }

    /// Clear every view's filter, then redraw.
    pub fn reset_all(&mut self) -> XfResult<DashboardSnapshot> {
        for adapter in &mut self.views {
            adapter.reset(&mut self.xf)?;
        }
        self.redraw_all()
    }

    /// Whether a view currently filters the data.
    pub fn has_filter(&self, view: View) -> bool {
        self.views[view as usize].has_filter(&self.xf)
    }

    /// Render every view without calling the redraw hook.
    ///
    /// A view whose group failed renders as [`ViewBody::Failed`]; the others
    /// are unaffected.
    pub fn snapshot(&self) -> XfResult<DashboardSnapshot> {
        let mut views = Vec::with_capacity(self.views.len());
        for adapter in &self.views {
            let snapshot = match adapter.render(&self.xf) {
                Ok(snapshot) => snapshot,
                Err(XfError::Reducer { reason, .. }) => ViewSnapshot {
                    name: adapter.name().to_string(),
                    filtered: adapter.has_filter(&self.xf),
                    body: ViewBody::Failed { reason },
                },
                Err(e) => return Err(e),
            };
            views.push(snapshot);
        }
        Ok(DashboardSnapshot {
            selected: selected_or_mask_count(self.xf.value(self.selected), &self.xf)?,
            total: self.xf.size(),
            views,
        })
    }

    /// Render every view and hand the result to the redraw hook.
    pub fn redraw_all(&mut self) -> XfResult<DashboardSnapshot> {
        let snapshot = self.snapshot()?;
        if let Some(hook) = self.on_redraw.as_mut() {
            hook(&snapshot);
        }
        Ok(snapshot)
    }
}

/// The selected-record count. A failed count group falls back to the
/// coordinator's filter masks, which hold the same number.
fn selected_or_mask_count(count: XfResult<u64>, xf: &CrossFilter<Incident>) -> XfResult<u64> {
    match count {
        Err(XfError::Reducer { reason, .. }) => {
            warn!("Selected count unavailable ({}); using filter masks", reason);
            Ok(xf.selected_count() as u64)
        }
        other => other,
    }
}

fn incident_columns() -> Vec<TableColumn<Incident>> {
    vec![
        TableColumn::new("SourceAgency", |i: &Incident| {
            Key::from(i.source_agency.as_str())
        }),
        TableColumn::new("Date", |i: &Incident| Key::Date(i.date)),
        TableColumn::new("Category", |i: &Incident| Key::from(i.category.as_str())),
        TableColumn::new("Environment", |i: &Incident| {
            Key::from(i.environment.as_str())
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IncidentBuilder;

    #[test]
    fn failed_count_falls_back_to_masks() {
        let mut xf = CrossFilter::with_records(vec![
            IncidentBuilder::new("Air", "Air").build(),
            IncidentBuilder::new("Land", "Land").build(),
        ])
        .unwrap();
        let category = xf
            .dimension(|i: &Incident| Key::from(i.category.as_str()))
            .unwrap();
        xf.filter(category, crate::index::Filter::exact("Land"))
            .unwrap();

        let failed = Err(XfError::Reducer {
            group: 0,
            reason: "broken".to_string(),
        });
        assert_eq!(selected_or_mask_count(failed, &xf).unwrap(), 1);
        assert_eq!(selected_or_mask_count(Ok(9), &xf).unwrap(), 9);
        assert!(matches!(
            selected_or_mask_count(Err(XfError::GroupNotFound(0)), &xf),
            Err(XfError::GroupNotFound(0))
        ));
    }
}
