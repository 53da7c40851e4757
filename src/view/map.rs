//! Marker map over the `"{lat},{lon}"` geo dimension.

use serde::Serialize;

use super::{Gesture, Marker, ViewAdapter, ViewBody, ViewSnapshot};
use crate::engine::{CrossFilter, DimensionId, GroupHandle, ReduceResult, Reducer};
use crate::index::Filter;
use crate::types::{Incident, Key, XfError, XfResult};

/// Marker accumulator: record count at one location plus the environment
/// of the most recently added record there.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MarkerValue {
    pub count: u64,
    pub environment: Option<String>,
}

/// Reducer behind [`MarkerValue`]. The environment label is dropped when the
/// count returns to zero, so an emptied marker equals `initial()` again.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkerReducer;

impl Reducer<Incident> for MarkerReducer {
    type Acc = MarkerValue;

    fn initial(&self) -> MarkerValue {
        MarkerValue::default()
    }

    fn add(&self, mut acc: MarkerValue, record: &Incident) -> ReduceResult<MarkerValue> {
        acc.count += 1;
        acc.environment = Some(record.environment.clone());
        Ok(acc)
    }

    fn remove(&self, mut acc: MarkerValue, _record: &Incident) -> ReduceResult<MarkerValue> {
        acc.count = acc
            .count
            .checked_sub(1)
            .ok_or_else(|| "marker count would drop below zero".to_string())?;
        if acc.count == 0 {
            acc.environment = None;
        }
        Ok(acc)
    }
}

/// A latitude/longitude box, inclusive on every edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl GeoBounds {
    /// Reject boxes with reversed or non-finite edges.
    pub fn validate(&self) -> XfResult<()> {
        let edges = [self.south, self.west, self.north, self.east];
        if edges.iter().any(|e| !e.is_finite()) {
            return Err(XfError::InvalidFilter("non-finite map bounds".to_string()));
        }
        if self.south > self.north || self.west > self.east {
            return Err(XfError::InvalidFilter(format!(
                "reversed map bounds {:?}",
                self
            )));
        }
        Ok(())
    }

    /// Whether a point lies inside the box.
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        (self.south..=self.north).contains(&latitude) && (self.west..=self.east).contains(&longitude)
    }
}

/// Split a geo key back into latitude and longitude.
pub fn parse_geo(geo: &str) -> Option<(f64, f64)> {
    let (lat, lon) = geo.split_once(',')?;
    Some((lat.trim().parse().ok()?, lon.trim().parse().ok()?))
}

/// Map of incident locations; an area gesture filters the geo dimension.
pub struct MarkerMap {
    name: String,
    dimension: DimensionId,
    group: GroupHandle<MarkerReducer>,
    area: Option<GeoBounds>,
}

impl MarkerMap {
    /// A map over a geo dimension and its marker group.
    pub fn new(name: &str, dimension: DimensionId, group: GroupHandle<MarkerReducer>) -> Self {
        Self {
            name: name.to_string(),
            dimension,
            group,
            area: None,
        }
    }

    /// The active area filter, if any.
    pub fn area(&self) -> Option<GeoBounds> {
        self.area
    }
}

impl ViewAdapter<Incident> for MarkerMap {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> DimensionId {
        self.dimension
    }

    fn render(&self, xf: &CrossFilter<Incident>) -> XfResult<ViewSnapshot> {
        let markers = xf
            .all(self.group)?
            .into_iter()
            .filter(|(_, value)| value.count > 0)
            .filter_map(|(key, value)| {
                let geo = key.as_text()?.to_string();
                let (latitude, longitude) = parse_geo(&geo)?;
                Some(Marker {
                    geo,
                    latitude,
                    longitude,
                    count: value.count,
                    environment: value.environment,
                })
            })
            .collect();
        Ok(ViewSnapshot {
            name: self.name.clone(),
            filtered: self.area.is_some(),
            body: ViewBody::Map { markers },
        })
    }

    fn apply(&mut self, gesture: &Gesture, xf: &mut CrossFilter<Incident>) -> XfResult<bool> {
        match gesture {
            Gesture::Area(bounds) => {
                bounds.validate()?;
                let b = *bounds;
                let filter = Filter::predicate(move |key: &Key| {
                    key.as_text()
                        .and_then(parse_geo)
                        .is_some_and(|(lat, lon)| b.contains(lat, lon))
                });
                xf.filter(self.dimension, filter)?;
                self.area = Some(b);
                Ok(true)
            }
            Gesture::ClearArea => {
                self.reset(xf)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn reset(&mut self, xf: &mut CrossFilter<Incident>) -> XfResult<()> {
        xf.filter_all(self.dimension)?;
        self.area = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IncidentBuilder;

    #[test]
    fn emptied_marker_returns_to_initial() {
        let r = MarkerReducer;
        let incident = IncidentBuilder::new("Marine", "Marine").build();
        let acc = r.add(r.initial(), &incident).unwrap();
        assert_eq!(acc.environment.as_deref(), Some("Marine"));
        assert_eq!(r.remove(acc, &incident).unwrap(), r.initial());
    }

    #[test]
    fn geo_round_trip() {
        assert_eq!(parse_geo("-40.77,173.59"), Some((-40.77, 173.59)));
        assert_eq!(parse_geo("nowhere"), None);
    }

    #[test]
    fn reversed_bounds_rejected() {
        let b = GeoBounds {
            south: -30.0,
            west: 170.0,
            north: -40.0,
            east: 175.0,
        };
        assert!(b.validate().is_err());
    }
}
