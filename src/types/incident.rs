//! The search-and-rescue incident record and its derived keys.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use super::DATE_FORMAT;

/// One search-and-rescue incident, the record type of the reference dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Incident {
    /// Agency that reported the incident.
    pub source_agency: String,
    /// Incident category (Air, Marine, Land, Undetermined, ...).
    pub category: String,
    /// Environment the incident occurred in.
    pub environment: String,
    /// Day of the incident.
    pub date: NaiveDate,
    /// Reporting year as given by the source row.
    pub year: i32,
    /// Confirmed latitude in decimal degrees.
    pub latitude: f64,
    /// Confirmed longitude in decimal degrees.
    pub longitude: f64,
}

impl Incident {
    /// First day of the incident's month.
    pub fn month(&self) -> NaiveDate {
        self.date.with_day(1).unwrap_or(self.date)
    }

    /// `"{lat},{lon}"` location key used by the map.
    pub fn geo(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }

    /// The date rendered as `YYYY-MM-DD`.
    pub fn date_label(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }
}

/// Builder for constructing Incident instances in tests and demos.
pub struct IncidentBuilder {
    source_agency: String,
    category: String,
    environment: String,
    date: NaiveDate,
    year: Option<i32>,
    latitude: f64,
    longitude: f64,
}

impl IncidentBuilder {
    /// Create a new builder with the required fields.
    pub fn new(category: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            source_agency: String::new(),
            category: category.into(),
            environment: environment.into(),
            date: NaiveDate::default(),
            year: None,
            latitude: 0.0,
            longitude: 0.0,
        }
    }

    /// Set the reporting agency.
    pub fn source_agency(mut self, agency: impl Into<String>) -> Self {
        self.source_agency = agency.into();
        self
    }

    /// Set the incident date. Invalid calendar dates leave the date unchanged.
    pub fn date(mut self, year: i32, month: u32, day: u32) -> Self {
        if let Some(d) = NaiveDate::from_ymd_opt(year, month, day) {
            self.date = d;
        }
        self
    }

    /// Override the reporting year (defaults to the date's year).
    pub fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    /// Set the confirmed location.
    pub fn location(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = latitude;
        self.longitude = longitude;
        self
    }

    /// Build the Incident.
    pub fn build(self) -> Incident {
        Incident {
            source_agency: self.source_agency,
            category: self.category,
            environment: self.environment,
            year: self.year.unwrap_or_else(|| self.date.year()),
            date: self.date,
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_keys() {
        let incident = IncidentBuilder::new("Marine", "Marine")
            .date(2019, 7, 23)
            .location(-40.77, 173.59)
            .build();
        assert_eq!(incident.month(), NaiveDate::from_ymd_opt(2019, 7, 1).unwrap());
        assert_eq!(incident.geo(), "-40.77,173.59");
        assert_eq!(incident.date_label(), "2019-07-23");
        assert_eq!(incident.year, 2019);
    }

    #[test]
    fn whole_degrees_print_without_fraction() {
        let incident = IncidentBuilder::new("Land", "Land")
            .location(-41.0, 174.5)
            .build();
        assert_eq!(incident.geo(), "-41,174.5");
    }
}
