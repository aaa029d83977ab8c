#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Text parsing for Danish police daily reports ("døgnrapporter").
//!
//! Turns the plain-text body of a report into [`IncidentRecord`]s:
//!
//! 1. [`extract`] locates the break-in section and splits it into entries.
//! 2. [`location`] splits each entry's location into address and city.
//! 3. [`normalize`] and [`temporal`] turn the free-form date/time phrase
//!    into a calendar date and a time label.
//! 4. [`report`] infers the report's publication month from its URL, used
//!    to resolve dates written without a year.
//!
//! [`IncidentRecord`]: burglary_map_incident_models::IncidentRecord

pub mod extract;
pub mod location;
pub mod normalize;
pub mod report;
pub mod temporal;

pub use extract::{ReportExtraction, extract_report};
pub use location::parse_location;
pub use temporal::{TemporalMatch, parse_date_time};
