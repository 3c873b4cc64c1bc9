//! Address and municipality lookups
//!
//! Both lookups settle to a value or `None`, never an error. A missing
//! result only leaves the corresponding form fields blank.

pub mod kartverket;

use funnskjema_common::{AddressLookupResult, MunicipalityLookupResult};
use std::future::Future;

pub use kartverket::KartverketClient;

pub trait LocationLookup: Send + Sync {
    /// Nearest address to a WGS84 point
    fn resolve_address(
        &self,
        lat: f64,
        lon: f64,
    ) -> impl Future<Output = Option<AddressLookupResult>> + Send;

    /// County and municipality containing a WGS84 point
    fn resolve_municipality(
        &self,
        lat: f64,
        lon: f64,
    ) -> impl Future<Output = Option<MunicipalityLookupResult>> + Send;
}

/// Lookup that never finds anything, for `--offline` runs
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineLookup;

impl LocationLookup for OfflineLookup {
    async fn resolve_address(&self, _lat: f64, _lon: f64) -> Option<AddressLookupResult> {
        None
    }

    async fn resolve_municipality(&self, _lat: f64, _lon: f64) -> Option<MunicipalityLookupResult> {
        None
    }
}
