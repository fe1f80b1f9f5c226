//! Straight-line distance between a user and the catalog's restaurants
//!
//! Addresses are geocoded through a [`Geocoder`] and compared with the
//! haversine formula. Successful geocodes are remembered for the life of the
//! process; failed ones are retried on the next request.

use futures_util::future::join_all;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::catalog::Restaurant;
use crate::vendors::{Coordinates, Geocoder};

/// Address used when the caller does not supply one
pub const DEFAULT_USER_ADDRESS: &str = "5000 MacArthur Blvd, Oakland, CA";

/// Mean Earth radius in miles
const EARTH_RADIUS_MILES: f64 = 3959.0;

/// Great-circle distance in miles
pub fn haversine_miles(a: Coordinates, b: Coordinates) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_MILES * c
}

fn round_tenth(miles: f64) -> f64 {
    (miles * 10.0).round() / 10.0
}

pub struct DistanceCalculator {
    geocoder: Option<Arc<dyn Geocoder>>,
    cache: RwLock<HashMap<String, Coordinates>>,
}

impl DistanceCalculator {
    pub fn new(geocoder: Option<Arc<dyn Geocoder>>) -> Self {
        Self {
            geocoder,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.geocoder.is_some()
    }

    pub async fn cached_addresses(&self) -> usize {
        self.cache.read().await.len()
    }

    async fn geocode(&self, address: &str) -> Option<Coordinates> {
        if let Some(coords) = self.cache.read().await.get(address) {
            return Some(*coords);
        }

        let geocoder = self.geocoder.as_ref()?;
        match geocoder.geocode(address).await {
            Ok(Some(coords)) => {
                self.cache.write().await.insert(address.to_string(), coords);
                Some(coords)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::error!(address = %address, error = %e, "Geocoding failed");
                None
            }
        }
    }

    /// Miles between two addresses, rounded to one decimal
    pub async fn distance(&self, restaurant_address: &str, user_address: &str) -> Option<f64> {
        let (user, restaurant) = tokio::join!(self.geocode(user_address), self.geocode(restaurant_address));

        match (user, restaurant) {
            (Some(user), Some(restaurant)) => Some(round_tenth(haversine_miles(user, restaurant))),
            _ => {
                tracing::debug!(
                    restaurant_address = %restaurant_address,
                    "Could not geocode one or both addresses"
                );
                None
            }
        }
    }

    /// Distance from `user_address` to every restaurant, keyed by id
    pub async fn distances(
        &self,
        restaurants: &[Restaurant],
        user_address: &str,
    ) -> BTreeMap<String, Option<f64>> {
        // Warm the cache so concurrent lookups share the user's coordinates
        self.geocode(user_address).await;

        let lookups = restaurants.iter().map(|r| async move {
            let distance = if r.address.trim().is_empty() {
                None
            } else {
                self.distance(&r.address, user_address).await
            };
            (r.id.clone(), distance)
        });

        join_all(lookups).await.into_iter().collect()
    }
}
