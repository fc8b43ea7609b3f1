use crate::sdk::carpark::{Carpark, CarparkType, SearchParams, DEFAULT_DURATION_HOURS};
use crate::sdk::search::error::SearchError;
use crate::sdk::search::ranking::{rank_carparks, total_cost};
use crate::sdk::search::service::CarparkSource;
use async_trait::async_trait;
use chrono::Utc;
use std::time::Duration;

/// Latency the mock adds to look like a real backend.
pub const MOCK_DELAY: Duration = Duration::from_millis(400);

struct MockRecord {
    id: &'static str,
    name: &'static str,
    kind: CarparkType,
    address: &'static str,
    latitude: f64,
    longitude: f64,
    distance_m: f64,
    walk_time_min: u32,
    rate_per_hour: f64,
    available_lots: u32,
    total_lots: u32,
}

// Orchard Road area, priced for a three hour stay by default.
const MOCK_RECORDS: [MockRecord; 5] = [
    MockRecord {
        id: "HDB-OR1",
        name: "Orchard Central",
        kind: CarparkType::Hdb,
        address: "181 Orchard Rd, Singapore 238896",
        latitude: 1.3006,
        longitude: 103.8393,
        distance_m: 250.0,
        walk_time_min: 3,
        rate_per_hour: 1.20,
        available_lots: 45,
        total_lots: 200,
    },
    MockRecord {
        id: "URA-OR2",
        name: "Dhoby Ghaut MRT",
        kind: CarparkType::Ura,
        address: "11 Penang Rd, Singapore 238485",
        latitude: 1.2988,
        longitude: 103.8456,
        distance_m: 480.0,
        walk_time_min: 6,
        rate_per_hour: 1.50,
        available_lots: 120,
        total_lots: 350,
    },
    MockRecord {
        id: "LTA-OR3",
        name: "Plaza Singapura",
        kind: CarparkType::Lta,
        address: "68 Orchard Rd, Singapore 238839",
        latitude: 1.3008,
        longitude: 103.8451,
        distance_m: 550.0,
        walk_time_min: 7,
        rate_per_hour: 1.70,
        available_lots: 85,
        total_lots: 500,
    },
    MockRecord {
        id: "PVT-OR4",
        name: "The Centrepoint",
        kind: CarparkType::Private,
        address: "176 Orchard Rd, Singapore 238843",
        latitude: 1.3016,
        longitude: 103.8398,
        distance_m: 320.0,
        walk_time_min: 4,
        rate_per_hour: 2.00,
        available_lots: 12,
        total_lots: 180,
    },
    MockRecord {
        id: "HDB-OR5",
        name: "Cuppage Terrace",
        kind: CarparkType::Hdb,
        address: "55 Cuppage Rd, Singapore 229469",
        latitude: 1.3021,
        longitude: 103.8370,
        distance_m: 780.0,
        walk_time_min: 10,
        rate_per_hour: 0.80,
        available_lots: 0,
        total_lots: 90,
    },
];

/// The fixed development data set, stamped with the current time and
/// priced for three hours.
pub fn mock_carparks() -> Vec<Carpark> {
    let now = Utc::now();
    MOCK_RECORDS
        .iter()
        .map(|r| Carpark {
            id: r.id.to_string(),
            name: r.name.to_string(),
            kind: r.kind,
            address: r.address.to_string(),
            latitude: r.latitude,
            longitude: r.longitude,
            distance_m: r.distance_m,
            walk_time_min: r.walk_time_min,
            total_cost: total_cost(r.rate_per_hour, DEFAULT_DURATION_HOURS),
            rate_per_hour: r.rate_per_hour,
            available_lots: r.available_lots,
            total_lots: r.total_lots,
            updated_at: now,
        })
        .collect()
}

/// Serves [`mock_carparks`] ranked for each request. Ignores the query point.
#[derive(Clone, Debug)]
pub struct MockCarparkSource {
    delay: Duration,
}

impl MockCarparkSource {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn without_delay() -> Self {
        Self::new(Duration::ZERO)
    }
}

impl Default for MockCarparkSource {
    fn default() -> Self {
        Self::new(MOCK_DELAY)
    }
}

#[async_trait]
impl CarparkSource for MockCarparkSource {
    async fn search(&self, params: &SearchParams) -> Result<Vec<Carpark>, SearchError> {
        log::debug!("[PROVIDER] Serving mock carparks for {}", params.cache_key());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(rank_carparks(mock_carparks(), params.duration, params.radius))
    }
}
