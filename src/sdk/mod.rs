pub mod api;
pub mod carpark;
pub mod config;
pub mod geocode;
pub mod location;
pub mod navigation;
pub mod report;
pub mod search;
pub mod session;
pub mod util;
