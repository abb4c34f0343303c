//! Weather host integration: area hierarchy, overview forecast, client.

mod area;
mod client;
mod forecast;

pub use area::{Area, AreaNode};
pub use client::{BASE_URI, ForecastApi, JmaClient, JmaError};
pub use forecast::OverviewForecast;
