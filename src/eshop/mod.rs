//! eShop-specific modules for the HTTP client, fetching, normalization and data models.

pub mod client;
pub mod fetcher;
pub mod models;
pub mod normalize;
pub mod regions;

pub use client::{EshopApi, EshopClient, Endpoints};
pub use fetcher::{fetch, Fetcher};
pub use models::{EshopResults, Price, SwitchGame, NO_BOX_ART_URL};
pub use normalize::{percent_off, NormalizeError};
pub use regions::{Region, RegionClass};
