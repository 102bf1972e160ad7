pub mod cache;
pub mod features;
pub mod geo;
pub mod incidents;
pub mod list_engine;
pub mod live;
pub mod viewport;
