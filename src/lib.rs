pub mod accumulator;
pub mod anchor;
pub mod common;
pub mod history;
pub mod logging;
pub mod market_data;
pub mod pipeline;
pub mod volume_profile;
