mod models;
mod ticker;
mod timestamp;

pub use models::{NewsItem, PriceBar};
pub use ticker::Ticker;
pub use timestamp::EventTime;
