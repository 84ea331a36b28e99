mod chart;
mod daily;
mod history;
pub mod mercenary;
mod price;

pub use chart::{ChartPeriod, ItemHistoryWithDaily, PriceChange, SeriesStats};
pub use daily::{DailyAggregate, DailyHistoryDocument, FoldReport};
pub use history::{DateRange, HistoryStats, ItemPrice, ItemSample, PriceHistoryDocument, PriceSnapshotEntry};
pub use mercenary::{CraftingCost, ItemRequirement, Mercenary, MercenaryClass, MercenaryListItem};
pub use price::{PriceInfo, PriceListing, PriceMap};
