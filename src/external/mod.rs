pub mod market_scraper;
pub mod price_source;
