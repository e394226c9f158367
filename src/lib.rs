pub mod cache;
pub mod cli;
pub mod config;
pub mod extract;
pub mod fetch;
pub mod oauth;
pub mod resolver;
pub mod session;
pub mod site;

pub use cache::ResponseCache;
pub use fetch::{Fetcher, HttpFetcher};
pub use resolver::{CrawlError, Resolver};
pub use site::{NearbyRecord, SiteRecord};
