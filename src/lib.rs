//! Client utilities for ERDDAP data servers.
//!
//! Fetch remote content, probe urls, list known servers from the community
//! registry, open downloaded datasets, and normalize dates and string values
//! for query constraints.

pub mod config;
pub mod constraints;
pub mod dataset;
pub mod dates;
pub mod error;
pub mod http;
pub mod reachability;
pub mod scratch;
pub mod servers;

pub use constraints::{clean_response, quote_string_constraints};
pub use dataset::load_dataset;
pub use dates::parse_dates;
pub use error::ErddapError;
pub use http::urlopen;
pub use reachability::check_url_response;
pub use servers::servers_list;
