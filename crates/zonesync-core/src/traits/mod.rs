//! Core traits for zonesync
//!
//! - [`DnsProvider`]: facade over a DNS provider's API
//! - [`DnsProviderFactory`]: builds providers from configuration

pub mod dns_provider;

pub use dns_provider::{
    ApiResponse, DnsProvider, DnsProviderFactory, Pagination, RRSet, RRSetCreateOpts, Zone,
};
