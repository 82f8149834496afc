// # zonesync-core
//
// Core library for reconciling desired DNS records against a provider.
//
// ## Architecture Overview
//
// - **DnsProvider**: Trait for the provider's record-set and zone-file API
// - **ZoneFile**: Lossless zone-file model with SOA serial management
// - **ChangeBuilder**: Diffs desired endpoints against existing record sets
// - **ChangeRunner**: Applies changes per record (discrete) or per zone (bulk)
// - **Reconciler**: Orchestrator-facing entry point tying the above together
// - **ProviderRegistry**: Plugin-based registry for DNS providers
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Diffing never calls the provider; appliers never diff
// 2. **Minimal Changes**: Only differing fields produce provider calls
// 3. **Plugin-Based**: Providers are registered dynamically, no hard-coded if-else
// 4. **Library-First**: All core functionality can be used as a library

pub mod apply;
pub mod changes;
pub mod config;
pub mod endpoint;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod metrics;
pub mod names;
pub mod planner;
pub mod registry;
pub mod soa;
pub mod traits;
pub mod zonefile;

// Re-export core types for convenience
pub use apply::{ApplyStrategy, BulkRunner, ChangeRunner, DiscreteRunner};
pub use changes::{Change, CreateChange, DeleteChange, UpdateChange};
pub use config::{EngineConfig, ProviderConfig, SyncConfig};
pub use endpoint::{Changes, Endpoint, ProviderSpecific};
pub use engine::Reconciler;
pub use error::{Error, Result};
pub use metrics::{MetricsSnapshot, SyncMetrics};
pub use planner::{ChangeBuilder, ChangeSet};
pub use registry::ProviderRegistry;
pub use soa::SerialNumber;
pub use traits::{ApiResponse, DnsProvider, DnsProviderFactory, RRSet, RRSetCreateOpts, Zone};
pub use zonefile::ZoneFile;
