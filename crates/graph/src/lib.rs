//! Remote ads-platform client: the `AdPlatformClient` seam and its
//! Graph-API implementation.

pub mod client;
pub mod graph;
pub mod media;
pub mod memory;
pub mod payload;

pub use client::{
    AdPlatformClient, AdRequest, CreativeRequest, GeoLocation, LocationType, MediaHandle, ReadyStatus,
    RemoteAd, RemoteAdAccount, RemoteAdSet, RemoteCampaign, RemotePage, RemotePixel,
};
pub use graph::GraphApiClient;
pub use memory::{InMemoryPlatform, Operation};
