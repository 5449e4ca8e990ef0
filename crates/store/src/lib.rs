//! Local bookkeeping: brands, products, customer profiles and the campaign,
//! ad set and ad records written after each successful remote create.
//!
//! Data lives in DashMap; `HttpRecordSink` forwards records to a running service.

pub mod models;
pub mod remote;
pub mod store;

pub use remote::HttpRecordSink;
pub use store::RecordStore;
