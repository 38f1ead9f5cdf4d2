//! Refresh orchestration for the place-data cache.
//!
//! Ties the other crates together: selects due records from the database,
//! calls the upstream place provider for each one, parses the returned hours
//! text into a canonical schedule, and writes the outcome back with the
//! appropriate next-refresh time. All provider traffic in the system flows
//! through [`run_batch`]; the read path ([`cached_place`], [`place_status`])
//! only ever touches the database.
//!
//! The scheduler is written against the [`PlaceStore`] and [`UpstreamSource`]
//! traits so its sequencing, quota accounting, and failure classification can
//! be tested without Postgres or network.

pub mod read;
pub mod scheduler;
pub mod store;
pub mod upstream;

pub use read::{cached_place, place_status};
pub use scheduler::{run_batch, BatchConfig, BatchReport};
pub use store::{PgPlaceStore, PlaceStore};
pub use upstream::UpstreamSource;
