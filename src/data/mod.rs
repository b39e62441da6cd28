//! Data module - CSV loading, reshaping and snapshot merging

mod loader;
mod processor;
mod records;
mod region;
mod snapshot;
mod table;

pub use loader::{DataLoader, LoadError};
pub use processor::{ProcessorError, Reshaper};
pub use records::{
    CountryYearRecord, Exclusion, ExclusionReason, Indicator, SnapshotRecord, SnapshotSet,
    COUNTRY_COLUMN, YEAR_COLUMN,
};
pub use region::{region_code, resolve_regions, IsoRegionTable, RegionMap, RegionResolver};
pub use snapshot::SnapshotMerger;
pub use table::{IndicatorTable, SchemaError};
