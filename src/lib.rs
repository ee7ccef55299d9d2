#![doc = "PaperMap public API"]
pub mod boundary;
pub mod compose;
pub mod config;
pub mod coord;
mod error;
pub mod geom;
pub mod maps;
mod pipeline;
pub mod render;
mod sites;
pub mod table;

#[doc(inline)]
pub use error::{PipelineError, Warning};

#[doc(inline)]
pub use config::MapConfig;

#[doc(inline)]
pub use pipeline::{Overviews, Pipeline, PipelineOutput};

#[doc(inline)]
pub use sites::{sites_from_table, SiteRecord};

#[doc(inline)]
pub use table::{read_table, read_table_from_bytes, resolve_columns, ResolvedColumns, Table, KEYWORDS_V1};
