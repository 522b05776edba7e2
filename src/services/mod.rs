pub mod providers;
pub mod ranker;
pub mod recommendations;
pub mod title_resolver;

pub use providers::{MetadataProvider, TmdbProvider};
pub use recommendations::Recommender;
pub use title_resolver::TitleResolver;
