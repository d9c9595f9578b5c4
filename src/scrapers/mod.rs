pub mod extract;
pub mod immoscout;
pub mod normalize;
pub mod traits;
pub mod types;

pub use immoscout::Immoscout;
pub use traits::Crawler;
pub use types::ImmoscoutSettings;
