pub mod cover_preview;
pub mod scrubber;
pub mod status_bar;

pub use cover_preview::CoverPreview;
pub use scrubber::Scrubber;
pub use status_bar::{StatusBar, StatusInfo, StatusLevel};
