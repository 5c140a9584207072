pub mod app;
pub mod events;
pub mod theme;
pub mod ui;
pub mod widgets;

pub use app::{InputMode, Screen, TuiApp};
pub use events::{EventHandler, TuiEvent};
pub use theme::Theme;
