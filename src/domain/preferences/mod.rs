pub mod model;

pub use model::Preferences;
