pub mod components;
pub mod projects;
pub mod stats;
pub mod style_guides;
pub mod tokens;
pub mod users;
