pub mod component;
pub mod project;
pub mod style_guide;
pub mod token;
pub mod user;

pub use component::Component;
pub use project::Project;
pub use style_guide::{StyleGuide, TeamMember};
pub use token::Token;
pub use user::User;
