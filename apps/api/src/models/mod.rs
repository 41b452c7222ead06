pub mod resume;
pub mod sections;
pub mod theme;
