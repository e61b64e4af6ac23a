pub mod envelope;
pub mod event;
pub mod viewer;

pub use envelope::*;
pub use event::*;
pub use viewer::*;
