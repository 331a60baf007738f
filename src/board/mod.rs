//! The pure board engine: projection, transitions, reorders and drop
//! interpretation. Nothing in here performs I/O.

pub mod drag;
pub mod projector;
pub mod reorder;
pub mod transition;

pub use drag::{interpret, Container, DragCommand, DropEvent, DropLocation};
pub use projector::{project, Board};
pub use reorder::{reorder, DocumentMove};
pub use transition::{transition, TaskMove};
