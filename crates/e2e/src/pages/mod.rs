//! Page objects for the kanban application
//!
//! Each page object wraps one screen or screen region. Locators are built
//! once in `new` and stay private; tests only see intention-revealing
//! operations.

pub mod boards;
pub mod card_details;
pub mod kanban_board;
pub mod login;

pub use boards::Boards;
pub use card_details::CardDetails;
pub use kanban_board::KanbanBoard;
pub use login::Login;
