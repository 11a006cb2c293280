//! UI Components
//!
//! Reusable Leptos components.

mod auth_view;
mod delete_confirm_button;
mod status_banner;
mod theme_toggle;
mod todo_input;
mod todo_item;
mod todo_view;

pub use auth_view::AuthView;
pub use delete_confirm_button::DeleteConfirmButton;
pub use status_banner::StatusBanner;
pub use theme_toggle::ThemeToggle;
pub use todo_input::TodoInput;
pub use todo_item::TodoItem;
pub use todo_view::{TaskActions, TodoView};
