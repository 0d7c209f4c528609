//! Terminal rendering: layout, theme and widgets

pub mod layout;
pub mod renderer;
pub mod theme;
pub mod widgets;
