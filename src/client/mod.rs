//! Client side of the application: HTTP client, session shell, forms and
//! the map view model.

pub mod api;
pub mod forms;
pub mod map_view;
pub mod measure;
pub mod session;
