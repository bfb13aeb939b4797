//! Screen state.
//!
//! Each view model owns one [`StateHolder`] with an immutable snapshot of its
//! screen and is the only writer to it. Loads run as [`BackgroundTasks`]
//! whose handles can be awaited or cancelled.

mod catalog;
mod form;
mod login;
mod profile;
mod register;
mod reports;
mod review_screen;
mod single_subject;
mod state;
mod tasks;

pub use catalog::{CatalogState, CatalogViewModel, Loader, Searchable};
pub use login::{LoginState, LoginViewModel};
pub use profile::{ProfileState, ProfileViewModel};
pub use register::{RegisterState, RegisterViewModel};
pub use reports::{ReportsState, ReportsViewModel};
pub use review_screen::{
    ReviewScreenState, ReviewScreenViewModel, Reviewable, SingleClassViewModel,
    SingleTeacherViewModel,
};
pub use single_subject::{SingleSubjectState, SingleSubjectViewModel};
pub use state::StateHolder;
pub use tasks::{BackgroundTasks, TaskHandle, Ticket};
