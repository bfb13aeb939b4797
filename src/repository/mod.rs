//! Repositories, one per entity.
//!
//! Mostly straight delegation to the DAOs. The user repository classifies
//! uniqueness conflicts and credentials; the review repository enforces the
//! one-review-per-user rule.

mod class_repository;
mod report_repository;
mod review_repository;
mod subject_repository;
mod teacher_repository;
mod user_repository;

pub use class_repository::ClassRepository;
pub use report_repository::ReportRepository;
pub use review_repository::{ReviewInsertionResult, ReviewRepository};
pub use subject_repository::SubjectRepository;
pub use teacher_repository::TeacherRepository;
pub use user_repository::{LoginResult, SaveUserResult, UserRepository};
