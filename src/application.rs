//! Application context: every repository, built once from the pool and
//! handed to view models through their constructors.

use sqlx::SqlitePool;

use crate::dao::{ClassDao, ReportDao, ReviewDao, SubjectDao, TeacherDao, UserDao};
use crate::domain::models::{Class, Subject, Teacher, User};
use crate::error::Result;
use crate::repository::{
    ClassRepository, ReportRepository, ReviewRepository, SubjectRepository, TeacherRepository,
    UserRepository,
};
use crate::viewmodel::{
    CatalogViewModel, LoginViewModel, ProfileViewModel, RegisterViewModel, ReportsViewModel,
    SingleClassViewModel, SingleSubjectViewModel, SingleTeacherViewModel,
};

#[derive(Clone)]
pub struct AppContext {
    pool: SqlitePool,
    pub users: UserRepository,
    pub subjects: SubjectRepository,
    pub classes: ClassRepository,
    pub teachers: TeacherRepository,
    pub reviews: ReviewRepository,
    pub reports: ReportRepository,
}

impl AppContext {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            users: UserRepository::new(UserDao::new(pool.clone())),
            subjects: SubjectRepository::new(SubjectDao::new(pool.clone())),
            classes: ClassRepository::new(ClassDao::new(pool.clone())),
            teachers: TeacherRepository::new(TeacherDao::new(pool.clone())),
            reviews: ReviewRepository::new(ReviewDao::new(pool.clone())),
            reports: ReportRepository::new(ReportDao::new(pool.clone())),
            pool,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn register_screen(&self) -> RegisterViewModel {
        RegisterViewModel::new(self.users.clone())
    }

    pub fn login_screen(&self) -> LoginViewModel {
        LoginViewModel::new(self.users.clone())
    }

    /// Profile of `user`, with their reviews loading in the background.
    pub fn profile_screen(&self, user: User) -> ProfileViewModel {
        let vm = ProfileViewModel::new(user, self.users.clone(), self.reviews.clone());
        drop(vm.load_reviews());
        vm
    }

    pub fn subjects_screen(&self) -> CatalogViewModel<Subject> {
        let vm = CatalogViewModel::subjects(self.subjects.clone());
        drop(vm.load());
        vm
    }

    pub fn classes_screen(&self) -> CatalogViewModel<Class> {
        let vm = CatalogViewModel::classes(self.classes.clone());
        drop(vm.load());
        vm
    }

    pub fn teachers_screen(&self) -> CatalogViewModel<Teacher> {
        let vm = CatalogViewModel::teachers(self.teachers.clone());
        drop(vm.load());
        vm
    }

    pub fn subject_screen(&self, subject: Subject) -> SingleSubjectViewModel {
        let vm = SingleSubjectViewModel::new(subject, self.subjects.clone());
        drop(vm.load());
        vm
    }

    pub fn class_screen(&self, class: Class, viewer: Option<User>) -> SingleClassViewModel {
        let vm = SingleClassViewModel::new(class, viewer, self.reviews.clone(), self.reports.clone());
        drop(vm.load_reviews());
        vm
    }

    pub fn teacher_screen(&self, teacher: Teacher, viewer: Option<User>) -> SingleTeacherViewModel {
        let vm = SingleTeacherViewModel::new(teacher, viewer, self.reviews.clone(), self.reports.clone());
        drop(vm.load_reviews());
        vm
    }

    /// Fails with `NotAuthorized` unless `admin` is an administrator.
    pub fn reports_screen(&self, admin: &User) -> Result<ReportsViewModel> {
        let vm = ReportsViewModel::new(admin, self.reviews.clone(), self.reports.clone())?;
        drop(vm.load());
        Ok(vm)
    }
}
