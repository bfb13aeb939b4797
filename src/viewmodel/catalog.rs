use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::domain::models::{Class, Semester, Subject, Teacher};
use crate::error::Result;
use crate::repository::{ClassRepository, SubjectRepository, TeacherRepository};

use super::state::StateHolder;
use super::tasks::{BackgroundTasks, TaskHandle};

const ITEMS: &str = "catalog-items";

/// A catalogue entry that can be narrowed by a search box.
pub trait Searchable: Clone + Send + Sync + 'static {
    /// `query` is already lowercased and non-empty.
    fn matches(&self, query: &str) -> bool;

    fn semester(&self) -> Option<Semester> {
        None
    }
}

impl Searchable for Subject {
    fn matches(&self, query: &str) -> bool {
        self.code.to_lowercase().contains(query) || self.name.to_lowercase().contains(query)
    }

    fn semester(&self) -> Option<Semester> {
        Some(self.semester)
    }
}

impl Searchable for Class {
    fn matches(&self, query: &str) -> bool {
        self.subject_code.to_lowercase().contains(query)
            || self.subject_name.to_lowercase().contains(query)
            || self
                .teacher_name
                .as_deref()
                .is_some_and(|name| name.to_lowercase().contains(query))
    }

    fn semester(&self) -> Option<Semester> {
        Some(self.semester)
    }
}

impl Searchable for Teacher {
    fn matches(&self, query: &str) -> bool {
        self.name.to_lowercase().contains(query)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogState<T> {
    pub items: Vec<T>,
    pub search: String,
    pub semester: Option<Semester>,
    pub is_loading: bool,
}

impl<T> Default for CatalogState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            search: String::new(),
            semester: None,
            is_loading: true,
        }
    }
}

impl<T: Searchable> CatalogState<T> {
    /// Items passing the current search text and semester filter.
    pub fn visible(&self) -> Vec<&T> {
        let query = self.search.trim().to_lowercase();
        self.items
            .iter()
            .filter(|item| query.is_empty() || item.matches(&query))
            .filter(|item| self.semester.is_none() || item.semester() == self.semester)
            .collect()
    }
}

pub type Loader<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<Vec<T>>> + Send + Sync>;

/// List screen for subjects, classes or teachers.
pub struct CatalogViewModel<T> {
    state: StateHolder<CatalogState<T>>,
    tasks: BackgroundTasks,
    loader: Loader<T>,
}

impl<T: Searchable> CatalogViewModel<T> {
    pub fn new(loader: Loader<T>) -> Self {
        Self {
            state: StateHolder::new(CatalogState::default()),
            tasks: BackgroundTasks::new(),
            loader,
        }
    }

    pub fn state(&self) -> &StateHolder<CatalogState<T>> {
        &self.state
    }

    /// (Re)loads the whole list. A load still running is cancelled.
    pub fn load(&self) -> TaskHandle<usize> {
        let ticket = self.tasks.ticket(ITEMS);
        self.state.update(|s| CatalogState {
            is_loading: true,
            ..s.clone()
        });

        let state = self.state.clone();
        let items = (self.loader)();
        self.tasks.spawn(ticket, |ticket| async move {
            let items = match items.await {
                Ok(items) => items,
                Err(e) => {
                    state.update_if_current(&ticket, |s| CatalogState {
                        is_loading: false,
                        ..s.clone()
                    });
                    return Err(e);
                }
            };
            let count = items.len();
            state.update_if_current(&ticket, |s| CatalogState {
                items: items.clone(),
                is_loading: false,
                ..s.clone()
            });
            Ok(count)
        })
    }

    pub fn update_search(&self, search: &str) {
        self.state.update(|s| CatalogState {
            search: search.to_string(),
            ..s.clone()
        });
    }

    pub fn filter_semester(&self, semester: Option<Semester>) {
        self.state.update(|s| CatalogState {
            semester,
            ..s.clone()
        });
    }
}

impl CatalogViewModel<Subject> {
    pub fn subjects(repository: SubjectRepository) -> Self {
        Self::new(Arc::new(move || {
            let repository = repository.clone();
            async move { repository.get_all_subjects().await }.boxed()
        }))
    }
}

impl CatalogViewModel<Class> {
    pub fn classes(repository: ClassRepository) -> Self {
        Self::new(Arc::new(move || {
            let repository = repository.clone();
            async move { repository.get_all_classes().await }.boxed()
        }))
    }
}

impl CatalogViewModel<Teacher> {
    pub fn teachers(repository: TeacherRepository) -> Self {
        Self::new(Arc::new(move || {
            let repository = repository.clone();
            async move { repository.get_all_teachers().await }.boxed()
        }))
    }
}
