use crate::dao::ClassDao;
use crate::domain::models::{Class, ScoreSummary, Teacher};
use crate::error::Result;

#[derive(Clone)]
pub struct ClassRepository {
    class_dao: ClassDao,
}

impl ClassRepository {
    pub fn new(class_dao: ClassDao) -> Self {
        Self { class_dao }
    }

    pub async fn get_all_classes(&self) -> Result<Vec<Class>> {
        self.class_dao.get_all_classes().await
    }

    pub async fn get_class(&self, class_id: i64) -> Result<Option<Class>> {
        self.class_dao.get_class(class_id).await
    }

    pub async fn get_class_teacher(&self, class_id: i64) -> Result<Option<Teacher>> {
        self.class_dao.get_class_teacher(class_id).await
    }

    pub async fn get_class_score(&self, class_id: i64) -> Result<ScoreSummary> {
        self.class_dao.get_class_score(class_id).await
    }
}
