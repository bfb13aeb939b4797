use crate::dao::TeacherDao;
use crate::domain::models::{Class, ScoreSummary, Teacher};
use crate::error::Result;

#[derive(Clone)]
pub struct TeacherRepository {
    teacher_dao: TeacherDao,
}

impl TeacherRepository {
    pub fn new(teacher_dao: TeacherDao) -> Self {
        Self { teacher_dao }
    }

    pub async fn get_all_teachers(&self) -> Result<Vec<Teacher>> {
        self.teacher_dao.get_all_teachers().await
    }

    pub async fn get_teacher(&self, teacher_id: i64) -> Result<Option<Teacher>> {
        self.teacher_dao.get_teacher(teacher_id).await
    }

    pub async fn get_teacher_classes(&self, teacher_id: i64) -> Result<Vec<Class>> {
        self.teacher_dao.get_teacher_classes(teacher_id).await
    }

    pub async fn get_teacher_score(&self, teacher_id: i64) -> Result<ScoreSummary> {
        self.teacher_dao.get_teacher_score(teacher_id).await
    }
}
