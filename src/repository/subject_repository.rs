use crate::dao::SubjectDao;
use crate::domain::models::{Class, ScoreSummary, Subject};
use crate::error::Result;

#[derive(Clone)]
pub struct SubjectRepository {
    subject_dao: SubjectDao,
}

impl SubjectRepository {
    pub fn new(subject_dao: SubjectDao) -> Self {
        Self { subject_dao }
    }

    pub async fn get_all_subjects(&self) -> Result<Vec<Subject>> {
        self.subject_dao.get_all_subjects().await
    }

    pub async fn get_subject(&self, subject_id: i64) -> Result<Option<Subject>> {
        self.subject_dao.get_subject(subject_id).await
    }

    pub async fn get_subject_classes(&self, subject_id: i64) -> Result<Vec<Class>> {
        self.subject_dao.get_subject_classes(subject_id).await
    }

    pub async fn get_subject_score(&self, subject_id: i64) -> Result<ScoreSummary> {
        self.subject_dao.get_subject_score(subject_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures;

    #[tokio::test]
    async fn test_subject_classes() {
        let pool = fixtures::setup_test_db().await;
        let catalog = fixtures::insert_sample_catalog(&pool).await;
        let repo = SubjectRepository::new(SubjectDao::new(pool));

        let subject = repo.get_subject(catalog.subject_id).await.unwrap().unwrap();
        assert_eq!(subject.code, "CIC0004");

        let codes: Vec<String> = repo
            .get_subject_classes(catalog.subject_id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.code)
            .collect();
        assert_eq!(codes, vec!["01", "02"]);
        assert_eq!(repo.get_subject_score(catalog.subject_id).await.unwrap().score, None);
    }
}
