//! crates/lms_core/src/service/profile.rs
//!
//! Reading and updating the signed-in user's profile.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::domain::{MediaUpload, User, UserProfile};
use crate::ports::{DatabaseService, MediaService, PortError, PortResult};
use crate::service::discard_media;

#[derive(Clone)]
pub struct ProfileService {
    db: Arc<dyn DatabaseService>,
    media: Arc<dyn MediaService>,
}

impl ProfileService {
    pub fn new(db: Arc<dyn DatabaseService>, media: Arc<dyn MediaService>) -> Self {
        Self { db, media }
    }

    /// The user plus the courses they are enrolled in.
    pub async fn get_profile(&self, user_id: Uuid) -> PortResult<UserProfile> {
        let user = self.db.get_user_by_id(user_id).await?;
        let courses = self.db.get_courses_by_ids(&user.enrolled_courses).await?;
        Ok(UserProfile { user, courses })
    }

    /// Replaces the name and photo. Both are required; the old photo is
    /// discarded only after the new one is stored and saved.
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        name: &str,
        photo: Option<MediaUpload>,
    ) -> PortResult<User> {
        let name = name.trim();
        let Some(photo) = photo.filter(|_| !name.is_empty()) else {
            return Err(PortError::Validation("All field is required".to_string()));
        };

        let existing = self.db.get_user_by_id(user_id).await?;
        let stored = self.media.upload(photo).await?;
        let user = self
            .db
            .update_user_profile(user_id, name, &stored.url)
            .await?;
        if let Some(previous) = existing.photo_url {
            discard_media(self.media.as_ref(), &previous).await;
        }
        info!(%user_id, "Profile updated");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MediaKind, NewUser};
    use crate::memory::{InMemoryDatabase, InMemoryMedia};

    fn photo() -> MediaUpload {
        MediaUpload {
            kind: MediaKind::Avatar,
            file_name: "me.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            data: vec![0xff, 0xd8],
        }
    }

    async fn setup() -> (ProfileService, Arc<InMemoryMedia>, Uuid) {
        let db = Arc::new(InMemoryDatabase::new());
        let media = Arc::new(InMemoryMedia::new());
        let user = db
            .create_user(NewUser {
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                hashed_password: "x".to_string(),
            })
            .await
            .unwrap();
        (ProfileService::new(db, media.clone()), media, user.id)
    }

    #[tokio::test]
    async fn update_requires_name_and_photo() {
        let (svc, _, user_id) = setup().await;
        let err = svc.update_profile(user_id, "Ada", None).await.unwrap_err();
        assert!(matches!(err, PortError::Validation(_)));
        let err = svc.update_profile(user_id, " ", Some(photo())).await.unwrap_err();
        assert!(matches!(err, PortError::Validation(_)));
    }

    #[tokio::test]
    async fn new_photo_replaces_old_asset() {
        let (svc, media, user_id) = setup().await;
        svc.update_profile(user_id, "Ada", Some(photo())).await.unwrap();
        let user = svc.update_profile(user_id, "Ada L.", Some(photo())).await.unwrap();

        assert_eq!(user.name, "Ada L.");
        assert_eq!(media.len(), 1);
        let profile = svc.get_profile(user_id).await.unwrap();
        assert_eq!(profile.user.photo_url, user.photo_url);
        assert!(profile.courses.is_empty());
    }

    #[tokio::test]
    async fn failed_upload_keeps_the_current_photo() {
        let (svc, media, user_id) = setup().await;
        let before = svc.update_profile(user_id, "Ada", Some(photo())).await.unwrap();
        let current = before.photo_url.clone().unwrap();

        media.set_failing_uploads(true);
        let err = svc
            .update_profile(user_id, "Ada L.", Some(photo()))
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::Media(_)));

        let profile = svc.get_profile(user_id).await.unwrap();
        assert_eq!(profile.user.name, "Ada");
        assert_eq!(profile.user.photo_url.as_deref(), Some(current.as_str()));
        assert!(media.contains(current.trim_start_matches("memory://media/")));
    }
}
