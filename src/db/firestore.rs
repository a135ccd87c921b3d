// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Chat sessions and journal entries
//! - Progress totals and weekly rollups
//! - Time-capsule metadata
//! - Quotes, feedback, profile pictures and email preferences
//! - Affirmations and email verification codes

use crate::db::collections;
use crate::error::AppError;
use crate::models::{
    Affirmation, ChatSession, ChatSessionSummary, Feedback, JournalEntry, ProfilePicture,
    Progress, Quote, TimeCapsule, UserPreferences, UserProfile, VerificationCode, WeeklyProgress,
};
use serde::{de::DeserializeOwned, Serialize};

/// Upper bound on documents returned by list queries.
const MAX_LIST_RESULTS: u32 = 500;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Generic helpers ─────────────────────────────────────────

    async fn get_doc<T>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn set_doc<T>(&self, collection: &str, id: &str, doc: &T) -> Result<(), AppError>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
    {
        let _: T = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collection)
            .document_id(id)
            .object(doc)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn delete_doc(&self, collection: &str, id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collection)
            .document_id(id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── User Operations ─────────────────────────────────────────

    pub async fn get_user_profile(&self, uid: &str) -> Result<Option<UserProfile>, AppError> {
        self.get_doc(collections::USERS, uid).await
    }

    // ─── Chat Sessions ───────────────────────────────────────────

    pub async fn create_chat_session(&self, session: &ChatSession) -> Result<(), AppError> {
        self.set_doc(collections::CHAT_SESSIONS, &session.id, session)
            .await
    }

    /// Sessions for an email, newest first.
    pub async fn list_chat_sessions(
        &self,
        email: &str,
    ) -> Result<Vec<ChatSessionSummary>, AppError> {
        let email = email.to_string();
        let sessions: Vec<ChatSession> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::CHAT_SESSIONS)
            .filter(move |q| q.for_all([q.field("email").eq(email.clone())]))
            .order_by([("createdAt", firestore::FirestoreQueryDirection::Descending)])
            .limit(MAX_LIST_RESULTS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(sessions
            .into_iter()
            .map(|s| ChatSessionSummary {
                id: s.id,
                created_at: s.created_at,
            })
            .collect())
    }

    pub async fn get_chat_session(&self, id: &str) -> Result<Option<ChatSession>, AppError> {
        self.get_doc(collections::CHAT_SESSIONS, id).await
    }

    /// Returns the number of sessions removed (0 or 1).
    pub async fn delete_chat_session(&self, id: &str) -> Result<u32, AppError> {
        if self.get_chat_session(id).await?.is_none() {
            return Ok(0);
        }
        self.delete_doc(collections::CHAT_SESSIONS, id).await?;
        Ok(1)
    }

    // ─── Journal ─────────────────────────────────────────────────

    pub async fn set_journal_entry(&self, entry: &JournalEntry) -> Result<(), AppError> {
        self.set_doc(collections::JOURNAL_ENTRIES, &entry.id, entry)
            .await
    }

    /// Entry by ID, only if it belongs to `user_id`.
    pub async fn get_journal_entry(
        &self,
        user_id: &str,
        entry_id: &str,
    ) -> Result<Option<JournalEntry>, AppError> {
        let entry: Option<JournalEntry> =
            self.get_doc(collections::JOURNAL_ENTRIES, entry_id).await?;
        Ok(entry.filter(|e| e.user_id == user_id))
    }

    /// Entries for a user, newest first.
    pub async fn list_journal_entries(&self, user_id: &str) -> Result<Vec<JournalEntry>, AppError> {
        let user_id = user_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::JOURNAL_ENTRIES)
            .filter(move |q| q.for_all([q.field("userId").eq(user_id.clone())]))
            .order_by([("createdAt", firestore::FirestoreQueryDirection::Descending)])
            .limit(MAX_LIST_RESULTS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn delete_journal_entry(&self, entry_id: &str) -> Result<(), AppError> {
        self.delete_doc(collections::JOURNAL_ENTRIES, entry_id)
            .await
    }

    // ─── Progress ────────────────────────────────────────────────

    pub async fn get_progress(&self, user_id: &str) -> Result<Option<Progress>, AppError> {
        self.get_doc(collections::PROGRESS, user_id).await
    }

    pub async fn set_progress(&self, progress: &Progress) -> Result<(), AppError> {
        self.set_doc(collections::PROGRESS, &progress.user_id, progress)
            .await
    }

    pub async fn get_weekly_progress(
        &self,
        doc_id: &str,
    ) -> Result<Option<WeeklyProgress>, AppError> {
        self.get_doc(collections::WEEKLY_PROGRESS, doc_id).await
    }

    pub async fn set_weekly_progress(
        &self,
        doc_id: &str,
        weekly: &WeeklyProgress,
    ) -> Result<(), AppError> {
        self.set_doc(collections::WEEKLY_PROGRESS, doc_id, weekly)
            .await
    }

    /// Most recent weekly docs whose week ends at or after `week_end_after`.
    pub async fn recent_weekly_progress(
        &self,
        user_id: &str,
        week_end_after: &str,
        limit: u32,
    ) -> Result<Vec<WeeklyProgress>, AppError> {
        let user_id = user_id.to_string();
        let week_end_after = week_end_after.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::WEEKLY_PROGRESS)
            .filter(move |q| {
                q.for_all([
                    q.field("userId").eq(user_id.clone()),
                    q.field("weekEnd")
                        .greater_than_or_equal(week_end_after.clone()),
                ])
            })
            .order_by([("weekEnd", firestore::FirestoreQueryDirection::Descending)])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Time Capsules ───────────────────────────────────────────

    pub async fn create_time_capsule(&self, capsule: &TimeCapsule) -> Result<(), AppError> {
        self.set_doc(collections::TIME_CAPSULES, &capsule.id, capsule)
            .await
    }

    pub async fn get_time_capsule(&self, id: &str) -> Result<Option<TimeCapsule>, AppError> {
        self.get_doc(collections::TIME_CAPSULES, id).await
    }

    /// Capsules for a user, newest first.
    pub async fn list_time_capsules(&self, user_id: &str) -> Result<Vec<TimeCapsule>, AppError> {
        let user_id = user_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::TIME_CAPSULES)
            .filter(move |q| q.for_all([q.field("userId").eq(user_id.clone())]))
            .order_by([("createdAt", firestore::FirestoreQueryDirection::Descending)])
            .limit(MAX_LIST_RESULTS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Quotes & Feedback ───────────────────────────────────────

    pub async fn list_quotes(&self) -> Result<Vec<Quote>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::QUOTES)
            .limit(MAX_LIST_RESULTS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn create_feedback(&self, feedback: &Feedback) -> Result<(), AppError> {
        self.set_doc(collections::FEEDBACK, &feedback.id, feedback)
            .await
    }

    pub async fn list_feedback(&self) -> Result<Vec<Feedback>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::FEEDBACK)
            .order_by([("createdAt", firestore::FirestoreQueryDirection::Descending)])
            .limit(MAX_LIST_RESULTS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Profile Pictures ────────────────────────────────────────

    pub async fn get_profile_picture(
        &self,
        email: &str,
    ) -> Result<Option<ProfilePicture>, AppError> {
        self.get_doc(collections::PROFILE_PICTURES, &email_doc_id(email))
            .await
    }

    pub async fn set_profile_picture(&self, picture: &ProfilePicture) -> Result<(), AppError> {
        self.set_doc(
            collections::PROFILE_PICTURES,
            &email_doc_id(&picture.email),
            picture,
        )
        .await
    }

    /// Returns whether a picture existed.
    pub async fn delete_profile_picture(&self, email: &str) -> Result<bool, AppError> {
        if self.get_profile_picture(email).await?.is_none() {
            return Ok(false);
        }
        self.delete_doc(collections::PROFILE_PICTURES, &email_doc_id(email))
            .await?;
        Ok(true)
    }

    // ─── Email Preferences ───────────────────────────────────────

    pub async fn get_user_preferences(
        &self,
        uid: &str,
    ) -> Result<Option<UserPreferences>, AppError> {
        self.get_doc(collections::USER_PREFERENCES, uid).await
    }

    pub async fn set_user_preferences(&self, prefs: &UserPreferences) -> Result<(), AppError> {
        self.set_doc(collections::USER_PREFERENCES, &prefs.uid, prefs)
            .await
    }

    /// Users who opted in to email notifications.
    pub async fn list_notification_recipients(&self) -> Result<Vec<UserPreferences>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::USER_PREFERENCES)
            .filter(|q| q.for_all([q.field("emailNotificationsEnabled").eq(true)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Affirmations ────────────────────────────────────────────

    pub async fn list_affirmations(&self) -> Result<Vec<Affirmation>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::AFFIRMATIONS)
            .limit(MAX_LIST_RESULTS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn add_affirmation(&self, affirmation: &Affirmation) -> Result<String, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        self.set_doc(collections::AFFIRMATIONS, &id, affirmation)
            .await?;
        Ok(id)
    }

    // ─── Verification Codes ──────────────────────────────────────

    pub async fn get_verification_code(
        &self,
        email: &str,
    ) -> Result<Option<VerificationCode>, AppError> {
        self.get_doc(collections::VERIFICATION_CODES, &email_doc_id(email))
            .await
    }

    /// Replaces any code already outstanding for the email.
    pub async fn set_verification_code(&self, code: &VerificationCode) -> Result<(), AppError> {
        self.set_doc(
            collections::VERIFICATION_CODES,
            &email_doc_id(&code.email),
            code,
        )
        .await
    }

    pub async fn delete_verification_code(&self, email: &str) -> Result<(), AppError> {
        self.delete_doc(collections::VERIFICATION_CODES, &email_doc_id(email))
            .await
    }
}

/// Emails contain characters Firestore IDs dislike; normalize then encode.
fn email_doc_id(email: &str) -> String {
    urlencoding::encode(&email.trim().to_lowercase()).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_doc_id_is_normalized() {
        assert_eq!(email_doc_id(" A.B@Example.com "), "a.b%40example.com");
        assert_eq!(email_doc_id("x/y@z.io"), "x%2Fy%40z.io");
    }

    #[tokio::test]
    async fn offline_mode_reports_database_error() {
        let db = FirestoreDb::new_mock();
        let err = db.get_progress("uid").await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }
}
