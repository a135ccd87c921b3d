//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    /// Firebase user profiles (keyed by uid)
    pub const USERS: &str = "users";
    pub const CHAT_SESSIONS: &str = "chat_sessions";
    pub const JOURNAL_ENTRIES: &str = "journal_entries";
    /// Running totals (keyed by uid)
    pub const PROGRESS: &str = "progress";
    /// Weekly rollups (keyed by `{uid}_{weekStart date}`)
    pub const WEEKLY_PROGRESS: &str = "weekly_progress";
    pub const TIME_CAPSULES: &str = "time_capsules";
    pub const QUOTES: &str = "quotes";
    pub const FEEDBACK: &str = "feedback";
    /// Profile pictures (keyed by URL-encoded email)
    pub const PROFILE_PICTURES: &str = "profile_pictures";
    /// Email preferences (keyed by uid)
    pub const USER_PREFERENCES: &str = "user_preferences";
    pub const AFFIRMATIONS: &str = "affirmations";
    /// Pending email verification codes (keyed by URL-encoded email)
    pub const VERIFICATION_CODES: &str = "verification_codes";
}
