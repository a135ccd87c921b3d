// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod capsule;
pub mod chat;
pub mod content;
pub mod journal;
pub mod log;
pub mod notification;
pub mod progress;
pub mod user;

pub use capsule::{CapsuleView, TimeCapsule};
pub use chat::{ChatMessage, ChatSession, ChatSessionSummary};
pub use content::{Feedback, ProfilePicture, Quote};
pub use journal::JournalEntry;
pub use log::{LogEntry, LogTimestamp};
pub use notification::{Affirmation, VerificationCode};
pub use progress::{Progress, WeeklyProgress};
pub use user::{UserPreferences, UserProfile};
