//! Per-user progress counters and weekly rollups.
//!
//! `Progress` is one document per user with running totals. `WeeklyProgress`
//! is one document per user per Monday-starting UTC week, created lazily the
//! first time anything is recorded in that week.

use crate::time_utils::{format_utc_rfc3339, parse_rfc3339, parse_user_datetime};
use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// Mood history kept on the progress document.
pub const MOOD_HISTORY_LEN: usize = 30;
/// Samples returned by the mood trend.
pub const MOOD_TREND_LEN: usize = 7;
/// Upper bound on the journal entry counter.
pub const MAX_JOURNAL_ENTRIES: u32 = 1000;

pub const ORDERED_DAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Short weekday name ("Mon".."Sun").
pub fn day_name(date: DateTime<Utc>) -> &'static str {
    ORDERED_DAYS[date.weekday().num_days_from_monday() as usize]
}

/// `YYYY-MM-DD` for a UTC instant.
pub fn date_key(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Monday 00:00:00.000 and Sunday 23:59:59.999 (UTC) of the week holding `now`.
pub fn week_bounds(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let monday = now.date_naive().week(Weekday::Mon).first_day();
    let start = monday.and_time(NaiveTime::MIN).and_utc();
    let end = start + Duration::days(7) - Duration::milliseconds(1);
    (start, end)
}

/// Relative "last seen" label.
pub fn format_last_active(last_active: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - last_active).num_minutes();
    match minutes {
        m if m < 1 => "Just now".to_string(),
        m if m < 60 => format!("{m}m ago"),
        m if m < 1440 => format!("{}h ago", m / 60),
        m => format!("{}d ago", m / 1440),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayCount {
    pub day: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayMinutes {
    pub day: String,
    pub minutes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodSample {
    /// RFC3339 UTC
    pub date: String,
    pub value: f64,
}

/// Running totals, keyed by Firebase UID.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub user_id: String,
    #[serde(default)]
    pub chatbot_interactions: u32,
    #[serde(default)]
    pub journal_entries: u32,
    pub last_active: String,
    #[serde(default)]
    pub chatbot_interactions_per_day: Vec<DayCount>,
    #[serde(default)]
    pub active_time_per_day: Vec<DayMinutes>,
    #[serde(default)]
    pub mood_data: Vec<MoodSample>,
}

impl Progress {
    pub fn new(user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            chatbot_interactions: 0,
            journal_entries: 0,
            last_active: format_utc_rfc3339(now),
            chatbot_interactions_per_day: ORDERED_DAYS
                .iter()
                .map(|day| DayCount {
                    day: day.to_string(),
                    count: 0,
                })
                .collect(),
            active_time_per_day: ORDERED_DAYS
                .iter()
                .map(|day| DayMinutes {
                    day: day.to_string(),
                    minutes: 0,
                })
                .collect(),
            mood_data: Vec::new(),
        }
    }

    pub fn record_mood(&mut self, value: f64, date: DateTime<Utc>) {
        self.mood_data.push(MoodSample {
            date: format_utc_rfc3339(date),
            value,
        });
        if self.mood_data.len() > MOOD_HISTORY_LEN {
            let excess = self.mood_data.len() - MOOD_HISTORY_LEN;
            self.mood_data.drain(..excess);
        }
    }

    pub fn record_chat_interaction(&mut self, now: DateTime<Utc>) {
        self.chatbot_interactions = self.chatbot_interactions.saturating_add(1);
        let day = day_name(now);
        match self
            .chatbot_interactions_per_day
            .iter_mut()
            .find(|e| e.day == day)
        {
            Some(entry) => entry.count += 1,
            None => self.chatbot_interactions_per_day.push(DayCount {
                day: day.to_string(),
                count: 1,
            }),
        }
        self.last_active = format_utc_rfc3339(now);
    }

    pub fn record_active_minutes(&mut self, minutes: u64, now: DateTime<Utc>) {
        let day = day_name(now);
        match self.active_time_per_day.iter_mut().find(|e| e.day == day) {
            Some(entry) => entry.minutes += minutes,
            None => self.active_time_per_day.push(DayMinutes {
                day: day.to_string(),
                minutes,
            }),
        }
    }

    pub fn increment_journal_entries(&mut self, now: DateTime<Utc>) -> u32 {
        self.journal_entries = self.journal_entries.saturating_add(1).min(MAX_JOURNAL_ENTRIES);
        self.last_active = format_utc_rfc3339(now);
        self.journal_entries
    }

    pub fn decrement_journal_entries(&mut self, now: DateTime<Utc>) -> u32 {
        self.journal_entries = self.journal_entries.saturating_sub(1);
        self.last_active = format_utc_rfc3339(now);
        self.journal_entries
    }

    /// Last seven samples ordered by date, dates reduced to `YYYY-MM-DD`.
    pub fn mood_trend(&self) -> Vec<MoodTrendPoint> {
        let mut samples: Vec<(DateTime<Utc>, f64)> = self
            .mood_data
            .iter()
            .filter_map(|m| parse_user_datetime(&m.date).map(|d| (d, m.value)))
            .collect();
        samples.sort_by_key(|(date, _)| *date);

        let skip = samples.len().saturating_sub(MOOD_TREND_LEN);
        samples
            .into_iter()
            .skip(skip)
            .map(|(date, value)| MoodTrendPoint {
                date: date_key(date),
                value,
            })
            .collect()
    }

    pub fn summary(&self, now: DateTime<Utc>) -> ProgressSummary {
        let last_active = parse_rfc3339(&self.last_active)
            .map(|t| format_last_active(t, now))
            .unwrap_or_else(|| "Just now".to_string());

        ProgressSummary {
            chatbot_interactions: self.chatbot_interactions,
            journal_entries: self.journal_entries,
            last_active,
            chatbot_interactions_per_day: self.chatbot_interactions_per_day.clone(),
            active_time_per_day: self.active_time_per_day.clone(),
            mood_data: self.mood_data.clone(),
        }
    }
}

/// API view of `Progress` with a human-readable `lastActive`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    pub chatbot_interactions: u32,
    pub journal_entries: u32,
    pub last_active: String,
    pub chatbot_interactions_per_day: Vec<DayCount>,
    pub active_time_per_day: Vec<DayMinutes>,
    pub mood_data: Vec<MoodSample>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoodTrendPoint {
    pub date: String,
    pub value: f64,
}

// ─── Weekly rollup ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatedDayCount {
    pub day: String,
    /// `YYYY-MM-DD` of the last update, unset until the day is touched
    #[serde(default)]
    pub date: Option<String>,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatedDayMinutes {
    pub day: String,
    #[serde(default)]
    pub date: Option<String>,
    pub minutes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyMoodSample {
    pub day: String,
    /// RFC3339 UTC
    pub date: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatPair {
    pub user: String,
    pub bot: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatPairsDay {
    pub day: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub pairs: Vec<ChatPair>,
}

/// Per-week rollup. Document ID is `{userId}_{weekStart date}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyProgress {
    pub user_id: String,
    pub week_start: String,
    pub week_end: String,
    #[serde(default)]
    pub chatbot_interactions: u32,
    #[serde(default)]
    pub journal_entries: u32,
    pub last_active: String,
    #[serde(default)]
    pub chatbot_interactions_per_day: Vec<DatedDayCount>,
    #[serde(default)]
    pub journal_entries_per_day: Vec<DatedDayCount>,
    #[serde(default)]
    pub active_time_per_day: Vec<DatedDayMinutes>,
    #[serde(default)]
    pub mood_data: Vec<WeeklyMoodSample>,
    #[serde(default)]
    pub chat_pairs_per_day: Vec<ChatPairsDay>,
}

impl WeeklyProgress {
    pub fn new(user_id: &str, now: DateTime<Utc>) -> Self {
        let (start, end) = week_bounds(now);
        let counts = || {
            ORDERED_DAYS
                .iter()
                .map(|day| DatedDayCount {
                    day: day.to_string(),
                    date: None,
                    count: 0,
                })
                .collect::<Vec<_>>()
        };

        Self {
            user_id: user_id.to_string(),
            week_start: format_utc_rfc3339(start),
            week_end: format_utc_rfc3339(end),
            chatbot_interactions: 0,
            journal_entries: 0,
            last_active: format_utc_rfc3339(now),
            chatbot_interactions_per_day: counts(),
            journal_entries_per_day: counts(),
            active_time_per_day: ORDERED_DAYS
                .iter()
                .map(|day| DatedDayMinutes {
                    day: day.to_string(),
                    date: None,
                    minutes: 0,
                })
                .collect(),
            mood_data: Vec::new(),
            chat_pairs_per_day: ORDERED_DAYS
                .iter()
                .map(|day| ChatPairsDay {
                    day: day.to_string(),
                    date: None,
                    pairs: Vec::new(),
                })
                .collect(),
        }
    }

    /// Firestore document ID for the week holding `now`.
    pub fn document_id(user_id: &str, now: DateTime<Utc>) -> String {
        let (start, _) = week_bounds(now);
        format!("{user_id}_{}", date_key(start))
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_active = format_utc_rfc3339(now);
    }

    pub fn record_mood(&mut self, value: f64, now: DateTime<Utc>) {
        self.mood_data.push(WeeklyMoodSample {
            day: day_name(now).to_string(),
            date: format_utc_rfc3339(now),
            value,
        });
    }

    pub fn record_chat_pair(&mut self, user: &str, bot: &str, now: DateTime<Utc>) {
        let day = day_name(now);
        let today = date_key(now);
        self.chatbot_interactions = self.chatbot_interactions.saturating_add(1);

        if let Some(entry) = self
            .chatbot_interactions_per_day
            .iter_mut()
            .find(|e| e.day == day)
        {
            entry.count += 1;
            entry.date = Some(today.clone());
        }

        let pair = ChatPair {
            user: user.to_string(),
            bot: bot.to_string(),
            timestamp: format_utc_rfc3339(now),
        };
        match self.chat_pairs_per_day.iter_mut().find(|e| e.day == day) {
            Some(entry) => {
                entry.date = Some(today);
                entry.pairs.push(pair);
            }
            None => self.chat_pairs_per_day.push(ChatPairsDay {
                day: day.to_string(),
                date: Some(today),
                pairs: vec![pair],
            }),
        }
    }

    pub fn record_active_minutes(&mut self, minutes: u64, now: DateTime<Utc>) {
        let day = day_name(now);
        if let Some(entry) = self.active_time_per_day.iter_mut().find(|e| e.day == day) {
            entry.minutes += minutes;
            entry.date = Some(date_key(now));
        }
    }

    pub fn increment_journal_entries(&mut self, now: DateTime<Utc>) {
        self.journal_entries = self.journal_entries.saturating_add(1);
        let day = day_name(now);
        if let Some(entry) = self.journal_entries_per_day.iter_mut().find(|e| e.day == day) {
            entry.count += 1;
            entry.date = Some(date_key(now));
        }
    }

    pub fn decrement_journal_entries(&mut self, now: DateTime<Utc>) {
        self.journal_entries = self.journal_entries.saturating_sub(1);
        let day = day_name(now);
        if let Some(entry) = self.journal_entries_per_day.iter_mut().find(|e| e.day == day) {
            entry.count = entry.count.saturating_sub(1);
            entry.date = Some(date_key(now));
        }
    }
}

// ─── Report data ────────────────────────────────────────────────

/// Days of history included in report data.
pub const REPORT_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedProgress {
    pub mood_data: Vec<WeeklyMoodSample>,
    pub active_time_per_day: Vec<DatedDayMinutes>,
    pub journal_entries_per_day: Vec<DatedDayCount>,
    pub chatbot_interactions_per_day: Vec<DatedDayCount>,
    pub chat_pairs_per_day: Vec<ChatPairsDay>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    pub fetched_at: String,
}

/// Everything the report renderer needs for one user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportData {
    pub display_name: String,
    pub progresses: MergedProgress,
    pub metadata: ReportMetadata,
}

fn within_window(date: Option<&str>, cutoff: DateTime<Utc>) -> bool {
    date.and_then(parse_user_datetime)
        .is_some_and(|d| d >= cutoff)
}

/// Merge weekly docs, dropping per-day entries older than the report window.
/// Entries without a date were never touched and are dropped too.
pub fn merge_weekly_for_report(weeks: &[WeeklyProgress], now: DateTime<Utc>) -> MergedProgress {
    let cutoff = now - Duration::days(REPORT_WINDOW_DAYS);
    let mut merged = MergedProgress::default();

    for week in weeks {
        merged.mood_data.extend(
            week.mood_data
                .iter()
                .filter(|m| within_window(Some(&m.date), cutoff))
                .cloned(),
        );
        merged.active_time_per_day.extend(
            week.active_time_per_day
                .iter()
                .filter(|e| within_window(e.date.as_deref(), cutoff))
                .cloned(),
        );
        merged.journal_entries_per_day.extend(
            week.journal_entries_per_day
                .iter()
                .filter(|e| within_window(e.date.as_deref(), cutoff))
                .cloned(),
        );
        merged.chatbot_interactions_per_day.extend(
            week.chatbot_interactions_per_day
                .iter()
                .filter(|e| within_window(e.date.as_deref(), cutoff))
                .cloned(),
        );
        merged.chat_pairs_per_day.extend(
            week.chat_pairs_per_day
                .iter()
                .filter(|e| within_window(e.date.as_deref(), cutoff))
                .cloned(),
        );
    }

    merged
}
