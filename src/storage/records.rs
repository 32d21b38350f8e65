use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::limits::{ANTISPAM_SYSTEM_NAME, WARN_SYSTEM_NAME};

/// The three persisted punishment collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PunishmentKind {
    Ban,
    Mute,
    Warn,
}

/// Who issued a punishment: a chat admin, or one of the synthetic system
/// actors used for automated punishments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issuer {
    pub id: u64,
    pub name: String,
}

impl Issuer {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Synthetic actor recorded on escalation mutes.
    pub fn warn_system(bot_id: u64) -> Self {
        Self::new(bot_id, WARN_SYSTEM_NAME)
    }

    /// Synthetic actor recorded on anti-spam punishments.
    pub fn antispam_system(bot_id: u64) -> Self {
        Self::new(bot_id, ANTISPAM_SYSTEM_NAME)
    }
}

/// One entry in the `bans`, `mutes` or `warns` collection.
///
/// Field names match the persisted snapshot exactly. Timestamps are Unix
/// epoch seconds; `until_date` of `None` means the punishment is permanent.
/// Records are never edited in place, only added and deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PunishmentRecord {
    pub user_id: u64,
    pub admin_id: u64,
    pub admin_name: String,
    pub reason: String,
    #[serde(default)]
    pub until_date: Option<f64>,
    pub date: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warn_num: Option<u32>,
}

impl PunishmentRecord {
    /// Ban or mute record. `duration` of `None` is permanent; a present
    /// duration is always positive, so `until_date > date` holds.
    pub fn timed(
        user_id: u64,
        issuer: &Issuer,
        reason: impl Into<String>,
        duration: Option<Duration>,
        now: f64,
    ) -> Self {
        Self {
            user_id,
            admin_id: issuer.id,
            admin_name: issuer.name.clone(),
            reason: reason.into(),
            until_date: duration.map(|d| now + d.as_secs_f64()),
            date: now,
            warn_num: None,
        }
    }

    /// Warn record carrying the rolling counter value at issue time.
    pub fn warn(
        user_id: u64,
        issuer: &Issuer,
        reason: impl Into<String>,
        warn_num: u32,
        now: f64,
    ) -> Self {
        Self {
            user_id,
            admin_id: issuer.id,
            admin_name: issuer.name.clone(),
            reason: reason.into(),
            until_date: None,
            date: now,
            warn_num: Some(warn_num),
        }
    }

    pub fn is_active(&self, now: f64) -> bool {
        self.until_date.map_or(true, |until| until > now)
    }

    pub fn is_expired(&self, now: f64) -> bool {
        self.until_date.is_some_and(|until| until <= now)
    }
}

/// The persisted snapshot: three flat collections, written as a whole.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub bans: Vec<PunishmentRecord>,
    pub mutes: Vec<PunishmentRecord>,
    pub warns: Vec<PunishmentRecord>,
}

impl StoreSnapshot {
    pub fn collection(&self, kind: PunishmentKind) -> &Vec<PunishmentRecord> {
        match kind {
            PunishmentKind::Ban => &self.bans,
            PunishmentKind::Mute => &self.mutes,
            PunishmentKind::Warn => &self.warns,
        }
    }

    pub fn collection_mut(&mut self, kind: PunishmentKind) -> &mut Vec<PunishmentRecord> {
        match kind {
            PunishmentKind::Ban => &mut self.bans,
            PunishmentKind::Mute => &mut self.mutes,
            PunishmentKind::Warn => &mut self.warns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permanent_record_never_expires() {
        let issuer = Issuer::new(1, "admin");
        let record = PunishmentRecord::timed(7, &issuer, "spam", None, 100.0);
        assert!(record.is_active(100.0));
        assert!(record.is_active(1e12));
        assert!(!record.is_expired(1e12));
    }

    #[test]
    fn timed_record_expires_at_boundary() {
        let issuer = Issuer::new(1, "admin");
        let record =
            PunishmentRecord::timed(7, &issuer, "spam", Some(Duration::from_secs(10)), 100.0);
        assert_eq!(record.until_date, Some(110.0));
        assert!(record.is_active(109.9));
        assert!(!record.is_active(110.0));
        assert!(record.is_expired(110.0));
    }

    #[test]
    fn snapshot_json_field_names() {
        let issuer = Issuer::new(2, "mod");
        let snapshot = StoreSnapshot {
            bans: vec![PunishmentRecord::timed(1, &issuer, "ads", None, 50.0)],
            mutes: vec![],
            warns: vec![PunishmentRecord::warn(1, &issuer, "caps", 1, 51.0)],
        };

        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&snapshot).unwrap()).unwrap();
        let ban = &json["bans"][0];
        assert_eq!(ban["user_id"], 1);
        assert_eq!(ban["admin_id"], 2);
        assert_eq!(ban["admin_name"], "mod");
        assert_eq!(ban["reason"], "ads");
        assert!(ban["until_date"].is_null());
        assert_eq!(ban["date"], 50.0);
        // warn_num only appears on warn records
        assert!(ban.get("warn_num").is_none());
        assert_eq!(json["warns"][0]["warn_num"], 1);
    }
}
