//! Label selectors for operator-spawned jobs.
//!
//! The operator labels every pod and cron job it creates with
//! `<prefix>type=<job type>,<prefix><owner key>=<owner name>`.

use std::fmt;

/// Kinds of work the operator schedules.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JobType {
    /// Repository initialization for a backup location
    BackupLocationInit,
    /// Scheduled metadata backup
    Backup,
    /// Metadata restore
    Restore,
}

impl JobType {
    /// Value of the `type` label.
    pub fn label_value(self) -> &'static str {
        match self {
            JobType::BackupLocationInit => "backuploc-init",
            JobType::Backup => "backup",
            JobType::Restore => "restore",
        }
    }

    /// Key of the label naming the owning resource.
    pub fn owner_key(self) -> &'static str {
        match self {
            JobType::BackupLocationInit => "backuploc",
            JobType::Backup => "backup-policy",
            JobType::Restore => "restore-mbr",
        }
    }
}

/// Selector for the jobs of one owner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobSelector {
    prefix: String,
    job_type: JobType,
    owner: String,
}

impl JobSelector {
    pub fn new(prefix: impl Into<String>, job_type: JobType, owner: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            job_type,
            owner: owner.into(),
        }
    }

    pub fn job_type(&self) -> JobType {
        self.job_type
    }

    /// Label pairs the selector matches on.
    pub fn labels(&self) -> [(String, String); 2] {
        [
            (
                format!("{}type", self.prefix),
                self.job_type.label_value().to_string(),
            ),
            (
                format!("{}{}", self.prefix, self.job_type.owner_key()),
                self.owner.clone(),
            ),
        ]
    }
}

impl fmt::Display for JobSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [(type_key, type_value), (owner_key, owner)] = self.labels();
        write!(f, "{}={},{}={}", type_key, type_value, owner_key, owner)
    }
}
