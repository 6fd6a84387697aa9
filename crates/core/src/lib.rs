pub mod commission;
pub mod commit;
pub mod config;
pub mod domain;
pub mod hierarchy;
pub mod ledger;
pub mod ports;

pub use commission::{
    CommissionError, CommissionResult, CommissionSchedule, TierTerms, VETERAN_TENURE_DAYS,
};
pub use commit::{ChangeCommitCoordinator, CommitFailure, CommitReport, NotificationPrefs};
pub use config::{
    AppConfig, ConfigError, ConfigOverrides, DatabaseConfig, LoadOptions, LogFormat,
    LoggingConfig, NotificationsConfig, StagingConfig,
};
pub use domain::employee::{
    CommissionTier, Employee, EmployeeEdit, EmployeeId, EmployeeStatus, NewEmployee, NoteEntry,
    Site, TerminationDetails,
};
pub use domain::role::Role;
pub use hierarchy::{validate_move, MoveDenial, MoveValidation};
pub use ledger::{
    ChangeId, ChangeKind, PendingChange, PendingChangeLedger, StagedEdit, STAGED_EDITS_KEY,
};
pub use ports::{
    ChangeNotification, ChangeNotifier, CommitSummary, EmployeeStore, EmployeeSummary,
    InMemoryEmployeeStore, InMemoryStagingStore, NotifyError, NotifyRoutes, RecordingNotifier,
    StagingError, StagingStore, StoreError, SummaryChannel,
};
