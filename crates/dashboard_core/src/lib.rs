pub mod achievements;
pub mod catalog;
pub mod domain;
pub mod ports;
pub mod stats;
pub mod streak;

pub use domain::{
    Achievement, AchievementCategory, AchievementTier, Course, CourseDetail, Difficulty,
    EnrolledCourse, Enrollment, Level, NewUser, Preferences, PreferencesUpdate, StudySession,
    TestResult, Theme, User, UserAchievement, UserCredentials,
};
pub use ports::{DatabaseService, PortError, PortResult};
pub use streak::StreakState;
