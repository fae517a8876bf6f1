//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod activity;
pub mod balance;
pub mod expense;
pub mod group;
pub mod invitation;
pub mod member;
pub mod notification;
pub mod settlement;
pub mod user;

pub use activity::{ActivityFeed, ActivityRepository, NewActivity, insert_activity};
pub use balance::{BalanceInputs, BalanceRepository};
pub use expense::{
    CreateExpenseInput, ExpenseRepoError, ExpenseRepository, ExpenseWithShares,
    UpdateExpenseInput,
};
pub use group::{CreateGroupInput, GroupRepository};
pub use invitation::{INVITATION_TTL_DAYS, InvitationRepository, invitation_link};
pub use member::{MemberRepository, MemberWithUser};
pub use notification::{GROUP_INVITE, GroupInviteData, NotificationError, NotificationRepository};
pub use settlement::{CreateSettlementInput, SettlementRepository, to_settlement_record};
pub use user::{RegistrationError, UpdateUserInput, UserRepository};
