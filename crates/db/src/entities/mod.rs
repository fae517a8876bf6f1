//! `SeaORM` entity definitions.
//!
//! One module per table. Keys are `SERIAL` integers; groups additionally
//! carry a public UUID used in links.

pub mod activities;
pub mod expense_shares;
pub mod expenses;
pub mod group_members;
pub mod groups;
pub mod invitation_tokens;
pub mod notifications;
pub mod settlements;
pub mod users;

pub mod prelude {
    //! Entity re-exports under their table names.

    pub use super::activities::Entity as Activities;
    pub use super::expense_shares::Entity as ExpenseShares;
    pub use super::expenses::Entity as Expenses;
    pub use super::group_members::Entity as GroupMembers;
    pub use super::groups::Entity as Groups;
    pub use super::invitation_tokens::Entity as InvitationTokens;
    pub use super::notifications::Entity as Notifications;
    pub use super::settlements::Entity as Settlements;
    pub use super::users::Entity as Users;
}
