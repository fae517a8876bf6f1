//! Database seeder for Spendbee development.
//!
//! Seeds a demo user with one group, two guests, a couple of expenses in
//! different currencies and a settlement. Running it twice is a no-op.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use rust_decimal_macros::dec;
use spendbee_core::auth::hash_password;
use spendbee_core::currency::{RateTable, rate_between};
use spendbee_core::expense::resolve_shares;
use spendbee_db::repositories::{
    CreateExpenseInput, CreateGroupInput, CreateSettlementInput, ExpenseRepository,
    GroupRepository, MemberRepository, SettlementRepository, UserRepository,
};
use spendbee_shared::types::{GroupId, MemberId, UserId};

const DEMO_EMAIL: &str = "demo@spendbee.dev";
const DEMO_PASSWORD: &str = "spendbee-demo";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL must be set in environment")?;

    println!("Connecting to database...");
    let db = spendbee_db::connect(&database_url, 2, 1).await?;

    let users = UserRepository::new(db.clone());
    if users.email_exists(DEMO_EMAIL).await? {
        println!("  Demo user already exists, skipping...");
        return Ok(());
    }

    println!("Seeding demo user...");
    let user = users
        .create(DEMO_EMAIL, &hash_password(DEMO_PASSWORD)?, "Demo User")
        .await?;
    println!("  Created {DEMO_EMAIL} / {DEMO_PASSWORD}");

    println!("Seeding demo group...");
    let (group, membership) = GroupRepository::new(db.clone())
        .create(CreateGroupInput {
            name: "Weekend in Lisbon".to_string(),
            description: Some("Demo data".to_string()),
            base_currency: Some("EUR".to_string()),
            created_by: UserId::new(user.id),
        })
        .await?;
    let group_id = GroupId::new(group.id);
    let me = MemberId::new(membership.id);

    let members = MemberRepository::new(db.clone());
    let sam = MemberId::new(members.add_guest(group_id, "Sam").await?.id);
    let lee = MemberId::new(members.add_guest(group_id, "Lee").await?.id);
    println!("  Created group {} with 2 guests", group.uuid);

    println!("Seeding expenses...");
    let rates = RateTable::fallback();
    let expenses = ExpenseRepository::new(db.clone());
    let everyone = [me, sam, lee];
    for (description, amount, currency, paid_by) in [
        ("Apartment", dec!(240), "EUR", me),
        ("Airport taxi", dec!(45), "USD", sam),
        ("Dinner", dec!(96.50), "EUR", lee),
    ] {
        expenses
            .create(CreateExpenseInput {
                group_id,
                actor: me,
                description: description.to_string(),
                note: None,
                amount,
                currency: currency.to_string(),
                exchange_rate: rate_between(currency, "EUR", &rates)?,
                paid_by,
                created_at: None,
                shares: resolve_shares(amount, &everyone, &[])?,
                receipt_items: None,
                attachments: None,
            })
            .await?;
    }
    println!("  Inserted 3 expenses");

    println!("Seeding settlement...");
    SettlementRepository::new(db)
        .create(CreateSettlementInput {
            group_id,
            actor: me,
            from: sam,
            to: me,
            amount: dec!(40),
            currency: "EUR".to_string(),
            exchange_rate: dec!(1),
        })
        .await?;

    println!("Seeding complete!");
    Ok(())
}
