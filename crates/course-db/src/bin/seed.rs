//! # Seed Data Generator
//!
//! Populates the database with demo sellers, buyers and courses for
//! development.
//!
//! ## Usage
//! ```bash
//! # Generate 40 courses (default)
//! cargo run -p course-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p course-db --bin seed -- --count 200
//!
//! # Specify database path
//! cargo run -p course-db --bin seed -- --db ./data/market.db
//!
//! # More log output
//! RUST_LOG=course_db=debug cargo run -p course-db --bin seed
//! ```
//!
//! ## Generated Data
//! - 3 sellers (`seller_1` ..), 3 buyers (`buyer_1` ..)
//! - One tag per topic
//! - Courses spread round-robin over sellers, all published, every fifth pinned
//! - Prices between 4.99 and 49.90

use std::env;

use course_core::{AccountRole, Money, NewSnapshot};
use course_db::{Database, DbConfig, Listing};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Course topics and title stems.
const TOPICS: &[(&str, &[&str])] = &[
    (
        "rust",
        &[
            "Ownership in Practice",
            "Async Rust from Scratch",
            "Writing Safe Unsafe Code",
            "Traits and Generics",
        ],
    ),
    (
        "web",
        &[
            "HTTP for Backend Developers",
            "Building REST APIs",
            "Sessions and Cookies",
        ],
    ),
    (
        "databases",
        &[
            "SQLite Internals",
            "Transactions and Isolation",
            "Indexing Strategies",
        ],
    ),
    (
        "systems",
        &[
            "Linux Process Model",
            "Memory Allocators",
            "Network Sockets",
        ],
    ),
];

const SELLERS: usize = 3;
const BUYERS: usize = 3;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 40;
    let mut db_path = String::from("./market_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(40);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Course Market Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of courses to generate (default: 40)");
                println!("  -d, --db <PATH>    Database file path (default: ./market_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    info!(database = %db_path, courses = count, "Seeding course market");

    let db = Database::new(DbConfig::new(&db_path)).await?;

    if db.accounts().get_by_username("seller_1").await?.is_some() {
        warn!("Database already seeded, delete the file to regenerate");
        return Ok(());
    }

    // Accounts
    let mut sellers = Vec::with_capacity(SELLERS);
    for n in 1..=SELLERS {
        let name = format!("seller_{}", n);
        let account = db
            .accounts()
            .create(&name, &format!("{}@example.com", name), AccountRole::Seller)
            .await?;
        db.accounts()
            .set_nickname(account.id, &format!("Teacher {}", n))
            .await?;
        sellers.push(account.id);
    }

    for n in 1..=BUYERS {
        let name = format!("buyer_{}", n);
        db.accounts()
            .create(&name, &format!("{}@example.com", name), AccountRole::Buyer)
            .await?;
    }

    // Tags
    let mut tags = Vec::with_capacity(TOPICS.len());
    for (topic, _) in TOPICS {
        tags.push(db.courses().create_tag(topic).await?.id);
    }

    // Courses
    let start = std::time::Instant::now();
    let mut generated = 0;

    'outer: for round in 0.. {
        for (topic_idx, (_, titles)) in TOPICS.iter().enumerate() {
            for title in titles.iter() {
                if generated >= count {
                    break 'outer;
                }

                let snapshot = generate_snapshot(title, round, generated)?;
                let seller = sellers[generated % sellers.len()];

                let created = db
                    .courses()
                    .create(seller, &snapshot, &[tags[topic_idx]])
                    .await?;
                db.courses().set_published(created.course_id, true).await?;

                if generated % 5 == 0 {
                    db.courses().set_pinned(created.course_id, true).await?;
                }

                generated += 1;
            }
        }
    }

    info!(
        courses = generated,
        elapsed = ?start.elapsed(),
        "Courses generated"
    );

    let listed = db.courses().list(Listing::Latest, 10).await?;
    info!(listed = listed.len(), "Verified latest listing");

    db.close().await;
    Ok(())
}

/// Builds the content of one demo course.
fn generate_snapshot(
    title: &str,
    round: usize,
    seed: usize,
) -> Result<NewSnapshot, Box<dyn std::error::Error>> {
    let title = if round == 0 {
        title.to_string()
    } else {
        format!("{} (Part {})", title, round + 1)
    };

    // 4.99 - 49.90
    let price = Money::new(4 + ((seed * 7) % 46) as i64, [99, 90, 50, 0][seed % 4])?;

    Ok(NewSnapshot {
        content: format!("# {}\n\nLessons, exercises and a final project.", title),
        title,
        cover: format!("/media/cover_{}.png", seed % 8),
        price,
    })
}
