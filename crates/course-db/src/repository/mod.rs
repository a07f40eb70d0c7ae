//! # Repository Module
//!
//! Database repository implementations for the course market.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Layout                                    │
//! │                                                                         │
//! │  Market command                                                        │
//! │       │                                                                 │
//! │       │  db.orders().place_order(buyer_id, &[3, 5])                    │
//! │       ▼                                                                 │
//! │  OrderRepository                                                       │
//! │  ├── place_order(&self, buyer_id, course_ids)   (one transaction)      │
//! │  ├── pay_order(&self, order_id)                 (one transaction)      │
//! │  └── get_for_buyer / snapshot_ids               (reads)                │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`AccountRepository`](account::AccountRepository) - Accounts and profiles
//! - [`CourseRepository`](course::CourseRepository) - Courses, snapshots, tags, listings
//! - [`CartRepository`](cart::CartRepository) - Cart rows
//! - [`OrderRepository`](order::OrderRepository) - Order placement and settlement

pub mod account;
pub mod cart;
pub mod course;
pub mod order;
