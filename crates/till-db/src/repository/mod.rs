//! # Repository Module
//!
//! Database repository implementations for Till POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  Caller                                                                 │
//! │       │  db.denominations().create(50, 40)                              │
//! │       ▼                                                                 │
//! │  DenominationRepository                                                 │
//! │  ├── create(&self, value, count)                                        │
//! │  ├── set_count(&self, value, count)                                     │
//! │  └── list_desc(&self)                                                   │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! │                                                                         │
//! │  The instance methods serve the admin/CRUD surface on their own         │
//! │  connections. Each repository also exposes associated `*_in` functions  │
//! │  taking a `&mut SqliteConnection`: those are the building blocks the    │
//! │  billing engine composes inside ONE write transaction, so that stock    │
//! │  decrements, drawer movements and bill inserts commit (or roll back)    │
//! │  together.                                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Product CRUD and guarded stock decrement
//! - [`denomination::DenominationRepository`] - Drawer levels and guarded movements
//! - [`customer::CustomerRepository`] - Idempotent upsert-by-email
//! - [`bill::BillRepository`] - Bill, line and change-entry records

pub mod bill;
pub mod customer;
pub mod denomination;
pub mod product;
