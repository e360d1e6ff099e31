//! # till-db: Persistence and Transaction Layer for Till POS
//!
//! SQLite persistence, the bill transaction engine, and the post-commit
//! notification dispatcher.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 Caller (routing layer, CLI, ...)                        │
//! │                           │                                             │
//! │  ┌────────────────────────▼────────────────────────────────────────┐    │
//! │  │                ★ till-db (THIS CRATE) ★                         │    │
//! │  │                                                                 │    │
//! │  │  ┌──────────┐ ┌──────────────┐ ┌────────────┐ ┌─────────────┐  │    │
//! │  │  │   pool   │ │ repositories │ │  billing   │ │   notify    │  │    │
//! │  │  │ Database │ │ product/bill │ │ engine +   │ │ post-commit │  │    │
//! │  │  │ DbConfig │ │ customer/... │ │ tx pipeline│ │ dispatcher  │  │    │
//! │  │  └──────────┘ └──────────────┘ └────────────┘ └─────────────┘  │    │
//! │  │                                                                 │    │
//! │  │  SQLite (WAL) • embedded migrations • guarded updates           │    │
//! │  └────────────────────────┬────────────────────────────────────────┘    │
//! │                           │                                             │
//! │                  till-core (pure logic)                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Transaction Discipline
//!
//! Repositories expose two surfaces:
//! - instance methods on the pool for the admin/read surface
//! - `*_in` associated functions taking `&mut SqliteConnection`, composed by
//!   [`BillingService`] so one bill is exactly one transaction
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use till_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./till.db")).await?;
//! db.denominations().create(50, 40).await?;
//! let receipt = db.billing().create_bill(&request).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod billing;
pub mod error;
pub mod migrations;
pub mod notify;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use billing::BillingService;
pub use error::{DbError, DbResult};
pub use notify::{BillNotification, NotificationDispatcher, NotificationSender};
pub use pool::{Database, DbConfig};
pub use repository::bill::BillRepository;
pub use repository::customer::CustomerRepository;
pub use repository::denomination::DenominationRepository;
pub use repository::product::{NewProduct, ProductRepository};
