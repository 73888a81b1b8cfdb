//! # Playbook Core
//!
//! Data model for editable framework widgets.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                playbook-core                │
//! ├─────────────────────────────────────────────┤
//! │  Schema          │  Mutation Layer          │
//! │  - Collections   │  - update / add / remove │
//! │  - Descriptors   │  - Cascade clean-up      │
//! │  - Layouts       │  - Aggregates            │
//! ├─────────────────────────────────────────────┤
//! │  Bilingual views │  Presentation shell      │
//! │  - zh / en       │  - Loading/Error/Ready   │
//! │  - Display rules │  - Export controls       │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Every framework is a [`WidgetSchema`] declaration. A [`Widget`] owns one
//! immutable [`WidgetRecord`] at a time and replaces it on every edit.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod fixture;
pub mod frameworks;
pub mod item;
pub mod lang;
pub mod record;
pub mod schema;
pub mod shell;
pub mod timeline;
pub mod value;
pub mod view;
pub mod widget;

pub use error::{CoreError, CoreResult};
pub use fixture::WidgetFixture;
pub use frameworks::Catalog;
pub use item::{Item, ItemId};
pub use lang::{label, resolve, resolve_list, Lang, LocalizedList, LocalizedText};
pub use record::{round_one_decimal, Collection, Edit, WidgetRecord};
pub use schema::{
    AggregateSpec, ChoiceOption, CollectionSchema, FieldDescriptor, FieldKind, Layout,
    MilestoneTrack, NumberFormat, WidgetSchema,
};
pub use shell::{Controls, ExportFormat, HeaderView, Shell, ShellState, ShellView};
pub use timeline::{Bar, TimelineSpan};
pub use value::{check_patch, decode_patch, FieldValue, Patch, DATE_FORMAT};
pub use view::{format_number, AggregateView, CollectionView, ColumnView, ItemView, RecordView};
pub use widget::{ChangeListener, MutationOutcome, Widget, WidgetProps};

/// Playbook core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
