//! # avc - attribute value checks for terraform modules
//!
//! `avc` reads a terraform module and checks the values its resource
//! attributes can take against a table of declarative rules. See the README
//! for CLI usage.
//!
//! ## Introduction for developers
//!
//! Read this to understand how `avc` works internally.
//!
//! ### HCL Terms
//!
//! Quick introduction to terms used to describe elements of HCL documents.
//!
//! In hcl terms...
//! - a file gets parsed as a `body`
//! - ...which is just a list of `structures`
//! - ...where there are two kinds:
//!   - `attribute`: a "key = value" pair
//!   - or `block`:
//!     - 1 `identifier`
//!     - followed by 0 or more `labels`
//!     - and a `body` enclosed in `{` and `}`
//!
//! Terraform restricts the shape further: the root blocks we care about are
//! `variable` (one label, the variable name) and `resource` (two labels, the
//! resource type and its name).
//!
//! ```hcl
//! variable "account_replication_type" {
//!   type    = string
//!   default = "ZRS"
//! }
//!
//! resource "azurerm_storage_account" "example" {
//!   account_replication_type = var.account_replication_type
//! }
//! ```
//!
//! ### Loading files
//!
//! A `.tf` document is parsed as a `body` ([hcl_edit::structure::Body]). A
//! module usually spans multiple documents, so [hcl_sources::HclSources]
//! stores all root attributes and blocks of all documents and tracks their
//! original source path. The path is kept so findings can point back to it.
//! At this point the loaded files only have to be valid HCL to be accepted.
//!
//! File access goes through the [hcl_sources::SourceReader] capability; the
//! engine itself never touches the filesystem, which is what lets the whole
//! pipeline run against in-memory fixtures.
//!
//! ### Modeling
//!
//! see [document::ModuleDocument::new]
//!
//! The next step applies the terraform-specific structure rules: `variable`
//! blocks become [document::VariableDeclaration]s (type constraint, default,
//! nullability), `resource` blocks become [document::ResourceBlock]s. Nested
//! blocks are flattened into dotted attribute paths, so the `name` attribute
//! inside a `sku` block is addressable as `sku.name` just like a rule table
//! would write it.
//!
//! ### Classification
//!
//! We never evaluate HCL. [expr::classify] sorts each attribute expression
//! into the tiny subset we can reason about statically:
//!
//! | **expression**          | **classified as**                 |
//! |-------------------------|-----------------------------------|
//! | `"Standard"`, `[1, 2]`  | [expr::ExpressionNode::Literal]   |
//! | `var.sku`               | [expr::ExpressionNode::Variable]  |
//! | `each.value`            | [expr::ExpressionNode::EachValue] |
//! | `toset(var.sku)`, `a.b` | anything else: `Unsupported`      |
//!
//! ### Resolution
//!
//! see [resolve::resolve]
//!
//! A [expr::ExpressionNode::Variable] is chased through the variable's
//! default (defaults may reference other variables, loops are detected and
//! give up). An [expr::ExpressionNode::EachValue] enumerates the resource's
//! `for_each` collection, one resolved value per element. `Unsupported`
//! makes the whole attribute unresolvable, and unresolvable is not an
//! error: a value we cannot pin down is a value we do not judge.
//!
//! ### Normalization
//!
//! see [normalize::canonicalize]
//!
//! Collections that terraform treats as sets are compared as sets, so
//! `[3, 2, 1]` and `[1, 2, 3]` are the same value. Zone lists mix numbers
//! and strings in the wild, so a numeric allow list also coerces numeric
//! strings before comparing.
//!
//! ### Checking
//!
//! see [check::check]
//!
//! A [check::ConstraintSpec] either allow-lists scalar values, allow-lists
//! whole collections, or requires the attribute to be present. Explicit
//! `null` is treated like terraform treats it (as if omitted) unless the
//! rule says otherwise. Variable declarations are additionally checked
//! against shared interface contracts by [conform::check_variable], which
//! compares declared type constraints structurally.
//!
//! ### Output
//!
//! [registry::Registry::builtin] holds the rule tables ([waf] and
//! [interfaces]); [engine::run] drives the pipeline and returns
//! [check::Violation]s, which carry the rule identifier, severity, message,
//! source range and documentation link, and serialize via [serde].
pub mod check;
pub mod conform;
pub mod document;
pub mod engine;
pub mod expr;
pub mod hcl_sources;
pub mod interfaces;
pub mod normalize;
pub mod registry;
pub mod resolve;
pub mod typeexpr;
pub mod value;
pub mod waf;
